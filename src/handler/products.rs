//! Product CRUD handlers
//!
//! Input is validated here, before the store is touched.

use hyper::{Method, StatusCode};
use serde_json::{json, Value};

use super::router::HandlerRequest;
use crate::error::ApiError;
use crate::http::{decode_json, query_param, Reply};
use crate::store::{Product, ProductInput, RecordStore};

pub async fn handle(req: &HandlerRequest, store: &dyn RecordStore) -> Result<Reply, ApiError> {
    let payload = decode_json(&req.body).map_err(|e| ApiError::Decode(e.to_string()))?;
    let id = resolve_id(req.query.as_deref(), &payload)?;

    match req.method {
        Method::GET => match id {
            Some(id) => {
                let product = store.get(id).await?;
                product_reply(StatusCode::OK, &product)
            }
            None => {
                let products = store.list().await?;
                let count = products.len();
                let value = serde_json::to_value(products)
                    .map_err(|e| ApiError::Internal(format!("serialize products: {e}")))?;
                Ok(Reply::json(StatusCode::OK, value).with_detail(format!("{count} productos")))
            }
        },
        Method::POST => {
            let input = ProductInput::from_payload(&payload)?;
            let product = store.create(input).await?;
            Ok(product_reply(StatusCode::CREATED, &product)?
                .with_detail(format!("producto {} creado", product.id)))
        }
        Method::PUT => {
            let id = id.ok_or_else(missing_id)?;
            let input = ProductInput::from_payload(&payload)?;
            let product = store.update(id, input).await?;
            Ok(product_reply(StatusCode::OK, &product)?
                .with_detail(format!("producto {id} actualizado")))
        }
        Method::DELETE => {
            let id = id.ok_or_else(missing_id)?;
            store.delete(id).await?;
            Ok(Reply::json(
                StatusCode::OK,
                json!({ "mensaje": "Producto eliminado", "id": id }),
            )
            .with_detail(format!("producto {id} eliminado")))
        }
        _ => Err(ApiError::MethodNotAllowed),
    }
}

fn product_reply(status: StatusCode, product: &Product) -> Result<Reply, ApiError> {
    let value = serde_json::to_value(product)
        .map_err(|e| ApiError::Internal(format!("serialize product: {e}")))?;
    Ok(Reply::json(status, value))
}

fn missing_id() -> ApiError {
    ApiError::Validation("Se requiere el parámetro 'id'".to_string())
}

fn invalid_id() -> ApiError {
    ApiError::Validation("El 'id' debe ser un entero positivo".to_string())
}

/// The `id` query parameter wins over an `id` field in the body
pub fn resolve_id(query: Option<&str>, payload: &Value) -> Result<Option<u64>, ApiError> {
    if let Some(raw) = query_param(query, "id") {
        return parse_id(&raw).map(Some);
    }

    match payload.get("id") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|id| *id > 0)
            .map(Some)
            .ok_or_else(invalid_id),
        Some(Value::String(s)) => parse_id(s).map(Some),
        Some(_) => Err(invalid_id()),
    }
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid_id());
    }
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid_id()),
    }
}
