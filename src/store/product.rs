//! Product record types and input validation

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Largest price a `DECIMAL(10,2)` column holds
pub const MAX_PRICE: f64 = 99_999_999.99;

/// `VARCHAR(255)`
pub const MAX_NAME_CHARS: usize = 255;

/// A stored product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: u64,
    pub nombre: String,
    #[serde(serialize_with = "serialize_price")]
    pub precio: f64,
    pub descripcion: Option<String>,
    pub creado_en: DateTime<Utc>,
}

/// Prices go out the way MySQL renders a `DECIMAL(10,2)`: `"25.50"`
fn serialize_price<S: Serializer>(precio: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{precio:.2}"))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// The mutable fields of a product, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub nombre: String,
    pub precio: f64,
    pub descripcion: Option<String>,
}

impl ProductInput {
    /// Validate raw values. The name is trimmed and the price rounded to cents.
    pub fn new(
        nombre: &str,
        precio: f64,
        descripcion: Option<String>,
    ) -> Result<Self, ValidationError> {
        let nombre = nombre.trim();
        if nombre.is_empty() {
            return Err(ValidationError("El campo 'nombre' es obligatorio".to_string()));
        }
        if nombre.chars().count() > MAX_NAME_CHARS {
            return Err(ValidationError(format!(
                "El campo 'nombre' admite como máximo {MAX_NAME_CHARS} caracteres"
            )));
        }
        if !precio.is_finite() || precio < 0.0 {
            return Err(ValidationError(
                "El campo 'precio' debe ser un número no negativo".to_string(),
            ));
        }
        if precio > MAX_PRICE {
            return Err(ValidationError(format!(
                "El campo 'precio' no puede superar {MAX_PRICE:.2}"
            )));
        }

        Ok(Self {
            nombre: nombre.to_string(),
            precio: (precio * 100.0).round() / 100.0,
            descripcion,
        })
    }

    /// Extract and validate fields from a decoded JSON body
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let Some(fields) = payload.as_object() else {
            return Err(ValidationError(
                "El cuerpo debe ser un objeto JSON".to_string(),
            ));
        };

        let nombre = match fields.get("nombre") {
            Some(Value::String(s)) => s.as_str(),
            None | Some(Value::Null) => "",
            Some(_) => {
                return Err(ValidationError(
                    "El campo 'nombre' debe ser texto".to_string(),
                ))
            }
        };

        let precio = match fields.get("precio") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            None | Some(Value::Null) => {
                return Err(ValidationError(
                    "El campo 'precio' es obligatorio".to_string(),
                ))
            }
            Some(_) => f64::NAN,
        };

        let descripcion = match fields.get("descripcion") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(ValidationError(
                    "El campo 'descripcion' debe ser texto".to_string(),
                ))
            }
        };

        Self::new(nombre, precio, descripcion)
    }
}
