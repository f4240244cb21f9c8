//! Message file handlers (plain text)

use hyper::StatusCode;

use super::router::HandlerRequest;
use crate::error::ApiError;
use crate::http::Reply;
use crate::store::FlatFile;

pub async fn read(file: &FlatFile) -> Result<Reply, ApiError> {
    let contents = file.read().await?;
    Ok(Reply::text(StatusCode::OK, contents).with_detail(format!("{} leído", file.name())))
}

/// Replace the file with the request body
pub async fn create(req: &HandlerRequest, file: &FlatFile) -> Result<Reply, ApiError> {
    file.write(&req.body).await?;
    Ok(Reply::text(StatusCode::CREATED, "Archivo creado")
        .with_detail(format!("{} creado ({} bytes)", file.name(), req.body.len())))
}

/// Append the request body to the file
pub async fn append(req: &HandlerRequest, file: &FlatFile) -> Result<Reply, ApiError> {
    file.append(&req.body).await?;
    Ok(Reply::text(StatusCode::OK, "Archivo actualizado")
        .with_detail(format!("{} actualizado ({} bytes)", file.name(), req.body.len())))
}

pub async fn delete(file: &FlatFile) -> Result<Reply, ApiError> {
    file.delete().await?;
    Ok(Reply::text(StatusCode::OK, "Archivo eliminado")
        .with_detail(format!("{} eliminado", file.name())))
}
