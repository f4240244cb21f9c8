use hyper::StatusCode;
use thiserror::Error;

use crate::store::{StoreError, ValidationError};

/// Failures a handler can report; the dispatcher turns them into responses.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("JSON inválido: {0}")]
    Decode(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Método no permitido")]
    MethodNotAllowed,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.0)
    }
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::Store(StoreError::NotFound(_) | StoreError::FileNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to send to the caller; server-side failures stay generic
    pub fn public_message(&self) -> String {
        match self {
            Self::Store(StoreError::FileNotFound(_)) => "Archivo no encontrado".to_string(),
            err if err.status().is_server_error() => "Error interno del servidor".to_string(),
            err => err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Decode("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Store(StoreError::NotFound(3)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "disk on fire");
        assert_eq!(
            ApiError::Store(StoreError::Io(io)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_internal_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "disk on fire");
        let err = ApiError::Store(StoreError::Io(io));
        assert_eq!(err.public_message(), "Error interno del servidor");
        assert!(err.to_string().contains("disk on fire"));

        let err = ApiError::Store(StoreError::FileNotFound(PathBuf::from("/srv/messages.txt")));
        assert_eq!(err.public_message(), "Archivo no encontrado");

        let err = ApiError::Store(StoreError::NotFound(999));
        assert_eq!(err.public_message(), "Producto 999 no encontrado");
    }
}
