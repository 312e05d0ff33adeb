use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lumina_directory::DirectoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Sign-in required")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Directory(e) => match e {
                DirectoryError::Validation(v) => {
                    let body = serde_json::json!({
                        "error": self.to_string(),
                        "fields": v.issues,
                    });
                    return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(body)).into_response();
                }
                DirectoryError::Ownership { .. } => (StatusCode::FORBIDDEN, self.to_string()),
                DirectoryError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
                DirectoryError::ImageDecode(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, self.to_string())
                }
                DirectoryError::StoreUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable".to_string())
                }
            },
            ServerError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
