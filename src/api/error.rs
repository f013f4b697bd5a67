use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::LibraryError;

impl LibraryError {
    /// HTTP status reported for this error kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            LibraryError::Validation(_) => StatusCode::BAD_REQUEST,
            LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
            LibraryError::Duplicate(_) | LibraryError::Conflict(_) => StatusCode::CONFLICT,
            LibraryError::BookNotAvailable(_)
            | LibraryError::BorrowerNotActive(_)
            | LibraryError::InvalidOperation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LibraryError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LibraryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            LibraryError::Unexpected(err) => {
                tracing::error!(
                    error.cause_chain = ?err,
                    error.message = %err,
                    "Unexpected error happened"
                );
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "status": status.as_u16(),
            "error": self.kind(),
            "message": message,
        });
        (status, Json(body)).into_response()
    }
}
