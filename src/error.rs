use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("malformed request payload")]
    MalformedPayload,

    #[error("missing required fields: estudiante and estadoAsistencia")]
    MissingFields,

    #[error("student '{0}' not found")]
    StudentNotFound(String),

    #[error("{0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload | AppError::MissingFields => StatusCode::BAD_REQUEST,
            AppError::StudentNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(%status, "{self}");

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
