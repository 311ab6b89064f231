use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};

use crate::{
    error::AppError,
    models::{RegisterOutcome, RegisterRequest},
    state::AppState,
};

/// The proxy in front of this service sometimes re-encodes the JSON body as
/// a JSON string. Accept both shapes before validating.
pub fn normalize_payload(body: &Bytes) -> Result<RegisterRequest, AppError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| AppError::MalformedPayload)?;
    let value = match value {
        Value::String(inner) => {
            serde_json::from_str(&inner).map_err(|_| AppError::MalformedPayload)?
        }
        other => other,
    };
    serde_json::from_value(value).map_err(|_| AppError::MalformedPayload)
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request = normalize_payload(&body)?;

    let body = match state.registrar.register(request).await? {
        RegisterOutcome::Duplicate {
            student_id,
            fecha,
            existing,
        } => json!({
            "message": "student already has attendance registered today",
            "existingRecord": existing,
            "studentID": student_id,
            "fecha": fecha,
        }),
        RegisterOutcome::Registered {
            created: _,
            student_id,
            estudiante,
            fecha,
            hora,
            curso,
            estado,
        } => json!({
            "message": "attendance registered successfully",
            "studentID": student_id,
            "estudiante": estudiante,
            "fecha": fecha,
            "hora": hora,
            "curso": curso,
            "estado": estado,
        }),
    };

    Ok((StatusCode::OK, Json(body)))
}

/// Public store configuration for the browser-side bootstrap.
pub async fn store_config_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.config.client_config()))
}

pub async fn health_handler() -> impl IntoResponse {
    StatusCode::OK
}
