//! `POST /{operation}` -- invokes a registered operation with a JSON payload.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::error;

use super::AppState;
use crate::service::OperationError;

/// Parses the request body as JSON. An empty or all-whitespace body is `{}`.
fn parse_payload(body: &[u8]) -> Result<Value, OperationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| OperationError::InvalidPayload(e.to_string()))
}

/// HTTP status for each pipeline error.
fn status_for(err: &OperationError) -> StatusCode {
    match err {
        OperationError::UnknownOperation { .. } => StatusCode::NOT_FOUND,
        OperationError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        OperationError::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
        OperationError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        OperationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for OperationError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "operation failed");
        }
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// Invokes the operation named by the path with the JSON request body.
///
/// Responds with the handler's JSON result, or a JSON error object with a
/// status derived from the failure. The call counts as in flight until the
/// response is produced, so graceful shutdown waits for it.
pub async fn invoke_handler(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, OperationError> {
    let _guard = state.shutdown.in_flight_guard();
    let payload = parse_payload(&body)?;
    let response = state.operations.dispatch(&operation, payload).await?;
    Ok(Json(response.body))
}
