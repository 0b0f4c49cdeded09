use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{HttpStatusCode, VacationStayError};

/// JSON body returned for every failed request.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// RFC 3339 time the error was produced.
    pub timestamp: String,
    pub status: u16,
    /// Canonical reason phrase of `status`, e.g. "Not Found".
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

/// Simple `{ "message": ... }` body for endpoints without a richer payload.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Extension trait for VacationStayError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for VacationStayError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Server-side failures are logged in full but not echoed to clients.
        let message = if status_code.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "An unexpected error occurred".to_string()
        } else {
            tracing::debug!("Request rejected ({}): {}", status_code, self);
            self.to_string()
        };

        let details = match self {
            VacationStayError::FieldErrors { details, .. } => Some(details),
            _ => None,
        };

        let body = ErrorResponse {
            timestamp: chrono::Utc::now().to_rfc3339(),
            status: status_code.as_u16(),
            error: status_code
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message,
            details,
        };

        (status_code, Json(body)).into_response()
    }
}

impl IntoResponse for VacationStayError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Convert a Result<T, VacationStayError> to a Result<Json<T>, Response>.
pub fn handle_json_result<T>(result: Result<T, VacationStayError>) -> Result<Json<T>, Response>
where
    T: serde::Serialize,
{
    result.map(Json).map_err(|err| err.into_response())
}

/// Convert a Result<T, E> to a Result<Json<T>, Response> using a custom error mapper.
pub fn map_json_error<T, E, F>(result: Result<T, E>, f: F) -> Result<Json<T>, Response>
where
    T: serde::Serialize,
    F: FnOnce(E) -> VacationStayError,
{
    result.map(Json).map_err(|err| f(err).into_response())
}
