//! HTTP mapping for [`EventosError`].
//!
//! Handlers return `Result<Response, ViewError>`; the status comes from
//! [`EventosError::status_code`]. Server errors are logged and answered
//! with a generic body so internal details do not reach the client.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use eventos_core::EventosError;

/// An [`EventosError`] raised while handling a request.
#[derive(Debug)]
pub struct ViewError(pub EventosError);

impl ViewError {
    /// The HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The wrapped error.
    pub const fn inner(&self) -> &EventosError {
        &self.0
    }
}

impl From<EventosError> for ViewError {
    fn from(err: EventosError) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ViewError {}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
            "<h1>Server Error (500)</h1>".to_string()
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
            let reason = status.canonical_reason().unwrap_or("Error");
            format!("<h1>{reason}</h1>")
        };
        (status, Html(body)).into_response()
    }
}

/// Result alias for handlers.
pub type ViewResult<T> = Result<T, ViewError>;
