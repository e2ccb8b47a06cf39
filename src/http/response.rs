//! Response mapping.
//!
//! # Responsibilities
//! - Map router errors to HTTP status codes
//! - Keep error bodies as plain text
//!
//! # Design Decisions
//! - One mapping for every handler
//! - Total outages report 503 with a read or write flavoured message

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::RouterError;

pub const READS_UNAVAILABLE: &str = "Data is currently unavailable";
pub const WRITES_UNAVAILABLE: &str = "Data updates are currently unavailable";
pub const NOT_FOUND: &str = "Appointment not found";

/// Error returned by appointment handlers.
#[derive(Debug)]
pub enum ApiError {
    /// No node was available when the request arrived.
    Unavailable(&'static str),
    /// The request body or query could not be used.
    BadRequest(String),
    Router(RouterError),
}

impl From<RouterError> for ApiError {
    fn from(err: RouterError) -> Self {
        ApiError::Router(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Router(err) => match err {
                RouterError::NoAvailableNode => StatusCode::SERVICE_UNAVAILABLE,
                RouterError::NotFound(_) => StatusCode::NOT_FOUND,
                RouterError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                RouterError::Conflict(_) => StatusCode::CONFLICT,
                RouterError::AllNodesFailed { .. } | RouterError::PartialMove { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Unavailable(message) => message.to_string(),
            ApiError::BadRequest(message) => message,
            ApiError::Router(RouterError::NotFound(_)) => NOT_FOUND.to_string(),
            ApiError::Router(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                }
                err.to_string()
            }
        };
        (status, body).into_response()
    }
}
