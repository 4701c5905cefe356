//! Request-time error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::dispatch::reply::HttpError;
use crate::metadata::ConfigurationError;

/// Boxed error carried by unclassified failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Defect in the request data found while resolving parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClientError {
    status: StatusCode,
    message: String,
}

impl ClientError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Everything that can end a request inside the engine.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Parameter resolution rejected the request.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The handler raised an HTTP-aware error.
    #[error(transparent)]
    Handler(#[from] HttpError),

    /// Metadata turned out to be malformed at request time.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Any other handler failure, passed through untouched.
    #[error("{0}")]
    Unclassified(BoxError),
}

impl DispatchError {
    /// Status the failure renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Client(e) => e.status(),
            DispatchError::Handler(e) => e.status(),
            DispatchError::Configuration(_) | DispatchError::Unclassified(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for failures the engine classified into a status and message.
    pub fn is_classified(&self) -> bool {
        matches!(self, DispatchError::Client(_) | DispatchError::Handler(_))
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        match self {
            DispatchError::Client(e) => render(e.status(), e.message()),
            DispatchError::Handler(e) => render(e.status(), e.message()),
            DispatchError::Configuration(e) => {
                tracing::error!(error = %e, "Malformed route metadata");
                render(StatusCode::INTERNAL_SERVER_ERROR, "")
            }
            DispatchError::Unclassified(e) => {
                tracing::error!(error = %e, "Unhandled handler failure");
                render(StatusCode::INTERNAL_SERVER_ERROR, "")
            }
        }
    }
}

/// Render `(status, message)`; messages of 5xx errors are not exposed.
fn render(status: StatusCode, message: &str) -> Response {
    if status.is_server_error() || message.is_empty() {
        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason.to_string()).into_response()
    } else {
        (status, message.to_string()).into_response()
    }
}
