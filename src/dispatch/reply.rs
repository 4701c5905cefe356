//! Handler return values and handler-raised errors.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::dispatch::error::BoxError;

/// What a handler produced on success.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Body set verbatim, status left to the default.
    Plain(Value),
    /// Explicit status, body and optional redirect.
    Status(StatusResult),
}

impl Reply {
    /// A reply with no body.
    pub fn empty() -> Self {
        Reply::Plain(Value::Null)
    }

    /// Serialize `value` as the plain body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, HandlerError> {
        let value = serde_json::to_value(value).map_err(HandlerError::other)?;
        Ok(Reply::Plain(value))
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Plain(value)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Plain(Value::String(text))
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Plain(Value::String(text.to_string()))
    }
}

impl From<StatusResult> for Reply {
    fn from(result: StatusResult) -> Self {
        Reply::Status(result)
    }
}

/// Response-shaping value returned instead of a plain body.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResult {
    pub status_code: StatusCode,
    pub body: Value,
    pub redirect_url: Option<String>,
}

impl StatusResult {
    pub fn new(status_code: StatusCode, body: Value) -> Self {
        Self {
            status_code,
            body,
            redirect_url: None,
        }
    }

    /// Redirect to `url` with `status_code` and no body.
    pub fn redirect(status_code: StatusCode, url: impl Into<String>) -> Self {
        Self {
            status_code,
            body: Value::Null,
            redirect_url: Some(url.into()),
        }
    }

    pub fn with_redirect(mut self, url: impl Into<String>) -> Self {
        self.redirect_url = Some(url.into());
        self
    }
}

/// HTTP-aware error raised by handler code.
///
/// Translated 1:1 into a response with its own status and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the message is shown to the client (only below 500).
    pub fn expose(&self) -> bool {
        !self.status.is_server_error()
    }
}

/// Failure of a handler invocation.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Recognized HTTP-aware error.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Anything else; propagated without interpretation.
    #[error(transparent)]
    Other(BoxError),
}

impl HandlerError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        HandlerError::Other(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_conversions() {
        assert_eq!(Reply::from("hi"), Reply::Plain(json!("hi")));
        assert_eq!(Reply::empty(), Reply::Plain(Value::Null));

        #[derive(Serialize)]
        struct User {
            id: u32,
        }
        assert_eq!(Reply::json(&User { id: 7 }).unwrap(), Reply::Plain(json!({"id": 7})));

        let redirect: Reply = StatusResult::redirect(StatusCode::FOUND, "/login").into();
        assert!(matches!(redirect, Reply::Status(s) if s.redirect_url.as_deref() == Some("/login")));
    }

    #[test]
    fn test_http_error_expose() {
        let err = HttpError::forbidden("forbidden");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "forbidden");
        assert!(err.expose());
        assert!(!HttpError::internal("db down").expose());

        let handler_err: HandlerError = err.clone().into();
        assert!(matches!(handler_err, HandlerError::Http(e) if e == err));
    }
}
