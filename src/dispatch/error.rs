//! Failures surfaced while dispatching a request.

use axum::http::StatusCode;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error that maps directly to an HTTP status and a human readable message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
    #[source]
    cause: Option<BoxError>,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn bad_request(uri: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("Invalid URI '{uri}'."))
    }

    pub fn not_found(context_path: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("Cannot find an app for context path '{context_path}'."),
        )
    }

    /// Wrap an unexpected failure as a 500 carrying its message and the failure itself.
    pub fn internal(cause: BoxError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: cause.to_string(),
            cause: Some(cause),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

/// What a renderer may report back to the dispatcher.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Structured failure with an explicit status; served as-is.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Anything else; always becomes a 500.
    #[error(transparent)]
    Unexpected(BoxError),
}

impl RenderError {
    pub fn unexpected(cause: impl Into<BoxError>) -> Self {
        Self::Unexpected(cause.into())
    }
}

/// A collaborator panicked while serving a request.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PanicError(pub String);

impl PanicError {
    pub fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "request handler panicked".to_string());
        Self(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_messages_quote_their_subject() {
        assert_eq!(HttpError::bad_request("/%zz").to_string(), "Invalid URI '/%zz'.");
        assert_eq!(
            HttpError::not_found("/shop").to_string(),
            "Cannot find an app for context path '/shop'."
        );
    }

    #[test]
    fn test_internal_keeps_cause() {
        let io = std::io::Error::other("disk on fire");
        let error = HttpError::internal(Box::new(io));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message(), "disk on fire");
        assert!(error.source().is_some());
    }

    #[test]
    fn test_panic_payloads() {
        let static_str: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(PanicError::from_payload(static_str.as_ref()).0, "boom");

        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(PanicError::from_payload(owned.as_ref()).0, "bang");

        let other: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(PanicError::from_payload(other.as_ref()).0, "request handler panicked");
    }
}
