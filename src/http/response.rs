//! Response sink written by the dispatch core.
//!
//! # Responsibilities
//! - Hold status, headers and body for exactly one request
//! - Convert into an axum response at the connector boundary
//!
//! # Design Decisions
//! - Owned by the connector for the lifetime of one request
//! - Body is `Bytes` so favicon/static payloads are shared, not copied

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Mutable response handle filled in by the dispatcher and its collaborators.
#[derive(Debug, Clone)]
pub struct ResponseSink {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Replace the body and its content type in one step.
    pub fn set_content(&mut self, content_type: &'static str, body: impl Into<Bytes>) {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body = body.into();
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text, lossy.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Drop everything written so far.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for ResponseSink {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_empty_ok() {
        let sink = ResponseSink::new();
        assert_eq!(sink.status(), StatusCode::OK);
        assert!(sink.body().is_empty());
        assert!(sink.content_type().is_none());
    }

    #[test]
    fn test_into_response_keeps_parts() {
        let mut sink = ResponseSink::new();
        sink.set_status(StatusCode::NOT_FOUND);
        sink.set_content("text/plain", "missing");
        sink.insert_header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let response = sink.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[test]
    fn test_reset_clears_partial_output() {
        let mut sink = ResponseSink::new();
        sink.set_status(StatusCode::ACCEPTED);
        sink.set_content("text/html", "<p>half");
        sink.reset();
        assert_eq!(sink.status(), StatusCode::OK);
        assert!(sink.body().is_empty());
        assert!(sink.headers().is_empty());
    }
}
