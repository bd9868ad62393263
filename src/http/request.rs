//! Inbound request description.
//!
//! # Responsibilities
//! - Parse a raw request target (origin-form or absolute-form)
//! - Decide validity (escapes, UTF-8, path shape)
//! - Derive the context path that selects an app
//!
//! # Design Decisions
//! - Immutable after construction; connectors build one per request
//! - Invalid requests still carry the raw URI so error pages can quote it
//! - Validation never fails loudly: it only flips `is_valid()`

use std::fmt;

use axum::http::{HeaderMap, Method};
use percent_encoding::percent_decode_str;
use url::Url;

/// Path reserved for the built-in favicon.
pub const DEFAULT_FAVICON_PATH: &str = "/favicon.ico";

/// One inbound request as seen by the dispatch core.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: String,
    headers: HeaderMap,
    target: Option<Target>,
}

#[derive(Debug, Clone)]
struct Target {
    path: String,
    query: Option<String>,
    context_path: String,
    uri_without_context_path: String,
}

impl RequestContext {
    /// Build a context from a raw request target such as `/shop/cart?id=1`
    /// or `http://host/shop/cart`.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let target = parse_target(&uri);
        Self {
            method: Method::GET,
            uri,
            headers: HeaderMap::new(),
            target,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The raw request target exactly as received.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Decoded path, empty for invalid requests.
    pub fn path(&self) -> &str {
        self.target.as_ref().map_or("", |t| t.path.as_str())
    }

    pub fn query(&self) -> Option<&str> {
        self.target.as_ref().and_then(|t| t.query.as_deref())
    }

    /// First path segment with its leading slash, e.g. `/shop`.
    pub fn context_path(&self) -> &str {
        self.target.as_ref().map_or("", |t| t.context_path.as_str())
    }

    /// Path inside the app, always starting with `/`.
    pub fn uri_without_context_path(&self) -> &str {
        self.target
            .as_ref()
            .map_or("", |t| t.uri_without_context_path.as_str())
    }

    pub fn is_valid(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_default_favicon_request(&self) -> bool {
        self.path() == DEFAULT_FAVICON_PATH
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

fn parse_target(uri: &str) -> Option<Target> {
    let (raw_path, query) = split_target(uri)?;
    if !has_valid_escapes(&raw_path) {
        return None;
    }
    let path = percent_decode_str(&raw_path).decode_utf8().ok()?.into_owned();
    if !is_well_formed(&path) {
        return None;
    }

    let (context_path, rest) = match path[1..].find('/') {
        Some(idx) => (path[..idx + 1].to_string(), path[idx + 1..].to_string()),
        None => (path.clone(), "/".to_string()),
    };

    Some(Target {
        path,
        query,
        context_path,
        uri_without_context_path: rest,
    })
}

/// Split a request target into its raw (still encoded) path and query.
///
/// Absolute-form targets are only checked for shape by `Url`; the path is
/// sliced from the raw text so dot segments are never resolved away.
fn split_target(uri: &str) -> Option<(String, Option<String>)> {
    if uri.starts_with('/') {
        return Some(split_origin_form(uri));
    }

    let url = Url::parse(uri).ok()?;
    if url.cannot_be_a_base() {
        return None;
    }
    let (_, after_scheme) = uri.split_once("://")?;
    let origin_form = after_scheme
        .find(['/', '?', '#'])
        .map_or("", |at| &after_scheme[at..]);
    Some(split_origin_form(origin_form))
}

fn split_origin_form(target: &str) -> (String, Option<String>) {
    let without_fragment = target.split('#').next().unwrap_or_default();
    match without_fragment.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (without_fragment.to_string(), None),
    }
}

fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = |at: usize| bytes.get(at).is_some_and(u8::is_ascii_hexdigit);
            if !(hex(i + 1) && hex(i + 2)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

fn is_well_formed(path: &str) -> bool {
    path.len() >= 2
        && path.starts_with('/')
        && !path.contains("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
        && !path.split('/').any(|segment| segment == "." || segment == "..")
}
