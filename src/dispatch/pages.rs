//! Error pages and the built-in favicon.
//!
//! # Responsibilities
//! - Produce a complete response for any `HttpError`
//! - Theme error pages with the resolved app when there is one
//! - Serve the default favicon without touching any app
//!
//! # Design Decisions
//! - Cause chains are only exposed in dev mode
//! - Favicon bytes are loaded once at startup and shared

use std::error::Error as _;
use std::fmt::Write as _;

use axum::body::Bytes;
use axum::http::{header, HeaderValue, StatusCode};

use crate::apps::App;
use crate::config::ServerConfig;
use crate::dispatch::error::HttpError;
use crate::http::{RequestContext, ResponseSink};

/// Produces error and favicon responses.
pub trait ErrorPages: Send + Sync {
    /// Write a complete error response. `app` is the app the request had been
    /// resolved to before failing, if any.
    fn serve_error_page(
        &self,
        app: Option<&App>,
        request: &RequestContext,
        response: &mut ResponseSink,
        error: &HttpError,
    );

    fn serve_default_favicon(&self, request: &RequestContext, response: &mut ResponseSink);
}

/// 1x1 transparent 32-bit icon.
const EMBEDDED_FAVICON: &[u8] = &[
    // ICONDIR
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
    // ICONDIRENTRY: 1x1, 32bpp, 48 bytes at offset 22
    0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x20, 0x00,
    0x30, 0x00, 0x00, 0x00, 0x16, 0x00, 0x00, 0x00,
    // BITMAPINFOHEADER (height doubled for the AND mask)
    0x28, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x20, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    // BGRA pixel
    0x00, 0x00, 0x00, 0x00,
    // AND mask row
    0x00, 0x00, 0x00, 0x00,
];

/// Stock HTML error pages.
#[derive(Debug, Clone)]
pub struct DefaultPages {
    dev_mode: bool,
    favicon: Bytes,
}

impl DefaultPages {
    pub fn new(dev_mode: bool) -> Self {
        Self {
            dev_mode,
            favicon: Bytes::from_static(EMBEDDED_FAVICON),
        }
    }

    pub fn with_favicon(mut self, favicon: impl Into<Bytes>) -> Self {
        self.favicon = favicon.into();
        self
    }

    /// Build from config, falling back to the embedded icon when the
    /// configured favicon cannot be read.
    pub fn from_config(config: &ServerConfig) -> Self {
        let pages = Self::new(config.dev_mode);
        let Some(path) = &config.favicon_file else {
            return pages;
        };
        match std::fs::read(path) {
            Ok(bytes) => {
                tracing::info!(path = %path.display(), size = bytes.len(), "Loaded favicon");
                pages.with_favicon(bytes)
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Cannot read favicon, using built-in icon"
                );
                pages
            }
        }
    }

    fn render_page(&self, app: Option<&App>, error: &HttpError) -> String {
        let status = error.status();
        let reason = status.canonical_reason().unwrap_or("Error");
        let title = match app {
            Some(app) => format!("{} {} | {}", status.as_u16(), reason, escape_html(app.name())),
            None => format!("{} {}", status.as_u16(), reason),
        };

        let mut page = String::with_capacity(256);
        let _ = write!(
            page,
            "<!DOCTYPE html>\n<html><head><title>{title}</title></head><body>\
             <h1>{code} {reason}</h1><p>{message}</p>",
            code = status.as_u16(),
            message = escape_html(error.message()),
        );

        if self.dev_mode {
            let mut source = error.source();
            if source.is_some() {
                page.push_str("<h2>Caused by</h2><ol>");
                while let Some(cause) = source {
                    let _ = write!(page, "<li>{}</li>", escape_html(&cause.to_string()));
                    source = cause.source();
                }
                page.push_str("</ol>");
            }
        }

        page.push_str("</body></html>\n");
        page
    }
}

impl Default for DefaultPages {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ErrorPages for DefaultPages {
    fn serve_error_page(
        &self,
        app: Option<&App>,
        _request: &RequestContext,
        response: &mut ResponseSink,
        error: &HttpError,
    ) {
        response.set_status(error.status());
        response.set_content("text/html; charset=utf-8", self.render_page(app, error));
    }

    fn serve_default_favicon(&self, _request: &RequestContext, response: &mut ResponseSink) {
        response.set_status(StatusCode::OK);
        response.set_content("image/x-icon", self.favicon.clone());
        response.insert_header(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=86400"),
        );
    }
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
