//! Request routing and failure containment.
//!
//! # Routing
//! ```text
//! invalid URI          → 400 error page (no app lookup)
//! /favicon.ico         → default favicon (no app lookup)
//! no app for path      → 404 error page
//! app found            → renderer
//! ```
//!
//! # Failure boundary
//! Renderer errors and panics from any collaborator are contained here and
//! turned into an error page, themed by the resolved app when one exists.
//! Every call leaves exactly one complete response in the sink.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;

use crate::apps::{App, AppRegistry};
use crate::dispatch::error::{HttpError, PanicError, RenderError};
use crate::dispatch::pages::ErrorPages;
use crate::dispatch::render::Renderer;
use crate::http::{RequestContext, ResponseSink};
use crate::observability::metrics;
use crate::server::RequestScope;

/// How a request left the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    BadRequest,
    Favicon,
    NotFound,
    Rendered,
    /// The renderer reported a structured failure with this status.
    RenderFailed(StatusCode),
    /// Unexpected failure, answered with 500.
    Failed,
}

impl DispatchOutcome {
    /// Status the response was written with.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchOutcome::BadRequest => StatusCode::BAD_REQUEST,
            DispatchOutcome::Favicon | DispatchOutcome::Rendered => StatusCode::OK,
            DispatchOutcome::NotFound => StatusCode::NOT_FOUND,
            DispatchOutcome::RenderFailed(status) => *status,
            DispatchOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::BadRequest => "bad_request",
            DispatchOutcome::Favicon => "favicon",
            DispatchOutcome::NotFound => "not_found",
            DispatchOutcome::Rendered => "rendered",
            DispatchOutcome::RenderFailed(_) => "render_failed",
            DispatchOutcome::Failed => "failed",
        }
    }
}

/// Routes requests to apps and turns every failure into a response.
pub struct Dispatcher {
    apps: Arc<dyn AppRegistry>,
    renderer: Arc<dyn Renderer>,
    pages: Arc<dyn ErrorPages>,
}

impl Dispatcher {
    pub fn new(
        apps: Arc<dyn AppRegistry>,
        renderer: Arc<dyn Renderer>,
        pages: Arc<dyn ErrorPages>,
    ) -> Self {
        Self {
            apps,
            renderer,
            pages,
        }
    }

    /// Serve one request into `response`. Never panics and never returns
    /// without a complete response.
    pub fn serve(
        &self,
        scope: &RequestScope,
        request: &RequestContext,
        response: &mut ResponseSink,
    ) -> DispatchOutcome {
        let started = Instant::now();
        let mut resolved: Option<App> = None;

        let routed = panic::catch_unwind(AssertUnwindSafe(|| {
            self.route(request, response, &mut resolved)
        }));

        let outcome = match routed {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(RenderError::Http(error))) => {
                tracing::warn!(
                    request_id = scope.id(),
                    request = %request,
                    status = error.status().as_u16(),
                    error = %error,
                    "Renderer reported a failure"
                );
                self.error_page(resolved.as_ref(), request, response, &error);
                DispatchOutcome::RenderFailed(error.status())
            }
            Ok(Err(RenderError::Unexpected(cause))) => {
                tracing::error!(
                    request_id = scope.id(),
                    request = %request,
                    error = %cause,
                    details = ?cause,
                    "An unexpected error occurred while serving the request"
                );
                let error = HttpError::internal(cause);
                self.error_page(resolved.as_ref(), request, response, &error);
                DispatchOutcome::Failed
            }
            Err(payload) => {
                let cause = PanicError::from_payload(payload.as_ref());
                tracing::error!(
                    request_id = scope.id(),
                    request = %request,
                    panic = %cause,
                    "Request handling panicked"
                );
                let error = HttpError::internal(Box::new(cause));
                self.error_page(resolved.as_ref(), request, response, &error);
                DispatchOutcome::Failed
            }
        };

        tracing::debug!(
            outcome = outcome.label(),
            status = outcome.status().as_u16(),
            app = resolved.as_ref().map(App::name),
            "Request dispatched"
        );
        metrics::record_dispatch(&outcome, started);
        outcome
    }

    fn route(
        &self,
        request: &RequestContext,
        response: &mut ResponseSink,
        resolved: &mut Option<App>,
    ) -> Result<DispatchOutcome, RenderError> {
        if !request.is_valid() {
            self.error_page(None, request, response, &HttpError::bad_request(request.uri()));
            return Ok(DispatchOutcome::BadRequest);
        }

        if request.is_default_favicon_request() {
            self.pages.serve_default_favicon(request, response);
            return Ok(DispatchOutcome::Favicon);
        }

        let Some(app) = self.apps.get_app(request.context_path()) else {
            let error = HttpError::not_found(request.context_path());
            self.error_page(None, request, response, &error);
            return Ok(DispatchOutcome::NotFound);
        };

        let app = resolved.insert(app);
        self.renderer.render(app, request, response)?;
        Ok(DispatchOutcome::Rendered)
    }

    /// Write an error page over whatever was in the sink. If the page
    /// producer itself panics, fall back to plain text.
    fn error_page(
        &self,
        app: Option<&App>,
        request: &RequestContext,
        response: &mut ResponseSink,
        error: &HttpError,
    ) {
        response.reset();
        let served = panic::catch_unwind(AssertUnwindSafe(|| {
            self.pages.serve_error_page(app, request, response, error)
        }));
        if served.is_err() {
            tracing::error!(
                status = error.status().as_u16(),
                "Error page producer panicked, answering in plain text"
            );
            response.reset();
            response.set_status(error.status());
            response.set_content(
                "text/plain; charset=utf-8",
                format!("{} {}", error.status(), error.message()),
            );
        }
    }
}
