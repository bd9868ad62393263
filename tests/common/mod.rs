//! Shared collaborators and helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use app_gateway::apps::{App, AppEventReceiver, AppRegistry, EventBus};
use app_gateway::dispatch::{
    DefaultPages, Dispatcher, ErrorPages, HttpError, RenderError, Renderer,
};
use app_gateway::http::{RequestContext, ResponseSink};
use app_gateway::Server;

/// App registry that counts lookups.
#[derive(Default)]
pub struct CountingRegistry {
    apps: HashMap<String, App>,
    lookups: AtomicUsize,
    panic_on_lookup: bool,
    events: EventBus,
}

impl CountingRegistry {
    pub fn with_apps(apps: &[App]) -> Self {
        Self {
            apps: apps
                .iter()
                .map(|a| (a.context_path().to_string(), a.clone()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_lookup: true,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl AppRegistry for CountingRegistry {
    fn get_app(&self, context_path: &str) -> Option<App> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_lookup {
            panic!("registry unavailable");
        }
        self.apps.get(context_path).cloned()
    }

    fn subscribe(&self) -> AppEventReceiver {
        self.events.subscribe()
    }
}

/// What the recording renderer does after recording the call.
#[derive(Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail(StatusCode, &'static str),
    Unexpected(&'static str),
    Panic(&'static str),
    /// Write a partial page, then fail unexpectedly.
    PartialThenFail,
    /// Log one line naming the request path.
    LogPath,
}

pub struct RecordingRenderer {
    behavior: Behavior,
    calls: Mutex<Vec<(App, String)>>,
}

impl RecordingRenderer {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(App, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(
        &self,
        app: &App,
        request: &RequestContext,
        response: &mut ResponseSink,
    ) -> Result<(), RenderError> {
        self.calls
            .lock()
            .unwrap()
            .push((app.clone(), request.uri().to_string()));

        match self.behavior {
            Behavior::Succeed => {
                response.set_content("text/plain", format!("rendered {}", app.name()));
                Ok(())
            }
            Behavior::Fail(status, message) => Err(HttpError::new(status, message).into()),
            Behavior::Unexpected(message) => Err(RenderError::unexpected(message)),
            Behavior::Panic(message) => panic!("{}", message),
            Behavior::PartialThenFail => {
                response.set_status(StatusCode::ACCEPTED);
                response.set_content("text/html", "<html><body>half a pa");
                Err(RenderError::unexpected("template crashed"))
            }
            Behavior::LogPath => {
                tracing::info!(path = %request.path(), "rendering");
                response.set_content("text/plain", "ok");
                Ok(())
            }
        }
    }
}

/// Error pages that remember which app context each page was produced in.
pub struct RecordingPages {
    inner: DefaultPages,
    panic_on_error_page: bool,
    panic_on_favicon: bool,
    pub error_pages: Mutex<Vec<(Option<App>, StatusCode, String)>>,
    pub favicons: AtomicUsize,
}

impl RecordingPages {
    pub fn new() -> Self {
        Self {
            inner: DefaultPages::new(false),
            panic_on_error_page: false,
            panic_on_favicon: false,
            error_pages: Mutex::new(Vec::new()),
            favicons: AtomicUsize::new(0),
        }
    }

    pub fn panicking() -> Self {
        Self {
            panic_on_error_page: true,
            ..Self::new()
        }
    }

    pub fn panicking_favicon() -> Self {
        Self {
            panic_on_favicon: true,
            ..Self::new()
        }
    }

    pub fn error_pages(&self) -> Vec<(Option<App>, StatusCode, String)> {
        self.error_pages.lock().unwrap().clone()
    }
}

impl ErrorPages for RecordingPages {
    fn serve_error_page(
        &self,
        app: Option<&App>,
        request: &RequestContext,
        response: &mut ResponseSink,
        error: &HttpError,
    ) {
        self.error_pages.lock().unwrap().push((
            app.cloned(),
            error.status(),
            error.message().to_string(),
        ));
        if self.panic_on_error_page {
            panic!("error template missing");
        }
        self.inner.serve_error_page(app, request, response, error);
    }

    fn serve_default_favicon(&self, request: &RequestContext, response: &mut ResponseSink) {
        self.favicons.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_favicon {
            panic!("favicon store unavailable");
        }
        self.inner.serve_default_favicon(request, response);
    }
}

pub struct Harness {
    pub registry: Arc<CountingRegistry>,
    pub renderer: Arc<RecordingRenderer>,
    pub pages: Arc<RecordingPages>,
    pub server: Server,
}

impl Harness {
    pub fn new(registry: CountingRegistry, behavior: Behavior) -> Self {
        Self::with_pages(registry, behavior, RecordingPages::new())
    }

    pub fn with_pages(
        registry: CountingRegistry,
        behavior: Behavior,
        pages: RecordingPages,
    ) -> Self {
        let registry = Arc::new(registry);
        let renderer = Arc::new(RecordingRenderer::new(behavior));
        let pages = Arc::new(pages);
        let server = Server::new(Dispatcher::new(
            registry.clone(),
            renderer.clone(),
            pages.clone(),
        ));
        Self {
            registry,
            renderer,
            pages,
            server,
        }
    }
}

/// One event seen by `CaptureLayer`.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    /// `request_id` of the enclosing `request` span, if any.
    pub request_id: Option<u64>,
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Default)]
pub struct CapturedEvents(Arc<Mutex<Vec<CapturedEvent>>>);

impl CapturedEvents {
    pub fn all(&self) -> Vec<CapturedEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.all()
            .into_iter()
            .filter(|e| e.message == message)
            .collect()
    }
}

/// Layer recording every event together with its request correlation id.
pub struct CaptureLayer {
    events: CapturedEvents,
}

impl CaptureLayer {
    pub fn new() -> (Self, CapturedEvents) {
        let events = CapturedEvents::default();
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }
}

struct SpanRequestId(u64);

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        if let (Some(request_id), Some(span)) = (visitor.request_id, ctx.span(id)) {
            span.extensions_mut().insert(SpanRequestId(request_id));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let request_id = ctx.event_scope(event).and_then(|scope| {
            scope.from_root().find_map(|span| {
                let extensions = span.extensions();
                extensions.get::<SpanRequestId>().map(|r| r.0)
            })
        });

        self.events.0.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            request_id,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    request_id: Option<u64>,
    fields: Vec<(String, String)>,
}

impl Visit for FieldVisitor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "request_id" {
            self.request_id = Some(value);
        }
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push((field.name().to_string(), format!("{value:?}")));
        }
    }
}

/// Poll `check` until it passes or `timeout` elapses.
pub async fn eventually<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
