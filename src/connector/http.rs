//! HTTP connector built on Axum.
//!
//! # Responsibilities
//! - Accept HTTP/1.1 traffic on a listener
//! - Turn each request into a `RequestContext` and run the installed
//!   `ServerConnection` off the async reactor
//! - Track which context paths have been exposed on this connector
//!
//! # Design Decisions
//! - Catch-all route: routing decisions belong to the dispatcher
//! - No installed connection means the server is not ready: 503
//! - Request timeout enforced here, not in the core
//! - Dispatch runs on the blocking pool inside the caller's span, so core
//!   log lines nest under the `TraceLayer` request span

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use dashmap::DashSet;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::connector::{Connector, ServerConnection};
use crate::http::{RequestContext, ResponseSink};

/// Axum-backed transport.
pub struct HttpConnector {
    name: String,
    request_timeout: Duration,
    connection: ArcSwapOption<ServerConnection>,
    paths: DashSet<String>,
}

impl HttpConnector {
    pub fn new(name: impl Into<String>, request_timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            request_timeout,
            connection: ArcSwapOption::empty(),
            paths: DashSet::new(),
        })
    }

    /// Context paths exposed so far, sorted.
    pub fn registered_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.paths.iter().map(|p| p.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn is_connected(&self) -> bool {
        self.connection.load().is_some()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(self: &Arc<Self>) -> Router {
        Router::new()
            .route("/", any(handle))
            .route("/{*path}", any(handle))
            .with_state(self.clone())
            .layer(TimeoutLayer::new(self.request_timeout))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until a shutdown signal arrives.
    pub async fn run(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(connector = %self.name, address = %addr, "HTTP connector listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(connector = %self.name, "HTTP connector stopped");
        Ok(())
    }
}

impl Connector for HttpConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_server_connection(&self, connection: Option<ServerConnection>) {
        self.connection.store(connection.map(Arc::new));
    }

    fn register_context_path(&self, context_path: &str) {
        if self.paths.insert(context_path.to_string()) {
            tracing::info!(
                connector = %self.name,
                context_path = %context_path,
                "Context path exposed"
            );
        }
    }
}

async fn handle(State(connector): State<Arc<HttpConnector>>, request: Request<Body>) -> Response {
    let Some(connection) = connector.connection.load_full() else {
        tracing::warn!(
            connector = %connector.name,
            uri = %request.uri(),
            "No server connection installed"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Server is not accepting requests")
            .into_response();
    };

    let (parts, _body) = request.into_parts();
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.to_string());
    let context = RequestContext::new(target)
        .with_method(parts.method)
        .with_headers(parts.headers);

    match call_blocking(connection, context).await {
        Ok(sink) => sink.into_response(),
        Err(e) => {
            tracing::error!(connector = %connector.name, error = %e, "Request task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Run `connection` on the blocking pool under the current span and
/// subscriber.
async fn call_blocking(
    connection: Arc<ServerConnection>,
    context: RequestContext,
) -> Result<ResponseSink, JoinError> {
    let span = tracing::Span::current();
    let dispatch = tracing::dispatcher::get_default(|d| d.clone());
    tokio::task::spawn_blocking(move || {
        tracing::dispatcher::with_default(&dispatch, || {
            span.in_scope(|| connection.call(context))
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tracing::Instrument;

    use super::*;

    #[test]
    fn test_connection_install_and_clear() {
        let connector = HttpConnector::new("http", Duration::from_secs(5));
        assert!(!connector.is_connected());

        connector.set_server_connection(Some(ServerConnection::new(|_| Default::default())));
        assert!(connector.is_connected());

        connector.set_server_connection(None);
        assert!(!connector.is_connected());
    }

    #[test]
    fn test_paths_are_deduplicated() {
        let connector = HttpConnector::new("http", Duration::from_secs(5));
        connector.register_context_path("/shop");
        connector.register_context_path("/blog");
        connector.register_context_path("/shop");
        assert_eq!(
            connector.registered_paths(),
            vec!["/blog".to_string(), "/shop".to_string()]
        );
    }

    #[tokio::test]
    async fn test_blocking_dispatch_runs_in_caller_span() {
        let _subscriber = tracing::subscriber::set_default(tracing_subscriber::registry());

        let seen = Arc::new(Mutex::new(None));
        let seen_in_call = seen.clone();
        let connection = Arc::new(ServerConnection::new(move |_| {
            *seen_in_call.lock().unwrap() = tracing::Span::current().id();
            ResponseSink::new()
        }));

        let request_span = tracing::info_span!("http_request");
        let response = call_blocking(connection, RequestContext::new("/shop"))
            .instrument(request_span.clone())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(request_span.id().is_some());
        assert_eq!(*seen.lock().unwrap(), request_span.id());
    }
}
