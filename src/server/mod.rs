//! Server façade.
//!
//! # Responsibilities
//! - Single entry point connectors call per request
//! - Assign a correlation id and scope all request logging to it
//! - Own the live connector set and relay app path announcements
//!
//! # Data Flow
//! ```text
//! connector → ServerConnection → ServerCore::serve
//!     → RequestScope::enter(counter.next())
//!     → Dispatcher::serve
//!     → scope dropped (span exited), sink returned
//!
//! AppRegistry::subscribe() → notifier task → ConnectorRegistry broadcast
//! ```

pub mod scope;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::apps::{AppEvent, AppEventReceiver};
use crate::connector::{Connector, ConnectorRegistry, ServerConnection};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::http::{RequestContext, ResponseSink};

pub use scope::{RequestCounter, RequestScope};

/// Per-request part of the server, shared with every installed connection.
struct ServerCore {
    counter: RequestCounter,
    dispatcher: Dispatcher,
}

impl ServerCore {
    fn serve(&self, request: &RequestContext, response: &mut ResponseSink) -> DispatchOutcome {
        let scope = RequestScope::enter(self.counter.next());
        tracing::trace!(request = %request, "Serving request");
        self.dispatcher.serve(&scope, request, response)
    }
}

/// Front door of the gateway.
pub struct Server {
    core: Arc<ServerCore>,
    connectors: Arc<ConnectorRegistry>,
}

impl Server {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            core: Arc::new(ServerCore {
                counter: RequestCounter::new(),
                dispatcher,
            }),
            connectors: Arc::new(ConnectorRegistry::new()),
        }
    }

    /// Serve one request into `response`.
    pub fn serve_into(
        &self,
        request: &RequestContext,
        response: &mut ResponseSink,
    ) -> DispatchOutcome {
        self.core.serve(request, response)
    }

    /// Serve one request and hand back the filled sink.
    pub fn serve(&self, request: RequestContext) -> ResponseSink {
        let mut response = ResponseSink::new();
        self.core.serve(&request, &mut response);
        response
    }

    /// Callback to install into a connector.
    pub fn connection(&self) -> ServerConnection {
        let core = self.core.clone();
        ServerConnection::new(move |request| {
            let mut response = ResponseSink::new();
            core.serve(&request, &mut response);
            response
        })
    }

    pub fn register_connector(&self, connector: Arc<dyn Connector>) -> bool {
        self.connectors.register(connector, self.connection())
    }

    pub fn unregister_connector(&self, connector: &Arc<dyn Connector>) -> bool {
        self.connectors.unregister(connector)
    }

    pub fn connectors(&self) -> &ConnectorRegistry {
        &self.connectors
    }

    /// An app became servable at `context_path`.
    pub fn on_app_path_registered(&self, context_path: &str) -> usize {
        self.connectors.on_app_path_registered(context_path)
    }

    /// Relay app events to connectors until shutdown or until the registry
    /// drops its side of the channel.
    pub fn spawn_notifier(
        &self,
        mut events: AppEventReceiver,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let connectors = self.connectors.clone();
        tokio::spawn(async move {
            tracing::debug!("App event notifier started");
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Some(AppEvent::PathRegistered(path)) => {
                            connectors.on_app_path_registered(&path);
                        }
                        None => {
                            tracing::debug!("App event channel closed");
                            break;
                        }
                    },
                    _ = shutdown.recv() => {
                        tracing::debug!("App event notifier received shutdown signal");
                        break;
                    }
                }
            }
        })
    }

    /// Number of requests that entered the server (modulo wraparound).
    pub fn requests_served(&self) -> u64 {
        self.core.counter.current()
    }
}
