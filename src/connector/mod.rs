//! Transport connectors.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Server::register_connector
//!     → registry.rs (install ServerConnection, add to live set)
//!
//! Per request:
//!     transport (http.rs / axum)
//!     → ServerConnection::call(RequestContext) → ResponseSink
//!     → transport writes the response
//!
//! App deployed:
//!     AppEvent::PathRegistered
//!     → registry.rs broadcast over a snapshot of live connectors
//!     → Connector::register_context_path
//! ```
//!
//! # Design Decisions
//! - The live set is copy-on-write: broadcasts never hold a lock
//! - Connectors registered after a path was announced do not receive it

pub mod http;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use crate::http::{RequestContext, ResponseSink};

pub use self::http::HttpConnector;
pub use registry::ConnectorRegistry;

/// A transport adapter that feeds requests into the server.
pub trait Connector: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Install (or clear, with `None`) the callback used to serve requests.
    fn set_server_connection(&self, connection: Option<ServerConnection>);

    /// Expose `context_path` at the transport layer.
    fn register_context_path(&self, context_path: &str);
}

type ServeFn = dyn Fn(RequestContext) -> ResponseSink + Send + Sync;

/// Callback a connector invokes once per request.
#[derive(Clone)]
pub struct ServerConnection {
    serve: Arc<ServeFn>,
}

impl ServerConnection {
    pub fn new<F>(serve: F) -> Self
    where
        F: Fn(RequestContext) -> ResponseSink + Send + Sync + 'static,
    {
        Self {
            serve: Arc::new(serve),
        }
    }

    pub fn call(&self, request: RequestContext) -> ResponseSink {
        (self.serve)(request)
    }
}

impl fmt::Debug for ServerConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConnection").finish_non_exhaustive()
    }
}
