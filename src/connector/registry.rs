//! Live connector set.
//!
//! # Responsibilities
//! - Install/clear the server callback on (un)registration
//! - Broadcast newly routable context paths to every live connector
//!
//! # Design Decisions
//! - `ArcSwap` snapshot for readers, `Mutex` to serialise writers
//! - Connector identity is `Arc` pointer identity
//! - A registration racing a broadcast may or may not see that broadcast

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::connector::{Connector, ServerConnection};
use crate::observability::metrics;

type ConnectorSet = Vec<Arc<dyn Connector>>;

pub struct ConnectorRegistry {
    live: ArcSwap<ConnectorSet>,
    writer: Mutex<()>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            live: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
        }
    }

    /// Install `connection` into `connector` and add it to the live set.
    ///
    /// Returns false if the connector was already registered; its callback
    /// is re-installed either way.
    pub fn register(&self, connector: Arc<dyn Connector>, connection: ServerConnection) -> bool {
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        connector.set_server_connection(Some(connection));

        let current = self.live.load_full();
        if current.iter().any(|c| Arc::ptr_eq(c, &connector)) {
            tracing::debug!(connector = %connector.name(), "Connector already registered");
            return false;
        }

        let mut next: ConnectorSet = current.iter().cloned().collect();
        next.push(connector.clone());
        let count = next.len();
        self.live.store(Arc::new(next));

        tracing::info!(connector = %connector.name(), connectors = count, "Connector registered");
        metrics::set_connector_count(count);
        true
    }

    /// Clear the connector's callback and drop it from the live set.
    pub fn unregister(&self, connector: &Arc<dyn Connector>) -> bool {
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        connector.set_server_connection(None);

        let current = self.live.load_full();
        let next: ConnectorSet = current
            .iter()
            .filter(|c| !Arc::ptr_eq(c, connector))
            .cloned()
            .collect();
        if next.len() == current.len() {
            return false;
        }
        let count = next.len();
        self.live.store(Arc::new(next));

        tracing::info!(connector = %connector.name(), connectors = count, "Connector unregistered");
        metrics::set_connector_count(count);
        true
    }

    /// Tell every live connector that `context_path` is routable.
    ///
    /// Returns the number of connectors notified.
    pub fn on_app_path_registered(&self, context_path: &str) -> usize {
        let snapshot = self.live.load_full();
        for connector in snapshot.iter() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                connector.register_context_path(context_path)
            }));
            if result.is_err() {
                tracing::error!(
                    connector = %connector.name(),
                    context_path = %context_path,
                    "Connector panicked while registering context path"
                );
            }
        }
        tracing::debug!(
            context_path = %context_path,
            connectors = snapshot.len(),
            "Context path registered with connectors"
        );
        metrics::record_path_announced();
        snapshot.len()
    }

    /// Current live set.
    pub fn snapshot(&self) -> Arc<ConnectorSet> {
        self.live.load_full()
    }

    pub fn len(&self) -> usize {
        self.live.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.load().is_empty()
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::ResponseSink;

    #[derive(Default)]
    struct Recorder {
        paths: Mutex<Vec<String>>,
        connection: Mutex<Option<ServerConnection>>,
    }

    impl Connector for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn set_server_connection(&self, connection: Option<ServerConnection>) {
            *self.connection.lock().unwrap() = connection;
        }

        fn register_context_path(&self, context_path: &str) {
            self.paths.lock().unwrap().push(context_path.to_string());
        }
    }

    fn connection() -> ServerConnection {
        ServerConnection::new(|_| ResponseSink::new())
    }

    #[test]
    fn test_register_installs_callback() {
        let registry = ConnectorRegistry::new();
        let recorder = Arc::new(Recorder::default());
        let connector: Arc<dyn Connector> = recorder.clone();

        assert!(registry.register(connector.clone(), connection()));
        assert!(recorder.connection.lock().unwrap().is_some());
        assert_eq!(registry.len(), 1);

        // Second registration is a no-op for the set.
        assert!(!registry.register(connector, connection()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_clears_callback() {
        let registry = ConnectorRegistry::new();
        let recorder = Arc::new(Recorder::default());
        let connector: Arc<dyn Connector> = recorder.clone();
        registry.register(connector.clone(), connection());

        assert!(registry.unregister(&connector));
        assert!(recorder.connection.lock().unwrap().is_none());
        assert!(registry.is_empty());
        assert!(!registry.unregister(&connector));
    }

    #[test]
    fn test_broadcast_reaches_live_connectors_only() {
        let registry = ConnectorRegistry::new();
        let c1 = Arc::new(Recorder::default());
        let c2 = Arc::new(Recorder::default());
        let gone = Arc::new(Recorder::default());
        let gone_dyn: Arc<dyn Connector> = gone.clone();

        registry.register(c1.clone(), connection());
        registry.register(c2.clone(), connection());
        registry.register(gone_dyn.clone(), connection());
        registry.unregister(&gone_dyn);

        assert_eq!(registry.on_app_path_registered("/foo"), 2);
        assert_eq!(*c1.paths.lock().unwrap(), vec!["/foo".to_string()]);
        assert_eq!(*c2.paths.lock().unwrap(), vec!["/foo".to_string()]);
        assert!(gone.paths.lock().unwrap().is_empty());
    }

    #[test]
    fn test_late_connector_misses_earlier_paths() {
        let registry = ConnectorRegistry::new();
        registry.on_app_path_registered("/early");

        let late = Arc::new(Recorder::default());
        registry.register(late.clone(), connection());
        assert!(late.paths.lock().unwrap().is_empty());
    }
}
