//! Startup orchestration.
//!
//! # Order
//! 1. App registry, pages, renderer, dispatcher, server
//! 2. Notifier subscribed before any app is deployed, so the initial app
//!    table reaches the connector
//! 3. Connector registered, app table applied, listener served last
//!
//! Shutdown runs the other way: stop serving, unregister the connector,
//! stop the notifier and the reload loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::apps::{AppRegistry, StaticAppRegistry};
use crate::config::GatewayConfig;
use crate::connector::{Connector, HttpConnector};
use crate::dispatch::{DefaultPages, Dispatcher, PlainRenderer};
use crate::lifecycle::Shutdown;
use crate::server::Server;

/// A fully wired gateway: one HTTP connector in front of the dispatch core.
pub struct Gateway {
    config: GatewayConfig,
    apps: Arc<StaticAppRegistry>,
    server: Server,
    connector: Arc<HttpConnector>,
}

impl Gateway {
    pub fn build(config: GatewayConfig) -> Self {
        let apps = Arc::new(StaticAppRegistry::new());
        let pages = DefaultPages::from_config(&config.server);
        let dispatcher = Dispatcher::new(apps.clone(), Arc::new(PlainRenderer), Arc::new(pages));
        let server = Server::new(dispatcher);
        let connector = HttpConnector::new(
            config.listener.connector_name.clone(),
            Duration::from_secs(config.timeouts.request_secs),
        );

        tracing::info!(
            dev_mode = config.server.dev_mode,
            apps = config.apps.len(),
            "Gateway built"
        );

        Self {
            config,
            apps,
            server,
            connector,
        }
    }

    pub fn apps(&self) -> &Arc<StaticAppRegistry> {
        &self.apps
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn connector(&self) -> &Arc<HttpConnector> {
        &self.connector
    }

    /// Serve on `listener` until `shutdown` fires. Reloaded configs arriving
    /// on `config_updates` are applied to the app table.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let connector: Arc<dyn Connector> = self.connector.clone();

        let notifier = self
            .server
            .spawn_notifier(self.apps.subscribe(), shutdown.subscribe());
        self.server.register_connector(connector.clone());
        self.apps.sync(&self.config.apps);

        let apps = self.apps.clone();
        let mut reload_shutdown = shutdown.subscribe();
        let reloader = tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => {
                            tracing::info!(apps = config.apps.len(), "Applying reloaded app table");
                            apps.sync(&config.apps);
                        }
                        None => break,
                    },
                    _ = reload_shutdown.recv() => break,
                }
            }
        });

        let served = self
            .connector
            .clone()
            .run(listener, shutdown.subscribe())
            .await;

        self.server.unregister_connector(&connector);
        // The connector may have stopped on an error; release the other tasks too.
        shutdown.trigger();
        let _ = notifier.await;
        let _ = reloader.await;

        tracing::info!(requests = self.server.requests_served(), "Gateway stopped");
        served
    }
}
