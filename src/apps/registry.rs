//! In-memory app table.
//!
//! # Responsibilities
//! - Map context paths to deployed apps
//! - Announce newly servable paths on the event bus
//! - Apply a configured app list as a diff (deploy new, undeploy removed)

use std::collections::HashSet;

use dashmap::DashMap;

use crate::apps::{App, AppEvent, AppEventReceiver, AppRegistry, EventBus};
use crate::config::AppConfig;

/// Concurrent context path → App table backed by `DashMap`.
#[derive(Debug, Default)]
pub struct StaticAppRegistry {
    apps: DashMap<String, App>,
    events: EventBus,
}

impl StaticAppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(apps: &[AppConfig]) -> Self {
        let registry = Self::new();
        registry.sync(apps);
        registry
    }

    /// Make `app` servable and announce its path.
    ///
    /// Redeploying an existing path replaces the handle and announces again.
    pub fn deploy(&self, app: App) {
        let path = app.context_path().to_string();
        let previous = self.apps.insert(path.clone(), app.clone());
        tracing::info!(
            app = %app.name(),
            context_path = %path,
            redeployed = previous.is_some(),
            "App deployed"
        );
        let delivered = self.events.publish(AppEvent::PathRegistered(path));
        tracing::debug!(subscribers = delivered, "Context path announced");
    }

    /// Stop serving `context_path`. Returns the removed app, if any.
    pub fn undeploy(&self, context_path: &str) -> Option<App> {
        let removed = self.apps.remove(context_path).map(|(_, app)| app);
        if let Some(app) = &removed {
            tracing::info!(app = %app.name(), context_path = %context_path, "App undeployed");
        }
        removed
    }

    /// Bring the table in line with `configs`.
    pub fn sync(&self, configs: &[AppConfig]) {
        let wanted: HashSet<&str> = configs.iter().map(|c| c.context_path.as_str()).collect();

        let stale: Vec<String> = self
            .apps
            .iter()
            .filter(|entry| !wanted.contains(entry.key().as_str()))
            .map(|entry| entry.key().clone())
            .collect();
        for path in stale {
            self.undeploy(&path);
        }

        for config in configs {
            let unchanged = self
                .apps
                .get(&config.context_path)
                .is_some_and(|app| app.name() == config.name);
            if !unchanged {
                self.deploy(App::new(config.name.clone(), config.context_path.clone()));
            }
        }
    }

    pub fn context_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.apps.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl AppRegistry for StaticAppRegistry {
    fn get_app(&self, context_path: &str) -> Option<App> {
        self.apps.get(context_path).map(|entry| entry.value().clone())
    }

    fn subscribe(&self) -> AppEventReceiver {
        self.events.subscribe()
    }
}
