//! Deployed apps and the registry that owns them.
//!
//! # Data Flow
//! ```text
//! deployer / config reload
//!     → registry.rs (context path → App table)
//!     → events.rs (AppEvent::PathRegistered fan-out)
//!     → server notifier → every connector registers the path
//!
//! request
//!     → dispatcher → AppRegistry::get_app(context_path) → Option<App>
//! ```
//!
//! # Design Decisions
//! - `App` is an opaque, cheaply cloned handle; the core never keeps one
//!   past the request it was resolved for
//! - Lookups must be safe to call concurrently; the dispatcher adds no locking

pub mod events;
pub mod registry;

use std::fmt;
use std::sync::Arc;

pub use events::{AppEvent, AppEventReceiver, EventBus};
pub use registry::StaticAppRegistry;

/// Handle to a deployed app.
#[derive(Clone, PartialEq, Eq)]
pub struct App {
    inner: Arc<AppInfo>,
}

#[derive(Debug, PartialEq, Eq)]
struct AppInfo {
    name: String,
    context_path: String,
}

impl App {
    pub fn new(name: impl Into<String>, context_path: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(AppInfo {
                name: name.into(),
                context_path: context_path.into(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn context_path(&self) -> &str {
        &self.inner.context_path
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.inner.name)
            .field("context_path", &self.inner.context_path)
            .finish()
    }
}

/// Source of deployed apps for the dispatch core.
pub trait AppRegistry: Send + Sync {
    /// Resolve the app serving `context_path`.
    fn get_app(&self, context_path: &str) -> Option<App>;

    /// Receive a `PathRegistered` event for every app deployed from now on.
    fn subscribe(&self) -> AppEventReceiver;
}
