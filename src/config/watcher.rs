//! Configuration file watcher for hot app (un)deployment.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by replacing the file are still seen. Only reloads that change
//! the app table are forwarded.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{AppConfig, GatewayConfig};

pub struct ConfigWatcher {
    path: PathBuf,
    applied: Vec<AppConfig>,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// `applied` is the app table already in effect. Returns the watcher and
    /// a receiver for validated configs whose app table differs from it.
    pub fn new(
        path: &Path,
        applied: Vec<AppConfig>,
    ) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                applied,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut applied,
            update_tx,
        } = self;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name: Option<OsString> = path.file_name().map(|n| n.to_os_string());
        let config_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !ours {
                        return;
                    }
                    match load_config(&config_path) {
                        Ok(config) if config.apps == applied => {
                            tracing::debug!(
                                path = ?config_path,
                                "Config changed, app table unchanged"
                            );
                        }
                        Ok(config) => {
                            tracing::info!(
                                path = ?config_path,
                                apps = config.apps.len(),
                                "App table changed, reloading"
                            );
                            applied = config.apps.clone();
                            let _ = update_tx.send(config);
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                "Failed to reload config, keeping current apps"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}
