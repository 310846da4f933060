//! Configuration file watcher for hot reload.
//!
//! Only rate limit policies are reloadable, so an update is published when
//! a readable, valid file yields policies different from the ones last
//! published. Editors and `fs::write` truncate before writing; the empty
//! intermediate file is skipped rather than parsed into defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{parse_config, ConfigError};
use crate::config::schema::{GateConfig, RoutePolicy};

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    filter: ReloadFilter,
    update_tx: mpsc::UnboundedSender<GateConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    ///
    /// `current` is the configuration the server starts with; rewrites that
    /// leave its policies unchanged are not published.
    pub fn new(path: &Path, current: &GateConfig) -> (Self, mpsc::UnboundedReceiver<GateConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                filter: ReloadFilter::new(current),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let mut filter = self.filter;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let contents = match fs::read_to_string(&path) {
                        Ok(contents) => contents,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to read config. Keeping current configuration.");
                            return;
                        }
                    };
                    match filter.accept(&contents) {
                        Ok(Some(new_config)) => {
                            tracing::info!("Config file change detected, reloading...");
                            let _ = tx.send(new_config);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config. Keeping current configuration.");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Decides whether a file snapshot becomes a published update.
#[derive(Debug)]
struct ReloadFilter {
    last_routes: Vec<RoutePolicy>,
}

impl ReloadFilter {
    fn new(current: &GateConfig) -> Self {
        Self {
            last_routes: current.rate_limit.routes.clone(),
        }
    }

    /// `Ok(None)` for an empty file or unchanged policies.
    fn accept(&mut self, contents: &str) -> Result<Option<GateConfig>, ConfigError> {
        if contents.trim().is_empty() {
            tracing::debug!("Config file is empty, waiting for the write to finish");
            return Ok(None);
        }

        let config = parse_config(contents)?;
        if config.rate_limit.routes == self.last_routes {
            tracing::debug!("Config rewritten without policy changes");
            return Ok(None);
        }

        self.last_routes = config.rate_limit.routes.clone();
        Ok(Some(config))
    }
}
