//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GatewayConfig;

/// Watches the configuration file and emits validated reloads.
///
/// Invalid files are logged and dropped; the running configuration
/// stays in effect.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Create a new watcher and the receiver its updates arrive on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must stay alive for events
    /// to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading");
                        reload(&path, &tx);
                    }
                }
                Err(err) => tracing::error!(error = ?err, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Load, validate, and emit the file at `path`. Invalid files are
/// logged and dropped; no update is emitted.
fn reload(path: &Path, tx: &mpsc::UnboundedSender<GatewayConfig>) {
    match load_config(path) {
        Ok(new_config) => {
            let _ = tx.send(new_config);
        }
        Err(err) => {
            tracing::error!(
                error = %err,
                "Config reload rejected, keeping current configuration"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_temp(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "unicore-gateway-watch-{}.toml",
            uuid::Uuid::new_v4()
        ));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn valid_file_change_emits_an_update() {
        let path = write_temp(
            r#"
            [security]
            allowed_origins = ["https://unicore.edu"]
            "#,
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        reload(&path, &tx);
        fs::remove_file(&path).ok();

        let config = rx.try_recv().unwrap();
        assert_eq!(config.security.allowed_origins, vec!["https://unicore.edu"]);
    }

    #[test]
    fn invalid_file_emits_nothing() {
        let path = write_temp(
            r#"
            [listener]
            bind_address = "nonsense"
            "#,
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        reload(&path, &tx);
        fs::remove_file(&path).ok();

        // The running configuration stays in effect.
        assert!(rx.try_recv().is_err());
    }
}
