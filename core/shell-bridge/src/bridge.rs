//! Orchestration between the file browser, the status cache and the engine.
//!
//! The native glue forwards OS callbacks to the [`ShellExtension`] trait and
//! implements [`ShellHost`] for the outbound side. Everything in between is
//! plain Rust with no OS dependency, which is what keeps the subsystem
//! testable without a live file browser.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, info, warn};

use harbor_shell_protocol::{
    parse_push, trigger_url, EngineCommand, PushEvent, SyncStatus, UrlCommand, WatchOperation,
};

use crate::menu::{MenuItem, MenuLabels};
use crate::registry::WatchRegistry;
use crate::store::StatusStore;
use crate::transport::Transport;

/// Outbound surface the native file-browser glue implements. Calls are
/// fire-and-forget; the OS side has nothing useful to report back.
pub trait ShellHost: Send + Sync {
    /// Registers one badge image/label pair. Called once per status at
    /// startup.
    fn register_badge(&self, status: SyncStatus);
    /// Paints (or repaints) the badge for one path.
    fn set_badge(&self, status: SyncStatus, path: &Path);
    /// Starts observation callbacks for a root.
    fn insert_observed_root(&self, path: &Path);
    /// Stops observation callbacks for a root.
    fn remove_observed_root(&self, path: &Path);
    /// Navigates to a trigger URL, reaching the engine's scheme handler.
    fn open_url(&self, url: &str);
}

/// Inbound callback surface, one method per file-browser or push-channel
/// entry point. Callbacks arrive concurrently on OS-owned threads.
pub trait ShellExtension: Send + Sync {
    fn begin_observing(&self, path: &Path);
    fn end_observing(&self, path: &Path);
    fn request_badge(&self, path: &Path);
    fn handle_push(&self, name: &str, payload: &Value);
    fn menu_for(&self, selection: &[PathBuf]) -> Vec<MenuItem>;
    fn activate(&self, command: UrlCommand, targets: &[PathBuf]);
}

pub struct Bridge {
    store: StatusStore,
    registry: WatchRegistry,
    transport: Transport,
    host: Arc<dyn ShellHost>,
    labels: Mutex<MenuLabels>,
}

impl Bridge {
    pub fn new(
        store: StatusStore,
        registry: WatchRegistry,
        transport: Transport,
        host: Arc<dyn ShellHost>,
    ) -> Self {
        Self {
            store,
            registry,
            transport,
            host,
            labels: Mutex::new(MenuLabels::default()),
        }
    }

    /// Registers the badge vocabulary and the sentinel root, then asks the
    /// engine to replay `watchFolder` pushes for every synchronized root.
    /// The replay request is best-effort; an engine that is not up yet will
    /// push the roots once it starts.
    pub fn start(&self) {
        for status in SyncStatus::ALL {
            self.host.register_badge(status);
        }
        self.host.insert_observed_root(self.registry.sentinel());
        info!(engine = %self.transport.addr(), "Shell bridge started");
        self.send_command(&EngineCommand::TriggerWatch);
    }

    /// Releases every observer registration.
    pub fn shutdown(&self) {
        for root in self.registry.observed_roots() {
            self.host.remove_observed_root(&root);
        }
        info!("Shell bridge stopped");
    }

    /// Best-effort command write; any transport failure reads as "no
    /// answer" and is left to the visit TTL to retry.
    fn send_command(&self, command: &EngineCommand) -> bool {
        let payload = match command.to_json() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "Failed to encode engine command");
                return false;
            }
        };
        match self.transport.send(&payload) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Failed to reach engine");
                false
            }
        }
    }

    fn apply_status(&self, path: &str, status: SyncStatus) {
        self.store.put(path, status);
        self.host.set_badge(status, Path::new(path));
    }

    fn menu_labels(&self) -> MenuLabels {
        self.labels
            .lock()
            .map(|labels| labels.clone())
            .unwrap_or_default()
    }
}

impl ShellExtension for Bridge {
    fn begin_observing(&self, path: &Path) {
        let key = path.to_string_lossy();
        if !self.store.should_visit(&key) {
            debug!(path = %path.display(), "Recently visited, trusting cache");
            return;
        }
        debug!(path = %path.display(), "Requesting status from engine");
        if self.send_command(&EngineCommand::get_status(key.as_ref())) {
            // Only a successful write starts the suppression window; a dead
            // engine leaves the path eligible for the next callback.
            self.store.mark_visited(&key);
        }
    }

    fn end_observing(&self, path: &Path) {
        debug!(path = %path.display(), "Stopped observing");
    }

    fn request_badge(&self, path: &Path) {
        let key = path.to_string_lossy();
        match self.store.get(&key) {
            Some(status) => self.host.set_badge(status, path),
            None => {
                // Unknown path: leave the badge unset and clear the parent
                // directory's visit record, so the next observation of that
                // directory re-requests instead of waiting out the TTL.
                if let Some(parent) = path.parent() {
                    self.store.forget_visit(&parent.to_string_lossy());
                }
            }
        }
    }

    fn handle_push(&self, name: &str, payload: &Value) {
        let event = match parse_push(name, payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, notification = name, "Dropping malformed push");
                return;
            }
        };

        match event {
            PushEvent::SyncStatus(pairs) => {
                debug!(count = pairs.len(), "Applying status push");
                for pair in pairs {
                    self.apply_status(&pair.path, pair.status);
                }
            }
            PushEvent::WatchFolder { operation, path } => {
                let root = PathBuf::from(&path);
                match operation {
                    WatchOperation::Watch => {
                        self.registry.watch(&root);
                        self.host.insert_observed_root(&root);
                    }
                    WatchOperation::Unwatch => {
                        self.registry.unwatch(&root);
                        self.host.remove_observed_root(&root);
                    }
                }
            }
            PushEvent::SetConfig(entries) => {
                debug!(count = entries.len(), "Replacing menu labels");
                if let Ok(mut labels) = self.labels.lock() {
                    labels.apply_entries(&entries);
                }
            }
        }
    }

    fn menu_for(&self, selection: &[PathBuf]) -> Vec<MenuItem> {
        let labels = self.menu_labels();
        let synced = selection
            .iter()
            .any(|path| self.registry.is_under_watched_root(path));
        if synced {
            labels.synced_menu()
        } else {
            labels.unsynced_menu()
        }
    }

    fn activate(&self, command: UrlCommand, targets: &[PathBuf]) {
        for target in targets {
            let url = trigger_url(command, target);
            debug!(%url, "Dispatching menu action");
            self.host.open_url(&url);
        }
    }
}
