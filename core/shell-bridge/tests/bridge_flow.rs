//! End-to-end exercise of the bridge: a fake engine on a real localhost
//! socket, pushes injected the way the native glue would, and a recording
//! host standing in for the file browser.

use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use serde_json::json;

use harbor_shell_bridge::{
    Bridge, MenuLabels, ShellExtension, ShellHost, StatusStore, Transport, WatchRegistry,
};
use harbor_shell_protocol::{
    SyncStatus, SYNC_STATUS_NOTIFICATION, WATCH_FOLDER_NOTIFICATION,
};

#[derive(Default)]
struct RecordingHost {
    badges: Mutex<Vec<SyncStatus>>,
    painted: Mutex<Vec<(PathBuf, SyncStatus)>>,
    observed: Mutex<Vec<PathBuf>>,
    removed: Mutex<Vec<PathBuf>>,
    opened_urls: Mutex<Vec<String>>,
}

impl ShellHost for RecordingHost {
    fn register_badge(&self, status: SyncStatus) {
        self.badges.lock().unwrap().push(status);
    }

    fn set_badge(&self, status: SyncStatus, path: &Path) {
        self.painted
            .lock()
            .unwrap()
            .push((path.to_path_buf(), status));
    }

    fn insert_observed_root(&self, path: &Path) {
        self.observed.lock().unwrap().push(path.to_path_buf());
    }

    fn remove_observed_root(&self, path: &Path) {
        self.removed.lock().unwrap().push(path.to_path_buf());
    }

    fn open_url(&self, url: &str) {
        self.opened_urls.lock().unwrap().push(url.to_string());
    }
}

struct EnvGuard {
    key: &'static str,
    prior: Option<String>,
}

impl EnvGuard {
    fn set(key: &'static str, value: &str) -> Self {
        let prior = std::env::var(key).ok();
        std::env::set_var(key, value);
        Self { key, prior }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        if let Some(value) = &self.prior {
            std::env::set_var(self.key, value);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Fake engine: accepts `expected` one-shot connections and returns the
/// newline-stripped payloads it saw.
fn spawn_engine(expected: usize) -> (SocketAddr, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = std::thread::spawn(move || {
        let mut lines = Vec::new();
        for _ in 0..expected {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buffer = String::new();
            stream.read_to_string(&mut buffer).unwrap();
            lines.push(buffer.trim_end().to_string());
        }
        lines
    });
    (addr, handle)
}

fn bridge_at(addr: SocketAddr) -> (Bridge, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::default());
    let bridge = Bridge::new(
        StatusStore::open().unwrap(),
        WatchRegistry::new(),
        Transport::new(addr),
        host.clone(),
    );
    (bridge, host)
}

#[test]
fn badge_round_trip_through_engine_and_push() {
    let (addr, engine) = spawn_engine(2);
    let (bridge, host) = bridge_at(addr);

    bridge.start();
    assert_eq!(*host.badges.lock().unwrap(), SyncStatus::ALL.to_vec());
    assert_eq!(*host.observed.lock().unwrap(), vec![PathBuf::from("/")]);

    // The engine replays its synchronized roots after the watch trigger.
    bridge.handle_push(
        WATCH_FOLDER_NOTIFICATION,
        &json!({"operation": "watch", "path": "/sync/root"}),
    );

    // The browser starts observing a directory; the bridge asks the engine.
    bridge.begin_observing(Path::new("/sync/root/docs"));

    let lines = engine.join().unwrap();
    assert_eq!(lines[0], r#"{"cmd":"trigger-watch"}"#);
    assert_eq!(lines[1], r#"{"cmd":"get-status","path":"/sync/root/docs"}"#);

    // The answer arrives asynchronously over the push channel.
    bridge.handle_push(
        SYNC_STATUS_NOTIFICATION,
        &json!({"statuses": [{"path": "/sync/root/docs", "status": "syncing"}]}),
    );
    assert_eq!(
        *host.painted.lock().unwrap(),
        vec![(PathBuf::from("/sync/root/docs"), SyncStatus::Syncing)]
    );

    // Follow-up badge requests are served from the cache, no engine call.
    bridge.request_badge(Path::new("/sync/root/docs"));
    assert_eq!(host.painted.lock().unwrap().len(), 2);

    // Menus follow the watched roots; actions become trigger URLs.
    let menu = bridge.menu_for(&[PathBuf::from("/sync/root/docs/file.txt")]);
    assert_eq!(menu, MenuLabels::default().synced_menu());
    bridge.activate(menu[0].command, &[PathBuf::from("/sync/root/docs/file.txt")]);
    assert_eq!(
        *host.opened_urls.lock().unwrap(),
        vec!["harbordrive://access-online/sync/root/docs/file.txt".to_string()]
    );

    bridge.shutdown();
    let removed = host.removed.lock().unwrap();
    assert!(removed.contains(&PathBuf::from("/")));
    assert!(removed.contains(&PathBuf::from("/sync/root")));
}

#[test]
fn unreachable_engine_degrades_to_unset_badges() {
    // Learn a port nothing is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (bridge, host) = bridge_at(addr);

    bridge.begin_observing(Path::new("/sync/root/docs"));
    bridge.request_badge(Path::new("/sync/root/docs"));

    // No badge was painted and nothing hung or crashed.
    assert!(host.painted.lock().unwrap().is_empty());
}

#[test]
fn file_logging_writes_under_the_home_dir() {
    let home = tempfile::tempdir().unwrap();
    let _home_guard = EnvGuard::set("HOME", home.path().to_str().unwrap());
    let _debug_guard = EnvGuard::set("HARBOR_SHELL_DEBUG_LOG", "1");

    let guard = harbor_shell_bridge::logging::init();
    assert!(guard.is_some());
    tracing::info!("bridge flow log record");
    drop(guard); // flush the worker

    let log_dir = home.path().join(".harbordrive").join("logs");
    let entries: Vec<_> = std::fs::read_dir(&log_dir)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert!(!entries.is_empty());
    let bytes: u64 = entries
        .iter()
        .map(|entry| entry.metadata().unwrap().len())
        .sum();
    assert!(bytes > 0);
}
