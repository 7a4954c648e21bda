//! # harbor-shell-bridge
//!
//! Extension-side core of Harbor Drive's file-browser integration: the
//! per-path status cache, the watched-roots set and the bridge that wires
//! browser callbacks to the sync engine.
//!
//! ## Design principles
//!
//! - **Synchronous**: callbacks arrive on OS-owned threads; no async
//!   runtime. Shared state sits behind short-lived mutexes.
//! - **Best effort**: the cache and the engine link may fail at any time.
//!   The observable worst case is a missing or stale badge, never a crash
//!   of the host process.
//! - **Host-agnostic**: the native glue implements [`ShellHost`] and
//!   forwards callbacks to [`ShellExtension`]; everything in between is
//!   plain Rust and testable without a live file browser.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use harbor_shell_bridge::{Bridge, StatusStore, Transport, WatchRegistry};
//!
//! let _logging_guard = harbor_shell_bridge::logging::init();
//! let bridge = Bridge::new(
//!     StatusStore::open()?,
//!     WatchRegistry::new(),
//!     Transport::from_env(),
//!     host, // Arc<dyn ShellHost> provided by the native glue
//! );
//! bridge.start();
//! ```

pub mod bridge;
pub mod logging;
pub mod menu;
pub mod registry;
pub mod store;
pub mod transport;

// Re-export the embedding surface at the crate root
pub use bridge::{Bridge, ShellExtension, ShellHost};
pub use menu::{MenuItem, MenuLabels};
pub use registry::WatchRegistry;
pub use store::{Clock, StatusStore, StoreError, SystemClock, VISIT_TTL_SECS};
pub use transport::{Transport, TransportError};
