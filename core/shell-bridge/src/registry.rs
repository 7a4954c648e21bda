//! Watched synchronization roots.
//!
//! The engine drives this set through `watchFolder` pushes. Besides the real
//! roots there is one sentinel entry, `/` by default: the file browser only
//! delivers callbacks to an extension that observes at least one directory,
//! so the sentinel guarantees activation before the engine has reported any
//! roots. The sentinel is excluded from menu matching, otherwise every path
//! on disk would count as synchronized.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

pub const SENTINEL_ROOT: &str = "/";

pub struct WatchRegistry {
    sentinel: PathBuf,
    roots: Mutex<HashSet<PathBuf>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::with_sentinel(PathBuf::from(SENTINEL_ROOT))
    }

    pub fn with_sentinel(sentinel: PathBuf) -> Self {
        Self {
            sentinel,
            roots: Mutex::new(HashSet::new()),
        }
    }

    pub fn sentinel(&self) -> &Path {
        &self.sentinel
    }

    /// Adds a root. Re-adding an existing root is a no-op.
    pub fn watch(&self, path: &Path) {
        if let Ok(mut roots) = self.roots.lock() {
            if roots.insert(path.to_path_buf()) {
                debug!(path = %path.display(), "Watching root");
            }
        }
    }

    /// Removes a root. Unknown roots are a no-op.
    pub fn unwatch(&self, path: &Path) {
        if let Ok(mut roots) = self.roots.lock() {
            if roots.remove(path) {
                debug!(path = %path.display(), "Unwatching root");
            }
        }
    }

    /// True iff the candidate sits at or under one of the watched roots,
    /// compared component-wise. The sentinel never counts as a match.
    pub fn is_under_watched_root(&self, candidate: &Path) -> bool {
        match self.roots.lock() {
            Ok(roots) => roots
                .iter()
                .filter(|root| **root != self.sentinel)
                .any(|root| candidate.starts_with(root)),
            Err(_) => false,
        }
    }

    /// Sentinel plus every watched root, the set the file browser should be
    /// observing right now. Used for observer registration and teardown.
    pub fn observed_roots(&self) -> Vec<PathBuf> {
        let mut all = vec![self.sentinel.clone()];
        if let Ok(roots) = self.roots.lock() {
            all.extend(roots.iter().filter(|root| **root != self.sentinel).cloned());
        }
        all
    }
}
