//! Shared handle over a loaded index that can be swapped wholesale.
//!
//! A replacement is always built completely before it is published, so a
//! reader either sees the old table or the new one, never a mix.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use notify::{RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use parking_lot::RwLock;

use super::error::LoadError;
use super::set::SearchIndexSet;

/// Quiet period after the last change event before reloading.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct SharedIndex {
    current: Arc<RwLock<Arc<SearchIndexSet>>>,
    generation: Arc<AtomicU64>,
}

impl SharedIndex {
    pub fn new(set: SearchIndexSet) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(set))),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn open(path: &Path) -> Result<Self, LoadError> {
        SearchIndexSet::load_path(path).map(Self::new)
    }

    /// The currently published index. Holding the `Arc` keeps it alive even
    /// across a later reload.
    pub fn snapshot(&self) -> Arc<SearchIndexSet> {
        self.current.read().clone()
    }

    /// Number of successful replacements since creation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Publish an already loaded index.
    pub fn replace(&self, set: SearchIndexSet) {
        let fresh = Arc::new(set);
        *self.current.write() = fresh;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Load `path` and publish it. On failure the previous index stays live.
    pub fn reload_from(&self, path: &Path) -> Result<(), LoadError> {
        let started = Instant::now();
        match SearchIndexSet::load_path(path) {
            Ok(set) => {
                self.replace(set);
                tracing::info!(
                    path = %path.display(),
                    generation = self.generation(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "index_reloaded"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "index reload failed; keeping previous index");
                Err(e)
            }
        }
    }

    /// Reload whenever `path` changes on disk. The returned guard stops
    /// watching when dropped.
    ///
    /// A single file is watched through its parent directory, so replacing it
    /// by rename (a new inode each time) keeps being noticed.
    pub fn watch(&self, path: &Path) -> Result<IndexWatcher, notify::Error> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (root, mode, only) = if path.is_dir() {
            (path, RecursiveMode::Recursive, None)
        } else {
            let parent = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            (parent, RecursiveMode::NonRecursive, path.file_name().map(OsStr::to_os_string))
        };
        let mut watcher = event_watcher(tx, only)?;
        watcher.watch(root, mode)?;
        tracing::info!(path = %path.display(), root = %root.display(), "watching index");

        let shared = self.clone();
        let target = path.to_path_buf();
        let worker = std::thread::spawn(move || reload_loop(&shared, &target, &rx));

        Ok(IndexWatcher {
            _watcher: watcher,
            _worker: worker,
        })
    }
}

/// Keeps a [`SharedIndex::watch`] subscription alive.
pub struct IndexWatcher {
    _watcher: RecommendedWatcher,
    _worker: std::thread::JoinHandle<()>,
}

impl std::fmt::Debug for IndexWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWatcher").finish_non_exhaustive()
    }
}

/// Forward change events, keeping only those touching `only` when set.
fn event_watcher(
    tx: Sender<Vec<PathBuf>>,
    only: Option<OsString>,
) -> Result<RecommendedWatcher, notify::Error> {
    recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
            return;
        }
        let relevant = only
            .as_deref()
            .is_none_or(|name| event.paths.iter().any(|p| p.file_name() == Some(name)));
        if relevant {
            let _ = tx.send(event.paths);
        }
    })
}

/// Collapse bursts of events (editors and generators write in several steps)
/// into one reload. Exits when the watcher is dropped.
fn reload_loop(shared: &SharedIndex, target: &Path, rx: &Receiver<Vec<PathBuf>>) {
    let mut pending = false;
    loop {
        let timeout = if pending { RELOAD_DEBOUNCE } else { Duration::from_secs(3600) };
        match rx.recv_timeout(timeout) {
            Ok(paths) => {
                tracing::debug!(?paths, "index change detected");
                pending = true;
            }
            Err(RecvTimeoutError::Timeout) => {
                if pending {
                    pending = false;
                    let _ = shared.reload_from(target);
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
