//! Component C (`builder`) plus the concurrency wrapper spec.md §5 asks
//! for: `IndexHandle` shares one `ProjectIndex` between the CLI and MCP
//! layers the same way the teacher shares `Arc<Mutex<SearchDb>>`, but over
//! a `RwLock` since plain in-memory data supports real concurrent reads
//! (the teacher's `Mutex` exists only because `rusqlite::Connection` isn't
//! `Sync`).

pub mod builder;
pub mod resolve;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, RwLock};

use crate::config::Config;
use crate::model::ProjectIndex;
use crate::update::ChangeSet;

/// Shared handle to one project's index. Cloning is cheap (an `Arc` bump);
/// every clone sees the same underlying index.
#[derive(Clone)]
pub struct IndexHandle {
    config: Config,
    index: Arc<RwLock<ProjectIndex>>,
    /// Pending-writer fairness: readers already inside `with_index` finish,
    /// but a waiting writer blocks new readers from starting, so a steady
    /// stream of queries can't starve `reindex`/`apply_changeset` (spec.md
    /// §5's writer-starvation requirement).
    pending_writers: AtomicUsize,
    writer_gate: Mutex<()>,
    writer_gate_cv: Condvar,
}

impl IndexHandle {
    pub fn build(config: Config) -> Self {
        let index = builder::build_index(&config);
        Self {
            config,
            index: Arc::new(RwLock::new(index)),
            pending_writers: AtomicUsize::new(0),
            writer_gate: Mutex::new(()),
            writer_gate_cv: Condvar::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `f` against a read guard. Blocks if a writer is currently
    /// waiting, so it doesn't jump the queue ahead of `reindex`/`update`.
    pub fn with_index<T>(&self, f: impl FnOnce(&ProjectIndex) -> T) -> T {
        if self.pending_writers.load(Ordering::SeqCst) > 0 {
            let guard = self.writer_gate.lock().unwrap();
            let _unused = self
                .writer_gate_cv
                .wait_while(guard, |_| self.pending_writers.load(Ordering::SeqCst) > 0)
                .unwrap();
        }
        let guard = self.index.read().unwrap();
        f(&guard)
    }

    /// Re-walk the project root from disk and replace the index wholesale.
    pub fn reindex(&self) {
        self.pending_writers.fetch_add(1, Ordering::SeqCst);
        let fresh = builder::build_index(&self.config);
        {
            let mut guard = self.index.write().unwrap();
            *guard = fresh;
        }
        self.pending_writers.fetch_sub(1, Ordering::SeqCst);
        self.writer_gate_cv.notify_all();
    }

    /// Apply an externally-computed changeset in place (component D).
    pub fn apply_changeset(&self, changeset: ChangeSet) {
        self.pending_writers.fetch_add(1, Ordering::SeqCst);
        {
            let mut guard = self.index.write().unwrap();
            crate::update::apply_changeset(&mut guard, &self.config, changeset);
        }
        self.pending_writers.fetch_sub(1, Ordering::SeqCst);
        self.writer_gate_cv.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn with_index_reflects_initial_build() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        let config = Config::from_root(dir.path()).unwrap();
        let handle = IndexHandle::build(config);
        let count = handle.with_index(|idx| idx.file_count());
        assert_eq!(count, 1);
    }

    #[test]
    fn reindex_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        let config = Config::from_root(dir.path()).unwrap();
        let handle = IndexHandle::build(config);
        fs::write(dir.path().join("b.py"), "def bar():\n    pass\n").unwrap();
        handle.reindex();
        let count = handle.with_index(|idx| idx.file_count());
        assert_eq!(count, 2);
    }
}
