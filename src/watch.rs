//! External collaborator: a `notify`-based filesystem watcher that computes
//! a changeset and drives `IndexHandle::apply_changeset` (spec §1 places
//! "filesystem watching ... and the decision of *which* files changed"
//! outside the core; this module is that decision-maker, not part of the
//! indexer itself).
//!
//! Grounded on `watcher::mod::GitignoreWatcher` (gitignore-aware,
//! non-recursive watching with dynamic watch/unwatch on directory
//! create/remove) kept close to verbatim, paired with a simple dirty-timer
//! debounce in the style of `watcher::handler::start_watcher`'s event loop.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::index::IndexHandle;
use crate::update::ChangeSet;

const DEBOUNCE: Duration = Duration::from_millis(500);

/// A file watcher that respects `.gitignore`. Uses non-recursive watching
/// on each directory so ignored subtrees (`target/`, `node_modules/`, ...)
/// never generate events in the first place.
struct GitignoreWatcher {
    watcher: RecommendedWatcher,
    watched_dirs: HashSet<PathBuf>,
}

impl GitignoreWatcher {
    fn new(root: &Path, tx: mpsc::Sender<notify::Result<Event>>) -> Result<Self> {
        let watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            NotifyConfig::default(),
        )
        .context("failed to create watcher")?;

        let mut instance = Self {
            watcher,
            watched_dirs: HashSet::new(),
        };

        for entry in WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build()
        {
            let entry = entry?;
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                instance.watch_dir(entry.path())?;
            }
        }

        Ok(instance)
    }

    fn watch_dir(&mut self, path: &Path) -> Result<()> {
        if !self.watched_dirs.contains(path) {
            self.watcher
                .watch(path, RecursiveMode::NonRecursive)
                .with_context(|| format!("failed to watch {}", path.display()))?;
            self.watched_dirs.insert(path.to_path_buf());
        }
        Ok(())
    }

    fn watch_dir_if_valid(&mut self, path: &Path) {
        if path.is_dir() {
            let _ = self.watch_dir(path);
        }
    }

    fn unwatch_dir(&mut self, path: &Path) {
        if self.watched_dirs.remove(path) {
            let _ = self.watcher.unwatch(path);
        }
    }
}

fn load_gitignore(root: &Path) -> Result<Gitignore> {
    let path = root.join(".gitignore");
    if path.exists() {
        let mut builder = GitignoreBuilder::new(root);
        builder.add(&path);
        builder.build().context("failed to build gitignore")
    } else {
        Ok(Gitignore::empty())
    }
}

/// Watch `handle`'s project root and apply incremental updates as files
/// change, until the process exits. Blocks the calling thread; callers
/// typically spawn this on its own OS thread.
pub fn run(handle: IndexHandle) -> Result<()> {
    let root = handle.config().root.clone();
    let gitignore = load_gitignore(&root)?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = GitignoreWatcher::new(&root, tx)?;
    info!("watching {} for changes", root.display());

    let mut dirty: HashSet<PathBuf> = HashSet::new();

    loop {
        match rx.recv_timeout(DEBOUNCE) {
            Ok(Ok(event)) => {
                handle_event(&event, &root, &gitignore, &mut watcher, &mut dirty);
            }
            Ok(Err(e)) => warn!("watch error: {e}"),
            Err(RecvTimeoutError::Timeout) => {
                if !dirty.is_empty() {
                    flush(&handle, &root, std::mem::take(&mut dirty));
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                if !dirty.is_empty() {
                    flush(&handle, &root, std::mem::take(&mut dirty));
                }
                info!("watch channel closed, stopping");
                return Ok(());
            }
        }
    }
}

fn handle_event(
    event: &Event,
    root: &Path,
    gitignore: &Gitignore,
    watcher: &mut GitignoreWatcher,
    dirty: &mut HashSet<PathBuf>,
) {
    for path in &event.paths {
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        if gitignore.matched_path_or_any_parents(rel, path.is_dir()).is_ignore() {
            continue;
        }

        if matches!(event.kind, EventKind::Create(_)) && path.is_dir() {
            watcher.watch_dir_if_valid(path);
            continue;
        }
        if matches!(event.kind, EventKind::Remove(_)) {
            watcher.unwatch_dir(path);
        }
        if path.is_dir() {
            continue;
        }

        dirty.insert(path.clone());
    }
}

/// Classify each dirty path as added/modified/removed against the index's
/// current file set and apply the changeset.
fn flush(handle: &IndexHandle, root: &Path, dirty: HashSet<PathBuf>) {
    let mut changeset = ChangeSet::default();
    handle.with_index(|index| {
        for abs in &dirty {
            let rel = match abs.strip_prefix(root) {
                Ok(p) => p.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            if abs.exists() {
                if index.files.contains_key(&rel) {
                    changeset.modified.push(rel);
                } else {
                    changeset.added.push(rel);
                }
            } else if index.files.contains_key(&rel) {
                changeset.removed.push(rel);
            }
        }
    });

    if changeset.is_empty() {
        return;
    }
    debug!(
        "applying changeset: +{} ~{} -{}",
        changeset.added.len(),
        changeset.modified.len(),
        changeset.removed.len()
    );
    handle.apply_changeset(changeset);
}
