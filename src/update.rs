//! Component D: the incremental updater (spec §4.D).
//!
//! Grounded on `watcher/handler.rs::process_file_change`'s "single entry
//! point mutates the shared index on a changeset" shape, retargeted from
//! the teacher's persisted-and-reindexed-to-disk behavior to this crate's
//! purely in-memory contract: the caller supplies the changeset (spec §1
//! explicitly pushes "which files changed" out to an external
//! collaborator), and `apply_changeset` brings `ProjectIndex` up to date.
//!
//! Engineering decision (see DESIGN.md): only extraction (pass 1, the I/O-
//! and parser-bound step per spec §4.E) is actually incremental here —
//! `ingest_one` runs only over `added ∪ modified`. The symbol table, import
//! graph, and dependency graph (passes 2-4) are cheap, pure, in-memory
//! derivations with no I/O, so they are fully re-derived from the updated
//! `index.files` via `index::builder::rebuild_derived` rather than patched
//! edge-by-edge. This guarantees the "equal to a full rebuild" contract by
//! construction — the exact same derivation code runs either way — instead
//! of relying on hand-verified graph surgery that this environment cannot
//! compile-check.

use std::path::Path;

use crate::config::Config;
use crate::discovery::{self, DiscoveredFile};
use crate::index::builder;
use crate::model::ProjectIndex;

/// A disjoint set of project-relative paths describing what changed since
/// the index was last built or updated (spec §4.D). The caller — an
/// external collaborator per spec §1 — is responsible for computing this
/// from filesystem events or a VCS diff.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Apply `changeset` to `index` in place. Afterward, `index` is
/// observationally equal to a full rebuild of the post-change file set
/// (spec §8 property 2).
pub fn apply_changeset(index: &mut ProjectIndex, config: &Config, changeset: ChangeSet) {
    if changeset.is_empty() {
        return;
    }

    for path in &changeset.removed {
        index.files.remove(path);
    }

    for path in changeset.modified.iter().chain(changeset.added.iter()) {
        let entry = discovered_entry(config, path);
        let record = builder::ingest_one(config, &entry);
        index.files.insert(path.clone(), record);
    }

    builder::rebuild_derived(index);
}

/// Build the `DiscoveredFile` metadata for one known-relative path, the
/// same shape `discovery::discover_files` would have produced for it, so
/// `builder::ingest_one` can run on a single changed path without a full
/// walk of the project root.
fn discovered_entry(config: &Config, rel_path: &str) -> DiscoveredFile {
    let abs_path = config.root.join(rel_path);
    let language = Path::new(rel_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(discovery::detect_language)
        .unwrap_or(discovery::Language::Generic);
    DiscoveredFile {
        abs_path,
        rel_path: rel_path.to_string(),
        language,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn build(dir: &Path) -> (Config, ProjectIndex) {
        let config = Config::from_root(dir).unwrap();
        let index = builder::build_index(&config);
        (config, index)
    }

    #[test]
    fn incremental_add_matches_full_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        let (config, mut index) = build(dir.path());

        fs::write(dir.path().join("b.py"), "def bar():\n    pass\n").unwrap();
        apply_changeset(
            &mut index,
            &config,
            ChangeSet {
                added: vec!["b.py".to_string()],
                ..Default::default()
            },
        );

        let rebuilt = builder::build_index(&config);
        assert_eq!(index.file_count(), rebuilt.file_count());
        assert!(index.symbols.contains_key("bar"));
        assert_eq!(
            index.symbols.get("bar").map(|v| v.len()),
            rebuilt.symbols.get("bar").map(|v| v.len())
        );
    }

    #[test]
    fn rename_drops_old_symbol_and_its_dependents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        fs::write(
            dir.path().join("b.py"),
            "from a import foo\ndef bar():\n    pass\ndef run():\n    foo()\n",
        )
        .unwrap();
        let (config, mut index) = build(dir.path());
        assert!(index.symbols.contains_key("foo"));

        fs::write(dir.path().join("a.py"), "def foo2():\n    pass\n").unwrap();
        apply_changeset(
            &mut index,
            &config,
            ChangeSet {
                modified: vec!["a.py".to_string()],
                ..Default::default()
            },
        );

        assert!(!index.symbols.contains_key("foo"));
        assert!(index.symbols.contains_key("foo2"));
        // b.py's import still names `foo`, which no longer resolves: `run`
        // no longer depends on anything named `foo2` (S3 from spec §8).
        assert!(index.deps_in.get("foo2").is_none());

        let rebuilt = builder::build_index(&config);
        assert_eq!(
            index.deps_in.get("foo2").is_some(),
            rebuilt.deps_in.get("foo2").is_some()
        );
    }

    #[test]
    fn removal_deletes_file_and_its_symbols() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        fs::write(dir.path().join("b.py"), "def bar():\n    pass\n").unwrap();
        let (config, mut index) = build(dir.path());

        fs::remove_file(dir.path().join("b.py")).unwrap();
        apply_changeset(
            &mut index,
            &config,
            ChangeSet {
                removed: vec!["b.py".to_string()],
                ..Default::default()
            },
        );

        assert_eq!(index.file_count(), 1);
        assert!(!index.symbols.contains_key("bar"));
        assert!(!index.files.contains_key("b.py"));
    }
}
