//! Component C: the four-pass `ProjectIndex` builder (spec §4.C).
//!
//! Pass 1 ingests every discovered file into a `FileRecord` (extraction
//! happens here). Pass 2 populates the flat symbol table. Pass 3 resolves
//! imports into the file-level import graph. Pass 4 resolves call/reference
//! sites into the qualified-name dependency graph, including the text
//! rescan the extractors' `local_refs` lists alone can miss.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::config::Config;
use crate::discovery::{self, DiscoveredFile, Language};
use crate::extract::extract_file;
use crate::model::{FileRecord, ProjectIndex, SymbolLocation};

/// Sniff window for the binary-content heuristic (spec §4.A: a NUL byte
/// anywhere in the first 8 KiB marks a file as binary/unreadable).
const BINARY_SNIFF_BYTES: usize = 8 * 1024;

/// Walk `config.root`, extract every file, and assemble a fully-populated
/// `ProjectIndex`. Never fails: unreadable or oversized files degrade to a
/// partial record (logged), matching the extractor layer's own recovery
/// posture.
pub fn build_index(config: &Config) -> ProjectIndex {
    let discovered = match discovery::discover_files(config) {
        Ok(files) => files,
        Err(e) => {
            warn!("file discovery failed: {e}");
            Vec::new()
        }
    };

    let files = ingest(config, &discovered);

    let mut index = ProjectIndex::new();
    index.files = files;

    build_symbol_table(&mut index);
    build_import_graph(&mut index);
    build_dependency_graph(&mut index);

    index
}

/// Re-derive `symbols`/`imports_*`/`deps_*` from the current `index.files`,
/// without touching file content. Used by the incremental updater
/// (`crate::update`) after it has inserted/removed the changed set's
/// `FileRecord`s: these three passes are pure string-level derivation with
/// no I/O, so re-running them in full over the (small, already-extracted)
/// file set costs nothing next to the extraction step they follow, and
/// guarantees the post-update index matches a full rebuild by construction
/// rather than by hand-verified edge surgery.
pub(crate) fn rebuild_derived(index: &mut ProjectIndex) {
    build_symbol_table(index);
    build_import_graph(index);
    build_dependency_graph(index);
}

// ---- pass 1: ingest ---------------------------------------------------

fn ingest(config: &Config, discovered: &[DiscoveredFile]) -> HashMap<String, FileRecord> {
    let mut files = HashMap::with_capacity(discovered.len());
    for entry in discovered {
        let record = ingest_one(config, entry);
        files.insert(entry.rel_path.clone(), record);
    }
    files
}

pub(crate) fn ingest_one(config: &Config, entry: &DiscoveredFile) -> FileRecord {
    let bytes = match std::fs::read(&entry.abs_path) {
        Ok(b) => b,
        Err(e) => {
            warn!("cannot read {}: {e}", entry.rel_path);
            return crate::extract::generic::extract_partial(
                &entry.rel_path,
                entry.language.as_str(),
                &[],
            );
        }
    };

    if bytes.len() as u64 > config.max_file_bytes {
        warn!(
            "{} exceeds max_file_bytes ({} > {}), treating as partial",
            entry.rel_path,
            bytes.len(),
            config.max_file_bytes
        );
        return crate::extract::generic::extract_partial(
            &entry.rel_path,
            entry.language.as_str(),
            &[],
        );
    }

    if looks_binary(&bytes) {
        warn!("{} looks binary, skipping symbol extraction", entry.rel_path);
        return crate::extract::generic::extract_partial(
            &entry.rel_path,
            entry.language.as_str(),
            &bytes,
        );
    }

    extract_file(&entry.rel_path, entry.language, &bytes)
}

fn looks_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_SNIFF_BYTES)].contains(&0)
}

// ---- pass 2: symbol table ----------------------------------------------

/// Index every function/class under both its qualified name and, when the
/// qualified name has a `Parent.member` shape, its bare member name too —
/// spec §4.C pass 2's "a caller rarely knows a method's enclosing class
/// up front" requirement.
pub(crate) fn build_symbol_table(index: &mut ProjectIndex) {
    let mut symbols: HashMap<String, Vec<SymbolLocation>> = HashMap::new();
    let mut paths: Vec<&String> = index.files.keys().collect();
    paths.sort();
    for path in paths {
        let file = &index.files[path];
        for f in &file.functions {
            insert_symbol(&mut symbols, path, &f.qname, f.kind, f.range);
        }
        for c in &file.classes {
            insert_symbol(&mut symbols, path, &c.qname, c.kind, c.range);
        }
    }
    index.symbols = symbols;
}

fn insert_symbol(
    symbols: &mut HashMap<String, Vec<SymbolLocation>>,
    path: &str,
    qname: &str,
    kind: crate::model::SymbolKind,
    range: crate::model::LineRange,
) {
    let loc = SymbolLocation {
        path: path.to_string(),
        qname: qname.to_string(),
        kind,
        range,
    };
    symbols.entry(qname.to_string()).or_default().push(loc.clone());
    if let Some(bare) = bare_name(qname)
        && bare != qname
    {
        symbols.entry(bare.to_string()).or_default().push(loc);
    }
}

fn bare_name(qname: &str) -> Option<&str> {
    qname.rsplit('.').next()
}

// ---- pass 3: import graph -----------------------------------------------

pub(crate) fn build_import_graph(index: &mut ProjectIndex) {
    let known_files: HashSet<String> = index.files.keys().cloned().collect();
    let mut imports_out: HashMap<String, HashSet<String>> = HashMap::new();
    let mut imports_in: HashMap<String, HashSet<String>> = HashMap::new();

    let mut paths: Vec<String> = index.files.keys().cloned().collect();
    paths.sort();
    for path in &paths {
        let file = &index.files[path];
        let language = language_of(&file.language);
        for import in &file.imports {
            if let Some(target) =
                crate::index::resolve::resolve_import(path, import, language, &known_files)
            {
                imports_out.entry(path.clone()).or_default().insert(target.clone());
                imports_in.entry(target).or_default().insert(path.clone());
            }
        }
    }

    index.imports_out = imports_out;
    index.imports_in = imports_in;
}

fn language_of(name: &str) -> Language {
    match name {
        "python" => Language::Python,
        "rust" => Language::Rust,
        "javascript" => Language::JavaScript,
        "typescript" => Language::TypeScript,
        "go" => Language::Go,
        "text" => Language::Text,
        _ => Language::Generic,
    }
}

// ---- pass 4: dependency graph -------------------------------------------

/// Three-tier reference resolution, applied per function, per file:
/// (1) the file's own import alias table, (2) a local definition in the
/// same file (handling `self.method`/`ClassName.method`), (3) a unique
/// global symbol-table match. Then a text rescan over the function's
/// source slice, widening step (1) to catch identifiers passed as bare
/// callbacks rather than called directly (spec §4.C pass 4 step (c)).
pub(crate) fn build_dependency_graph(index: &mut ProjectIndex) {
    let mut deps_out: HashMap<String, HashSet<String>> = HashMap::new();
    let mut deps_in: HashMap<String, HashSet<String>> = HashMap::new();

    let mut paths: Vec<String> = index.files.keys().cloned().collect();
    paths.sort();

    for path in &paths {
        let file = &index.files[path];
        let alias_table = build_alias_table(file);
        let local_by_bare = build_local_table(file);

        for func in &file.functions {
            let mut targets: HashSet<String> = HashSet::new();

            for raw in &func.local_refs {
                if let Some(target) =
                    resolve_ref(raw, &alias_table, &local_by_bare, &index.symbols)
                {
                    targets.insert(target);
                }
            }

            let body = file.slice(func.range).join("\n");
            for (bound_name, orig) in &alias_table {
                if targets.contains(orig) {
                    continue;
                }
                if word_appears(&body, bound_name) {
                    targets.insert(orig.clone());
                }
            }

            for target in targets {
                deps_out.entry(func.qname.clone()).or_default().insert(target.clone());
                deps_in.entry(target).or_default().insert(func.qname.clone());
            }
        }
    }

    index.deps_out = deps_out;
    index.deps_in = deps_in;
}

/// `bound name -> original name` for everything a file's imports bind into
/// scope. Wildcard imports contribute nothing (no way to enumerate the
/// names they bring in without resolving and parsing the target module).
fn build_alias_table(file: &FileRecord) -> HashMap<String, String> {
    let mut table = HashMap::new();
    for import in &file.imports {
        if import.is_wildcard {
            continue;
        }
        for (name, alias) in &import.imported {
            let bound = alias.clone().unwrap_or_else(|| name.clone());
            table.insert(bound, name.clone());
        }
    }
    table
}

/// `bare member name -> qualified name` for functions/classes declared in
/// this same file, so `self.method` and `ClassName.method` refs resolve
/// without needing the full qualified name.
fn build_local_table(file: &FileRecord) -> HashMap<String, String> {
    let mut table = HashMap::new();
    for f in &file.functions {
        if let Some(bare) = bare_name(&f.qname) {
            table.entry(bare.to_string()).or_insert_with(|| f.qname.clone());
        }
    }
    for c in &file.classes {
        if let Some(bare) = bare_name(&c.qname) {
            table.entry(bare.to_string()).or_insert_with(|| c.qname.clone());
        }
    }
    table
}

fn resolve_ref(
    raw: &str,
    alias_table: &HashMap<String, String>,
    local_by_bare: &HashMap<String, String>,
    global_symbols: &HashMap<String, Vec<SymbolLocation>>,
) -> Option<String> {
    let first_seg = raw.split('.').next()?;

    if first_seg == "self" || first_seg == "this" {
        let member = raw.splitn(2, '.').nth(1)?;
        return local_by_bare.get(member).cloned();
    }

    if let Some(orig) = alias_table.get(first_seg) {
        if first_seg == raw {
            return Some(orig.clone());
        }
        let rest = raw.splitn(2, '.').nth(1).unwrap_or("");
        let candidate = format!("{orig}.{rest}");
        if global_symbols.contains_key(&candidate) {
            return Some(candidate);
        }
        return Some(orig.clone());
    }

    if let Some(qn) = local_by_bare.get(first_seg) {
        if global_symbols.contains_key(raw) {
            return Some(raw.to_string());
        }
        return Some(qn.clone());
    }

    if global_symbols.contains_key(raw) {
        return Some(raw.to_string());
    }

    let bare = raw.rsplit('.').next().unwrap_or(raw);
    let mut matches: Vec<&String> = global_symbols
        .keys()
        .filter(|k| bare_name(k) == Some(bare))
        .collect();
    matches.dedup();
    if matches.len() == 1 {
        return Some(matches[0].clone());
    }
    None
}

fn word_appears(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let bytes = haystack.as_bytes();
    let wbytes = word.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(word) {
        let idx = start + pos;
        let before_ok = idx == 0 || !is_ident(bytes[idx - 1]);
        let after = idx + wbytes.len();
        let after_ok = after >= bytes.len() || !is_ident(bytes[after]);
        if before_ok && after_ok {
            return true;
        }
        start = idx + 1;
        if start >= haystack.len() {
            break;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn build(dir: &std::path::Path) -> ProjectIndex {
        let config = Config::from_root(dir).unwrap();
        build_index(&config)
    }

    #[test]
    fn ingests_every_discovered_file_into_the_symbol_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        let index = build(dir.path());
        assert_eq!(index.file_count(), 1);
        assert!(index.symbols.contains_key("foo"));
    }

    #[test]
    fn resolves_cross_file_call_through_import_alias() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        fs::write(
            dir.path().join("b.py"),
            "from a import foo\n\ndef run():\n    foo()\n",
        )
        .unwrap();
        let index = build(dir.path());
        assert!(index.deps_out.get("run").unwrap().contains("foo"));
        assert!(index.deps_in.get("foo").unwrap().contains("run"));
        assert!(index.imports_out.get("b.py").unwrap().contains("a.py"));
        assert!(index.imports_in.get("a.py").unwrap().contains("b.py"));
    }

    #[test]
    fn resolves_aliased_import_and_bare_callback_reference() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def handler():\n    pass\n").unwrap();
        fs::write(
            dir.path().join("b.py"),
            "from a import handler as h\n\ndef register():\n    on_event = h\n",
        )
        .unwrap();
        let index = build(dir.path());
        assert!(index.deps_out.get("register").unwrap().contains("handler"));
    }

    #[test]
    fn resolves_method_call_via_self() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "class Widget:\n    def helper(self):\n        pass\n\n    def run(self):\n        self.helper()\n",
        )
        .unwrap();
        let index = build(dir.path());
        assert!(index.deps_out.get("Widget.run").unwrap().contains("Widget.helper"));
    }

    #[test]
    fn oversized_file_is_flagged_partial_not_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let big = "x".repeat(10);
        fs::write(dir.path().join("big.py"), big).unwrap();
        let mut config = Config::from_root(dir.path()).unwrap();
        config.max_file_bytes = 1;
        let index = build_index(&config);
        let record = &index.files["big.py"];
        assert!(record.partial);
        assert!(record.functions.is_empty());
    }
}
