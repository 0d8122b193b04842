//! Component E: the 17 read-only queries over a `ProjectIndex` (spec §4.E,
//! §6). `QueryEngine<'a>` borrows the index — "a stable interface on a
//! single value that owns the index" per spec §9's REDESIGN FLAGS — and
//! every operation takes a typed parameter struct (`query::params`) and
//! returns a typed, owned result so the MCP/CLI boundary can serialize it
//! directly with `serde_json`.
//!
//! Grounded on `server::mcp`'s "locate, slice, format" tool bodies,
//! adapted to read straight out of `FileRecord.lines` instead of
//! re-querying SQLite.

pub mod params;

use std::collections::{HashSet, VecDeque};

use regex::Regex;
use serde::Serialize;

pub use params::*;

use crate::error::QueryError;
use crate::model::{
    ClassRecord, FileRecord, FunctionRecord, ImportRecord, ProjectIndex, SymbolLocation,
};

/// Uniform truncation envelope (spec §4.E): every list-returning query
/// honors `max_results == 0` meaning unlimited, flags truncation
/// explicitly, and truncation is always a prefix of the unlimited
/// (documented-order) result.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub truncated: bool,
    pub total: usize,
}

fn page<T>(mut items: Vec<T>, max_results: u32) -> Page<T> {
    let total = items.len();
    let truncated = max_results != 0 && (max_results as usize) < total;
    if truncated {
        items.truncate(max_results as usize);
    }
    Page {
        items,
        truncated,
        total,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub path: String,
    pub language: String,
    pub total_lines: u32,
    pub function_count: usize,
    pub class_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub file_count: usize,
    pub symbol_count: usize,
    pub function_count: usize,
    pub class_count: usize,
    pub import_count: usize,
    pub partial_file_count: usize,
    pub languages: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureSummary {
    pub path: Option<String>,
    pub files: usize,
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSlice {
    pub path: String,
    pub qname: String,
    pub start: u32,
    pub end: u32,
    pub lines: Vec<String>,
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyEdge {
    pub path: String,
    pub line: u32,
    pub qname: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeImpact {
    pub direct: Vec<DependencyEdge>,
    pub direct_truncated: bool,
    pub transitive: Vec<DependencyEdge>,
    pub transitive_truncated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchMatch {
    pub path: String,
    pub line: u32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportEntry {
    pub path: String,
    pub line: u32,
    pub module: String,
    pub imported: Vec<String>,
    pub is_wildcard: bool,
}

pub struct QueryEngine<'a> {
    index: &'a ProjectIndex,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a ProjectIndex) -> Self {
        Self { index }
    }

    // ---- file-scoped projections -----------------------------------

    pub fn get_project_summary(&self) -> ProjectSummary {
        let mut languages: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();
        let mut function_count = 0;
        let mut class_count = 0;
        let mut import_count = 0;
        let mut partial_file_count = 0;
        for f in self.index.files.values() {
            *languages.entry(f.language.clone()).or_default() += 1;
            function_count += f.functions.len();
            class_count += f.classes.len();
            import_count += f.imports.len();
            if f.partial {
                partial_file_count += 1;
            }
        }
        let mut languages: Vec<(String, usize)> = languages.into_iter().collect();
        languages.sort();
        ProjectSummary {
            file_count: self.index.file_count(),
            symbol_count: self.index.symbol_count(),
            function_count,
            class_count,
            import_count,
            partial_file_count,
            languages,
        }
    }

    pub fn list_files(&self, p: ListFilesParams) -> Page<FileSummary> {
        let mut paths: Vec<&String> = self.index.files.keys().collect();
        paths.sort();
        let summaries: Vec<FileSummary> = paths
            .into_iter()
            .filter(|path| p.pattern.as_deref().is_none_or(|pat| glob_match(pat, path)))
            .map(|path| {
                let f = &self.index.files[path];
                FileSummary {
                    path: f.path.clone(),
                    language: f.language.clone(),
                    total_lines: f.total_lines,
                    function_count: f.functions.len(),
                    class_count: f.classes.len(),
                }
            })
            .collect();
        page(summaries, p.max_results)
    }

    pub fn get_structure_summary(
        &self,
        p: GetStructureSummaryParams,
    ) -> Result<StructureSummary, QueryError> {
        match p.path {
            Some(path) => {
                let f = self.file(&path)?;
                Ok(StructureSummary {
                    path: Some(path),
                    files: 1,
                    functions: f.functions.iter().map(|x| x.qname.clone()).collect(),
                    classes: f.classes.iter().map(|x| x.qname.clone()).collect(),
                    sections: f.sections.iter().map(|x| x.title.clone()).collect(),
                })
            }
            None => {
                let mut functions = Vec::new();
                let mut classes = Vec::new();
                let mut sections = Vec::new();
                for f in self.index.files.values() {
                    functions.extend(f.functions.iter().map(|x| x.qname.clone()));
                    classes.extend(f.classes.iter().map(|x| x.qname.clone()));
                    sections.extend(f.sections.iter().map(|x| x.title.clone()));
                }
                functions.sort();
                classes.sort();
                sections.sort();
                Ok(StructureSummary {
                    path: None,
                    files: self.index.file_count(),
                    functions,
                    classes,
                    sections,
                })
            }
        }
    }

    pub fn get_functions(&self, p: GetFunctionsParams) -> Result<Page<FunctionRecord>, QueryError> {
        let mut out: Vec<FunctionRecord> = match &p.path {
            Some(path) => self.file(path)?.functions.clone(),
            None => {
                let mut fs = Vec::new();
                for (path, f) in self.sorted_files() {
                    for func in &f.functions {
                        let mut func = func.clone();
                        func.qname = format!("{path}::{}", func.qname);
                        fs.push(func);
                    }
                }
                fs
            }
        };
        out.sort_by(|a, b| a.range.start.cmp(&b.range.start).then(a.qname.cmp(&b.qname)));
        Ok(page(out, p.max_results))
    }

    pub fn get_classes(&self, p: GetClassesParams) -> Result<Page<ClassRecord>, QueryError> {
        let mut out: Vec<ClassRecord> = match &p.path {
            Some(path) => self.file(path)?.classes.clone(),
            None => {
                let mut cs = Vec::new();
                for (path, f) in self.sorted_files() {
                    for class in &f.classes {
                        let mut class = class.clone();
                        class.qname = format!("{path}::{}", class.qname);
                        cs.push(class);
                    }
                }
                cs
            }
        };
        out.sort_by(|a, b| a.range.start.cmp(&b.range.start).then(a.qname.cmp(&b.qname)));
        Ok(page(out, p.max_results))
    }

    pub fn get_imports(&self, p: GetImportsParams) -> Result<Page<ImportEntry>, QueryError> {
        let mut out = Vec::new();
        let files: Vec<(&String, &FileRecord)> = match &p.path {
            Some(path) => vec![(path, self.file(path)?)],
            None => self.sorted_files(),
        };
        for (path, f) in files {
            for imp in &f.imports {
                out.push(to_import_entry(path, imp));
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));
        Ok(page(out, p.max_results))
    }

    pub fn get_lines(&self, p: GetLinesParams) -> Result<Vec<String>, QueryError> {
        let f = self.file(&p.path)?;
        if p.start == 0 || p.start > p.end || p.end > f.total_lines {
            return Err(QueryError::OutOfRange {
                start: p.start,
                end: p.end,
                total: f.total_lines,
            });
        }
        Ok(f.lines[(p.start - 1) as usize..p.end as usize].to_vec())
    }

    // ---- symbol lookup & source slicing ------------------------------

    pub fn find_symbol(&self, p: FindSymbolParams) -> Result<SymbolLocation, QueryError> {
        self.resolve_symbol(&p.name, None)
    }

    pub fn get_function_source(
        &self,
        p: GetFunctionSourceParams,
    ) -> Result<SourceSlice, QueryError> {
        let loc = self.resolve_symbol(&p.name, p.path.as_deref())?;
        self.slice(&loc, p.max_lines)
    }

    pub fn get_class_source(&self, p: GetClassSourceParams) -> Result<SourceSlice, QueryError> {
        let loc = self.resolve_symbol(&p.name, p.path.as_deref())?;
        self.slice(&loc, p.max_lines)
    }

    // ---- dependency graph ---------------------------------------------

    pub fn get_dependencies(
        &self,
        p: GetDependenciesParams,
    ) -> Result<Page<DependencyEdge>, QueryError> {
        self.symbol_set(&p.symbol)?;
        let edges = self.edges_from(&self.index.deps_out, &p.symbol);
        Ok(page(edges, p.max_results))
    }

    pub fn get_dependents(
        &self,
        p: GetDependentsParams,
    ) -> Result<Page<DependencyEdge>, QueryError> {
        self.symbol_set(&p.symbol)?;
        let edges = self.edges_from(&self.index.deps_in, &p.symbol);
        Ok(page(edges, p.max_results))
    }

    pub fn get_change_impact(
        &self,
        p: GetChangeImpactParams,
    ) -> Result<ChangeImpact, QueryError> {
        self.symbol_set(&p.symbol)?;
        let direct_names: HashSet<String> = self
            .index
            .deps_in
            .get(&p.symbol)
            .cloned()
            .unwrap_or_default();

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(p.symbol.clone());
        // Each queue/order entry carries its BFS depth so the final sort can
        // order transitive results primarily by BFS depth, only breaking
        // ties within the same depth by (path, line) (spec.md §4.E).
        let mut queue: VecDeque<(String, u32)> =
            direct_names.iter().cloned().map(|n| (n, 0)).collect();
        for n in &direct_names {
            visited.insert(n.clone());
        }
        let mut transitive_order: Vec<(String, u32)> = Vec::new();
        while let Some((cur, depth)) = queue.pop_front() {
            let Some(preds) = self.index.deps_in.get(&cur) else {
                continue;
            };
            let mut names: Vec<&String> = preds.iter().collect();
            names.sort();
            for n in names {
                if visited.insert(n.clone()) {
                    if !direct_names.contains(n) {
                        transitive_order.push((n.clone(), depth + 1));
                    }
                    queue.push_back((n.clone(), depth + 1));
                }
            }
        }

        let direct = self.edges_from(&self.index.deps_in, &p.symbol);
        let direct_page = page(direct, p.max_direct);

        let mut transitive: Vec<(u32, DependencyEdge)> = transitive_order
            .into_iter()
            .flat_map(|(qname, depth)| {
                self.locations_for(&qname).into_iter().map(move |e| (depth, e))
            })
            .collect();
        transitive.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(a.1.path.cmp(&b.1.path))
                .then(a.1.line.cmp(&b.1.line))
        });
        let transitive: Vec<DependencyEdge> = transitive.into_iter().map(|(_, e)| e).collect();
        let transitive_page = page(transitive, p.max_transitive);

        Ok(ChangeImpact {
            direct: direct_page.items,
            direct_truncated: direct_page.truncated,
            transitive: transitive_page.items,
            transitive_truncated: transitive_page.truncated,
        })
    }

    pub fn get_call_chain(
        &self,
        p: GetCallChainParams,
    ) -> Result<Option<Vec<String>>, QueryError> {
        self.symbol_set(&p.from)?;
        self.symbol_set(&p.to)?;
        if p.from == p.to {
            return Ok(Some(vec![p.from]));
        }
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(p.from.clone());
        let mut queue: VecDeque<Vec<String>> = VecDeque::new();
        queue.push_back(vec![p.from.clone()]);
        while let Some(path) = queue.pop_front() {
            let last = path.last().unwrap();
            let Some(next) = self.index.deps_out.get(last) else {
                continue;
            };
            let mut names: Vec<&String> = next.iter().collect();
            names.sort();
            for n in names {
                if n == &p.to {
                    let mut path = path.clone();
                    path.push(n.clone());
                    return Ok(Some(path));
                }
                if visited.insert(n.clone()) {
                    let mut path = path.clone();
                    path.push(n.clone());
                    queue.push_back(path);
                }
            }
        }
        Ok(None)
    }

    // ---- import graph ---------------------------------------------------

    pub fn get_file_dependencies(
        &self,
        p: GetFileDependenciesParams,
    ) -> Result<Page<String>, QueryError> {
        self.file(&p.path)?;
        let mut out: Vec<String> = self
            .index
            .imports_out
            .get(&p.path)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect();
        out.sort();
        Ok(page(out, p.max_results))
    }

    pub fn get_file_dependents(
        &self,
        p: GetFileDependentsParams,
    ) -> Result<Page<String>, QueryError> {
        self.file(&p.path)?;
        let mut out: Vec<String> = self
            .index
            .imports_in
            .get(&p.path)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect();
        out.sort();
        Ok(page(out, p.max_results))
    }

    // ---- text search ------------------------------------------------------

    /// Streams files in sorted path order, emitting the first match per
    /// line, short-circuiting once `max_results` is reached (spec §4.E:
    /// "the only query allowed to short-circuit mid-scan").
    pub fn search_codebase(
        &self,
        p: SearchCodebaseParams,
    ) -> Result<Page<SearchMatch>, QueryError> {
        let re = Regex::new(&p.regex)?;
        let mut out = Vec::new();
        let mut hit_cap = false;
        'outer: for (path, f) in self.sorted_files() {
            for (i, line) in f.lines.iter().enumerate() {
                if re.is_match(line) {
                    out.push(SearchMatch {
                        path: path.clone(),
                        line: i as u32 + 1,
                        text: line.clone(),
                    });
                    if p.max_results != 0 && out.len() >= p.max_results as usize {
                        hit_cap = true;
                        break 'outer;
                    }
                }
            }
        }
        Ok(Page {
            truncated: hit_cap,
            total: out.len(),
            items: out,
        })
    }

    // ---- helpers ------------------------------------------------------

    fn sorted_files(&self) -> Vec<(&String, &FileRecord)> {
        let mut files: Vec<(&String, &FileRecord)> = self.index.files.iter().collect();
        files.sort_by(|a, b| a.0.cmp(b.0));
        files
    }

    fn file(&self, path: &str) -> Result<&FileRecord, QueryError> {
        self.index
            .files
            .get(path)
            .ok_or_else(|| QueryError::UnknownFile(path.to_string()))
    }

    fn symbol_set(&self, qname: &str) -> Result<(), QueryError> {
        if self.index.symbols.contains_key(qname) {
            Ok(())
        } else {
            Err(QueryError::UnknownSymbol(qname.to_string()))
        }
    }

    /// find_symbol's tie-break: exact qualified-name match (always true
    /// here, since `symbols` is keyed by qname already) else
    /// lexicographically-smallest path, else smallest line (spec §3/§4.E).
    fn resolve_symbol(
        &self,
        name: &str,
        path_hint: Option<&str>,
    ) -> Result<SymbolLocation, QueryError> {
        let locs = self
            .index
            .symbols
            .get(name)
            .ok_or_else(|| QueryError::UnknownSymbol(name.to_string()))?;
        if let Some(path) = path_hint
            && let Some(exact) = locs.iter().find(|l| l.path == path)
        {
            return Ok(exact.clone());
        }
        let mut sorted: Vec<&SymbolLocation> = locs.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path).then(a.range.start.cmp(&b.range.start)));
        sorted
            .into_iter()
            .next()
            .cloned()
            .ok_or_else(|| QueryError::UnknownSymbol(name.to_string()))
    }

    fn slice(&self, loc: &SymbolLocation, max_lines: u32) -> Result<SourceSlice, QueryError> {
        let f = self.file(&loc.path)?;
        let full = f.slice(loc.range);
        let truncated = max_lines != 0 && (max_lines as usize) < full.len();
        let mut lines: Vec<String> = if truncated {
            full[..max_lines as usize].to_vec()
        } else {
            full.to_vec()
        };
        if truncated {
            lines.push(format!(
                "... truncated {} more line(s) ...",
                full.len() - max_lines as usize
            ));
        }
        Ok(SourceSlice {
            path: loc.path.clone(),
            qname: loc.qname.clone(),
            start: loc.range.start,
            end: loc.range.end,
            lines,
            truncated,
        })
    }

    fn edges_from(
        &self,
        graph: &std::collections::HashMap<String, HashSet<String>>,
        qname: &str,
    ) -> Vec<DependencyEdge> {
        let mut out: Vec<DependencyEdge> = graph
            .get(qname)
            .into_iter()
            .flatten()
            .flat_map(|target| self.locations_for(target))
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));
        out
    }

    fn locations_for(&self, qname: &str) -> Vec<DependencyEdge> {
        self.index
            .symbols
            .get(qname)
            .into_iter()
            .flatten()
            .map(|loc| DependencyEdge {
                path: loc.path.clone(),
                line: loc.range.start,
                qname: qname.to_string(),
            })
            .collect()
    }
}

fn to_import_entry(path: &str, imp: &ImportRecord) -> ImportEntry {
    ImportEntry {
        path: path.to_string(),
        line: imp.range.start,
        module: imp.module.clone(),
        imported: imp.imported.iter().map(|(n, _)| n.clone()).collect(),
        is_wildcard: imp.is_wildcard,
    }
}

/// Same minimal glob (leading/trailing `*`) as `discovery::detect_language`
/// callers use for include/exclude patterns — `list_files`'s `pattern` is
/// the same kind of "sensible default, not a full glob language" filter.
fn glob_match(pattern: &str, text: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        return text.ends_with(suffix);
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return text.starts_with(prefix);
    }
    pattern == text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::index::builder::build_index;
    use std::fs;

    fn build(dir: &std::path::Path) -> ProjectIndex {
        let config = Config::from_root(dir).unwrap();
        build_index(&config)
    }

    #[test]
    fn find_symbol_and_get_function_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    return 1\n").unwrap();
        let index = build(dir.path());
        let engine = QueryEngine::new(&index);

        let loc = engine
            .find_symbol(FindSymbolParams { name: "foo".into() })
            .unwrap();
        assert_eq!(loc.path, "a.py");

        let src = engine
            .get_function_source(GetFunctionSourceParams {
                name: "foo".into(),
                path: None,
                max_lines: 0,
            })
            .unwrap();
        assert_eq!(src.lines.len(), 2);
        assert!(!src.truncated);
    }

    #[test]
    fn cross_file_dependents_and_call_chain() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "def foo():\n    pass\n").unwrap();
        fs::write(
            dir.path().join("b.py"),
            "from a import foo\ndef bar():\n    pass\ndef run():\n    foo()\n",
        )
        .unwrap();
        let index = build(dir.path());
        let engine = QueryEngine::new(&index);

        let dependents = engine
            .get_dependents(GetDependentsParams {
                symbol: "foo".into(),
                max_results: 0,
            })
            .unwrap();
        assert!(dependents.items.iter().any(|e| e.qname == "run"));

        let chain = engine
            .get_call_chain(GetCallChainParams {
                from: "run".into(),
                to: "foo".into(),
            })
            .unwrap();
        assert_eq!(chain, Some(vec!["run".to_string(), "foo".to_string()]));
    }

    #[test]
    fn change_impact_direct_and_transitive_are_disjoint() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "def c():\n    pass\ndef b():\n    c()\ndef a():\n    b()\ndef d():\n    b()\ndef e():\n    c()\n",
        )
        .unwrap();
        let index = build(dir.path());
        let engine = QueryEngine::new(&index);

        let impact = engine
            .get_change_impact(GetChangeImpactParams {
                symbol: "c".into(),
                max_direct: 0,
                max_transitive: 0,
            })
            .unwrap();
        let direct_names: HashSet<String> =
            impact.direct.iter().map(|e| e.qname.clone()).collect();
        let transitive_names: HashSet<String> =
            impact.transitive.iter().map(|e| e.qname.clone()).collect();
        assert!(direct_names.is_disjoint(&transitive_names));
        assert!(direct_names.contains("b"));
        assert!(direct_names.contains("e"));
        assert!(transitive_names.contains("a"));
        assert!(transitive_names.contains("d"));
    }

    #[test]
    fn search_codebase_truncates_honestly() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.txt"),
            "TODO one\nTODO two\nTODO three\nkeep\nTODO four\n",
        )
        .unwrap();
        let index = build(dir.path());
        let engine = QueryEngine::new(&index);

        let capped = engine
            .search_codebase(SearchCodebaseParams {
                regex: "TODO".into(),
                max_results: 2,
            })
            .unwrap();
        assert_eq!(capped.items.len(), 2);
        assert!(capped.truncated);

        let all = engine
            .search_codebase(SearchCodebaseParams {
                regex: "TODO".into(),
                max_results: 0,
            })
            .unwrap();
        assert_eq!(all.items.len(), 4);
        assert!(!all.truncated);
        assert_eq!(capped.items[0].text, all.items[0].text);
        assert_eq!(capped.items[1].text, all.items[1].text);
    }

    #[test]
    fn get_lines_out_of_range_is_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "one\ntwo\n").unwrap();
        let index = build(dir.path());
        let engine = QueryEngine::new(&index);
        let err = engine
            .get_lines(GetLinesParams {
                path: "a.txt".into(),
                start: 1,
                end: 99,
            })
            .unwrap_err();
        assert!(matches!(err, QueryError::OutOfRange { .. }));
    }
}
