//! The in-memory data model: per-file records and the project-wide index
//! assembled from them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A 1-based, inclusive line range. `start <= end` always holds for a
/// range produced by an extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Interface,
    Trait,
    TypeAlias,
    Macro,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Struct => "struct",
            SymbolKind::Enum => "enum",
            SymbolKind::Interface => "interface",
            SymbolKind::Trait => "trait",
            SymbolKind::TypeAlias => "type_alias",
            SymbolKind::Macro => "macro",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_hint: Option<String>,
    /// Default-value text as written, if the parameter has one (spec.md §3:
    /// "default presence"). `None` means no default, not an empty default.
    pub default: Option<String>,
}

/// A function/method modifier keyword, as spec.md §3 enumerates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Async,
    Const,
    Unsafe,
    Pub,
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Bare, unqualified name (e.g. `method`, not `ClassName.method`).
    pub name: String,
    /// Qualified name: `ClassName.method` for methods, otherwise the bare name.
    pub qname: String,
    pub kind: SymbolKind,
    pub range: LineRange,
    pub signature: String,
    pub parameters: Vec<Parameter>,
    pub doc: Option<String>,
    /// Enclosing class/struct qualified name, if this is a method.
    pub parent: Option<String>,
    /// Names referenced in the body, as written in source (unresolved).
    pub local_refs: Vec<String>,
    /// Decorators/attributes as written in source, textual form (e.g.
    /// `@staticmethod`, `#[test]`), in source order.
    pub decorators: Vec<String>,
    /// `async`/`const`/`unsafe`/`pub`/`static` modifiers present on the
    /// declaration.
    pub modifiers: HashSet<Modifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRecord {
    /// Bare, unqualified name.
    pub name: String,
    pub qname: String,
    pub kind: SymbolKind,
    pub range: LineRange,
    pub signature: String,
    pub doc: Option<String>,
    /// Qualified names of methods declared on this class.
    pub methods: Vec<String>,
    /// Base classes/traits/interfaces as written in source (unresolved).
    pub bases: Vec<String>,
    /// Decorators/attributes as written in source, textual form, in source
    /// order.
    pub decorators: Vec<String>,
}

/// A single import statement as written in source. `imported` is the list of
/// names brought into scope; empty for a wildcard import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    pub range: LineRange,
    /// Module/path specifier as written (e.g. `a.b.c`, `./x`, `"a/b"`).
    pub module: String,
    /// `(name, alias)` pairs; `alias` is `None` when not aliased.
    pub imported: Vec<(String, Option<String>)>,
    pub is_wildcard: bool,
}

/// A detected heading/section in a text/markdown file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRecord {
    pub title: String,
    pub level: u8,
    pub range: LineRange,
}

/// What an extractor produced for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Project-relative, forward-slash-normalized path.
    pub path: String,
    pub language: String,
    pub total_lines: u32,
    pub total_chars: u64,
    /// Raw source lines, 0-indexed internally but addressed via 1-based
    /// `LineRange`s everywhere else.
    pub lines: Vec<String>,
    pub functions: Vec<FunctionRecord>,
    pub classes: Vec<ClassRecord>,
    pub imports: Vec<ImportRecord>,
    pub sections: Vec<SectionRecord>,
    /// Set when the extractor fell back to a partial/generic record after a
    /// read or parse error (spec error taxonomy: recoverable, not fatal).
    pub partial: bool,
}

impl FileRecord {
    /// Splice `range` (1-based, inclusive) out of `self.lines`, clamped to
    /// the file's bounds.
    pub fn slice(&self, range: LineRange) -> &[String] {
        let start = range.start.saturating_sub(1) as usize;
        let end = (range.end as usize).min(self.lines.len());
        if start >= self.lines.len() || start >= end {
            return &[];
        }
        &self.lines[start..end]
    }
}

/// The fully assembled, queryable project index. Readers borrow it;
/// writers (the builder and the incremental updater) replace it wholesale
/// or mutate it behind an exclusive lock (see `crate::update`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectIndex {
    pub files: HashMap<String, FileRecord>,
    /// Symbol name -> every location that defines it. A multimap: spec's
    /// Open Question on collisions is resolved by keeping all definitions
    /// (see DESIGN.md) rather than "first-found wins".
    pub symbols: HashMap<String, Vec<SymbolLocation>>,
    /// file path -> set of file paths it imports.
    pub imports_out: HashMap<String, HashSet<String>>,
    /// file path -> set of file paths that import it.
    pub imports_in: HashMap<String, HashSet<String>>,
    /// qualified symbol name -> set of qualified symbol names it references.
    pub deps_out: HashMap<String, HashSet<String>>,
    /// qualified symbol name -> set of qualified symbol names that reference it.
    pub deps_in: HashMap<String, HashSet<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolLocation {
    pub path: String,
    pub qname: String,
    pub kind: SymbolKind,
    pub range: LineRange,
}

impl ProjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.values().map(|v| v.len()).sum()
    }
}
