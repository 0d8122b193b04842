//! Lexical Rust extractor: brace/paren-depth tracking with regex for
//! declaration shapes, per spec §4.B. Unlike the teacher's tree-sitter
//! `rust_lang.rs`, this never builds a syntax tree — it scans masked
//! (string/comment-free) source text directly.
//!
//! Limitation, accepted rather than solved (see DESIGN.md): declarations
//! inside a `mod { ... }` block are not attributed to that module and are
//! dropped, since this extractor only recognizes two nesting levels
//! (free items, and items directly inside an `impl` block).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::extract::lexical::{
    RUST_FLAVOR, collapse_whitespace, find_block_end, line_range_for, mask_non_code,
};
use crate::model::{
    ClassRecord, FileRecord, FunctionRecord, ImportRecord, Modifier, Parameter, SymbolKind,
};

static FN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+\x22[^\x22]*\x22\s+)?fn\s+([A-Za-z_]\w*)\s*(?:<[^>]*>)?\s*\(").unwrap()
});
static STRUCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?struct\s+([A-Za-z_]\w*)").unwrap());
static ENUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?enum\s+([A-Za-z_]\w*)").unwrap());
static TRAIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?trait\s+([A-Za-z_]\w*)").unwrap());
static IMPL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:unsafe\s+)?impl(?:<[^>]*>)?\s+(?:([A-Za-z_][\w:]*)(?:<[^>]*>)?\s+for\s+)?([A-Za-z_][\w:]*)").unwrap()
});
static USE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?\s+)?use\s+([^;]+);").unwrap());
static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_][\w:]*(?:\.[A-Za-z_]\w*)*)\s*\(").unwrap());

const RUST_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "loop", "match", "return", "fn", "let", "mut", "struct", "enum",
    "impl", "trait", "pub", "use", "mod", "self", "Self", "super", "crate", "as", "in", "where",
    "unsafe", "async", "await", "move", "ref", "dyn", "sizeof", "macro_rules",
];

pub fn extract(path: &str, source: &[u8]) -> FileRecord {
    let text = String::from_utf8_lossy(source);
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
    let mask = mask_non_code(source, RUST_FLAVOR);

    let imports = extract_imports(source, &mask);
    let impl_ranges = find_impls(source, &mask);

    let mut functions = Vec::new();
    let mut classes = Vec::new();

    for (container, header_start, body_start, body_end) in &impl_ranges {
        let methods = find_fns(source, &mask, *body_start, *body_end, Some(container));
        let method_names: Vec<String> = methods.iter().map(|f| f.qname.clone()).collect();
        functions.extend(methods);
        classes.push(ClassRecord {
            name: container.clone(),
            qname: container.clone(),
            kind: SymbolKind::Struct,
            range: line_range_for(source, *header_start, *body_end),
            signature: format!("impl {container}"),
            doc: leading_doc_comment(&text, *header_start),
            methods: method_names,
            bases: Vec::new(),
            decorators: leading_attributes(&text, *header_start),
        });
    }

    // free functions: depth 0, not inside any impl body
    for f in find_fns_at_depth0(source, &mask, &impl_ranges) {
        functions.push(f);
    }

    for m in STRUCT_RE.captures_iter(&text) {
        push_type_record(&mut classes, &text, source, &m, "struct");
    }
    for m in ENUM_RE.captures_iter(&text) {
        push_type_record(&mut classes, &text, source, &m, "enum");
    }
    for m in TRAIT_RE.captures_iter(&text) {
        push_type_record(&mut classes, &text, source, &m, "trait");
    }

    FileRecord {
        path: path.to_string(),
        language: "rust".to_string(),
        total_lines: lines.len() as u32,
        total_chars: text.chars().count() as u64,
        lines,
        functions,
        classes,
        imports,
        sections: Vec::new(),
        partial: false,
    }
}

fn push_type_record(
    classes: &mut Vec<ClassRecord>,
    text: &str,
    source: &[u8],
    m: &regex::Captures,
    kind_word: &str,
) {
    let whole = m.get(0).unwrap();
    if depth_before(source, whole.start()) != 0 {
        return; // nested inside something else; out of scope for this scanner
    }
    let name = m.get(1).unwrap().as_str().to_string();
    let line_end = text[whole.start()..].find(['{', ';']).map(|i| whole.start() + i);
    let range_end = line_end.unwrap_or(whole.end());
    classes.push(ClassRecord {
        name: name.clone(),
        qname: name,
        kind: match kind_word {
            "struct" => SymbolKind::Struct,
            "enum" => SymbolKind::Enum,
            _ => SymbolKind::Trait,
        },
        range: line_range_for(source, whole.start(), range_end),
        signature: collapse_whitespace(&text[whole.start()..range_end]),
        doc: leading_doc_comment(text, whole.start()),
        methods: Vec::new(),
        bases: Vec::new(),
        decorators: leading_attributes(text, whole.start()),
    });
}

fn find_impls(source: &[u8], mask: &[bool]) -> Vec<(String, usize, usize, usize)> {
    let text = String::from_utf8_lossy(source);
    let mut out = Vec::new();
    for m in IMPL_RE.captures_iter(&text) {
        let whole = m.get(0).unwrap();
        if depth_before(source, whole.start()) != 0 {
            continue;
        }
        let container = m.get(2).unwrap().as_str().to_string();
        let Some(body_end) = find_block_end(source, mask, whole.end()) else {
            continue;
        };
        let body_start = source[whole.end()..body_end]
            .iter()
            .position(|&b| b == b'{')
            .map(|p| whole.end() + p + 1)
            .unwrap_or(whole.end());
        out.push((container, whole.start(), body_start, body_end));
    }
    out
}

fn find_fns(
    source: &[u8],
    mask: &[bool],
    body_start: usize,
    body_end: usize,
    container: Option<&str>,
) -> Vec<FunctionRecord> {
    let text = String::from_utf8_lossy(source);
    let base_depth = depth_before(source, body_start);
    let mut out = Vec::new();
    for m in FN_RE.captures_iter(&text[body_start..body_end]) {
        let whole = m.get(0).unwrap();
        let abs_start = body_start + whole.start();
        if depth_before(source, abs_start) != base_depth {
            continue; // nested inside a method body, not a direct item
        }
        let name = m.get(1).unwrap().as_str().to_string();
        out.push(build_function(source, mask, abs_start, &name, container));
    }
    out
}

fn find_fns_at_depth0(
    source: &[u8],
    mask: &[bool],
    impl_ranges: &[(String, usize, usize, usize)],
) -> Vec<FunctionRecord> {
    let text = String::from_utf8_lossy(source);
    let mut out = Vec::new();
    for m in FN_RE.captures_iter(&text) {
        let whole = m.get(0).unwrap();
        if depth_before(source, whole.start()) != 0 {
            continue;
        }
        if impl_ranges
            .iter()
            .any(|(_, _, bs, be)| whole.start() >= *bs && whole.start() < *be)
        {
            continue; // already captured as a method
        }
        let name = m.get(1).unwrap().as_str().to_string();
        out.push(build_function(source, mask, whole.start(), &name, None));
    }
    out
}

fn build_function(
    source: &[u8],
    mask: &[bool],
    decl_start: usize,
    name: &str,
    container: Option<&str>,
) -> FunctionRecord {
    let text = String::from_utf8_lossy(source);
    let qname = match container {
        Some(c) => format!("{c}.{name}"),
        None => name.to_string(),
    };

    let body_end = find_block_end(source, mask, decl_start).unwrap_or(source.len());
    let sig_end = text[decl_start..body_end]
        .find('{')
        .map(|i| decl_start + i)
        .unwrap_or(body_end);
    let signature = collapse_whitespace(&text[decl_start..sig_end]);
    let parameters = parse_parameters(&signature);
    let modifiers = function_modifiers(&signature);

    let local_refs: Vec<String> = CALL_RE
        .captures_iter(&text[decl_start..body_end])
        .map(|c| c.get(1).unwrap().as_str().to_string())
        .filter(|n| !RUST_KEYWORDS.contains(&n.as_str()))
        .collect();

    FunctionRecord {
        name: name.to_string(),
        qname,
        kind: if container.is_some() {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        },
        range: line_range_for(source, decl_start, body_end),
        signature,
        parameters,
        doc: leading_doc_comment(&text, decl_start),
        parent: container.map(str::to_string),
        local_refs,
        decorators: leading_attributes(&text, decl_start),
        modifiers,
    }
}

/// `pub`/`const`/`async`/`unsafe` keywords present before `fn` in a
/// (possibly multi-line, already-collapsed) declaration signature.
fn function_modifiers(signature: &str) -> HashSet<Modifier> {
    let prefix = signature.split("fn").next().unwrap_or("");
    let mut mods = HashSet::new();
    for tok in prefix.split_whitespace() {
        if tok.starts_with("pub") {
            mods.insert(Modifier::Pub);
        } else if tok == "const" {
            mods.insert(Modifier::Const);
        } else if tok == "async" {
            mods.insert(Modifier::Async);
        } else if tok == "unsafe" {
            mods.insert(Modifier::Unsafe);
        }
    }
    mods
}

fn parse_parameters(signature: &str) -> Vec<Parameter> {
    let Some(open) = signature.find('(') else {
        return Vec::new();
    };
    let Some(close) = signature.rfind(')') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    signature[open + 1..close]
        .split(',')
        .filter_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw == "self" || raw == "&self" || raw == "&mut self" {
                return None;
            }
            let mut parts = raw.splitn(2, ':');
            let name = parts.next()?.trim().trim_start_matches("mut ").to_string();
            // Rust function parameters never carry a default value; `default`
            // is always `None` here (default arguments don't exist in the
            // language), unlike TS/JS/Python.
            let type_hint = parts.next().map(|t| t.trim().to_string());
            Some(Parameter { name, type_hint, default: None })
        })
        .collect()
}

fn extract_imports(source: &[u8], _mask: &[bool]) -> Vec<ImportRecord> {
    let text = String::from_utf8_lossy(source);
    let mut out = Vec::new();
    for m in USE_RE.captures_iter(&text) {
        let whole = m.get(0).unwrap();
        if depth_before(source, whole.start()) != 0 {
            continue;
        }
        let path_spec = m.get(1).unwrap().as_str().trim();
        let is_wildcard = path_spec.ends_with("::*");
        let module = path_spec
            .trim_end_matches("::*")
            .split("::{")
            .next()
            .unwrap_or(path_spec)
            .to_string();
        out.push(ImportRecord {
            range: line_range_for(source, whole.start(), whole.end()),
            module,
            imported: Vec::new(),
            is_wildcard,
        });
    }
    out
}

/// Net brace depth of unmasked (real-code) `{`/`}` before byte `pos`.
fn depth_before(source: &[u8], pos: usize) -> i32 {
    let mask = mask_non_code(source, RUST_FLAVOR);
    let mut depth = 0i32;
    for (i, &b) in source.iter().enumerate().take(pos) {
        if mask[i] {
            match b {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
        }
    }
    depth
}

/// Scan upward from `decl_start` collecting contiguous `///`/`//!` lines,
/// skipping over any interleaved `#[...]` attribute lines.
fn leading_doc_comment(text: &str, decl_start: usize) -> Option<String> {
    let before = &text[..decl_start];
    let mut doc_lines = Vec::new();
    for line in before.lines().rev() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("///").or_else(|| trimmed.strip_prefix("//!")) {
            doc_lines.push(rest.trim_start().to_string());
        } else if trimmed.is_empty() || (trimmed.starts_with("#[") && trimmed.ends_with(']')) {
            continue;
        } else {
            break;
        }
    }
    if doc_lines.is_empty() {
        None
    } else {
        doc_lines.reverse();
        Some(doc_lines.join("\n"))
    }
}

/// Scan upward from `decl_start` collecting contiguous `#[...]` attribute
/// lines, skipping over any interleaved `///`/`//!` doc comment lines.
fn leading_attributes(text: &str, decl_start: usize) -> Vec<String> {
    let before = &text[..decl_start];
    let mut attrs = Vec::new();
    for line in before.lines().rev() {
        let trimmed = line.trim();
        if trimmed.starts_with("#[") && trimmed.ends_with(']') {
            attrs.push(trimmed.to_string());
        } else if trimmed.is_empty() || trimmed.starts_with("///") || trimmed.starts_with("//!") {
            continue;
        } else {
            break;
        }
    }
    attrs.reverse();
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_free_function() {
        let src = b"fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n";
        let record = extract("a.rs", src);
        assert_eq!(record.functions.len(), 1);
        let f = &record.functions[0];
        assert_eq!(f.qname, "add");
        assert_eq!(f.parameters.len(), 2);
        assert_eq!(f.parameters[0].name, "a");
    }

    #[test]
    fn extracts_impl_methods() {
        let src = b"struct Counter;\n\nimpl Counter {\n    pub fn incr(&mut self) {\n        helper();\n    }\n}\n\nfn helper() {}\n";
        let record = extract("a.rs", src);
        assert_eq!(record.classes.len(), 1);
        assert_eq!(record.classes[0].qname, "Counter");
        let method = record.functions.iter().find(|f| f.qname == "Counter.incr").unwrap();
        assert_eq!(method.parent.as_deref(), Some("Counter"));
        assert!(method.local_refs.contains(&"helper".to_string()));
        assert!(record.functions.iter().any(|f| f.qname == "helper"));
    }

    #[test]
    fn ignores_braces_in_strings_and_comments() {
        let src = b"fn weird() {\n    let s = \"{ not a brace }\";\n    // } also ignored\n}\n";
        let record = extract("a.rs", src);
        assert_eq!(record.functions.len(), 1);
        assert_eq!(record.functions[0].range.end, 4);
    }

    #[test]
    fn extracts_use_statements() {
        let src = b"use std::collections::HashMap;\nuse crate::model::*;\n";
        let record = extract("a.rs", src);
        assert_eq!(record.imports.len(), 2);
        assert_eq!(record.imports[0].module, "std::collections::HashMap");
        assert!(record.imports[1].is_wildcard);
    }

    #[test]
    fn captures_doc_comments() {
        let src = b"/// Adds two numbers.\nfn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n";
        let record = extract("a.rs", src);
        assert_eq!(record.functions[0].doc.as_deref(), Some("Adds two numbers."));
    }

    #[test]
    fn captures_modifiers_and_attributes() {
        let src = b"#[test]\npub async unsafe fn go() {\n}\n";
        let record = extract("a.rs", src);
        let f = &record.functions[0];
        assert_eq!(f.name, "go");
        assert!(f.modifiers.contains(&Modifier::Pub));
        assert!(f.modifiers.contains(&Modifier::Async));
        assert!(f.modifiers.contains(&Modifier::Unsafe));
        assert_eq!(f.decorators, vec!["#[test]".to_string()]);
    }

    #[test]
    fn const_fn_sets_const_modifier() {
        let src = b"pub const fn zero() -> i32 {\n    0\n}\n";
        let record = extract("a.rs", src);
        let f = &record.functions[0];
        assert!(f.modifiers.contains(&Modifier::Pub));
        assert!(f.modifiers.contains(&Modifier::Const));
    }
}
