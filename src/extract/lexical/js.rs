//! Lexical JavaScript/TypeScript extractor, shared by both languages
//! (spec §4.B treats them as one lexical family). TypeScript gets two
//! extra declaration shapes — `interface` and `type` aliases — that
//! don't exist in plain JS.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::extract::lexical::{JS_FLAVOR, collapse_whitespace, find_block_end, line_range_for, mask_non_code};
use crate::model::{
    ClassRecord, FileRecord, FunctionRecord, ImportRecord, Modifier, Parameter, SymbolKind,
};

static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s+([A-Za-z_$][\w$]*)\s*\(").unwrap()
});
static ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?\([^)]*\)\s*(?::[^=]+)?=>",
    )
    .unwrap()
});
static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?class\s+([A-Za-z_$][\w$]*)(?:\s+extends\s+([A-Za-z_$][\w$.]*))?").unwrap()
});
static INTERFACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export\s+)?interface\s+([A-Za-z_$][\w$]*)(?:\s+extends\s+([A-Za-z_$][\w$.,\s]*))?").unwrap()
});
static TYPE_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:export\s+)?type\s+([A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*=").unwrap());
static METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:public\s+|private\s+|protected\s+|static\s+|async\s+|get\s+|set\s+|\*\s*)*([A-Za-z_$][\w$]*)\s*\(").unwrap()
});
static IMPORT_FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*import\s+(?:type\s+)?(?:([\w$]+)\s*,\s*)?(?:\{([^}]*)\}|\*\s+as\s+([\w$]+)|([\w$]+))?\s*from\s*['"]([^'"]+)['"]"#,
    )
    .unwrap()
});
static IMPORT_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[ \t]*import\s*['"]([^'"]+)['"]"#).unwrap());
static REQUIRE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());
static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s*\(").unwrap());

const JS_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "switch", "catch", "function", "return", "new", "typeof",
    "instanceof", "in", "of", "do", "try", "finally", "constructor", "super", "this", "await",
    "yield", "async", "class", "extends", "import", "export", "from", "const", "let", "var",
];

pub fn extract(path: &str, source: &[u8], is_typescript: bool) -> FileRecord {
    let text = String::from_utf8_lossy(source);
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
    let mask = mask_non_code(source, JS_FLAVOR);

    let imports = extract_imports(&text, source);
    let class_ranges = find_classes(source, &mask, &text);

    let mut functions = Vec::new();
    let mut classes = Vec::new();

    for (name, bases, header_start, body_start, body_end) in &class_ranges {
        let methods = find_methods(source, &mask, &text, *body_start, *body_end, name);
        let method_names: Vec<String> = methods.iter().map(|f| f.qname.clone()).collect();
        functions.extend(methods);
        classes.push(ClassRecord {
            name: name.clone(),
            qname: name.clone(),
            kind: SymbolKind::Class,
            range: line_range_for(source, *header_start, *body_end),
            signature: collapse_whitespace(&text[*header_start..(*body_start).min(text.len())]),
            doc: leading_doc_comment(&text, *header_start),
            methods: method_names,
            bases: bases.clone(),
            decorators: leading_decorators(&text, *header_start),
        });
    }

    for m in FUNCTION_RE.captures_iter(&text) {
        let whole = m.get(0).unwrap();
        if in_any_class(whole.start(), &class_ranges) {
            continue;
        }
        let name = m.get(1).unwrap().as_str().to_string();
        functions.push(build_function(source, &mask, &text, whole.start(), &name, None));
    }

    for m in ARROW_RE.captures_iter(&text) {
        let whole = m.get(0).unwrap();
        if in_any_class(whole.start(), &class_ranges) {
            continue;
        }
        let name = m.get(1).unwrap().as_str().to_string();
        functions.push(build_function(source, &mask, &text, whole.start(), &name, None));
    }

    if is_typescript {
        for m in INTERFACE_RE.captures_iter(&text) {
            let whole = m.get(0).unwrap();
            let name = m.get(1).unwrap().as_str().to_string();
            let bases = m
                .get(2)
                .map(|g| g.as_str().split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default();
            let body_end = find_block_end(source, &mask, whole.end()).unwrap_or(whole.end());
            classes.push(ClassRecord {
                name: name.clone(),
                qname: name,
                kind: SymbolKind::Interface,
                range: line_range_for(source, whole.start(), body_end),
                signature: collapse_whitespace(whole.as_str()),
                doc: leading_doc_comment(&text, whole.start()),
                methods: Vec::new(),
                bases,
                decorators: leading_decorators(&text, whole.start()),
            });
        }
        for m in TYPE_ALIAS_RE.captures_iter(&text) {
            let whole = m.get(0).unwrap();
            let name = m.get(1).unwrap().as_str().to_string();
            let line_end = text[whole.start()..].find(';').map(|i| whole.start() + i).unwrap_or(whole.end());
            classes.push(ClassRecord {
                name: name.clone(),
                qname: name,
                kind: SymbolKind::TypeAlias,
                range: line_range_for(source, whole.start(), line_end),
                signature: collapse_whitespace(&text[whole.start()..line_end]),
                doc: leading_doc_comment(&text, whole.start()),
                methods: Vec::new(),
                bases: Vec::new(),
                decorators: leading_decorators(&text, whole.start()),
            });
        }
    }

    FileRecord {
        path: path.to_string(),
        language: if is_typescript { "typescript".to_string() } else { "javascript".to_string() },
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

type ClassSpan = (String, Vec<String>, usize, usize, usize);

fn find_classes(source: &[u8], mask: &[bool], text: &str) -> Vec<ClassSpan> {
    let mut out = Vec::new();
    for m in CLASS_RE.captures_iter(text) {
        let whole = m.get(0).unwrap();
        let name = m.get(1).unwrap().as_str().to_string();
        let bases = m.get(2).map(|g| vec![g.as_str().to_string()]).unwrap_or_default();
        let Some(body_end) = find_block_end(source, mask, whole.end()) else {
            continue;
        };
        let body_start = source[whole.end()..body_end]
            .iter()
            .position(|&b| b == b'{')
            .map(|p| whole.end() + p + 1)
            .unwrap_or(whole.end());
        out.push((name, bases, whole.start(), body_start, body_end));
    }
    out
}

fn in_any_class(pos: usize, classes: &[ClassSpan]) -> bool {
    classes.iter().any(|(_, _, _, bs, be)| pos >= *bs && pos < *be)
}

fn find_methods(
    source: &[u8],
    mask: &[bool],
    text: &str,
    body_start: usize,
    body_end: usize,
    class_name: &str,
) -> Vec<FunctionRecord> {
    let mut out = Vec::new();
    let base_depth = depth_before(source, mask, body_start);
    for m in METHOD_RE.captures_iter(&text[body_start..body_end]) {
        let whole = m.get(0).unwrap();
        let abs_start = body_start + whole.start();
        if depth_before(source, mask, abs_start) != base_depth {
            continue;
        }
        let name = m.get(1).unwrap().as_str().to_string();
        if JS_KEYWORDS.contains(&name.as_str()) {
            continue;
        }
        out.push(build_function(source, mask, text, abs_start, &name, Some(class_name)));
    }
    out
}

fn build_function(
    source: &[u8],
    mask: &[bool],
    text: &str,
    decl_start: usize,
    name: &str,
    container: Option<&str>,
) -> FunctionRecord {
    let qname = match container {
        Some(c) => format!("{c}.{name}"),
        None => name.to_string(),
    };
    let body_end = find_block_end(source, mask, decl_start).unwrap_or(source.len());
    let sig_end = text[decl_start..body_end].find('{').map(|i| decl_start + i).unwrap_or(body_end);
    let signature = collapse_whitespace(&text[decl_start..sig_end]);
    let parameters = parse_parameters(&signature);
    let modifiers = function_modifiers(&signature);
    let local_refs: Vec<String> = CALL_RE
        .captures_iter(&text[decl_start..body_end])
        .map(|c| c.get(1).unwrap().as_str().to_string())
        .filter(|n| !JS_KEYWORDS.contains(&n.as_str()))
        .collect();

    FunctionRecord {
        name: name.to_string(),
        qname,
        kind: if container.is_some() { SymbolKind::Method } else { SymbolKind::Function },
        range: line_range_for(source, decl_start, body_end),
        signature,
        parameters,
        doc: leading_doc_comment(text, decl_start),
        parent: container.map(str::to_string),
        local_refs,
        decorators: leading_decorators(text, decl_start),
        modifiers,
    }
}

/// `export`/`public` -> `Pub`, `static` -> `Static`, `async` -> `Async`,
/// a `const`-bound arrow function -> `Const`, read off the (already
/// whitespace-collapsed) declaration signature.
fn function_modifiers(signature: &str) -> HashSet<Modifier> {
    let mut mods = HashSet::new();
    for tok in signature.split_whitespace() {
        match tok {
            "export" | "public" => {
                mods.insert(Modifier::Pub);
            }
            "static" => {
                mods.insert(Modifier::Static);
            }
            "async" => {
                mods.insert(Modifier::Async);
            }
            "const" => {
                mods.insert(Modifier::Const);
            }
            _ => {}
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
            if raw.is_empty() {
                return None;
            }
            let name_part = raw.split(':').next().unwrap_or(raw).trim();
            let name = name_part
                .trim_start_matches("...")
                .split('=')
                .next()
                .unwrap_or(name_part)
                .trim()
                .to_string();
            let type_hint = raw.split_once(':').map(|(_, t)| t.split('=').next().unwrap_or(t).trim().to_string());
            let default = raw.split_once('=').map(|(_, d)| d.trim().to_string());
            Some(Parameter { name, type_hint, default })
        })
        .collect()
}

fn extract_imports(text: &str, source: &[u8]) -> Vec<ImportRecord> {
    let mut out = Vec::new();
    for m in IMPORT_FROM_RE.captures_iter(text) {
        let whole = m.get(0).unwrap();
        let module = m.get(5).unwrap().as_str().to_string();
        let is_wildcard = m.get(3).is_some();
        let mut imported = Vec::new();
        if let Some(default_name) = m.get(1) {
            imported.push((default_name.as_str().to_string(), None));
        }
        if let Some(named) = m.get(2) {
            for part in named.as_str().split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                if let Some((orig, alias)) = part.split_once(" as ") {
                    imported.push((orig.trim().to_string(), Some(alias.trim().to_string())));
                } else {
                    imported.push((part.to_string(), None));
                }
            }
        }
        if let Some(ns) = m.get(3) {
            imported.push((ns.as_str().to_string(), None));
        }
        if let Some(bare) = m.get(4) {
            imported.push((bare.as_str().to_string(), None));
        }
        out.push(ImportRecord {
            range: line_range_for(source, whole.start(), whole.end()),
            module,
            imported,
            is_wildcard,
        });
    }
    for m in IMPORT_BARE_RE.captures_iter(text) {
        let whole = m.get(0).unwrap();
        out.push(ImportRecord {
            range: line_range_for(source, whole.start(), whole.end()),
            module: m.get(1).unwrap().as_str().to_string(),
            imported: Vec::new(),
            is_wildcard: false,
        });
    }
    for m in REQUIRE_RE.captures_iter(text) {
        let whole = m.get(0).unwrap();
        out.push(ImportRecord {
            range: line_range_for(source, whole.start(), whole.end()),
            module: m.get(1).unwrap().as_str().to_string(),
            imported: Vec::new(),
            is_wildcard: false,
        });
    }
    out
}

fn depth_before(source: &[u8], mask: &[bool], pos: usize) -> i32 {
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

fn leading_doc_comment(text: &str, decl_start: usize) -> Option<String> {
    let before = &text[..decl_start];
    let trimmed_before = before.trim_end();
    if !trimmed_before.ends_with("*/") {
        return None;
    }
    let comment_start = trimmed_before.rfind("/**")?;
    let comment = &trimmed_before[comment_start + 3..trimmed_before.len() - 2];
    let cleaned: Vec<String> = comment
        .lines()
        .map(|l| l.trim().trim_start_matches('*').trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if cleaned.is_empty() { None } else { Some(cleaned.join("\n")) }
}

/// Scan upward from `decl_start` collecting contiguous `@decorator(...)`
/// lines (TS/JS decorator syntax), skipping blank lines.
fn leading_decorators(text: &str, decl_start: usize) -> Vec<String> {
    let before = &text[..decl_start];
    let mut decorators = Vec::new();
    for line in before.lines().rev() {
        let trimmed = line.trim();
        if trimmed.starts_with('@') {
            decorators.push(trimmed.to_string());
        } else if trimmed.is_empty() {
            continue;
        } else {
            break;
        }
    }
    decorators.reverse();
    decorators
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_function_declaration() {
        let record = extract("a.js", b"function add(a, b) {\n  return a + b;\n}\n", false);
        assert_eq!(record.functions.len(), 1);
        assert_eq!(record.functions[0].qname, "add");
        assert_eq!(record.functions[0].parameters.len(), 2);
    }

    #[test]
    fn extracts_arrow_function_assigned_to_const() {
        let record = extract("a.js", b"const add = (a, b) => {\n  return a + b;\n};\n", false);
        assert_eq!(record.functions.len(), 1);
        assert_eq!(record.functions[0].qname, "add");
    }

    #[test]
    fn extracts_class_with_methods() {
        let src = b"class Widget extends Base {\n  render() {\n    helper();\n  }\n}\n\nfunction helper() {}\n";
        let record = extract("a.js", src, false);
        assert_eq!(record.classes.len(), 1);
        assert_eq!(record.classes[0].qname, "Widget");
        assert_eq!(record.classes[0].bases, vec!["Base".to_string()]);
        let method = record.functions.iter().find(|f| f.qname == "Widget.render").unwrap();
        assert!(method.local_refs.contains(&"helper".to_string()));
    }

    #[test]
    fn extracts_named_imports() {
        let record = extract("a.ts", b"import { Foo, Bar as Baz } from './mod';\n", true);
        assert_eq!(record.imports.len(), 1);
        assert_eq!(record.imports[0].module, "./mod");
        assert_eq!(record.imports[0].imported.len(), 2);
        assert_eq!(record.imports[0].imported[1].1.as_deref(), Some("Baz"));
    }

    #[test]
    fn extracts_typescript_interface_and_type_alias() {
        let src = b"interface Point {\n  x: number;\n  y: number;\n}\n\ntype Id = string;\n";
        let record = extract("a.ts", src, true);
        assert!(record.classes.iter().any(|c| c.qname == "Point" && c.kind == SymbolKind::Interface));
        assert!(record.classes.iter().any(|c| c.qname == "Id" && c.kind == SymbolKind::TypeAlias));
    }
}
