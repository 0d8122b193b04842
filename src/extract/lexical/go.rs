//! Lexical Go extractor. Go's declaration grammar is regular enough
//! (top-level `func`/`type`/`import` keywords, no nested function
//! declarations) that this is the simplest of the three lexical
//! extractors.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::extract::lexical::{GO_FLAVOR, collapse_whitespace, find_block_end, line_range_for, mask_non_code};
use crate::model::{
    ClassRecord, FileRecord, FunctionRecord, ImportRecord, Modifier, Parameter, SymbolKind,
};

static FUNC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^func\s*(?:\(\s*\w*\s+\*?([A-Za-z_]\w*)\s*\))?\s*([A-Za-z_]\w*)\s*(?:\[[^\]]*\])?\s*\(").unwrap()
});
static TYPE_STRUCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^type\s+([A-Za-z_]\w*)\s*(?:\[[^\]]*\])?\s*struct\s*\{").unwrap());
static TYPE_INTERFACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^type\s+([A-Za-z_]\w*)\s*(?:\[[^\]]*\])?\s*interface\s*\{").unwrap());
static TYPE_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^type\s+([A-Za-z_]\w*)\s*(?:\[[^\]]*\])?\s*=?\s*([A-Za-z_][\w.\[\]*]*)\s*$").unwrap());
static IMPORT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^import\s*\(\s*(.*?)\s*\)").unwrap());
static IMPORT_SINGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^import\s+(?:(\w+)\s+)?"([^"]+)""#).unwrap());
static IMPORT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*(?:(\w+|\.|_)\s+)?"([^"]+)""#).unwrap());
static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\s*\(").unwrap());

const GO_KEYWORDS: &[&str] = &[
    "if", "else", "for", "switch", "select", "case", "go", "defer", "return", "range", "func",
    "var", "const", "type", "package", "import", "struct", "interface", "map", "chan", "make",
    "new", "len", "cap", "append", "panic", "recover",
];

pub fn extract(path: &str, source: &[u8]) -> FileRecord {
    let text = String::from_utf8_lossy(source);
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
    let mask = mask_non_code(source, GO_FLAVOR);

    let imports = extract_imports(&text);

    let mut functions = Vec::new();
    let mut classes: Vec<ClassRecord> = Vec::new();
    let mut methods_by_type: std::collections::HashMap<String, Vec<String>> = std::collections::HashMap::new();

    for m in FUNC_RE.captures_iter(&text) {
        let whole = m.get(0).unwrap();
        if depth_before(source, &mask, whole.start()) != 0 {
            continue;
        }
        let receiver = m.get(1).map(|g| g.as_str().to_string());
        let name = m.get(2).unwrap().as_str().to_string();
        let body_end = find_block_end(source, &mask, whole.end()).unwrap_or(whole.end());
        let sig_end = text[whole.start()..body_end].find('{').map(|i| whole.start() + i).unwrap_or(body_end);
        let signature = collapse_whitespace(&text[whole.start()..sig_end]);
        let parameters = parse_parameters(&signature);
        let local_refs: Vec<String> = CALL_RE
            .captures_iter(&text[whole.start()..body_end])
            .map(|c| c.get(1).unwrap().as_str().to_string())
            .filter(|n| !GO_KEYWORDS.contains(&n.as_str()))
            .collect();

        let qname = match &receiver {
            Some(r) => format!("{r}.{name}"),
            None => name.clone(),
        };
        if let Some(r) = &receiver {
            methods_by_type.entry(r.clone()).or_default().push(qname.clone());
        }

        let mut modifiers = HashSet::new();
        if name.starts_with(|c: char| c.is_uppercase()) {
            modifiers.insert(Modifier::Pub);
        }

        functions.push(FunctionRecord {
            name: name.clone(),
            qname,
            kind: if receiver.is_some() { SymbolKind::Method } else { SymbolKind::Function },
            range: line_range_for(source, whole.start(), body_end),
            signature,
            parameters,
            doc: leading_doc_comment(&text, whole.start()),
            parent: receiver,
            local_refs,
            // Go has no decorator/annotation syntax.
            decorators: Vec::new(),
            modifiers,
        });
    }

    for m in TYPE_STRUCT_RE.captures_iter(&text) {
        push_type(&mut classes, &methods_by_type, source, &mask, &text, &m, SymbolKind::Struct);
    }
    for m in TYPE_INTERFACE_RE.captures_iter(&text) {
        push_type(&mut classes, &methods_by_type, source, &mask, &text, &m, SymbolKind::Interface);
    }
    for m in TYPE_ALIAS_RE.captures_iter(&text) {
        let whole = m.get(0).unwrap();
        if depth_before(source, &mask, whole.start()) != 0 {
            continue;
        }
        let name = m.get(1).unwrap().as_str().to_string();
        if classes.iter().any(|c| c.qname == name) {
            continue; // already captured as struct/interface
        }
        classes.push(ClassRecord {
            name: name.clone(),
            qname: name,
            kind: SymbolKind::TypeAlias,
            range: line_range_for(source, whole.start(), whole.end()),
            signature: collapse_whitespace(whole.as_str()),
            doc: leading_doc_comment(&text, whole.start()),
            methods: Vec::new(),
            bases: Vec::new(),
            decorators: Vec::new(),
        });
    }

    FileRecord {
        path: path.to_string(),
        language: "go".to_string(),
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

fn push_type(
    classes: &mut Vec<ClassRecord>,
    methods_by_type: &std::collections::HashMap<String, Vec<String>>,
    source: &[u8],
    mask: &[bool],
    text: &str,
    m: &regex::Captures,
    kind: SymbolKind,
) {
    let whole = m.get(0).unwrap();
    if depth_before(source, mask, whole.start()) != 0 {
        return;
    }
    let name = m.get(1).unwrap().as_str().to_string();
    let body_end = find_block_end(source, mask, whole.end()).unwrap_or(whole.end());
    classes.push(ClassRecord {
        name: name.clone(),
        qname: name.clone(),
        kind,
        range: line_range_for(source, whole.start(), body_end),
        signature: collapse_whitespace(&text[whole.start()..whole.end()]),
        doc: leading_doc_comment(text, whole.start()),
        methods: methods_by_type.get(&name).cloned().unwrap_or_default(),
        bases: Vec::new(),
        decorators: Vec::new(),
    });
}

fn parse_parameters(signature: &str) -> Vec<Parameter> {
    let Some(open) = signature.find('(') else {
        return Vec::new();
    };
    let Some(close) = find_matching_paren(signature, open) else {
        return Vec::new();
    };
    signature[open + 1..close]
        .split(',')
        .filter_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            let mut parts = raw.splitn(2, char::is_whitespace);
            let name = parts.next()?.to_string();
            let type_hint = parts.next().map(|t| t.trim().to_string());
            // Go has no default parameter values.
            Some(Parameter { name, type_hint, default: None })
        })
        .collect()
}

fn find_matching_paren(s: &str, open: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn extract_imports(text: &str) -> Vec<ImportRecord> {
    let mut out = Vec::new();
    for m in IMPORT_BLOCK_RE.captures_iter(text) {
        let block = m.get(1).unwrap();
        for line_m in IMPORT_LINE_RE.captures_iter(block.as_str()) {
            let alias = line_m.get(1).map(|g| g.as_str().to_string());
            let path = line_m.get(2).unwrap().as_str().to_string();
            out.push(ImportRecord {
                range: line_range_for_text(text, block.start() + line_m.get(0).unwrap().start()),
                module: path,
                imported: alias.into_iter().map(|a| (a, None)).collect(),
                is_wildcard: false,
            });
        }
    }
    for m in IMPORT_SINGLE_RE.captures_iter(text) {
        let whole = m.get(0).unwrap();
        let alias = m.get(1).map(|g| g.as_str().to_string());
        let path = m.get(2).unwrap().as_str().to_string();
        out.push(ImportRecord {
            range: line_range_for_text(text, whole.start()),
            module: path,
            imported: alias.into_iter().map(|a| (a, None)).collect(),
            is_wildcard: false,
        });
    }
    out
}

fn line_range_for_text(text: &str, offset: usize) -> crate::model::LineRange {
    let line = text[..offset].matches('\n').count() as u32 + 1;
    crate::model::LineRange::new(line, line)
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
    let mut doc_lines = Vec::new();
    for line in before.lines().rev() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("//") {
            doc_lines.push(rest.trim_start().to_string());
        } else if trimmed.is_empty() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_free_function() {
        let src = b"package main\n\nfunc Add(a int, b int) int {\n\treturn a + b\n}\n";
        let record = extract("a.go", src);
        assert_eq!(record.functions.len(), 1);
        assert_eq!(record.functions[0].qname, "Add");
        assert_eq!(record.functions[0].parameters.len(), 2);
    }

    #[test]
    fn extracts_method_with_receiver() {
        let src = b"package main\n\ntype Counter struct {\n\tn int\n}\n\nfunc (c *Counter) Incr() {\n\tc.n++\n}\n";
        let record = extract("a.go", src);
        let method = record.functions.iter().find(|f| f.qname == "Counter.Incr").unwrap();
        assert_eq!(method.parent.as_deref(), Some("Counter"));
        assert!(record.classes.iter().any(|c| c.qname == "Counter" && c.methods.contains(&"Counter.Incr".to_string())));
    }

    #[test]
    fn extracts_grouped_imports() {
        let src = b"package main\n\nimport (\n\t\"fmt\"\n\talias \"some/pkg\"\n)\n\nfunc main() {}\n";
        let record = extract("a.go", src);
        assert_eq!(record.imports.len(), 2);
        assert!(record.imports.iter().any(|i| i.module == "fmt"));
        assert!(record.imports.iter().any(|i| i.module == "some/pkg" && i.imported[0].0 == "alias"));
    }
}
