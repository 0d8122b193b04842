//! Python extractor: the one extractor kept on tree-sitter, since spec §4.B
//! draws an explicit line between "full-AST (Python)" and "lexical/regex
//! (TS/JS, Go, Rust)". Grounded on `parser::python` and `parser::helpers`
//! in the teacher, generalized from their FTS-oriented `SymbolEntry` output
//! to this crate's `FunctionRecord`/`ClassRecord`/`ImportRecord` shape.

use std::collections::HashSet;

use anyhow::{Result, anyhow};
use tree_sitter::{Node, Parser, Tree};

use crate::model::{
    ClassRecord, FileRecord, FunctionRecord, ImportRecord, LineRange, Modifier, Parameter,
    SymbolKind,
};

const MAX_DEPTH: usize = 200;

pub fn extract(path: &str, source: &[u8]) -> Result<FileRecord> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| anyhow!("failed to load python grammar: {e}"))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("tree-sitter returned no tree for {path}"))?;

    let text = String::from_utf8_lossy(source);
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();

    let mut functions = Vec::new();
    let mut classes = Vec::new();
    let mut imports = Vec::new();

    walk_module(
        &tree,
        source,
        None,
        &mut functions,
        &mut classes,
        &mut imports,
    );

    Ok(FileRecord {
        path: path.to_string(),
        language: "python".to_string(),
        total_lines: lines.len() as u32,
        total_chars: text.chars().count() as u64,
        lines,
        functions,
        classes,
        imports,
        sections: Vec::new(),
        partial: false,
    })
}

fn walk_module(
    tree: &Tree,
    source: &[u8],
    parent: Option<&str>,
    functions: &mut Vec<FunctionRecord>,
    classes: &mut Vec<ClassRecord>,
    imports: &mut Vec<ImportRecord>,
) {
    walk_node(tree.root_node(), source, parent, functions, classes, imports, 0);
}

fn walk_node(
    node: Node,
    source: &[u8],
    parent_ctx: Option<&str>,
    functions: &mut Vec<FunctionRecord>,
    classes: &mut Vec<ClassRecord>,
    imports: &mut Vec<ImportRecord>,
    depth: usize,
) {
    if depth > MAX_DEPTH {
        return;
    }

    match node.kind() {
        "function_definition" => {
            extract_function(
                node, source, parent_ctx, functions, classes, imports, depth, Vec::new(),
            );
            return;
        }
        "class_definition" => {
            extract_class(
                node, source, parent_ctx, functions, classes, imports, depth, Vec::new(),
            );
            return;
        }
        "import_statement" => {
            extract_import(node, source, imports);
        }
        "import_from_statement" => {
            extract_import_from(node, source, imports);
        }
        "decorated_definition" => {
            let mut decorators = Vec::new();
            let mut inner = None;
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "decorator" => decorators.push(node_text(child, source)),
                    "function_definition" | "class_definition" => inner = Some(child),
                    _ => {}
                }
            }
            match inner {
                Some(n) if n.kind() == "function_definition" => {
                    extract_function(
                        n, source, parent_ctx, functions, classes, imports, depth, decorators,
                    );
                }
                Some(n) => {
                    extract_class(
                        n, source, parent_ctx, functions, classes, imports, depth, decorators,
                    );
                }
                None => {}
            }
            return;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_node(child, source, parent_ctx, functions, classes, imports, depth + 1);
    }
}

#[allow(clippy::too_many_arguments)]
fn extract_function(
    node: Node,
    source: &[u8],
    parent_ctx: Option<&str>,
    functions: &mut Vec<FunctionRecord>,
    classes: &mut Vec<ClassRecord>,
    imports: &mut Vec<ImportRecord>,
    depth: usize,
    decorators: Vec<String>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    let qname = qualify(parent_ctx, &name);
    let kind = if parent_ctx.is_some() {
        SymbolKind::Method
    } else {
        SymbolKind::Function
    };

    let parameters = node
        .child_by_field_name("parameters")
        .map(|p| extract_parameters(p, source))
        .unwrap_or_default();

    let signature = signature_to_colon(node, source);
    let mut doc = None;
    let mut local_refs = Vec::new();

    let mut modifiers = HashSet::new();
    if node_text(node, source).trim_start().starts_with("async") {
        modifiers.insert(Modifier::Async);
    }

    if let Some(body) = node.child_by_field_name("body") {
        doc = leading_docstring(body, source);
        collect_refs(body, source, &mut local_refs, 0);

        // recurse for nested definitions, which are qualified under this function
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            walk_node(child, source, Some(&qname), functions, classes, imports, depth + 1);
        }
    }

    functions.push(FunctionRecord {
        name,
        qname: qname.clone(),
        kind,
        range: node_line_range(node),
        signature,
        parameters,
        doc,
        parent: parent_ctx.map(str::to_string),
        local_refs,
        decorators,
        modifiers,
    });
}

#[allow(clippy::too_many_arguments)]
fn extract_class(
    node: Node,
    source: &[u8],
    parent_ctx: Option<&str>,
    functions: &mut Vec<FunctionRecord>,
    classes: &mut Vec<ClassRecord>,
    imports: &mut Vec<ImportRecord>,
    depth: usize,
    decorators: Vec<String>,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(name_node, source);
    let qname = qualify(parent_ctx, &name);

    let bases = node
        .child_by_field_name("superclasses")
        .map(|n| {
            let mut cursor = n.walk();
            n.children(&mut cursor)
                .filter(|c| c.kind() == "identifier" || c.kind() == "attribute")
                .map(|c| node_text(c, source))
                .collect()
        })
        .unwrap_or_default();

    let signature = signature_to_colon(node, source);
    let mut doc = None;
    let mut methods = Vec::new();

    let functions_before = functions.len();

    if let Some(body) = node.child_by_field_name("body") {
        doc = leading_docstring(body, source);
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            walk_node(child, source, Some(&qname), functions, classes, imports, depth + 1);
        }
    }

    for f in &functions[functions_before..] {
        if f.parent.as_deref() == Some(qname.as_str()) {
            methods.push(f.qname.clone());
        }
    }

    classes.push(ClassRecord {
        name,
        qname,
        kind: SymbolKind::Class,
        range: node_line_range(node),
        signature,
        doc,
        methods,
        bases,
        decorators,
    });
}

fn extract_parameters(node: Node, source: &[u8]) -> Vec<Parameter> {
    let mut params = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => params.push(Parameter {
                name: node_text(child, source),
                type_hint: None,
                default: None,
            }),
            "typed_parameter" => {
                let name = child
                    .child(0)
                    .map(|n| node_text(n, source))
                    .unwrap_or_default();
                let type_hint = child
                    .child_by_field_name("type")
                    .map(|n| node_text(n, source));
                params.push(Parameter { name, type_hint, default: None });
            }
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let type_hint = child
                        .child_by_field_name("type")
                        .map(|n| node_text(n, source));
                    let default = child
                        .child_by_field_name("value")
                        .map(|n| node_text(n, source));
                    params.push(Parameter {
                        name: node_text(name_node, source),
                        type_hint,
                        default,
                    });
                }
            }
            _ => {}
        }
    }
    params
}

fn extract_import(node: Node, source: &[u8], imports: &mut Vec<ImportRecord>) {
    let line = node_line_range(node);
    let mut imported = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => imported.push((node_text(child, source), None)),
            "aliased_import" => {
                if let Some(n) = child.child_by_field_name("name") {
                    let alias = child.child_by_field_name("alias").map(|a| node_text(a, source));
                    imported.push((node_text(n, source), alias));
                }
            }
            _ => {}
        }
    }
    for (name, alias) in imported {
        imports.push(ImportRecord {
            range: line,
            module: name.clone(),
            imported: vec![(name, alias)],
            is_wildcard: false,
        });
    }
}

fn extract_import_from(node: Node, source: &[u8], imports: &mut Vec<ImportRecord>) {
    let line = node_line_range(node);
    let module = node
        .child_by_field_name("module_name")
        .map(|n| node_text(n, source))
        .unwrap_or_default();

    let mut imported = Vec::new();
    let mut is_wildcard = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" | "identifier" => {
                if node
                    .child_by_field_name("module_name")
                    .is_some_and(|m| m.id() == child.id())
                {
                    continue;
                }
                imported.push((node_text(child, source), None));
            }
            "aliased_import" => {
                if let Some(n) = child.child_by_field_name("name") {
                    let alias = child.child_by_field_name("alias").map(|a| node_text(a, source));
                    imported.push((node_text(n, source), alias));
                }
            }
            "wildcard_import" => {
                is_wildcard = true;
            }
            _ => {}
        }
    }

    imports.push(ImportRecord {
        range: line,
        module,
        imported,
        is_wildcard,
    });
}

/// Collect the textual names of called functions inside `node`'s subtree,
/// as written in source (unresolved). Pass 4 of the builder reconciles
/// these against imports/locals/globals.
fn collect_refs(node: Node, source: &[u8], refs: &mut Vec<String>, depth: usize) {
    if depth > MAX_DEPTH {
        return;
    }
    if node.kind() == "call"
        && let Some(func) = node.child_by_field_name("function")
        && matches!(func.kind(), "identifier" | "attribute")
    {
        refs.push(node_text(func, source));
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_refs(child, source, refs, depth + 1);
    }
}

fn leading_docstring(body: Node, source: &[u8]) -> Option<String> {
    let first = body.child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let str_node = first.child(0)?;
    if !matches!(str_node.kind(), "string" | "concatenated_string") {
        return None;
    }
    let raw = node_text(str_node, source);
    Some(strip_string_quotes(&raw).trim().to_string())
}

fn qualify(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(p) => format!("{p}.{name}"),
        None => name.to_string(),
    }
}

fn signature_to_colon(node: Node, source: &[u8]) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    let text = String::from_utf8_lossy(&source[start..end]);
    let sig = match text.find(':') {
        Some(idx) => &text[..idx],
        None => &text,
    };
    collapse_whitespace(sig.trim())
}

fn node_text(node: Node, source: &[u8]) -> String {
    String::from_utf8_lossy(&source[node.start_byte()..node.end_byte()]).to_string()
}

/// 1-based [start, end] line range; tree-sitter rows are 0-based.
fn node_line_range(node: Node) -> LineRange {
    let start = node.start_position().row as u32 + 1;
    let end_pos = node.end_position();
    let end = if end_pos.column == 0 && end_pos.row > node.start_position().row {
        end_pos.row as u32
    } else {
        end_pos.row as u32 + 1
    };
    LineRange::new(start, end)
}

fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_ws = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !prev_ws {
                result.push(' ');
            }
            prev_ws = true;
        } else {
            result.push(c);
            prev_ws = false;
        }
    }
    result
}

fn strip_string_quotes(raw: &str) -> String {
    if raw.starts_with("\"\"\"") && raw.ends_with("\"\"\"") && raw.len() >= 6 {
        return raw[3..raw.len() - 3].to_string();
    }
    if raw.starts_with("'''") && raw.ends_with("'''") && raw.len() >= 6 {
        return raw[3..raw.len() - 3].to_string();
    }
    if raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2 {
        return raw[1..raw.len() - 1].to_string();
    }
    if raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2 {
        return raw[1..raw.len() - 1].to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_functions_and_calls() {
        let source = b"def helper():\n    pass\n\ndef run():\n    helper()\n    obj.method()\n";
        let record = extract("a.py", source).unwrap();
        assert_eq!(record.functions.len(), 2);
        let run = record.functions.iter().find(|f| f.qname == "run").unwrap();
        assert!(run.local_refs.contains(&"helper".to_string()));
        assert!(run.local_refs.contains(&"obj.method".to_string()));
    }

    #[test]
    fn extracts_classes_and_methods() {
        let source = b"class Greeter:\n    \"\"\"Says hello.\"\"\"\n    def greet(self):\n        pass\n";
        let record = extract("a.py", source).unwrap();
        assert_eq!(record.classes.len(), 1);
        let class = &record.classes[0];
        assert_eq!(class.qname, "Greeter");
        assert_eq!(class.doc.as_deref(), Some("Says hello."));
        assert_eq!(class.methods, vec!["Greeter.greet".to_string()]);
        assert_eq!(record.functions[0].parent.as_deref(), Some("Greeter"));
    }

    #[test]
    fn extracts_imports() {
        let source = b"import os\nfrom pathlib import Path as P\n";
        let record = extract("a.py", source).unwrap();
        assert_eq!(record.imports.len(), 2);
        assert_eq!(record.imports[0].module, "os");
        assert_eq!(record.imports[1].module, "pathlib");
        assert_eq!(
            record.imports[1].imported,
            vec![("Path".to_string(), Some("P".to_string()))]
        );
    }

    #[test]
    fn captures_decorators_and_default_parameters() {
        let source =
            b"class Widget:\n    @staticmethod\n    @cached\n    def build(name, count=1):\n        pass\n";
        let record = extract("a.py", source).unwrap();
        let build = record.functions.iter().find(|f| f.qname == "Widget.build").unwrap();
        assert_eq!(build.decorators, vec!["@staticmethod".to_string(), "@cached".to_string()]);
        let count_param = build.parameters.iter().find(|p| p.name == "count").unwrap();
        assert_eq!(count_param.default.as_deref(), Some("1"));
        let name_param = build.parameters.iter().find(|p| p.name == "name").unwrap();
        assert_eq!(name_param.default, None);
    }

    #[test]
    fn async_def_sets_async_modifier() {
        let source = b"async def fetch():\n    pass\n";
        let record = extract("a.py", source).unwrap();
        assert!(record.functions[0].modifiers.contains(&Modifier::Async));
    }
}
