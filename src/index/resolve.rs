//! Per-language import resolution (spec §4.C pass 3). No teacher module
//! builds a cross-file import graph, so this is new engineering grounded
//! only in the teacher's general style (plain functions over owned
//! strings, no DI ceremony) rather than a specific file.

use std::collections::HashSet;
use std::path::Path;

use crate::discovery::Language;
use crate::model::ImportRecord;

/// Try to resolve `import`, written in `source_path`, to a project-relative
/// path present in `known_files`. Returns `None` for external/unresolvable
/// imports (never an error — spec §7 "resolution miss").
pub fn resolve_import(
    source_path: &str,
    import: &ImportRecord,
    language: Language,
    known_files: &HashSet<String>,
) -> Option<String> {
    match language {
        Language::Python => resolve_python(&import.module, known_files),
        Language::JavaScript | Language::TypeScript => {
            resolve_js(source_path, &import.module, known_files)
        }
        Language::Go => resolve_go(&import.module, known_files),
        Language::Rust => resolve_rust(source_path, &import.module, known_files),
        Language::Text | Language::Generic => None,
    }
}

const PY_ROOTS: &[&str] = &["", "src/", "lib/"];

fn resolve_python(module: &str, known_files: &HashSet<String>) -> Option<String> {
    let module = module.trim_start_matches('.');
    if module.is_empty() {
        return None;
    }
    let as_path = module.replace('.', "/");
    for root in PY_ROOTS {
        let direct = format!("{root}{as_path}.py");
        if known_files.contains(&direct) {
            return Some(direct);
        }
        let package = format!("{root}{as_path}/__init__.py");
        if known_files.contains(&package) {
            return Some(package);
        }
    }
    None
}

const JS_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", "/index.ts", "/index.tsx", "/index.js", "/index.jsx",
];

fn resolve_js(source_path: &str, module: &str, known_files: &HashSet<String>) -> Option<String> {
    let base = if module.starts_with('.') {
        let dir = Path::new(source_path).parent().unwrap_or_else(|| Path::new(""));
        normalize(&dir.join(module).to_string_lossy())
    } else if let Some(rest) = module.strip_prefix("@/") {
        format!("src/{rest}")
    } else {
        return None; // bare package specifier: external, not resolved
    };

    if known_files.contains(&base) {
        return Some(base);
    }
    for ext in JS_EXTENSIONS {
        let candidate = format!("{base}{ext}");
        if known_files.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn resolve_go(module: &str, known_files: &HashSet<String>) -> Option<String> {
    let candidates: Vec<&String> = known_files
        .iter()
        .filter(|p| p.ends_with(".go") && p.starts_with(&format!("{module}/")))
        .collect();
    candidates.into_iter().min().cloned()
}

fn resolve_rust(source_path: &str, module: &str, known_files: &HashSet<String>) -> Option<String> {
    let segments: Vec<&str> = module.split("::").collect();
    let Some((head, rest)) = segments.split_first() else {
        return None;
    };

    let src_dir = Path::new(source_path).parent().unwrap_or_else(|| Path::new(""));
    let base_dir = match *head {
        "crate" => Path::new("src").to_path_buf(),
        "self" => src_dir.to_path_buf(),
        "super" => src_dir.parent().unwrap_or_else(|| Path::new("")).to_path_buf(),
        _ => return None, // external crate
    };

    if rest.is_empty() {
        return None;
    }
    let tail = rest.join("/");
    let direct = normalize(&base_dir.join(format!("{tail}.rs")).to_string_lossy());
    if known_files.contains(&direct) {
        return Some(direct);
    }
    let as_mod = normalize(&base_dir.join(tail).join("mod.rs").to_string_lossy());
    if known_files.contains(&as_mod) {
        return Some(as_mod);
    }
    None
}

fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => continue,
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineRange;

    fn import(module: &str) -> ImportRecord {
        ImportRecord {
            range: LineRange::new(1, 1),
            module: module.to_string(),
            imported: Vec::new(),
            is_wildcard: false,
        }
    }

    #[test]
    fn resolves_python_module_to_package() {
        let mut known = HashSet::new();
        known.insert("a/b/c/__init__.py".to_string());
        let resolved = resolve_import("x.py", &import("a.b.c"), Language::Python, &known);
        assert_eq!(resolved.as_deref(), Some("a/b/c/__init__.py"));
    }

    #[test]
    fn resolves_relative_js_import_with_extension_trial() {
        let mut known = HashSet::new();
        known.insert("src/utils.ts".to_string());
        let resolved = resolve_import("src/main.ts", &import("./utils"), Language::TypeScript, &known);
        assert_eq!(resolved.as_deref(), Some("src/utils.ts"));
    }

    #[test]
    fn drops_external_rust_crate() {
        let known = HashSet::new();
        let resolved = resolve_import("src/lib.rs", &import("serde::Deserialize"), Language::Rust, &known);
        assert_eq!(resolved, None);
    }

    #[test]
    fn resolves_rust_crate_path() {
        let mut known = HashSet::new();
        known.insert("src/model.rs".to_string());
        let resolved = resolve_import("src/lib.rs", &import("crate::model"), Language::Rust, &known);
        assert_eq!(resolved.as_deref(), Some("src/model.rs"));
    }
}
