//! Component A: gitignore-aware file discovery (spec §4.A).
//!
//! Grounded on `scanner::walker::walk_directory` in the teacher, extended
//! with an explicit exclude-dir table (so a repo with no `.gitignore` entry
//! for `target/` still doesn't get walked) and a language classification
//! table trimmed to the six extraction surfaces this crate supports.

use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::WalkBuilder;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Absolute path on disk.
    pub abs_path: PathBuf,
    /// Project-relative, forward-slash-normalized path.
    pub rel_path: String,
    pub language: Language,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Go,
    Text,
    Generic,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Text => "text",
            Language::Generic => "generic",
        }
    }
}

/// Map a file extension to one of this crate's extraction languages.
/// Extensions the teacher recognized but this crate has no dedicated
/// extractor for (java, c, cpp, ruby, csharp, html, vue, svelte, astro)
/// fall into `Language::Generic`.
pub fn detect_language(extension: &str) -> Language {
    match extension {
        "py" | "pyi" | "pyw" => Language::Python,
        "rs" => Language::Rust,
        "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
        "ts" | "mts" | "cts" | "tsx" => Language::TypeScript,
        "go" => Language::Go,
        "md" | "markdown" | "txt" | "rst" => Language::Text,
        _ => Language::Generic,
    }
}

/// Walk `config.root`, respecting `.gitignore`/global/exclude rules, plus
/// the configured exclude-dir table, and return every discovered file in
/// sorted path order (matching the builder's determinism requirement).
pub fn discover_files(config: &Config) -> Result<Vec<DiscoveredFile>> {
    let exclude_dirs = config.exclude_dirs.clone();
    let mut builder = WalkBuilder::new(&config.root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                let name = entry.file_name().to_string_lossy();
                return !exclude_dirs.iter().any(|d| d == name.as_ref());
            }
            true
        });

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let abs_path = entry.into_path();
        let rel_path = abs_path
            .strip_prefix(&config.root)
            .unwrap_or(&abs_path)
            .to_string_lossy()
            .replace('\\', "/");

        if matches_any(&rel_path, &config.exclude) {
            continue;
        }
        if !config.include.is_empty() && !matches_any(&rel_path, &config.include) {
            continue;
        }

        let language = extension_of(&abs_path)
            .map(detect_language)
            .unwrap_or(Language::Generic);

        files.push(DiscoveredFile {
            abs_path,
            rel_path,
            language,
        });
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Minimal glob match: supports a single trailing or leading `*`, which
/// covers the `include`/`exclude` patterns spec §4.A and §6 describe
/// ("sensible defaults", not a full glob language).
fn matches_any(rel_path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| glob_match(p, rel_path))
}

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
    use std::fs;

    #[test]
    fn discovers_files_sorted_and_skips_excluded_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::write(dir.path().join("src/b.py"), "pass\n").unwrap();
        fs::write(dir.path().join("src/a.rs"), "fn main() {}\n").unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "1\n").unwrap();

        let config = Config::from_root(dir.path()).unwrap();
        let files = discover_files(&config).unwrap();

        let rels: Vec<_> = files.iter().map(|f| f.rel_path.clone()).collect();
        assert_eq!(rels, vec!["src/a.rs".to_string(), "src/b.py".to_string()]);
        assert_eq!(files[0].language, Language::Rust);
        assert_eq!(files[1].language, Language::Python);
    }

    #[test]
    fn honors_include_and_exclude_patterns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.py"), "pass\n").unwrap();
        fs::write(dir.path().join("skip.py"), "pass\n").unwrap();

        let mut config = Config::from_root(dir.path()).unwrap();
        config.exclude = vec!["skip.py".to_string()];

        let files = discover_files(&config).unwrap();
        let rels: Vec<_> = files.iter().map(|f| f.rel_path.clone()).collect();
        assert_eq!(rels, vec!["keep.py".to_string()]);
    }
}
