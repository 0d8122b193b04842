//! Configuration: `PROJECT_ROOT` env var plus an optional `codenav.toml`
//! project file, per spec §6 ("Include/exclude patterns and the file-size
//! cap are configurable but have sensible defaults").

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Files larger than this are treated as unreadable (spec §4.A); default
/// matches the 512 KiB figure carried from the teacher's own "too large"
/// extractor-read-error threshold.
const DEFAULT_MAX_FILE_BYTES: u64 = 512 * 1024;

const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    ".venv",
    "target",
    "dist",
    "build",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub max_file_bytes: u64,
}

/// On-disk shape of `codenav.toml`. All fields optional; absent file or
/// absent fields fall back to `Config`'s defaults.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    exclude_dirs: Option<Vec<String>>,
    max_file_bytes: Option<u64>,
}

impl Config {
    /// Resolve the project root from `PROJECT_ROOT`, falling back to the
    /// current working directory, then overlay `<root>/codenav.toml` if
    /// present.
    pub fn from_env() -> Result<Self> {
        let root = match std::env::var("PROJECT_ROOT") {
            Ok(p) if !p.is_empty() => PathBuf::from(p),
            _ => std::env::current_dir().context("cannot resolve current directory")?,
        };
        Self::from_root(&root)
    }

    pub fn from_root(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("cannot resolve path: {}", root.display()))?;

        let mut config = Config {
            root: root.clone(),
            include: Vec::new(),
            exclude: Vec::new(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        };

        let manifest_path = root.join("codenav.toml");
        if let Ok(content) = fs::read_to_string(&manifest_path) {
            let file: ConfigFile = toml::from_str(&content)
                .with_context(|| format!("invalid {}", manifest_path.display()))?;
            if let Some(include) = file.include {
                config.include = include;
            }
            if let Some(exclude) = file.exclude {
                config.exclude = exclude;
            }
            if let Some(exclude_dirs) = file.exclude_dirs {
                config.exclude_dirs = exclude_dirs;
            }
            if let Some(max) = file.max_file_bytes {
                config.max_file_bytes = max;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_root(dir.path()).unwrap();
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert!(config.exclude_dirs.contains(&"node_modules".to_string()));
    }

    #[test]
    fn overlays_codenav_toml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("codenav.toml"),
            "max_file_bytes = 1024\nexclude = [\"*.snap\"]\n",
        )
        .unwrap();
        let config = Config::from_root(dir.path()).unwrap();
        assert_eq!(config.max_file_bytes, 1024);
        assert_eq!(config.exclude, vec!["*.snap".to_string()]);
    }
}
