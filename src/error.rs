//! Typed error taxonomy for the core library (spec §7). CLI and MCP
//! boundaries wrap these in `anyhow::Result`, following the teacher's
//! own split of typed errors at library seams and contextual `anyhow`
//! everywhere user-facing.

use thiserror::Error;

/// Errors an extractor can raise. Both variants are recoverable: the
/// builder logs a warning and installs a partial/generic `FileRecord`
/// rather than failing the whole build.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// Errors returned to callers of the query engine. Never panics across
/// this boundary; every variant carries enough detail for a human-readable
/// message at the CLI/MCP layer.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("symbol not found: {0}")]
    UnknownSymbol(String),
    #[error("file not found: {0}")]
    UnknownFile(String),
    #[error("path escapes project root: {0}")]
    PathOutsideProject(String),
    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),
    #[error("line range out of bounds: {start}..={end} (file has {total} lines)")]
    OutOfRange { start: u32, end: u32, total: u32 },
}

/// Top-level error type for operations that span discovery, extraction,
/// and index assembly.
#[derive(Debug, Error)]
pub enum CodenavError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Panics in debug builds (a bug should be loud during development);
/// degrades to a logged `CodenavError::Invariant` in release, per spec §7's
/// "internal invariant violation" handling.
#[macro_export]
macro_rules! invariant {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            if cfg!(debug_assertions) {
                panic!($($msg)*);
            } else {
                tracing::error!($($msg)*);
            }
        }
    };
}
