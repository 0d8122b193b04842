//! Component B: per-language extractors. Each extractor is a pure function
//! `(path, bytes) -> FileRecord` — independent, parallelizable, no shared
//! state — mirroring the contract the teacher's tree-sitter extractors
//! already follow.

pub mod generic;
pub mod lexical;
pub mod python;
pub mod text;

use tracing::warn;

use crate::discovery::Language;
use crate::model::FileRecord;

/// Run the appropriate extractor for `language` over `source`, producing a
/// `FileRecord`. Never fails: extractor parse errors degrade to a partial
/// record plus a warning (spec §7), matching the teacher's "always produce
/// something" posture throughout its parser modules.
pub fn extract_file(path: &str, language: Language, source: &[u8]) -> FileRecord {
    match language {
        Language::Python => python::extract(path, source).unwrap_or_else(|e| {
            warn!("python extractor failed for {path}: {e}");
            generic::extract_partial(path, "python", source)
        }),
        Language::Rust => lexical::rust_lang::extract(path, source),
        Language::JavaScript => lexical::js::extract(path, source, false),
        Language::TypeScript => lexical::js::extract(path, source, true),
        Language::Go => lexical::go::extract(path, source),
        Language::Text => text::extract(path, source),
        Language::Generic => generic::extract(path, source),
    }
}
