//! Fallback extractor: just line/char counts, no symbols. Grounded on the
//! teacher's default/no-op arms for languages without a dedicated parser.

use crate::model::FileRecord;

pub fn extract(path: &str, source: &[u8]) -> FileRecord {
    build(path, "generic", source, false)
}

/// Used when a dedicated extractor fails partway through: still a generic
/// record, but flagged `partial` so `get_project_summary` and friends can
/// distinguish "no symbols because there aren't any" from "no symbols
/// because parsing broke" (spec §7 recovery policy).
pub fn extract_partial(path: &str, language: &str, source: &[u8]) -> FileRecord {
    build(path, language, source, true)
}

fn build(path: &str, language: &str, source: &[u8], partial: bool) -> FileRecord {
    let text = String::from_utf8_lossy(source);
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();
    FileRecord {
        path: path.to_string(),
        language: language.to_string(),
        total_lines: lines.len() as u32,
        total_chars: text.chars().count() as u64,
        lines,
        functions: Vec::new(),
        classes: Vec::new(),
        imports: Vec::new(),
        sections: Vec::new(),
        partial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_lines_and_chars() {
        let record = extract("a.bin", b"one\ntwo\nthree");
        assert_eq!(record.total_lines, 3);
        assert_eq!(record.lines, vec!["one", "two", "three"]);
        assert!(!record.partial);
    }
}
