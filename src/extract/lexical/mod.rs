//! Shared lexical-scanning helpers for the regex/brace-matching extractors
//! (TS/JS, Go, Rust) spec §4.B calls for, as opposed to the full-AST Python
//! extractor. Grounded in *style* on `parser::helpers` in the teacher
//! (string/comment stripping, identifier filtering) but reimplemented over
//! raw byte spans instead of tree-sitter `Node`s, since no grammar is used
//! here.

pub mod go;
pub mod js;
pub mod rust_lang;

use crate::model::LineRange;

/// Which comment/string conventions a language uses, so `mask_non_code`
/// can skip them uniformly.
#[derive(Debug, Clone, Copy)]
pub struct LexFlavor {
    pub line_comment: &'static str,
    pub block_comment: Option<(&'static str, &'static str)>,
    pub double_quote_strings: bool,
    pub single_quote_strings: bool,
    /// Backtick-delimited strings (JS/TS template literals, Go raw strings).
    pub backtick_strings: bool,
    /// Rust raw strings: `r"..."`, `r#"..."#`, ...
    pub rust_raw_strings: bool,
}

pub const RUST_FLAVOR: LexFlavor = LexFlavor {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    double_quote_strings: true,
    single_quote_strings: true,
    backtick_strings: false,
    rust_raw_strings: true,
};

pub const JS_FLAVOR: LexFlavor = LexFlavor {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    double_quote_strings: true,
    single_quote_strings: true,
    backtick_strings: true,
    rust_raw_strings: false,
};

pub const GO_FLAVOR: LexFlavor = LexFlavor {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    double_quote_strings: true,
    single_quote_strings: true,
    backtick_strings: true,
    rust_raw_strings: false,
};

/// Per-byte mask: `true` where the byte is real code, `false` where it's
/// inside a string, char literal, or comment. Brace-counting and
/// identifier scanning both consult this to avoid being fooled by a `{`
/// inside a string literal.
pub fn mask_non_code(src: &[u8], flavor: LexFlavor) -> Vec<bool> {
    let mut mask = vec![true; src.len()];
    let mut i = 0;
    while i < src.len() {
        if src[i..].starts_with(flavor.line_comment.as_bytes()) {
            let start = i;
            while i < src.len() && src[i] != b'\n' {
                i += 1;
            }
            for b in &mut mask[start..i] {
                *b = false;
            }
            continue;
        }
        if let Some((open, close)) = flavor.block_comment
            && src[i..].starts_with(open.as_bytes())
        {
            let start = i;
            i += open.len();
            while i < src.len() && !src[i..].starts_with(close.as_bytes()) {
                i += 1;
            }
            i = (i + close.len()).min(src.len());
            for b in &mut mask[start..i] {
                *b = false;
            }
            continue;
        }
        if flavor.rust_raw_strings && (src[i..].starts_with(b"r\"") || src[i..].starts_with(b"r#"))
        {
            let start = i;
            let mut j = i + 1;
            let mut hashes = 0;
            while j < src.len() && src[j] == b'#' {
                hashes += 1;
                j += 1;
            }
            if j < src.len() && src[j] == b'"' {
                j += 1;
                let closer: Vec<u8> = std::iter::once(b'"')
                    .chain(std::iter::repeat(b'#').take(hashes))
                    .collect();
                while j < src.len() && !src[j..].starts_with(&closer[..]) {
                    j += 1;
                }
                j = (j + closer.len()).min(src.len());
                for b in &mut mask[start..j] {
                    *b = false;
                }
                i = j;
                continue;
            }
        }
        if flavor.double_quote_strings && src[i] == b'"' {
            let start = i;
            i += 1;
            while i < src.len() && src[i] != b'"' {
                if src[i] == b'\\' && i + 1 < src.len() {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(src.len());
            for b in &mut mask[start..i] {
                *b = false;
            }
            continue;
        }
        if flavor.single_quote_strings && src[i] == b'\'' {
            let start = i;
            i += 1;
            while i < src.len() && src[i] != b'\'' {
                if src[i] == b'\\' && i + 1 < src.len() {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(src.len());
            for b in &mut mask[start..i] {
                *b = false;
            }
            continue;
        }
        if flavor.backtick_strings && src[i] == b'`' {
            let start = i;
            i += 1;
            while i < src.len() && src[i] != b'`' {
                if src[i] == b'\\' && i + 1 < src.len() {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(src.len());
            for b in &mut mask[start..i] {
                *b = false;
            }
            continue;
        }
        i += 1;
    }
    mask
}

/// Find the `{` that opens the block starting at or after `from`, then its
/// matching `}`, skipping masked (string/comment) bytes. Returns the byte
/// offset just past the closing brace.
pub fn find_block_end(src: &[u8], mask: &[bool], from: usize) -> Option<usize> {
    let mut i = from;
    while i < src.len() && !(mask[i] && src[i] == b'{') {
        i += 1;
    }
    if i >= src.len() {
        return None;
    }
    let mut depth = 0i32;
    while i < src.len() {
        if mask[i] {
            match src[i] {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Convert a byte offset to a 1-based line number.
pub fn line_of(src: &[u8], offset: usize) -> u32 {
    src[..offset.min(src.len())].iter().filter(|&&b| b == b'\n').count() as u32 + 1
}

pub fn line_range_for(src: &[u8], start: usize, end: usize) -> LineRange {
    LineRange::new(line_of(src, start), line_of(src, end.saturating_sub(1).max(start)))
}

/// Collect identifier-shaped tokens from unmasked (real code) bytes only.
pub fn collect_code_identifiers(src: &[u8], mask: &[bool], range: std::ops::Range<usize>) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = range.start;
    while i < range.end.min(src.len()) {
        if mask[i] && (src[i].is_ascii_alphabetic() || src[i] == b'_') {
            let start = i;
            while i < range.end.min(src.len())
                && mask[i]
                && (src[i].is_ascii_alphanumeric() || src[i] == b'_')
            {
                i += 1;
            }
            out.push(String::from_utf8_lossy(&src[start..i]).to_string());
        } else {
            i += 1;
        }
    }
    out
}

pub fn collapse_whitespace(s: &str) -> String {
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
    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_strings_and_comments() {
        let src = br#"fn f() { let s = "{ not a brace }"; // { ignored too
        }"#;
        let mask = mask_non_code(src, RUST_FLAVOR);
        let open = src.iter().position(|&b| b == b'{').unwrap();
        let end = find_block_end(src, &mask, open).unwrap();
        assert_eq!(end, src.len());
    }
}
