//! Text sanitising: make extracted strings safe to store in an OOXML part.
//!
//! ## Why is sanitising necessary?
//!
//! pdfium hands back whatever code points the content stream maps to, and
//! real-world PDFs contain plenty that XML 1.0 forbids or that Office renders
//! as garbage:
//!
//! - C0 control characters (form feeds, `\u{0002}` ligature placeholders)
//! - Zero-width spaces, BOMs and soft hyphens left by the producer
//! - Windows-style `\r\n` line endings inside a single glyph run
//!
//! A single forbidden code point makes Excel or Word refuse the whole file,
//! so every string goes through [`clean_cell`] or [`clean_text`] before it
//! reaches a writer. Each rule is a pure `&str → String` function.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean a block of text that may span several lines.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 3. Strip control characters XML 1.0 cannot carry
/// 4. Trim trailing whitespace per line
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = remove_xml_illegal_chars(&s);
    trim_trailing_whitespace(&s)
}

/// Clean a single spreadsheet or table cell value.
///
/// Same rules as [`clean_text`]; line breaks inside a cell are kept since
/// multi-line cells are legitimate in both formats.
pub fn clean_cell(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    clean_text(input)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ──────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{200B}' | '\u{FEFF}' | '\u{00AD}' | '\u{200C}' | '\u{200D}' | '\u{2060}'
            )
        })
        .collect()
}

// ── Rule 3: Remove XML-illegal code points ───────────────────────────────────

// Tab and LF are the only C0 controls kept; CR is gone after rule 1.
static RE_XML_ILLEGAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F\x{FFFE}\x{FFFF}]").unwrap()
});

fn remove_xml_illegal_chars(input: &str) -> String {
    RE_XML_ILLEGAL.replace_all(input, "").into_owned()
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}
