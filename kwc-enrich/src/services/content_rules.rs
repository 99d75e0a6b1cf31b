//! Validation and normalization rules for generated copy
//!
//! Pure functions shared by the workbook processor: heading validation,
//! paragraph normalization and word counting, HTML composition and the
//! row content hash.

use sha2::{Digest, Sha256};

/// Longest heading kept; longer headings are truncated, not rejected
pub const MAX_HEADING_CHARS: usize = 60;

/// Validate a heading candidate against the forbidden terms
///
/// Returns the cleaned heading, or an empty string when the candidate is
/// blank or equals (case-insensitively) one of `forbidden`.
pub fn validate_heading(candidate: &str, forbidden: &[&str]) -> String {
    let cleaned = candidate.trim();
    if cleaned.is_empty() {
        return String::new();
    }

    let lowered = cleaned.to_lowercase();
    if forbidden.iter().any(|term| term.trim().to_lowercase() == lowered) {
        return String::new();
    }

    if cleaned.chars().count() > MAX_HEADING_CHARS {
        let truncated: String = cleaned.chars().take(MAX_HEADING_CHARS).collect();
        return truncated.trim_end().to_string();
    }

    cleaned.to_string()
}

/// Trim and wrap in `<p>` unless the text already opens with a paragraph tag
pub fn normalize_paragraph(text: &str) -> String {
    let cleaned = text.trim();
    let has_paragraph_tag = cleaned
        .get(..2)
        .map(|prefix| prefix.eq_ignore_ascii_case("<p"))
        .unwrap_or(false);

    if has_paragraph_tag {
        cleaned.to_string()
    } else {
        format!("<p>{}</p>", cleaned)
    }
}

/// Drop everything between `<` and `>` inclusive and collapse whitespace
pub fn strip_html(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;

    for ch in fragment.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Words in an HTML fragment after tag stripping
pub fn word_count(html: &str) -> usize {
    strip_html(html).split_whitespace().count()
}

/// Inclusive acceptable word range for a target: 75% to 115%, floored
pub fn word_bounds(target_words: usize) -> (usize, usize) {
    (target_words * 75 / 100, target_words * 115 / 100)
}

/// True when the paragraph's stripped word count is within bounds
pub fn paragraph_fits(paragraph: &str, target_words: usize) -> bool {
    let (lower, upper) = word_bounds(target_words);
    let count = word_count(paragraph);
    lower <= count && count <= upper
}

/// Collection body: H2, its paragraph, H3, its paragraph; one per line
pub fn compose_html(h2: &str, h2_paragraph: &str, h3: &str, h3_paragraph: &str) -> String {
    [
        format!("<h2>{}</h2>", h2),
        h2_paragraph.trim().to_string(),
        format!("<h3>{}</h3>", h3),
        h3_paragraph.trim().to_string(),
    ]
    .join("\n")
}

/// SHA-256 hex digest of the row's trimmed keyword and overrides
///
/// The digested text is `{"h2_override": .., "h3_override": .., "keyword": ..}`
/// with keys in sorted order, `", "` / `": "` separators and non-ASCII
/// escaped as `\uXXXX`. Generation templates are not part of the digest.
pub fn row_hash(keyword: &str, h2_override: &str, h3_override: &str) -> String {
    let mut fields = [
        ("keyword", keyword.trim()),
        ("h2_override", h2_override.trim()),
        ("h3_override", h3_override.trim()),
    ];
    fields.sort_by_key(|(key, _)| *key);

    let body = fields
        .iter()
        .map(|(key, value)| format!("{}: {}", json_string(key), json_string(value)))
        .collect::<Vec<_>>()
        .join(", ");
    let payload = format!("{{{}}}", body);
    format!("{:x}", Sha256::digest(payload.as_bytes()))
}

/// ASCII-only JSON string literal
fn json_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
        }
    }
    out.push('"');
    out
}

/// Blank keywords and spreadsheet missing-value markers
pub fn is_missing_keyword(keyword: &str) -> bool {
    let trimmed = keyword.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}
