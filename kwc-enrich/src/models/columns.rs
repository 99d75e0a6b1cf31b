//! Workbook column headers
//!
//! Header text matches the sheets the data owners already maintain.

/// Product keyword (input, required)
pub const KEYWORD: &str = "keywords";
/// Optional data-owner supplied H2 heading
pub const H2_OVERRIDE: &str = "h2_overrides";
/// Optional data-owner supplied H3 heading
pub const H3_OVERRIDE: &str = "h3_overrides";
pub const H2_HEADING: &str = "<h2> headline";
pub const H3_HEADING: &str = "<h3> headline";
pub const H2_PARAGRAPH: &str = "relevant text 2";
pub const H3_PARAGRAPH: &str = "relevant text 3";
/// Composed collection body
pub const COLLECTION_HTML: &str = "collection_html";
pub const PROCESSED_AT: &str = "_processed_at";
/// Content hash of keyword + overrides
pub const ROW_HASH: &str = "_row_hash";

/// Older sheets name the H2 paragraph column this way
pub const LEGACY_H2_PARAGRAPH: &str = "relevant text 1";

/// Columns guaranteed to exist before rows are processed
pub const REQUIRED: [&str; 10] = [
    KEYWORD,
    H2_HEADING,
    H3_HEADING,
    H2_OVERRIDE,
    H3_OVERRIDE,
    COLLECTION_HTML,
    PROCESSED_AT,
    ROW_HASH,
    H2_PARAGRAPH,
    H3_PARAGRAPH,
];
