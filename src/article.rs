// src/article.rs
//! Article model plus the id derivation and text normalization shared by
//! every stage of the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Feed titles are capped before anything else sees them.
pub const TITLE_MAX_CHARS: usize = 120;
/// Excerpts are bounded so summarizer inputs stay small.
pub const EXCERPT_MAX_CHARS: usize = 1500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub topic: String,
    pub title: String,
    pub source: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub excerpt: String,
}

/// Stable identifier: 16 hex chars of SHA-256 over the feed-provided GUID
/// when present, else the article URL.
pub fn article_id(guid: Option<&str>, url: &str) -> String {
    use sha2::{Digest, Sha256};
    let seed = guid
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| url.trim());
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Normalize feed text: decode HTML entities, strip tags, fold typographic
/// quotes to ASCII, collapse whitespace, cap length on a char boundary.
pub fn normalize_text(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Cap length
    if out.chars().count() > max_chars {
        out = out.chars().take(max_chars).collect();
        out = out.trim_end().to_string();
    }

    out
}
