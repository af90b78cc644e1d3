// src/digest.rs
//! Digest assembly and rendering: the one immutable document both sinks
//! consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::error::DigestError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestEntry {
    pub article_id: String,
    pub topic: String,
    pub title: String,
    pub synopsis: String,
    pub source: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

impl DigestEntry {
    pub fn from_article(article: &Article, synopsis: String) -> Self {
        Self {
            article_id: article.id.clone(),
            topic: article.topic.clone(),
            title: article.title.clone(),
            synopsis,
            source: article.source.clone(),
            url: article.url.clone(),
            published_at: article.published_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestSection {
    pub key: String,
    pub label: String,
    /// Entries in the ranker's order.
    pub entries: Vec<DigestEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Digest {
    pub generated_at: DateTime<Utc>,
    /// Sections in configured topic order; never reordered after assembly.
    pub sections: Vec<DigestSection>,
}

impl Digest {
    /// Sections arrive in configured topic order and keep it. The only
    /// failure is a digest with nothing in any section.
    pub fn assemble(
        sections: Vec<DigestSection>,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, DigestError> {
        let total: usize = sections.iter().map(|s| s.entries.len()).sum();
        if total == 0 {
            return Err(DigestError::EmptyDigest);
        }
        Ok(Self {
            generated_at,
            sections,
        })
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn entries(&self) -> impl Iterator<Item = &DigestEntry> {
        self.sections.iter().flat_map(|s| s.entries.iter())
    }

    /// (article id, topic) pairs for the history commit.
    pub fn delivered_ids(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries()
            .map(|e| (e.article_id.as_str(), e.topic.as_str()))
    }

    pub fn subject(&self, prefix: &str) -> String {
        format!("{prefix} - {}", self.generated_at.format("%Y-%m-%d"))
    }

    /// Plain-text body for the email's text part and for logs.
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Daily news digest for {}\n",
            self.generated_at.format("%Y-%m-%d")
        ));
        for section in &self.sections {
            out.push_str(&format!("\n== {} ==\n", section.label));
            if section.entries.is_empty() {
                out.push_str("(no new articles today)\n");
                continue;
            }
            for (i, e) in section.entries.iter().enumerate() {
                out.push_str(&format!(
                    "{}. {} ({}, {})\n",
                    i + 1,
                    e.title,
                    e.source,
                    e.published_at.format("%Y-%m-%d")
                ));
                out.push_str(&format!("   {}\n", e.synopsis));
                out.push_str(&format!("   {}\n", e.url));
            }
        }
        out
    }

    /// Simple-markup body for the email's HTML part.
    pub fn render_html(&self) -> String {
        use html_escape::encode_double_quoted_attribute as attr;
        use html_escape::encode_text as text;

        let mut out = String::new();
        out.push_str("<html><body>\n");
        out.push_str(&format!(
            "<h1>Daily news digest</h1>\n<p>{}</p>\n",
            self.generated_at.format("%Y-%m-%d")
        ));
        for section in &self.sections {
            out.push_str(&format!("<h2>{}</h2>\n", text(&section.label)));
            if section.entries.is_empty() {
                out.push_str("<p>No new articles today.</p>\n");
                continue;
            }
            out.push_str("<ol>\n");
            for e in &section.entries {
                out.push_str(&format!(
                    "<li><strong>{}</strong><br>{} &middot; {}<br>{}<br><a href=\"{}\">Read the full article</a></li>\n",
                    text(&e.title),
                    text(&e.source),
                    e.published_at.format("%Y-%m-%d"),
                    text(&e.synopsis),
                    attr(&e.url),
                ));
            }
            out.push_str("</ol>\n");
        }
        out.push_str("</body></html>\n");
        out
    }

    /// One append-ready row per entry: topic, title, synopsis, source, url,
    /// original timestamp.
    pub fn sheet_rows(&self) -> Vec<Vec<String>> {
        self.entries()
            .map(|e| {
                vec![
                    e.topic.clone(),
                    e.title.clone(),
                    e.synopsis.clone(),
                    e.source.clone(),
                    e.url.clone(),
                    e.published_at.to_rfc3339(),
                ]
            })
            .collect()
    }
}
