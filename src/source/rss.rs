// src/source/rss.rs
//! Generic RSS 2.0 source. One instance per named feed URL; tests construct
//! it from fixture XML instead of the network.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::article::{article_id, normalize_text, Article, EXCERPT_MAX_CHARS, TITLE_MAX_CHARS};
use crate::config::RetryConfig;
use crate::error::DigestError;
use crate::retry::with_backoff;
use crate::source::NewsSource;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let unix = OffsetDateTime::parse(ts, &Rfc2822)
        .ok()?
        .to_offset(UtcOffset::UTC)
        .unix_timestamp();
    DateTime::<Utc>::from_timestamp(unix, 0)
}

enum Content {
    Http {
        client: reqwest::Client,
        url: String,
        retry: RetryConfig,
    },
    Fixture(String),
}

pub struct RssSource {
    name: String,
    content: Content,
}

impl RssSource {
    pub fn over_http(
        name: impl Into<String>,
        url: impl Into<String>,
        client: reqwest::Client,
        retry: RetryConfig,
    ) -> Self {
        Self {
            name: name.into(),
            content: Content::Http {
                client,
                url: url.into(),
                retry,
            },
        }
    }

    pub fn from_fixture(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            content: Content::Fixture(xml.to_string()),
        }
    }

    fn parse(&self, topic: &str, xml: &str, max_items: usize) -> Result<Vec<Article>, DigestError> {
        let rss: Rss =
            from_str(xml).map_err(|e| DigestError::Parse(format!("{}: {e}", self.name)))?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();
        for it in rss.channel.item {
            if out.len() >= max_items {
                break;
            }
            let Some(url) = it.link.as_deref().map(str::trim).filter(|l| !l.is_empty()) else {
                continue;
            };
            let title = normalize_text(it.title.as_deref().unwrap_or_default(), TITLE_MAX_CHARS);
            if title.is_empty() {
                continue;
            }
            let id = article_id(it.guid.as_deref(), url);
            // one fetch call must never yield the same id twice
            if !seen.insert(id.clone()) {
                continue;
            }
            let published_at = it
                .pub_date
                .as_deref()
                .and_then(parse_rfc2822)
                // feeds without dates are treated as fresh, like the wire
                // services that only stamp the channel
                .unwrap_or_else(Utc::now);
            let excerpt =
                normalize_text(it.description.as_deref().unwrap_or_default(), EXCERPT_MAX_CHARS);
            out.push(Article {
                id,
                topic: topic.to_string(),
                title,
                source: self.name.clone(),
                url: url.to_string(),
                published_at,
                excerpt,
            });
        }
        debug!(feed = %self.name, topic, items = out.len(), "feed parsed");
        Ok(out)
    }
}

#[async_trait]
impl NewsSource for RssSource {
    async fn fetch(&self, topic: &str, max_items: usize) -> Result<Vec<Article>, DigestError> {
        let xml = match &self.content {
            Content::Fixture(xml) => xml.clone(),
            Content::Http { client, url, retry } => {
                let url = url.as_str();
                with_backoff(&self.name, *retry, move || async move {
                    let resp = client.get(url).send().await?.error_for_status()?;
                    Ok::<String, DigestError>(resp.text().await?)
                })
                .await?
            }
        };
        self.parse(topic, &xml, max_items)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc2822_dates_parse_to_utc() {
        let dt = parse_rfc2822("Sat, 01 Aug 2026 06:30:00 +0900").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-07-31T21:30:00+00:00");
    }

    #[test]
    fn unparseable_date_is_none() {
        assert!(parse_rfc2822("yesterday-ish").is_none());
    }
}
