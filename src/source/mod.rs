// src/source/mod.rs
pub mod rss;

use std::collections::HashSet;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::article::Article;
use crate::error::DigestError;

/// Boundary to a single named news feed. Implementations own their retry
/// budget; an `Err` here means the feed is unavailable for this run.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self, topic: &str, max_items: usize) -> Result<Vec<Article>, DigestError>;
    fn name(&self) -> &str;
}

/// Feeds for one topic, in fallback order. The first entry is the primary;
/// later ones are consulted while the topic has fewer than `fallback_below`
/// items.
pub struct TopicFeeds {
    pub key: String,
    pub label: String,
    pub fallback_below: usize,
    pub sources: Vec<Box<dyn NewsSource>>,
}

pub struct TopicFetch {
    pub key: String,
    pub label: String,
    pub candidates: Vec<Article>,
}

pub struct FetchReport {
    /// One entry per configured topic, in configuration order. A skipped
    /// topic is present with zero candidates.
    pub fetched: Vec<TopicFetch>,
    /// Topics whose every feed failed, in configuration order.
    pub skipped_topics: Vec<String>,
}

/// Fetch one topic, walking its feeds in fallback order and deduplicating by
/// id within the call. Fails only when every feed for the topic failed.
pub async fn fetch_topic(
    feeds: &TopicFeeds,
    max_items: usize,
) -> Result<Vec<Article>, DigestError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Article> = Vec::new();
    let mut last_err: Option<DigestError> = None;

    for source in &feeds.sources {
        match source.fetch(&feeds.key, max_items).await {
            Ok(items) => {
                let got = items.len();
                for it in items {
                    if out.len() >= max_items {
                        break;
                    }
                    if seen.insert(it.id.clone()) {
                        out.push(it);
                    }
                }
                info!(
                    topic = %feeds.key,
                    source = source.name(),
                    got,
                    kept = out.len(),
                    "feed fetched"
                );
                if out.len() >= feeds.fallback_below.min(max_items) {
                    break;
                }
            }
            Err(e) => {
                warn!(
                    topic = %feeds.key,
                    source = source.name(),
                    error = %e,
                    "feed failed, trying next"
                );
                last_err = Some(e);
            }
        }
    }

    match (out.is_empty(), last_err) {
        (true, Some(e)) => Err(DigestError::SourceUnavailable {
            topic: feeds.key.clone(),
            reason: e.to_string(),
        }),
        _ => Ok(out),
    }
}

/// Fetch every configured topic with a bounded worker pool. One topic's
/// failure never blocks the others; it is recorded as skipped instead.
pub async fn fetch_all(
    topics: &[TopicFeeds],
    max_items_per_topic: usize,
    concurrency: usize,
) -> FetchReport {
    let results: Vec<(usize, Result<Vec<Article>, DigestError>)> =
        stream::iter(topics.iter().enumerate())
            .map(|(i, tf)| async move { (i, fetch_topic(tf, max_items_per_topic).await) })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    let mut by_index: Vec<Option<Vec<Article>>> = (0..topics.len()).map(|_| None).collect();
    let mut failed: Vec<bool> = vec![false; topics.len()];
    for (i, res) in results {
        match res {
            Ok(candidates) => by_index[i] = Some(candidates),
            Err(e) => {
                warn!(topic = %topics[i].key, error = %e, "topic skipped for this run");
                failed[i] = true;
            }
        }
    }

    let mut fetched = Vec::with_capacity(topics.len());
    let mut skipped_topics = Vec::new();
    for (i, tf) in topics.iter().enumerate() {
        if failed[i] {
            skipped_topics.push(tf.key.clone());
        }
        fetched.push(TopicFetch {
            key: tf.key.clone(),
            label: tf.label.clone(),
            candidates: by_index[i].take().unwrap_or_default(),
        });
    }

    FetchReport {
        fetched,
        skipped_topics,
    }
}
