// src/pipeline.rs
//! One end-to-end run: fetch → filter → rank → summarize → assemble →
//! deliver. Per-topic and per-article failures are absorbed into the
//! `RunOutcome`; the only hard stop before delivery is an empty digest.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::RetryConfig;
use crate::deliver::{DeliveryCoordinator, DeliverySink, RunOutcome};
use crate::digest::{Digest, DigestEntry, DigestSection};
use crate::error::DigestError;
use crate::history::{filter_new, HistoryStore};
use crate::rank::{rank, RankedArticle};
use crate::source::{fetch_all, TopicFeeds};
use crate::source_weights::SourceWeightsConfig;
use crate::summarize::DynSummarizer;

/// Fetch slack: pull more than the digest ceiling so history filtering can
/// still leave a full section.
const FETCH_SLACK: usize = 3;

pub struct Pipeline {
    pub max_per_topic: usize,
    pub fetch_concurrency: usize,
    pub summarize_concurrency: usize,
    pub retry: RetryConfig,
    pub topics: Vec<TopicFeeds>,
    pub weights: SourceWeightsConfig,
    pub summarizer: DynSummarizer,
    pub spreadsheet: Box<dyn DeliverySink>,
    pub email: Box<dyn DeliverySink>,
    pub history: HistoryStore,
}

impl Pipeline {
    pub async fn run(&self) -> Result<RunOutcome, DigestError> {
        let run_at = Utc::now();
        let history = self.history.snapshot();
        info!(
            known_ids = history.len(),
            topics = self.topics.len(),
            "run starting"
        );

        let report = fetch_all(
            &self.topics,
            self.max_per_topic * FETCH_SLACK,
            self.fetch_concurrency,
        )
        .await;

        let mut sections = Vec::with_capacity(report.fetched.len());
        for tf in report.fetched {
            let total = tf.candidates.len();
            let fresh = filter_new(tf.candidates, &history);
            info!(
                topic = %tf.key,
                fetched = total,
                fresh = fresh.len(),
                "candidates filtered against history"
            );
            let ranked = rank(fresh, self.max_per_topic, &self.weights, run_at);
            let entries = self.summarize_ranked(ranked).await;
            sections.push(DigestSection {
                key: tf.key,
                label: tf.label,
                entries,
            });
        }

        // An all-empty digest aborts here; no sink ever sees it.
        let digest = Digest::assemble(sections, run_at)?;
        info!(items = digest.item_count(), "digest assembled");

        let coordinator = DeliveryCoordinator {
            spreadsheet: self.spreadsheet.as_ref(),
            email: self.email.as_ref(),
            history: &self.history,
            retry: self.retry,
        };
        Ok(coordinator.deliver(&digest, report.skipped_topics).await)
    }

    /// Summarize ranked articles with a bounded pool, preserving rank order.
    /// A failed summarization drops that article and nothing else.
    async fn summarize_ranked(&self, ranked: Vec<RankedArticle>) -> Vec<DigestEntry> {
        let summarizer = &self.summarizer;
        let results: Vec<Option<DigestEntry>> = stream::iter(ranked)
            .map(|r| async move {
                match summarizer.summarize(&r.article).await {
                    Ok(synopsis) => Some(DigestEntry::from_article(&r.article, synopsis)),
                    Err(e) => {
                        warn!(
                            topic = %r.article.topic,
                            id = %r.article.id,
                            error = %e,
                            "summarization failed; dropping article"
                        );
                        None
                    }
                }
            })
            .buffered(self.summarize_concurrency.max(1))
            .collect()
            .await;
        results.into_iter().flatten().collect()
    }
}
