// src/rank.rs
//! Order deduplicated candidates by outlet trust and recency, then truncate
//! to the per-topic digest size.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::article::Article;
use crate::source_weights::SourceWeightsConfig;

#[derive(Debug, Clone)]
pub struct RankedArticle {
    pub article: Article,
    pub score: f64,
    /// 0-based rank within the topic.
    pub position: usize,
}

/// Half-life of the recency factor.
const RECENCY_HALF_LIFE_HOURS: f64 = 12.0;
/// Stale-but-trusted items never decay to exactly zero.
const RECENCY_FLOOR: f64 = 0.05;

fn recency_factor(published_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age_hours = (now - published_at).num_seconds().max(0) as f64 / 3600.0;
    let decayed = 0.5f64.powf(age_hours / RECENCY_HALF_LIFE_HOURS);
    decayed.max(RECENCY_FLOOR)
}

/// Score and order candidates; at most `limit` survive. Fewer candidates than
/// `limit` all pass through, never padded.
///
/// Ordering is total: score desc, then newer first, then id asc. No tie can
/// survive all three keys, so the same input always yields the same order.
pub fn rank(
    candidates: Vec<Article>,
    limit: usize,
    weights: &SourceWeightsConfig,
    now: DateTime<Utc>,
) -> Vec<RankedArticle> {
    let mut scored: Vec<(f64, Article)> = candidates
        .into_iter()
        .map(|a| {
            let score = weights.weight_for(&a.source) as f64 * recency_factor(a.published_at, now);
            (score, a)
        })
        .collect();

    scored.sort_by(|(sa, a), (sb, b)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.published_at.cmp(&a.published_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    scored
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(position, (score, article))| RankedArticle {
            article,
            score,
            position,
        })
        .collect()
}
