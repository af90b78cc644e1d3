//! Daily news digest — batch entrypoint.
//!
//! Invoked once per scheduled interval (cron or similar). The exit code is
//! the scheduler's only signal: 0 when the digest reached at least one sink
//! (degraded runs included), 1 when it was empty or reached nobody.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use semicon_news_digest::config::RunConfig;
use semicon_news_digest::deliver::{email::EmailSink, sheet::SheetSink, RunOutcome};
use semicon_news_digest::history::HistoryStore;
use semicon_news_digest::pipeline::Pipeline;
use semicon_news_digest::source::{rss::RssSource, NewsSource, TopicFeeds};
use semicon_news_digest::source_weights::SourceWeightsConfig;
use semicon_news_digest::summarize;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt().with_env_filter(filter).with_target(true).init();

    match run().await {
        Ok(outcome) => {
            info!(
                items = outcome.item_count,
                spreadsheet = outcome.spreadsheet.delivered(),
                email = outcome.email.delivered(),
                skipped_topics = outcome.skipped_topics.len(),
                "run finished"
            );
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<RunOutcome> {
    let cfg = RunConfig::load_default().context("loading configuration")?;
    let client = cfg.http.client().context("building http client")?;

    let topics: Vec<TopicFeeds> = cfg
        .topics
        .iter()
        .map(|t| TopicFeeds {
            key: t.key.clone(),
            label: t.label.clone(),
            fallback_below: t.fallback_below,
            sources: t
                .feeds
                .iter()
                .map(|f| {
                    Box::new(RssSource::over_http(
                        f.name.clone(),
                        f.url.clone(),
                        client.clone(),
                        cfg.retry,
                    )) as Box<dyn NewsSource>
                })
                .collect(),
        })
        .collect();

    let summarizer = summarize::from_config(&cfg.summarizer).context("building summarizer")?;
    info!(provider = summarizer.name(), "summarizer ready");

    let pipeline = Pipeline {
        max_per_topic: cfg.max_per_topic,
        fetch_concurrency: cfg.fetch_concurrency,
        summarize_concurrency: cfg.summarize_concurrency,
        retry: cfg.retry,
        topics,
        weights: SourceWeightsConfig::load_from_file(&cfg.source_weights_path),
        summarizer,
        spreadsheet: Box::new(SheetSink::from_config(&cfg.sheet, client)),
        email: Box::new(EmailSink::from_config(&cfg.email).context("building email sink")?),
        history: HistoryStore::new(cfg.history_path.clone()),
    };

    let outcome = pipeline.run().await?;
    Ok(outcome)
}
