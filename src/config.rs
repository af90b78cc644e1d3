// src/config.rs
//! Run configuration: a TOML file plus environment for anything secret.
//!
//! Everything non-secret lives in `config/digest.toml` (overridable with
//! `DIGEST_CONFIG_PATH`). SMTP credentials, the spreadsheet bearer token and
//! the OpenAI key come only from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Digest size ceiling per topic.
    #[serde(default = "default_max_per_topic")]
    pub max_per_topic: usize,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    #[serde(default = "default_summarize_concurrency")]
    pub summarize_concurrency: usize,
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
    #[serde(default = "default_source_weights_path")]
    pub source_weights_path: PathBuf,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    pub topics: Vec<TopicSpec>,
    pub sheet: SheetConfig,
    pub email: EmailConfig,
}

/// One digest topic: the section order in the digest is the order of
/// `[[topics]]` tables in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicSpec {
    pub key: String,
    pub label: String,
    /// Feeds in fallback order; the first one is the primary.
    pub feeds: Vec<FeedSpec>,
    /// Move on to the next feed while the topic still has fewer items.
    #[serde(default = "default_fallback_below")]
    pub fallback_below: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(concat!("semicon-news-digest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .build()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizerConfig {
    /// "openai" for the remote provider; anything else (or absent) uses the
    /// offline lead-sentence summarizer.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_range")]
    pub range: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub from: String,
    pub to: Vec<String>,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_max_per_topic() -> usize {
    5
}
fn default_fetch_concurrency() -> usize {
    2
}
fn default_summarize_concurrency() -> usize {
    4
}
fn default_fallback_below() -> usize {
    2
}
fn default_max_retries() -> u32 {
    3
}
fn default_initial_delay_ms() -> u64 {
    500
}
fn default_connect_timeout_secs() -> u64 {
    4
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_history_path() -> PathBuf {
    PathBuf::from("state/delivered.json")
}
fn default_source_weights_path() -> PathBuf {
    PathBuf::from("config/source_weights.json")
}
fn default_sheet_range() -> String {
    "Digest!A1".to_string()
}
fn default_subject_prefix() -> String {
    "Daily Semiconductor & Macro News".to_string()
}

impl RunConfig {
    /// Load from `$DIGEST_CONFIG_PATH`, falling back to `config/digest.toml`.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: RunConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config from {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_per_topic > 0, "max_per_topic must be at least 1");
        anyhow::ensure!(!self.topics.is_empty(), "at least one [[topics]] entry is required");
        for t in &self.topics {
            anyhow::ensure!(
                !t.feeds.is_empty(),
                "topic {} needs at least one feed",
                t.key
            );
        }
        anyhow::ensure!(!self.email.to.is_empty(), "email.to must not be empty");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [[topics]]
        key = "semiconductor"
        label = "Semiconductor Industry"
        feeds = [{ name = "Yonhap News", url = "https://example.test/semi.xml" }]

        [sheet]
        spreadsheet_id = "sheet-1"

        [email]
        from = "Digest <digest@example.test>"
        to = ["reader@example.test"]
    "#;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg: RunConfig = toml::from_str(MINIMAL).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.max_per_topic, 5);
        assert_eq!(cfg.fetch_concurrency, 2);
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.sheet.range, "Digest!A1");
        assert_eq!(cfg.topics[0].fallback_below, 2);
        assert_eq!(cfg.history_path, PathBuf::from("state/delivered.json"));
    }

    #[test]
    fn topic_without_feeds_is_rejected() {
        let broken = MINIMAL.replace(
            "feeds = [{ name = \"Yonhap News\", url = \"https://example.test/semi.xml\" }]",
            "feeds = []",
        );
        let cfg: RunConfig = toml::from_str(&broken).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_recipient_list_is_rejected() {
        let broken = MINIMAL.replace("to = [\"reader@example.test\"]", "to = []");
        let cfg: RunConfig = toml::from_str(&broken).unwrap();
        assert!(cfg.validate().is_err());
    }
}
