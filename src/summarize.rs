// src/summarize.rs
//! Summarization boundary: a narrow text-to-text capability, substitutable
//! without touching pipeline logic. A provider error drops that one article
//! from the digest; it never aborts the run.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::config::SummarizerConfig;

/// Synopses are single-line and bounded.
pub const SYNOPSIS_MAX_CHARS: usize = 240;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Reduce one article to a short synopsis.
    async fn summarize(&self, article: &Article) -> Result<String>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

/// Factory: `SUMMARIZER=mock` wins (deterministic runs in tests/CI), then the
/// configured provider, then the offline default.
pub fn from_config(cfg: &SummarizerConfig) -> Result<DynSummarizer> {
    if std::env::var("SUMMARIZER")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(FixedSummarizer::default()));
    }

    match cfg.provider.as_deref() {
        Some("openai") => Ok(Arc::new(OpenAiSummarizer::new(cfg.model.as_deref())?)),
        _ => Ok(Arc::new(LeadSummarizer)),
    }
}

// ------------------------------------------------------------
// Offline default: lead sentences of the excerpt
// ------------------------------------------------------------

pub struct LeadSummarizer;

#[async_trait]
impl Summarizer for LeadSummarizer {
    async fn summarize(&self, article: &Article) -> Result<String> {
        let base = if article.excerpt.is_empty() {
            article.title.as_str()
        } else {
            article.excerpt.as_str()
        };
        let synopsis = lead_sentences(base, SYNOPSIS_MAX_CHARS);
        if synopsis.is_empty() {
            return Err(anyhow!("article {} has no summarizable text", article.id));
        }
        Ok(synopsis)
    }

    fn name(&self) -> &'static str {
        "lead"
    }
}

/// First whole sentences that fit within `max_chars`; a hard cut when even
/// the first sentence is too long.
fn lead_sentences(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for sentence in split_sentences(text) {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + sentence.chars().count() > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(sentence);
    }
    if out.is_empty() {
        out = text.chars().take(max_chars.saturating_sub(3)).collect();
        out = out.trim_end().to_string();
        if !out.is_empty() {
            out.push_str("...");
        }
    }
    sanitize_synopsis(&out, max_chars)
}

fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Fold a synopsis to one bounded line: newlines and tabs become spaces,
/// runs of spaces collapse, length is capped on a char boundary.
pub fn sanitize_synopsis(input: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(input.len().min(max_chars * 4));
    let mut prev_space = false;
    for ch in input.chars() {
        let c = match ch {
            '\r' | '\n' | '\t' => ' ',
            c if c.is_control() => ' ',
            c => c,
        };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
        if out.chars().count() >= max_chars {
            break;
        }
    }
    out.trim_end().to_string()
}

// ------------------------------------------------------------
// OpenAI provider (Chat Completions). Requires `OPENAI_API_KEY`.
// ------------------------------------------------------------

pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    /// `model_override`: defaults to gpt-4o-mini.
    pub fn new(model_override: Option<&str>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent(concat!("semicon-news-digest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()?;
        let model = model_override.unwrap_or("gpt-4o-mini").to_string();
        Ok(Self {
            http,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, article: &Article) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(anyhow!("OPENAI_API_KEY not set"));
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let sys = "You condense news articles. Return ONE factual sentence under 240 characters, neutral tone, no emojis. Output only the sentence.";
        let input = format!("{}\n\n{}", article.title, article.excerpt);
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: sys,
                },
                Msg {
                    role: "user",
                    content: &input,
                },
            ],
            temperature: 0.2,
            max_tokens: 120,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;

        let body: Resp = resp.json().await?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");
        let cleaned = sanitize_synopsis(content, SYNOPSIS_MAX_CHARS);
        if cleaned.is_empty() {
            Err(anyhow!("empty completion for article {}", article.id))
        } else {
            Ok(cleaned)
        }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Deterministic test double
// ------------------------------------------------------------

#[derive(Clone)]
pub struct FixedSummarizer {
    pub fixed: String,
}

impl Default for FixedSummarizer {
    fn default() -> Self {
        Self {
            fixed: "Deterministic synopsis (mock).".to_string(),
        }
    }
}

#[async_trait]
impl Summarizer for FixedSummarizer {
    async fn summarize(&self, _article: &Article) -> Result<String> {
        Ok(self.fixed.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(excerpt: &str) -> Article {
        Article {
            id: "abc123".into(),
            topic: "semiconductor".into(),
            title: "Chip exports climb".into(),
            source: "Yonhap News".into(),
            url: "https://example.test/a".into(),
            published_at: Utc::now(),
            excerpt: excerpt.into(),
        }
    }

    #[tokio::test]
    async fn lead_summarizer_keeps_whole_sentences() {
        let a = article("Exports rose 12% in July. Memory prices firmed. Analysts expect the rally to continue into the fourth quarter on AI server demand.");
        let out = LeadSummarizer.summarize(&a).await.unwrap();
        assert!(out.starts_with("Exports rose 12% in July."));
        assert!(out.chars().count() <= SYNOPSIS_MAX_CHARS);
    }

    #[tokio::test]
    async fn lead_summarizer_falls_back_to_title() {
        let a = article("");
        let out = LeadSummarizer.summarize(&a).await.unwrap();
        assert_eq!(out, "Chip exports climb");
    }

    #[tokio::test]
    async fn oversized_first_sentence_is_hard_cut() {
        let long = "word ".repeat(200);
        let a = article(&long);
        let out = LeadSummarizer.summarize(&a).await.unwrap();
        assert!(out.chars().count() <= SYNOPSIS_MAX_CHARS);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn sanitize_folds_to_one_line() {
        let out = sanitize_synopsis("a\n\nb\t c   d", 240);
        assert_eq!(out, "a b c d");
    }

    #[serial_test::serial]
    #[test]
    fn mock_env_wins_over_configured_provider() {
        std::env::set_var("SUMMARIZER", "mock");
        let s = from_config(&SummarizerConfig {
            provider: Some("openai".into()),
            model: None,
        })
        .unwrap();
        assert_eq!(s.name(), "fixed");
        std::env::remove_var("SUMMARIZER");
    }

    #[serial_test::serial]
    #[test]
    fn absent_provider_means_offline_lead() {
        std::env::remove_var("SUMMARIZER");
        let s = from_config(&SummarizerConfig::default()).unwrap();
        assert_eq!(s.name(), "lead");
    }
}
