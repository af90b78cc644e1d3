// src/deliver/sheet.rs
use async_trait::async_trait;

use crate::config::SheetConfig;
use crate::deliver::DeliverySink;
use crate::digest::Digest;
use crate::error::DigestError;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Append-only spreadsheet sink. One row per digest entry, appended below the
/// configured range. The bearer token comes from `SHEETS_ACCESS_TOKEN`; token
/// acquisition/refresh is someone else's job.
pub struct SheetSink {
    client: reqwest::Client,
    spreadsheet_id: String,
    range: String,
    token: Option<String>,
}

impl SheetSink {
    pub fn from_config(cfg: &SheetConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            spreadsheet_id: cfg.spreadsheet_id.clone(),
            range: cfg.range.clone(),
            token: std::env::var("SHEETS_ACCESS_TOKEN").ok(),
        }
    }
}

#[async_trait]
impl DeliverySink for SheetSink {
    async fn deliver(&self, digest: &Digest) -> Result<(), DigestError> {
        let Some(token) = &self.token else {
            return Err(DigestError::Sink {
                kind: "spreadsheet",
                reason: "SHEETS_ACCESS_TOKEN not configured".to_string(),
                permanent: true,
            });
        };

        let url = format!(
            "{SHEETS_API_BASE}/{}/values/{}:append?valueInputOption=USER_ENTERED",
            self.spreadsheet_id, self.range
        );
        let body = serde_json::json!({ "values": digest.sheet_rows() });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let permanent = matches!(status.as_u16(), 400 | 401 | 403 | 404);
        let body = resp.text().await.unwrap_or_default();
        let snippet: String = body.chars().take(200).collect();
        Err(DigestError::Sink {
            kind: "spreadsheet",
            reason: format!("HTTP {status}: {snippet}"),
            permanent,
        })
    }

    fn kind(&self) -> &'static str {
        "spreadsheet"
    }
}
