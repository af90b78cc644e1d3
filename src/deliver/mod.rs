// src/deliver/mod.rs
//! Fan-out of one assembled digest to its sinks, and the run outcome
//! reported back to the scheduler.

pub mod email;
pub mod sheet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RetryConfig;
use crate::digest::Digest;
use crate::error::DigestError;
use crate::history::HistoryStore;
use crate::retry::with_backoff;

/// An external delivery target for the digest.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, digest: &Digest) -> Result<(), DigestError>;
    fn kind(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum SinkReport {
    Delivered,
    Failed { reason: String },
}

impl SinkReport {
    pub fn delivered(&self) -> bool {
        matches!(self, SinkReport::Delivered)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum HistoryReport {
    Committed { appended: usize },
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_at: DateTime<Utc>,
    pub item_count: usize,
    pub spreadsheet: SinkReport,
    pub email: SinkReport,
    /// Topics whose every feed failed this run.
    pub skipped_topics: Vec<String>,
    pub history: HistoryReport,
}

impl RunOutcome {
    /// The scheduler contract: only an undelivered digest fails the run.
    /// Degraded runs (one sink down, stale history, skipped topics) exit 0.
    pub fn is_failure(&self) -> bool {
        !self.spreadsheet.delivered() && !self.email.delivered()
    }

    pub fn exit_code(&self) -> u8 {
        u8::from(self.is_failure())
    }
}

/// Phases of one delivery pass. The coordinator always reaches `Completed`,
/// whatever the individual sinks did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPhase {
    Pending,
    SpreadsheetAttempted,
    EmailAttempted,
    Completed,
}

pub struct DeliveryCoordinator<'a> {
    pub spreadsheet: &'a dyn DeliverySink,
    pub email: &'a dyn DeliverySink,
    pub history: &'a HistoryStore,
    pub retry: RetryConfig,
}

impl DeliveryCoordinator<'_> {
    /// Deliver to both sinks concurrently, isolating failures between them,
    /// then commit history for the delivered ids. History is only written
    /// when both sinks nominally succeeded; anything less risks re-delivery
    /// next run, which is the accepted tradeoff.
    pub async fn deliver(&self, digest: &Digest, skipped_topics: Vec<String>) -> RunOutcome {
        let mut phase = DeliveryPhase::Pending;
        debug!(?phase, items = digest.item_count(), "delivery starting");

        // The run's only mandatory join point: both sinks go out together,
        // each failure stays on its own side of the join.
        let (sheet_res, email_res) = tokio::join!(
            self.attempt(self.spreadsheet, digest),
            self.attempt(self.email, digest),
        );

        let spreadsheet = record(self.spreadsheet.kind(), sheet_res);
        phase = DeliveryPhase::SpreadsheetAttempted;
        debug!(?phase, delivered = spreadsheet.delivered(), "sink recorded");

        let email = record(self.email.kind(), email_res);
        phase = DeliveryPhase::EmailAttempted;
        debug!(?phase, delivered = email.delivered(), "sink recorded");

        let history = if spreadsheet.delivered() && email.delivered() {
            match self
                .history
                .commit(digest.delivered_ids(), digest.generated_at)
            {
                Ok(appended) => HistoryReport::Committed { appended },
                Err(e) => {
                    warn!(error = %e, "history commit failed; next run may re-deliver");
                    HistoryReport::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        } else {
            HistoryReport::Skipped {
                reason: "not every sink delivered".to_string(),
            }
        };

        phase = DeliveryPhase::Completed;
        debug!(?phase, "delivery completed");

        RunOutcome {
            run_at: digest.generated_at,
            item_count: digest.item_count(),
            spreadsheet,
            email,
            skipped_topics,
            history,
        }
    }

    async fn attempt(
        &self,
        sink: &dyn DeliverySink,
        digest: &Digest,
    ) -> Result<(), DigestError> {
        with_backoff(sink.kind(), self.retry, move || sink.deliver(digest)).await
    }
}

fn record(kind: &'static str, res: Result<(), DigestError>) -> SinkReport {
    match res {
        Ok(()) => {
            info!(sink = kind, "digest delivered");
            SinkReport::Delivered
        }
        Err(e) => {
            warn!(sink = kind, error = %e, "sink failed; the other sink continues");
            SinkReport::Failed {
                reason: e.to_string(),
            }
        }
    }
}
