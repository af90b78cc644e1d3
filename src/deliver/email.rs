// src/deliver/email.rs
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, Message, MultiPart};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use crate::config::EmailConfig;
use crate::deliver::DeliverySink;
use crate::digest::Digest;
use crate::error::DigestError;

/// SMTP sink. Recipients and sender come from config; credentials come only
/// from `SMTP_HOST`, `SMTP_USER` and `SMTP_PASS`. Missing credentials leave
/// the sink constructed but undeliverable, so the spreadsheet side still
/// runs.
pub struct EmailSink {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    to: Vec<Mailbox>,
    subject_prefix: String,
}

impl EmailSink {
    pub fn from_config(cfg: &EmailConfig) -> Result<Self, DigestError> {
        let from: Mailbox = cfg
            .from
            .parse()
            .map_err(|e| DigestError::Config(format!("email.from {:?}: {e}", cfg.from)))?;
        let mut to = Vec::with_capacity(cfg.to.len());
        for addr in &cfg.to {
            to.push(
                addr.parse()
                    .map_err(|e| DigestError::Config(format!("email.to {addr:?}: {e}")))?,
            );
        }

        let mailer = match (
            std::env::var("SMTP_HOST"),
            std::env::var("SMTP_USER"),
            std::env::var("SMTP_PASS"),
        ) {
            (Ok(host), Ok(user), Ok(pass)) => {
                let creds = Credentials::new(user, pass);
                let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
                    .map_err(|e| DigestError::Config(format!("invalid SMTP_HOST: {e}")))?
                    .credentials(creds)
                    .timeout(Some(Duration::from_secs(30)))
                    .build();
                Some(mailer)
            }
            _ => None,
        };

        Ok(Self {
            mailer,
            from,
            to,
            subject_prefix: cfg.subject_prefix.clone(),
        })
    }
}

#[async_trait]
impl DeliverySink for EmailSink {
    async fn deliver(&self, digest: &Digest) -> Result<(), DigestError> {
        let Some(mailer) = &self.mailer else {
            return Err(DigestError::Sink {
                kind: "email",
                reason: "SMTP credentials not configured".to_string(),
                permanent: true,
            });
        };

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(digest.subject(&self.subject_prefix));
        for rcpt in &self.to {
            builder = builder.to(rcpt.clone());
        }
        let msg = builder
            .multipart(MultiPart::alternative_plain_html(
                digest.render_plain(),
                digest.render_html(),
            ))
            .map_err(|e| DigestError::Sink {
                kind: "email",
                reason: format!("build message: {e}"),
                permanent: true,
            })?;

        mailer.send(msg).await.map_err(|e| DigestError::Sink {
            kind: "email",
            reason: e.to_string(),
            permanent: e.is_permanent(),
        })?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "email"
    }
}
