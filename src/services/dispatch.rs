/// Periodic mailing dispatch: pick due mailings, throttle against the last
/// attempt, send, and append an attempt record per processed mailing.
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::models::attempt::AttemptOutcome;
use crate::models::mailing::Periodicity;
use crate::services::{attempt_service, mailing_service, message_service};
use crate::smtp::Mailer;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Re-send throttle. Whole-day granularity for the calendar periodicities:
/// 23h59m since the last attempt still counts as zero elapsed days.
pub fn should_skip(periodicity: Periodicity, elapsed: Duration) -> bool {
    match periodicity {
        Periodicity::Every5Minutes => elapsed.num_seconds() < 300,
        Periodicity::Daily => elapsed.num_days() < 1,
        Periodicity::Weekly => elapsed.num_days() < 7,
        Periodicity::Monthly => elapsed.num_days() < 30,
    }
}

pub struct Dispatcher {
    pool: SqlitePool,
    mailer: Arc<dyn Mailer>,
    retry_failed_after: Option<Duration>,
    // Serializes passes so a manual trigger cannot overlap a scheduled tick.
    pass_lock: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        pool: SqlitePool,
        mailer: Arc<dyn Mailer>,
        retry_failed_after_secs: Option<i64>,
    ) -> Self {
        Dispatcher {
            pool,
            mailer,
            retry_failed_after: retry_failed_after_secs.map(Duration::seconds),
            pass_lock: Mutex::new(()),
        }
    }

    pub async fn run(&self) -> Result<DispatchSummary> {
        self.run_once(Utc::now()).await
    }

    /// One dispatch pass at the given wall-clock instant.
    ///
    /// Transport failures are recorded as `failed` attempts and never abort
    /// the pass; a store error while enumerating candidates is fatal for the
    /// invocation and propagates to the caller. Not exactly-once: a crash
    /// between the send and the attempt insert loses the record.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<DispatchSummary> {
        let _guard = self.pass_lock.lock().await;
        let candidates = mailing_service::due_mailings(&self.pool, now).await?;

        let mut summary = DispatchSummary::default();
        for mailing in candidates {
            if let Some(last) = attempt_service::last_attempt(&self.pool, mailing.id).await? {
                let elapsed = now - last.attempted_at;
                let skip = match (last.outcome, self.retry_failed_after) {
                    // Configurable fast retry after a failed attempt; by
                    // default a failed attempt throttles like a success.
                    (AttemptOutcome::Failed, Some(window)) => elapsed < window,
                    _ => should_skip(mailing.periodicity, elapsed),
                };
                if skip {
                    summary.skipped += 1;
                    continue;
                }
            }

            let message = message_service::get(&self.pool, mailing.message_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("message {} missing", mailing.message_id))?;
            let recipients = mailing_service::client_emails(&self.pool, mailing.id).await?;

            // An empty client list is not an error: record the attempt with a
            // zero-recipient descriptor without touching the transport.
            let outcome = if recipients.is_empty() {
                Ok("0 recipients".to_string())
            } else {
                self.mailer
                    .send(&message.subject, &message.body, &recipients)
                    .await
            };

            match outcome {
                Ok(response) => {
                    attempt_service::record(
                        &self.pool,
                        mailing.id,
                        now,
                        AttemptOutcome::Success,
                        &response,
                    )
                    .await?;
                    summary.sent += 1;
                    tracing::info!(
                        mailing_id = mailing.id,
                        recipients = recipients.len(),
                        "mailing sent"
                    );
                }
                Err(e) => {
                    attempt_service::record(
                        &self.pool,
                        mailing.id,
                        now,
                        AttemptOutcome::Failed,
                        &e.to_string(),
                    )
                    .await?;
                    summary.failed += 1;
                    tracing::warn!(mailing_id = mailing.id, error = %e, "mailing send failed");
                }
            }
        }
        Ok(summary)
    }
}
