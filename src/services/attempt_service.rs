use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::attempt::{AttemptOutcome, MailingAttempt};

/// Append one attempt record. Attempts are never updated or deleted.
pub async fn record(
    pool: &SqlitePool,
    mailing_id: i64,
    attempted_at: DateTime<Utc>,
    outcome: AttemptOutcome,
    server_response: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO mailing_attempts (mailing_id, attempted_at, outcome, server_response)
         VALUES (?, ?, ?, ?)",
    )
    .bind(mailing_id)
    .bind(attempted_at)
    .bind(outcome)
    .bind(server_response)
    .execute(pool)
    .await?;
    Ok(())
}

/// Most recent attempt for a mailing, by timestamp.
pub async fn last_attempt(pool: &SqlitePool, mailing_id: i64) -> Result<Option<MailingAttempt>> {
    let attempt = sqlx::query_as::<_, MailingAttempt>(
        "SELECT * FROM mailing_attempts WHERE mailing_id = ?
         ORDER BY attempted_at DESC, id DESC LIMIT 1",
    )
    .bind(mailing_id)
    .fetch_optional(pool)
    .await?;
    Ok(attempt)
}

pub async fn list_for_mailing(pool: &SqlitePool, mailing_id: i64) -> Result<Vec<MailingAttempt>> {
    let attempts = sqlx::query_as::<_, MailingAttempt>(
        "SELECT * FROM mailing_attempts WHERE mailing_id = ?
         ORDER BY attempted_at DESC, id DESC",
    )
    .bind(mailing_id)
    .fetch_all(pool)
    .await?;
    Ok(attempts)
}
