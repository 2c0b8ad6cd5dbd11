use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failed,
}

/// One dispatch outcome for a mailing. Rows are append-only: the dispatch
/// loop inserts them and nothing ever updates or deletes them, so the table
/// is a durable audit trail ordered by `attempted_at`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MailingAttempt {
    pub id: i64,
    pub mailing_id: i64,
    pub attempted_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    pub server_response: Option<String>,
}
