use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Minimum interval between successive sends of a mailing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Periodicity {
    #[serde(rename = "every_5_minutes")]
    #[sqlx(rename = "every_5_minutes")]
    Every5Minutes,
    Daily,
    Weekly,
    Monthly,
}

/// Lifecycle of a mailing. Dispatch reads this but never writes it;
/// transitions are owner/manager actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MailingStatus {
    Created,
    Started,
    Completed,
    Closed,
}

impl MailingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Closed => "closed",
        }
    }
}

/// A scheduled, recurring campaign: one message fanned out to a set of clients.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Mailing {
    pub id: i64,
    pub start_at: DateTime<Utc>,
    pub periodicity: Periodicity,
    pub status: MailingStatus,
    pub message_id: i64,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailingReq {
    pub start_at: DateTime<Utc>,
    pub periodicity: Periodicity,
    pub status: Option<MailingStatus>,
    pub message_id: i64,
    #[serde(default)]
    pub client_ids: Vec<i64>,
}
