use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A mailing-list recipient owned by one user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientReq {
    pub email: String,
    pub full_name: String,
    pub comment: Option<String>,
}
