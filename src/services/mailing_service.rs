/// Mailing CRUD plus the queries the dispatch loop runs against the store.
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::mailing::{Mailing, MailingReq, MailingStatus};

pub async fn create(pool: &SqlitePool, owner_id: i64, req: &MailingReq) -> Result<Mailing> {
    check_clients_owned(pool, owner_id, &req.client_ids).await?;
    check_message_owned(pool, owner_id, req.message_id).await?;

    let now = Utc::now();
    let status = req.status.unwrap_or(MailingStatus::Created);
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO mailings (start_at, periodicity, status, message_id, owner_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(req.start_at)
    .bind(req.periodicity)
    .bind(status)
    .bind(req.message_id)
    .bind(owner_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    set_clients(pool, id, &req.client_ids).await?;

    let mailing = sqlx::query_as::<_, Mailing>("SELECT * FROM mailings WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(mailing)
}

pub async fn list(pool: &SqlitePool, owner: Option<i64>) -> Result<Vec<Mailing>> {
    let mailings = match owner {
        Some(owner_id) => {
            sqlx::query_as::<_, Mailing>(
                "SELECT * FROM mailings WHERE owner_id = ? ORDER BY created_at DESC",
            )
            .bind(owner_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Mailing>("SELECT * FROM mailings ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(mailings)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Mailing>> {
    let mailing = sqlx::query_as::<_, Mailing>("SELECT * FROM mailings WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(mailing)
}

pub async fn update(pool: &SqlitePool, owner_id: i64, id: i64, req: &MailingReq) -> Result<()> {
    check_clients_owned(pool, owner_id, &req.client_ids).await?;
    check_message_owned(pool, owner_id, req.message_id).await?;

    // Omitting status leaves the current one in place.
    sqlx::query(
        "UPDATE mailings SET start_at = ?, periodicity = ?, status = COALESCE(?, status),
         message_id = ? WHERE id = ?",
    )
    .bind(req.start_at)
    .bind(req.periodicity)
    .bind(req.status)
    .bind(req.message_id)
    .bind(id)
    .execute(pool)
    .await?;

    sqlx::query("DELETE FROM mailing_clients WHERE mailing_id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    set_clients(pool, id, &req.client_ids).await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM mailings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Owner/manager-driven status transition. The dispatch loop never calls this.
pub async fn set_status(pool: &SqlitePool, id: i64, status: MailingStatus) -> Result<()> {
    sqlx::query("UPDATE mailings SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Candidate selection: due (start_at has passed) and still active. Mailings
/// in `completed` or `closed` are never returned, regardless of timing.
pub async fn due_mailings(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Vec<Mailing>> {
    let mailings = sqlx::query_as::<_, Mailing>(
        "SELECT * FROM mailings
         WHERE start_at <= ? AND status IN ('created', 'started')
         ORDER BY id",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(mailings)
}

pub async fn client_emails(pool: &SqlitePool, mailing_id: i64) -> Result<Vec<String>> {
    let emails = sqlx::query_scalar::<_, String>(
        "SELECT c.email FROM clients c
         JOIN mailing_clients mc ON mc.client_id = c.id
         WHERE mc.mailing_id = ? ORDER BY c.id",
    )
    .bind(mailing_id)
    .fetch_all(pool)
    .await?;
    Ok(emails)
}

pub async fn client_ids(pool: &SqlitePool, mailing_id: i64) -> Result<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "SELECT client_id FROM mailing_clients WHERE mailing_id = ? ORDER BY client_id",
    )
    .bind(mailing_id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

async fn set_clients(pool: &SqlitePool, mailing_id: i64, client_ids: &[i64]) -> Result<()> {
    for client_id in client_ids {
        sqlx::query("INSERT OR IGNORE INTO mailing_clients (mailing_id, client_id) VALUES (?, ?)")
            .bind(mailing_id)
            .bind(client_id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// A mailing may only carry a message belonging to the same owner.
async fn check_message_owned(pool: &SqlitePool, owner_id: i64, message_id: i64) -> Result<()> {
    let owner = sqlx::query_scalar::<_, i64>("SELECT owner_id FROM messages WHERE id = ?")
        .bind(message_id)
        .fetch_optional(pool)
        .await?;
    if owner != Some(owner_id) {
        anyhow::bail!("Message {} not found or not owned by caller", message_id);
    }
    Ok(())
}

/// A mailing may only reference clients belonging to the same owner.
async fn check_clients_owned(pool: &SqlitePool, owner_id: i64, client_ids: &[i64]) -> Result<()> {
    for client_id in client_ids {
        let owner = sqlx::query_scalar::<_, i64>("SELECT owner_id FROM clients WHERE id = ?")
            .bind(client_id)
            .fetch_optional(pool)
            .await?;
        if owner != Some(owner_id) {
            anyhow::bail!("Client {} not found or not owned by caller", client_id);
        }
    }
    Ok(())
}
