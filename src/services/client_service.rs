/// Client (recipient) management service
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::client::{Client, ClientReq};

pub async fn create(pool: &SqlitePool, owner_id: i64, req: &ClientReq) -> Result<Client> {
    if !req.email.contains('@') {
        anyhow::bail!("Invalid email address: {}", req.email);
    }
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO clients (email, full_name, comment, owner_id, created_at)
         VALUES (?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&req.email)
    .bind(&req.full_name)
    .bind(&req.comment)
    .bind(owner_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(client)
}

/// List clients. `owner` = None lists everything (manager view).
pub async fn list(pool: &SqlitePool, owner: Option<i64>) -> Result<Vec<Client>> {
    let clients = match owner {
        Some(owner_id) => {
            sqlx::query_as::<_, Client>(
                "SELECT * FROM clients WHERE owner_id = ? ORDER BY created_at DESC",
            )
            .bind(owner_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(clients)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Client>> {
    let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(client)
}

pub async fn update(pool: &SqlitePool, id: i64, req: &ClientReq) -> Result<()> {
    if !req.email.contains('@') {
        anyhow::bail!("Invalid email address: {}", req.email);
    }
    sqlx::query("UPDATE clients SET email = ?, full_name = ?, comment = ? WHERE id = ?")
        .bind(&req.email)
        .bind(&req.full_name)
        .bind(&req.comment)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM clients WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
