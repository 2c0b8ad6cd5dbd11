use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::message::{Message, MessageReq};

pub async fn create(pool: &SqlitePool, owner_id: i64, req: &MessageReq) -> Result<Message> {
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO messages (subject, body, owner_id, created_at)
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&req.subject)
    .bind(&req.body)
    .bind(owner_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(message)
}

pub async fn list(pool: &SqlitePool, owner: Option<i64>) -> Result<Vec<Message>> {
    let messages = match owner {
        Some(owner_id) => {
            sqlx::query_as::<_, Message>(
                "SELECT * FROM messages WHERE owner_id = ? ORDER BY created_at DESC",
            )
            .bind(owner_id)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Message>("SELECT * FROM messages ORDER BY created_at DESC")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(messages)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Message>> {
    let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(message)
}

pub async fn update(pool: &SqlitePool, id: i64, req: &MessageReq) -> Result<()> {
    sqlx::query("UPDATE messages SET subject = ?, body = ? WHERE id = ?")
        .bind(&req.subject)
        .bind(&req.body)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
