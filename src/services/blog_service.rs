use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::blog_post::{BlogPost, BlogPostReq};

/// Published posts only, newest publication first.
pub async fn list_published(
    pool: &SqlitePool,
    page: i64,
    per_page: i64,
) -> Result<Vec<BlogPost>> {
    let offset = (page.max(1) - 1) * per_page;
    let posts = sqlx::query_as::<_, BlogPost>(
        "SELECT * FROM blog_posts WHERE published_at IS NOT NULL
         ORDER BY published_at DESC LIMIT ? OFFSET ?",
    )
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(posts)
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<BlogPost>> {
    let post = sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(post)
}

/// Detail read: bump the view counter, return the fresh row.
pub async fn get_and_count_view(pool: &SqlitePool, id: i64) -> Result<Option<BlogPost>> {
    let updated = sqlx::query("UPDATE blog_posts SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }
    get(pool, id).await
}

pub async fn create(pool: &SqlitePool, author_id: i64, req: &BlogPostReq) -> Result<BlogPost> {
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO blog_posts (title, content, views, created_at, author_id)
         VALUES (?, ?, 0, ?, ?) RETURNING id",
    )
    .bind(&req.title)
    .bind(&req.content)
    .bind(now)
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    let post = sqlx::query_as::<_, BlogPost>("SELECT * FROM blog_posts WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(post)
}

pub async fn update(pool: &SqlitePool, id: i64, req: &BlogPostReq) -> Result<()> {
    sqlx::query("UPDATE blog_posts SET title = ?, content = ? WHERE id = ?")
        .bind(&req.title)
        .bind(&req.content)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn publish(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE blog_posts SET published_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM blog_posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
