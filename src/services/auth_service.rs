use anyhow::Result;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::user::{RegisterReq, User};
use crate::rbac::Role;
use crate::smtp::Mailer;

/// Register a user and send the verification email. The account exists even
/// if the email cannot be delivered; verification can be re-sent later.
pub async fn register_user(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    base_url: &str,
    req: &RegisterReq,
) -> Result<User> {
    if !req.email.contains('@') {
        anyhow::bail!("Invalid email address: {}", req.email);
    }
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        anyhow::bail!("Account already exists: {}", req.email);
    }

    let password_hash = hash(&req.password, DEFAULT_COST)?;
    let token = Uuid::new_v4().to_string();
    let now = Utc::now();

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, password_hash, role, is_active, is_verified, verification_token, created_at)
         VALUES (?, ?, ?, 1, 0, ?, ?) RETURNING id",
    )
    .bind(&req.email)
    .bind(&password_hash)
    .bind(Role::Member)
    .bind(&token)
    .bind(now)
    .fetch_one(pool)
    .await?;

    send_verification_email(mailer, base_url, &req.email, &token).await;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(user)
}

pub async fn verify_user(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<Option<User>> {
    let user_opt = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if let Some(user) = user_opt {
        if verify(password, &user.password_hash)? {
            return Ok(Some(user));
        }
    }
    Ok(None)
}

/// Confirm an email address by token. Returns false for unknown tokens.
pub async fn verify_email(pool: &SqlitePool, token: &str) -> Result<bool> {
    let updated = sqlx::query(
        "UPDATE users SET is_verified = 1, verification_token = NULL
         WHERE verification_token = ?",
    )
    .bind(token)
    .execute(pool)
    .await?;
    Ok(updated.rows_affected() > 0)
}

/// Issue a fresh token and re-send the verification email.
pub async fn resend_verification(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    base_url: &str,
    user_id: i64,
) -> Result<()> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if user.is_verified {
        anyhow::bail!("Email already verified");
    }

    let token = Uuid::new_v4().to_string();
    sqlx::query("UPDATE users SET verification_token = ? WHERE id = ?")
        .bind(&token)
        .bind(user_id)
        .execute(pool)
        .await?;

    send_verification_email(mailer, base_url, &user.email, &token).await;
    Ok(())
}

pub async fn set_active(pool: &SqlitePool, user_id: i64, active: bool) -> Result<()> {
    sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
        .bind(active)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await?;
    Ok(users)
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

async fn send_verification_email(mailer: &dyn Mailer, base_url: &str, email: &str, token: &str) {
    let link = format!("{}/auth/verify-email?token={}", base_url, token);
    let body = format!(
        "Welcome to mailpost.\n\nPlease confirm your email address by opening:\n{}\n",
        link
    );
    if let Err(e) = mailer
        .send("Confirm your email", &body, &[email.to_string()])
        .await
    {
        tracing::warn!(email = %email, error = %e, "verification email failed");
    }
}
