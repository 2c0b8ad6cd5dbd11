use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::models::user::User;

/// Typed role, resolved once per request from the user row rather than
/// looked up by group name on every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Member,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Manager => "manager",
        }
    }
}

/// Authenticated caller. Token format is the MVP "user_id:role" bearer token;
/// the id is looked up in the store so role/active/verified flags are always
/// the current ones, not whatever the client echoed back.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
}

impl AuthUser {
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    /// Owners act on their own rows; managers may additionally view.
    pub fn can_view(&self, owner_id: i64) -> bool {
        self.id == owner_id || self.is_manager()
    }

    pub fn can_edit(&self, owner_id: i64) -> bool {
        self.id == owner_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_start_matches("Bearer ").trim())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing or invalid token"))?;

        let id: i64 = token
            .split(':')
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing or invalid token"))?;

        let pool = SqlitePool::from_ref(state);
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "User lookup failed"))?
            .ok_or((StatusCode::UNAUTHORIZED, "Unknown user"))?;

        if !user.is_active {
            return Err((StatusCode::FORBIDDEN, "Account is deactivated"));
        }

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
        })
    }
}

/// Caller with a confirmed email address. Content creation is gated on this.
pub struct VerifiedUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for VerifiedUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.is_verified {
            Ok(VerifiedUser(user))
        } else {
            Err((StatusCode::FORBIDDEN, "Email address not verified"))
        }
    }
}

pub struct ManagerUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for ManagerUser
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.is_manager() {
            Ok(ManagerUser(user))
        } else {
            Err((StatusCode::FORBIDDEN, "Manager rights required"))
        }
    }
}
