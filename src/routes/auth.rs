use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::models::user::{AuthResponse, LoginReq, RegisterReq};
use crate::rbac::AuthUser;
use crate::services::auth_service;
use crate::AppState;

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> impl IntoResponse {
    match auth_service::register_user(&state.pool, &*state.mailer, &state.public_base_url, &req)
        .await
    {
        Ok(user) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "ok": true,
                "email": user.email,
                "role": user.role
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn login(State(state): State<AppState>, Json(req): Json<LoginReq>) -> impl IntoResponse {
    match auth_service::verify_user(&state.pool, &req.email, &req.password).await {
        Ok(Some(user)) if user.is_active => {
            // MVP bearer token: "id:role" (the extractor re-checks the store)
            let token = format!("{}:{}", user.id, user.role.as_str());
            (
                StatusCode::OK,
                Json(AuthResponse {
                    token,
                    email: user.email,
                    role: user.role,
                }),
            )
                .into_response()
        }
        Ok(Some(_)) => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"ok": false, "error": "Account is deactivated"})),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"ok": false, "error": "Invalid email or password"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
struct VerifyQuery {
    token: String,
}

async fn verify_email(
    State(state): State<AppState>,
    Query(q): Query<VerifyQuery>,
) -> impl IntoResponse {
    match auth_service::verify_email(&state.pool, &q.token).await {
        Ok(true) => Json(serde_json::json!({"ok": true})).into_response(),
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "Unknown or expired token"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn resend_verification(user: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    match auth_service::resend_verification(
        &state.pool,
        &*state.mailer,
        &state.public_base_url,
        user.id,
    )
    .await
    {
        Ok(()) => Json(serde_json::json!({"ok": true})).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify-email", get(verify_email))
        .route("/auth/resend-verification", post(resend_verification))
}
