use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::models::mailing::{MailingReq, MailingStatus};
use crate::rbac::{AuthUser, VerifiedUser};
use crate::services::{attempt_service, mailing_service};
use crate::AppState;

async fn list_mailings(user: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    let owner = if user.is_manager() { None } else { Some(user.id) };
    match mailing_service::list(&state.pool, owner).await {
        Ok(mailings) => Json(mailings).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn create_mailing(
    VerifiedUser(user): VerifiedUser,
    State(state): State<AppState>,
    Json(req): Json<MailingReq>,
) -> impl IntoResponse {
    match mailing_service::create(&state.pool, user.id, &req).await {
        Ok(mailing) => (StatusCode::CREATED, Json(mailing)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn get_mailing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match mailing_service::get(&state.pool, id).await {
        Ok(Some(mailing)) if user.can_view(mailing.owner_id) => {
            let client_ids = mailing_service::client_ids(&state.pool, id)
                .await
                .unwrap_or_default();
            Json(serde_json::json!({
                "mailing": mailing,
                "client_ids": client_ids
            }))
            .into_response()
        }
        Ok(Some(_)) => StatusCode::FORBIDDEN.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn update_mailing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MailingReq>,
) -> impl IntoResponse {
    match mailing_service::get(&state.pool, id).await {
        Ok(Some(mailing)) if user.can_edit(mailing.owner_id) => {
            match mailing_service::update(&state.pool, user.id, id, &req).await {
                Ok(()) => StatusCode::OK.into_response(),
                Err(e) => (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"ok": false, "error": e.to_string()})),
                )
                    .into_response(),
            }
        }
        Ok(Some(_)) => StatusCode::FORBIDDEN.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn delete_mailing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match mailing_service::get(&state.pool, id).await {
        Ok(Some(mailing)) if user.can_edit(mailing.owner_id) => {
            match mailing_service::delete(&state.pool, id).await {
                Ok(()) => StatusCode::OK.into_response(),
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"ok": false, "error": e.to_string()})),
                )
                    .into_response(),
            }
        }
        Ok(Some(_)) => StatusCode::FORBIDDEN.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Owner or manager closes a mailing; dispatch will never pick it up again.
async fn close_mailing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match mailing_service::get(&state.pool, id).await {
        Ok(Some(mailing)) if user.can_view(mailing.owner_id) => {
            match mailing_service::set_status(&state.pool, id, MailingStatus::Closed).await {
                Ok(()) => Json(serde_json::json!({"ok": true, "status": "closed"})).into_response(),
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"ok": false, "error": e.to_string()})),
                )
                    .into_response(),
            }
        }
        Ok(Some(_)) => StatusCode::FORBIDDEN.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Read-only attempt log, newest first.
async fn mailing_attempts(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match mailing_service::get(&state.pool, id).await {
        Ok(Some(mailing)) if user.can_view(mailing.owner_id) => {
            match attempt_service::list_for_mailing(&state.pool, id).await {
                Ok(attempts) => Json(attempts).into_response(),
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"ok": false, "error": e.to_string()})),
                )
                    .into_response(),
            }
        }
        Ok(Some(_)) => StatusCode::FORBIDDEN.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Original "send test email to yourself" helper.
async fn send_test_email(
    VerifiedUser(user): VerifiedUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state
        .mailer
        .send(
            "mailpost test email",
            "This is a test email from mailpost.",
            &[user.email.clone()],
        )
        .await
    {
        Ok(response) => Json(serde_json::json!({"ok": true, "response": response})).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mailings", get(list_mailings).post(create_mailing))
        .route(
            "/mailings/:id",
            get(get_mailing).put(update_mailing).delete(delete_mailing),
        )
        .route("/mailings/:id/close", post(close_mailing))
        .route("/mailings/:id/attempts", get(mailing_attempts))
        .route("/send-test-email", post(send_test_email))
}
