use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::models::mailing::MailingStatus;
use crate::rbac::ManagerUser;
use crate::services::{auth_service, mailing_service};
use crate::AppState;

async fn list_all_mailings(
    _manager: ManagerUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match mailing_service::list(&state.pool, None).await {
        Ok(mailings) => Json(mailings).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Managers flip a mailing between active and completed without editing it.
/// A closed mailing stays closed; only its owner decided that.
async fn toggle_mailing(
    _manager: ManagerUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match mailing_service::get(&state.pool, id).await {
        Ok(Some(mailing)) => {
            let next = match mailing.status {
                MailingStatus::Closed => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({"ok": false, "error": "Mailing is closed"})),
                    )
                        .into_response();
                }
                MailingStatus::Completed => MailingStatus::Created,
                MailingStatus::Created | MailingStatus::Started => MailingStatus::Completed,
            };
            match mailing_service::set_status(&state.pool, id, next).await {
                Ok(()) => Json(serde_json::json!({"ok": true, "status": next.as_str()}))
                    .into_response(),
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"ok": false, "error": e.to_string()})),
                )
                    .into_response(),
            }
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn list_users(_manager: ManagerUser, State(state): State<AppState>) -> impl IntoResponse {
    match auth_service::list_users(&state.pool).await {
        Ok(users) => Json(users).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn toggle_user(
    manager: ManagerUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    if manager.0.id == id {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "Cannot deactivate yourself"})),
        )
            .into_response();
    }
    match auth_service::get_user(&state.pool, id).await {
        Ok(Some(user)) => {
            match auth_service::set_active(&state.pool, id, !user.is_active).await {
                Ok(()) => Json(serde_json::json!({"ok": true, "is_active": !user.is_active}))
                    .into_response(),
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"ok": false, "error": e.to_string()})),
                )
                    .into_response(),
            }
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/manager/mailings", get(list_all_mailings))
        .route("/manager/mailings/:id/toggle", post(toggle_mailing))
        .route("/manager/users", get(list_users))
        .route("/manager/users/:id/toggle", post(toggle_user))
}
