use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::models::message::MessageReq;
use crate::rbac::{AuthUser, VerifiedUser};
use crate::services::message_service;
use crate::AppState;

async fn list_messages(user: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    let owner = if user.is_manager() { None } else { Some(user.id) };
    match message_service::list(&state.pool, owner).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn create_message(
    VerifiedUser(user): VerifiedUser,
    State(state): State<AppState>,
    Json(req): Json<MessageReq>,
) -> impl IntoResponse {
    match message_service::create(&state.pool, user.id, &req).await {
        Ok(message) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn get_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match message_service::get(&state.pool, id).await {
        Ok(Some(message)) if user.can_view(message.owner_id) => Json(message).into_response(),
        Ok(Some(_)) => StatusCode::FORBIDDEN.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn update_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MessageReq>,
) -> impl IntoResponse {
    match message_service::get(&state.pool, id).await {
        Ok(Some(message)) if user.can_edit(message.owner_id) => {
            match message_service::update(&state.pool, id, &req).await {
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

async fn delete_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match message_service::get(&state.pool, id).await {
        Ok(Some(message)) if user.can_edit(message.owner_id) => {
            match message_service::delete(&state.pool, id).await {
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

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages).post(create_message))
        .route(
            "/messages/:id",
            get(get_message).put(update_message).delete(delete_message),
        )
}
