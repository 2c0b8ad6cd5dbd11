use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::models::client::ClientReq;
use crate::rbac::{AuthUser, VerifiedUser};
use crate::services::client_service;
use crate::AppState;

async fn list_clients(user: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    let owner = if user.is_manager() { None } else { Some(user.id) };
    match client_service::list(&state.pool, owner).await {
        Ok(clients) => Json(clients).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn create_client(
    VerifiedUser(user): VerifiedUser,
    State(state): State<AppState>,
    Json(req): Json<ClientReq>,
) -> impl IntoResponse {
    match client_service::create(&state.pool, user.id, &req).await {
        Ok(client) => (StatusCode::CREATED, Json(client)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn get_client(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match client_service::get(&state.pool, id).await {
        Ok(Some(client)) if user.can_view(client.owner_id) => Json(client).into_response(),
        Ok(Some(_)) => StatusCode::FORBIDDEN.into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn update_client(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ClientReq>,
) -> impl IntoResponse {
    match client_service::get(&state.pool, id).await {
        Ok(Some(client)) if user.can_edit(client.owner_id) => {
            match client_service::update(&state.pool, id, &req).await {
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

async fn delete_client(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match client_service::get(&state.pool, id).await {
        Ok(Some(client)) if user.can_edit(client.owner_id) => {
            match client_service::delete(&state.pool, id).await {
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
        .route("/clients", get(list_clients).post(create_client))
        .route(
            "/clients/:id",
            get(get_client).put(update_client).delete(delete_client),
        )
}
