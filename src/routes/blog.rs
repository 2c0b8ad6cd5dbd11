use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::models::blog_post::BlogPostReq;
use crate::rbac::AuthUser;
use crate::services::blog_service;
use crate::AppState;

#[derive(Deserialize)]
struct PageQuery {
    page: Option<i64>,
    per_page: Option<i64>,
}

/// Public list of published posts. Responses are served from the TTL cache;
/// a hit does not touch the store at all.
async fn list_posts(State(state): State<AppState>, Query(q): Query<PageQuery>) -> impl IntoResponse {
    let page = q.page.unwrap_or(1).max(1);
    let per_page = q.per_page.unwrap_or(10).clamp(1, 100);
    let key = format!("list:{}:{}", page, per_page);

    if let Some(cached) = state.blog_cache.get(&key) {
        return Json(cached).into_response();
    }

    match blog_service::list_published(&state.pool, page, per_page).await {
        Ok(posts) => {
            let value = serde_json::to_value(&posts).unwrap_or_default();
            state.blog_cache.put(key, value.clone());
            Json(value).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Public detail view. The view counter only moves on a cache miss: while the
/// cached copy is fresh, repeat reads do not bump it.
async fn get_post(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let key = format!("post:{}", id);

    if let Some(cached) = state.blog_cache.get(&key) {
        return Json(cached).into_response();
    }

    match blog_service::get_and_count_view(&state.pool, id).await {
        Ok(Some(post)) => {
            let value = serde_json::to_value(&post).unwrap_or_default();
            state.blog_cache.put(key, value.clone());
            Json(value).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<BlogPostReq>,
) -> impl IntoResponse {
    match blog_service::create(&state.pool, user.id, &req).await {
        Ok(post) => {
            state.blog_cache.clear();
            (StatusCode::CREATED, Json(post)).into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<BlogPostReq>,
) -> impl IntoResponse {
    match blog_service::get(&state.pool, id).await {
        Ok(Some(post)) if user.can_edit(post.author_id) => {
            match blog_service::update(&state.pool, id, &req).await {
                Ok(()) => {
                    state.blog_cache.clear();
                    StatusCode::OK.into_response()
                }
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

async fn publish_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match blog_service::get(&state.pool, id).await {
        Ok(Some(post)) if user.can_view(post.author_id) => {
            match blog_service::publish(&state.pool, id).await {
                Ok(()) => {
                    state.blog_cache.clear();
                    Json(serde_json::json!({"ok": true})).into_response()
                }
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

async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match blog_service::get(&state.pool, id).await {
        Ok(Some(post)) if user.can_edit(post.author_id) => {
            match blog_service::delete(&state.pool, id).await {
                Ok(()) => {
                    state.blog_cache.clear();
                    StatusCode::OK.into_response()
                }
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
        .route("/blog", get(list_posts).post(create_post))
        .route(
            "/blog/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/blog/:id/publish", post(publish_post))
}
