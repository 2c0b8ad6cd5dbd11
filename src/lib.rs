use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;

pub mod config;
pub mod db;
pub mod models;
pub mod rbac;
pub mod routes;
pub mod services;
pub mod smtp;

use services::blog_cache::BlogCache;
use services::dispatch::Dispatcher;
use smtp::Mailer;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub mailer: Arc<dyn Mailer>,
    pub dispatcher: Arc<Dispatcher>,
    pub blog_cache: Arc<BlogCache>,
    pub public_base_url: String,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(routes::routes())
        .with_state(state)
}
