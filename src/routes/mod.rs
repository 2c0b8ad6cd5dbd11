use axum::Router;

use crate::AppState;

pub mod auth;
pub mod blog;
pub mod clients;
pub mod dispatch;
pub mod mailings;
pub mod manager;
pub mod messages;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(clients::router())
        .merge(messages::router())
        .merge(mailings::router())
        .merge(manager::router())
        .merge(blog::router())
        .merge(dispatch::router())
}
