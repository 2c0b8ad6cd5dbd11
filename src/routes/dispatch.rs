use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};

use crate::rbac::ManagerUser;
use crate::AppState;

/// Manual dispatch trigger, the counterpart of running one scheduled pass by
/// hand. Shares the pass lock with the scheduler, so the two never overlap.
async fn run_dispatch(_manager: ManagerUser, State(state): State<AppState>) -> impl IntoResponse {
    match state.dispatcher.run().await {
        Ok(summary) => Json(serde_json::json!({
            "ok": true,
            "sent": summary.sent,
            "skipped": summary.skipped,
            "failed": summary.failed
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        )
            .into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dispatch/run", post(run_dispatch))
}
