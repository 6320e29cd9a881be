//! Mining routes — declared tabs that are not implemented yet.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/logs/{id}/dfg — placeholder
pub async fn dfg(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Value>> {
    state.session(id)?;
    Ok(Json(json!({
        "view": "directly_follows_graph",
        "status": "planned",
        "message": "Coming soon...",
    })))
}

/// GET /api/logs/{id}/inductive — placeholder
pub async fn inductive(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    state.session(id)?;
    Ok(Json(json!({
        "view": "inductive_miner",
        "status": "planned",
        "message": "Coming soon...",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::upload::ingest;
    use crate::config::DashboardConfig;
    use crate::error::ApiError;

    #[tokio::test]
    async fn test_placeholders_require_a_session() {
        let state = AppState::new(DashboardConfig::default());
        let err = dfg(State(state), Path(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, ApiError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_placeholders_report_planned_status() {
        let state = AppState::new(DashboardConfig::default());
        let uploaded = ingest(&state, "events.csv".into(), b"case,activity\n1,A\n").unwrap();
        let body = inductive(State(state), Path(uploaded.session_id))
            .await
            .unwrap()
            .0;
        assert_eq!(body["status"], "planned");
    }
}
