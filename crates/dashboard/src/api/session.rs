//! Session routes — metadata, column confirmation, sidebar filter options.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use engine::ColumnMap;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
    pub rows: usize,
    pub columns: Vec<String>,
    pub column_map: ColumnMap,
    pub essential_missing: bool,
}

/// GET /api/logs/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionInfo>> {
    let session = state.session(id)?;
    let column_map = session.column_map();
    Ok(Json(SessionInfo {
        session_id: session.id,
        file_name: session.file_name.clone(),
        uploaded_at: session.uploaded_at,
        rows: session.table.len(),
        columns: session.table.columns().to_vec(),
        essential_missing: !column_map.has_essential(),
        column_map,
    }))
}

/// DELETE /api/logs/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.sessions.remove(id) {
        return Err(ApiError::SessionNotFound(id));
    }
    info!(session = %id, "session deleted");
    Ok(Json(json!({ "status": "deleted", "session_id": id })))
}

/// PUT /api/logs/{id}/columns — the interactive column-confirmation step.
///
/// Every bound role must name an existing column; absent roles stay
/// unbound (timestamp/resource absence is a feature degradation, not an
/// error).
pub async fn update_columns(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(map): Json<ColumnMap>,
) -> ApiResult<Json<SessionInfo>> {
    let session = state.session(id)?;

    let bindings = [
        ("case_id", map.case_id.as_deref()),
        ("activity", map.activity.as_deref()),
        ("timestamp", map.timestamp.as_deref()),
        ("resource", map.resource.as_deref()),
    ];
    for (role, column) in bindings {
        if let Some(column) = column {
            if session.table.column_index(column).is_none() {
                return Err(ApiError::InvalidRequest(format!(
                    "Cannot bind {} to unknown column '{}'",
                    role, column
                )));
            }
        }
    }

    session.set_column_map(map);
    info!(session = %id, "column map confirmed");
    get_session(State(state), Path(id)).await
}

#[derive(Debug, Serialize)]
pub struct FilterOptions {
    /// Distinct activities, the choices for start/end event and the
    /// activity allow-list.
    pub activities: Vec<String>,
    /// Distinct resources; empty when no resource column is bound.
    pub resources: Vec<String>,
    /// Every column, for the display-column picker.
    pub columns: Vec<String>,
}

/// GET /api/logs/{id}/filters — choices for the sidebar controls
pub async fn filter_options(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<FilterOptions>> {
    let session = state.session(id)?;
    let map = session.column_map();

    let activities = match map.activity.as_deref() {
        Some(column) => session.table.distinct_values(column).unwrap_or_default(),
        None => Vec::new(),
    };
    let resources = match map.resource.as_deref() {
        Some(column) => session.table.distinct_values(column).unwrap_or_default(),
        None => Vec::new(),
    };

    Ok(Json(FilterOptions {
        activities,
        resources,
        columns: session.table.columns().to_vec(),
    }))
}
