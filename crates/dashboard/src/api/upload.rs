//! Upload route — accepts a log file and opens a session around it.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use engine::{detect, loader, ColumnMap};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub session_id: Uuid,
    pub file_name: String,
    pub rows: usize,
    pub columns: Vec<String>,
    /// Detector's best guess; the client may confirm or override it via
    /// `PUT /api/logs/{id}/columns` before rendering.
    pub detected: ColumnMap,
    /// True when no case or activity column was found — rendering is
    /// refused until the bindings are fixed.
    pub essential_missing: bool,
}

/// POST /api/logs — multipart upload of a .csv or .xes file
pub async fn upload_log(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to read upload: {}", e)))?;

        let response = ingest(&state, file_name, &bytes)?;
        return Ok((StatusCode::CREATED, Json(response)));
    }

    Err(ApiError::InvalidRequest(
        "Multipart body must contain a file field".to_string(),
    ))
}

/// Parse the upload, detect columns, and open a session.
///
/// Loader errors are logged with full detail here; the client only ever
/// sees the generic invalid-format message.
pub(crate) fn ingest(state: &AppState, file_name: String, bytes: &[u8]) -> ApiResult<UploadResponse> {
    let table = loader::load_log(&file_name, bytes).map_err(|e| {
        warn!(file = %file_name, error = %e, "rejected upload");
        ApiError::InvalidFormat
    })?;

    let detected = detect::detect_columns(table.columns());
    let essential_missing = !detected.has_essential();
    if essential_missing {
        warn!(file = %file_name, "no case/activity column detected");
    }

    let columns = table.columns().to_vec();
    let rows = table.len();
    let session = state.sessions.insert(file_name, table, detected.clone());
    info!(session = %session.id, file = %session.file_name, rows, "log uploaded");

    Ok(UploadResponse {
        session_id: session.id,
        file_name: session.file_name.clone(),
        rows,
        columns,
        detected,
        essential_missing,
    })
}
