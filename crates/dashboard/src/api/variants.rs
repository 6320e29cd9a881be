//! Variants route — the variants explorer with its coverage control.

use axum::extract::{Path, Query, State};
use axum::Json;
use engine::variants::{self, Variant};
use engine::filter;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::api::map::FilterQuery;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VariantsResponse {
    pub coverage_percent: u8,
    /// Distinct variant count of the filtered log; absent when the view
    /// failed to render.
    pub total_variants: Option<usize>,
    pub variants: Vec<Variant>,
    /// Set when the filtered log produced zero variants — an explicit
    /// signal, not an error.
    pub message: Option<String>,
}

/// GET /api/logs/{id}/variants
pub async fn variants(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<VariantsResponse>> {
    let session = state.session(id)?;
    let column_map = session.column_map();
    if !column_map.has_essential() {
        return Err(ApiError::MissingColumns);
    }

    let coverage = query
        .coverage
        .unwrap_or(state.config.sessions.default_coverage_percent)
        .clamp(1, 100);
    let selection = query.to_selection();

    let empty_view = |message| VariantsResponse {
        coverage_percent: coverage,
        total_variants: None,
        variants: Vec::new(),
        message,
    };

    let filtered = match filter::apply_filters(&session.table, &column_map, &selection) {
        Ok(table) => table,
        Err(e) => {
            warn!(session = %id, error = %e, "filtering failed");
            return Ok(Json(empty_view(None)));
        }
    };

    let all = match variants::extract_variants(&filtered, &column_map) {
        Ok(variants) => variants,
        Err(e) => {
            warn!(session = %id, error = %e, "variant extraction failed");
            return Ok(Json(empty_view(None)));
        }
    };

    if all.is_empty() {
        return Ok(Json(VariantsResponse {
            coverage_percent: coverage,
            total_variants: Some(0),
            variants: Vec::new(),
            message: Some("No variants found.".to_string()),
        }));
    }

    let top = variants::top_by_coverage(&all, coverage).to_vec();
    Ok(Json(VariantsResponse {
        coverage_percent: coverage,
        total_variants: Some(all.len()),
        variants: top,
        message: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::upload::ingest;
    use crate::config::DashboardConfig;

    const CSV: &[u8] = b"case,activity\n1,A\n1,B\n1,C\n2,A\n2,C\n3,A\n3,B\n3,C\n";

    fn state_with_log() -> (AppState, Uuid) {
        let state = AppState::new(DashboardConfig::default());
        let response = ingest(&state, "events.csv".into(), CSV).unwrap();
        (state, response.session_id)
    }

    #[tokio::test]
    async fn test_variants_with_full_coverage() {
        let (state, id) = state_with_log();
        let query = FilterQuery {
            coverage: Some(100),
            ..Default::default()
        };
        let response = variants(State(state), Path(id), Query(query))
            .await
            .unwrap()
            .0;

        assert_eq!(response.total_variants, Some(2));
        assert_eq!(response.variants.len(), 2);
        assert_eq!(response.variants[0].activities, vec!["A", "B", "C"]);
        assert_eq!(response.variants[0].case_count, 2);
        assert_eq!(response.variants[1].case_count, 1);
        assert_eq!(response.message, None);
    }

    #[tokio::test]
    async fn test_low_coverage_can_surface_nothing() {
        let (state, id) = state_with_log();
        let query = FilterQuery {
            coverage: Some(10),
            ..Default::default()
        };
        let response = variants(State(state), Path(id), Query(query))
            .await
            .unwrap()
            .0;
        // floor(2 * 10 / 100) == 0 — empty slice, still a success
        assert_eq!(response.total_variants, Some(2));
        assert!(response.variants.is_empty());
    }

    #[tokio::test]
    async fn test_filtered_to_nothing_reports_no_variants() {
        let (state, id) = state_with_log();
        let query = FilterQuery {
            start_event: Some("Z".into()),
            ..Default::default()
        };
        let response = variants(State(state), Path(id), Query(query))
            .await
            .unwrap()
            .0;
        assert_eq!(response.total_variants, Some(0));
        assert_eq!(response.message.as_deref(), Some("No variants found."));
    }
}
