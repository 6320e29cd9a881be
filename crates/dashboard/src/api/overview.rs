//! Overview route — preview, statistics, and distributions in one pass.
//!
//! Each sub-view is computed independently: a failure in one nulls that
//! section (and logs a warning) without touching its siblings.

use axum::extract::{Path, Query, State};
use axum::Json;
use engine::distribution::{self, Distribution};
use engine::{filter, stats, EventTable};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::api::map::{self, FilterQuery, MetricRow, PreviewDto};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    /// Row count after filtering, before the preview cap.
    pub filtered_events: usize,
    pub preview: Option<PreviewDto>,
    pub statistics: Option<Vec<MetricRow>>,
    pub distributions: Distributions,
}

#[derive(Debug, Serialize)]
pub struct Distributions {
    pub activity: Option<DistributionSection>,
    pub resource: Option<DistributionSection>,
}

/// One chart's data. `no_data` marks a column that exists but is
/// entirely null — distinct from a failed (absent) section.
#[derive(Debug, Serialize)]
pub struct DistributionSection {
    pub column: String,
    pub buckets: Vec<distribution::Bucket>,
    pub no_data: bool,
}

/// GET /api/logs/{id}/overview
pub async fn overview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<OverviewResponse>> {
    let session = state.session(id)?;
    let column_map = session.column_map();
    if !column_map.has_essential() {
        return Err(ApiError::MissingColumns);
    }

    let selection = query.to_selection();
    let filtered = match filter::apply_filters(&session.table, &column_map, &selection) {
        Ok(table) => table,
        Err(e) => {
            // Filter failure renders nothing but never kills the session.
            warn!(session = %id, error = %e, "filtering failed");
            return Ok(Json(OverviewResponse {
                filtered_events: 0,
                preview: None,
                statistics: None,
                distributions: Distributions {
                    activity: None,
                    resource: None,
                },
            }));
        }
    };

    let preview = match map::preview(
        &filtered,
        &selection.columns,
        state.config.sessions.preview_rows,
    ) {
        Ok(dto) => Some(dto),
        Err(e) => {
            warn!(session = %id, error = %e, "preview failed");
            None
        }
    };

    let statistics = match stats::summarize(&filtered, &column_map) {
        Ok(stats) => Some(map::statistic_rows(&stats)),
        Err(e) => {
            warn!(session = %id, error = %e, "statistics failed");
            None
        }
    };

    let distributions = Distributions {
        activity: distribution_section(&filtered, column_map.activity.as_deref(), id),
        resource: distribution_section(&filtered, column_map.resource.as_deref(), id),
    };

    Ok(Json(OverviewResponse {
        filtered_events: filtered.len(),
        preview,
        statistics,
        distributions,
    }))
}

/// Render one distribution chart; unbound columns and failures both yield
/// an absent section.
fn distribution_section(
    table: &EventTable,
    column: Option<&str>,
    session_id: Uuid,
) -> Option<DistributionSection> {
    let column = column?;
    match distribution::column_distribution(table, column) {
        Ok(Some(Distribution { column, buckets })) => Some(DistributionSection {
            column,
            buckets,
            no_data: false,
        }),
        Ok(None) => Some(DistributionSection {
            column: column.to_string(),
            buckets: Vec::new(),
            no_data: true,
        }),
        Err(e) => {
            warn!(session = %session_id, error = %e, "distribution failed");
            None
        }
    }
}
