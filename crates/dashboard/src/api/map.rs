//! Map — pure conversion helpers between engine types and API payloads.

use engine::model::{FilterSelection, TableError};
use engine::stats::LogStatistics;
use engine::EventTable;
use serde::{Deserialize, Serialize};

/// Filter selection as it arrives in query parameters.
///
/// Allow-lists are comma-separated; `start_event`/`end_event` accept the
/// literal "All" (any casing) as no restriction, mirroring the sidebar
/// select boxes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub start_event: Option<String>,
    pub end_event: Option<String>,
    pub resources: Option<String>,
    pub activities: Option<String>,
    pub columns: Option<String>,
    pub coverage: Option<u8>,
}

impl FilterQuery {
    pub fn to_selection(&self) -> FilterSelection {
        FilterSelection {
            start_event: normalize_event(self.start_event.as_deref()),
            end_event: normalize_event(self.end_event.as_deref()),
            resources: split_list(self.resources.as_deref()),
            activities: split_list(self.activities.as_deref()),
            columns: split_list(self.columns.as_deref()),
        }
    }
}

fn normalize_event(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
        None
    } else {
        Some(raw.to_string())
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Serialize)]
pub struct PreviewDto {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
    /// Row count of the filtered table before the preview cap.
    pub total_rows: usize,
}

/// Project the filtered table onto the display columns and cap the rows.
/// An empty column list means "every column".
pub fn preview(
    table: &EventTable,
    display_columns: &[String],
    limit: usize,
) -> Result<PreviewDto, TableError> {
    let projected = if display_columns.is_empty() {
        table.head(limit)
    } else {
        table.select_columns(display_columns)?.head(limit)
    };

    Ok(PreviewDto {
        columns: projected.columns().to_vec(),
        rows: projected.rows().map(<[Option<String>]>::to_vec).collect(),
        total_rows: table.len(),
    })
}

#[derive(Debug, Serialize)]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

/// Statistics as the (metric, value) display rows the panel shows.
pub fn statistic_rows(stats: &LogStatistics) -> Vec<MetricRow> {
    stats
        .rows()
        .into_iter()
        .map(|(metric, value)| MetricRow { metric, value })
        .collect()
}
