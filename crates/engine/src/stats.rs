//! Summary statistics over a (filtered) event table.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone as _, Utc};

use crate::model::{ColumnBindingError, ColumnMap, EventTable};

/// Naive timestamp layouts accepted besides RFC 3339, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

/// Most frequent resource of the table, when a resource column is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopResource {
    MostFrequent(String),
    /// Resource column present but entirely null.
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Mean of per-case (max − min) timestamp spans.
    pub mean_case_duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogStatistics {
    pub total_events: usize,
    pub unique_cases: usize,
    pub unique_activities: usize,
    /// Absent when no timestamp column is bound or nothing parses.
    pub time_range: Option<TimeRange>,
    /// Absent when no resource column is bound.
    pub top_resource: Option<TopResource>,
}

impl LogStatistics {
    /// Render every metric as (label, display string) rows, the shape the
    /// statistics panel consumes.
    pub fn rows(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("Total Events".to_string(), self.total_events.to_string()),
            ("Unique Cases".to_string(), self.unique_cases.to_string()),
            (
                "Unique Activities".to_string(),
                self.unique_activities.to_string(),
            ),
        ];
        if let Some(range) = &self.time_range {
            rows.push(("Time Range Start".to_string(), range.start.to_rfc3339()));
            rows.push(("Time Range End".to_string(), range.end.to_rfc3339()));
            rows.push((
                "Avg Case Duration".to_string(),
                format_duration(range.mean_case_duration),
            ));
        }
        match &self.top_resource {
            Some(TopResource::MostFrequent(resource)) => {
                rows.push(("Top Resource".to_string(), resource.clone()));
            }
            Some(TopResource::NotApplicable) => {
                rows.push(("Top Resource".to_string(), "not applicable".to_string()));
            }
            None => {}
        }
        rows
    }
}

/// Compute the summary statistics of a filtered table.
///
/// Case and activity bindings are required; timestamp and resource are
/// optional-feature degradation. The caller's table is only read — the
/// timestamp conversion happens on a private scan.
pub fn summarize(table: &EventTable, map: &ColumnMap) -> Result<LogStatistics, ColumnBindingError> {
    let (case_idx, activity_idx) = map.resolve_essential(table)?;

    let mut cases = std::collections::HashSet::new();
    let mut activities = std::collections::HashSet::new();
    for row in table.rows() {
        if let Some(case) = row[case_idx].as_deref() {
            cases.insert(case);
        }
        if let Some(activity) = row[activity_idx].as_deref() {
            activities.insert(activity);
        }
    }

    let time_range = map
        .timestamp
        .as_deref()
        .and_then(|name| table.column_index(name))
        .and_then(|timestamp_idx| time_range(table, case_idx, timestamp_idx));

    let top_resource = map
        .resource
        .as_deref()
        .and_then(|name| table.column_index(name))
        .map(|resource_idx| top_resource(table, resource_idx));

    Ok(LogStatistics {
        total_events: table.len(),
        unique_cases: cases.len(),
        unique_activities: activities.len(),
        time_range,
        top_resource,
    })
}

fn time_range(table: &EventTable, case_idx: usize, timestamp_idx: usize) -> Option<TimeRange> {
    // Per-case (min, max); unparseable cells are skipped.
    let mut spans: HashMap<&str, (DateTime<Utc>, DateTime<Utc>)> = HashMap::new();
    let mut start: Option<DateTime<Utc>> = None;
    let mut end: Option<DateTime<Utc>> = None;

    for row in table.rows() {
        let Some(parsed) = row[timestamp_idx].as_deref().and_then(parse_timestamp) else {
            continue;
        };
        start = Some(start.map_or(parsed, |s| s.min(parsed)));
        end = Some(end.map_or(parsed, |e| e.max(parsed)));

        if let Some(case) = row[case_idx].as_deref() {
            spans
                .entry(case)
                .and_modify(|(min, max)| {
                    *min = (*min).min(parsed);
                    *max = (*max).max(parsed);
                })
                .or_insert((parsed, parsed));
        }
    }

    let (start, end) = (start?, end?);
    let total_ms: i64 = spans
        .values()
        .map(|(min, max)| (*max - *min).num_milliseconds())
        .sum();
    let mean_case_duration = if spans.is_empty() {
        Duration::zero()
    } else {
        Duration::milliseconds(total_ms / spans.len() as i64)
    };

    Some(TimeRange {
        start,
        end,
        mean_case_duration,
    })
}

fn top_resource(table: &EventTable, resource_idx: usize) -> TopResource {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for row in table.rows() {
        if let Some(resource) = row[resource_idx].as_deref() {
            if !counts.contains_key(resource) {
                order.push(resource);
            }
            *counts.entry(resource).or_insert(0) += 1;
        }
    }

    // Ties go to the first-encountered value.
    let mut best: Option<(&str, usize)> = None;
    for resource in &order {
        let count = counts[resource];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((resource, count));
        }
    }
    best.map(|(resource, _)| TopResource::MostFrequent(resource.to_string()))
        .unwrap_or(TopResource::NotApplicable)
}

/// Parse a timestamp cell: RFC 3339 first, then common naive layouts
/// (interpreted as UTC), then a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.num_seconds().max(0);
    let days = total_seconds / 86_400;
    let rem = total_seconds % 86_400;
    let (hours, minutes, seconds) = (rem / 3_600, rem % 3_600 / 60, rem % 60);
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}
