//! Filter engine — sequential narrowing of an event table.

use std::collections::{HashMap, HashSet};

use crate::model::{ColumnBindingError, ColumnMap, EventTable, FilterSelection};

/// Which end of a case the boundary filter inspects.
#[derive(Clone, Copy)]
enum Boundary {
    First,
    Last,
}

/// Apply the user's filter selection, one step at a time.
///
/// Order matters and is part of the contract:
///
/// 1. start event — keep cases whose first activity (row order) matches;
/// 2. end event — keep cases whose last activity matches;
/// 3. resource allow-list — keep rows whose resource is in the set;
/// 4. activity allow-list — keep rows whose activity is in the set.
///
/// Each step runs on the previous step's output, so start/end events are
/// judged before the activity allow-list can remove the rows they matched
/// on. A bound-but-absent resource column is silently ignored, matching
/// how a missing timestamp degrades elsewhere. Missing case or activity
/// bindings are errors; callers render nothing instead of crashing.
pub fn apply_filters(
    table: &EventTable,
    map: &ColumnMap,
    selection: &FilterSelection,
) -> Result<EventTable, ColumnBindingError> {
    let (case_idx, activity_idx) = map.resolve_essential(table)?;

    let mut filtered = table.clone();

    if let Some(start) = selection.start_event.as_deref() {
        let keep = boundary_cases(&filtered, case_idx, activity_idx, Boundary::First, start);
        filtered = filtered.filter_rows(|row| {
            row[case_idx]
                .as_deref()
                .is_some_and(|case| keep.contains(case))
        });
    }

    if let Some(end) = selection.end_event.as_deref() {
        let keep = boundary_cases(&filtered, case_idx, activity_idx, Boundary::Last, end);
        filtered = filtered.filter_rows(|row| {
            row[case_idx]
                .as_deref()
                .is_some_and(|case| keep.contains(case))
        });
    }

    if !selection.resources.is_empty() {
        if let Some(resource_idx) = map
            .resource
            .as_deref()
            .and_then(|name| filtered.column_index(name))
        {
            let allowed: HashSet<&str> = selection.resources.iter().map(String::as_str).collect();
            filtered = filtered.filter_rows(|row| {
                row[resource_idx]
                    .as_deref()
                    .is_some_and(|value| allowed.contains(value))
            });
        }
    }

    if !selection.activities.is_empty() {
        let allowed: HashSet<&str> = selection.activities.iter().map(String::as_str).collect();
        filtered = filtered.filter_rows(|row| {
            row[activity_idx]
                .as_deref()
                .is_some_and(|value| allowed.contains(value))
        });
    }

    Ok(filtered)
}

/// The set of case ids whose first (or last) activity equals `target`.
fn boundary_cases(
    table: &EventTable,
    case_idx: usize,
    activity_idx: usize,
    boundary: Boundary,
    target: &str,
) -> HashSet<String> {
    let mut boundary_activity: HashMap<String, String> = HashMap::new();
    for row in table.rows() {
        let (Some(case), Some(activity)) = (row[case_idx].as_deref(), row[activity_idx].as_deref())
        else {
            continue;
        };
        match boundary {
            Boundary::First => {
                boundary_activity
                    .entry(case.to_string())
                    .or_insert_with(|| activity.to_string());
            }
            Boundary::Last => {
                boundary_activity.insert(case.to_string(), activity.to_string());
            }
        }
    }

    boundary_activity
        .into_iter()
        .filter(|(_, activity)| activity == target)
        .map(|(case, _)| case)
        .collect()
}
