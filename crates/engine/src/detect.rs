//! Column detection — infers semantic roles from raw column names.

use crate::model::ColumnMap;

/// Detect the semantic roles of an event table from its column names.
///
/// For each role, the first column (in table order) whose lowercased name
/// contains the role marker wins:
///
/// - `case_id`: contains `case`
/// - `activity`: contains `activity`, or contains `concept:name` without `case`
/// - `timestamp`: contains `time`
/// - `resource`: contains `resource`
///
/// Roles are resolved independently, so an ambiguous name like
/// `case_timestamp` binds to both the case and timestamp roles; precedence
/// within a role is purely table order. Deterministic: the same header
/// always yields the same map.
pub fn detect_columns(columns: &[String]) -> ColumnMap {
    let lowered: Vec<(usize, String)> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c.to_lowercase()))
        .collect();

    let first = |pred: &dyn Fn(&str) -> bool| -> Option<String> {
        lowered
            .iter()
            .find(|(_, lower)| pred(lower.as_str()))
            .map(|(i, _)| columns[*i].clone())
    };

    ColumnMap {
        case_id: first(&|c| c.contains("case")),
        activity: first(&|c| {
            c.contains("activity") || (c.contains("concept:name") && !c.contains("case"))
        }),
        timestamp: first(&|c| c.contains("time")),
        resource: first(&|c| c.contains("resource")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detects_standard_xes_header() {
        let map = detect_columns(&header(&[
            "case:concept:name",
            "concept:name",
            "time:timestamp",
            "org:resource",
        ]));
        assert_eq!(map.case_id.as_deref(), Some("case:concept:name"));
        assert_eq!(map.activity.as_deref(), Some("concept:name"));
        assert_eq!(map.timestamp.as_deref(), Some("time:timestamp"));
        assert_eq!(map.resource.as_deref(), Some("org:resource"));
    }

    #[test]
    fn test_detects_csv_style_header() {
        let map = detect_columns(&header(&["Case ID", "Activity", "Timestamp", "Resource"]));
        assert_eq!(map.case_id.as_deref(), Some("Case ID"));
        assert_eq!(map.activity.as_deref(), Some("Activity"));
        assert_eq!(map.timestamp.as_deref(), Some("Timestamp"));
        assert_eq!(map.resource.as_deref(), Some("Resource"));
    }

    #[test]
    fn test_case_prefixed_concept_name_is_not_an_activity() {
        let map = detect_columns(&header(&["case:concept:name", "time:timestamp"]));
        assert_eq!(map.case_id.as_deref(), Some("case:concept:name"));
        assert_eq!(map.activity, None);
    }

    #[test]
    fn test_ambiguous_name_binds_to_both_roles() {
        // Precedence is table order within each role, resolved independently.
        let map = detect_columns(&header(&["case_timestamp", "activity"]));
        assert_eq!(map.case_id.as_deref(), Some("case_timestamp"));
        assert_eq!(map.timestamp.as_deref(), Some("case_timestamp"));
    }

    #[test]
    fn test_unmatched_roles_are_absent() {
        let map = detect_columns(&header(&["foo", "bar"]));
        assert_eq!(map, ColumnMap::default());
    }

    #[test]
    fn test_first_match_in_table_order_wins() {
        let map = detect_columns(&header(&["start_time", "end_time"]));
        assert_eq!(map.timestamp.as_deref(), Some("start_time"));
    }

    #[test]
    fn test_deterministic() {
        let names = header(&["Case", "Activity", "Time", "Resource", "Extra"]);
        assert_eq!(detect_columns(&names), detect_columns(&names));
    }
}
