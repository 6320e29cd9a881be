//! Variant extraction — cases grouped by their ordered activity sequence.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{ColumnBindingError, ColumnMap, EventTable};

/// One distinct ordered activity sequence and how many cases follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    pub activities: Vec<String>,
    pub case_count: usize,
}

/// Partition the table's cases by their activity sequence.
///
/// Within a case, activity order is row order; null activities are
/// skipped, rows without a case id are ignored. The result is sorted by
/// case count descending with stable ties (first-encountered sequence
/// first). An empty table yields an empty vec — the "no variants" signal,
/// not an error.
pub fn extract_variants(
    table: &EventTable,
    map: &ColumnMap,
) -> Result<Vec<Variant>, ColumnBindingError> {
    let (case_idx, activity_idx) = map.resolve_essential(table)?;

    // Case order and per-case sequences, both first-encountered.
    let mut sequences: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut case_order: Vec<&str> = Vec::new();
    for row in table.rows() {
        let Some(case) = row[case_idx].as_deref() else {
            continue;
        };
        if !sequences.contains_key(case) {
            case_order.push(case);
        }
        let sequence = sequences.entry(case).or_default();
        if let Some(activity) = row[activity_idx].as_deref() {
            sequence.push(activity);
        }
    }

    let mut counts: HashMap<&[&str], usize> = HashMap::new();
    let mut variant_order: Vec<&[&str]> = Vec::new();
    for case in &case_order {
        let sequence = sequences[case].as_slice();
        if !counts.contains_key(sequence) {
            variant_order.push(sequence);
        }
        *counts.entry(sequence).or_insert(0) += 1;
    }

    let mut variants: Vec<Variant> = variant_order
        .into_iter()
        .map(|sequence| Variant {
            activities: sequence.iter().map(|a| a.to_string()).collect(),
            case_count: counts[sequence],
        })
        .collect();

    // Vec::sort_by is stable, so ties keep first-encountered order.
    variants.sort_by(|a, b| b.case_count.cmp(&a.case_count));
    Ok(variants)
}

/// The top `floor(n * percent / 100)` variants; `percent` is clamped to
/// [1, 100]. A zero-length slice is a valid result.
pub fn top_by_coverage(variants: &[Variant], percent: u8) -> &[Variant] {
    let percent = percent.clamp(1, 100) as usize;
    let take = variants.len() * percent / 100;
    &variants[..take]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_from_cases(cases: &[(&str, &[&str])]) -> (EventTable, ColumnMap) {
        let mut table = EventTable::new(vec!["case".into(), "activity".into()]).unwrap();
        for (case, activities) in cases {
            for activity in *activities {
                table
                    .push_row(vec![Some(case.to_string()), Some(activity.to_string())])
                    .unwrap();
            }
        }
        let map = ColumnMap {
            case_id: Some("case".into()),
            activity: Some("activity".into()),
            ..Default::default()
        };
        (table, map)
    }

    #[test]
    fn test_counts_cases_per_sequence() {
        let (table, map) = table_from_cases(&[
            ("1", &["A", "B", "C"]),
            ("2", &["A", "C"]),
            ("3", &["A", "B", "C"]),
        ]);
        let variants = extract_variants(&table, &map).unwrap();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].activities, vec!["A", "B", "C"]);
        assert_eq!(variants[0].case_count, 2);
        assert_eq!(variants[1].activities, vec!["A", "C"]);
        assert_eq!(variants[1].case_count, 1);
    }

    #[test]
    fn test_counts_partition_the_case_set() {
        let (table, map) = table_from_cases(&[
            ("1", &["A", "B"]),
            ("2", &["A", "B"]),
            ("3", &["B"]),
            ("4", &["A", "B", "A"]),
        ]);
        let variants = extract_variants(&table, &map).unwrap();
        let total: usize = variants.iter().map(|v| v.case_count).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_ties_keep_first_encountered_order() {
        let (table, map) = table_from_cases(&[("1", &["X"]), ("2", &["Y"]), ("3", &["Z"])]);
        let variants = extract_variants(&table, &map).unwrap();
        let sequences: Vec<_> = variants.iter().map(|v| v.activities.clone()).collect();
        assert_eq!(sequences, vec![vec!["X"], vec!["Y"], vec!["Z"]]);
    }

    #[test]
    fn test_empty_table_yields_no_variants() {
        let (table, map) = table_from_cases(&[]);
        let variants = extract_variants(&table, &map).unwrap();
        assert!(variants.is_empty());
    }

    #[test]
    fn test_coverage_at_full_returns_everything() {
        let (table, map) = table_from_cases(&[("1", &["A"]), ("2", &["B"]), ("3", &["A"])]);
        let variants = extract_variants(&table, &map).unwrap();
        assert_eq!(top_by_coverage(&variants, 100).len(), variants.len());
    }

    #[test]
    fn test_coverage_can_floor_to_zero() {
        let (table, map) = table_from_cases(&[("1", &["A"]), ("2", &["B"])]);
        let variants = extract_variants(&table, &map).unwrap();
        // floor(2 * 10 / 100) == 0 — empty, not an error
        assert!(top_by_coverage(&variants, 10).is_empty());
    }

    #[test]
    fn test_coverage_percent_is_clamped() {
        let (table, map) = table_from_cases(&[("1", &["A"]), ("2", &["B"])]);
        let variants = extract_variants(&table, &map).unwrap();
        assert_eq!(top_by_coverage(&variants, 200).len(), 2);
    }

    #[test]
    fn test_takes_top_variants_by_count() {
        let (table, map) = table_from_cases(&[
            ("1", &["A"]),
            ("2", &["A"]),
            ("3", &["B"]),
            ("4", &["C"]),
        ]);
        let variants = extract_variants(&table, &map).unwrap();
        // floor(3 * 34 / 100) == 1
        let top = top_by_coverage(&variants, 34);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].activities, vec!["A"]);
    }
}
