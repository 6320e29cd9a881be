//! Distribution aggregation — per-column value frequencies for bar charts.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::EventTable;

#[derive(Debug, Error, PartialEq)]
pub enum DistributionError {
    #[error("column '{0}' does not exist in the table")]
    UnknownColumn(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub value: String,
    pub count: usize,
}

/// A labeled categorical series, sorted by count descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub column: String,
    pub buckets: Vec<Bucket>,
}

/// Frequency counts of one column's non-null values.
///
/// `Ok(None)` is the explicit "no data" signal for a column that is
/// entirely null; an unknown column is an error. Ties keep
/// first-encountered order (stable sort).
pub fn column_distribution(
    table: &EventTable,
    column: &str,
) -> Result<Option<Distribution>, DistributionError> {
    let idx = table
        .column_index(column)
        .ok_or_else(|| DistributionError::UnknownColumn(column.to_string()))?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for row in table.rows() {
        if let Some(value) = row[idx].as_deref() {
            if !counts.contains_key(value) {
                order.push(value);
            }
            *counts.entry(value).or_insert(0) += 1;
        }
    }

    if order.is_empty() {
        return Ok(None);
    }

    let mut buckets: Vec<Bucket> = order
        .into_iter()
        .map(|value| Bucket {
            value: value.to_string(),
            count: counts[value],
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(Some(Distribution {
        column: column.to_string(),
        buckets,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(values: &[Option<&str>]) -> EventTable {
        let mut table = EventTable::new(vec!["activity".into()]).unwrap();
        for value in values {
            table.push_row(vec![value.map(str::to_string)]).unwrap();
        }
        table
    }

    #[test]
    fn test_counts_sorted_descending() {
        let table = table(&[
            Some("B"),
            Some("A"),
            Some("A"),
            Some("C"),
            Some("A"),
            Some("C"),
        ]);
        let dist = column_distribution(&table, "activity").unwrap().unwrap();
        assert_eq!(dist.column, "activity");
        let pairs: Vec<(&str, usize)> = dist
            .buckets
            .iter()
            .map(|b| (b.value.as_str(), b.count))
            .collect();
        assert_eq!(pairs, vec![("A", 3), ("C", 2), ("B", 1)]);
    }

    #[test]
    fn test_nulls_are_dropped() {
        let table = table(&[Some("A"), None, Some("A"), None]);
        let dist = column_distribution(&table, "activity").unwrap().unwrap();
        assert_eq!(dist.buckets.len(), 1);
        assert_eq!(dist.buckets[0].count, 2);
    }

    #[test]
    fn test_all_null_column_is_no_data_not_error() {
        let table = table(&[None, None]);
        assert_eq!(column_distribution(&table, "activity").unwrap(), None);
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let table = table(&[Some("A")]);
        let err = column_distribution(&table, "nope").unwrap_err();
        assert_eq!(err, DistributionError::UnknownColumn("nope".into()));
    }

    #[test]
    fn test_ties_keep_first_encountered_order() {
        let table = table(&[Some("Y"), Some("X"), Some("X"), Some("Y")]);
        let dist = column_distribution(&table, "activity").unwrap().unwrap();
        let values: Vec<&str> = dist.buckets.iter().map(|b| b.value.as_str()).collect();
        assert_eq!(values, vec!["Y", "X"]);
    }
}
