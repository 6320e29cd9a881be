//! Event table model — the normalized in-memory shape every loaded log takes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("Table header must not be empty")]
    EmptyHeader,

    #[error("Blank column name at position {0}")]
    BlankColumnName(usize),

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Row has {got} cells, header has {expected}")]
    RowArity { expected: usize, got: usize },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

/// Errors raised when a semantic role cannot be resolved against a table.
///
/// A missing case or activity binding is fatal for the whole pipeline;
/// timestamp and resource bindings degrade gracefully and never reach here.
#[derive(Debug, Error, PartialEq)]
pub enum ColumnBindingError {
    #[error("no case column is bound")]
    MissingCase,

    #[error("no activity column is bound")]
    MissingActivity,

    #[error("bound column '{0}' is not present in the table")]
    NotInTable(String),
}

/// An ordered event table: a header plus row-major records.
///
/// `None` cells represent missing values. Rows always match the header
/// arity and column names are unique — both enforced at construction.
/// Every transform produces a fresh table; an `EventTable` is never
/// mutated in place once handed to a consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl EventTable {
    pub fn new(columns: Vec<String>) -> Result<Self, TableError> {
        if columns.is_empty() {
            return Err(TableError::EmptyHeader);
        }
        for (i, name) in columns.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(TableError::BlankColumnName(i));
            }
            if columns[..i].contains(name) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowArity {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Option<String>]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Non-null values of one column, row order preserved.
    pub fn column_values<'a>(
        &'a self,
        name: &str,
    ) -> Result<impl Iterator<Item = Option<&'a str>> + 'a, TableError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
        Ok(self.rows.iter().map(move |r| r[idx].as_deref()))
    }

    /// Distinct non-null values of one column, in first-encountered order.
    pub fn distinct_values(&self, name: &str) -> Result<Vec<String>, TableError> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for value in self.column_values(name)?.flatten() {
            if seen.insert(value) {
                out.push(value.to_string());
            }
        }
        Ok(out)
    }

    /// A fresh table containing only the rows the predicate keeps.
    pub fn filter_rows(&self, mut keep: impl FnMut(&[Option<String>]) -> bool) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| keep(r.as_slice()))
                .cloned()
                .collect(),
        }
    }

    /// Project onto the named columns, in the given order.
    pub fn select_columns(&self, names: &[String]) -> Result<Self, TableError> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            indices.push(
                self.column_index(name)
                    .ok_or_else(|| TableError::UnknownColumn(name.clone()))?,
            );
        }
        let mut out = Self::new(names.to_vec())?;
        for row in &self.rows {
            let projected = indices.iter().map(|&i| row[i].clone()).collect();
            // Arity is indices.len() by construction.
            out.push_row(projected)?;
        }
        Ok(out)
    }

    /// The first `n` rows, for previews.
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

/// Binding of the four semantic roles to actual column names.
///
/// Built once per loaded log (then possibly re-bound by an explicit user
/// confirmation) and treated as immutable by every downstream stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub case_id: Option<String>,
    pub activity: Option<String>,
    pub timestamp: Option<String>,
    pub resource: Option<String>,
}

impl ColumnMap {
    /// The case/activity pair, present only when both essential roles are bound.
    pub fn essential(&self) -> Option<(&str, &str)> {
        match (self.case_id.as_deref(), self.activity.as_deref()) {
            (Some(case), Some(activity)) => Some((case, activity)),
            _ => None,
        }
    }

    pub fn has_essential(&self) -> bool {
        self.essential().is_some()
    }

    /// Resolve the essential roles to column indices of `table`.
    pub fn resolve_essential(&self, table: &EventTable) -> Result<(usize, usize), ColumnBindingError> {
        let case = self.case_id.as_deref().ok_or(ColumnBindingError::MissingCase)?;
        let activity = self
            .activity
            .as_deref()
            .ok_or(ColumnBindingError::MissingActivity)?;
        let case_idx = table
            .column_index(case)
            .ok_or_else(|| ColumnBindingError::NotInTable(case.to_string()))?;
        let activity_idx = table
            .column_index(activity)
            .ok_or_else(|| ColumnBindingError::NotInTable(activity.to_string()))?;
        Ok((case_idx, activity_idx))
    }
}

/// One rendering pass worth of user-chosen filters.
///
/// `None` start/end events mean "All". Empty allow-lists mean "no
/// restriction". Empty `columns` means "display every column".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub start_event: Option<String>,
    pub end_event: Option<String>,
    pub resources: Vec<String>,
    pub activities: Vec<String>,
    pub columns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_rejects_duplicate_columns() {
        let result = EventTable::new(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(result.unwrap_err(), TableError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_rejects_blank_column() {
        let result = EventTable::new(vec!["a".into(), "  ".into()]);
        assert_eq!(result.unwrap_err(), TableError::BlankColumnName(1));
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let mut table = EventTable::new(vec!["a".into(), "b".into()]).unwrap();
        let err = table.push_row(vec![some("1")]).unwrap_err();
        assert_eq!(err, TableError::RowArity { expected: 2, got: 1 });
    }

    #[test]
    fn test_distinct_values_first_encountered_order() {
        let mut table = EventTable::new(vec!["activity".into()]).unwrap();
        for v in ["B", "A", "B", "C", "A"] {
            table.push_row(vec![some(v)]).unwrap();
        }
        table.push_row(vec![None]).unwrap();
        assert_eq!(table.distinct_values("activity").unwrap(), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_select_columns_projects_and_reorders() {
        let mut table = EventTable::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        table.push_row(vec![some("1"), some("2"), some("3")]).unwrap();
        let projected = table.select_columns(&["c".into(), "a".into()]).unwrap();
        assert_eq!(projected.columns(), ["c", "a"]);
        let row: Vec<_> = projected.rows().next().unwrap().to_vec();
        assert_eq!(row, vec![some("3"), some("1")]);
    }

    #[test]
    fn test_select_unknown_column_fails() {
        let table = EventTable::new(vec!["a".into()]).unwrap();
        let err = table.select_columns(&["nope".into()]).unwrap_err();
        assert_eq!(err, TableError::UnknownColumn("nope".into()));
    }

    #[test]
    fn test_filter_rows_leaves_source_intact() {
        let mut table = EventTable::new(vec!["a".into()]).unwrap();
        table.push_row(vec![some("1")]).unwrap();
        table.push_row(vec![some("2")]).unwrap();
        let filtered = table.filter_rows(|row| row[0].as_deref() == Some("2"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_resolve_essential_reports_missing_roles() {
        let table = EventTable::new(vec!["case".into(), "activity".into()]).unwrap();
        let map = ColumnMap {
            case_id: Some("case".into()),
            ..Default::default()
        };
        assert_eq!(
            map.resolve_essential(&table).unwrap_err(),
            ColumnBindingError::MissingActivity
        );

        let map = ColumnMap {
            case_id: Some("gone".into()),
            activity: Some("activity".into()),
            ..Default::default()
        };
        assert_eq!(
            map.resolve_essential(&table).unwrap_err(),
            ColumnBindingError::NotInTable("gone".into())
        );
    }
}
