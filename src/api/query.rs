//! Query-string parameters shared by the v2 handlers.
//!
//! Handlers take several `Query<T>` extractors at once; each one reads the
//! fields it knows and ignores the rest.

use crate::export::ColumnSelection;
use crate::types::{Column, FilterCriteria, InvalidColumnError};
use serde::Deserialize;

/// Sidebar widgets.
///
/// An absent list selects everything; a present but empty list
/// (`?machines=`) selects nothing. Blank period bounds count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub machines: Option<String>,
    pub statuses: Option<String>,
    pub failure_types: Option<String>,
}

impl FilterQuery {
    pub fn criteria(&self) -> Result<FilterCriteria, String> {
        FilterCriteria::from_parts(
            non_blank(self.start.as_deref()),
            non_blank(self.end.as_deref()),
            self.machines.as_deref(),
            self.statuses.as_deref(),
            self.failure_types.as_deref(),
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// `?columns=a,b` projection. Absent means every dataset column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnsQuery {
    pub columns: Option<String>,
}

impl ColumnsQuery {
    pub fn selection(&self, dataset_columns: &[Column]) -> Result<ColumnSelection, InvalidColumnError> {
        match self.columns.as_deref() {
            None => Ok(ColumnSelection::all(dataset_columns)),
            Some(list) => ColumnSelection::parse(list),
        }
    }
}

/// Table paging.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl PageQuery {
    /// `(offset, limit)` with the limit defaulted and capped.
    pub fn window(self, default_limit: usize, max_limit: usize) -> (usize, usize) {
        (
            self.offset.unwrap_or(0),
            self.limit.unwrap_or(default_limit).min(max_limit),
        )
    }
}

/// `?n=` length of the anomaly ranking.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TopQuery {
    pub n: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Selection;

    #[test]
    fn test_absent_and_empty_lists() {
        let q = FilterQuery {
            machines: Some(String::new()),
            ..FilterQuery::default()
        };
        let c = q.criteria().unwrap();
        assert_eq!(c.machines, Selection::none());
        assert!(c.statuses.is_all());
    }

    #[test]
    fn test_blank_bounds_are_ignored() {
        let q = FilterQuery {
            start: Some(" ".to_string()),
            ..FilterQuery::default()
        };
        assert!(q.criteria().unwrap().selects_all());

        let bad = FilterQuery {
            end: Some("someday".to_string()),
            ..FilterQuery::default()
        };
        assert!(bad.criteria().is_err());
    }

    #[test]
    fn test_columns_selection() {
        let q = ColumnsQuery::default();
        assert_eq!(q.selection(&Column::ALL).unwrap().len(), 11);

        let q = ColumnsQuery {
            columns: Some("humidity,machine".to_string()),
        };
        assert_eq!(
            q.selection(&Column::ALL).unwrap().columns(),
            [Column::Humidity, Column::Machine]
        );
    }

    #[test]
    fn test_page_window_caps_limit() {
        let q = PageQuery {
            offset: Some(20),
            limit: Some(5_000),
        };
        assert_eq!(q.window(100, 1_000), (20, 1_000));
        assert_eq!(PageQuery::default().window(100, 1_000), (0, 100));
    }
}
