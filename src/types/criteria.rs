//! Filter criteria chosen in the dashboard sidebar.
//!
//! "Select all" is an explicit sentinel ([`Selection::All`], [`Period::Full`])
//! rather than a set that happens to contain every value, so "select none"
//! (`Selection::Only` of an empty set) can never be confused with it.

use super::record::{parse_period_end, parse_timestamp, SensorRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;

// ============================================================================
// Selection
// ============================================================================

/// A multi-select widget value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "values")]
pub enum Selection<T: Ord> {
    /// Every value in the domain; the predicate is skipped.
    All,
    /// Exactly these values.
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: Ord> Selection<T> {
    pub fn only<I: IntoIterator<Item = T>>(values: I) -> Self {
        Self::Only(values.into_iter().collect())
    }

    pub const fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(value),
        }
    }

    /// Collapse a selection that covers the whole domain into [`Selection::All`].
    ///
    /// Every record value belongs to the domain, so the filter result is
    /// unchanged.
    #[must_use]
    pub fn normalize(self, domain: &BTreeSet<T>) -> Self {
        match self {
            Self::Only(set) if domain.is_subset(&set) => Self::All,
            other => other,
        }
    }
}

impl Selection<String> {
    /// Parse a comma-separated widget value. Blank items are dropped, so an
    /// empty string selects nothing.
    pub fn parse_list(list: &str) -> Self {
        Self::only(
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string),
        )
    }
}

// ============================================================================
// Period
// ============================================================================

/// Inclusive time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Period {
    /// The full range of the dataset.
    #[default]
    Full,
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Period {
    pub const fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::Range { start, end }
    }

    /// Build a period from optional textual bounds. A missing bound is open.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Self, String> {
        if start.is_none() && end.is_none() {
            return Ok(Self::Full);
        }
        let start = start
            .map(parse_timestamp)
            .transpose()?
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = end
            .map(parse_period_end)
            .transpose()?
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Ok(Self::Range { start, end })
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        match self {
            Self::Full => true,
            Self::Range { start, end } => start <= at && at <= end,
        }
    }

    /// Collapse a range that covers the whole dataset into [`Period::Full`].
    #[must_use]
    pub fn normalize(self, bounds: Option<TimeRange>) -> Self {
        match (self, bounds) {
            (Self::Range { start, end }, Some(range)) if start <= range.start && range.end <= end => {
                Self::Full
            }
            (other, _) => other,
        }
    }
}

/// First and last timestamps of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// ============================================================================
// Filter criteria
// ============================================================================

/// Everything the user selected, rebuilt on every interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub machines: Selection<String>,
    #[serde(default)]
    pub statuses: Selection<String>,
    #[serde(default)]
    pub failure_types: Selection<String>,
}

impl FilterCriteria {
    /// Criteria selecting every record.
    pub fn select_all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    #[must_use]
    pub fn with_machines<I, S>(mut self, machines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.machines = Selection::only(machines.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses = Selection::only(statuses.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_failure_types<I, S>(mut self, failure_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure_types = Selection::only(failure_types.into_iter().map(Into::into));
        self
    }

    /// Build criteria from raw widget text: optional period bounds and
    /// comma-separated lists. `None` selects everything; `Some("")` nothing.
    pub fn from_parts(
        start: Option<&str>,
        end: Option<&str>,
        machines: Option<&str>,
        statuses: Option<&str>,
        failure_types: Option<&str>,
    ) -> Result<Self, String> {
        let list = |value: Option<&str>| value.map_or(Selection::All, Selection::parse_list);
        Ok(Self {
            period: Period::from_bounds(start, end)?,
            machines: list(machines),
            statuses: list(statuses),
            failure_types: list(failure_types),
        })
    }

    /// Conjunction of the four predicates.
    pub fn matches(&self, record: &SensorRecord) -> bool {
        self.period.contains(&record.datetime)
            && self.machines.contains(record.machine.as_str())
            && self.statuses.contains(record.machine_status.as_str())
            && self.failure_types.contains(record.failure_type.as_str())
    }

    /// Rewrite full-domain selections as sentinels. Never changes which
    /// records match within `domain`'s record set.
    #[must_use]
    pub fn normalize(self, domain: &FilterDomain) -> Self {
        Self {
            period: self.period.normalize(domain.period),
            machines: self.machines.normalize(&domain.machines),
            statuses: self.statuses.normalize(&domain.statuses),
            failure_types: self.failure_types.normalize(&domain.failure_types),
        }
    }

    pub const fn selects_all(&self) -> bool {
        matches!(self.period, Period::Full)
            && self.machines.is_all()
            && self.statuses.is_all()
            && self.failure_types.is_all()
    }
}

// ============================================================================
// Filter domain
// ============================================================================

/// The options offered by each widget: distinct values present in the data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDomain {
    pub machines: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub failure_types: BTreeSet<String>,
    /// `None` when there are no records.
    pub period: Option<TimeRange>,
}

impl FilterDomain {
    pub fn from_records<R: Borrow<SensorRecord>>(records: &[R]) -> Self {
        let mut domain = Self::default();
        for record in records.iter().map(Borrow::borrow) {
            if !domain.machines.contains(&record.machine) {
                domain.machines.insert(record.machine.clone());
            }
            if !domain.statuses.contains(&record.machine_status) {
                domain.statuses.insert(record.machine_status.clone());
            }
            if !domain.failure_types.contains(&record.failure_type) {
                domain.failure_types.insert(record.failure_type.clone());
            }
            domain.period = Some(match domain.period {
                None => TimeRange {
                    start: record.datetime,
                    end: record.datetime,
                },
                Some(range) => TimeRange {
                    start: range.start.min(record.datetime),
                    end: range.end.max(record.datetime),
                },
            });
        }
        domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_selection_none_differs_from_all() {
        let none: Selection<String> = Selection::none();
        assert!(!none.contains("M1"));
        assert!(Selection::<String>::All.contains("M1"));
        assert_ne!(none, Selection::All);
    }

    #[test]
    fn test_parse_list_trims_and_drops_blanks() {
        let s = Selection::parse_list(" M1, ,M2 ");
        assert_eq!(s, Selection::only(["M1".to_string(), "M2".to_string()]));
        assert_eq!(Selection::parse_list(""), Selection::none());
    }

    #[test]
    fn test_selection_normalize() {
        let domain: BTreeSet<String> = ["M1", "M2"].iter().map(|s| s.to_string()).collect();

        let full = Selection::only(["M2".to_string(), "M1".to_string()]);
        assert_eq!(full.normalize(&domain), Selection::All);

        let partial = Selection::only(["M1".to_string()]);
        assert_eq!(partial.clone().normalize(&domain), partial);
    }

    #[test]
    fn test_period_inclusive_on_both_ends() {
        let p = Period::between(at(8), at(10));
        assert!(p.contains(&at(8)));
        assert!(p.contains(&at(10)));
        assert!(!p.contains(&at(11)));
        assert!(!p.contains(&at(7)));
    }

    #[test]
    fn test_period_from_bounds() {
        assert_eq!(Period::from_bounds(None, None).unwrap(), Period::Full);

        let open_end = Period::from_bounds(Some("2024-01-01 09:00:00"), None).unwrap();
        assert!(open_end.contains(&at(23)));
        assert!(!open_end.contains(&at(8)));

        let day = Period::from_bounds(None, Some("2024-01-01")).unwrap();
        assert!(day.contains(&at(23)));

        assert!(Period::from_bounds(Some("not a date"), None).is_err());
    }

    #[test]
    fn test_period_normalize() {
        let bounds = Some(TimeRange { start: at(8), end: at(10) });
        assert_eq!(Period::between(at(7), at(12)).normalize(bounds), Period::Full);
        assert_eq!(
            Period::between(at(9), at(12)).normalize(bounds),
            Period::between(at(9), at(12))
        );
        assert_eq!(Period::between(at(9), at(12)).normalize(None), Period::between(at(9), at(12)));
    }

    #[test]
    fn test_from_parts_absent_vs_empty() {
        let c = FilterCriteria::from_parts(None, None, None, Some(""), Some("Overheat")).unwrap();
        assert!(c.machines.is_all());
        assert_eq!(c.statuses, Selection::none());
        assert_eq!(c.failure_types, Selection::only(["Overheat".to_string()]));
        assert!(!c.selects_all());
        assert!(FilterCriteria::select_all().selects_all());
    }

    #[test]
    fn test_criteria_serde_round_trip() {
        let c = FilterCriteria::select_all()
            .with_machines(["M1"])
            .with_period(Period::between(at(1), at(2)));
        let json = serde_json::to_string(&c).unwrap();
        let back: FilterCriteria = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
