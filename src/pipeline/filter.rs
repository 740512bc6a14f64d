//! Sidebar filter: a stable conjunction of four predicates.

use crate::types::{FilterCriteria, SensorRecord};
use std::borrow::Borrow;

/// Records matching `criteria`, in their original relative order.
///
/// Accepts owned records or references, so a filtered view can be filtered
/// again.
pub fn filter<'a, R: Borrow<SensorRecord>>(
    records: &'a [R],
    criteria: &FilterCriteria,
) -> Vec<&'a SensorRecord> {
    if criteria.selects_all() {
        return records.iter().map(Borrow::borrow).collect();
    }
    records
        .iter()
        .map(Borrow::borrow)
        .filter(|record| criteria.matches(record))
        .collect()
}

/// Positions of the matching records, ascending.
pub fn filter_indices<R: Borrow<SensorRecord>>(records: &[R], criteria: &FilterCriteria) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| criteria.matches((*record).borrow()))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Flag, Period, Selection};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    fn record(minute: u32, machine: &str, status: &str, failure: &str) -> SensorRecord {
        SensorRecord {
            timestamp: at(minute).to_rfc3339(),
            datetime: at(minute),
            machine: machine.to_string(),
            machine_status: status.to_string(),
            failure_type: failure.to_string(),
            anomaly_flag: Flag::No,
            maintenance_required: Flag::No,
            temperature: 60.0,
            vibration: 0.3,
            pressure: 100.0,
            energy_consumption: 4.0,
            humidity: 40.0,
        }
    }

    fn records() -> Vec<SensorRecord> {
        vec![
            record(0, "M1", "Normal", "Normal"),
            record(1, "M2", "Failure", "Overheat"),
            record(2, "M1", "Idle", "Normal"),
            record(3, "M3", "Failure", "Vibration"),
            record(4, "M2", "Normal", "Normal"),
        ]
    }

    fn machines(rows: &[&SensorRecord]) -> Vec<String> {
        rows.iter().map(|r| r.machine.clone()).collect()
    }

    #[test]
    fn test_select_all_keeps_everything() {
        let data = records();
        assert_eq!(filter(&data, &FilterCriteria::select_all()).len(), data.len());
    }

    #[test]
    fn test_conjunction_of_predicates() {
        let data = records();
        let criteria = FilterCriteria::select_all()
            .with_machines(["M1", "M2"])
            .with_statuses(["Normal", "Failure"]);
        assert_eq!(machines(&filter(&data, &criteria)), ["M1", "M2", "M2"]);

        let criteria = criteria.with_failure_types(["Normal"]);
        assert_eq!(machines(&filter(&data, &criteria)), ["M1", "M2"]);
    }

    #[test]
    fn test_period_is_inclusive() {
        let data = records();
        let criteria = FilterCriteria::select_all().with_period(Period::between(at(1), at(3)));
        assert_eq!(machines(&filter(&data, &criteria)), ["M2", "M1", "M3"]);
    }

    #[test]
    fn test_select_none_yields_empty() {
        let data = records();
        let criteria = FilterCriteria {
            machines: Selection::none(),
            ..FilterCriteria::default()
        };
        assert!(filter(&data, &criteria).is_empty());
    }

    #[test]
    fn test_filter_is_idempotent() {
        let data = records();
        let criteria = FilterCriteria::select_all().with_machines(["M2", "M3"]);
        let once = filter(&data, &criteria);
        let twice = filter(&once, &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_explicit_full_domain_matches_sentinel() {
        let data = records();
        let explicit = FilterCriteria::select_all().with_machines(["M1", "M2", "M3"]);
        assert_eq!(filter(&data, &explicit), filter(&data, &FilterCriteria::select_all()));
    }

    #[test]
    fn test_indices_agree_with_filter() {
        let data = records();
        let criteria = FilterCriteria::select_all().with_statuses(["Failure"]);
        assert_eq!(filter_indices(&data, &criteria), vec![1, 3]);
    }
}
