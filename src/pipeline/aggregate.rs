//! Aggregates over a filtered record set.
//!
//! All functions are pure and accept zero rows. Rankings break count ties
//! by first occurrence in the input, so output is reproducible run to run.

use crate::types::{
    AnomalyCrossTab, CategoricalColumn, ColumnExtremum, ColumnStats, CrossTabPercentages,
    CrossTabRow, Extreme, Flag, MachineAnomalyCount, NumericColumn, SensorRecord, SummaryCounts,
    ValueCount,
};
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};

/// Count labels, most frequent first; equal counts keep first-seen order.
fn count_by_first_seen<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for label in labels {
        match position.get(label) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                position.insert(label, counts.len());
                counts.push((label, 1));
            }
        }
    }
    // Vec::sort_by is stable.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Totals shown in the metric tiles.
pub fn summary_counts<R: Borrow<SensorRecord>>(records: &[R]) -> SummaryCounts {
    let mut machines: HashSet<&str> = HashSet::new();
    let mut failure_records = 0;
    for record in records.iter().map(Borrow::borrow) {
        machines.insert(record.machine.as_str());
        if record.has_failure() {
            failure_records += 1;
        }
    }
    SummaryCounts {
        total_records: records.len(),
        distinct_machines: machines.len(),
        failure_records,
    }
}

/// Machines with the most anomalous readings, at most `n` of them.
pub fn top_anomalous_machines<R: Borrow<SensorRecord>>(
    records: &[R],
    n: usize,
) -> Vec<MachineAnomalyCount> {
    let anomalous = records
        .iter()
        .map(Borrow::borrow)
        .filter(|r| r.is_anomalous())
        .map(|r| r.machine.as_str());
    count_by_first_seen(anomalous)
        .into_iter()
        .take(n)
        .map(|(machine, count)| MachineAnomalyCount {
            machine: machine.to_string(),
            count,
        })
        .collect()
}

/// Share of failure-or-maintenance records within each anomaly group.
pub fn anomaly_failure_cross_tab<R: Borrow<SensorRecord>>(records: &[R]) -> AnomalyCrossTab {
    // [No, Yes] x [group size, failure-or-maintenance]
    let mut tally = [[0usize; 2]; 2];
    for record in records.iter().map(Borrow::borrow) {
        let group = &mut tally[usize::from(record.is_anomalous())];
        group[0] += 1;
        if record.failure_or_maintenance() {
            group[1] += 1;
        }
    }

    let rows = [Flag::No, Flag::Yes]
        .into_iter()
        .map(|flag| {
            let [size, hits] = tally[usize::from(flag.is_yes())];
            let percentages = (size > 0).then(|| {
                let failure = hits as f64 / size as f64 * 100.0;
                CrossTabPercentages {
                    failure_or_maintenance: failure,
                    no_failure_or_maintenance: (size - hits) as f64 / size as f64 * 100.0,
                }
            });
            CrossTabRow {
                anomaly_flag: flag,
                records: size,
                failure_or_maintenance: hits,
                percentages,
            }
        })
        .collect();

    AnomalyCrossTab { rows }
}

/// Minimum and maximum reading of `column`, each with the machine of the
/// first record holding it. Missing readings are skipped; `None` when no
/// record has a reading.
pub fn column_extremum<R: Borrow<SensorRecord>>(
    records: &[R],
    column: NumericColumn,
) -> Option<ColumnExtremum> {
    let mut readings = records
        .iter()
        .map(Borrow::borrow)
        .map(|r| (r.reading(column), r))
        .filter(|(value, _)| !value.is_nan());

    let (first_value, first) = readings.next()?;
    let (mut min, mut max) = ((first_value, first), (first_value, first));
    for (value, record) in readings {
        // Strict comparisons keep the earliest record on ties.
        if value < min.0 {
            min = (value, record);
        }
        if value > max.0 {
            max = (value, record);
        }
    }

    Some(ColumnExtremum {
        column,
        min: Extreme {
            value: min.0,
            machine: min.1.machine.clone(),
        },
        max: Extreme {
            value: max.0,
            machine: max.1.machine.clone(),
        },
    })
}

/// Descriptive statistics of `column`, ignoring missing readings.
pub fn column_stats<R: Borrow<SensorRecord>>(
    records: &[R],
    column: NumericColumn,
) -> Option<ColumnStats> {
    let values: Vec<f64> = records
        .iter()
        .map(|r| r.borrow().reading(column))
        .filter(|v| !v.is_nan())
        .collect();
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let mean = values.iter().mean();
    let std_dev = (count > 1).then(|| values.iter().std_dev());
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut data = Data::new(values);
    Some(ColumnStats {
        column,
        count,
        mean,
        std_dev,
        min,
        lower_quartile: data.lower_quartile(),
        median: data.quantile(0.5),
        upper_quartile: data.upper_quartile(),
        max,
    })
}

/// Label frequencies of a categorical column, most frequent first.
pub fn value_counts<R: Borrow<SensorRecord>>(
    records: &[R],
    column: CategoricalColumn,
) -> Vec<ValueCount> {
    count_by_first_seen(records.iter().map(|r| r.borrow().label(column)))
        .into_iter()
        .map(|(label, count)| ValueCount {
            label: label.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(machine: &str, temperature: f64, status: &str, failure: &str, anomaly: Flag) -> SensorRecord {
        SensorRecord {
            timestamp: "2024-01-01 00:00:00".to_string(),
            datetime: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            machine: machine.to_string(),
            machine_status: status.to_string(),
            failure_type: failure.to_string(),
            anomaly_flag: anomaly,
            maintenance_required: Flag::No,
            temperature,
            vibration: 0.5,
            pressure: 100.0,
            energy_consumption: 3.0,
            humidity: 45.0,
        }
    }

    fn pair() -> Vec<SensorRecord> {
        vec![
            record("M1", 50.0, "Normal", "Normal", Flag::No),
            record("M2", 90.0, "Failure", "Overheat", Flag::Yes),
        ]
    }

    #[test]
    fn test_two_machine_scenario() {
        let data = pair();
        assert_eq!(
            summary_counts(&data),
            SummaryCounts {
                total_records: 2,
                distinct_machines: 2,
                failure_records: 1
            }
        );

        let ext = column_extremum(&data, NumericColumn::Temperature).unwrap();
        assert_eq!((ext.max.value, ext.max.machine.as_str()), (90.0, "M2"));
        assert_eq!((ext.min.value, ext.min.machine.as_str()), (50.0, "M1"));

        assert_eq!(
            top_anomalous_machines(&data, 10),
            vec![MachineAnomalyCount {
                machine: "M2".to_string(),
                count: 1
            }]
        );
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<SensorRecord> = Vec::new();
        assert_eq!(summary_counts(&empty), SummaryCounts::default());
        assert!(top_anomalous_machines(&empty, 10).is_empty());
        assert!(column_extremum(&empty, NumericColumn::Pressure).is_none());
        assert!(column_stats(&empty, NumericColumn::Pressure).is_none());
        assert!(value_counts(&empty, CategoricalColumn::MachineStatus).is_empty());

        let tab = anomaly_failure_cross_tab(&empty);
        assert_eq!(tab.rows.len(), 2);
        assert!(tab.rows.iter().all(|r| r.records == 0 && r.percentages.is_none()));
    }

    #[test]
    fn test_top_anomalous_ties_keep_first_occurrence() {
        let data = vec![
            record("M3", 1.0, "Normal", "Normal", Flag::Yes),
            record("M1", 1.0, "Normal", "Normal", Flag::Yes),
            record("M2", 1.0, "Normal", "Normal", Flag::Yes),
            record("M1", 1.0, "Normal", "Normal", Flag::Yes),
            record("M9", 1.0, "Normal", "Normal", Flag::No),
            record("M2", 1.0, "Normal", "Normal", Flag::Yes),
            record("M3", 1.0, "Normal", "Normal", Flag::Yes),
            record("M4", 1.0, "Normal", "Normal", Flag::Yes),
        ];
        let ranked: Vec<(String, usize)> = top_anomalous_machines(&data, 10)
            .into_iter()
            .map(|m| (m.machine, m.count))
            .collect();
        assert_eq!(
            ranked,
            vec![
                ("M3".to_string(), 2),
                ("M1".to_string(), 2),
                ("M2".to_string(), 2),
                ("M4".to_string(), 1),
            ]
        );

        assert_eq!(top_anomalous_machines(&data, 2).len(), 2);
        assert!(top_anomalous_machines(&data, 0).is_empty());
    }

    #[test]
    fn test_cross_tab_percentages() {
        let mut data = vec![
            record("M1", 1.0, "Failure", "Overheat", Flag::Yes),
            record("M1", 1.0, "Normal", "Normal", Flag::Yes),
            record("M2", 1.0, "Normal", "Normal", Flag::Yes),
            record("M2", 1.0, "Normal", "Normal", Flag::No),
        ];
        data[1].maintenance_required = Flag::Yes;

        let tab = anomaly_failure_cross_tab(&data);
        let yes = tab.row(Flag::Yes).unwrap();
        assert_eq!((yes.records, yes.failure_or_maintenance), (3, 2));
        let pct = yes.percentages.unwrap();
        assert!((pct.failure_or_maintenance - 200.0 / 3.0).abs() < 1e-9);
        assert!((pct.failure_or_maintenance + pct.no_failure_or_maintenance - 100.0).abs() < 1e-6);

        let no = tab.percentages(Flag::No).unwrap();
        assert!((no.no_failure_or_maintenance - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_tab_empty_group_is_undefined() {
        let data = vec![record("M1", 1.0, "Normal", "Normal", Flag::No)];
        let tab = anomaly_failure_cross_tab(&data);
        assert!(tab.percentages(Flag::Yes).is_none());
        assert_eq!(tab.row(Flag::Yes).unwrap().records, 0);
        assert!(tab.percentages(Flag::No).is_some());
    }

    #[test]
    fn test_extremum_ties_use_first_record() {
        let data = vec![
            record("A", 10.0, "Normal", "Normal", Flag::No),
            record("B", 99.0, "Normal", "Normal", Flag::No),
            record("C", 10.0, "Normal", "Normal", Flag::No),
            record("D", 99.0, "Normal", "Normal", Flag::No),
        ];
        let ext = column_extremum(&data, NumericColumn::Temperature).unwrap();
        assert_eq!(ext.min.machine, "A");
        assert_eq!(ext.max.machine, "B");
    }

    #[test]
    fn test_extremum_single_row_and_missing_readings() {
        let mut data = vec![
            record("A", f64::NAN, "Normal", "Normal", Flag::No),
            record("B", 42.0, "Normal", "Normal", Flag::No),
        ];
        let ext = column_extremum(&data, NumericColumn::Temperature).unwrap();
        assert_eq!(ext.min, ext.max);
        assert_eq!(ext.min.machine, "B");

        data.truncate(1);
        assert!(column_extremum(&data, NumericColumn::Temperature).is_none());
    }

    #[test]
    fn test_column_stats() {
        let data: Vec<SensorRecord> = [1.0, 2.0, 3.0, 4.0, 5.0]
            .into_iter()
            .map(|t| record("M1", t, "Normal", "Normal", Flag::No))
            .collect();
        let stats = column_stats(&data, NumericColumn::Temperature).unwrap();
        assert_eq!(stats.count, 5);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.median - 3.0).abs() < 1e-12);
        assert!((stats.std_dev.unwrap() - 2.5_f64.sqrt()).abs() < 1e-12);
        assert!((stats.min - 1.0).abs() < f64::EPSILON);
        assert!((stats.max - 5.0).abs() < f64::EPSILON);
        assert!(stats.lower_quartile <= stats.median && stats.median <= stats.upper_quartile);

        let single = column_stats(&data[..1], NumericColumn::Temperature).unwrap();
        assert!(single.std_dev.is_none());
    }

    #[test]
    fn test_value_counts_order() {
        let data = vec![
            record("M1", 1.0, "Idle", "Normal", Flag::No),
            record("M1", 1.0, "Normal", "Normal", Flag::No),
            record("M1", 1.0, "Normal", "Normal", Flag::No),
            record("M1", 1.0, "Failure", "Overheat", Flag::No),
        ];
        let counts = value_counts(&data, CategoricalColumn::MachineStatus);
        let labels: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Normal", "Idle", "Failure"]);
        assert_eq!(counts[0].count, 2);

        let flags = value_counts(&data, CategoricalColumn::AnomalyFlag);
        assert_eq!(flags, vec![ValueCount { label: "No".to_string(), count: 4 }]);
    }
}
