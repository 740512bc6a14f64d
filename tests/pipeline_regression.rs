//! Pipeline Regression Tests
//!
//! Runs the filter and aggregation pipeline over a seeded synthetic dataset
//! and asserts on properties that must hold for any filter: conjunction,
//! partitioning, count conservation and cache consistency.

use sensor_explorer::pipeline::{filter, recompute, Dataset, ViewCache};
use sensor_explorer::synthetic::{SyntheticSpec, FAILURE_TYPES};
use sensor_explorer::types::{FilterCriteria, Flag, NumericColumn, Period};
use std::sync::Arc;

fn demo_dataset() -> Arc<Dataset> {
    Arc::new(Dataset::synthetic(SyntheticSpec {
        seed: 7,
        machines: 5,
        readings_per_machine: 120,
        ..SyntheticSpec::default()
    }))
}

#[test]
fn test_select_all_keeps_every_row() {
    let dataset = demo_dataset();
    let view = recompute(&dataset, &FilterCriteria::select_all(), 10);

    assert_eq!(view.len(), 600);
    assert_eq!(view.metrics().summary.total_records, 600);
    assert_eq!(view.metrics().summary.distinct_machines, 5);
    assert_eq!(view.shape().to_string(), "600 rows x 11 columns");
}

#[test]
fn test_full_domain_selection_matches_sentinel() {
    let dataset = demo_dataset();
    let domain = dataset.domain().clone();
    let range = domain.period.unwrap();
    let explicit = FilterCriteria::select_all()
        .with_period(Period::between(range.start, range.end))
        .with_machines(domain.machines.iter().cloned())
        .with_statuses(domain.statuses.iter().cloned())
        .with_failure_types(domain.failure_types.iter().cloned());

    let a = recompute(&dataset, &explicit, 10);
    let b = recompute(&dataset, &FilterCriteria::select_all(), 10);
    assert_eq!(a.len(), b.len());
    assert_eq!(a.metrics(), b.metrics());
}

#[test]
fn test_filtered_rows_satisfy_every_predicate() {
    let dataset = demo_dataset();
    let criteria = FilterCriteria::select_all()
        .with_machines(["Machine_01", "Machine_03"])
        .with_statuses(["Normal", "Failure"]);
    let rows = filter(dataset.records(), &criteria);

    assert!(!rows.is_empty());
    for row in &rows {
        assert!(row.machine == "Machine_01" || row.machine == "Machine_03");
        assert!(row.machine_status == "Normal" || row.machine_status == "Failure");
    }
    let expected = dataset
        .records()
        .iter()
        .filter(|r| {
            (r.machine == "Machine_01" || r.machine == "Machine_03")
                && (r.machine_status == "Normal" || r.machine_status == "Failure")
        })
        .count();
    assert_eq!(rows.len(), expected);
}

#[test]
fn test_machine_selections_partition_the_dataset() {
    let dataset = demo_dataset();
    let total: usize = dataset
        .domain()
        .machines
        .iter()
        .map(|m| recompute(&dataset, &FilterCriteria::select_all().with_machines([m.as_str()]), 10).len())
        .sum();
    assert_eq!(total, dataset.len());
}

#[test]
fn test_anomaly_counts_are_conserved() {
    let dataset = demo_dataset();
    let view = recompute(&dataset, &FilterCriteria::select_all(), usize::MAX);
    let metrics = view.metrics();

    let anomalous = view.rows().filter(|r| r.anomaly_flag == Flag::Yes).count();
    let ranked: usize = metrics.top_anomalous.iter().map(|m| m.count).sum();
    assert_eq!(ranked, anomalous);
    assert!(metrics
        .top_anomalous
        .windows(2)
        .all(|w| w[0].count >= w[1].count));

    let cross_tab_rows: usize = metrics.anomaly_cross_tab.rows.iter().map(|r| r.records).sum();
    assert_eq!(cross_tab_rows, view.len());
    let yes = metrics.anomaly_cross_tab.row(Flag::Yes).unwrap();
    assert_eq!(yes.records, anomalous);
}

#[test]
fn test_cross_tab_percentages_sum_to_hundred() {
    let dataset = demo_dataset();
    let view = recompute(&dataset, &FilterCriteria::select_all(), 10);
    for flag in [Flag::No, Flag::Yes] {
        if let Some(p) = view.metrics().anomaly_cross_tab.percentages(flag) {
            let sum = p.failure_or_maintenance + p.no_failure_or_maintenance;
            assert!((sum - 100.0).abs() < 1e-9, "{flag}: {sum}");
        }
    }
}

#[test]
fn test_failure_types_come_from_the_generator() {
    let dataset = demo_dataset();
    let view = recompute(&dataset, &FilterCriteria::select_all().with_statuses(["Failure"]), 10);

    assert_eq!(view.metrics().summary.failure_records, view.len());
    for slice in &view.metrics().failure_type_distribution {
        assert!(FAILURE_TYPES.contains(&slice.label.as_str()), "{}", slice.label);
    }
}

#[test]
fn test_stats_are_ordered() {
    let dataset = demo_dataset();
    let view = recompute(&dataset, &FilterCriteria::select_all(), 10);

    for column in NumericColumn::ALL {
        let stats = view.metrics().stats(column).unwrap();
        let extremum = view.metrics().extremum(column).unwrap();
        assert_eq!(stats.count, 600);
        assert!(stats.min <= stats.lower_quartile);
        assert!(stats.lower_quartile <= stats.median);
        assert!(stats.median <= stats.upper_quartile);
        assert!(stats.upper_quartile <= stats.max);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert_eq!(stats.min, extremum.min.value);
        assert_eq!(stats.max, extremum.max.value);
    }
}

#[test]
fn test_empty_period_yields_zero_row_metrics() {
    let dataset = demo_dataset();
    let range = dataset.domain().period.unwrap();
    let before = range.start - chrono::Duration::days(30);
    let criteria = FilterCriteria::select_all()
        .with_period(Period::between(before, before + chrono::Duration::days(1)));
    let view = recompute(&dataset, &criteria, 10);

    assert!(view.is_empty());
    assert_eq!(view.metrics().summary, Default::default());
    assert!(view.metrics().top_anomalous.is_empty());
    assert!(view.metrics().extrema.is_empty());
    assert!(view.metrics().stats.is_empty());
    assert_eq!(view.metrics().anomaly_cross_tab.rows.len(), 2);
}

#[test]
fn test_cache_serves_equivalent_criteria_once() {
    let dataset = demo_dataset();
    let mut cache = ViewCache::new(8);
    let all_machines = dataset.domain().machines.iter().cloned();

    let first = cache.get_or_compute(&dataset, &FilterCriteria::select_all(), 10);
    let second = cache.get_or_compute(&dataset, &FilterCriteria::select_all().with_machines(all_machines), 10);
    assert!(Arc::ptr_eq(&first, &second));

    let narrowed = cache.get_or_compute(&dataset, &FilterCriteria::select_all().with_machines(["Machine_02"]), 10);
    assert!(narrowed.len() < first.len());

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
}

#[test]
fn test_reloaded_synthetic_dataset_yields_same_view() {
    let dataset = demo_dataset();
    let reloaded = Arc::new(dataset.reload(Default::default()).unwrap());
    assert_eq!(reloaded.version(), dataset.version() + 1);

    let mut cache = ViewCache::new(8);
    let before = cache.get_or_compute(&dataset, &FilterCriteria::select_all(), 10);
    let after = cache.get_or_compute(&reloaded, &FilterCriteria::select_all(), 10);
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.metrics(), after.metrics());
}

#[test]
fn test_two_machine_scenario_end_to_end() {
    use sensor_explorer::types::{parse_timestamp, SensorRecord};

    let row = |ts: &str, machine: &str, temp: f64, status: &str, failure: &str, anomaly: Flag| SensorRecord {
        timestamp: ts.to_string(),
        datetime: parse_timestamp(ts).unwrap(),
        machine: machine.to_string(),
        machine_status: status.to_string(),
        failure_type: failure.to_string(),
        anomaly_flag: anomaly,
        maintenance_required: Flag::No,
        temperature: temp,
        vibration: 0.3,
        pressure: 100.0,
        energy_consumption: 3.0,
        humidity: 45.0,
    };
    let dataset = Arc::new(Dataset::from_records(vec![
        row("2024-01-01 00:00:00", "M1", 50.0, "Normal", "Normal", Flag::No),
        row("2024-01-01 00:10:00", "M2", 90.0, "Failure", "Overheat", Flag::Yes),
    ]));

    let all = recompute(&dataset, &FilterCriteria::select_all(), 10);
    let metrics = all.metrics();
    assert_eq!(metrics.summary.total_records, 2);
    assert_eq!(metrics.summary.distinct_machines, 2);
    assert_eq!(metrics.summary.failure_records, 1);
    let temperature = metrics.extremum(NumericColumn::Temperature).unwrap();
    assert_eq!((temperature.max.value, temperature.max.machine.as_str()), (90.0, "M2"));
    assert_eq!(metrics.top_anomalous.len(), 1);
    assert_eq!(metrics.top_anomalous[0].machine, "M2");
    assert_eq!(metrics.top_anomalous[0].count, 1);

    let m1 = recompute(&dataset, &FilterCriteria::select_all().with_machines(["M1"]), 10);
    let metrics = m1.metrics();
    assert_eq!(metrics.summary.total_records, 1);
    assert_eq!(metrics.summary.failure_records, 0);
    assert!(metrics.top_anomalous.is_empty());
    assert_eq!(metrics.extremum(NumericColumn::Temperature).unwrap().max.machine, "M1");
    assert!(metrics.failure_type_distribution.iter().all(|c| c.label != "Overheat"));
}
