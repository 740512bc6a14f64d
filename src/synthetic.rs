//! Seeded generator of a plausible machine sensor dataset.
//!
//! Used by `--demo` mode and by tests that need more rows than a hand-written
//! fixture. The same spec always yields the same records.

use crate::types::{Flag, SensorRecord, FAILURE_STATUS, NO_FAILURE_TYPE};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

/// Failure types drawn for machines in failure.
pub const FAILURE_TYPES: [&str; 4] = ["Overheating", "Vibration Issue", "Pressure Drop", "Electrical Fault"];

const IDLE_STATUS: &str = "Idle";
const NORMAL_STATUS: &str = "Normal";

/// Chance that a reading is anomalous.
const ANOMALY_RATE: f64 = 0.06;
/// Chance of failure for an anomalous / a regular reading.
const FAILURE_RATE_ANOMALOUS: f64 = 0.35;
const FAILURE_RATE_REGULAR: f64 = 0.02;
const IDLE_RATE: f64 = 0.12;

/// Parameters of a synthetic dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub seed: u64,
    pub machines: usize,
    pub readings_per_machine: usize,
    pub start: DateTime<Utc>,
    /// Seconds between consecutive readings of one machine.
    pub interval_secs: i64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            seed: 42,
            machines: 8,
            readings_per_machine: 250,
            // 2024-01-01T00:00:00Z
            start: DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default(),
            interval_secs: 600,
        }
    }
}

impl SyntheticSpec {
    pub fn machine_name(index: usize) -> String {
        format!("Machine_{:02}", index + 1)
    }
}

/// Per-machine operating point, so machines are distinguishable.
struct Baseline {
    temperature: f64,
    vibration: f64,
    pressure: f64,
    energy: f64,
    humidity: f64,
}

fn gaussian(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + z * std_dev
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Generate the records, ordered by time then machine.
pub fn generate(spec: &SyntheticSpec) -> Vec<SensorRecord> {
    let mut rng = StdRng::seed_from_u64(spec.seed);

    let baselines: Vec<Baseline> = (0..spec.machines)
        .map(|_| Baseline {
            temperature: rng.gen_range(60.0..80.0),
            vibration: rng.gen_range(0.2..0.6),
            pressure: rng.gen_range(95.0..110.0),
            energy: rng.gen_range(2.0..6.0),
            humidity: rng.gen_range(35.0..55.0),
        })
        .collect();

    let mut records = Vec::with_capacity(spec.machines * spec.readings_per_machine);
    for step in 0..spec.readings_per_machine {
        let Some(datetime) = Duration::try_seconds(spec.interval_secs.saturating_mul(step as i64))
            .and_then(|offset| spec.start.checked_add_signed(offset))
        else {
            tracing::warn!(step, interval_secs = spec.interval_secs, "Synthetic timestamps out of range, truncating");
            break;
        };
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S").to_string();

        for (idx, base) in baselines.iter().enumerate() {
            let anomalous = rng.gen_bool(ANOMALY_RATE);
            // Anomalous readings run hot and shaky.
            let stress = if anomalous { rng.gen_range(1.15..1.45) } else { 1.0 };

            let failed = rng.gen_bool(if anomalous {
                FAILURE_RATE_ANOMALOUS
            } else {
                FAILURE_RATE_REGULAR
            });
            let status = if failed {
                FAILURE_STATUS
            } else if rng.gen_bool(IDLE_RATE) {
                IDLE_STATUS
            } else {
                NORMAL_STATUS
            };
            let failure_type = if failed {
                FAILURE_TYPES[rng.gen_range(0..FAILURE_TYPES.len())]
            } else {
                NO_FAILURE_TYPE
            };
            let maintenance = failed || (anomalous && rng.gen_bool(0.5));
            let load = if status == IDLE_STATUS { 0.4 } else { 1.0 };

            records.push(SensorRecord {
                timestamp: timestamp.clone(),
                datetime,
                machine: SyntheticSpec::machine_name(idx),
                machine_status: status.to_string(),
                failure_type: failure_type.to_string(),
                anomaly_flag: Flag::from(anomalous),
                maintenance_required: Flag::from(maintenance),
                temperature: round2(gaussian(&mut rng, base.temperature * stress, 2.5)),
                vibration: round2(gaussian(&mut rng, base.vibration * stress, 0.05).max(0.0)),
                pressure: round2(gaussian(&mut rng, base.pressure, 3.0)),
                energy_consumption: round2(gaussian(&mut rng, base.energy * load, 0.3).max(0.0)),
                humidity: round2(gaussian(&mut rng, base.humidity, 4.0).clamp(0.0, 100.0)),
            });
        }
    }

    tracing::debug!(
        seed = spec.seed,
        machines = spec.machines,
        records = records.len(),
        "Generated synthetic sensor dataset"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SyntheticSpec {
        SyntheticSpec {
            machines: 3,
            readings_per_machine: 50,
            ..SyntheticSpec::default()
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate(&small());
        let b = generate(&small());
        assert_eq!(a.len(), 150);
        assert_eq!(a.len(), b.len());
        assert!(a
            .iter()
            .zip(&b)
            .all(|(x, y)| x.machine == y.machine && x.temperature == y.temperature));
    }

    #[test]
    fn test_records_are_consistent() {
        for record in generate(&small()) {
            if record.machine_status == FAILURE_STATUS {
                assert_ne!(record.failure_type, NO_FAILURE_TYPE);
                assert!(record.maintenance_required.is_yes());
            } else {
                assert_eq!(record.failure_type, NO_FAILURE_TYPE);
            }
            assert!(record.vibration >= 0.0);
            assert!((0.0..=100.0).contains(&record.humidity));
        }
    }

    #[test]
    fn test_time_ordering() {
        let records = generate(&small());
        assert!(records.windows(2).all(|w| w[0].datetime <= w[1].datetime));
        assert_eq!(records[0].timestamp, "2024-01-01 00:00:00");
        assert_eq!(records[3].timestamp, "2024-01-01 00:10:00");
    }

    #[test]
    fn test_huge_interval_truncates_instead_of_panicking() {
        let spec = SyntheticSpec {
            machines: 2,
            readings_per_machine: 4,
            interval_secs: i64::MAX,
            ..SyntheticSpec::default()
        };
        let records = generate(&spec);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, "2024-01-01 00:00:00");
    }

    #[test]
    fn test_empty_spec() {
        let spec = SyntheticSpec {
            machines: 0,
            ..SyntheticSpec::default()
        };
        assert!(generate(&spec).is_empty());
    }
}
