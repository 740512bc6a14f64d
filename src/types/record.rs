//! One observation from a manufacturing machine.

use super::column::{CategoricalColumn, Column, NumericColumn};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `machine_status` label of a machine in failure.
pub const FAILURE_STATUS: &str = "Failure";

/// `failure_type` label meaning no failure occurred.
pub const NO_FAILURE_TYPE: &str = "Normal";

// ============================================================================
// Yes/No flags
// ============================================================================

/// A boolean column written as "Yes"/"No" in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Flag {
    No,
    Yes,
}

impl Flag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::No => "No",
            Self::Yes => "Yes",
        }
    }

    pub const fn is_yes(self) -> bool {
        matches!(self, Self::Yes)
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        if b {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "t" | "1" => Ok(Self::Yes),
            "no" | "n" | "false" | "f" | "0" => Ok(Self::No),
            other => Err(format!("Cannot parse '{other}' as Yes/No")),
        }
    }
}

// ============================================================================
// Sensor record
// ============================================================================

/// A single row of the cleaned machine dataset.
///
/// `timestamp` keeps the text exactly as read so exports reproduce the
/// source; `datetime` is its parsed UTC value and is what filters compare.
/// Missing measurements are stored as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub timestamp: String,
    pub datetime: DateTime<Utc>,
    pub machine: String,
    pub machine_status: String,
    pub failure_type: String,
    pub anomaly_flag: Flag,
    pub maintenance_required: Flag,
    pub temperature: f64,
    pub vibration: f64,
    pub pressure: f64,
    pub energy_consumption: f64,
    pub humidity: f64,
}

impl SensorRecord {
    /// The machine is in failure or is flagged for maintenance.
    pub fn failure_or_maintenance(&self) -> bool {
        self.machine_status == FAILURE_STATUS || self.maintenance_required.is_yes()
    }

    /// A failure type other than the no-failure label was recorded.
    pub fn has_failure(&self) -> bool {
        self.failure_type != NO_FAILURE_TYPE
    }

    pub const fn is_anomalous(&self) -> bool {
        self.anomaly_flag.is_yes()
    }

    pub const fn reading(&self, column: NumericColumn) -> f64 {
        match column {
            NumericColumn::Temperature => self.temperature,
            NumericColumn::Vibration => self.vibration,
            NumericColumn::Pressure => self.pressure,
            NumericColumn::EnergyConsumption => self.energy_consumption,
            NumericColumn::Humidity => self.humidity,
        }
    }

    pub fn label(&self, column: CategoricalColumn) -> &str {
        match column {
            CategoricalColumn::Machine => &self.machine,
            CategoricalColumn::MachineStatus => &self.machine_status,
            CategoricalColumn::FailureType => &self.failure_type,
            CategoricalColumn::AnomalyFlag => self.anomaly_flag.as_str(),
            CategoricalColumn::MaintenanceRequired => self.maintenance_required.as_str(),
        }
    }

    /// Canonical CSV text of a field. Missing readings become an empty cell.
    pub fn field_text(&self, column: Column) -> String {
        if let Some(numeric) = column.as_numeric() {
            let value = self.reading(numeric);
            return if value.is_nan() {
                String::new()
            } else {
                value.to_string()
            };
        }
        match column.as_categorical() {
            Some(categorical) => self.label(categorical).to_string(),
            None => self.timestamp.clone(),
        }
    }

    /// JSON value of a field; missing readings become `null`.
    pub fn field_json(&self, column: Column) -> serde_json::Value {
        match column.as_numeric() {
            Some(numeric) => serde_json::Number::from_f64(self.reading(numeric))
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            None => serde_json::Value::String(self.field_text(column)),
        }
    }
}

// ============================================================================
// Timestamp parsing
// ============================================================================

/// Naive layouts tried in order; values without an offset are UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a dataset timestamp into UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f][+hh:mm]`, the naive layouts
/// above, bare dates (midnight) and Unix epoch seconds or milliseconds.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim().trim_matches('"');
    if s.is_empty() {
        return Err("Empty timestamp".to_string());
    }

    if let Ok(epoch) = s.parse::<i64>() {
        let (secs, nanos) = if epoch.unsigned_abs() > 10_000_000_000 {
            (epoch.div_euclid(1000), (epoch.rem_euclid(1000) * 1_000_000) as u32)
        } else {
            (epoch, 0)
        };
        return DateTime::from_timestamp(secs, nanos)
            .ok_or_else(|| format!("Epoch out of range: '{s}'"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    parse_date(s)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("Cannot parse timestamp '{s}'"))
}

/// Parse the upper bound of a period.
///
/// A bare date covers that whole day, so the bound becomes the last
/// representable instant of the date. Anything else parses as usual.
pub fn parse_period_end(s: &str) -> Result<DateTime<Utc>, String> {
    if let Some(date) = parse_date(s.trim().trim_matches('"')) {
        let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| "Invalid end-of-day time".to_string())?;
        return Ok(date.and_time(end_of_day).and_utc());
    }
    parse_timestamp(s)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%d/%m/%Y"]
        .into_iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
