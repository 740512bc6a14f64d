//! Column identifiers for the machine sensor table.
//!
//! The dataset has a fixed, documented column set. Column names arrive as
//! strings from CSV headers, query parameters and CLI flags, so every enum
//! here parses from its snake_case name and fails with
//! [`InvalidColumnError`] on anything else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A column name that does not exist, or exists but has the wrong kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidColumnError {
    #[error("Unknown column '{0}'")]
    Unknown(String),

    #[error("Column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("Column '{0}' is not categorical")]
    NotCategorical(String),
}

// ============================================================================
// Column
// ============================================================================

/// Every column of the cleaned dataset, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Timestamp,
    Machine,
    MachineStatus,
    FailureType,
    AnomalyFlag,
    MaintenanceRequired,
    Temperature,
    Vibration,
    Pressure,
    EnergyConsumption,
    Humidity,
}

impl Column {
    pub const ALL: [Self; 11] = [
        Self::Timestamp,
        Self::Machine,
        Self::MachineStatus,
        Self::FailureType,
        Self::AnomalyFlag,
        Self::MaintenanceRequired,
        Self::Temperature,
        Self::Vibration,
        Self::Pressure,
        Self::EnergyConsumption,
        Self::Humidity,
    ];

    /// Header name as it appears in the CSV file.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Machine => "machine",
            Self::MachineStatus => "machine_status",
            Self::FailureType => "failure_type",
            Self::AnomalyFlag => "anomaly_flag",
            Self::MaintenanceRequired => "maintenance_required",
            Self::Temperature => "temperature",
            Self::Vibration => "vibration",
            Self::Pressure => "pressure",
            Self::EnergyConsumption => "energy_consumption",
            Self::Humidity => "humidity",
        }
    }

    pub const fn as_numeric(self) -> Option<NumericColumn> {
        match self {
            Self::Temperature => Some(NumericColumn::Temperature),
            Self::Vibration => Some(NumericColumn::Vibration),
            Self::Pressure => Some(NumericColumn::Pressure),
            Self::EnergyConsumption => Some(NumericColumn::EnergyConsumption),
            Self::Humidity => Some(NumericColumn::Humidity),
            _ => None,
        }
    }

    pub const fn as_categorical(self) -> Option<CategoricalColumn> {
        match self {
            Self::Machine => Some(CategoricalColumn::Machine),
            Self::MachineStatus => Some(CategoricalColumn::MachineStatus),
            Self::FailureType => Some(CategoricalColumn::FailureType),
            Self::AnomalyFlag => Some(CategoricalColumn::AnomalyFlag),
            Self::MaintenanceRequired => Some(CategoricalColumn::MaintenanceRequired),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = InvalidColumnError;

    /// Header names are matched after trimming, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('\u{feff}');
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InvalidColumnError::Unknown(wanted.to_string()))
    }
}

// ============================================================================
// Numeric measurements
// ============================================================================

/// The sensor measurement columns (real-valued readings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericColumn {
    Temperature,
    Vibration,
    Pressure,
    EnergyConsumption,
    Humidity,
}

impl NumericColumn {
    pub const ALL: [Self; 5] = [
        Self::Temperature,
        Self::Vibration,
        Self::Pressure,
        Self::EnergyConsumption,
        Self::Humidity,
    ];

    pub const fn column(self) -> Column {
        match self {
            Self::Temperature => Column::Temperature,
            Self::Vibration => Column::Vibration,
            Self::Pressure => Column::Pressure,
            Self::EnergyConsumption => Column::EnergyConsumption,
            Self::Humidity => Column::Humidity,
        }
    }

    pub const fn name(self) -> &'static str {
        self.column().name()
    }
}

impl fmt::Display for NumericColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumericColumn {
    type Err = InvalidColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let column: Column = s.parse()?;
        column
            .as_numeric()
            .ok_or_else(|| InvalidColumnError::NotNumeric(column.name().to_string()))
    }
}

impl From<NumericColumn> for Column {
    fn from(c: NumericColumn) -> Self {
        c.column()
    }
}

// ============================================================================
// Categorical labels
// ============================================================================

/// Columns holding labels rather than measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalColumn {
    Machine,
    MachineStatus,
    FailureType,
    AnomalyFlag,
    MaintenanceRequired,
}

impl CategoricalColumn {
    pub const fn column(self) -> Column {
        match self {
            Self::Machine => Column::Machine,
            Self::MachineStatus => Column::MachineStatus,
            Self::FailureType => Column::FailureType,
            Self::AnomalyFlag => Column::AnomalyFlag,
            Self::MaintenanceRequired => Column::MaintenanceRequired,
        }
    }
}

impl FromStr for CategoricalColumn {
    type Err = InvalidColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let column: Column = s.parse()?;
        column
            .as_categorical()
            .ok_or_else(|| InvalidColumnError::NotCategorical(column.name().to_string()))
    }
}
