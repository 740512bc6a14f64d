//! Built-in default values.
//!
//! Used when no config file is present or a key is omitted. Grouped by
//! config section.

// ============================================================================
// [dataset]
// ============================================================================

/// Cleaned dataset read at startup when no `--csv` path is given.
pub const DATASET_PATH: &str = "maquinas_limpo.csv";

// ============================================================================
// [server]
// ============================================================================

/// HTTP bind address. Overridden by `SENSOR_EXPLORER_ADDR` or `--addr`.
pub const SERVER_ADDR: &str = "0.0.0.0:8080";

/// Requests taking longer than this are aborted (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// [view]
// ============================================================================

/// Length of the "machines with most anomalies" ranking.
pub const TOP_N: usize = 10;

/// Views kept per dataset version.
pub const VIEW_CACHE_CAPACITY: usize = 32;

/// Rows per table page when the request gives no `limit`.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Upper bound on `limit` for one table page.
pub const MAX_PAGE_SIZE: usize = 1_000;

// ============================================================================
// [export]
// ============================================================================

/// File name offered for the CSV download.
pub const EXPORT_FILE_NAME: &str = "dados.csv";

// ============================================================================
// [demo]
// ============================================================================

pub const DEMO_SEED: u64 = 42;
pub const DEMO_MACHINES: usize = 8;
pub const DEMO_READINGS_PER_MACHINE: usize = 250;

/// Spacing of synthetic readings (seconds). 600 = one every 10 minutes.
pub const DEMO_INTERVAL_SECS: i64 = 600;

/// Largest accepted reading spacing (seconds): one reading per year.
pub const MAX_DEMO_INTERVAL_SECS: i64 = 365 * 86_400;
