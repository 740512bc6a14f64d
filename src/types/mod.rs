//! Shared data structures for the machine sensor explorer
//!
//! - `record`: SensorRecord (one dataset row), Yes/No flags, timestamp parsing
//! - `column`: column identifiers and their numeric/categorical subsets
//! - `criteria`: FilterCriteria built from the sidebar widgets, FilterDomain
//! - `aggregates`: summary counts, rankings, cross-tab, extrema, statistics

mod aggregates;
mod column;
mod criteria;
mod record;

pub use aggregates::*;
pub use column::*;
pub use criteria::*;
pub use record::*;
