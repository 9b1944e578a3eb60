//! The statistics tree produced by each collection cycle.
//!
//! Values are dynamically typed ([`StatsValue`]) because their shape is dictated by
//! the device responses and the declarative normalization steps, not by Rust types.
//! [`StatsTree::assemble`] places property outcomes into folders and [`flatten`]
//! turns the result into dotted metric samples for line-oriented sinks.

mod flatten;
mod stats_tree;
mod stats_value;

pub use flatten::{MetricSample, SampleValue, Samples, flatten};
pub use stats_tree::{PropertyOutcome, StatsTree};
pub use stats_value::{MISSING_DATA, StatsMap, StatsValue};
