//! Collection cycles
//!
//! A cycle runs in three phases. The context properties are collected first, since
//! every condition in the schema reads them. Each statistic property is then reduced
//! against that context and resolved to a request. Finally the distinct requests
//! are issued concurrently and each property's value is extracted, normalized and
//! placed into the [`StatsTree`](crate::tree::StatsTree).
//!
//! [`Engine::run_cycle`] always yields a structurally complete tree. A cycle
//! abandoned through [`Engine::run_cycle_until`] yields nothing at all. [`Poller`]
//! repeats cycles on an interval and hands each output to a [`StatsSink`].

mod cycle;
mod failures;
mod options;
mod poller;

pub use cycle::{CycleOutput, Engine};
pub use failures::{CollectionFailure, failure_report, log_failures};
pub use options::{EngineOptions, FailureReporting};
pub use poller::{Poller, StatsSink};
