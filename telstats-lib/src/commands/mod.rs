//! Command-line interface and orchestration for telstats
//!
//! This module implements the CLI commands and wires the schema, transport,
//! command channel and engine together from the configuration file.
//!
//! ## Commands
//!
//! - **collect**: Run a single collection cycle and write the statistics tree as
//!   JSON, or as flattened `name value` lines
//! - **poll**: Run cycles on the configured interval until interrupted, writing
//!   each completed cycle
//! - **init**: Generate a default configuration file
//! - **validate**: Check the configuration file and the schema it names
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate handler. All output goes through the [`Host`] trait so the
//! commands can run against in-memory buffers in tests.

mod collect;
mod common;
mod config;
mod host;
mod init;
mod poll;
mod run;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use collect::{CollectArgs, collect_once};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use poll::{PollArgs, poll};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
