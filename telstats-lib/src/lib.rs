#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for telstats
//!
//! This library consolidates all functionality for the telstats tool, which polls
//! a device management API and turns its heterogeneous responses into a single
//! normalized statistics tree.
//!
//! # Module Organization
//!
//! - [`schema`]: Declarative endpoint and property definitions
//! - [`expr`]: Conditional reduction of property definitions
//! - [`collect`]: Request resolution, deduplication and execution
//! - [`normalize`]: Typed transform pipelines over raw responses
//! - [`tree`]: Statistics tree assembly and flattening
//! - [`engine`]: Collection cycles and polling
//! - [`reports`]: Output formats for consumers
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod collect;
pub mod engine;
pub mod expr;
pub mod normalize;
pub mod reports;
pub mod schema;
pub mod tree;

pub use crate::commands::{Host, run};
