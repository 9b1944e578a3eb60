//! Typed transform pipelines
//!
//! Each property lists the [`TransformStep`](crate::schema::TransformStep)s that turn
//! the raw response into its published value. Steps are total: input they do not
//! apply to passes through unchanged, and unreadable numbers become NaN rather than
//! errors. The only failures are structural ones such as colliding keys while
//! nesting, which the engine records and degrades to `missing data`.

mod collections;
mod keys;
mod numbers;
mod pipeline;
mod tags;

pub use pipeline::{extract, normalize};
pub use tags::{ResourceTags, parse_resource_name};
