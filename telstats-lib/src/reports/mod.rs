//! Output formats for collected statistics
//!
//! Both generators work on the consumer view of a [`StatsTree`](crate::tree::StatsTree),
//! where folder nodes are collapsed to their `stats` objects:
//! - **JSON**: the whole tree as a single pretty-printed object
//! - **Lines**: one `name value` line per numeric leaf, named by the dotted path
//!   below a `<namespace>.<host>` prefix, for line-oriented metric sinks

mod json;
mod lines;

pub use json::generate as generate_json;
pub use lines::{generate as generate_lines, metric_prefix};
