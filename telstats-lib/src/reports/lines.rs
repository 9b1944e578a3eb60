use crate::Result;
use crate::collect::CollectionContext;
use crate::tree::{StatsTree, flatten};
use core::fmt::Write;

const UNKNOWN_HOST: &str = "unknown-host";

/// The `<namespace>.<host>` prefix of every metric name.
///
/// Dots in the hostname would split it into several name segments, so they become
/// dashes.
#[must_use]
pub fn metric_prefix(namespace: &str, context: &CollectionContext) -> String {
    let host = context.hostname().unwrap_or(UNKNOWN_HOST).replace('.', "-");
    if namespace.is_empty() {
        host
    } else {
        format!("{namespace}.{host}")
    }
}

/// Write one `name value` line per numeric leaf of the consumer view of a tree.
pub fn generate<W: Write>(tree: &StatsTree, prefix: &str, writer: &mut W) -> Result<()> {
    let collapsed = tree.collapse_folders();
    for sample in flatten(&collapsed, prefix) {
        writeln!(writer, "{sample}")?;
    }
    Ok(())
}
