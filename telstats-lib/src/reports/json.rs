use crate::Result;
use crate::tree::StatsTree;
use core::fmt::Write;
use ohno::IntoAppError;

/// Write the consumer view of a tree as pretty-printed JSON.
///
/// Folder nodes are collapsed to their `stats` objects and values that were not
/// collected are omitted. NaN counters are written as `null`.
pub fn generate<W: Write>(tree: &StatsTree, writer: &mut W) -> Result<()> {
    let text = serde_json::to_string_pretty(&tree.collapse_folders()).into_app_err("serializing statistics")?;
    writeln!(writer, "{text}")?;
    Ok(())
}
