use super::{StatsMap, StatsValue};
use serde::Serialize;

const FOLDER_FLAG: &str = "folder";
const FOLDER_STATS: &str = "stats";

/// The result of collecting one property, ready to be placed in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyOutcome {
    /// A grouping node that other properties can attach to.
    Folder { name: String },

    /// A collected value, optionally attached to a folder.
    Value {
        name: String,
        parent_key: Option<String>,
        value: StatsValue,
    },
}

/// The assembled statistics of one collection cycle.
///
/// Folder nodes have the shape `{ "folder": true, "stats": { ... } }`. Use
/// [`StatsTree::collapse_folders`] to get the view consumers see, where each folder
/// is replaced by its `stats` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatsTree {
    root: StatsMap,
}

impl StatsTree {
    /// Build a tree from property outcomes.
    ///
    /// Folders are created before any value is placed, so a child can never land
    /// before its parent regardless of the order in which outcomes arrive. A value
    /// naming a parent that has no folder gets a folder created for it.
    #[must_use]
    pub fn assemble(outcomes: impl IntoIterator<Item = PropertyOutcome>) -> Self {
        let mut tree = Self::default();
        let mut values = Vec::new();

        for outcome in outcomes {
            match outcome {
                PropertyOutcome::Folder { name } => {
                    let _ = tree.folder_stats(&name);
                }
                PropertyOutcome::Value { name, parent_key, value } => values.push((name, parent_key, value)),
            }
        }

        for (name, parent_key, value) in values {
            match parent_key {
                Some(parent) => {
                    let _ = tree.folder_stats(&parent).insert(name, value);
                }
                None => {
                    let _ = tree.root.insert(name, value);
                }
            }
        }

        tree
    }

    /// Returns the `stats` map of the named folder, creating the folder if needed.
    fn folder_stats(&mut self, name: &str) -> &mut StatsMap {
        let node = self.root.entry(name.to_string()).or_default();
        if !is_folder(node) {
            let mut folder = StatsMap::new();
            let _ = folder.insert(FOLDER_FLAG.into(), StatsValue::Bool(true));
            let _ = folder.insert(FOLDER_STATS.into(), StatsValue::Map(StatsMap::new()));
            *node = StatsValue::Map(folder);
        }

        match node.as_map_mut().and_then(|folder| folder.get_mut(FOLDER_STATS)) {
            Some(StatsValue::Map(stats)) => stats,
            _ => unreachable!("folder node was just normalized"),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StatsValue> {
        self.root.get(key)
    }

    #[must_use]
    pub const fn root(&self) -> &StatsMap {
        &self.root
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Produce the consumer view, replacing each folder node with its `stats` object.
    #[must_use]
    pub fn collapse_folders(&self) -> Self {
        let root = self
            .root
            .iter()
            .map(|(name, node)| {
                let node = match node.get(FOLDER_STATS) {
                    Some(stats) if is_folder(node) => stats.clone(),
                    _ => node.clone(),
                };
                (name.clone(), node)
            })
            .collect();

        Self { root }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        StatsValue::Map(self.root.clone()).to_json()
    }
}

fn is_folder(node: &StatsValue) -> bool {
    matches!(node.get(FOLDER_FLAG), Some(StatsValue::Bool(true))) && matches!(node.get(FOLDER_STATS), Some(StatsValue::Map(_)))
}
