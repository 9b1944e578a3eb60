use super::{StatsTree, StatsValue};
use core::fmt::{Display, Formatter};
use std::collections::btree_map;

/// A numeric leaf of the statistics tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    UInt(u64),
    Int(i64),
    Float(f64),
}

impl Display for SampleValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UInt(u) => write!(f, "{u}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

/// A dotted metric name paired with its numeric value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub value: SampleValue,
}

impl Display for MetricSample {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.name, self.value)
    }
}

/// Walk a tree depth-first and yield one sample per numeric leaf.
///
/// Names are the dotted join of the prefix and the key path (list items use their
/// index). Text, booleans and NaN are skipped. Each call starts a fresh traversal,
/// so iterating the same tree twice yields identical sequences.
#[must_use]
pub fn flatten<'a>(tree: &'a StatsTree, prefix: &str) -> Samples<'a> {
    Samples {
        stack: vec![Frame::Map {
            path: prefix.to_string(),
            entries: tree.root().iter(),
        }],
    }
}

/// Iterator returned by [`flatten`].
#[derive(Debug)]
pub struct Samples<'a> {
    stack: Vec<Frame<'a>>,
}

#[derive(Debug)]
enum Frame<'a> {
    Map {
        path: String,
        entries: btree_map::Iter<'a, String, StatsValue>,
    },
    List {
        path: String,
        items: core::iter::Enumerate<core::slice::Iter<'a, StatsValue>>,
    },
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

impl Iterator for Samples<'_> {
    type Item = MetricSample;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = match self.stack.last_mut()? {
                Frame::Map { path, entries } => entries.next().map(|(key, value)| (join(path, key), value)),
                Frame::List { path, items } => items.next().map(|(index, value)| (join(path, &index.to_string()), value)),
            };

            let Some((name, value)) = next else {
                let _ = self.stack.pop();
                continue;
            };

            let value = match value {
                StatsValue::Map(map) => {
                    self.stack.push(Frame::Map {
                        path: name,
                        entries: map.iter(),
                    });
                    continue;
                }
                StatsValue::List(list) => {
                    self.stack.push(Frame::List {
                        path: name,
                        items: list.iter().enumerate(),
                    });
                    continue;
                }
                StatsValue::UInt(u) => SampleValue::UInt(*u),
                StatsValue::Int(i) => SampleValue::Int(*i),
                StatsValue::Float(f) if f.is_finite() => SampleValue::Float(*f),
                _ => continue,
            };

            return Some(MetricSample { name, value });
        }
    }
}
