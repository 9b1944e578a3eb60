//! Steps that rewrite map keys.

use crate::Result;
use crate::schema::{FilterKeys, KeyMatcher, KeyStyle, RenameKeys, ReshapeKeys};
use crate::tree::{StatsMap, StatsValue};
use ohno::bail;

pub fn filter_keys(value: StatsValue, filter: &FilterKeys) -> StatsValue {
    let value = if filter.exclude.is_empty() {
        value
    } else {
        exclude_deep(value, &filter.exclude)
    };

    if filter.include.is_empty() && filter.pattern.is_none() {
        return value;
    }

    if !filter.each {
        return allow(value, filter);
    }

    match value {
        StatsValue::Map(map) => StatsValue::Map(map.into_iter().map(|(k, v)| (k, allow(v, filter))).collect()),
        StatsValue::List(items) => StatsValue::List(items.into_iter().map(|v| allow(v, filter)).collect()),
        other => other,
    }
}

fn exclude_deep(value: StatsValue, exclude: &[KeyMatcher]) -> StatsValue {
    match value {
        StatsValue::Map(map) => StatsValue::Map(
            map.into_iter()
                .filter(|(key, _)| !exclude.iter().any(|m| m.is_match(key)))
                .map(|(key, v)| (key, exclude_deep(v, exclude)))
                .collect(),
        ),
        StatsValue::List(items) => StatsValue::List(items.into_iter().map(|v| exclude_deep(v, exclude)).collect()),
        other => other,
    }
}

fn allow(value: StatsValue, filter: &FilterKeys) -> StatsValue {
    match value {
        StatsValue::Map(map) => StatsValue::Map(
            map.into_iter()
                .filter(|(key, _)| {
                    filter.include.iter().any(|k| k == key) || filter.pattern.as_ref().is_some_and(|p| p.is_match(key))
                })
                .collect(),
        ),
        other => other,
    }
}

pub fn rename_keys(value: StatsValue, rename: &RenameKeys) -> StatsValue {
    match value {
        StatsValue::Map(map) => StatsValue::Map(
            map.into_iter()
                .map(|(key, v)| (renamed(key, rename), rename_keys(v, rename)))
                .collect(),
        ),
        StatsValue::List(items) => StatsValue::List(items.into_iter().map(|v| rename_keys(v, rename)).collect()),
        other => other,
    }
}

fn renamed(key: String, rename: &RenameKeys) -> String {
    for rule in &rename.rules {
        match &rule.from {
            KeyMatcher::Exact(from) if *from == key => return rule.to.clone(),
            KeyMatcher::Regex(pattern) if pattern.is_match(&key) => {
                return pattern.regex().replace(&key, rule.to.as_str()).into_owned();
            }
            _ => {}
        }
    }
    key
}

/// Convert the canonical dotted keys to the requested layout.
///
/// # Errors
///
/// Returns an error when nesting would place a value and a map at the same key, as in
/// `{"a": 1, "a.b": 2}`.
pub fn reshape_keys(value: StatsValue, reshape: &ReshapeKeys) -> Result<StatsValue> {
    match value {
        StatsValue::Map(map) => {
            let mut out = StatsMap::new();
            for (key, v) in map {
                let v = reshape_keys(v, reshape)?;
                match reshape.style {
                    KeyStyle::Flat => {
                        let _ = out.insert(key.replace('.', &reshape.separator), v);
                    }
                    KeyStyle::Nested => insert_nested(&mut out, &key, v)?,
                }
            }
            Ok(StatsValue::Map(out))
        }
        StatsValue::List(items) => items
            .into_iter()
            .map(|v| reshape_keys(v, reshape))
            .collect::<Result<Vec<_>>>()
            .map(StatsValue::List),
        other => Ok(other),
    }
}

fn insert_nested(out: &mut StatsMap, key: &str, value: StatsValue) -> Result<()> {
    let mut segments: Vec<&str> = key.split('.').collect();
    let Some(last) = segments.pop() else {
        return Ok(());
    };

    let mut current = out;
    for segment in segments {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| StatsValue::Map(StatsMap::new()));
        let Some(map) = slot.as_map_mut() else {
            bail!("cannot nest '{key}' under non-map value '{segment}'");
        };
        current = map;
    }

    if !current.contains_key(last) {
        let _ = current.insert(last.to_string(), value);
        return Ok(());
    }

    match (current.get_mut(last), value) {
        (Some(StatsValue::Map(existing)), StatsValue::Map(incoming)) => {
            for (k, v) in incoming {
                insert_nested(existing, &k, v)?;
            }
            Ok(())
        }
        _ => bail!("conflicting values for '{key}' while nesting keys"),
    }
}
