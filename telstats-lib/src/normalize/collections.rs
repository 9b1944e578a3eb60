//! Steps that change the shape of collections.

use crate::schema::ConvertArrayToMap;
use crate::tree::{StatsMap, StatsValue};

const ITEMS: &str = "items";

/// The first member of a map (in key order) or list. Empty collections become `Undefined`.
pub fn first_entry(value: StatsValue) -> StatsValue {
    match value {
        StatsValue::Map(map) => map.into_values().next().unwrap_or_default(),
        StatsValue::List(items) => items.into_iter().next().unwrap_or_default(),
        other => other,
    }
}

/// Re-key records by one of their fields.
///
/// Accepts a list of records or a map with an `items` list. A map without `items`
/// yields an empty map. Records lacking a usable key are dropped.
pub fn convert_array_to_map(value: StatsValue, convert: &ConvertArrayToMap) -> StatsValue {
    let items = match value {
        StatsValue::List(items) => items,
        StatsValue::Map(mut map) => match map.remove(ITEMS) {
            Some(StatsValue::List(items)) => items,
            _ => return StatsValue::Map(StatsMap::new()),
        },
        other => return other,
    };

    let mut out = StatsMap::new();
    for item in items {
        let StatsValue::Map(mut record) = item else {
            continue;
        };

        let key = match record.get(&convert.key_name) {
            Some(StatsValue::Text(s)) => s.to_string(),
            Some(StatsValue::UInt(u)) => u.to_string(),
            Some(StatsValue::Int(i)) => i.to_string(),
            _ => continue,
        };

        if convert.drop_key {
            let _ = record.remove(&convert.key_name);
        }

        let _ = out.insert(key, StatsValue::Map(record));
    }

    StatsValue::Map(out)
}
