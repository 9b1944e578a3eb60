//! Turning raw responses into statistic values.

use crate::tree::{StatsMap, StatsValue};

const ENTRIES: &str = "entries";
const NESTED_STATS: &str = "nestedStats";

/// A response as received from a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    Json(serde_json::Value),
    Text(String),
}

/// Shape a raw response into a statistic value.
///
/// JSON responses have their nested-stats envelopes unwrapped. Text responses are
/// parsed as a table with a header row; a table without data rows is `Undefined`.
#[must_use]
pub fn shape(raw: RawResponse) -> StatsValue {
    match raw {
        RawResponse::Json(json) => unwrap_nested_stats(StatsValue::from(json)),
        RawResponse::Text(text) => parse_table(&text),
    }
}

/// Flatten the `entries`/`nestedStats` envelopes of the management API.
///
/// `{"entries": {"<uri>": {"nestedStats": {"entries": {...}}}}}` becomes a map keyed
/// by the last path segment of each URI, and `{"value": x}` or `{"description": s}`
/// leaves inside an envelope become `x` and `s`. Values without envelopes are
/// returned unchanged.
#[must_use]
pub fn unwrap_nested_stats(value: StatsValue) -> StatsValue {
    unwrap(value, false)
}

fn unwrap(value: StatsValue, in_envelope: bool) -> StatsValue {
    match value {
        StatsValue::Map(mut map) => {
            if let Some(StatsValue::Map(entries)) = map.get_mut(ENTRIES) {
                return StatsValue::Map(unwrap_entries(core::mem::take(entries)));
            }
            if let Some(StatsValue::Map(nested)) = map.get_mut(NESTED_STATS) {
                return unwrap(StatsValue::Map(core::mem::take(nested)), true);
            }
            if in_envelope && map.len() == 1 {
                let leaf = map.remove("value").or_else(|| map.remove("description"));
                if let Some(leaf) = leaf {
                    return leaf;
                }
            }
            StatsValue::Map(map.into_iter().map(|(k, v)| (k, unwrap(v, in_envelope))).collect())
        }
        StatsValue::List(items) => StatsValue::List(items.into_iter().map(|v| unwrap(v, in_envelope)).collect()),
        other => other,
    }
}

fn unwrap_entries(entries: StatsMap) -> StatsMap {
    entries
        .into_iter()
        .map(|(key, entry)| (entry_key(&key), unwrap(entry, true)))
        .collect()
}

/// `https://localhost/mgmt/tm/ltm/virtual/~Common~vs1/stats` becomes `~Common~vs1`.
fn entry_key(key: &str) -> String {
    if !key.contains('/') {
        return key.to_string();
    }

    let path = key.split('?').next().unwrap_or(key).trim_end_matches('/');
    let path = path.strip_suffix("/stats").unwrap_or(path);
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Parse tabular command output.
///
/// The first line is the header. Comma-separated output is read as CSV; anything else
/// is split on runs of whitespace. Each data row becomes a map of text values.
#[must_use]
pub fn parse_table(text: &str) -> StatsValue {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let Some(header) = lines.first() else {
        return StatsValue::Undefined;
    };

    let delimited = if header.contains(',') {
        lines.join("\n")
    } else {
        lines
            .iter()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(delimited.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(_) => return StatsValue::Undefined,
    };

    let rows: Vec<StatsValue> = reader
        .records()
        .filter_map(Result::ok)
        .map(|record| {
            let row: StatsMap = headers
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.to_string(), StatsValue::from(cell)))
                .collect();
            StatsValue::Map(row)
        })
        .collect();

    if rows.is_empty() { StatsValue::Undefined } else { StatsValue::List(rows) }
}
