use compact_str::CompactString;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Sentinel stored in descriptive fields whose source data is absent.
pub const MISSING_DATA: &str = "missing data";

pub type StatsMap = BTreeMap<String, StatsValue>;

/// A dynamically typed statistic value.
///
/// `Undefined` marks a value that was not collected (not applicable in the current
/// configuration, or an empty table). It is kept in maps so that every declared key
/// is present, but it is skipped when serializing and flattening.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StatsValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    Text(CompactString),
    List(Vec<Self>),
    Map(StatsMap),
}

impl StatsValue {
    /// The descriptive-field sentinel.
    #[must_use]
    pub fn missing_data() -> Self {
        Self::Text(MISSING_DATA.into())
    }

    /// The numeric sentinel produced when a value cannot be read as a number.
    #[must_use]
    pub const fn nan() -> Self {
        Self::Float(f64::NAN)
    }

    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn is_missing_data(&self) -> bool {
        matches!(self, Self::Text(s) if s == MISSING_DATA)
    }

    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::UInt(_) | Self::Int(_) | Self::Float(_))
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&StatsMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map_mut(&mut self) -> Option<&mut StatsMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the value as a float, converting integers. Text is not parsed.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "statistics tolerate precision loss above 2^53")]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::UInt(u) => Some(*u as f64),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Look up a member of a map value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Walk a path of map keys.
    #[must_use]
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Self> {
        path.iter().try_fold(self, |value, segment| value.get(segment.as_ref()))
    }

    /// Read a counter from its textual form.
    ///
    /// Integers keep their exact width; anything that is not a number becomes NaN.
    #[must_use]
    pub fn parse_number(text: &str) -> Self {
        let text = text.trim();
        if let Ok(u) = text.parse::<u64>() {
            Self::UInt(u)
        } else if let Ok(i) = text.parse::<i64>() {
            Self::Int(i)
        } else {
            text.parse::<f64>().map_or_else(|_| Self::nan(), Self::Float)
        }
    }

    /// Convert into plain JSON. `Undefined` members are dropped and NaN becomes `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::Undefined | Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::UInt(u) => Value::from(*u),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.to_string()),
            Self::List(items) => Value::Array(items.iter().filter(|v| !v.is_undefined()).map(Self::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for StatsValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n
                .as_u64()
                .map(Self::UInt)
                .or_else(|| n.as_i64().map(Self::Int))
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(Self::nan),
            Value::String(s) => Self::Text(s.into()),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

impl From<&str> for StatsValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<StatsMap> for StatsValue {
    fn from(value: StatsMap) -> Self {
        Self::Map(value)
    }
}

impl Serialize for StatsValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Undefined | Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::UInt(u) => serializer.serialize_u64(*u),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(None)?;
                for item in items.iter().filter(|v| !v.is_undefined()) {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => {
                let mut out = serializer.serialize_map(None)?;
                for (key, value) in map.iter().filter(|(_, v)| !v.is_undefined()) {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_integer_width() {
        let value = StatsValue::from(json!({"big": 18_446_744_073_709_551_615_u64, "neg": -5, "f": 1.5}));
        assert_eq!(value.get("big"), Some(&StatsValue::UInt(u64::MAX)));
        assert_eq!(value.get("neg"), Some(&StatsValue::Int(-5)));
        assert_eq!(value.get("f"), Some(&StatsValue::Float(1.5)));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(StatsValue::parse_number("42"), StatsValue::UInt(42));
        assert_eq!(StatsValue::parse_number(" -7 "), StatsValue::Int(-7));
        assert_eq!(StatsValue::parse_number("0.25"), StatsValue::Float(0.25));
        assert!(StatsValue::parse_number("spam").as_f64().is_some_and(f64::is_nan));
        assert!(StatsValue::parse_number(MISSING_DATA).as_f64().is_some_and(f64::is_nan));
    }

    #[test]
    fn test_undefined_members_are_not_serialized() {
        let mut map = StatsMap::new();
        let _ = map.insert("a".into(), StatsValue::UInt(1));
        let _ = map.insert("b".into(), StatsValue::Undefined);
        let value = StatsValue::Map(map);

        assert_eq!(serde_json::to_value(&value).unwrap(), json!({"a": 1}));
        assert_eq!(value.to_json(), json!({"a": 1}));
    }

    #[test]
    fn test_nan_serializes_as_null() {
        assert_eq!(serde_json::to_string(&StatsValue::nan()).unwrap(), "null");
        assert_eq!(StatsValue::nan().to_json(), json!(null));
    }

    #[test]
    fn test_get_path() {
        let value = StatsValue::from(json!({"a": {"b": {"c": "x"}}}));
        assert_eq!(value.get_path(&["a", "b", "c"]), Some(&StatsValue::from("x")));
        assert_eq!(value.get_path(&["a", "missing"]), None);
        assert_eq!(value.get_path::<&str>(&[]), Some(&value));
    }

    #[test]
    fn test_missing_data_sentinel() {
        assert!(StatsValue::missing_data().is_missing_data());
        assert!(!StatsValue::from("other").is_missing_data());
    }
}
