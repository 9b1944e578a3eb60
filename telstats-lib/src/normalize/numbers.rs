//! Numeric coercion, sentinels and derived numbers.

use crate::schema::{Aggregate, CoerceNumbers, DefaultMissing, PercentFromKeys};
use crate::tree::StatsValue;

/// Parse textual counters. With no keys the value itself is coerced, otherwise the
/// named keys of every map at any depth.
pub fn coerce_numbers(value: StatsValue, coerce: &CoerceNumbers) -> StatsValue {
    if coerce.keys.is_empty() {
        return coerce_one(value);
    }

    match value {
        StatsValue::Map(map) => StatsValue::Map(
            map.into_iter()
                .map(|(key, v)| {
                    let v = if coerce.keys.contains(&key) {
                        coerce_one(v)
                    } else {
                        coerce_numbers(v, coerce)
                    };
                    (key, v)
                })
                .collect(),
        ),
        StatsValue::List(items) => StatsValue::List(items.into_iter().map(|v| coerce_numbers(v, coerce)).collect()),
        other => other,
    }
}

fn coerce_one(value: StatsValue) -> StatsValue {
    match value {
        StatsValue::Text(text) => StatsValue::parse_number(&text),
        v @ (StatsValue::UInt(_) | StatsValue::Int(_) | StatsValue::Float(_) | StatsValue::Undefined) => v,
        StatsValue::Bool(b) => StatsValue::UInt(u64::from(b)),
        StatsValue::Null | StatsValue::List(_) | StatsValue::Map(_) => StatsValue::nan(),
    }
}

/// Fill absent keys of a map with the configured default.
pub fn default_missing(value: StatsValue, defaults: &DefaultMissing) -> StatsValue {
    let StatsValue::Map(mut map) = value else {
        return value;
    };

    let fill = defaults
        .value
        .clone()
        .map_or_else(StatsValue::missing_data, StatsValue::from);

    for key in &defaults.keys {
        let slot = map.entry(key.clone()).or_default();
        if slot.is_undefined() || matches!(slot, StatsValue::Null) {
            *slot = fill.clone();
        }
    }

    StatsValue::Map(map)
}

/// `round(part / total * 100)`, either replacing the value or stored beside its inputs.
pub fn percent_from_keys(value: StatsValue, percent: &PercentFromKeys) -> StatsValue {
    let (Some(part), Some(total)) = (
        value.get(&percent.part).and_then(numeric),
        value.get(&percent.total).and_then(numeric),
    ) else {
        return value;
    };

    let result = if total.abs() < f64::EPSILON {
        StatsValue::nan()
    } else {
        from_f64((part / total * 100.0).round())
    };

    match (value, &percent.output) {
        (StatsValue::Map(mut map), Some(output)) => {
            let _ = map.insert(output.clone(), result);
            StatsValue::Map(map)
        }
        _ => result,
    }
}

/// Mean of one field across the members of a collection. NaN when no member has it.
pub fn average(value: StatsValue, aggregate: &Aggregate) -> StatsValue {
    let Some(samples) = samples(&value, &aggregate.key) else {
        return value;
    };

    if samples.is_empty() {
        return StatsValue::nan();
    }

    #[expect(clippy::cast_precision_loss, reason = "member counts are small")]
    let count = samples.len() as f64;
    from_f64(samples.iter().sum::<f64>() / count)
}

/// Total of one field across the members of a collection.
pub fn sum(value: StatsValue, aggregate: &Aggregate) -> StatsValue {
    samples(&value, &aggregate.key).map_or(value, |samples| from_f64(samples.iter().sum()))
}

fn samples(value: &StatsValue, key: &str) -> Option<Vec<f64>> {
    let members: Vec<&StatsValue> = match value {
        StatsValue::Map(map) => map.values().collect(),
        StatsValue::List(items) => items.iter().collect(),
        _ => return None,
    };

    Some(members.into_iter().filter_map(|m| m.get(key)).filter_map(numeric).collect())
}

fn numeric(value: &StatsValue) -> Option<f64> {
    match value {
        StatsValue::Text(text) => StatsValue::parse_number(text).as_f64().filter(|f| !f.is_nan()),
        other => other.as_f64(),
    }
}

/// Whole non-negative results stay integers so they print without a fraction.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "range and fraction are checked first"
)]
fn from_f64(f: f64) -> StatsValue {
    if f.is_finite() && f >= 0.0 && f.fract().abs() < f64::EPSILON && f < u64::MAX as f64 {
        StatsValue::UInt(f as u64)
    } else {
        StatsValue::Float(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_value_itself() {
        let coerce = CoerceNumbers::default();
        assert_eq!(coerce_numbers(StatsValue::from("42"), &coerce), StatsValue::UInt(42));
        assert_eq!(coerce_numbers(StatsValue::from("-3"), &coerce), StatsValue::Int(-3));
        assert_eq!(coerce_numbers(StatsValue::from("1.5"), &coerce), StatsValue::Float(1.5));
        assert!(coerce_numbers(StatsValue::Undefined, &coerce).is_undefined());
    }

    #[test]
    fn test_coerce_failure_is_nan() {
        let coerce = CoerceNumbers::default();
        let StatsValue::Float(f) = coerce_numbers(StatsValue::from("spam"), &coerce) else {
            panic!("expected a float");
        };
        assert!(f.is_nan());
    }

    #[test]
    fn test_coerce_named_keys_at_any_depth() {
        let coerce = CoerceNumbers {
            keys: vec!["a".into(), "b".into()],
        };
        let value = StatsValue::from(json!([{"a": "1", "b": "2", "c": "spam"}]));
        assert_eq!(
            coerce_numbers(value, &coerce).to_json(),
            json!([{"a": 1, "b": 2, "c": "spam"}])
        );
    }

    #[test]
    fn test_default_missing() {
        let defaults = DefaultMissing {
            keys: vec!["description".into(), "name".into()],
            value: None,
        };
        let out = default_missing(StatsValue::from(json!({"name": "vs"})), &defaults);
        assert_eq!(out.to_json(), json!({"name": "vs", "description": "missing data"}));

        let defaults = DefaultMissing {
            keys: vec!["count".into()],
            value: Some(json!(0)),
        };
        let out = default_missing(StatsValue::from(json!({"count": null})), &defaults);
        assert_eq!(out.to_json(), json!({"count": 0}));
    }

    #[test]
    fn test_percent_from_keys() {
        let percent = PercentFromKeys {
            part: "used".into(),
            total: "size".into(),
            output: None,
        };
        assert_eq!(
            percent_from_keys(StatsValue::from(json!({"used": 1, "size": 3})), &percent),
            StatsValue::UInt(33)
        );

        let percent = PercentFromKeys {
            output: Some("usedPercent".into()),
            ..percent
        };
        assert_eq!(
            percent_from_keys(StatsValue::from(json!({"used": "50", "size": "200"})), &percent).to_json(),
            json!({"used": "50", "size": "200", "usedPercent": 25})
        );
    }

    #[test]
    fn test_percent_passes_through_without_inputs() {
        let percent = PercentFromKeys {
            part: "used".into(),
            total: "size".into(),
            output: None,
        };
        let value = StatsValue::from(json!({"used": 1}));
        assert_eq!(percent_from_keys(value.clone(), &percent), value);
    }

    #[test]
    fn test_average_and_sum() {
        let aggregate = Aggregate { key: "cpu".into() };
        let value = StatsValue::from(json!({"0": {"cpu": 10}, "1": {"cpu": "20"}, "2": {"mem": 5}}));

        assert_eq!(average(value.clone(), &aggregate), StatsValue::UInt(15));
        assert_eq!(sum(value, &aggregate), StatsValue::UInt(30));

        let StatsValue::Float(f) = average(StatsValue::from(json!([])), &aggregate) else {
            panic!("expected a float");
        };
        assert!(f.is_nan());
    }
}
