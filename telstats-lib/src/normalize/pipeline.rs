use super::{collections, keys, numbers, tags};
use crate::Result;
use crate::collect::unwrap_nested_stats;
use crate::schema::TransformStep;
use crate::tree::StatsValue;
use ohno::EnrichableExt;

impl TransformStep {
    /// Apply this step to a value.
    ///
    /// # Errors
    ///
    /// Returns an error only for inputs the step cannot represent, such as dotted keys
    /// that collide when nested.
    pub fn apply(&self, value: StatsValue) -> Result<StatsValue> {
        Ok(match self {
            Self::UnwrapEntries => unwrap_nested_stats(value),
            Self::FirstEntry => collections::first_entry(value),
            Self::FilterKeys(filter) => keys::filter_keys(value, filter),
            Self::RenameKeys(rename) => keys::rename_keys(value, rename),
            Self::ReshapeKeys(reshape) => keys::reshape_keys(value, reshape)?,
            Self::ConvertArrayToMap(convert) => collections::convert_array_to_map(value, convert),
            Self::AddTags(add) => tags::add_tags(value, add),
            Self::CoerceNumbers(coerce) => numbers::coerce_numbers(value, coerce),
            Self::DefaultMissing(defaults) => numbers::default_missing(value, defaults),
            Self::PercentFromKeys(percent) => numbers::percent_from_keys(value, percent),
            Self::Average(aggregate) => numbers::average(value, aggregate),
            Self::Sum(aggregate) => numbers::sum(value, aggregate),
        })
    }
}

/// Run `steps` over `value` in order.
///
/// An `Undefined` value (nothing collected) is returned as is.
///
/// # Errors
///
/// Returns the error of the first failing step, naming the step.
pub fn normalize(value: StatsValue, steps: &[TransformStep]) -> Result<StatsValue> {
    if value.is_undefined() {
        return Ok(value);
    }

    steps.iter().enumerate().try_fold(value, |value, (index, step)| {
        step.apply(value)
            .map_err(|e| e.enrich_with(|| format!("normalization step {} ('{}')", index + 1, step.name())))
    })
}

/// Select the value at `path` within a response. A path that misses yields `missing data`.
#[must_use]
pub fn extract<S: AsRef<str>>(value: &StatsValue, path: &[S]) -> StatsValue {
    if path.is_empty() {
        return value.clone();
    }

    value.get_path(path).cloned().unwrap_or_else(StatsValue::missing_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn steps(json: &str) -> Vec<TransformStep> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_provisioning_pipeline() {
        let raw = StatsValue::from(json!({
            "kind": "tm:sys:provision:provisioncollectionstate",
            "items": [{"name": "afm", "level": "none", "cpuRatio": 0}]
        }));

        let out = normalize(
            raw,
            &steps(
                r#"[
                    {"convertArrayToMap": {"keyName": "name"}},
                    {"filterKeys": {"include": ["name", "level"], "each": true}}
                ]"#,
            ),
        )
        .unwrap();

        assert_eq!(out.to_json(), json!({"afm": {"name": "afm", "level": "none"}}));
    }

    #[test]
    fn test_csv_tag_pipeline() {
        let raw = crate::collect::parse_table("a,b,c,someKey\n1,2,spam,/Tenant/app/test");

        let out = normalize(
            raw,
            &steps(r#"["firstEntry", {"addTags": {"sourceKey": "someKey", "nameKey": "name"}}]"#),
        )
        .unwrap();

        assert_eq!(
            out.to_json(),
            json!({
                "a": "1", "b": "2", "c": "spam", "someKey": "/Tenant/app/test",
                "tenant": "Tenant", "application": "app", "name": "/Tenant/app/test"
            })
        );
    }

    #[test]
    fn test_undefined_is_not_normalized() {
        let out = normalize(StatsValue::Undefined, &steps(r#"[{"defaultMissing": {"keys": ["x"]}}]"#)).unwrap();
        assert!(out.is_undefined());
    }

    #[test]
    fn test_failing_step_is_reported() {
        // firstEntry yields a scalar, which reshape passes through
        let out = normalize(
            StatsValue::from(json!({"a": 1, "a.b": 2})),
            &steps(r#"["firstEntry", {"reshapeKeys": {"style": "nested"}}]"#),
        )
        .unwrap();
        assert_eq!(out, StatsValue::UInt(1));

        let err = normalize(
            StatsValue::from(json!({"a": 1, "a.b": 2})),
            &steps(r#"[{"reshapeKeys": {"style": "nested"}}]"#),
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot nest"));
    }

    #[test]
    fn test_extract() {
        let value = StatsValue::from(json!({"a": {"b": 1}}));
        assert_eq!(extract(&value, &["a", "b"]), StatsValue::UInt(1));
        assert!(extract(&value, &["a", "x"]).is_missing_data());
        assert_eq!(extract::<&str>(&value, &[]), value);
    }
}
