use crate::collect::DeviceVersion;
use crate::expr::Expression;
use serde::Deserialize;

/// A single test against the collection context.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The named module is provisioned at any level other than `none`.
    ModuleProvisioned(String),

    /// The named module is absent or provisioned at level `none`.
    ModuleNotProvisioned(String),

    /// The device version is at least the given dotted version.
    VersionAtLeast(String),

    /// The device version is strictly below the given dotted version.
    VersionBelow(String),

    /// A CEL expression that must evaluate to `true`.
    Expression(Expression),
}

/// The `if` object of a conditional property. Every condition must hold.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPredicate")]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    #[must_use]
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawPredicate {
    is_module_provisioned: Option<String>,
    is_module_not_provisioned: Option<String>,
    device_version_greater_or_equal: Option<String>,
    device_version_less_than: Option<String>,
    expression: Option<Expression>,
}

impl TryFrom<RawPredicate> for Predicate {
    type Error = String;

    fn try_from(raw: RawPredicate) -> Result<Self, Self::Error> {
        let conditions: Vec<_> = [
            raw.is_module_provisioned.map(Condition::ModuleProvisioned),
            raw.is_module_not_provisioned.map(Condition::ModuleNotProvisioned),
            raw.device_version_greater_or_equal.map(Condition::VersionAtLeast),
            raw.device_version_less_than.map(Condition::VersionBelow),
            raw.expression.map(Condition::Expression),
        ]
        .into_iter()
        .flatten()
        .collect();

        if conditions.is_empty() {
            return Err("an 'if' clause needs at least one condition".to_string());
        }

        for condition in &conditions {
            if let Condition::VersionAtLeast(v) | Condition::VersionBelow(v) = condition
                && DeviceVersion::parse(v).is_none()
            {
                return Err(format!("'{v}' is not a dotted version"));
            }
        }

        Ok(Self { conditions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_conditions() {
        let predicate: Predicate =
            serde_json::from_str(r#"{"isModuleProvisioned": "asm", "deviceVersionGreaterOrEqual": "14.1"}"#).unwrap();

        assert_eq!(
            predicate.conditions(),
            &[Condition::ModuleProvisioned("asm".into()), Condition::VersionAtLeast("14.1".into())]
        );
    }

    #[test]
    fn test_parse_expression_condition() {
        let predicate: Predicate = serde_json::from_str(r#"{"expression": "hostname.startsWith('bigip')"}"#).unwrap();
        assert!(matches!(predicate.conditions(), [Condition::Expression(_)]));
    }

    #[test]
    fn test_empty_if_is_rejected() {
        let _ = serde_json::from_str::<Predicate>("{}").unwrap_err();
    }

    #[test]
    fn test_unknown_condition_is_rejected() {
        let _ = serde_json::from_str::<Predicate>(r#"{"isModuleLicensed": "afm"}"#).unwrap_err();
    }

    #[test]
    fn test_version_operands_must_parse() {
        let _ = serde_json::from_str::<Predicate>(r#"{"deviceVersionLessThan": "13.1.0"}"#).unwrap();
        let _ = serde_json::from_str::<Predicate>(r#"{"deviceVersionLessThan": "thirteen"}"#).unwrap_err();
    }
}
