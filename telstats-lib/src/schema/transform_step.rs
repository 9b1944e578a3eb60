use super::{KeyMatcher, Pattern};
use serde::Deserialize;

/// One normalization operation applied to a raw response value.
///
/// Steps are written in the schema as externally tagged objects, for example
/// `{"filterKeys": {"exclude": ["kind"]}}`, or as bare strings for steps without
/// parameters (`"firstEntry"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformStep {
    /// Flatten `entries`/`nestedStats` envelopes into plain maps.
    UnwrapEntries,

    /// Replace a collection with its first member.
    FirstEntry,

    FilterKeys(FilterKeys),
    RenameKeys(RenameKeys),
    ReshapeKeys(ReshapeKeys),
    ConvertArrayToMap(ConvertArrayToMap),
    AddTags(AddTags),
    CoerceNumbers(CoerceNumbers),
    DefaultMissing(DefaultMissing),
    PercentFromKeys(PercentFromKeys),
    Average(Aggregate),
    Sum(Aggregate),
}

impl TransformStep {
    /// The schema name of the step, used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UnwrapEntries => "unwrapEntries",
            Self::FirstEntry => "firstEntry",
            Self::FilterKeys(_) => "filterKeys",
            Self::RenameKeys(_) => "renameKeys",
            Self::ReshapeKeys(_) => "reshapeKeys",
            Self::ConvertArrayToMap(_) => "convertArrayToMap",
            Self::AddTags(_) => "addTags",
            Self::CoerceNumbers(_) => "coerceNumbers",
            Self::DefaultMissing(_) => "defaultMissing",
            Self::PercentFromKeys(_) => "percentFromKeys",
            Self::Average(_) => "average",
            Self::Sum(_) => "sum",
        }
    }
}

/// Keep or drop keys.
///
/// `exclude` removes matching keys at every depth. `include` and `pattern` form an
/// allow-list applied to the value itself, or to each member of a collection when
/// `each` is set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterKeys {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<KeyMatcher>,

    pub pattern: Option<Pattern>,

    #[serde(default)]
    pub each: bool,
}

/// Rename keys at every depth. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenameKeys {
    pub rules: Vec<RenameRule>,
}

/// A single rename. Regex rules may use capture groups (`$1`) in `to`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RenameRule {
    pub from: KeyMatcher,
    pub to: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyStyle {
    /// `a.b` becomes `a<separator>b`
    #[default]
    Flat,

    /// `a.b` becomes `{a: {b: ...}}`
    Nested,
}

/// Convert dotted keys to a flat or nested layout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReshapeKeys {
    #[serde(default)]
    pub style: KeyStyle,

    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    "_".to_string()
}

/// Re-key an array of records (or an `items` envelope) by one of their fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConvertArrayToMap {
    pub key_name: String,

    /// Remove the key field from each record after re-keying.
    #[serde(default)]
    pub drop_key: bool,
}

/// Derive `tenant` and `application` tags from a `/tenant/app/object` path.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddTags {
    #[serde(default = "default_tag_source")]
    pub source_key: String,

    /// Also copy the full source value under this key.
    pub name_key: Option<String>,

    /// Tag names not to add.
    #[serde(default)]
    pub skip: Vec<String>,
}

fn default_tag_source() -> String {
    "name".to_string()
}

/// Parse textual counters into numbers. With no `keys`, the value itself is coerced.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CoerceNumbers {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Fill absent keys with a default (the `missing data` sentinel unless given).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DefaultMissing {
    pub keys: Vec<String>,
    pub value: Option<serde_json::Value>,
}

/// Compute `round(part / total * 100)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PercentFromKeys {
    pub part: String,
    pub total: String,

    /// Store the result under this key instead of replacing the value.
    pub output: Option<String>,
}

/// Reduce one field across the members of a collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Aggregate {
    pub key: String,
}
