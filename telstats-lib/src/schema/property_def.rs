use super::{Pattern, Predicate, TransformStep};
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use serde::Deserialize;
use std::collections::BTreeMap;

const KEY_SEPARATOR: &str = "::";

/// Where a property's value comes from: `endpoint::sub::path`.
///
/// The endpoint part is either the name of a declared endpoint or a literal API path
/// starting with `/`. The sub-path selects a member of the shaped response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct PropertyKey {
    endpoint: String,
    path: Vec<String>,
}

impl PropertyKey {
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl FromStr for PropertyKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(KEY_SEPARATOR);
        let endpoint = parts.next().unwrap_or_default().trim();
        if endpoint.is_empty() {
            return Err(format!("property key '{s}' does not name an endpoint"));
        }

        let path: Vec<String> = parts.map(|p| p.trim().to_string()).collect();
        if path.iter().any(String::is_empty) {
            return Err(format!("property key '{s}' has an empty path segment"));
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            path,
        })
    }
}

impl TryFrom<String> for PropertyKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Display for PropertyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.endpoint)?;
        for segment in &self.path {
            write!(f, "{KEY_SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

/// A substitution applied to the endpoint template before it is issued.
///
/// The pattern is a regular expression; the value may contain `${hostname}` or
/// `${version}` placeholders that are filled from the collection context.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub pattern: Pattern,
    pub value: String,
}

/// Per-property arguments for the endpoint template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeyArgs {
    #[serde(default, deserialize_with = "deserialize_replacements")]
    pub replace_strings: Vec<Replacement>,
}

fn deserialize_replacements<'de, D>(deserializer: D) -> Result<Vec<Replacement>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error as DeError;

    BTreeMap::<String, String>::deserialize(deserializer)?
        .into_iter()
        .map(|(pattern, value)| {
            Pattern::new(&pattern)
                .map(|pattern| Replacement { pattern, value })
                .map_err(|e| D::Error::custom(format!("invalid replaceStrings pattern '{pattern}': {e}")))
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Structure {
    #[serde(default)]
    pub folder: bool,

    pub parent_key: Option<String>,
}

/// The overridable fields of a property. Conditional branches patch these.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFields {
    pub key: Option<PropertyKey>,
    pub key_args: Option<KeyArgs>,
    pub structure: Option<Structure>,
    pub normalization: Option<Vec<TransformStep>>,
    pub disabled: Option<bool>,
}

impl PropertyFields {
    /// Overlay every field the patch sets.
    pub fn merge(&mut self, patch: &Self) {
        if patch.key.is_some() {
            self.key.clone_from(&patch.key);
        }
        if patch.key_args.is_some() {
            self.key_args.clone_from(&patch.key_args);
        }
        if patch.structure.is_some() {
            self.structure.clone_from(&patch.structure);
        }
        if patch.normalization.is_some() {
            self.normalization.clone_from(&patch.normalization);
        }
        if patch.disabled.is_some() {
            self.disabled = patch.disabled;
        }
    }

    /// Decide what an unconditional set of fields describes.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields describe neither a leaf nor a folder.
    pub fn classify(self) -> Result<ReducedProperty, String> {
        if self.disabled == Some(true) {
            return Ok(ReducedProperty::Disabled);
        }

        let structure = self.structure.unwrap_or_default();
        if structure.folder {
            if self.key.is_some() {
                return Err("a folder cannot also have a key".to_string());
            }
            if structure.parent_key.is_some() {
                return Err("folders cannot be nested".to_string());
            }
            return Ok(ReducedProperty::Folder);
        }

        let Some(key) = self.key else {
            return Err("property has neither a key nor a folder structure".to_string());
        };

        Ok(ReducedProperty::Leaf(LeafProperty {
            key,
            key_args: self.key_args,
            parent_key: structure.parent_key,
            normalization: self.normalization.unwrap_or_default(),
        }))
    }
}

/// The fields of a `then` or `else` arm, possibly with a nested condition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPatch {
    pub fields: PropertyFields,
    pub branch: Option<Box<Branch>>,
}

/// An `if`/`then`/`else` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub predicate: Predicate,
    pub then: PropertyPatch,
    pub otherwise: PropertyPatch,
}

/// A property that reads one value from one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafProperty {
    pub key: PropertyKey,
    pub key_args: Option<KeyArgs>,
    pub parent_key: Option<String>,
    pub normalization: Vec<TransformStep>,
}

impl LeafProperty {
    #[must_use]
    pub fn new(key: PropertyKey) -> Self {
        Self {
            key,
            key_args: None,
            parent_key: None,
            normalization: Vec::new(),
        }
    }
}

/// A property whose shape depends on the collection context.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalProperty {
    pub base: PropertyFields,
    pub branch: Branch,
}

/// A property as declared in the schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawProperty")]
pub enum PropertyDefinition {
    Leaf(LeafProperty),
    Folder,
    Disabled,
    Conditional(Box<ConditionalProperty>),
}

/// A property after its conditions have been resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ReducedProperty {
    Leaf(LeafProperty),
    Folder,

    /// Not collected in this configuration. Its value is `Undefined`.
    Disabled,
}

impl From<ReducedProperty> for PropertyDefinition {
    fn from(value: ReducedProperty) -> Self {
        match value {
            ReducedProperty::Leaf(leaf) => Self::Leaf(leaf),
            ReducedProperty::Folder => Self::Folder,
            ReducedProperty::Disabled => Self::Disabled,
        }
    }
}

impl PropertyDefinition {
    /// Every shape this property can take, one per path through its conditions.
    ///
    /// # Errors
    ///
    /// Returns an error if any path leads to fields that describe neither a leaf
    /// nor a folder.
    pub fn variants(&self) -> Result<Vec<ReducedProperty>, String> {
        fn walk(fields: PropertyFields, branch: Option<&Branch>, out: &mut Vec<ReducedProperty>) -> Result<(), String> {
            let Some(branch) = branch else {
                out.push(fields.classify()?);
                return Ok(());
            };

            for patch in [&branch.then, &branch.otherwise] {
                let mut merged = fields.clone();
                merged.merge(&patch.fields);
                walk(merged, patch.branch.as_deref(), out)?;
            }

            Ok(())
        }

        let mut out = Vec::new();
        match self {
            Self::Leaf(leaf) => out.push(ReducedProperty::Leaf(leaf.clone())),
            Self::Folder => out.push(ReducedProperty::Folder),
            Self::Disabled => out.push(ReducedProperty::Disabled),
            Self::Conditional(conditional) => walk(conditional.base.clone(), Some(&conditional.branch), &mut out)?,
        }

        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawProperty {
    key: Option<PropertyKey>,
    key_args: Option<KeyArgs>,
    structure: Option<Structure>,
    normalization: Option<Vec<TransformStep>>,
    disabled: Option<bool>,

    /// Free text for schema authors.
    #[serde(default, rename = "comment")]
    _comment: Option<String>,

    #[serde(rename = "if")]
    condition: Option<Predicate>,
    then: Option<Box<Self>>,
    #[serde(rename = "else")]
    otherwise: Option<Box<Self>>,
}

impl RawProperty {
    fn into_patch(self) -> Result<PropertyPatch, String> {
        let fields = PropertyFields {
            key: self.key,
            key_args: self.key_args,
            structure: self.structure,
            normalization: self.normalization,
            disabled: self.disabled,
        };

        let branch = match (self.condition, self.then, self.otherwise) {
            (None, None, None) => None,
            (None, _, _) => return Err("'then' and 'else' require an 'if'".to_string()),
            (Some(_), None, _) => return Err("an 'if' requires a 'then'".to_string()),
            (Some(predicate), Some(then), otherwise) => Some(Box::new(Branch {
                predicate,
                then: (*then).into_patch()?,
                otherwise: otherwise.map(|o| (*o).into_patch()).transpose()?.unwrap_or_default(),
            })),
        };

        Ok(PropertyPatch { fields, branch })
    }
}

impl TryFrom<RawProperty> for PropertyDefinition {
    type Error = String;

    fn try_from(raw: RawProperty) -> Result<Self, Self::Error> {
        let patch = raw.into_patch()?;
        match patch.branch {
            None => patch.fields.classify().map(Self::from),
            Some(branch) => Ok(Self::Conditional(Box::new(ConditionalProperty {
                base: patch.fields,
                branch: *branch,
            }))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> PropertyDefinition {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_property_key_parsing() {
        let key: PropertyKey = "system::cpuInfo::usage".parse().unwrap();
        assert_eq!(key.endpoint(), "system");
        assert_eq!(key.path(), &["cpuInfo".to_string(), "usage".to_string()]);
        assert_eq!(key.to_string(), "system::cpuInfo::usage");

        let literal: PropertyKey = "/mgmt/tm/sys/version".parse().unwrap();
        assert_eq!(literal.endpoint(), "/mgmt/tm/sys/version");
        assert!(literal.path().is_empty());

        let _ = "".parse::<PropertyKey>().unwrap_err();
        let _ = "system::::x".parse::<PropertyKey>().unwrap_err();
    }

    #[test]
    fn test_parse_leaf() {
        let def = parse(
            r#"{"key": "system::hostname", "structure": {"parentKey": "system"}, "normalization": ["firstEntry"]}"#,
        );
        let PropertyDefinition::Leaf(leaf) = def else {
            panic!("expected a leaf");
        };
        assert_eq!(leaf.parent_key.as_deref(), Some("system"));
        assert_eq!(leaf.normalization, vec![TransformStep::FirstEntry]);
    }

    #[test]
    fn test_parse_folder_and_disabled() {
        assert_eq!(parse(r#"{"structure": {"folder": true}}"#), PropertyDefinition::Folder);
        assert_eq!(parse(r#"{"key": "x", "disabled": true}"#), PropertyDefinition::Disabled);
    }

    #[test]
    fn test_parse_key_args() {
        let def = parse(r#"{"key": "tmctl", "keyArgs": {"replaceStrings": {"\\$tmctlArgs": "-c cpu_info_stat"}}}"#);
        let PropertyDefinition::Leaf(leaf) = def else {
            panic!("expected a leaf");
        };
        let args = leaf.key_args.unwrap();
        assert_eq!(args.replace_strings.len(), 1);
        assert!(args.replace_strings[0].pattern.is_match("$tmctlArgs"));
        assert_eq!(args.replace_strings[0].value, "-c cpu_info_stat");
    }

    #[test]
    fn test_parse_conditional() {
        let def = parse(
            r#"{
                "key": "asmState::entries",
                "if": {"isModuleProvisioned": "asm"},
                "then": {"normalization": ["firstEntry"]},
                "else": {"disabled": true}
            }"#,
        );

        let PropertyDefinition::Conditional(conditional) = def else {
            panic!("expected a conditional");
        };
        assert!(conditional.base.key.is_some());
        assert_eq!(conditional.branch.otherwise.fields.disabled, Some(true));
    }

    #[test]
    fn test_variants_enumerate_every_path() {
        let def = parse(
            r#"{
                "key": "a",
                "if": {"deviceVersionGreaterOrEqual": "14.0"},
                "then": {
                    "if": {"isModuleProvisioned": "afm"},
                    "then": {"key": "b"},
                    "else": {"disabled": true}
                }
            }"#,
        );

        let variants = def.variants().unwrap();
        assert_eq!(variants.len(), 3);
        assert!(matches!(&variants[0], ReducedProperty::Leaf(l) if l.key.endpoint() == "b"));
        assert_eq!(variants[1], ReducedProperty::Disabled);
        assert!(matches!(&variants[2], ReducedProperty::Leaf(l) if l.key.endpoint() == "a"));
    }

    #[test]
    fn test_invalid_shapes_are_rejected() {
        let _ = serde_json::from_str::<PropertyDefinition>("{}").unwrap_err();
        let _ = serde_json::from_str::<PropertyDefinition>(r#"{"key": "a", "then": {}}"#).unwrap_err();
        let _ = serde_json::from_str::<PropertyDefinition>(r#"{"key": "a", "if": {"isModuleProvisioned": "afm"}}"#).unwrap_err();
        let _ = serde_json::from_str::<PropertyDefinition>(r#"{"key": "a", "structure": {"folder": true}}"#).unwrap_err();
        let _ = serde_json::from_str::<PropertyDefinition>(r#"{"key": "a", "bogus": 1}"#).unwrap_err();
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let mut base = PropertyFields {
            key: Some("a::x".parse().unwrap()),
            normalization: Some(vec![TransformStep::FirstEntry]),
            ..PropertyFields::default()
        };
        base.merge(&PropertyFields {
            key: Some("b".parse().unwrap()),
            ..PropertyFields::default()
        });

        assert_eq!(base.key.unwrap().to_string(), "b");
        assert_eq!(base.normalization, Some(vec![TransformStep::FirstEntry]));
    }
}
