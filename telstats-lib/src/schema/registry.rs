use super::{EndpointTemplate, LeafProperty, PropertyDefinition, ReducedProperty};
use crate::Result;
use camino::Utf8Path;
use ohno::{EnrichableExt, IntoAppError, app_err, bail};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;

const LOG_TARGET: &str = "  schema";

/// The schema compiled into the binary.
pub const BUILTIN_SCHEMA: &str = include_str!("../../default_schema.json");

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    #[serde(default)]
    endpoints: BTreeMap<String, EndpointTemplate>,

    #[serde(default)]
    context: BTreeMap<String, PropertyDefinition>,

    stats: BTreeMap<String, PropertyDefinition>,
}

/// Validated, read-only schema: endpoint templates, bootstrap context properties
/// and statistic properties.
///
/// Construction checks every property along every path through its conditions, so
/// an invalid schema is rejected at load time instead of failing during a cycle.
#[derive(Debug)]
pub struct SchemaRegistry {
    endpoints: BTreeMap<String, EndpointTemplate>,
    context: BTreeMap<String, LeafProperty>,
    stats: BTreeMap<String, PropertyDefinition>,
}

impl SchemaRegistry {
    /// Parse and validate a schema document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or fails validation.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_str(text).into_app_err("parsing statistics schema")?;

        let mut context = BTreeMap::new();
        for (name, definition) in document.context {
            let PropertyDefinition::Leaf(leaf) = definition else {
                bail!("context property '{name}' must be a plain keyed property");
            };
            if leaf.parent_key.is_some() {
                bail!("context property '{name}' cannot have a parent folder");
            }
            let _ = context.insert(name, leaf);
        }

        let registry = Self {
            endpoints: document.endpoints,
            context,
            stats: document.stats,
        };

        registry.validate()?;

        log::debug!(
            target: LOG_TARGET,
            "Loaded schema with {} endpoint(s), {} context and {} statistic properties",
            registry.endpoints.len(),
            registry.context.len(),
            registry.stats.len()
        );

        Ok(registry)
    }

    /// Load a schema from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the schema is invalid.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading statistics schema '{path}'"))?;
        Self::from_json(&text).map_err(|e| e.enrich_with(|| format!("loading statistics schema '{path}'")))
    }

    /// The schema compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in schema is invalid.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_SCHEMA)
    }

    /// Find the template for the endpoint part of a property key.
    ///
    /// Names starting with `/` are literal API paths and need no declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is neither declared nor a literal path.
    pub fn lookup_endpoint(&self, endpoint: &str) -> Result<Cow<'_, EndpointTemplate>> {
        if let Some(template) = self.endpoints.get(endpoint) {
            return Ok(Cow::Borrowed(template));
        }

        if endpoint.starts_with('/') {
            return Ok(Cow::Owned(EndpointTemplate::api(endpoint)));
        }

        bail!("unknown endpoint '{endpoint}'")
    }

    /// Find a statistic property by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema declares no such property.
    pub fn lookup_property(&self, name: &str) -> Result<&PropertyDefinition> {
        self.stats.get(name).ok_or_else(|| app_err!("unknown property '{name}'"))
    }

    /// Statistic properties in name order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyDefinition)> {
        self.stats.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Bootstrap properties that establish the collection context.
    pub fn context_properties(&self) -> impl Iterator<Item = (&str, &LeafProperty)> {
        self.context.iter().map(|(name, leaf)| (name.as_str(), leaf))
    }

    fn validate(&self) -> Result<()> {
        for (name, leaf) in &self.context {
            let _ = self
                .lookup_endpoint(leaf.key.endpoint())
                .map_err(|e| e.enrich_with(|| format!("context property '{name}'")))?;
        }

        for (name, definition) in &self.stats {
            let variants = match definition.variants() {
                Ok(variants) => variants,
                Err(e) => bail!("property '{name}': {e}"),
            };

            for variant in variants {
                let ReducedProperty::Leaf(leaf) = variant else {
                    continue;
                };

                let _ = self
                    .lookup_endpoint(leaf.key.endpoint())
                    .map_err(|e| e.enrich_with(|| format!("property '{name}'")))?;

                if let Some(parent) = &leaf.parent_key
                    && !matches!(self.stats.get(parent), Some(PropertyDefinition::Folder))
                {
                    bail!("property '{name}' names parent '{parent}', which is not a folder property");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry(document: &serde_json::Value) -> Result<SchemaRegistry> {
        SchemaRegistry::from_json(&document.to_string())
    }

    #[test]
    fn test_builtin_schema_is_valid() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert!(registry.properties().count() > 0);
        assert!(registry.context_properties().any(|(name, _)| name == "provisioning"));
    }

    #[test]
    fn test_lookup_endpoint() {
        let registry = registry(&json!({
            "endpoints": {"system": {"endpoint": "/mgmt/tm/sys"}},
            "stats": {"a": {"key": "system"}}
        }))
        .unwrap();

        assert_eq!(registry.lookup_endpoint("system").unwrap().as_ref(), &EndpointTemplate::api("/mgmt/tm/sys"));
        assert!(matches!(registry.lookup_endpoint("/mgmt/tm/ltm"), Ok(Cow::Owned(_))));
        let _ = registry.lookup_endpoint("missing").unwrap_err();
    }

    #[test]
    fn test_unknown_endpoint_on_any_branch_is_rejected() {
        let err = registry(&json!({
            "stats": {
                "a": {
                    "key": "/mgmt/tm/sys",
                    "if": {"isModuleProvisioned": "afm"},
                    "then": {"key": "nowhere::x"}
                }
            }
        }))
        .unwrap_err();

        assert!(format!("{err:#}").contains("nowhere"));
    }

    #[test]
    fn test_parent_must_be_folder() {
        let _ = registry(&json!({
            "stats": {
                "a": {"key": "/x", "structure": {"parentKey": "b"}},
                "b": {"key": "/y"}
            }
        }))
        .unwrap_err();

        let _ = registry(&json!({
            "stats": {
                "a": {"key": "/x", "structure": {"parentKey": "b"}},
                "b": {"structure": {"folder": true}}
            }
        }))
        .unwrap();
    }

    #[test]
    fn test_context_must_be_plain() {
        let _ = registry(&json!({
            "context": {"hostname": {"key": "/a", "if": {"isModuleProvisioned": "x"}, "then": {}}},
            "stats": {}
        }))
        .unwrap_err();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::try_from(tmp.path().join("schema.json")).unwrap();
        fs::write(&path, r#"{"stats": {"version": {"key": "/mgmt/tm/sys/version"}}}"#).unwrap();

        let registry = SchemaRegistry::load(&path).unwrap();
        let _ = registry.lookup_property("version").unwrap();
        assert!(registry.lookup_property("nonexistent").is_err());

        let _ = SchemaRegistry::load(&path.with_file_name("missing.json")).unwrap_err();
    }
}
