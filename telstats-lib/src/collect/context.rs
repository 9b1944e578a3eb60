use crate::tree::{StatsMap, StatsValue};
use core::cmp::Ordering;
use core::fmt::{Display, Formatter};
use std::collections::BTreeMap;

const PROVISION_NONE: &str = "none";

/// A dotted numeric device version such as `17.1.0.1`.
///
/// Trailing text after the first whitespace is ignored (`13.1.1 Build 0.0.4`), and
/// missing components compare as zero, so `14.1` equals `14.1.0`.
#[derive(Debug, Clone)]
pub struct DeviceVersion(Vec<u64>);

impl DeviceVersion {
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let parts = token.split('.').map(|p| p.parse::<u64>().ok()).collect::<Option<Vec<_>>>()?;
        Some(Self(parts))
    }

    fn component(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }
}

impl Ord for DeviceVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for DeviceVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DeviceVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DeviceVersion {}

impl Display for DeviceVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let parts: Vec<_> = self.0.iter().map(u64::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Facts about the target device gathered at the start of each cycle.
///
/// Each fact is optional: a context property that failed to collect leaves its fact
/// unknown, and conditions that depend on it are treated as not applicable.
#[derive(Debug, Clone, Default)]
pub struct CollectionContext {
    hostname: Option<String>,
    version: Option<String>,
    provisioning: Option<BTreeMap<String, String>>,
    values: StatsMap,
}

impl CollectionContext {
    /// Interpret the normalized values of the context properties.
    ///
    /// `hostname` and `version` are read as text. `provisioning` maps module names
    /// either to a level string or to an object with a `level` member.
    #[must_use]
    pub fn from_values(values: StatsMap) -> Self {
        let text = |name: &str| {
            values
                .get(name)
                .and_then(StatsValue::as_str)
                .filter(|s| !s.is_empty() && *s != crate::tree::MISSING_DATA)
                .map(ToString::to_string)
        };

        // a response without module entries says nothing about provisioning
        let provisioning = values
            .get("provisioning")
            .and_then(StatsValue::as_map)
            .map(|modules| {
                modules
                    .iter()
                    .filter_map(|(module, entry)| {
                        entry
                            .as_str()
                            .or_else(|| entry.get("level").and_then(StatsValue::as_str))
                            .map(|level| (module.clone(), level.to_string()))
                    })
                    .collect::<BTreeMap<_, _>>()
            })
            .filter(|modules| !modules.is_empty());

        Self {
            hostname: text("hostname"),
            version: text("version"),
            provisioning,
            values,
        }
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>, level: impl Into<String>) -> Self {
        let _ = self.provisioning.get_or_insert_default().insert(module.into(), level.into());
        self
    }

    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// The version as reported by the device.
    #[must_use]
    pub fn version_text(&self) -> Option<&str> {
        self.version.as_deref()
    }

    #[must_use]
    pub fn version(&self) -> Option<DeviceVersion> {
        self.version.as_deref().and_then(DeviceVersion::parse)
    }

    #[must_use]
    pub const fn provisioning(&self) -> Option<&BTreeMap<String, String>> {
        self.provisioning.as_ref()
    }

    /// Whether a module is provisioned, or `None` when provisioning is unknown.
    #[must_use]
    pub fn is_provisioned(&self, module: &str) -> Option<bool> {
        self.provisioning
            .as_ref()
            .map(|modules| modules.get(module).is_some_and(|level| level != PROVISION_NONE))
    }

    /// Every context value, keyed by context property name.
    #[must_use]
    pub const fn values(&self) -> &StatsMap {
        &self.values
    }
}
