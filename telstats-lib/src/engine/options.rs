use serde::{Deserialize, Serialize};
use strum::Display;

/// How collection failures are logged.
///
/// Failures are always part of the cycle output; this only controls the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FailureReporting {
    /// One warning per failed request, however many properties depend on it.
    #[default]
    Once,

    /// One warning per affected property.
    PerProperty,

    /// Failures are only logged at debug level.
    Silent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Fail properties whose request still contains unresolved tokens instead of
    /// issuing the request.
    pub strict_templates: bool,

    pub failure_reporting: FailureReporting,
}
