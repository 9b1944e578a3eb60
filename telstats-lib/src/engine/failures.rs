use super::FailureReporting;
use crate::collect::{EndpointDescriptor, Failure, FailureKind};
use std::collections::BTreeMap;

const LOG_TARGET: &str = "  engine";

/// A property that could not be collected, and why.
#[derive(Debug, Clone)]
pub struct CollectionFailure {
    /// The property whose value degraded to `missing data`.
    pub property: String,

    /// The request the property depended on, when one was resolved.
    pub descriptor: Option<EndpointDescriptor>,

    pub failure: Failure,
}

impl CollectionFailure {
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.failure.kind
    }
}

/// The messages reporting a cycle's failures, grouped according to `mode`.
///
/// In `Once` mode transport failures are grouped by the request that failed, so a
/// request shared by many properties is reported a single time. Every other mode
/// reports each property separately.
#[must_use]
pub fn failure_report(failures: &[CollectionFailure], mode: FailureReporting) -> Vec<String> {
    if mode != FailureReporting::Once {
        return failures.iter().map(property_message).collect();
    }

    let mut messages = Vec::new();
    let mut by_request: BTreeMap<&EndpointDescriptor, Vec<&CollectionFailure>> = BTreeMap::new();
    for f in failures {
        match &f.descriptor {
            Some(descriptor) if f.kind() == FailureKind::Transport => by_request.entry(descriptor).or_default().push(f),
            _ => messages.push(property_message(f)),
        }
    }

    for (descriptor, affected) in by_request {
        messages.push(format!(
            "Request {descriptor} failed, {} propert{} degraded: {}",
            affected.len(),
            if affected.len() == 1 { "y" } else { "ies" },
            affected[0].failure.error
        ));
    }

    messages
}

fn property_message(f: &CollectionFailure) -> String {
    format!("Could not collect '{}' ({}): {}", f.property, f.kind(), f.failure.error)
}

/// Log the failures of a cycle according to `mode`.
pub fn log_failures(failures: &[CollectionFailure], mode: FailureReporting) {
    for message in failure_report(failures, mode) {
        match mode {
            FailureReporting::Silent => log::debug!(target: LOG_TARGET, "{message}"),
            FailureReporting::Once | FailureReporting::PerProperty => log::warn!(target: LOG_TARGET, "{message}"),
        }
    }
}
