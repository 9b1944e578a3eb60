//! Talking to the device
//!
//! A cycle first resolves each leaf property into an [`EndpointDescriptor`]: the
//! template from the schema with its `replaceStrings` applied. Descriptors are then
//! deduplicated and issued concurrently by the [`Executor`], which shapes each
//! response into a [`StatsValue`](crate::tree::StatsValue) and stores it in a
//! write-once [`ResponseCache`].
//!
//! # Implementation Model
//!
//! The management API is reached through the [`Transport`] trait and shell commands
//! through [`CommandRunner`]. [`HttpTransport`] is the production transport: it
//! bounds in-flight requests with a [`Throttler`] and wraps every call in retry and
//! timeout middleware. Commands run either on the device ([`RemoteShell`]) or on the
//! local host ([`LocalShell`]).
//!
//! Failures never abort a cycle. Each one is recorded as a [`Failure`] against the
//! descriptor that caused it, and the properties depending on it degrade to
//! `missing data`.

mod context;
mod cycle_stats;
mod descriptor;
mod executor;
mod fetch_result;
mod http_transport;
mod resilient_http;
mod resolver;
mod response;
mod shell;
mod throttler;
mod transport;

pub use context::{CollectionContext, DeviceVersion};
pub use cycle_stats::{CycleStats, RequestCounts};
pub use descriptor::{ApiRequest, EndpointDescriptor, HttpMethod, RequestKind};
pub use executor::{Executor, ResponseCache};
pub use fetch_result::{Failure, FailureKind, FetchResult};
pub use http_transport::{HttpSettings, HttpTransport};
pub use resolver::{ResolvedRequest, resolve};
pub use response::{RawResponse, parse_table, shape, unwrap_nested_stats};
pub use shell::{LocalShell, RemoteShell, UTIL_BASH_PATH};
pub use throttler::Throttler;
pub use transport::{CommandRunner, Transport};
