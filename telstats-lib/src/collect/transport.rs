use super::ApiRequest;
use crate::Result;
use futures::future::BoxFuture;

/// Issues management API requests.
///
/// Implementations own connection handling, authentication, retries and the bound on
/// in-flight requests. A response is the decoded JSON body of a successful request.
pub trait Transport: Send + Sync {
    fn request<'a>(&'a self, request: &'a ApiRequest) -> BoxFuture<'a, Result<serde_json::Value>>;
}

/// Runs shell commands and returns their standard output.
pub trait CommandRunner: Send + Sync {
    fn run_command<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<String>>;
}
