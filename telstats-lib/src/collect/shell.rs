use super::{ApiRequest, CommandRunner, Transport};
use crate::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use ohno::{IntoAppError, bail};
use serde_json::json;
use std::sync::Arc;

const LOG_TARGET: &str = "   shell";

/// Endpoint that runs a bash command line on the device.
pub const UTIL_BASH_PATH: &str = "/mgmt/tm/util/bash";

/// Runs commands on the device through the management API.
#[derive(Clone)]
pub struct RemoteShell {
    transport: Arc<dyn Transport>,
}

impl core::fmt::Debug for RemoteShell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RemoteShell").finish_non_exhaustive()
    }
}

impl RemoteShell {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn run(&self, command: &str) -> Result<String> {
        let request = ApiRequest::post(
            UTIL_BASH_PATH,
            &json!({
                "command": "run",
                "utilCmdArgs": format!("-c {}", single_quoted(command)),
            }),
        );

        log::debug!(target: LOG_TARGET, "Running remote command '{command}'");
        let response = self.transport.request(&request).await?;

        // a command without output has no commandResult member at all
        Ok(response
            .get("commandResult")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

/// Quote `text` as one shell word, ending the quotes around each embedded `'`.
fn single_quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

impl CommandRunner for RemoteShell {
    fn run_command<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<String>> {
        self.run(command).boxed()
    }
}

/// Runs commands on the local host with `sh -c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalShell;

impl LocalShell {
    async fn run(command: &str) -> Result<String> {
        log::debug!(target: LOG_TARGET, "Running local command '{command}'");

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
            .into_app_err_with(|| format!("spawning '{command}'"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("command '{command}' failed with {}: {}", output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CommandRunner for LocalShell {
    fn run_command<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<String>> {
        Self::run(command).boxed()
    }
}
