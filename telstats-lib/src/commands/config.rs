use crate::Result;
use crate::collect::HttpSettings;
use crate::engine::{EngineOptions, FailureReporting};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use strum::Display;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the current directory when no configuration path is given
pub const DEFAULT_CONFIG_FILE: &str = "telstats.toml";

const MAX_CONCURRENT_REQUESTS: usize = 64;

/// Where shell commands are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CommandChannel {
    /// Through the device's util/bash REST endpoint
    #[default]
    Remote,

    /// With `sh -c` on the machine running telstats
    Local,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root URL of the device management REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Account used for basic authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// First segment of every flattened metric name
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Schema file replacing the builtin schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Utf8PathBuf>,

    #[serde(default)]
    pub command_channel: CommandChannel,

    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Fail properties whose request still contains unresolved tokens
    #[serde(default)]
    pub strict_templates: bool,

    #[serde(default)]
    pub failure_reporting: FailureReporting,
}

fn default_base_url() -> String {
    "https://localhost".into()
}

fn default_namespace() -> String {
    "telstats".into()
}

const fn default_max_concurrent_requests() -> usize {
    8
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_poll_interval() -> Duration {
    Duration::from_secs(60)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `telstats.toml` in the current directory is used if
    /// it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading telstats configuration file '{path}'"))?;
            (path.to_owned(), text)
        } else {
            let path = Utf8PathBuf::from(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading telstats configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or the base URL is malformed
    pub fn validate(&self) -> Result<()> {
        let _ = self.parsed_base_url()?;

        if !(1..=MAX_CONCURRENT_REQUESTS).contains(&self.max_concurrent_requests) {
            return Err(app_err!(
                "max_concurrent_requests must be between 1 and {MAX_CONCURRENT_REQUESTS}, got {}",
                self.max_concurrent_requests
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(app_err!("request_timeout must be greater than zero"));
        }

        if self.poll_interval.is_zero() {
            return Err(app_err!("poll_interval must be greater than zero"));
        }

        if self.namespace.contains(char::is_whitespace) {
            return Err(app_err!("namespace must not contain whitespace, got '{}'", self.namespace));
        }

        Ok(())
    }

    fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).into_app_err_with(|| format!("parsing base_url '{}'", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(app_err!("base_url must use http or https, got '{}'", self.base_url));
        }
        Ok(url)
    }

    /// Settings for the HTTP transport, with `password` overriding the configured one
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is malformed
    pub fn http_settings(&self, password: Option<&str>) -> Result<HttpSettings> {
        Ok(HttpSettings {
            base_url: self.parsed_base_url()?,
            username: self.username.clone(),
            password: password.map(str::to_owned).or_else(|| self.password.clone()),
            max_concurrent_requests: self.max_concurrent_requests,
            request_timeout: self.request_timeout,
            accept_invalid_certs: self.accept_invalid_certs,
        })
    }

    #[must_use]
    pub const fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            strict_templates: self.strict_templates,
            failure_reporting: self.failure_reporting,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
