//! Processing shared between the collect and poll commands.

use super::config::{CommandChannel, Config};
use crate::Result;
use crate::collect::{CommandRunner, HttpTransport, LocalShell, RemoteShell, Transport};
use crate::engine::{CycleOutput, Engine};
use crate::reports::{generate_json, generate_lines, metric_prefix};
use crate::schema::SchemaRegistry;
use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use std::sync::Arc;

const LOG_TARGET: &str = "     cli";

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Shape of the statistics written after each cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The statistics tree as one JSON object
    #[default]
    Json,

    /// One `name value` line per numeric statistic
    Lines,
}

/// Arguments shared between the collect and poll commands
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to configuration file (default is `telstats.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Password for the configured username
    #[arg(long, value_name = "PASSWORD", env = "TELSTATS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(long, short = 'f', value_name = "FORMAT", default_value = "json")]
    pub format: OutputFormat,

    /// Write statistics to a file instead of to the terminal
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    pub log_level: LogLevel,
}

/// Initialize logger based on log level
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // a second initialization (e.g. from tests) is harmless
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

/// Load the schema named by the configuration, or the builtin one.
///
/// # Errors
///
/// Returns an error if the schema cannot be read or is invalid
pub fn load_schema(config: &Config) -> Result<SchemaRegistry> {
    match &config.schema {
        Some(path) => {
            log::info!(target: LOG_TARGET, "Loading schema from '{path}'");
            SchemaRegistry::load(path)
        }
        None => SchemaRegistry::builtin(),
    }
}

/// Wire the transport, command channel and schema named by the configuration
/// into an engine.
///
/// # Errors
///
/// Returns an error if the schema is invalid or the HTTP client cannot be created
pub fn build_engine(config: &Config, password: Option<&str>) -> Result<Engine> {
    let registry = load_schema(config)?;
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.http_settings(password)?)?);

    let commands: Arc<dyn CommandRunner> = match config.command_channel {
        CommandChannel::Remote => Arc::new(RemoteShell::new(Arc::clone(&transport))),
        CommandChannel::Local => Arc::new(LocalShell),
    };

    log::debug!(
        target: LOG_TARGET,
        "Collecting from {} with {} command channel",
        config.base_url,
        config.command_channel
    );

    Ok(Engine::new(Arc::new(registry), transport, commands, config.engine_options()))
}

/// Render one cycle's statistics in the requested format.
///
/// # Errors
///
/// Returns an error if the statistics cannot be serialized
pub fn render(output: &CycleOutput, format: OutputFormat, namespace: &str) -> Result<String> {
    let mut text = String::new();
    match format {
        OutputFormat::Json => generate_json(&output.tree, &mut text)?,
        OutputFormat::Lines => generate_lines(&output.tree, &metric_prefix(namespace, &output.context), &mut text)?,
    }
    Ok(text)
}
