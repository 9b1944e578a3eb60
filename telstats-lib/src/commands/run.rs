//! Command dispatch logic for telstats

use super::{CollectArgs, InitArgs, PollArgs, ValidateArgs, collect_once, init_config, poll, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "telstats", version, author, long_about = None)]
#[command(about = "Poll a device management API and publish normalized statistics")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: TelstatsSubcommand,
}

#[derive(Subcommand, Debug)]
enum TelstatsSubcommand {
    /// Run one collection cycle and write the statistics
    Collect(Box<CollectArgs>),
    /// Run collection cycles on the configured interval until interrupted
    Poll(Box<PollArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file and its schema
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        TelstatsSubcommand::Collect(collect_args) => collect_once(host, collect_args).await,
        TelstatsSubcommand::Poll(poll_args) => poll(host, poll_args).await,
        TelstatsSubcommand::Init(init_args) => init_config(host, init_args),
        TelstatsSubcommand::Validate(validate_args) => validate_config(host, validate_args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_collect() {
        let cli = Cli::parse_from(["telstats", "collect", "--format", "lines", "-o", "stats.txt"]);
        let TelstatsSubcommand::Collect(args) = cli.command else {
            panic!("expected collect");
        };
        assert_eq!(args.common.format, super::super::common::OutputFormat::Lines);
        assert_eq!(args.common.output.as_deref().map(camino::Utf8Path::as_str), Some("stats.txt"));
    }
}
