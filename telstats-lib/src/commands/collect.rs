use super::Host;
use super::common::{CommonArgs, build_engine, init_logging, render};
use super::config::Config;
use crate::Result;
use clap::Parser;
use ohno::IntoAppError;
use std::fs;
use std::io::Write;

const LOG_TARGET: &str = "     cli";

#[derive(Parser, Debug)]
pub struct CollectArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Exit with status code 1 if any statistic could not be collected
    #[arg(long)]
    pub error_if_failures: bool,
}

/// Run a single collection cycle and write its statistics
pub async fn collect_once<H: Host>(host: &mut H, args: &CollectArgs) -> Result<()> {
    init_logging(args.common.log_level);

    let config = Config::load(args.common.config.as_deref())?;
    let engine = build_engine(&config, args.common.password.as_deref())?;

    let output = engine.run_cycle().await;
    let text = render(&output, args.common.format, &config.namespace)?;

    if let Some(path) = &args.common.output {
        fs::write(path, &text).into_app_err_with(|| format!("writing statistics to '{path}'"))?;
        log::info!(target: LOG_TARGET, "Wrote statistics to '{path}'");
    } else {
        let _ = write!(host.output(), "{text}");
    }

    if !output.failures.is_empty() {
        let _ = writeln!(
            host.error(),
            "{} statistic(s) could not be collected ({})",
            output.failures.len(),
            output.stats.summary()
        );

        if args.error_if_failures {
            host.exit(1);
        }
    }

    Ok(())
}
