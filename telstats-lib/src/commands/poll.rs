use super::Host;
use super::common::{CommonArgs, OutputFormat, build_engine, init_logging, render};
use super::config::Config;
use crate::Result;
use crate::engine::{CycleOutput, Poller, StatsSink};
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::IntoAppError;
use std::fs;
use std::io::Write;

const LOG_TARGET: &str = "     cli";

#[derive(Parser, Debug)]
pub struct PollArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Stop after this many cycles instead of running until interrupted
    #[arg(long, value_name = "COUNT")]
    pub max_cycles: Option<u64>,
}

/// Writes each cycle to the host output, or replaces the output file with it.
struct OutputSink<'a, H: Host> {
    host: &'a mut H,
    format: OutputFormat,
    namespace: &'a str,
    path: Option<&'a Utf8PathBuf>,
}

impl<H: Host> StatsSink for OutputSink<'_, H> {
    fn publish(&mut self, output: &CycleOutput) -> Result<()> {
        let text = render(output, self.format, self.namespace)?;

        match self.path {
            Some(path) => fs::write(path, &text).into_app_err_with(|| format!("writing statistics to '{path}'")),
            None => {
                let mut out = self.host.output();
                out.write_all(text.as_bytes()).into_app_err("writing statistics")?;
                out.flush().into_app_err("writing statistics")
            }
        }
    }
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!(target: LOG_TARGET, "Cannot listen for Ctrl-C, polling until the cycle limit: {e}");
        core::future::pending::<()>().await;
    }
}

/// Run collection cycles on the configured interval until interrupted
pub async fn poll<H: Host>(host: &mut H, args: &PollArgs) -> Result<()> {
    init_logging(args.common.log_level);

    let config = Config::load(args.common.config.as_deref())?;
    let engine = build_engine(&config, args.common.password.as_deref())?;

    let mut poller = Poller::new(&engine, config.poll_interval);
    if let Some(count) = args.max_cycles {
        poller = poller.max_cycles(count);
    }

    log::info!(target: LOG_TARGET, "Polling {} every {:?}", config.base_url, config.poll_interval);

    let mut sink = OutputSink {
        host,
        format: args.common.format,
        namespace: &config.namespace,
        path: args.common.output.as_ref(),
    };

    let _ = poller.run(&mut sink, interrupted()).await?;
    Ok(())
}

