use std::path::PathBuf;

use anyhow::Context;
use caseprobe_runner::config::{HarnessConfig, LogFormat};
use caseprobe_runner::engine::CaseExecutor;
use caseprobe_runner::executor;
use caseprobe_runner::procfs;
use caseprobe_runner::solutions::SolutionRegistry;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Run a solution against a batch of test cases and report what each case cost
#[derive(Parser, Debug)]
#[command(name = "caseprobe", version, about)]
struct Cli {
    /// Solution to run, selected by file stem (e.g. solutions/sum.rs)
    solution: PathBuf,

    /// JSON document mapping case keys to {"input": {...}}
    testcases: PathBuf,

    /// Harness configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not usage errors
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    init_tracing(LogFormat::from_env());

    let config = match HarnessConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load harness configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Some(hz) = procfs::clock_ticks_per_second() {
        info!(clock_ticks_per_second = hz, "utime/stime are reported in scheduler ticks");
    }

    let registry = SolutionRegistry::builtin();
    let Some(solution) = registry.resolve(&cli.solution) else {
        error!("Unknown solution: {}", cli.solution.display());
        error!("Available solutions: {}", registry.names().join(", "));
        std::process::exit(1);
    };

    let engine = CaseExecutor::new(solution).with_stack_size(config.solution_stack_bytes());
    let report = match executor::run_file(&engine, &cli.testcases, config.report_options()).await
    {
        Ok(report) => report,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let rendered = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", rendered);

    Ok(())
}
