mod charts;
mod config;
mod format;
mod report;


use bench_ingest::MissingPolicy;
use clap::Parser;
use config::ReportConfig;
use report::ReportError;
use std::{io, path::PathBuf, process::ExitCode};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Render the storage engine comparison charts from the latest benchmark runs
#[derive(Parser, Debug)]
#[command(name = "bench-report", version)]
struct Args {
    /// Directory that relative run and output directories are resolved against
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// YAML file overriding runs, workloads, engines, thread counts or canvas
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to write the PNG files to
    #[arg(long)]
    output: Option<PathBuf>,

    /// How missing (engine, workload, threads) combinations are drawn: zero, omit or error
    #[arg(long)]
    missing: Option<MissingPolicy>,

    /// Render the figures concurrently
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(args) {
        Ok(written) => {
            debug!(files = written.len(), "Report complete");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(error = ?error, "Report generation failed");
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<Vec<PathBuf>, ReportError> {
    let mut config = match args.config {
        Some(ref path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };

    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(missing) = args.missing {
        config.missing = missing;
    }
    config.resolve_paths(&args.base_dir);

    debug!(config = ?config, "Resolved report config");

    report::generate(&config, args.parallel, &mut io::stdout().lock())
}
