use chunkscout::{scan, CliOverrides, EncodingMode, ScanConfig, ScanOutput, SearchError};
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, SearchError>;

const USAGE: &str = "Usage: chunkscout-cli <num-workers> <keyword> <path>";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of workers to split the file between
    workers: usize,

    /// Literal keyword to count
    keyword: String,

    /// File to scan
    path: PathBuf,

    /// Fail the run if any worker has not reported within this long (e.g. 30s, 2m)
    #[arg(short = 't', long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// How to handle invalid UTF-8 sequences (raw|failfast|lossy) [default: raw]
    #[arg(long)]
    encoding: Option<String>,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error) [default: warn]
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("{}", e.render());
            println!("\n{}", USAGE);
            return ExitCode::from(1);
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let encoding_mode = cli
        .encoding
        .as_deref()
        .map(str::parse::<EncodingMode>)
        .transpose()?;

    let overrides = CliOverrides {
        path: cli.path,
        keyword: cli.keyword,
        worker_count: cli.workers,
        worker_timeout: cli.timeout,
        encoding_mode,
        log_level: cli.log_level,
    };

    let config = ScanConfig::load_from(cli.config.as_deref())
        .map_err(|e| SearchError::config_error(e.to_string()))?
        .merge_with_cli(overrides);

    init_logging(&config.log_level);
    if let Some(config_path) = &cli.config {
        debug!("Loaded configuration from {}", config_path.display());
    }
    debug!("Effective configuration: {:?}", config);

    let output = scan(&config)?;
    info!(
        "Scan of {} finished: {} occurrences",
        output.path.display(),
        output.total_matches()
    );
    print_scan_output(&output)?;
    Ok(())
}

/// Logs go to stderr so stdout carries only the report. `RUST_LOG` wins over the
/// configured level.
fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_scan_output(output: &ScanOutput) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "File: {}", output.path.display().to_string().blue())?;
    writeln!(out, "Lines: {}", output.total_lines)?;
    writeln!(out, "Lines per worker: {}", output.plan.chunk_size)?;
    writeln!(out)?;
    output.aggregate.write_report(&mut out)?;
    Ok(())
}
