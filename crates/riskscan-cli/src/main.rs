mod display;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use riskscan_core::config::{FailurePolicy, ScannerConfig};
use riskscan_core::redact::redact_report;
use riskscan_core::tools::{ToolKind, ALL_TOOLS};
use riskscan_core::{ScanOrchestrator, ToolInvoker};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "riskscan",
    version,
    about = "riskscan — CI/CD & application security risk scanner",
    long_about = "Run semgrep, checkov, tfsec, snyk and gitleaks against a repository and collect \
                  their findings per CI/CD risk category into one report."
)]
struct Cli {
    /// Scanner configuration file (defaults to $RISKSCAN_CONFIG or ./riskscan.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug); RISKSCAN_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a repository directory for the given risk categories
    Scan {
        /// Repository directory to scan
        path: PathBuf,

        /// Risk category label, repeatable; scanned in the order given
        #[arg(short, long = "risk", required = true)]
        risks: Vec<String>,

        /// Output format (text, plain, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Mask secret values in tool output
        #[arg(long)]
        redact: bool,

        /// Keep scanning after a failed check and report it in place
        #[arg(long)]
        collect_all: bool,

        /// Per-tool timeout in seconds (0 disables)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// List the risk categories and the tools behind them
    Categories,

    /// Check that every external tool can be started
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ScannerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            path,
            risks,
            format,
            redact,
            collect_all,
            timeout,
        } => {
            let mut config = config;
            if collect_all {
                config.failure_policy = FailurePolicy::CollectAll;
            }
            if let Some(secs) = timeout {
                config.timeout_secs = secs;
            }
            cmd_scan(config, &path, &risks, &format, redact).await
        }
        Commands::Categories => {
            display::print_categories(riskscan_core::checks::all());
            Ok(())
        }
        Commands::Doctor => cmd_doctor(&config).await,
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_env("RISKSCAN_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn cmd_scan(
    config: ScannerConfig,
    path: &Path,
    risks: &[String],
    format: &str,
    redact: bool,
) -> Result<()> {
    let orchestrator = ScanOrchestrator::new(config);
    let report = orchestrator
        .run_scan(path, risks)
        .await
        .with_context(|| format!("Error scanning repository '{}'", path.display()))?;

    let report = if redact { redact_report(&report) } else { report };

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
        "plain" => print!("{}", report.render_plain()),
        _ => display::print_scan_report(&report),
    }

    if !report.is_complete() {
        anyhow::bail!(
            "{} of {} categories failed",
            report.failures().count(),
            report.len()
        );
    }

    Ok(())
}

async fn cmd_doctor(config: &ScannerConfig) -> Result<()> {
    let invoker = ToolInvoker::new(Some(Duration::from_secs(30)));
    let mut statuses: Vec<(ToolKind, PathBuf, Result<String, String>)> = Vec::new();

    for tool in ALL_TOOLS {
        let program = config.program(*tool);
        let status = invoker
            .version(*tool, &program)
            .await
            .map_err(|error| error.to_string());
        statuses.push((*tool, program, status));
    }

    display::print_doctor(&statuses);

    let missing = statuses.iter().filter(|(_, _, s)| s.is_err()).count();
    if missing > 0 {
        anyhow::bail!("{} of {} tools unavailable", missing, statuses.len());
    }
    Ok(())
}
