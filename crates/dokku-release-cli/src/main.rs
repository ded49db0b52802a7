//! dokku-release - build and publish herokuish packages
//!
//! ```text
//! dokku-release [--trace] <major|minor|patch|betafish|build>
//! ```
//!
//! `major`, `minor` and `patch` publish to the official repository,
//! `betafish` publishes to the pre-release repository and `build` only
//! builds and extracts the packages into `build/`.

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use dokku_release_core::{
    init_tracing, level_for, write_release_report_json, PipelineReport, ReleaseConfig,
    ReleaseError, ReleasePipeline, ReleaseRequest,
};

#[derive(Parser, Debug)]
#[command(name = "dokku-release")]
#[command(author = "Dokku Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build herokuish packages and publish them to packagecloud", long_about = None)]
struct Cli {
    /// Trace every step (most verbose logging, plain build output)
    #[arg(short = 'x', long)]
    trace: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    /// Project root containing deb.mk and Dockerfile.build
    #[arg(long, env = "DOKKU_RELEASE_ROOT")]
    root: Option<PathBuf>,

    /// Output directory for extracted packages (relative to the root)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write a JSON release report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Release type: major, minor, patch, betafish or build
    bump_level: String,
}

impl Cli {
    fn config(&self) -> ReleaseConfig {
        let mut config = ReleaseConfig::from_env();
        if let Some(root) = &self.root {
            config.project_root = root.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(&e));
        }
    };
    init_tracing(cli.json, level_for(cli.trace, cli.verbose));

    match cmd_release(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(" !     {:#}", e);
            let code = e
                .downcast_ref::<ReleaseError>()
                .map(ReleaseError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

/// `--help` and `--version` exit 0; every usage error exits 1.
fn usage_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

async fn cmd_release(cli: &Cli) -> anyhow::Result<()> {
    let request = ReleaseRequest::parse(&cli.bump_level, cli.trace)?;
    let pipeline = ReleasePipeline::from_config(cli.config());

    let report = pipeline.execute(&request).await?;

    if let Some(path) = &cli.report {
        write_release_report_json(path, &report)
            .with_context(|| format!("write report {}", path.display()))?;
        info!(path = %path.display(), "Wrote release report");
    }

    print_summary(&report);
    report.into_result()?;
    Ok(())
}

fn print_summary(report: &PipelineReport) {
    println!("Version: {}", report.version);
    for artifact in &report.artifacts {
        println!("  {} ({} bytes, sha256 {})", artifact.path, artifact.size, artifact.sha256);
    }
    for outcome in &report.outcomes {
        println!(
            "{} -> {}: {}/{} pushed",
            outcome.file_name,
            outcome.channel_repo,
            outcome.attempted() - outcome.failed_count(),
            outcome.attempted()
        );
        for result in outcome.results.iter().filter(|r| !r.succeeded) {
            println!(
                "  ✗ {} ({})",
                result.target.repository_path(),
                result.error_detail.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
