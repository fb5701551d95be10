//! Command-line interface for the research council
//!
//! # Usage
//!
//! ```bash
//! export COUNCIL_MARKET_URL="http://localhost:8080/api"
//! export COUNCIL_ANALYSIS_URL="http://localhost:8080/api"
//!
//! council analyze 600519
//! council analyze 600519 --json --output moutai.json
//! council catalog
//! council plan
//! ```

mod progress;
mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use council_analysis::http::{HttpAnalysisConfig, HttpAnalysisService};
use council_core::Catalog;
use council_engine::{Council, CouncilConfig, HttpEvidenceProvider, HttpSnapshotProvider, Plan};
use council_utils::{AppConfig, init_tracing};
use progress::Progress;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "council")]
#[command(about = "Run the equity research council against a stock", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full council for a six-digit stock code
    Analyze {
        /// Stock code, e.g. 600519
        code: String,

        /// Print the run outcome as JSON instead of the Markdown report
        #[arg(long)]
        json: bool,

        /// Also write the output to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not print live progress
        #[arg(short, long)]
        quiet: bool,
    },
    /// List the catalogued agents
    Catalog,
    /// Show the steps of a run
    Plan,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = AppConfig::from_env()?;
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else {
        "warn,council_engine=info"
    };
    init_tracing(app.log_format, filter);
    info!(app = %app.app_name, environment = %app.environment, "Starting");

    match cli.command {
        Command::Analyze {
            code,
            json,
            output,
            quiet,
        } => analyze(&code, json, output, quiet).await,
        Command::Catalog => {
            println!("{}", render::catalog_table(&Catalog::standard()));
            Ok(())
        }
        Command::Plan => {
            let catalog = Catalog::standard();
            print!("{}", render::plan_listing(&Plan::standard(&catalog)));
            Ok(())
        }
    }
}

async fn analyze(
    code: &str,
    json: bool,
    output: Option<PathBuf>,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = CouncilConfig::from_env()?;
    let council = Council::builder()
        .snapshot_provider(Arc::new(HttpSnapshotProvider::new(&config)?))
        .evidence_provider(Arc::new(HttpEvidenceProvider::new(&config)?))
        .analysis_service(Arc::new(HttpAnalysisService::with_config(
            HttpAnalysisConfig::from_env().with_deadline(config.analysis_deadline),
        )?))
        .config(config)
        .build()?;

    let progress =
        (!quiet).then(|| Progress::start(council.subscribe(), |line| eprintln!("{line}")));

    let result = council.start_analysis(code).await;
    if let Some(progress) = progress {
        progress.finish().await?;
    }
    let outcome = result.with_context(|| format!("analysis of {code} did not start"))?;

    eprintln!("{}", render::status_table(&council));
    eprintln!("Finished in {}s", outcome.elapsed_seconds);

    let text = if json {
        serde_json::to_string_pretty(&outcome)?
    } else {
        outcome
            .report
            .clone()
            .unwrap_or_else(|| "No report: the final decision did not settle.".to_string())
    };
    println!("{text}");

    if let Some(path) = output {
        tokio::fs::write(&path, &text)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }

    Ok(())
}
