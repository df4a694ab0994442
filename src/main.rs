mod client;
mod config;
mod criteria;
mod dashboard;
mod format;
mod models;
mod render;
mod shell;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::client::{AnalysisApi, HttpAnalysisApi};
use crate::config::AppConfig;
use crate::dashboard::{AnalysisClient, SearchOutcome};
use crate::render::{render, RenderOptions, Tab};
use crate::shell::Shell;

#[derive(Parser)]
#[command(
    name = "society-analyzer",
    about = "Método Society stock and REIT analysis dashboard",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Analysis backend base URL (overrides config files)
    #[arg(long, env = "SOCIETY_API_URL", global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse one ticker and print the dashboard
    Analyze {
        /// Stock or REIT ticker (e.g. PETR4, HGLG11)
        ticker: String,

        /// Tab to show below the score card
        #[arg(short, long, value_enum)]
        tab: Option<Tab>,
    },

    /// Interactive dashboard: type tickers, switch tabs
    Shell {
        #[arg(short, long, value_enum)]
        tab: Option<Tab>,
    },

    /// Suggest assets matching a name or ticker fragment
    Search { query: String },

    /// Check that the analysis backend is up
    Health,

    /// List the nine Método Society criteria
    Criteria,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before clap, so `.env` can supply SOCIETY_API_URL.
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "society_analyzer=info,warn",
        1 => "society_analyzer=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?.with_api_url(cli.api_url);
    debug!("Using analysis backend at {}", config.api.base_url);

    let mut options = RenderOptions::from(&config.display);

    match cli.command {
        Command::Criteria => {
            println!("{}", shell::criteria_listing());
        }

        Command::Analyze { ticker, tab } => {
            if let Some(tab) = tab {
                options.tab = tab;
            }
            let client = AnalysisClient::new(build_api(&config)?);
            let outcome = client.search(&ticker).await;
            println!("{}", render(&client.snapshot().await, &options));

            match outcome {
                SearchOutcome::Updated { ticker } => debug!("Rendered analysis of {}", ticker),
                SearchOutcome::Ignored => info!("Blank ticker, nothing to analyse"),
                SearchOutcome::Failed { ticker, error } => {
                    return Err(error).with_context(|| format!("Analysis of {} failed", ticker));
                }
            }
        }

        Command::Shell { tab } => {
            if let Some(tab) = tab {
                options.tab = tab;
            }
            let api = build_api(&config)?;
            info!("Connected to {}", api.base_url());
            let client = Arc::new(AnalysisClient::new(api));
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            Shell::new(client, options, std::io::stdout()).run(stdin).await?;
        }

        Command::Search { query } => {
            let api = build_api(&config)?;
            let hits = api
                .suggest(&query)
                .await
                .with_context(|| format!("Search for {:?} failed", query))?;
            if hits.is_empty() {
                println!("No assets match {:?}.", query);
            } else {
                println!("{} match(es):", hits.len());
                for hit in &hits {
                    println!("  {:<8} {}", hit.symbol, hit.name);
                }
            }
        }

        Command::Health => {
            let api = build_api(&config)?;
            let health = api.health().await.context("Health check failed")?;
            println!("─────────────────────────────────");
            println!("  Society Analyzer API");
            println!("─────────────────────────────────");
            println!("  Backend  : {}", api.base_url());
            println!("  Status   : {}", health.status);
            println!("  Message  : {}", health.message);
            println!("  Token    : {}", health.token_status.as_deref().unwrap_or("—"));
            println!("  Demo     : {}", if health.demo_mode { "yes" } else { "no" });
            println!("─────────────────────────────────");
            if !health.is_ok() {
                anyhow::bail!("Backend reported status {:?}", health.status);
            }
        }
    }

    Ok(())
}

fn build_api(config: &AppConfig) -> Result<HttpAnalysisApi> {
    HttpAnalysisApi::new(&config.api).context("Failed to build analysis client")
}
