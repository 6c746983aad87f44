use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use paperset_core::storage::{stage_release, write_dataset};
use paperset_core::{AppConfig, TableCounts};
use paperset_science::{OpenAlexFetcher, normalize_file};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "paperset",
    about = "Build a deduplicated papers/citations/authors dataset from OpenAlex",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format. Also enabled by setting PAPERSET_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the standard location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download OpenAlex search results into the raw JSONL feed.
    Fetch {
        /// Feed to write (default: paths.raw).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Search query; repeat for several. Replaces fetch.queries.
        #[arg(long = "query", action = clap::ArgAction::Append)]
        queries: Vec<String>,
        /// Pages per query.
        #[arg(long)]
        pages: Option<u32>,
    },

    /// Fold the raw feed into papers.csv, citations.csv and authors.csv.
    Normalize {
        /// Feed to read (default: paths.raw).
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory for the tables (default: paths.processed).
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Copy the finished tables into a dated release directory.
    Release {
        /// Directory holding the tables (default: paths.processed).
        #[arg(long)]
        from: Option<PathBuf>,
        /// Parent of the release directories (default: paths.releases).
        #[arg(long)]
        to: Option<PathBuf>,
    },

    /// Fetch, normalize and release in one go.
    Run,

    /// Config inspection.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the config file path that would be read.
    Path,
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let json_output = cli.json || std::env::var("PAPERSET_JSON").as_deref() == Ok("1");

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    config.apply_env();
    tracing::debug!(path = %config_path.display(), "config resolved");

    match cli.command {
        Commands::Fetch { out, queries, pages } => {
            if let Some(out) = out {
                config.paths.raw = out;
            }
            if !queries.is_empty() {
                config.fetch.queries = queries;
            }
            if let Some(pages) = pages {
                config.fetch.pages = pages;
            }
            let written = fetch(&config).await?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "records": written, "path": config.paths.raw },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Wrote {} ({written} records)", config.paths.raw.display());
            }
        }

        Commands::Normalize { input, out_dir } => {
            if let Some(input) = input {
                config.paths.raw = input;
            }
            if let Some(out_dir) = out_dir {
                config.paths.processed = out_dir;
            }
            let counts = normalize(&config)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": counts,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{counts}");
            }
        }

        Commands::Release { from, to } => {
            if let Some(from) = from {
                config.paths.processed = from;
            }
            if let Some(to) = to {
                config.paths.releases = to;
            }
            let staged = release(&config)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "release": staged },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Release staged at {}", staged.display());
            }
        }

        Commands::Run => {
            let written = fetch(&config).await?;
            let counts = normalize(&config)?;
            let staged = release(&config)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "records": written, "tables": counts, "release": staged },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("Wrote {} ({written} records)", config.paths.raw.display());
                println!("{counts}");
                println!("Release staged at {}", staged.display());
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                if json_output {
                    print_json(&serde_json::json!({"status": "ok", "data": config}))?;
                } else {
                    print!("{}", config.to_toml()?);
                }
            }
            ConfigAction::Path => {
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "ok",
                        "data": { "path": config_path, "exists": config_path.exists() }
                    }))?;
                } else {
                    println!("{}", config_path.display());
                }
            }
        },
    }

    Ok(())
}

// ─── Steps ───────────────────────────────────────────────────────────────────

async fn fetch(config: &AppConfig) -> Result<usize> {
    let fetcher = OpenAlexFetcher::new(&config.fetch)?;
    let written = fetcher
        .fetch_to_path(&config.fetch.queries, &config.paths.raw)
        .await
        .context("fetching from OpenAlex")?;
    Ok(written)
}

fn normalize(config: &AppConfig) -> Result<TableCounts> {
    let dataset = normalize_file(&config.paths.raw, config.normalize.orphan_rows)
        .with_context(|| format!("normalizing {}", config.paths.raw.display()))?;
    Ok(write_dataset(&config.paths.processed, &dataset)?)
}

fn release(config: &AppConfig) -> Result<PathBuf> {
    let today = chrono::Utc::now().date_naive();
    Ok(stage_release(
        &config.paths.processed,
        &config.paths.releases,
        today,
    )?)
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}
