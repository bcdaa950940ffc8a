use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tax_data::SlabConfigurationLoader;
use tax_db_sqlite::{SqliteRepository, connection_url};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Load new-regime tax slab configurations from a CSV file into the database.
///
/// Columns: assessment_year, regime, standard_deduction, cess_rate,
/// rebate_amount, rebate_income_threshold, up_to, rate. One row per slab;
/// leave `up_to` empty for the top slab and both rebate columns empty when
/// the year has no rebate.
#[derive(Parser, Debug)]
#[command(name = "tax-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV file with one row per slab
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database path or URL; created when missing
    #[arg(short, long, default_value = "ctc-compare.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from this directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let url = connection_url(&args.database);

    let repo = SqliteRepository::new(&url)
        .await
        .with_context(|| format!("Failed to connect to database: {url}"))?;

    if args.migrate {
        info!("running migrations");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
    }

    if let Some(seeds_dir) = &args.seeds {
        info!(dir = %seeds_dir.display(), "running seeds");
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
    }

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = SlabConfigurationLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;
    info!(rows = records.len(), file = %args.file.display(), "parsed slab rows");

    let loaded = SlabConfigurationLoader::load(&repo, &records)
        .await
        .context("Failed to load slab configurations into database")?;

    println!("Loaded {loaded} slab configuration(s) from {}.", args.file.display());

    Ok(())
}
