use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use tax_cli::settings::{Overrides, Settings};
use tax_cli::utils::{parse_amount, parse_pf_percent};
use tax_cli::{app, logging, output};
use tax_core::calculations::structured_summary;
use tax_core::{NewCtcConfiguration, Regime, Repository, TaxEngine};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// In-hand salary and tax under India's new income-tax regime.
///
/// Amounts accept Indian grouping (`17,00,000`), a rupee sign, or a lakh
/// suffix (`17L`).
#[derive(Debug, Parser)]
#[command(name = "ctc-compare", version, about)]
struct Cli {
    /// TOML settings file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend (`sqlite` or `memory`).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string; for SQLite a file path or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Assessment year, e.g. `2026-27`.
    #[arg(long, global = true)]
    ay: Option<String>,

    /// PF contribution as a percentage of CTC.
    #[arg(long, global = true, value_parser = parse_pf_percent, conflicts_with = "pf_fixed")]
    pf_percent: Option<Decimal>,

    /// Fixed monthly employee PF contribution in rupees.
    #[arg(long, global = true, value_parser = parse_amount)]
    pf_fixed: Option<Decimal>,

    /// Log filter, e.g. `debug` or `info,tax_core=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List configured assessment years.
    Years,

    /// Full tax breakdown for one CTC.
    Breakdown {
        #[arg(value_parser = parse_amount)]
        ctc: Decimal,
    },

    /// Compare expected salaries against the current one.
    Compare {
        /// Expected CTCs; at most five are compared.
        #[arg(required = true, value_parser = parse_amount)]
        salaries: Vec<Decimal>,

        /// Current CTC.
        #[arg(long, value_parser = parse_amount, default_value = "0")]
        previous: Decimal,

        /// Print the structured summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage saved comparison scenarios.
    #[command(subcommand)]
    Scenario(ScenarioCommand),
}

#[derive(Debug, Subcommand)]
enum ScenarioCommand {
    /// Save the salaries as a new version.
    Save {
        #[arg(required = true, value_parser = parse_amount)]
        salaries: Vec<Decimal>,

        #[arg(long, value_parser = parse_amount, default_value = "0")]
        previous: Decimal,
    },
    /// List saved versions, newest first.
    List,
    Show { version: i64 },
    Latest,
    Delete { version: i64 },
    /// Delete every saved version.
    Clear,
    /// Compare a saved version's salaries again.
    Run {
        version: i64,

        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            backend: self.backend.clone(),
            connection: self.db.clone(),
            assessment_year: self.ay.clone(),
            pf_percent: self.pf_percent,
            pf_fixed: self.pf_fixed,
            log_level: self.log_level.clone(),
        }
    }
}

// ─── commands ────────────────────────────────────────────────────────────────

fn print_report(
    report: &app::ComparisonReport,
    json: bool,
) -> Result<()> {
    if json {
        let summary = structured_summary(
            &report.options,
            &report.assessment_year,
            Regime::New,
            Utc::now(),
        );
        let text = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{text}");
    } else {
        print!("{}", output::comparison(report));
    }
    Ok(())
}

async fn run_scenario_command(
    repo: &dyn Repository,
    settings: &Settings,
    command: ScenarioCommand,
) -> Result<()> {
    match command {
        ScenarioCommand::Save { salaries, previous } => {
            let saved = app::save_scenario(
                repo,
                NewCtcConfiguration {
                    assessment_year: settings.assessment_year.clone(),
                    pf_policy: settings.pf_policy,
                    previous_salary: previous,
                    expected_salaries: salaries,
                },
            )
            .await?;
            print!("{}", output::scenario(&saved));
        }
        ScenarioCommand::List => {
            let versions = repo.list_versions().await.context("failed to list scenarios")?;
            print!("{}", output::versions(&versions));
        }
        ScenarioCommand::Show { version } => {
            let scenario = repo
                .get(version)
                .await
                .with_context(|| format!("failed to load scenario v{version}"))?;
            print!("{}", output::scenario(&scenario));
        }
        ScenarioCommand::Latest => {
            match repo.get_latest().await.context("failed to load latest scenario")? {
                Some(scenario) => print!("{}", output::scenario(&scenario)),
                None => println!("No saved scenarios."),
            }
        }
        ScenarioCommand::Delete { version } => {
            repo.delete(version)
                .await
                .with_context(|| format!("failed to delete scenario v{version}"))?;
            println!("Deleted scenario v{version}.");
        }
        ScenarioCommand::Clear => {
            repo.clear_all().await.context("failed to clear scenarios")?;
            println!("Deleted all saved scenarios.");
        }
        ScenarioCommand::Run { version, json } => {
            let (scenario, report) = app::run_scenario(repo, version).await?;
            if !json {
                print!("{}", output::scenario(&scenario));
                println!();
            }
            print_report(&report, json)?;
        }
    }
    Ok(())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?.apply(cli.overrides());

    if let Some(level) = &settings.log_level {
        logging::set_log_level(level)?;
    }
    if let Some(path) = &settings.log_file {
        logging::enable_file_logging(path)?;
    }

    let db_config = settings.db_config();
    debug!(backend = %db_config.backend, "connecting");
    let repo = app::build_registry()
        .create(&db_config)
        .await
        .with_context(|| format!("failed to open {} database", db_config.backend))?;

    match cli.command {
        Command::Years => {
            let years = repo
                .list_assessment_years(Regime::New)
                .await
                .context("failed to list assessment years")?;
            print!("{}", output::years(&years));
        }
        Command::Breakdown { ctc } => {
            let config = app::load_configuration(&*repo, &settings.assessment_year).await?;
            let engine = TaxEngine::new(&config)
                .with_context(|| format!("AY {} cannot be used", config.assessment_year))?;
            let breakdown = engine.compute_breakdown(ctc, &settings.pf_policy);
            print!("{}", output::breakdown(&breakdown, &config.assessment_year));
        }
        Command::Compare {
            salaries,
            previous,
            json,
        } => {
            let config = app::load_configuration(&*repo, &settings.assessment_year).await?;
            let report =
                app::compare_salaries(&config, previous, &salaries, &settings.pf_policy)
                    .with_context(|| format!("AY {} cannot be used", config.assessment_year))?;
            print_report(&report, json)?;
        }
        Command::Scenario(command) => run_scenario_command(&*repo, &settings, command).await?,
    }

    Ok(())
}
