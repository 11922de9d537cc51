// ==========================================
// IPO Validation - Command Line Entry
// ==========================================
// run   : execute one validation (manual trigger)
// list  : recent runs, 20 per page
// show  : summary statistics of one run
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ipo_validation::app::{self, find_run, list_runs, load_summary, ValidationJobService};
use ipo_validation::config::{ConfigManager, DEFAULT_CONFIG_FILE};
use ipo_validation::domain::TriggerType;
use ipo_validation::repository::{CsvResultStore, ResultStore, ValidationRunRepository};
use ipo_validation::{logging, APP_NAME, VERSION};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Part usage vs. IP&O planning feed reconciliation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the run database and result artifacts
    #[arg(long, global = true, env = "IPO_VALIDATION_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a validation now
    Run {
        /// Configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Skip the metadata exclusion filter
        #[arg(long)]
        no_exclusions: bool,
    },
    /// List recent validation runs
    List {
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Print a run's summary statistics as JSON
    Show { run_id: String },
}

struct DataDir {
    runs: Arc<ValidationRunRepository>,
    store: Arc<CsvResultStore>,
}

fn open_data_dir(dir: &Path) -> Result<DataDir> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating data directory {}", dir.display()))?;
    let db_path = dir.join(app::RUNS_DB_FILE);
    let runs = ValidationRunRepository::new(&db_path.to_string_lossy())
        .with_context(|| format!("opening run database {}", db_path.display()))?;
    let store = CsvResultStore::new(dir.join(app::RESULTS_DIR))?;
    Ok(DataDir {
        runs: Arc::new(runs),
        store: Arc::new(store),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(app::default_data_dir);
    info!(app = APP_NAME, version = VERSION, data_dir = %data_dir.display(), "starting");
    let data = open_data_dir(&data_dir)?;

    match cli.command {
        Command::Run {
            config,
            no_exclusions,
        } => {
            let mut config = ConfigManager::load(&config)
                .with_context(|| format!("loading configuration {}", config.display()))?;
            if no_exclusions {
                config.set_apply_exclusions(false)?;
            }

            let store: Arc<dyn ResultStore> = data.store.clone();
            let service = Arc::new(ValidationJobService::new(config, data.runs.clone(), store));
            let handle = service.spawn_job(TriggerType::Manual);
            let run = ValidationJobService::join(handle).await?;

            println!(
                "run {} {}: {} records, {} critical issues, {:.2}s",
                run.id,
                run.status,
                run.total_records.unwrap_or(0),
                run.critical_issues.unwrap_or(0),
                run.execution_time_secs.unwrap_or(0.0)
            );
        }
        Command::List { page } => {
            let listing = list_runs(&data.runs, page)?;
            println!(
                "page {}/{} ({} runs)",
                listing.page, listing.total_pages, listing.total_runs
            );
            for run in listing.runs {
                println!(
                    "{}  {:<9}  {:<9}  {}..{}  records={}  critical={}{}",
                    run.id,
                    run.status.as_str(),
                    run.triggered_by.as_str(),
                    run.start_date,
                    run.end_date,
                    run.total_records.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
                    run.critical_issues.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
                    run.error.map(|e| format!("  error={}", e)).unwrap_or_default()
                );
            }
        }
        Command::Show { run_id } => {
            let run = find_run(&data.runs, &run_id)?;
            let summary = load_summary(data.store.as_ref(), &run.id)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
