use std::path::PathBuf;

use dialoguer::Input;
use leadscout::{
    configuration::{get_configuration, StorageMode},
    dal::StorageOutcome,
    services::BackfillStatus,
    startup::Application,
    telemetry::init_logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let configuration = get_configuration()?;
    init_logging(&configuration.log_dir)?;

    log::info!("Program started");
    log::info!("Storage mode: {}", configuration.storage_mode);

    let application = Application::build(&configuration)?;

    let mode: String = Input::new()
        .with_prompt("Select mode (1: new search, 2: financial backfill)")
        .interact_text()?;

    match mode.trim() {
        "1" => run_search(&application).await?,
        "2" => run_backfill(&application).await?,
        other => log::error!("Invalid mode: {}", other),
    }

    log::info!("Program finished");
    Ok(())
}

async fn run_search(application: &Application) -> anyhow::Result<()> {
    let keyword: String = Input::new()
        .with_prompt("Search keyword")
        .interact_text()?;
    let limit: String = Input::new()
        .with_prompt("Number of results (empty for no limit)")
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), &str> {
            match input.trim().is_empty() || input.trim().parse::<usize>().is_ok() {
                true => Ok(()),
                false => Err("enter a whole number or leave empty"),
            }
        })
        .interact_text()?;
    let limit = limit.trim().parse::<usize>().ok();

    log::info!(
        "Searching and scraping, keyword: {}, limit: {}",
        keyword,
        limit.map_or("none".to_string(), |l| l.to_string())
    );
    let run = application.run_search(keyword.trim(), limit).await;

    log::info!(
        "Scraping finished, {} records extracted, {} urls skipped",
        run.records.len(),
        run.skipped.len()
    );
    match run.last_write {
        Some(StorageOutcome::Written(path)) => log::info!("Data saved to {}", path.display()),
        Some(StorageOutcome::Committed) => log::info!("Data saved to the database"),
        Some(StorageOutcome::Failed) => log::error!("The last write failed"),
        None => {}
    }

    Ok(())
}

async fn run_backfill(application: &Application) -> anyhow::Result<()> {
    let source = match application.storage_mode() {
        StorageMode::Mysql => None,
        StorageMode::Excel => {
            let filename: String = Input::new()
                .with_prompt("Excel file to process")
                .allow_empty(true)
                .interact_text()?;
            if filename.trim().is_empty() {
                log::error!("An input file is required in excel mode");
                return Ok(());
            }
            Some(PathBuf::from(filename.trim()))
        }
    };

    let report = match application.run_backfill(source.as_deref()).await {
        Ok(report) => report,
        Err(e) => {
            log::error!("{}", e);
            return Ok(());
        }
    };

    match &report.status {
        BackfillStatus::Persisted(StorageOutcome::Written(path)) => {
            log::info!("Financial data updated, saved to {}", path.display())
        }
        BackfillStatus::Persisted(StorageOutcome::Committed) => {
            log::info!("Financial data updated in the database")
        }
        BackfillStatus::NothingToUpdate => log::info!("Nothing to update"),
        BackfillStatus::Persisted(StorageOutcome::Failed) | BackfillStatus::NoRecords => {
            log::error!("Financial data update failed")
        }
    }

    Ok(())
}
