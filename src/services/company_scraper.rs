use std::path::PathBuf;

use chrono::{Local, NaiveDate};

use super::{Extraction, ExtractionEngine, Prompts, SearchProvider};
use crate::{
    dal::{CompanyStore, StorageOutcome, TaskType},
    domain::{normalize, CompanyRecord},
};

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    ExtractionFailed(String),
    NotAMapping(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum UrlOutcome {
    Extracted(CompanyRecord),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct SearchRun {
    pub records: Vec<CompanyRecord>,
    pub skipped: Vec<SkippedUrl>,
    /// Outcome of the final write only.
    pub last_write: Option<StorageOutcome>,
    pub search_error: Option<String>,
}

pub async fn search_and_scrape(
    searcher: &dyn SearchProvider,
    engine: &dyn ExtractionEngine,
    store: &dyn CompanyStore,
    prompts: &Prompts,
    keyword: &str,
    limit: Option<usize>,
) -> SearchRun {
    let mut run = SearchRun::default();

    log::info!("Searching for keyword: {}", keyword);
    let urls = match searcher.search(keyword, limit).await {
        Ok(urls) => urls,
        Err(e) => {
            log::error!("Search failed: {}", e);
            run.search_error = Some(e.to_string());
            return run;
        }
    };
    log::info!("Search returned {} urls", urls.len());

    let prompt = prompts.company_profile();
    // Later records of the run are appended to the file the first write created.
    let mut target: Option<PathBuf> = None;

    for (index, url) in urls.iter().enumerate() {
        log::info!("Processing url {}/{}: {}", index + 1, urls.len(), url);

        let today = Local::now().date_naive();
        match scrape_url(engine, url, &prompt, today).await {
            UrlOutcome::Extracted(record) => {
                log::info!("Scraped url: {}", url);
                run.records.push(record.clone());

                let outcome = store
                    .save(&[record], TaskType::CompanySearch, target.as_deref(), true)
                    .await;
                if let Some(path) = outcome.path() {
                    target = Some(path.to_path_buf());
                }
                run.last_write = Some(outcome);
            }
            UrlOutcome::Skipped(reason) => {
                run.skipped.push(SkippedUrl {
                    url: url.clone(),
                    reason,
                });
            }
        }
    }

    run
}

pub async fn scrape_url(
    engine: &dyn ExtractionEngine,
    url: &str,
    prompt: &str,
    today: NaiveDate,
) -> UrlOutcome {
    match engine.extract(url, prompt).await {
        Ok(Extraction::Structured(raw)) => UrlOutcome::Extracted(normalize(&raw, url, today)),
        Ok(other) => {
            log::error!("Url {} returned {} instead of a mapping", url, other.kind());
            UrlOutcome::Skipped(SkipReason::NotAMapping(other.kind()))
        }
        Err(e) => {
            log::error!("Error while scraping {}: {}", url, e);
            UrlOutcome::Skipped(SkipReason::ExtractionFailed(e.to_string()))
        }
    }
}
