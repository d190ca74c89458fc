use std::path::Path;

use thiserror::Error;

use super::{financial_search_query, Extraction, ExtractionEngine, Prompts, SearchProvider};
use crate::{
    dal::{CompanyStore, FinancialUpdates, StorageOutcome, StoreError},
    domain::CompanyRecord,
};

#[derive(Debug, Error)]
pub enum BackfillError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompanyOutcome {
    Updated(String),
    MissingName,
    AlreadyEnriched,
    NoRevenueFound,
    SearchFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyReport {
    pub row: usize,
    pub company_name: Option<String>,
    pub outcome: CompanyOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackfillStatus {
    NoRecords,
    NothingToUpdate,
    Persisted(StorageOutcome),
}

#[derive(Debug)]
pub struct BackfillReport {
    pub companies: Vec<CompanyReport>,
    pub updates: FinancialUpdates,
    pub status: BackfillStatus,
}

impl BackfillReport {
    pub fn is_success(&self) -> bool {
        match &self.status {
            BackfillStatus::NoRecords => false,
            BackfillStatus::NothingToUpdate => true,
            BackfillStatus::Persisted(outcome) => outcome.is_success(),
        }
    }
}

pub async fn enrich_financial_data(
    searcher: &dyn SearchProvider,
    engine: &dyn ExtractionEngine,
    store: &dyn CompanyStore,
    prompts: &Prompts,
    results_per_company: usize,
    source: Option<&Path>,
) -> Result<BackfillReport, BackfillError> {
    log::info!("Starting financial data backfill");

    let records = store.load_all(source).await?;
    if records.is_empty() {
        log::error!("No company data could be loaded");
        return Ok(BackfillReport {
            companies: vec![],
            updates: FinancialUpdates::new(),
            status: BackfillStatus::NoRecords,
        });
    }
    log::info!("Loaded {} records", records.len());

    let mut companies = vec![];
    let mut updates = FinancialUpdates::new();

    for (index, record) in records.iter().enumerate() {
        let row = index + 1;
        let outcome = enrich_record(searcher, engine, prompts, results_per_company, row, record).await;

        if let (Some(name), CompanyOutcome::Updated(revenue)) = (record.company_name(), &outcome) {
            updates.insert(name.to_string(), revenue.clone());
        }

        companies.push(CompanyReport {
            row,
            company_name: record.company_name().map(str::to_string),
            outcome,
        });
    }

    if updates.is_empty() {
        log::info!("No financial data to update");
        return Ok(BackfillReport {
            companies,
            updates,
            status: BackfillStatus::NothingToUpdate,
        });
    }

    let outcome = store.update_financial(&updates, source).await;
    match outcome.is_success() {
        true => log::info!("Financial data update finished"),
        false => log::error!("Failed to save the updated financial data"),
    }

    Ok(BackfillReport {
        companies,
        updates,
        status: BackfillStatus::Persisted(outcome),
    })
}

async fn enrich_record(
    searcher: &dyn SearchProvider,
    engine: &dyn ExtractionEngine,
    prompts: &Prompts,
    results_per_company: usize,
    row: usize,
    record: &CompanyRecord,
) -> CompanyOutcome {
    let Some(company_name) = record.company_name() else {
        log::warn!("Row {} has no company name, skipping", row);
        return CompanyOutcome::MissingName;
    };

    if record.revenue().is_some() {
        log::info!("Company {} already has financial data, skipping", company_name);
        return CompanyOutcome::AlreadyEnriched;
    }

    log::info!("Processing row {}: {}", row, company_name);
    find_revenue(searcher, engine, prompts, results_per_company, company_name).await
}

pub async fn find_revenue(
    searcher: &dyn SearchProvider,
    engine: &dyn ExtractionEngine,
    prompts: &Prompts,
    results_per_company: usize,
    company_name: &str,
) -> CompanyOutcome {
    let query = financial_search_query(company_name);
    let urls = match searcher.search(&query, Some(results_per_company)).await {
        Ok(urls) => urls,
        Err(e) => {
            log::error!("Search for {} financial data failed: {}", company_name, e);
            return CompanyOutcome::SearchFailed(e.to_string());
        }
    };
    log::info!("Found {} candidate pages", urls.len());

    let prompt = prompts.revenue();
    for url in &urls {
        log::info!("Extracting financial data from {}", url);
        match engine.extract(url, &prompt).await {
            Ok(extraction) => {
                if let Some(revenue) = accept_revenue(&extraction) {
                    log::info!("Updated financial data for {}: {}", company_name, revenue);
                    return CompanyOutcome::Updated(revenue);
                }
            }
            Err(e) => log::error!("Error while processing url {}: {}", url, e),
        }
    }

    CompanyOutcome::NoRevenueFound
}

pub fn accept_revenue(extraction: &Extraction) -> Option<String> {
    match extraction {
        Extraction::Text(text) if text.contains(':') && !text.trim().is_empty() => {
            Some(text.trim().to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use super::*;

    #[test]
    fn accepts_only_text_with_a_separator() {
        assert_eq!(
            accept_revenue(&Extraction::Text(" 2023: 5000000 ".to_string())),
            Some("2023: 5000000".to_string())
        );
        assert_eq!(accept_revenue(&Extraction::Text("no figures".to_string())), None);
        assert_eq!(accept_revenue(&Extraction::Text(String::new())), None);
        assert_eq!(accept_revenue(&Extraction::Structured(Map::new())), None);
        assert_eq!(accept_revenue(&Extraction::Other(json!(["2023: 1"]))), None);
    }
}
