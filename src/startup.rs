use std::path::Path;

use crate::{
    configuration::{Settings, StorageMode},
    dal::{build_store, CompanyStore},
    services::{
        enrich_financial_data, search_and_scrape, BackfillError, BackfillReport, GoogleSearcher,
        Prompts, SearchRun, SmartScraper,
    },
};

pub struct Application {
    searcher: GoogleSearcher,
    scraper: SmartScraper,
    store: Box<dyn CompanyStore>,
    prompts: Prompts,
    financial_results: usize,
}

impl Application {
    pub fn build(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Application {
            searcher: GoogleSearcher::new(&settings.search)?,
            scraper: SmartScraper::new(&settings.llm)?,
            store: build_store(settings),
            prompts: Prompts::from(&settings.llm),
            financial_results: settings.search.financial_results,
        })
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.store.kind()
    }

    pub async fn run_search(&self, keyword: &str, limit: Option<usize>) -> SearchRun {
        search_and_scrape(
            &self.searcher,
            &self.scraper,
            self.store.as_ref(),
            &self.prompts,
            keyword,
            limit,
        )
        .await
    }

    pub async fn run_backfill(&self, source: Option<&Path>) -> Result<BackfillReport, BackfillError> {
        enrich_financial_data(
            &self.searcher,
            &self.scraper,
            self.store.as_ref(),
            &self.prompts,
            self.financial_results,
            source,
        )
        .await
    }
}
