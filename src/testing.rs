use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    configuration::StorageMode,
    dal::{
        company_db::update_batch_outcome, CompanyStore, FinancialUpdates, StorageOutcome,
        StoreError, TaskType,
    },
    domain::{CompanyField, CompanyRecord},
    services::{Extraction, ExtractionEngine, ExtractionError, SearchError, SearchProvider},
};

#[derive(Default)]
pub struct MockSearchProvider {
    results: Mutex<HashMap<String, Vec<String>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, Option<usize>)>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_urls(self, query: &str, urls: &[&str]) -> Self {
        self.results.lock().unwrap().insert(
            query.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }

    pub fn with_failure(self, query: &str) -> Self {
        self.failing.lock().unwrap().insert(query.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<usize>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<String>, SearchError> {
        self.calls.lock().unwrap().push((query.to_string(), limit));

        if self.failing.lock().unwrap().contains(query) {
            return Err(SearchError::Blocked(query.to_string()));
        }

        let mut urls = self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        if let Some(limit) = limit {
            urls.truncate(limit);
        }
        Ok(urls)
    }
}

/// Answers by URL. URLs without a configured answer fail to extract.
#[derive(Default)]
pub struct MockExtractionEngine {
    answers: Mutex<HashMap<String, Extraction>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockExtractionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(self, url: &str, extraction: Extraction) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(url.to_string(), extraction);
        self
    }

    pub fn with_text(self, url: &str, text: &str) -> Self {
        self.with_answer(url, Extraction::Text(text.to_string()))
    }

    pub fn extracted_urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }
}

#[async_trait]
impl ExtractionEngine for MockExtractionEngine {
    async fn extract(&self, url: &str, prompt: &str) -> Result<Extraction, ExtractionError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), prompt.to_string()));

        self.answers
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ExtractionError::EmptyPage(url.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveCall {
    pub records: Vec<CompanyRecord>,
    pub task_type: TaskType,
    pub target: Option<PathBuf>,
    pub append: bool,
}

/// Keeps companies in a vector. Behaves like the backend of `kind`: excel
/// requires a source to load from, mysql fails updates for unknown names.
pub struct MemoryStore {
    kind: StorageMode,
    records: Mutex<Vec<CompanyRecord>>,
    saves: Mutex<Vec<SaveCall>>,
    updates: Mutex<Vec<FinancialUpdates>>,
}

impl MemoryStore {
    pub fn new(kind: StorageMode) -> Self {
        MemoryStore {
            kind,
            records: Mutex::new(vec![]),
            saves: Mutex::new(vec![]),
            updates: Mutex::new(vec![]),
        }
    }

    pub fn with_records(self, records: Vec<CompanyRecord>) -> Self {
        *self.records.lock().unwrap() = records;
        self
    }

    pub fn records(&self) -> Vec<CompanyRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn saves(&self) -> Vec<SaveCall> {
        self.saves.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<FinancialUpdates> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    fn kind(&self) -> StorageMode {
        self.kind
    }

    async fn save(
        &self,
        records: &[CompanyRecord],
        task_type: TaskType,
        target: Option<&Path>,
        append: bool,
    ) -> StorageOutcome {
        self.saves.lock().unwrap().push(SaveCall {
            records: records.to_vec(),
            task_type,
            target: target.map(Path::to_path_buf),
            append,
        });
        self.records.lock().unwrap().extend_from_slice(records);

        match self.kind {
            StorageMode::Excel => StorageOutcome::Written(
                target
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("memory.xlsx")),
            ),
            StorageMode::Mysql => StorageOutcome::Committed,
        }
    }

    async fn update_financial(
        &self,
        updates: &FinancialUpdates,
        target: Option<&Path>,
    ) -> StorageOutcome {
        self.updates.lock().unwrap().push(updates.clone());

        let mut records = self.records.lock().unwrap();
        let mut matched = vec![];
        for (company_name, revenue) in updates {
            let mut hit = false;
            for record in records
                .iter_mut()
                .filter(|r| r.get(CompanyField::CompanyName) == Some(company_name.as_str()))
            {
                record.set(CompanyField::Revenue3Years, revenue.as_str());
                hit = true;
            }
            matched.push(hit);
        }

        match self.kind {
            StorageMode::Excel => StorageOutcome::Written(
                target
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("memory.xlsx")),
            ),
            StorageMode::Mysql => update_batch_outcome(&matched),
        }
    }

    async fn load_all(&self, source: Option<&Path>) -> Result<Vec<CompanyRecord>, StoreError> {
        if self.kind == StorageMode::Excel && source.is_none() {
            return Err(StoreError::SourceRequired);
        }
        Ok(self.records())
    }
}
