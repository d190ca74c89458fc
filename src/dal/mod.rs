pub mod company_db;
pub mod spreadsheet;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use thiserror::Error;

pub use company_db::MySqlStore;
pub use spreadsheet::SpreadsheetStore;

use crate::{
    configuration::{Settings, StorageMode},
    domain::CompanyRecord,
};

pub type FinancialUpdates = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskType {
    CompanySearch,
    FinancialUpdate,
    Generic,
}

impl TaskType {
    pub fn file_prefix(&self) -> &'static str {
        match self {
            TaskType::CompanySearch => "company_search",
            TaskType::FinancialUpdate => "financial_update",
            TaskType::Generic => "company_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageOutcome {
    Written(PathBuf),
    Committed,
    Failed,
}

impl StorageOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, StorageOutcome::Failed)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            StorageOutcome::Written(path) => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an input spreadsheet is required in excel mode")]
    SourceRequired,
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    fn kind(&self) -> StorageMode;

    async fn save(
        &self,
        records: &[CompanyRecord],
        task_type: TaskType,
        target: Option<&Path>,
        append: bool,
    ) -> StorageOutcome;

    async fn update_financial(
        &self,
        updates: &FinancialUpdates,
        target: Option<&Path>,
    ) -> StorageOutcome;

    /// Loads every stored company. Backend failures are logged and yield an
    /// empty list; only a missing required source is an error.
    async fn load_all(&self, source: Option<&Path>) -> Result<Vec<CompanyRecord>, StoreError>;
}

pub fn build_store(settings: &Settings) -> Box<dyn CompanyStore> {
    match settings.storage_mode {
        StorageMode::Excel => Box::new(SpreadsheetStore::new(settings.output_dir.clone())),
        StorageMode::Mysql => Box::new(MySqlStore::new(settings.database.clone())),
    }
}
