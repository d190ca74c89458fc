use std::{
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{Local, NaiveTime};
use rust_xlsxwriter::{Format, Workbook};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::{CompanyStore, FinancialUpdates, StorageOutcome, StoreError, TaskType};
use crate::{
    configuration::StorageMode,
    domain::{CompanyField, CompanyRecord},
};

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to read workbook: {0}")]
    Read(#[from] calamine::XlsxError),
    #[error("workbook has no sheet: {0}")]
    NoSheet(PathBuf),
}

pub struct SpreadsheetStore {
    output_dir: PathBuf,
}

impl SpreadsheetStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        SpreadsheetStore {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn resolve_output_path(
        &self,
        task_type: TaskType,
        filename: Option<&Path>,
    ) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let name = match filename.and_then(Path::file_name) {
            Some(name) => PathBuf::from(name),
            None => PathBuf::from(format!(
                "{}_{}.xlsx",
                task_type.file_prefix(),
                Local::now().format("%Y%m%d_%H%M%S")
            )),
        };

        Ok(self.output_dir.join(name))
    }

    fn resolve_input_path(&self, source: &Path) -> PathBuf {
        match (source.exists(), source.file_name()) {
            (false, Some(name)) if self.output_dir.join(name).exists() => {
                self.output_dir.join(name)
            }
            _ => source.to_path_buf(),
        }
    }

    pub fn write(
        &self,
        records: &[CompanyRecord],
        task_type: TaskType,
        filename: Option<&Path>,
        append: bool,
    ) -> Result<PathBuf, SpreadsheetError> {
        let path = self.resolve_output_path(task_type, filename)?;

        let rows = match append && path.exists() {
            true => {
                let mut existing = read_records(&path)?;
                existing.extend_from_slice(records);
                existing
            }
            false => records.to_vec(),
        };

        write_sheet(&path, &rows)?;
        Ok(path)
    }

    fn apply_financial_updates(
        &self,
        updates: &FinancialUpdates,
        source: Option<&Path>,
    ) -> Result<PathBuf, SpreadsheetError> {
        let records = match source {
            Some(source) => {
                let mut records = read_records(&self.resolve_input_path(source))?;
                for (company_name, revenue) in updates {
                    let mut matched = false;
                    for record in records
                        .iter_mut()
                        .filter(|r| r.get(CompanyField::CompanyName) == Some(company_name.as_str()))
                    {
                        record.set(CompanyField::Revenue3Years, revenue.as_str());
                        matched = true;
                    }
                    if !matched {
                        log::warn!("No row found for company {}", company_name);
                    }
                }
                records
            }
            None => updates
                .iter()
                .map(|(company_name, revenue)| {
                    let mut record = CompanyRecord::new()
                        .with(CompanyField::CompanyName, company_name.as_str())
                        .with(CompanyField::Revenue3Years, revenue.as_str());
                    record.fill_unknown();
                    record
                })
                .collect(),
        };

        let path = self.resolve_output_path(TaskType::FinancialUpdate, source)?;
        write_sheet(&path, &records)?;
        Ok(path)
    }
}

#[async_trait]
impl CompanyStore for SpreadsheetStore {
    fn kind(&self) -> StorageMode {
        StorageMode::Excel
    }

    async fn save(
        &self,
        records: &[CompanyRecord],
        task_type: TaskType,
        target: Option<&Path>,
        append: bool,
    ) -> StorageOutcome {
        match self.write(records, task_type, target, append) {
            Ok(path) => {
                log::info!("Data saved to {}", path.display());
                StorageOutcome::Written(path)
            }
            Err(e) => {
                log::error!("Error while saving spreadsheet: {}", e);
                StorageOutcome::Failed
            }
        }
    }

    async fn update_financial(
        &self,
        updates: &FinancialUpdates,
        target: Option<&Path>,
    ) -> StorageOutcome {
        match self.apply_financial_updates(updates, target) {
            Ok(path) => {
                log::info!("Financial data saved to {}", path.display());
                StorageOutcome::Written(path)
            }
            Err(e) => {
                log::error!("Error while saving financial updates: {}", e);
                StorageOutcome::Failed
            }
        }
    }

    async fn load_all(&self, source: Option<&Path>) -> Result<Vec<CompanyRecord>, StoreError> {
        let source = source.ok_or(StoreError::SourceRequired)?;
        let path = self.resolve_input_path(source);

        match read_records(&path) {
            Ok(records) => Ok(records),
            Err(e) => {
                log::error!("Failed to read {}: {}", path.display(), e);
                Ok(vec![])
            }
        }
    }
}

fn write_sheet(path: &Path, records: &[CompanyRecord]) -> Result<(), SpreadsheetError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    for (col, field) in CompanyField::ALL.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, field.label(), &header_format)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        for (col, value) in record.row().into_iter().enumerate() {
            worksheet.write_string(row, col as u16, value)?;
        }
    }

    // Written beside the target and renamed over it, so a failed save never
    // truncates rows from earlier writes.
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)?;
    workbook.save_to_writer(staged.as_file_mut())?;
    staged.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Reads the first sheet, matching header cells to fields by label or column
/// name. Columns outside the schema land in the record's extras.
pub fn read_records(path: &Path) -> Result<Vec<CompanyRecord>, SpreadsheetError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SpreadsheetError::NoSheet(path.to_path_buf()))??;

    let mut rows = range.rows();
    let header: Vec<(Option<CompanyField>, String)> = match rows.next() {
        Some(cells) => cells
            .iter()
            .map(|cell| {
                let name = cell_text(cell).unwrap_or_default();
                (CompanyField::from_key(&name), name)
            })
            .collect(),
        None => return Ok(vec![]),
    };

    let mut records = vec![];
    for cells in rows {
        if cells.iter().all(|c| cell_text(c).is_none()) {
            continue;
        }

        let mut record = CompanyRecord::new();
        for ((field, name), cell) in header.iter().zip(cells.iter()) {
            let Some(text) = cell_text(cell) else {
                continue;
            };
            match field {
                Some(field) => record.set(*field, text),
                None if !name.is_empty() => record.set_extra(name.as_str(), text),
                None => {}
            }
        }
        records.push(record);
    }

    Ok(records)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some((*f as i64).to_string()),
        Data::DateTime(dt) if dt.is_datetime() => match dt.as_datetime() {
            Some(dt) if dt.time() == NaiveTime::MIN => Some(dt.format("%Y-%m-%d").to_string()),
            Some(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Some(cell.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_names_carry_the_task_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpreadsheetStore::new(dir.path().join("out"));

        let search = store.resolve_output_path(TaskType::CompanySearch, None).unwrap();
        let financial = store.resolve_output_path(TaskType::FinancialUpdate, None).unwrap();
        let generic = store.resolve_output_path(TaskType::Generic, None).unwrap();

        let name = |p: &PathBuf| p.file_name().unwrap().to_string_lossy().to_string();
        assert!(name(&search).starts_with("company_search_"));
        assert!(name(&financial).starts_with("financial_update_"));
        assert!(name(&generic).starts_with("company_data_"));
        assert!(name(&generic).ends_with(".xlsx"));
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    fn explicit_name_keeps_only_the_file_component() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpreadsheetStore::new(dir.path());

        let path = store
            .resolve_output_path(TaskType::Generic, Some(Path::new("some/where/leads.xlsx")))
            .unwrap();

        assert_eq!(path, dir.path().join("leads.xlsx"));
    }

    #[test]
    fn whole_floats_read_back_without_fraction() {
        assert_eq!(cell_text(&Data::Float(120.0)), Some("120".to_string()));
        assert_eq!(cell_text(&Data::Float(1.5)), Some("1.5".to_string()));
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String(" ".to_string())), None);
    }

    #[test]
    fn iso_date_cells_pass_through() {
        assert_eq!(
            cell_text(&Data::DateTimeIso("2011-05-01".to_string())),
            Some("2011-05-01".to_string())
        );
        assert_eq!(
            cell_text(&Data::DurationIso("PT1H".to_string())),
            Some("PT1H".to_string())
        );
    }

    #[test]
    fn rewriting_leaves_only_the_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.xlsx");
        let acme = CompanyRecord::new().with(CompanyField::CompanyName, "Acme Robotics");
        let globex = CompanyRecord::new().with(CompanyField::CompanyName, "Globex");

        write_sheet(&path, &[acme.clone()]).unwrap();
        write_sheet(&path, &[acme, globex]).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(read_records(&path).unwrap().len(), 2);
    }
}
