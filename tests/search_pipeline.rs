use chrono::Local;
use leadscout::{
    configuration::StorageMode,
    dal::{spreadsheet::read_records, SpreadsheetStore, StorageOutcome, TaskType},
    domain::{CompanyField, UNKNOWN},
    services::{search_and_scrape, Extraction, Prompts, SkipReason},
    testing::{MemoryStore, MockExtractionEngine, MockSearchProvider},
};
use serde_json::json;

const URL_1: &str = "https://acme-robotics.test/about";
const URL_2: &str = "https://news.test/acme";

fn prompts() -> Prompts {
    Prompts {
        currency: "RMB (yuan)".to_string(),
        reference_year: 2025,
    }
}

fn acme_profile() -> Extraction {
    Extraction::Structured(
        json!({
            "Company Name": "Acme Robotics",
            "Company Website": "https://acme-robotics.test",
            "Employee Count": "about 120 staff",
            "Data Source": "https://made-up.test",
        })
        .as_object()
        .cloned()
        .unwrap(),
    )
}

#[tokio::test]
async fn malformed_result_is_skipped_and_valid_one_is_appended() {
    let dir = tempfile::tempdir().unwrap();
    let store = SpreadsheetStore::new(dir.path());
    let searcher = MockSearchProvider::new().with_urls("Acme Robotics", &[URL_1, URL_2, "https://third.test"]);
    let engine = MockExtractionEngine::new()
        .with_answer(URL_1, acme_profile())
        .with_text(URL_2, "Acme Robotics is a robotics company.");

    let run = search_and_scrape(&searcher, &engine, &store, &prompts(), "Acme Robotics", Some(2)).await;

    assert_eq!(searcher.calls(), vec![("Acme Robotics".to_string(), Some(2))]);
    assert_eq!(engine.extracted_urls(), vec![URL_1, URL_2]);

    assert_eq!(run.records.len(), 1);
    let record = &run.records[0];
    assert_eq!(record.get(CompanyField::DataSource), Some(URL_1));
    assert_eq!(
        record.get(CompanyField::DataTime),
        Some(Local::now().date_naive().format("%Y-%m-%d").to_string().as_str())
    );
    assert_eq!(record.get(CompanyField::CompanyEmail), Some(UNKNOWN));

    assert_eq!(run.skipped.len(), 1);
    assert_eq!(run.skipped[0].url, URL_2);
    assert_eq!(run.skipped[0].reason, SkipReason::NotAMapping("text"));

    let path = run.last_write.as_ref().and_then(StorageOutcome::path).unwrap();
    let stored = read_records(path).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].get(CompanyField::CompanyName), Some("Acme Robotics"));
    assert_eq!(stored[0].get(CompanyField::DataSource), Some(URL_1));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn each_record_is_written_as_it_is_extracted() {
    let store = MemoryStore::new(StorageMode::Excel);
    let searcher = MockSearchProvider::new().with_urls("robots", &[URL_1, URL_2, "https://down.test"]);
    let engine = MockExtractionEngine::new()
        .with_answer(URL_1, acme_profile())
        .with_answer(URL_2, acme_profile());

    let run = search_and_scrape(&searcher, &engine, &store, &prompts(), "robots", None).await;

    assert_eq!(run.records.len(), 2);
    assert!(matches!(
        run.skipped[0].reason,
        SkipReason::ExtractionFailed(_)
    ));

    let saves = store.saves();
    assert_eq!(saves.len(), 2);
    assert!(saves.iter().all(|s| s.records.len() == 1 && s.append));
    assert!(saves.iter().all(|s| s.task_type == TaskType::CompanySearch));
    assert_eq!(saves[0].target, None);
    assert_eq!(saves[1].target, Some("memory.xlsx".into()));
    assert_eq!(run.last_write, Some(StorageOutcome::Written("memory.xlsx".into())));
}

#[tokio::test]
async fn search_failure_ends_the_run_without_writes() {
    let store = MemoryStore::new(StorageMode::Mysql);
    let searcher = MockSearchProvider::new().with_failure("robots");
    let engine = MockExtractionEngine::new();

    let run = search_and_scrape(&searcher, &engine, &store, &prompts(), "robots", Some(5)).await;

    assert!(run.records.is_empty());
    assert!(run.last_write.is_none());
    assert!(run.search_error.is_some());
    assert!(engine.extracted_urls().is_empty());
    assert!(store.saves().is_empty());
}

#[tokio::test]
async fn database_mode_reports_committed() {
    let store = MemoryStore::new(StorageMode::Mysql);
    let searcher = MockSearchProvider::new().with_urls("robots", &[URL_1]);
    let engine = MockExtractionEngine::new().with_answer(URL_1, acme_profile());

    let run = search_and_scrape(&searcher, &engine, &store, &prompts(), "robots", None).await;

    assert_eq!(run.last_write, Some(StorageOutcome::Committed));
    assert_eq!(store.records().len(), 1);
    assert!(engine.prompts()[0].contains("Company Name"));
}
