use leadscout::{
    configuration::{get_configuration, DatabaseSettings},
    dal::{CompanyStore, FinancialUpdates, MySqlStore, StorageOutcome, TaskType},
    domain::{coerce, columns, ColumnValue, CompanyField, CompanyRecord},
};
use secrecy::SecretString;

fn unreachable_settings() -> DatabaseSettings {
    DatabaseSettings {
        host: "127.0.0.1".to_string(),
        port: 1,
        username: "root".to_string(),
        password: SecretString::from("password"),
        database_name: "company_db".to_string(),
        table: "company_info".to_string(),
        charset: "utf8mb4".to_string(),
    }
}

fn company(name: &str) -> CompanyRecord {
    CompanyRecord::new()
        .with(CompanyField::CompanyName, name)
        .with(CompanyField::EstablishTime, "2011")
        .with(CompanyField::EmployeeCount, "120 employees")
}

const SCHEMA: &str = include_str!("../schema/company_info.sql");

#[test]
fn schema_declares_every_field_column_as_nullable() {
    for column in columns() {
        let definition = SCHEMA
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with(&format!("`{}` ", column)))
            .unwrap_or_else(|| panic!("column {} missing from schema", column));
        assert!(!definition.contains("not null"), "{}", definition);
    }
}

#[test]
fn nameless_record_binds_a_null_name() {
    let mut record = CompanyRecord::new();
    record.fill_unknown();

    assert_eq!(
        coerce(CompanyField::CompanyName, record.get(CompanyField::CompanyName)),
        ColumnValue::Text(None)
    );
}

#[tokio::test]
async fn unreachable_database_degrades_to_failures() {
    let store = MySqlStore::new(unreachable_settings());

    assert!(!store.save_records(&[company("Acme Robotics")]).await);
    assert!(!store.update_company_revenue("Acme Robotics", "2023: 1").await);
    assert!(store.get_all_companies().await.is_empty());

    let outcome = store
        .save(&[company("Acme Robotics")], TaskType::CompanySearch, None, true)
        .await;
    assert_eq!(outcome, StorageOutcome::Failed);
    assert!(store.load_all(None).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "needs a MySQL server with the company_info table"]
async fn saves_updates_and_reads_back() {
    let settings = get_configuration().expect("Failed to read configuration");
    let store = MySqlStore::new(settings.database);
    let name = format!("Acme Robotics {}", chrono::Utc::now().timestamp_micros());

    let outcome = store
        .save(&[company(&name)], TaskType::CompanySearch, None, true)
        .await;
    assert_eq!(outcome, StorageOutcome::Committed);

    let mut updates = FinancialUpdates::new();
    updates.insert(name.clone(), "2023: 5000000".to_string());
    assert_eq!(
        store.update_financial(&updates, None).await,
        StorageOutcome::Committed
    );
    assert!(!store.update_company_revenue("No Such Company Ltd", "2023: 1").await);

    let stored = store
        .get_all_companies()
        .await
        .into_iter()
        .find(|r| r.company_name() == Some(name.as_str()))
        .expect("Saved company was not found");
    assert_eq!(stored.get(CompanyField::EstablishTime), Some("2011-01-01"));
    assert_eq!(stored.get(CompanyField::EmployeeCount), Some("120"));
    assert_eq!(stored.revenue(), Some("2023: 5000000"));
    assert_eq!(stored.get(CompanyField::CompanyEmail), Some("unknown"));
}
