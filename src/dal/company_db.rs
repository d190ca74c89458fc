use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{
    mysql::{MySqlQueryResult, MySqlRow},
    Column, Connection, MySqlConnection, Row,
};

use super::{CompanyStore, FinancialUpdates, StorageOutcome, StoreError, TaskType};
use crate::{
    configuration::{DatabaseSettings, StorageMode},
    domain::{coerce, columns, ColumnValue, CompanyField, CompanyRecord},
};

/// Company table in MySQL. Every public call opens its own connection and
/// closes it before returning.
pub struct MySqlStore {
    settings: DatabaseSettings,
}

impl MySqlStore {
    pub fn new(settings: DatabaseSettings) -> Self {
        MySqlStore { settings }
    }

    async fn connect(&self) -> Option<MySqlConnection> {
        match MySqlConnection::connect_with(&self.settings.with_db()).await {
            Ok(con) => Some(con),
            Err(e) => {
                log::error!("Database connection failed: {}", e);
                None
            }
        }
    }

    async fn close(con: MySqlConnection) {
        if let Err(e) = con.close().await {
            log::warn!("Failed to close database connection: {}", e);
        }
    }

    fn insert_sql(&self) -> String {
        let columns = columns();
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "insert into `{}` ({}) values ({})",
            self.settings.table,
            columns.join(", "),
            placeholders
        )
    }

    pub async fn save_records(&self, records: &[CompanyRecord]) -> bool {
        let Some(mut con) = self.connect().await else {
            return false;
        };

        let result = insert_companies(&mut con, &self.insert_sql(), records).await;
        Self::close(con).await;

        match result {
            Ok(()) => {
                log::info!("Saved {} records to the database", records.len());
                true
            }
            Err(e) => {
                log::error!("Failed to save records to the database: {}", e);
                false
            }
        }
    }

    pub async fn update_company_revenue(&self, company_name: &str, revenue: &str) -> bool {
        let Some(mut con) = self.connect().await else {
            return false;
        };

        let sql = format!(
            "update `{}` set revenue_3years = ?, updated_at = current_timestamp where company_name = ?",
            self.settings.table
        );
        let result: Result<MySqlQueryResult, sqlx::Error> = sqlx::query(&sql)
            .bind(revenue)
            .bind(company_name)
            .execute(&mut con)
            .await;
        Self::close(con).await;

        match result {
            Ok(res) if res.rows_affected() > 0 => {
                log::info!("Updated financial data for {}", company_name);
                true
            }
            Ok(_) => {
                log::warn!("No record found for company {}", company_name);
                false
            }
            Err(e) => {
                log::error!("Failed to update financial data: {}", e);
                false
            }
        }
    }

    pub async fn get_all_companies(&self) -> Vec<CompanyRecord> {
        let Some(mut con) = self.connect().await else {
            return vec![];
        };

        let sql = format!("select * from `{}`", self.settings.table);
        let rows = sqlx::query(&sql).fetch_all(&mut con).await;
        Self::close(con).await;

        match rows {
            Ok(rows) => rows.iter().map(row_to_record).collect(),
            Err(e) => {
                log::error!("Failed to fetch company data: {}", e);
                vec![]
            }
        }
    }
}

async fn insert_companies(
    con: &mut MySqlConnection,
    sql: &str,
    records: &[CompanyRecord],
) -> Result<(), sqlx::Error> {
    // Dropping the transaction on error rolls it back.
    let mut tx = con.begin().await?;

    for record in records {
        let mut query = sqlx::query(sql);
        for field in CompanyField::ALL {
            query = match coerce(field, record.get(field)) {
                ColumnValue::Text(v) => query.bind(v),
                ColumnValue::Date(v) => query.bind(v),
                ColumnValue::Integer(v) => query.bind(v),
            };
        }
        query.execute(&mut *tx).await?;
    }

    tx.commit().await
}

fn row_to_record(row: &MySqlRow) -> CompanyRecord {
    let mut record = CompanyRecord::new();

    for (i, column) in row.columns().iter().enumerate() {
        let Some(value) = column_text(row, i) else {
            continue;
        };
        match CompanyField::from_column(column.name()) {
            Some(field) => record.set(field, value),
            None => record.set_extra(column.name(), value),
        }
    }

    record
}

fn column_text(row: &MySqlRow, i: usize) -> Option<String> {
    if let Ok(v) = row.try_get::<Option<String>, _>(i) {
        return v;
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(i) {
        return v.map(|d| d.format("%Y-%m-%d").to_string());
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(i) {
        return v.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(i) {
        return v.map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string());
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(i) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
        return v.map(|n| n.to_string());
    }

    log::debug!("Skipping column {} with an undecodable type", i);
    None
}

#[async_trait]
impl CompanyStore for MySqlStore {
    fn kind(&self) -> StorageMode {
        StorageMode::Mysql
    }

    async fn save(
        &self,
        records: &[CompanyRecord],
        _task_type: TaskType,
        _target: Option<&Path>,
        _append: bool,
    ) -> StorageOutcome {
        let mut records = records.to_vec();
        records.iter_mut().for_each(CompanyRecord::fill_unknown);

        match self.save_records(&records).await {
            true => StorageOutcome::Committed,
            false => StorageOutcome::Failed,
        }
    }

    async fn update_financial(
        &self,
        updates: &FinancialUpdates,
        _target: Option<&Path>,
    ) -> StorageOutcome {
        let mut matched = Vec::with_capacity(updates.len());
        for (company_name, revenue) in updates {
            matched.push(self.update_company_revenue(company_name, revenue).await);
        }

        update_batch_outcome(&matched)
    }

    async fn load_all(&self, _source: Option<&Path>) -> Result<Vec<CompanyRecord>, StoreError> {
        Ok(self.get_all_companies().await)
    }
}

// A company with no matching row fails the batch, but only after every
// other company has been attempted.
pub(crate) fn update_batch_outcome(matched: &[bool]) -> StorageOutcome {
    match matched.iter().all(|m| *m) {
        true => StorageOutcome::Committed,
        false => {
            let missed = matched.iter().filter(|m| !**m).count();
            log::warn!("{} of {} financial updates matched no row", missed, matched.len());
            StorageOutcome::Failed
        }
    }
}
