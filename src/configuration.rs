use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::mysql::MySqlConnectOptions;
use thiserror::Error;

const CONFIG_FILE: &str = "configuration";

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("invalid storage mode: {0} (expected `excel` or `mysql`)")]
    InvalidMode(String),
    #[error("invalid table name: {0}")]
    InvalidTableName(String),
    #[error(transparent)]
    Build(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Excel,
    Mysql,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Excel => "excel",
            StorageMode::Mysql => "mysql",
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "excel" => Ok(StorageMode::Excel),
            "mysql" => Ok(StorageMode::Mysql),
            other => Err(ConfigurationError::InvalidMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub storage_mode: StorageMode,
    pub llm: LlmSettings,
    pub database: DatabaseSettings,
    pub search: SearchSettings,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub request_timeout: Duration,
    pub reference_year: i32,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub database_name: String,
    pub table: String,
    pub charset: String,
}

impl DatabaseSettings {
    pub fn with_db(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .database(&self.database_name)
            .charset(&self.charset)
    }
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub base_url: String,
    pub pause: Duration,
    pub results_per_page: usize,
    pub financial_results: usize,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    storage_mode: String,
    openai_api_base: String,
    api_key: SecretString,
    llm_model: String,
    llm_temperature: f32,
    llm_max_tokens: u32,
    llm_top_p: f32,
    llm_request_timeout: u64,
    financial_reference_year: i32,
    reporting_currency: String,
    mysql_host: String,
    mysql_port: u16,
    mysql_user: String,
    mysql_password: SecretString,
    mysql_database: String,
    mysql_table: String,
    mysql_charset: String,
    search_base_url: String,
    search_pause_ms: u64,
    search_results_per_page: usize,
    financial_search_results: usize,
    output_dir: PathBuf,
    log_dir: PathBuf,
}

impl TryFrom<RawSettings> for Settings {
    type Error = ConfigurationError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let storage_mode = raw.storage_mode.parse()?;

        let table = raw.mysql_table.trim().to_string();
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigurationError::InvalidTableName(table));
        }

        Ok(Settings {
            storage_mode,
            llm: LlmSettings {
                base_url: raw.openai_api_base,
                api_key: raw.api_key,
                model: raw.llm_model,
                temperature: raw.llm_temperature,
                max_tokens: raw.llm_max_tokens,
                top_p: raw.llm_top_p,
                request_timeout: Duration::from_secs(raw.llm_request_timeout),
                reference_year: raw.financial_reference_year,
                currency: raw.reporting_currency,
            },
            database: DatabaseSettings {
                host: raw.mysql_host,
                port: raw.mysql_port,
                username: raw.mysql_user,
                password: raw.mysql_password,
                database_name: raw.mysql_database,
                table,
                charset: raw.mysql_charset,
            },
            search: SearchSettings {
                base_url: raw.search_base_url,
                pause: Duration::from_millis(raw.search_pause_ms),
                results_per_page: raw.search_results_per_page.max(1),
                financial_results: raw.financial_search_results.max(1),
            },
            output_dir: raw.output_dir,
            log_dir: raw.log_dir,
        })
    }
}

pub fn get_configuration() -> Result<Settings, ConfigurationError> {
    // A missing .env is fine, the real environment still applies.
    _ = dotenvy::dotenv();
    configuration_from(Environment::default())
}

pub fn configuration_from(environment: Environment) -> Result<Settings, ConfigurationError> {
    let builder = Config::builder()
        .set_default("storage_mode", "excel")?
        .set_default("openai_api_base", "http://localhost:1234/v1")?
        .set_default("api_key", "not-needed")?
        .set_default("llm_model", "openai/gpt-4o-mini")?
        .set_default("llm_temperature", 0.7)?
        .set_default("llm_max_tokens", 2000)?
        .set_default("llm_top_p", 0.9)?
        .set_default("llm_request_timeout", 300)?
        .set_default("financial_reference_year", 2025)?
        .set_default("reporting_currency", "RMB (yuan)")?
        .set_default("mysql_host", "localhost")?
        .set_default("mysql_port", 3306)?
        .set_default("mysql_user", "root")?
        .set_default("mysql_password", "root")?
        .set_default("mysql_database", "web-deepseekai")?
        .set_default("mysql_table", "company_info")?
        .set_default("mysql_charset", "utf8mb4")?
        .set_default("search_base_url", "https://www.google.com/search")?
        .set_default("search_pause_ms", 2000)?
        .set_default("search_results_per_page", 100)?
        .set_default("financial_search_results", 3)?
        .set_default("output_dir", "data/output")?
        .set_default("log_dir", "data/logs")?
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(environment);

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::try_from(raw)
}
