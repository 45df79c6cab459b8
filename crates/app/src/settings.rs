//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and overridden by `DOMPET__SECTION__KEY`
//! environment variables.

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use engine::{
    BalanceSource,
    ledger::{DEFAULT_BALANCE_CELL, DEFAULT_CACHE_TTL, DEFAULT_INVESTMENT_CELL, DEFAULT_LOG_RANGE},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    pub timezone: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: "Asia/Jakarta".to_string(),
        }
    }
}

impl App {
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse()
            .map_err(|err| ConfigError::Message(format!("invalid timezone {}: {err}", self.timezone)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ledger {
    pub balance_source: BalanceSource,
    pub cache_ttl_secs: u64,
    pub log_range: String,
    pub balance_cell: String,
    pub investment_cell: String,
}

impl Default for Ledger {
    fn default() -> Self {
        Self {
            balance_source: BalanceSource::default(),
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            log_range: DEFAULT_LOG_RANGE.to_string(),
            balance_cell: DEFAULT_BALANCE_CELL.to_string(),
            investment_cell: DEFAULT_INVESTMENT_CELL.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Store {
    #[default]
    Memory,
    Sqlite {
        path: String,
    },
    Sheets {
        spreadsheet_id: String,
        access_token: String,
        base_url: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
    #[serde(default)]
    pub allowed_users: Vec<u64>,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Ocr {
    pub url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_languages")]
    pub languages: String,
}

fn default_cooldown_secs() -> u64 {
    telegram_bot::DEFAULT_COOLDOWN.as_secs()
}

fn default_languages() -> String {
    telegram_bot::DEFAULT_LANGUAGES.to_string()
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub ledger: Ledger,
    #[serde(default)]
    pub store: Store,
    pub telegram: Telegram,
    pub ocr: Ocr,
}

impl Settings {
    /// Loads `name` (any extension `config` understands, may be missing) and
    /// the environment on top of it.
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        Self::from_builder(Config::builder().add_source(File::with_name(name).required(false)))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix("DOMPET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("telegram.allowed_users"),
            )
            .build()?
            .try_deserialize()
    }
}
