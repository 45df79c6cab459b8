use std::{sync::Arc, time::Duration};

use clap::Parser;
use engine::{Ledger, MemoryStore, RowStore, SqliteStore};
use migration::{Migrator, MigratorTrait};
use settings::{Settings, Store};
use sheets::SheetsStore;
use telegram_bot::HttpRecognizer;

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(version, about = "Ledger bot for manual entries and receipt photos")]
struct Cli {
    /// Settings file name, extension optional.
    #[arg(long, env = "DOMPET_SETTINGS", default_value = "settings")]
    settings: String,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let settings = Settings::new(&cli.settings)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "dompet={level},telegram_bot={level},engine={level},sheets={level}",
            level = settings.app.level
        ))
        .init();

    let timezone = settings.app.timezone()?;
    let store = build_store(&settings.store).await?;

    let ledger = Ledger::builder(store)
        .source(settings.ledger.balance_source)
        .cache_ttl(Duration::from_secs(settings.ledger.cache_ttl_secs))
        .log_range(&settings.ledger.log_range)
        .balance_cell(&settings.ledger.balance_cell)
        .investment_cell(&settings.ledger.investment_cell)
        .timezone(timezone)
        .build()?;

    let recognizer = HttpRecognizer::new(&settings.ocr.url, settings.ocr.api_key.as_deref())?;

    let bot = telegram_bot::Bot::builder()
        .token(&settings.telegram.token)
        .allowed_users(settings.telegram.allowed_users.clone())
        .ledger(Arc::new(ledger))
        .recognizer(Arc::new(recognizer))
        .cooldown(Duration::from_secs(settings.telegram.cooldown_secs))
        .languages(&settings.ocr.languages)
        .build()?;

    bot.run().await;
    tracing::info!("telegram bot stopped");
    Ok(())
}

async fn build_store(config: &Store) -> Result<Arc<dyn RowStore>, BoxError> {
    let store: Arc<dyn RowStore> = match config {
        Store::Memory => {
            tracing::warn!("using the in-memory store, entries are lost on exit");
            Arc::new(MemoryStore::new())
        }
        Store::Sqlite { path } => {
            tracing::info!(path, "using the sqlite store");
            Arc::new(SqliteStore::new(parse_database(path).await?))
        }
        Store::Sheets {
            spreadsheet_id,
            access_token,
            base_url,
        } => {
            tracing::info!(spreadsheet_id, "using the google sheets store");
            Arc::new(SheetsStore::new(
                spreadsheet_id,
                access_token,
                base_url.as_deref(),
            )?)
        }
    };
    Ok(store)
}

async fn parse_database(path: &str) -> Result<sea_orm::DatabaseConnection, BoxError> {
    let database = sea_orm::Database::connect(format!("sqlite:{path}?mode=rwc")).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
