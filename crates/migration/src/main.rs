//! Applies the row store schema to a SQLite database.

use clap::{Parser, ValueEnum};
use sea_orm::Database;
use sea_orm_migration::prelude::*;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum Action {
    #[default]
    Up,
    Down,
    Fresh,
    Status,
}

#[derive(Debug, Parser)]
#[command(about = "Manage the dompet SQLite schema")]
struct Args {
    #[arg(value_enum, default_value_t = Action::Up)]
    action: Action,

    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./dompet.db?mode=rwc"
    )]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let db = Database::connect(&args.database_url).await?;

    match args.action {
        Action::Up => migration::Migrator::up(&db, None).await?,
        Action::Down => migration::Migrator::down(&db, None).await?,
        Action::Fresh => migration::Migrator::fresh(&db).await?,
        Action::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
