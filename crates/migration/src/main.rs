//! Schema maintenance for a TrackTally database.
//!
//! `migration [up|down [STEPS]|fresh|refresh|status]`, the database is taken
//! from `DATABASE_URL` (default `./tracktally.db`).

use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DATABASE_URL: &str = "sqlite:./tracktally.db?mode=rwc";
const USAGE: &str = "usage: migration [up|down [STEPS]|fresh|refresh|status]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("up");
    let steps = match args.get(1) {
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| USAGE)?),
        None => None,
    };

    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db = Database::connect(&url).await?;

    match command {
        "up" => migration::Migrator::up(&db, steps).await?,
        // One step unless a count is given.
        "down" => migration::Migrator::down(&db, Some(steps.unwrap_or(1))).await?,
        "fresh" => migration::Migrator::fresh(&db).await?,
        "refresh" => migration::Migrator::refresh(&db).await?,
        "status" => migration::Migrator::status(&db).await?,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}
