use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use server::{ServerState, mail::Mailer, otp::OtpStore};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tracktally={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::info!("No server settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found server settings...");
    let db = parse_database(&server.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;

    let mail = settings.mail;
    let mailer = match mail.relay_url {
        Some(relay_url) => {
            tracing::info!("Mail relay configured at {relay_url}");
            Mailer::http(relay_url, mail.from)
        }
        None => {
            tracing::warn!("No mail relay configured, verification codes are only logged");
            Mailer::log(mail.from)
        }
    };
    let otp = OtpStore::new(Duration::from_secs(mail.otp_ttl_secs));
    let state = ServerState::new(engine, otp, mailer).expose_otp(mail.expose_otp);

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|err| {
        tracing::error!("failed to bind server listener on {addr}: {err}");
        err
    })?;

    if let Err(err) = server::run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
        return Err(err.into());
    }

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("Database ready, migrations applied");
    Ok(database)
}
