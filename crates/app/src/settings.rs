//! Handles settings for the application. Configuration is read from
//! `settings.toml` and from `TRACKTALLY__*` environment variables, the latter
//! taking precedence (e.g. `TRACKTALLY__SERVER__PORT=8080`).
//!
//! See `settings.toml` for the configuration.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Mail {
    /// Without a relay, mails are only logged.
    pub relay_url: Option<String>,
    pub from: String,
    pub otp_ttl_secs: u64,
    /// Return verification codes in the API response. Development only.
    pub expose_otp: bool,
}

impl Default for Mail {
    fn default() -> Self {
        Self {
            relay_url: None,
            from: "noreply@tracktally.app".to_string(),
            otp_ttl_secs: 600,
            expose_otp: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub mail: Mail,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("TRACKTALLY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn full_settings() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 3000
            database = { sqlite = "tracktally.db" }

            [mail]
            relay_url = "http://localhost:8025/send"
            otp_ttl_secs = 300
            "#,
        );

        let server = settings.server.unwrap();
        assert_eq!(server.database, Database::Sqlite("tracktally.db".to_string()));
        assert!(server.bind.is_none());
        assert_eq!(settings.mail.otp_ttl_secs, 300);
        assert_eq!(settings.mail.from, "noreply@tracktally.app");
        assert!(!settings.mail.expose_otp);
    }

    #[test]
    fn server_and_mail_are_optional() {
        let settings = parse(
            r#"
            [app]
            level = "info"
            "#,
        );
        assert!(settings.server.is_none());
        assert!(settings.mail.relay_url.is_none());
        assert_eq!(settings.mail.otp_ttl_secs, 600);
    }

    #[test]
    fn memory_database() {
        let settings = parse(
            r#"
            [app]
            level = "info"
            [server]
            port = 3000
            database = "memory"
            "#,
        );
        assert_eq!(settings.server.unwrap().database, Database::Memory);
    }
}
