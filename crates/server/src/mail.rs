//! Outgoing mail.
//!
//! Without a relay the message is only written to the log, which is enough for
//! local development.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub const VERIFICATION_SUBJECT: &str = "Verify Your Email - TrackTally";
pub const PASSWORD_RESET_SUBJECT: &str = "Reset Your Password - TrackTally";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail relay request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mail relay answered with status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Clone, Debug)]
pub enum Mailer {
    Log {
        from: String,
    },
    /// POSTs every message as JSON to `relay_url`.
    Http {
        client: reqwest::Client,
        relay_url: String,
        from: String,
    },
}

impl Mailer {
    pub fn log(from: impl Into<String>) -> Self {
        Self::Log { from: from.into() }
    }

    pub fn http(relay_url: impl Into<String>, from: impl Into<String>) -> Self {
        Self::Http {
            client: reqwest::Client::new(),
            relay_url: relay_url.into(),
            from: from.into(),
        }
    }

    /// `true` when mail actually leaves the process.
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    fn from_address(&self) -> &str {
        match self {
            Self::Log { from } | Self::Http { from, .. } => from,
        }
    }

    /// Builds the verification message carrying `code`.
    pub fn verification_mail(
        &self,
        to: &str,
        full_name: &str,
        code: &str,
        ttl: Duration,
    ) -> OutgoingMail {
        let minutes = ttl.as_secs().div_ceil(60);
        OutgoingMail {
            from: self.from_address().to_string(),
            to: to.trim().to_string(),
            subject: VERIFICATION_SUBJECT.to_string(),
            text: format!(
                "Hello {full_name},\n\n\
                 Your TrackTally verification code is {code}.\n\
                 It expires in {minutes} minutes.\n\n\
                 If you did not request this code, ignore this email."
            ),
        }
    }

    /// Builds the password reset message carrying `code`.
    pub fn password_reset_mail(&self, to: &str, code: &str, ttl: Duration) -> OutgoingMail {
        let minutes = ttl.as_secs().div_ceil(60);
        OutgoingMail {
            from: self.from_address().to_string(),
            to: to.trim().to_string(),
            subject: PASSWORD_RESET_SUBJECT.to_string(),
            text: format!(
                "Hello,\n\n\
                 Use the code {code} to choose a new TrackTally password.\n\
                 It expires in {minutes} minutes.\n\n\
                 If you did not ask for a reset, ignore this email: your password stays unchanged."
            ),
        }
    }

    pub async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        match self {
            Self::Log { .. } => {
                tracing::info!(to = %mail.to, subject = %mail.subject, "mail not sent, no relay configured");
                tracing::debug!(body = %mail.text);
                Ok(())
            }
            Self::Http {
                client, relay_url, ..
            } => {
                let response = client.post(relay_url).json(mail).send().await?;
                if !response.status().is_success() {
                    return Err(MailError::Status(response.status()));
                }
                tracing::info!(to = %mail.to, "mail sent");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_mail_mentions_code_and_expiry() {
        let mailer = Mailer::log("noreply@tracktally.app");
        let mail = mailer.verification_mail(
            " ann@example.com ",
            "Ann",
            "123456",
            Duration::from_secs(600),
        );

        assert_eq!(mail.to, "ann@example.com");
        assert_eq!(mail.subject, VERIFICATION_SUBJECT);
        assert!(mail.text.contains("Hello Ann"));
        assert!(mail.text.contains("123456"));
        assert!(mail.text.contains("10 minutes"));
    }

    #[test]
    fn reset_mail_has_its_own_subject() {
        let mailer = Mailer::log("noreply@tracktally.app");
        let mail = mailer.password_reset_mail("ann@example.com", "987654", Duration::from_secs(90));

        assert_eq!(mail.from, "noreply@tracktally.app");
        assert_eq!(mail.subject, PASSWORD_RESET_SUBJECT);
        assert!(mail.text.contains("987654"));
        assert!(mail.text.contains("2 minutes"));
    }

    #[test]
    fn only_relay_counts_as_configured() {
        assert!(!Mailer::log("a@b.c").is_configured());
        assert!(Mailer::http("http://localhost:9/send", "a@b.c").is_configured());
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = Mailer::log("noreply@tracktally.app");
        let mail = mailer.verification_mail("ann@example.com", "Ann", "1", DEFAULT_TTL);
        assert!(mailer.send(&mail).await.is_ok());
    }

    const DEFAULT_TTL: Duration = Duration::from_secs(60);
}
