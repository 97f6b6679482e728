//! One-time codes for email verification and password resets.
//!
//! Codes live in memory only: a restart drops every pending code.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use rand::Rng;

/// Default lifetime of a code.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Wrong guesses allowed before a code is thrown away.
pub const MAX_ATTEMPTS: u32 = 5;

/// What a code unlocks. A code issued for one purpose never satisfies the
/// other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OtpPurpose {
    EmailVerification,
    PasswordReset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OtpOutcome {
    /// Code matched and was consumed.
    Verified,
    NotFound,
    /// Code expired; the entry was removed.
    Expired,
    /// Wrong code; the entry stays valid until it expires or runs out of
    /// attempts.
    Mismatch,
    /// Wrong code and no attempts left; the entry was removed.
    TooManyAttempts,
}

impl OtpOutcome {
    pub fn message(self) -> &'static str {
        match self {
            OtpOutcome::Verified => "OTP verified successfully",
            OtpOutcome::NotFound => "OTP not found or expired",
            OtpOutcome::Expired => "OTP has expired",
            OtpOutcome::Mismatch => "Invalid OTP",
            OtpOutcome::TooManyAttempts => "Too many attempts. Please request a new OTP.",
        }
    }
}

#[derive(Debug)]
struct PendingCode {
    code: String,
    expires_at: Instant,
    failed: u32,
}

type Key = (OtpPurpose, String);

/// Pending codes keyed by purpose and normalized email. At most one code per
/// address and purpose.
#[derive(Debug)]
pub struct OtpStore {
    ttl: Duration,
    pending: Mutex<HashMap<Key, PendingCode>>,
}

impl Default for OtpStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl OtpStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generates a fresh 6-digit code for `email`, replacing any previous one
    /// with the same purpose.
    pub fn issue(&self, purpose: OtpPurpose, email: &str) -> String {
        let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
        self.insert_at(purpose, email, code.clone(), Instant::now());
        code
    }

    pub fn verify(&self, purpose: OtpPurpose, email: &str, code: &str) -> OtpOutcome {
        self.verify_at(purpose, email, code, Instant::now())
    }

    /// Number of codes currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_at(&self, purpose: OtpPurpose, email: &str, code: String, now: Instant) {
        let mut pending = self.lock();
        pending.retain(|_, entry| entry.expires_at > now);
        pending.insert(
            (purpose, email_key(email)),
            PendingCode {
                code,
                expires_at: now + self.ttl,
                failed: 0,
            },
        );
    }

    fn verify_at(&self, purpose: OtpPurpose, email: &str, code: &str, now: Instant) -> OtpOutcome {
        let key = (purpose, email_key(email));
        let mut pending = self.lock();
        let Some(entry) = pending.get_mut(&key) else {
            return OtpOutcome::NotFound;
        };
        if now > entry.expires_at {
            pending.remove(&key);
            return OtpOutcome::Expired;
        }
        if entry.code == code.trim() {
            pending.remove(&key);
            return OtpOutcome::Verified;
        }

        entry.failed += 1;
        if entry.failed >= MAX_ATTEMPTS {
            pending.remove(&key);
            return OtpOutcome::TooManyAttempts;
        }
        OtpOutcome::Mismatch
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Key, PendingCode>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}
