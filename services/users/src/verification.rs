//! Verification codes written to `verifyCode` / `verifyCodeExpiry`

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::models::User;

/// A freshly issued six digit code and the instant it stops being accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn issue(now: DateTime<Utc>, ttl: Duration) -> Self {
        let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        Self {
            code: code.to_string(),
            expires_at: now + ttl,
        }
    }
}

/// Result of checking a submitted code against a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Verified,
    InvalidCode,
    Expired,
}

/// Compare `submitted` with the user's stored code at `now`.
///
/// A code is accepted strictly before its expiry instant.
pub fn check(user: &User, submitted: &str, now: DateTime<Utc>) -> VerifyOutcome {
    if user.verify_code != submitted.trim() {
        VerifyOutcome::InvalidCode
    } else if now >= user.verify_code_expiry {
        VerifyOutcome::Expired
    } else {
        VerifyOutcome::Verified
    }
}
