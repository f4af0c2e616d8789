//! Access/refresh credential pair returned by the Sensu auth endpoints.
//!
//! # Design
//! `Token` is immutable once built. A refresh produces a new `Token` that
//! replaces the old one on the client; nothing mutates a token in place.
//! Expiry checks come in two forms: `*_at(now)` variants that take an explicit
//! epoch-seconds instant, and wall-clock variants that delegate to them.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Seconds before expiry at which a token is considered due for refresh.
pub const DEFAULT_REFRESH_THRESHOLD: u64 = 60;

/// Credentials issued by `GET /auth` and `POST /auth/token`.
///
/// The wire shape is `{access_token, refresh_token, expires_at}`. The refresh
/// threshold is a client-side setting and is never (de)serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    access_token: String,
    refresh_token: String,
    expires_at: i64,
    #[serde(skip, default = "default_refresh_threshold")]
    refresh_threshold: u64,
}

fn default_refresh_threshold() -> u64 {
    DEFAULT_REFRESH_THRESHOLD
}

/// Current wall-clock time in epoch seconds.
pub fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl Token {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
        }
    }

    /// Returns a copy of this token with a different refresh threshold.
    pub fn with_refresh_threshold(self, refresh_threshold: u64) -> Self {
        Self {
            refresh_threshold,
            ..self
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    pub fn refresh_threshold(&self) -> u64 {
        self.refresh_threshold
    }

    /// Value for the `Authorization` header.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_epoch_secs())
    }

    /// True once `now` is strictly past `expires_at`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// True when the remaining lifetime is under the refresh threshold.
    /// An expired token also needs a refresh; check `is_expired` first to
    /// tell the two apart.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(now_epoch_secs())
    }

    pub fn needs_refresh_at(&self, now: i64) -> bool {
        let threshold = i64::try_from(self.refresh_threshold).unwrap_or(i64::MAX);
        self.expires_at.saturating_sub(now) < threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_in_the_past_is_expired() {
        let token = Token::new("a", "r", now_epoch_secs() - 10);
        assert!(token.is_expired());
        assert!(token.needs_refresh());
    }

    #[test]
    fn token_inside_threshold_needs_refresh_but_is_not_expired() {
        let token = Token::new("a", "r", now_epoch_secs() + 30).with_refresh_threshold(60);
        assert!(!token.is_expired());
        assert!(token.needs_refresh());
    }

    #[test]
    fn fresh_token_is_valid() {
        let token = Token::new("a", "r", now_epoch_secs() + 3600);
        assert!(!token.is_expired());
        assert!(!token.needs_refresh());
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let token = Token::new("a", "r", 1_000);
        assert!(!token.is_expired_at(1_000));
        assert!(token.is_expired_at(1_001));
    }

    #[test]
    fn refresh_boundary_is_exclusive() {
        let token = Token::new("a", "r", 1_000).with_refresh_threshold(60);
        // exactly 60s left: not yet due
        assert!(!token.needs_refresh_at(940));
        assert!(token.needs_refresh_at(941));
    }

    #[test]
    fn zero_threshold_only_refreshes_when_expired() {
        let token = Token::new("a", "r", 1_000).with_refresh_threshold(0);
        assert!(!token.needs_refresh_at(1_000));
        assert!(token.needs_refresh_at(1_001));
    }

    #[test]
    fn extreme_expiry_does_not_overflow() {
        let token: Token = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_at":-9223372036854775808}"#,
        )
        .unwrap();
        assert!(token.is_expired());
        assert!(token.needs_refresh());
        assert!(token.needs_refresh_at(i64::MAX));

        let token = Token::new("a", "r", i64::MAX);
        assert!(!token.needs_refresh_at(i64::MIN));
    }

    #[test]
    fn huge_threshold_saturates() {
        let token = Token::new("a", "r", 1_000).with_refresh_threshold(u64::MAX);
        assert!(token.needs_refresh_at(999));
        assert!(token.needs_refresh_at(0));
    }

    #[test]
    fn deserializes_wire_shape_with_default_threshold() {
        let token: Token = serde_json::from_str(
            r#"{"access_token":"abc","refresh_token":"def","expires_at":1700000000}"#,
        )
        .unwrap();
        assert_eq!(token.access_token(), "abc");
        assert_eq!(token.refresh_token(), "def");
        assert_eq!(token.expires_at(), 1_700_000_000);
        assert_eq!(token.refresh_threshold(), DEFAULT_REFRESH_THRESHOLD);
    }

    #[test]
    fn serialized_form_omits_threshold() {
        let token = Token::new("abc", "def", 42).with_refresh_threshold(5);
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["access_token"], "abc");
        assert_eq!(json["expires_at"], 42);
        assert!(json.get("refresh_threshold").is_none());
    }

    #[test]
    fn bearer_header_uses_access_token() {
        assert_eq!(Token::new("abc", "def", 0).bearer_header(), "Bearer abc");
    }
}
