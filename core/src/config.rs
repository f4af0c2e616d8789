//! Client-side tuning knobs.

use std::time::Duration;

use crate::token::DEFAULT_REFRESH_THRESHOLD;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings applied to every request a `Client` makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Upper bound for a whole request, connect through body read.
    pub timeout: Duration,
    /// Applied to every token obtained from login or refresh.
    pub refresh_threshold: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
        }
    }
}
