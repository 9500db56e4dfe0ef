// Runtime configuration. Everything comes from the environment (with an
// optional `.env` file loaded by `main`), falling back to the defaults the
// chat server ships with.

use anyhow::{bail, Context, Result};
use std::time::Duration;

/// Default base URL of the chat API.
pub const DEFAULT_API_URL: &str = "http://server:3000";

/// Default bound for every HTTP request and for the real-time handshake.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const API_URL_VAR: &str = "CHAT_API_URL";
const TIMEOUT_VAR: &str = "CHAT_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl Config {
    /// Build a config for `api_url`, using `timeout` for both HTTP calls and
    /// the real-time handshake.
    pub fn new(api_url: &str, timeout: Duration) -> Self {
        Config {
            api_url: api_url.trim_end_matches('/').to_string(),
            request_timeout: timeout,
            connect_timeout: timeout,
        }
    }

    /// Read `CHAT_API_URL` and `CHAT_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_API_URL.into());
        let timeout = match std::env::var(TIMEOUT_VAR) {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        Ok(Self::new(&api_url, timeout))
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{TIMEOUT_VAR} must be a whole number of seconds, got {raw:?}"))?;
    if secs == 0 {
        bail!("{TIMEOUT_VAR} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
