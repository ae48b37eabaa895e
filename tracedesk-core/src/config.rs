use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Server used when `TRACEDESK_SERVER_URL` is not set
pub const DEFAULT_SERVER_URL: &str = "http://localhost:20259/api/v1.0";

/// Request timeout used when `TRACEDESK_TIMEOUT_SECS` is not set
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the requirements API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to (no trailing slash)
    pub server_url: String,
    /// Explicit critique webhook URL; `None` means `{server_url}/call-webhook`
    pub critique_url: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Location of the persisted session/theme file
    pub state_path: PathBuf,
}

impl ClientConfig {
    /// Create a config for a server with default timeout and webhook
    pub fn new(server_url: &str, state_path: PathBuf) -> Self {
        Self {
            server_url: normalize_base_url(server_url),
            critique_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            state_path,
        }
    }

    /// Build the config from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let server_url = std::env::var("TRACEDESK_SERVER_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let critique_url = std::env::var("TRACEDESK_CRITIQUE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        let timeout = parse_timeout(std::env::var("TRACEDESK_TIMEOUT_SECS").ok().as_deref());

        Ok(Self {
            server_url: normalize_base_url(&server_url),
            critique_url,
            timeout,
            state_path: get_state_path()?,
        })
    }

    /// Override the server URL (e.g. from a command-line flag)
    pub fn with_server_url(mut self, server_url: &str) -> Self {
        self.server_url = normalize_base_url(server_url);
        self
    }

    /// The URL the critique action posts to
    pub fn critique_url(&self) -> String {
        match &self.critique_url {
            Some(url) => url.clone(),
            None => format!("{}/call-webhook", self.server_url),
        }
    }
}

/// Gets the path to the local state file
pub fn get_state_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("TRACEDESK_STATE_PATH") {
        return Ok(PathBuf::from(path));
    }

    // Default to ~/.tracedesk/state.yaml
    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

    Ok(home_dir.join(".tracedesk").join("state.yaml"))
}

/// Request timeout from a seconds value. Anything but a positive number of
/// seconds falls back to the default.
fn parse_timeout(secs: Option<&str>) -> Duration {
    let secs = secs
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("http://example.test/api/", PathBuf::from("state.yaml"));
        assert_eq!(config.server_url, "http://example.test/api");
    }

    #[test]
    fn test_default_critique_url_follows_server() {
        let config = ClientConfig::new(DEFAULT_SERVER_URL, PathBuf::from("state.yaml"))
            .with_server_url("http://other.test/v1");
        assert_eq!(config.critique_url(), "http://other.test/v1/call-webhook");
    }

    #[test]
    fn test_explicit_critique_url() {
        let mut config = ClientConfig::new(DEFAULT_SERVER_URL, PathBuf::from("state.yaml"));
        config.critique_url = Some("http://hooks.test/critique".into());
        assert_eq!(config.critique_url(), "http://hooks.test/critique");
    }

    #[test]
    fn test_timeout_ignores_zero_and_garbage() {
        let default = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        assert_eq!(parse_timeout(None), default);
        assert_eq!(parse_timeout(Some("0")), default);
        assert_eq!(parse_timeout(Some("soon")), default);
        assert_eq!(parse_timeout(Some("-5")), default);
        assert_eq!(parse_timeout(Some(" 12 ")), Duration::from_secs(12));
    }
}
