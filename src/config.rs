use std::path::PathBuf;
use std::time::Duration;

use crate::sync::Consistency;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    /// Client-side timeout applied to every request.
    pub request_timeout: Duration,
    /// Interval between background collection fetches.
    pub poll_interval: Duration,
    /// Where the signed-in credential is cached between runs.
    /// `None` keeps the session in memory only.
    pub session_file: Option<PathBuf>,
    pub consistency: Consistency,
    /// Set via TASKDESK_LOG_FORMAT=json.
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(30),
            session_file: None,
            consistency: Consistency::LastWriteWins,
            json_logs: false,
        }
    }
}

impl Config {
    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(default))
        };

        let session_file = match lookup("TASKDESK_SESSION_FILE") {
            Some(v) if v.trim().is_empty() || v.trim().eq_ignore_ascii_case("none") => None,
            Some(v) => Some(PathBuf::from(v.trim())),
            None => lookup("HOME").map(|home| PathBuf::from(home).join(".taskdesk").join("session.json")),
        };

        let consistency = lookup("TASKDESK_CONSISTENCY")
            .and_then(|v| v.parse::<Consistency>().ok())
            .unwrap_or_default();

        Self {
            api_url: normalize_base_url(
                &lookup("TASKDESK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            ),
            request_timeout: secs("TASKDESK_TIMEOUT_SECS", 30),
            poll_interval: secs("TASKDESK_POLL_SECS", 30),
            session_file,
            consistency,
            json_logs: lookup("TASKDESK_LOG_FORMAT")
                .map(|v| v.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }

    /// Apply a `--api-url` style override. Call `validate` afterwards.
    pub fn override_api_url(&mut self, url: Option<&str>) {
        if let Some(url) = url {
            self.api_url = normalize_base_url(url);
        }
    }

    /// Reject a base URL that does not parse. Runs after every override is
    /// applied, so a valid flag wins over a bad environment value.
    pub fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.api_url)
            .map_err(|e| anyhow::anyhow!("API URL is not a valid URL ({}): {}", self.api_url, e))?;
        Ok(())
    }
}

/// Strip whitespace and trailing slashes so paths can be appended directly.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Read `.env` and the process environment. The URL is not validated here.
pub fn load() -> Config {
    dotenvy::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}
