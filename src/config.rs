use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SAMPLE_PATH: &str = "data/arima_sample.csv";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const MIN_HTTP_TIMEOUT_SECS: u64 = 5;
const APP_DIR: &str = "arima_terminal";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Presence switches the forecaster to the narrative-backed variant.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub data_url: Option<String>,
    pub sample_path: PathBuf,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            data_url: None,
            sample_path: PathBuf::from(DEFAULT_SAMPLE_PATH),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Read `.env.local` then `.env` (existing variables win), then the process env.
    pub fn load() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();
        Self {
            api_key: get("OPENAI_API_KEY"),
            model: get("OPENAI_MODEL").unwrap_or(defaults.model),
            base_url: get("OPENAI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            data_url: get("ARIMA_DATA_URL"),
            sample_path: get("ARIMA_SAMPLE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sample_path),
            http_timeout_secs: get("ARIMA_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
                .max(MIN_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn narrative_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Per-user cache directory for log files and exports.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}
