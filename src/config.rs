//! Runtime configuration
//!
//! Read once from the environment (after `.env` is loaded by the binaries).

use crate::error::SageError;
use crate::Result;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_MODEL: &str = "sonar-pro";

#[derive(Debug, Clone)]
pub struct Config {
    /// Session credential from the environment; wins over the stored one
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub credential_file: PathBuf,
    /// Time for the synthetic progress indicator to reach 100%
    pub progress_duration: Duration,
    pub request_timeout: Duration,
    /// Use the canned offline provider instead of the real service
    pub offline: bool,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            credential_file: default_credential_file(),
            progress_duration: Duration::from_secs(20),
            request_timeout: Duration::from_secs(60),
            offline: false,
            port: 8080,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let progress_secs = parse_number(&get, "SAGE_PROGRESS_SECS")?;
        let timeout_secs = parse_number(&get, "SAGE_REQUEST_TIMEOUT_SECS")?;

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| SageError::Config(format!("PORT={}: {}", raw, e)))?,
            None => defaults.port,
        };

        let offline = get("SAGE_OFFLINE")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            api_key: get("PERPLEXITY_API_KEY"),
            api_url: get("SAGE_API_URL").unwrap_or(defaults.api_url),
            model: get("SAGE_MODEL").unwrap_or(defaults.model),
            credential_file: get("SAGE_CREDENTIAL_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.credential_file),
            progress_duration: progress_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.progress_duration),
            request_timeout: timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            offline,
            port,
        })
    }
}

fn parse_number<G>(get: &G, name: &str) -> Result<Option<u64>>
where
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| SageError::Config(format!("{}={}: {}", name, raw, e)))?;
            if secs == 0 {
                return Err(SageError::Config(format!("{} must be greater than zero", name)));
            }
            Ok(Some(secs))
        }
        None => Ok(None),
    }
}

fn default_credential_file() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".stock-sage").join("credentials.json")
}
