use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::AnalyzerSettings;
use crate::llm_client::GeminiConfig;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub gemini_timeout_secs: u64,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub enforce_score_range: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_api_base: optional_env("GEMINI_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            gemini_timeout_secs: parse_env("GEMINI_TIMEOUT_SECS", 120)?,
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            enforce_score_range: parse_env("ENFORCE_SCORE_RANGE", true)?,
            port: parse_env("PORT", 5000)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            api_base: self.gemini_api_base.clone(),
            timeout: Duration::from_secs(self.gemini_timeout_secs),
        }
    }

    pub fn analyzer(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            enforce_score_range: self.enforce_score_range,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
