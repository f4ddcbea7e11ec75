use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use thiserror::Error;

use crate::model::summary::DateWindow;
use crate::util::time::parse_instant;

const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// On-disk configuration, as written by the user.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub cred_filename: Option<String>,
    pub domain: Option<String>,
    pub api_version: Option<String>,
    pub workspace_slug: Option<String>,
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "date_setting")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "date_setting")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub task_status: Vec<String>,
    #[serde(default)]
    pub outputs: OutputsConfig,
}

/// Accepts a quoted string or a bare TOML date/datetime.
fn date_setting<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<toml::Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(toml::Value::String(s)) => Ok(Some(s)),
        Some(toml::Value::Datetime(dt)) => Ok(Some(dt.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a date string, found {}",
            other.type_str()
        ))),
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct OutputsConfig {
    pub text_file: Option<PathBuf>,
    pub csv_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{0}' is missing in config")]
    MissingKey(&'static str),
    #[error("credential file not found or empty: {0}")]
    MissingCredential(String),
    #[error("invalid {field} '{value}'")]
    InvalidDate { field: &'static str, value: String },
}

/// API key read from the credential file. Never printed.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    #[cfg(test)]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let missing = || ConfigError::MissingCredential(path.display().to_string());
        let key = std::fs::read_to_string(path).map_err(|_| missing())?;
        let key = key.trim();
        if key.is_empty() {
            return Err(missing());
        }
        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Fully resolved, immutable run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub workspace: String,
    pub project_id: Option<String>,
    pub window: DateWindow,
    pub allowed_statuses: Vec<String>,
    pub text_file: PathBuf,
    pub csv_file: PathBuf,
    pub credential: Credential,
}

impl Settings {
    pub fn resolve(file: FileConfig, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let cred_path = non_blank(file.cred_filename.clone()).ok_or(ConfigError::MissingKey("cred_filename"))?;
        let credential = Credential::load(Path::new(&cred_path))?;
        Self::resolve_with_credential(file, credential, now)
    }

    /// Resolution without touching the filesystem; the credential is supplied.
    pub fn resolve_with_credential(
        file: FileConfig,
        credential: Credential,
        now: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        let domain = non_blank(file.domain).ok_or(ConfigError::MissingKey("domain"))?;
        let workspace = non_blank(file.workspace_slug).ok_or(ConfigError::MissingKey("workspace_slug"))?;
        let api_version = non_blank(file.api_version).unwrap_or_else(|| "v1".to_string());

        let window = resolve_window(file.start_date.as_deref(), file.end_date.as_deref(), now)?;
        if window.is_inverted() {
            tracing::warn!(start = %window.start, end = %window.end, "end_date is before start_date; no completed work will match");
        }

        let allowed_statuses = file
            .task_status
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            base_url: format!("{}/api/{}", domain.trim_end_matches('/'), api_version.trim_matches('/')),
            workspace,
            project_id: non_blank(file.project_id),
            window,
            allowed_statuses,
            text_file: file.outputs.text_file.unwrap_or_else(|| PathBuf::from("report.txt")),
            csv_file: file.outputs.csv_file.unwrap_or_else(|| PathBuf::from("report.csv")),
            credential,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn resolve_window(start: Option<&str>, end: Option<&str>, now: DateTime<Utc>) -> Result<DateWindow, ConfigError> {
    let start = match start.map(str::trim).filter(|s| !s.is_empty()) {
        None => now - Duration::days(DEFAULT_LOOKBACK_DAYS),
        Some(raw) => parse_instant(raw).ok_or_else(|| ConfigError::InvalidDate {
            field: "start_date",
            value: raw.to_string(),
        })?,
    };
    let end = match end.map(str::trim).filter(|s| !s.is_empty()) {
        None => now,
        Some(raw) if raw.eq_ignore_ascii_case("now") => now,
        Some(raw) => parse_instant(raw).ok_or_else(|| ConfigError::InvalidDate {
            field: "end_date",
            value: raw.to_string(),
        })?,
    };
    Ok(DateWindow::new(start, end))
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".plane-report")
        .join("config.toml")
}

pub fn load_config(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Config file '{}' not found or unreadable", path.display()))?;
    let config: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}
