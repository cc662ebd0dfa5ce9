use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials::TOKEN_ENV;
use crate::endpoints::DEFAULT_API_URL;
use crate::naming::DEFAULT_SEPARATOR;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Terminal,
    Light,
    Dark,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemePreference>,
}

impl Settings {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1))
    }

    pub fn tag_separator(&self) -> &str {
        match self.tag_separator.as_deref() {
            Some(separator) if !separator.is_empty() => separator,
            _ => DEFAULT_SEPARATOR,
        }
    }

    pub fn theme(&self) -> ThemePreference {
        self.theme.unwrap_or_default()
    }
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Resolves the API token: explicit value, then `TOGGL_TOKEN`, then the stored token file.
pub fn read_token(explicit: Option<String>) -> Option<String> {
    let from_env = env::var(TOKEN_ENV).ok();
    let from_file = token_path().and_then(|path| read_token_file(&path));
    [explicit, from_env, from_file]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

pub fn write_token(token: &str) -> Result<(), io::Error> {
    let path = token_path()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Home directory not found"))?;
    fs::write(path, token.trim())
}

fn read_token_file(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn token_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".togglscene-token");
    Some(path)
}

fn settings_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".togglscene.json");
    Some(path)
}

pub fn read_settings() -> Settings {
    settings_path()
        .and_then(|path| read_settings_from(&path))
        .unwrap_or_default()
}

pub fn write_settings(settings: &Settings) -> Result<(), io::Error> {
    let path = settings_path()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Home directory not found"))?;
    write_settings_to(&path, settings)
}

fn read_settings_from(path: &Path) -> Option<Settings> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(settings) => Some(settings),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Ignoring unreadable settings");
            None
        }
    }
}

fn write_settings_to(path: &Path, settings: &Settings) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(settings).map_err(io::Error::other)?;
    fs::write(path, json)
}
