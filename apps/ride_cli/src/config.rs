use std::{fs, io::ErrorKind, path::Path};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: Option<String>,
    pub ride_path: String,
    pub auth_token: Option<String>,
    pub simulate: bool,
    pub simulated_eta_seconds: u64,
    pub fleet: Vec<String>,
    pub request_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: None,
            ride_path: ride_core::backend::DEFAULT_RIDE_PATH.into(),
            auth_token: None,
            simulate: false,
            simulated_eta_seconds: 30,
            fleet: vec![
                "Bucephalus".into(),
                "Shadowfax".into(),
                "Rocinante".into(),
            ],
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendChoice {
    Http { api_url: String },
    Simulated,
    Missing,
}

impl Settings {
    /// Simulation wins over a configured API; no API at all means the ride page is not functional.
    pub fn backend_choice(&self) -> BackendChoice {
        if self.simulate {
            return BackendChoice::Simulated;
        }
        match self.api_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => BackendChoice::Http {
                api_url: url.to_string(),
            },
            _ => BackendChoice::Missing,
        }
    }
}

pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = read_settings_file(path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    };
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("RIDE_API_URL") {
        settings.api_url = Some(v);
    }
    if let Some(v) = lookup("APP__API_URL") {
        settings.api_url = Some(v);
    }

    if let Some(v) = lookup("APP__RIDE_PATH") {
        settings.ride_path = v;
    }

    if let Some(v) = lookup("RIDE_AUTH_TOKEN") {
        settings.auth_token = Some(v);
    }
    if let Some(v) = lookup("APP__AUTH_TOKEN") {
        settings.auth_token = Some(v);
    }

    if let Some(v) = lookup("APP__SIMULATE") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.simulate = parsed;
        }
    }

    if let Some(v) = lookup("APP__SIMULATED_ETA_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.simulated_eta_seconds = parsed;
        }
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
