use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};

// ---------------------------------------------------------------------------
// SkinKind
// ---------------------------------------------------------------------------

/// Presentation adapter rendered to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinKind {
    Text,
    Json,
}

impl FromStr for SkinKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(anyhow::anyhow!("unknown skin: {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the reading service, e.g. `https://wx.example.net`; endpoints live under `/api`.
    pub api_base: String,
    pub device_id: String,
    /// Latest-reading refresh period in seconds.
    pub latest_refresh_secs: u64,
    /// History refresh period in seconds.
    pub history_refresh_secs: u64,
    pub preferences_path: PathBuf,
    pub skin: SkinKind,
    pub location: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key).with_context(|| format!("missing required env var: {key}"))
        };
        let optional =
            |key: &str, default: &str| -> String { lookup(key).unwrap_or_else(|| default.to_owned()) };

        Ok(Self {
            api_base: required("WEATHER_API_BASE")?,
            device_id: optional("WEATHER_DEVICE_ID", "ws-01"),
            latest_refresh_secs: parse_period("LATEST_REFRESH_SECS", &optional("LATEST_REFRESH_SECS", "30"))?,
            history_refresh_secs: parse_period("HISTORY_REFRESH_SECS", &optional("HISTORY_REFRESH_SECS", "60"))?,
            preferences_path: optional("PREFERENCES_PATH", "preferences.json").into(),
            skin: optional("DASHBOARD_SKIN", "text")
                .trim()
                .parse()
                .context("DASHBOARD_SKIN must be 'text' or 'json'")?,
            location: optional("DASHBOARD_LOCATION", "Weather station"),
        })
    }

    pub fn latest_refresh(&self) -> Duration {
        Duration::from_secs(self.latest_refresh_secs)
    }

    pub fn history_refresh(&self) -> Duration {
        Duration::from_secs(self.history_refresh_secs)
    }
}

fn parse_period(key: &str, raw: &str) -> Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer"))?;
    if secs == 0 {
        bail!("{key} must be a positive integer, got 0");
    }
    Ok(secs)
}
