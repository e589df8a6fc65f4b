//! Selectable time ranges and the chart groups that use them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

const MINUTE_MS: u64 = 60_000;
const HOUR_MS: u64 = 60 * MINUTE_MS;

// ---------------------------------------------------------------------------
// RangeKey
// ---------------------------------------------------------------------------

/// Short code of a range preset. Serialized as the code itself (`"24h"`), which
/// is also the persisted preference format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeKey {
    #[serde(rename = "10m")]
    TenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
}

impl RangeKey {
    pub const DEFAULT: RangeKey = RangeKey::Day;

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeKey::TenMinutes => "10m",
            RangeKey::OneHour => "1h",
            RangeKey::SixHours => "6h",
            RangeKey::TwelveHours => "12h",
            RangeKey::Day => "24h",
            RangeKey::Week => "7d",
        }
    }

    pub fn preset(&self) -> &'static RangePreset {
        // PRESETS is ordered like the enum.
        &PRESETS[*self as usize]
    }
}

impl Default for RangeKey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for RangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangeKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        PRESETS
            .iter()
            .find(|p| p.key.as_str() == s)
            .map(|p| p.key)
            .ok_or_else(|| anyhow::anyhow!("unknown range key: {s:?}"))
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangePreset {
    pub key: RangeKey,
    pub label: &'static str,
    /// Width of the chart window.
    pub duration_ms: u64,
    /// How far back the history request reaches. Always covers `duration_ms`
    /// plus slack so the client-side crop has whole edges to cut from.
    pub lookback_hours: u32,
}

pub static PRESETS: [RangePreset; 6] = [
    RangePreset {
        key: RangeKey::TenMinutes,
        label: "10m",
        duration_ms: 10 * MINUTE_MS,
        lookback_hours: 1,
    },
    RangePreset {
        key: RangeKey::OneHour,
        label: "1h",
        duration_ms: HOUR_MS,
        lookback_hours: 2,
    },
    RangePreset {
        key: RangeKey::SixHours,
        label: "6h",
        duration_ms: 6 * HOUR_MS,
        lookback_hours: 8,
    },
    RangePreset {
        key: RangeKey::TwelveHours,
        label: "12h",
        duration_ms: 12 * HOUR_MS,
        lookback_hours: 14,
    },
    RangePreset {
        key: RangeKey::Day,
        label: "24h",
        duration_ms: 24 * HOUR_MS,
        lookback_hours: 26,
    },
    RangePreset {
        key: RangeKey::Week,
        label: "7d",
        duration_ms: 7 * 24 * HOUR_MS,
        lookback_hours: 170,
    },
];

/// Looks up a preset by its short code, falling back to the 24 h preset for
/// anything unknown.
pub fn lookup(key: &str) -> &'static RangePreset {
    key.parse::<RangeKey>()
        .unwrap_or(RangeKey::DEFAULT)
        .preset()
}

// ---------------------------------------------------------------------------
// ChartGroup
// ---------------------------------------------------------------------------

/// One history chart with its own range selection and series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartGroup {
    /// Temperature, humidity, pressure.
    Environment,
    UvLight,
    Air,
    Vibration,
}

impl ChartGroup {
    pub const ALL: [ChartGroup; 4] = [
        ChartGroup::Environment,
        ChartGroup::UvLight,
        ChartGroup::Air,
        ChartGroup::Vibration,
    ];

    /// Preference slot holding this group's selected range.
    pub fn preference_key(&self) -> &'static str {
        match self {
            ChartGroup::Environment => "range_thp",
            ChartGroup::UvLight => "range_uvl",
            ChartGroup::Air => "range_air",
            ChartGroup::Vibration => "range_vib",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartGroup::Environment => "Temperature · Humidity · Pressure",
            ChartGroup::UvLight => "UV · Light",
            ChartGroup::Air => "Air quality",
            ChartGroup::Vibration => "Vibration",
        }
    }
}

impl fmt::Display for ChartGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChartGroup::Environment => "environment",
            ChartGroup::UvLight => "uv_light",
            ChartGroup::Air => "air",
            ChartGroup::Vibration => "vibration",
        };
        f.write_str(s)
    }
}
