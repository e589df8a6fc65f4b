use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::time::parse_ts_local;

// ---------------------------------------------------------------------------
// Reading: GET /api/latest, GET /api/history
//
// One sample from the station. Identity fields are always present; every
// measurement may be null when the sensor is missing or faulty:
//
//   { "id": 812, "device_id": "ws-01", "ts": "2025-06-01T14:03:00Z",
//     "t": 22.5, "h": 60.0, "p": 1013.2, "bme_ok": 1,
//     "uv_uvi": 3.1, "uv_status": "OK",
//     "ldr_pct": 71.0, "ldr_status": "OK", "ldr_r": 4200.0,
//     "mq_pct": 18.0, "mq_status": "OK",
//     "vib_ema": 0.004, "vib_peak": 0.02, "imu_ok": 1, "rtc_ok": 1 }
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub device_id: String,
    /// ISO-8601-like timestamp. A trailing `Z` is *not* UTC; see
    /// [`parse_ts_local`].
    pub ts: String,

    /// Air temperature in °C.
    #[serde(rename = "t", default)]
    pub temperature: Option<f64>,
    /// Relative humidity in %.
    #[serde(rename = "h", default)]
    pub humidity: Option<f64>,
    /// Pressure in hPa.
    #[serde(rename = "p", default)]
    pub pressure: Option<f64>,
    #[serde(rename = "bme_ok", default, deserialize_with = "deserialize_flag")]
    pub environment_ok: Option<bool>,

    #[serde(rename = "uv_uvi", default)]
    pub uv_index: Option<f64>,
    #[serde(default)]
    pub uv_status: Option<String>,

    /// Brightness as reported by the photoresistor, 0–100 %.
    #[serde(rename = "ldr_pct", default)]
    pub light_pct: Option<f64>,
    #[serde(rename = "ldr_status", default)]
    pub light_status: Option<String>,
    /// Raw photoresistor resistance in ohms.
    #[serde(rename = "ldr_r", default)]
    pub light_resistance: Option<f64>,

    /// Gas-sensor reading, 0–100 %.
    #[serde(rename = "mq_pct", default)]
    pub air_pct: Option<f64>,
    #[serde(rename = "mq_status", default)]
    pub air_status: Option<String>,

    #[serde(rename = "vib_ema", default)]
    pub vibration_ema: Option<f64>,
    #[serde(rename = "vib_peak", default)]
    pub vibration_peak: Option<f64>,
    #[serde(rename = "imu_ok", default, deserialize_with = "deserialize_flag")]
    pub motion_ok: Option<bool>,

    #[serde(rename = "rtc_ok", default, deserialize_with = "deserialize_flag")]
    pub clock_ok: Option<bool>,
}

impl Reading {
    /// Local wall-clock time of the sample, if `ts` parses.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_ts_local(&self.ts)
    }
}

// ---------------------------------------------------------------------------
// Health flags
//
// The producer writes 0/1 integers, but booleans are accepted too. Untagged
// enum, so Bool MUST come before Number.
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Bool(bool),
    Number(f64),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<FlagValue>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| match v {
        FlagValue::Bool(b) => Some(b),
        FlagValue::Number(n) if n.is_finite() => Some(n != 0.0),
        FlagValue::Number(_) => None,
    }))
}
