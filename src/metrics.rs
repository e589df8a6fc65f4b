//! Pure conversions from raw sensor fields to display metrics and labels.
//!
//! Every function here is total: absent or non-finite input yields the
//! "no data" variant instead of a panic or a NaN.

use std::fmt;

use serde::Serialize;

/// Marker shown wherever a value is missing.
pub const NO_DATA: &str = "—";

// Magnus coefficients (Sonntag 1990) used by `dew_point`.
const MAGNUS_A: f64 = 17.62;
const MAGNUS_B: f64 = 243.12;

const LUX_A: f64 = 500_000.0;
const LUX_B: f64 = 1.4;
const LUX_MAX: f64 = 200_000.0;

/// Returns the value only if it is present and finite.
#[inline]
pub fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Dew point in °C (Magnus approximation).
///
/// The caller must pass a present temperature and a humidity above 0 %; at
/// 0 % the logarithm diverges and the result is not finite.
pub fn dew_point(temp_c: f64, rel_humidity: f64) -> f64 {
    let gamma = (rel_humidity / 100.0).ln() + (MAGNUS_A * temp_c) / (MAGNUS_B + temp_c);
    (MAGNUS_B * gamma) / (MAGNUS_A - gamma)
}

/// Humidex "feels like" temperature in °C.
pub fn feels_like(temp_c: f64, rel_humidity: f64) -> f64 {
    let td = dew_point(temp_c, rel_humidity);
    let e = 6.11 * (5417.753 * (1.0 / 273.16 - 1.0 / (273.15 + td))).exp();
    temp_c + 0.5555 * (e - 10.0)
}

/// Estimated illuminance in lux from the photoresistor resistance in ohms.
///
/// This is a very rough heuristic without any calibration, i.e. only an
/// approximation: `lux = (500000 / ohms)^(1/1.4)`, clamped to `0..=200000`.
/// It is not a physical measurement.
pub fn illuminance_from_resistance(ohms: Option<f64>) -> Option<f64> {
    let ohms = finite(ohms).filter(|r| *r > 0.0)?;
    let lux = (LUX_A / ohms).powf(1.0 / LUX_B);
    Some(lux.clamp(0.0, LUX_MAX))
}

// ---------------------------------------------------------------------------
// Severity / Rating
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warn,
    Bad,
}

/// A qualitative label together with how worrying it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub label: &'static str,
    pub severity: Severity,
}

impl Rating {
    const fn new(label: &'static str, severity: Severity) -> Self {
        Self { label, severity }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

/// Classifies the gas-sensor percentage (lower is cleaner).
pub fn air_quality(pct: Option<f64>) -> Rating {
    match finite(pct) {
        None => Rating::new(NO_DATA, Severity::Warn),
        Some(p) if p < 20.0 => Rating::new("Very good", Severity::Ok),
        Some(p) if p < 40.0 => Rating::new("Good", Severity::Ok),
        Some(p) if p < 60.0 => Rating::new("Medium", Severity::Warn),
        Some(_) => Rating::new("Poor", Severity::Bad),
    }
}

/// Classifies the vibration EMA magnitude.
pub fn vibration_level(ema: Option<f64>) -> Rating {
    match finite(ema) {
        None => Rating::new(NO_DATA, Severity::Warn),
        Some(v) if v < 0.01 => Rating::new("Calm", Severity::Ok),
        Some(v) if v < 0.03 => Rating::new("Slight", Severity::Ok),
        Some(v) if v < 0.07 => Rating::new("Noticeable", Severity::Warn),
        Some(_) => Rating::new("Strong", Severity::Bad),
    }
}

// ---------------------------------------------------------------------------
// Darkness
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Darkness {
    Unknown,
    Night,
    Twilight,
    OvercastDark,
    Daylight,
    Sun,
}

impl Darkness {
    pub fn label(&self) -> &'static str {
        match self {
            Darkness::Unknown => NO_DATA,
            Darkness::Night => "Night",
            Darkness::Twilight => "Twilight",
            Darkness::OvercastDark => "Overcast/Dark",
            Darkness::Daylight => "Daylight",
            Darkness::Sun => "Sun",
        }
    }
}

impl fmt::Display for Darkness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn darkness_label(lux: Option<f64>) -> Darkness {
    match finite(lux) {
        None => Darkness::Unknown,
        Some(l) if l < 0.5 => Darkness::Night,
        Some(l) if l < 10.0 => Darkness::Twilight,
        Some(l) if l < 1_000.0 => Darkness::OvercastDark,
        Some(l) if l < 20_000.0 => Darkness::Daylight,
        Some(_) => Darkness::Sun,
    }
}

// ---------------------------------------------------------------------------
// UV
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UvCategory {
    Unknown,
    Low,
    Medium,
    High,
    VeryHigh,
    Extreme,
}

impl UvCategory {
    pub fn label(&self) -> &'static str {
        match self {
            UvCategory::Unknown => NO_DATA,
            UvCategory::Low => "Low",
            UvCategory::Medium => "Medium",
            UvCategory::High => "High",
            UvCategory::VeryHigh => "Very High",
            UvCategory::Extreme => "Extreme",
        }
    }
}

impl fmt::Display for UvCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn uv_category(uvi: Option<f64>) -> UvCategory {
    match finite(uvi) {
        None => UvCategory::Unknown,
        Some(u) if u < 3.0 => UvCategory::Low,
        Some(u) if u < 6.0 => UvCategory::Medium,
        Some(u) if u < 8.0 => UvCategory::High,
        Some(u) if u < 11.0 => UvCategory::VeryHigh,
        Some(_) => UvCategory::Extreme,
    }
}

// ---------------------------------------------------------------------------
// Sensor status codes
//
// The firmware reports free-form status strings per sensor. Only three shapes
// are known: "OK", codes starting with "NC" (not connected) and codes that
// mention "SHORT". Everything else is passed through verbatim.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "code", rename_all = "snake_case")]
pub enum SensorStatus {
    Unknown,
    Ok,
    NotConnected(String),
    Shorted(String),
    Other(String),
}

impl SensorStatus {
    pub fn severity(&self) -> Severity {
        match self {
            SensorStatus::Ok => Severity::Ok,
            SensorStatus::Unknown | SensorStatus::Other(_) => Severity::Warn,
            SensorStatus::NotConnected(_) | SensorStatus::Shorted(_) => Severity::Bad,
        }
    }

    /// Raw code as reported by the device, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            SensorStatus::Unknown => None,
            SensorStatus::Ok => Some("OK"),
            SensorStatus::NotConnected(c) | SensorStatus::Shorted(c) | SensorStatus::Other(c) => {
                Some(c)
            }
        }
    }
}

pub fn sensor_status(code: Option<&str>) -> SensorStatus {
    let Some(code) = code.map(str::trim) else {
        return SensorStatus::Unknown;
    };
    if code == "OK" {
        SensorStatus::Ok
    } else if code.starts_with("NC") {
        SensorStatus::NotConnected(code.to_owned())
    } else if code.contains("SHORT") {
        SensorStatus::Shorted(code.to_owned())
    } else {
        SensorStatus::Other(code.to_owned())
    }
}

/// Maps a boolean health flag to a status (`true` → Ok).
pub fn flag_status(flag: Option<bool>) -> SensorStatus {
    match flag {
        None => SensorStatus::Unknown,
        Some(true) => SensorStatus::Ok,
        Some(false) => SensorStatus::Other("FAULT".to_owned()),
    }
}
