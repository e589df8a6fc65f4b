//! Values computed from the current latest reading and environment history.

use serde::Serialize;

use crate::{
    chart::min_max,
    metrics::{
        air_quality, darkness_label, dew_point, feels_like, finite, flag_status,
        illuminance_from_resistance, sensor_status, uv_category, vibration_level, Darkness,
        Rating, SensorStatus, UvCategory,
    },
    source::Reading,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorHealth {
    pub sensor: &'static str,
    pub status: SensorStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub feels_like: Option<f64>,
    pub dew_point: Option<f64>,
    /// Approximate lux; see [`illuminance_from_resistance`].
    pub illuminance: Option<f64>,
    pub darkness: Darkness,
    pub air: Rating,
    pub vibration: Rating,
    pub uv: UvCategory,
    /// Temperature range over the environment history, for scale bounds.
    pub temp_low: Option<f64>,
    pub temp_high: Option<f64>,
    pub sensors: Vec<SensorHealth>,
}

impl DerivedMetrics {
    pub fn compute(latest: Option<&Reading>, environment: &[Reading]) -> Self {
        let temp = latest.and_then(|r| finite(r.temperature));
        let humidity = latest.and_then(|r| finite(r.humidity));

        // Humidity of 0 % has no dew point; `finite` drops the -inf/NaN.
        let (feels, dew) = match (temp, humidity) {
            (Some(t), Some(h)) => (finite(Some(feels_like(t, h))), finite(Some(dew_point(t, h)))),
            _ => (None, None),
        };

        let illuminance = illuminance_from_resistance(latest.and_then(|r| r.light_resistance));
        let (temp_low, temp_high) = match min_max(environment.iter().map(|r| r.temperature)) {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (None, None),
        };

        Self {
            feels_like: feels,
            dew_point: dew,
            illuminance,
            darkness: darkness_label(illuminance),
            air: air_quality(latest.and_then(|r| r.air_pct)),
            vibration: vibration_level(latest.and_then(|r| r.vibration_ema)),
            uv: uv_category(latest.and_then(|r| r.uv_index)),
            temp_low,
            temp_high,
            sensors: latest.map(sensor_health).unwrap_or_default(),
        }
    }
}

impl Default for DerivedMetrics {
    fn default() -> Self {
        Self::compute(None, &[])
    }
}

fn sensor_health(r: &Reading) -> Vec<SensorHealth> {
    vec![
        SensorHealth { sensor: "BME", status: flag_status(r.environment_ok) },
        SensorHealth { sensor: "UV", status: sensor_status(r.uv_status.as_deref()) },
        SensorHealth { sensor: "LDR", status: sensor_status(r.light_status.as_deref()) },
        SensorHealth { sensor: "MQ", status: sensor_status(r.air_status.as_deref()) },
        SensorHealth { sensor: "IMU", status: flag_status(r.motion_ok) },
        SensorHealth { sensor: "RTC", status: flag_status(r.clock_ok) },
    ]
}
