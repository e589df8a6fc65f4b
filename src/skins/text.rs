use std::fmt::Write as _;

use crate::{
    chart::{min_max, prepare},
    dashboard::{ChartSnapshot, DashboardSnapshot, Phase, PAGES},
    metrics::{sensor_status, SensorStatus, NO_DATA},
    ranges::ChartGroup,
    skins::{value, Skin},
    source::Reading,
    time::{format_ago, format_local, now_local},
};

/// Plain-text terminal rendering: tiles on page 0, chart summaries on page 1.
pub struct TextSkin {
    location: String,
}

impl TextSkin {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl Skin for TextSkin {
    fn name(&self) -> &'static str {
        "text"
    }

    fn render(&self, snap: &DashboardSnapshot) -> String {
        let mut out = String::new();

        if let Some(err) = &snap.error {
            let _ = writeln!(out, "!! {err}");
        }

        let auto = if snap.auto_refresh { "on" } else { "off" };
        let _ = writeln!(
            out,
            "{} · {}   auto-refresh {auto}   page {}/{PAGES}",
            self.location,
            snap.device_id,
            snap.page + 1,
        );

        let ts = snap.latest.as_ref().map(|r| r.ts.as_str());
        let _ = writeln!(
            out,
            "Updated {} ({})",
            format_local(ts),
            format_ago(ts, now_local())
        );
        if snap.latest_phase == Phase::Loading {
            out.push_str("Loading…\n");
        }
        out.push('\n');

        if snap.page == 0 {
            tiles(&mut out, snap);
        } else {
            charts(&mut out, snap);
        }
        out
    }
}

fn row(out: &mut String, label: &str, body: impl std::fmt::Display) {
    let _ = writeln!(out, "{label:<14}{body}");
}

fn tiles(out: &mut String, snap: &DashboardSnapshot) {
    let r = snap.latest.as_ref();
    let d = &snap.derived;

    let bounds = match (d.temp_low, d.temp_high) {
        (Some(_), Some(_)) => format!(
            "   (L {} / H {})",
            value(d.temp_low, 1, "°"),
            value(d.temp_high, 1, "°")
        ),
        _ => String::new(),
    };
    row(out, "Temperature", format!("{}{bounds}", value(r.and_then(|r| r.temperature), 1, "°C")));
    row(out, "Feels like", value(d.feels_like, 1, "°C"));
    row(
        out,
        "Humidity",
        format!(
            "{}   dew point {}",
            value(r.and_then(|r| r.humidity), 0, "%"),
            value(d.dew_point, 1, "°C")
        ),
    );
    row(out, "Pressure", value(r.and_then(|r| r.pressure), 0, "hPa"));

    // A faulty UV sensor reports a code instead of a usable index.
    let uv_status = sensor_status(r.and_then(|r| r.uv_status.as_deref()));
    let uv_label = match &uv_status {
        SensorStatus::Unknown | SensorStatus::Ok => d.uv.label().to_owned(),
        other => other.code().unwrap_or(NO_DATA).to_owned(),
    };
    row(out, "UV index", format!("{}   {uv_label}", value(r.and_then(|r| r.uv_index), 1, "")));

    row(
        out,
        "Light",
        format!(
            "~{}   {}   {}",
            value(d.illuminance, 0, "lx"),
            value(r.and_then(|r| r.light_pct), 0, "%"),
            d.darkness
        ),
    );
    row(out, "Air quality", format!("{}   {}", value(r.and_then(|r| r.air_pct), 0, "%"), d.air));
    row(
        out,
        "Vibration",
        format!(
            "{}   peak {}   {}",
            value(r.and_then(|r| r.vibration_ema), 3, ""),
            value(r.and_then(|r| r.vibration_peak), 3, ""),
            d.vibration
        ),
    );

    if !d.sensors.is_empty() {
        let chips: Vec<String> = d
            .sensors
            .iter()
            .map(|s| format!("{} {}", s.sensor, s.status.code().unwrap_or(NO_DATA)))
            .collect();
        row(out, "Sensors", chips.join(" · "));
    }
}

/// One line of a chart summary.
struct Series {
    label: &'static str,
    unit: &'static str,
    decimals: usize,
    get: fn(&Reading) -> Option<f64>,
}

const ENVIRONMENT: &[Series] = &[
    Series { label: "temperature", unit: "°C", decimals: 1, get: |r| r.temperature },
    Series { label: "humidity", unit: "%", decimals: 0, get: |r| r.humidity },
    Series { label: "pressure", unit: "hPa", decimals: 0, get: |r| r.pressure },
];
const UV_LIGHT: &[Series] = &[
    Series { label: "uv index", unit: "", decimals: 1, get: |r| r.uv_index },
    Series { label: "light", unit: "%", decimals: 0, get: |r| r.light_pct },
];
const AIR: &[Series] = &[Series { label: "air", unit: "%", decimals: 0, get: |r| r.air_pct }];
const VIBRATION: &[Series] = &[
    Series { label: "ema", unit: "", decimals: 3, get: |r| r.vibration_ema },
    Series { label: "peak", unit: "", decimals: 3, get: |r| r.vibration_peak },
];

fn series_of(group: ChartGroup) -> &'static [Series] {
    match group {
        ChartGroup::Environment => ENVIRONMENT,
        ChartGroup::UvLight => UV_LIGHT,
        ChartGroup::Air => AIR,
        ChartGroup::Vibration => VIBRATION,
    }
}

fn charts(out: &mut String, snap: &DashboardSnapshot) {
    let now = snap
        .latest
        .as_ref()
        .and_then(Reading::timestamp)
        .unwrap_or_else(now_local);

    for chart in &snap.charts {
        chart_summary(out, chart, now);
    }
}

fn chart_summary(out: &mut String, chart: &ChartSnapshot, now: chrono::NaiveDateTime) {
    let preset = chart.range.preset();
    let points = prepare(&chart.series, preset, now);

    let state = match chart.phase {
        Phase::Loading => "   loading…",
        Phase::Failed => "   (stale)",
        Phase::Idle | Phase::Ready => "",
    };
    let _ = writeln!(out, "{} [{}]  {} points{state}", chart.group.title(), preset.label, points.len());

    for s in series_of(chart.group) {
        let body = match min_max(points.iter().map(|r| (s.get)(r))) {
            Some((lo, hi)) => format!(
                "{} .. {}",
                value(Some(lo), s.decimals, s.unit),
                value(Some(hi), s.decimals, s.unit)
            ),
            None => NO_DATA.to_owned(),
        };
        let _ = writeln!(out, "  {:<12}{body}", s.label);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dashboard::{
            state::{DashboardState, Preferences},
            testing::reading,
        },
        preferences::MemoryStorage,
        source::{Endpoint, SourceError},
    };

    fn state() -> DashboardState {
        DashboardState::new(Preferences::load(Arc::new(MemoryStorage::new())))
    }

    fn with_latest(r: Reading) -> DashboardState {
        let mut st = state();
        let seq = st.latest.begin();
        st.apply_latest(seq, Ok(Some(r)));
        st
    }

    fn skin() -> TextSkin {
        TextSkin::new("Garden")
    }

    #[test]
    fn empty_dashboard_shows_no_data_everywhere() {
        let out = skin().render(&state().snapshot("ws-01"));
        assert!(out.starts_with("Garden · ws-01"));
        assert!(out.contains(&format!("Temperature   {NO_DATA}")));
        assert!(out.contains(&format!("Feels like    {NO_DATA}")));
        assert!(out.contains(&format!("Updated {NO_DATA} ({NO_DATA})")));
        assert!(!out.contains("Sensors"));
    }

    #[test]
    fn error_banner_comes_first_and_keeps_values() {
        let mut st = with_latest(reading(1, 22.5, 60.0));
        let seq = st.latest.begin();
        st.apply_latest(seq, Err(SourceError::Status { endpoint: Endpoint::Latest, status: 503 }));

        let out = skin().render(&st.snapshot("ws-01"));
        assert!(out.starts_with("!! latest: HTTP 503\n"));
        assert!(out.contains("22.5 °C"));
    }

    #[test]
    fn tiles_show_metrics() {
        let mut r = reading(1, 22.5, 60.0);
        r.uv_index = Some(4.0);
        r.uv_status = Some("OK".to_owned());
        r.air_pct = Some(10.0);
        let out = skin().render(&with_latest(r).snapshot("ws-01"));

        assert!(out.contains("Humidity      60 %"));
        assert!(out.contains("UV index      4.0   Medium"));
        assert!(out.contains("Air quality   10 %   Very good"));
        assert!(out.contains("Pressure      —"));
        assert!(out.contains("Sensors       BME — · UV OK"));
    }

    #[test]
    fn faulty_uv_sensor_shows_status_code() {
        let mut r = reading(1, 22.5, 60.0);
        r.uv_index = Some(0.0);
        r.uv_status = Some("NC_I2C".to_owned());
        let out = skin().render(&with_latest(r).snapshot("ws-01"));
        assert!(out.contains("UV index      0.0   NC_I2C"));
        assert!(!out.contains("Low"));
    }

    #[test]
    fn chart_page_summarises_cropped_series() {
        let mut st = with_latest(reading(30, 20.0, 50.0));
        st.prefs.set_page(1);
        let seq = st.history_mut(ChartGroup::Environment).begin();
        st.apply_history(
            ChartGroup::Environment,
            seq,
            Ok(vec![reading(10, 18.0, 40.0), reading(20, 24.0, 55.0), reading(30, 20.0, 50.0)]),
        );

        let out = skin().render(&st.snapshot("ws-01"));
        assert!(out.contains("page 2/2"));
        assert!(out.contains("Temperature · Humidity · Pressure [24h]  3 points"));
        assert!(out.contains("temperature 18.0 °C .. 24.0 °C"));
        assert!(out.contains("humidity    40 % .. 55 %"));
        assert!(out.contains(&format!("pressure    {NO_DATA}")));
        assert!(out.contains("Vibration [24h]  0 points"));
    }
}
