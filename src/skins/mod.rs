//! Presentation adapters. Every skin renders the same [`DashboardSnapshot`];
//! none of them derives anything on its own.

mod json;
mod text;

pub use json::JsonSkin;
pub use text::TextSkin;

use crate::{config::SkinKind, dashboard::DashboardSnapshot, metrics::NO_DATA};

pub trait Skin: Send + Sync {
    fn name(&self) -> &'static str;
    fn render(&self, snapshot: &DashboardSnapshot) -> String;
}

pub fn build(kind: SkinKind, location: &str) -> Box<dyn Skin> {
    match kind {
        SkinKind::Text => Box::new(TextSkin::new(location)),
        SkinKind::Json => Box::new(JsonSkin),
    }
}

/// `22.5 °C`, or the no-data marker when the value is absent or not finite.
pub(crate) fn value(v: Option<f64>, decimals: usize, unit: &str) -> String {
    match v.filter(|x| x.is_finite()) {
        None => NO_DATA.to_owned(),
        Some(x) if unit.is_empty() => format!("{x:.decimals$}"),
        Some(x) => format!("{x:.decimals$} {unit}"),
    }
}
