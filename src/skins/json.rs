use tracing::warn;

use crate::{dashboard::DashboardSnapshot, skins::Skin};

/// Pretty-printed snapshot, one document per render.
pub struct JsonSkin;

impl Skin for JsonSkin {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(&self, snapshot: &DashboardSnapshot) -> String {
        serde_json::to_string_pretty(snapshot).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize dashboard snapshot");
            String::from("{}")
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        dashboard::{state::{DashboardState, Preferences}, testing::reading},
        preferences::MemoryStorage,
    };

    #[test]
    fn renders_snapshot_fields() {
        let mut state = DashboardState::new(Preferences::load(Arc::new(MemoryStorage::new())));
        let seq = state.latest.begin();
        state.apply_latest(seq, Ok(Some(reading(7, 21.0, 45.0))));

        let out = JsonSkin.render(&state.snapshot("ws-01"));
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(v["device_id"], "ws-01");
        assert_eq!(v["latest"]["t"], 21.0);
        assert_eq!(v["latest_phase"], "ready");
        assert_eq!(v["charts"].as_array().unwrap().len(), 4);
        assert_eq!(v["charts"][0]["group"], "environment");
        assert_eq!(v["charts"][0]["range"], "24h");
        assert_eq!(v["auto_refresh"], true);
        assert!(v["error"].is_null());
        assert!(v["derived"]["dew_point"].is_number());
    }
}
