pub mod chart;
pub mod config;
pub mod dashboard;
pub mod derived;
pub mod metrics;
pub mod preferences;
pub mod ranges;
pub mod skins;
pub mod source;
pub mod time;
