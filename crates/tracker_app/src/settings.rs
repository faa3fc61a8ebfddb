//! Optional RON settings file layered over the built-in defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracker_core::{DegradedPhasePolicy, TrackerConfig};
use tracker_engine::FetchSettings;
use tracker_logging::tracker_info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerSettings {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub sim_interval_ms: Option<u64>,
    pub phase_count: Option<usize>,
    pub phase_labels: Option<Vec<String>>,
    pub max_consecutive_failures: Option<u32>,
    pub max_tracking_duration_ms: Option<u64>,
    pub freeze_phase_while_degraded: Option<bool>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
}

impl TrackerSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading settings: {}", path.display()))?;
        let settings: TrackerSettings = ron::from_str(&raw)
            .with_context(|| format!("parsing settings: {}", path.display()))?;
        tracker_info!("Loaded tracker settings from {:?}", path);
        Ok(settings)
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        let mut config = TrackerConfig::default();
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.sim_interval_ms {
            config.sim_interval = Duration::from_millis(ms);
        }
        if let Some(labels) = &self.phase_labels {
            config.phase_count = labels.len();
            config.phase_labels = labels.clone();
        }
        if let Some(count) = self.phase_count {
            config.phase_count = count;
        }
        config.max_consecutive_failures = self.max_consecutive_failures;
        config.max_tracking_duration = self.max_tracking_duration_ms.map(Duration::from_millis);
        if self.freeze_phase_while_degraded == Some(true) {
            config.degraded_phase_policy = DegradedPhasePolicy::Freeze;
        }
        config
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let mut settings = FetchSettings::default();
        if let Some(ms) = self.connect_timeout_ms {
            settings.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.request_timeout_ms {
            settings.request_timeout = Duration::from_millis(ms);
        }
        settings
    }
}
