use std::time::Duration;

use log::warn;

use crate::storage::StoragePreference;

pub const DEFAULT_TOGGLE_SHORTCUT: &str = "CommandOrControl+Shift+N";

/// Runtime knobs, read once at startup.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Logical pixels.
    pub panel_width: f64,
    pub panel_height: f64,
    pub toggle_shortcut: String,
    pub nudge_step: f64,
    pub nudge_step_large: f64,
    pub auto_hide_delay: Duration,
    pub nudge_grace: Duration,
    pub storage: StoragePreference,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            panel_width: 640.0,
            panel_height: 160.0,
            toggle_shortcut: DEFAULT_TOGGLE_SHORTCUT.into(),
            nudge_step: 8.0,
            nudge_step_large: 64.0,
            auto_hide_delay: Duration::from_millis(150),
            nudge_grace: Duration::from_millis(400),
            storage: StoragePreference::Structured,
        }
    }
}

impl OverlayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(shortcut) = lookup("QUICKCAP_TOGGLE_SHORTCUT") {
            let shortcut = shortcut.trim();
            if shortcut.is_empty() {
                warn!("QUICKCAP_TOGGLE_SHORTCUT is empty; keeping {}", config.toggle_shortcut);
            } else {
                config.toggle_shortcut = shortcut.to_string();
            }
        }

        if let Some(raw) = lookup("QUICKCAP_AUTO_HIDE_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.auto_hide_delay = Duration::from_millis(ms),
                Err(err) => warn!("Ignoring QUICKCAP_AUTO_HIDE_MS={raw:?}: {err}"),
            }
        }

        if let Some(raw) = lookup("QUICKCAP_STORAGE") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "flat" | "json" | "file" => config.storage = StoragePreference::FlatFile,
                "sqlite" | "structured" | "" => config.storage = StoragePreference::Structured,
                other => warn!("Unknown QUICKCAP_STORAGE value {other:?}; using SQLite"),
            }
        }

        config
    }
}

pub fn debug_logging_enabled() -> bool {
    std::env::var("QUICKCAP_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
