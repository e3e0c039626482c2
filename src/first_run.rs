use std::{fs, path::PathBuf, sync::Mutex};

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

pub const MARKER_FILE_NAME: &str = "first-run.json";

pub const ONBOARDING_MESSAGE: &str =
    "Press the shortcut from anywhere to jot a note. Enter saves, Esc hides.";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkerFile {
    onboarding_shown_at: i64,
}

/// One-shot onboarding hint backed by a marker file.
pub struct FirstRunMarker {
    path: PathBuf,
    pending: Mutex<Option<String>>,
}

impl FirstRunMarker {
    /// A missing marker means this is the first run. An existing but
    /// unreadable marker still counts as onboarded.
    pub fn new(path: PathBuf) -> Self {
        let pending = if path.exists() {
            None
        } else {
            Some(ONBOARDING_MESSAGE.to_string())
        };

        Self {
            path,
            pending: Mutex::new(pending),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    /// Returns the message at most once per first run and records the marker.
    pub fn take_pending(&self) -> Option<String> {
        let message = self.lock().take()?;
        if let Err(err) = self.persist() {
            warn!("Failed to record onboarding marker at {}: {err:#}", self.path.display());
        }
        Some(message)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let marker = MarkerFile {
            onboarding_shown_at: Utc::now().timestamp_millis(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&marker)?)?;
        Ok(())
    }
}
