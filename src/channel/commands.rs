use log::{debug, error, warn};
use tauri::State;

use crate::{
    models::CapturedNote,
    storage::{StorageError, DEFAULT_LIST_LIMIT},
    AppState,
};

use super::CommandError;

#[tauri::command]
pub fn ping() -> String {
    "pong".to_string()
}

/// `Ok(None)` means the text was blank and nothing was written.
#[tauri::command]
pub async fn save_note(
    state: State<'_, AppState>,
    text: String,
) -> Result<Option<CapturedNote>, CommandError> {
    saved_or_skipped(state.gateway.save_note(&text).await)
}

#[tauri::command]
pub async fn list_notes(
    state: State<'_, AppState>,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<Vec<CapturedNote>, CommandError> {
    let (limit, offset) = page(limit, offset);
    state
        .gateway
        .list_notes(limit, offset)
        .await
        .map_err(CommandError::from)
}

#[tauri::command]
pub fn hide_overlay(state: State<'_, AppState>) {
    let overlay = state.overlay.clone();
    tauri::async_runtime::spawn(async move {
        if let Err(err) = overlay.hide().await {
            error!("hide_overlay failed: {err:#}");
        }
    });
}

#[tauri::command]
pub fn nudge_overlay(state: State<'_, AppState>, dx: f64, dy: f64) {
    let Some((dx, dy)) = finite_delta(dx, dy) else {
        warn!("Ignoring nudge with non-finite delta ({dx}, {dy})");
        return;
    };

    let overlay = state.overlay.clone();
    tauri::async_runtime::spawn(async move {
        if let Err(err) = overlay.nudge(dx, dy).await {
            error!("nudge_overlay failed: {err:#}");
        }
    });
}

fn saved_or_skipped(
    result: Result<CapturedNote, StorageError>,
) -> Result<Option<CapturedNote>, CommandError> {
    match result {
        Ok(note) => {
            debug!("Saved note {}", note.id);
            Ok(Some(note))
        }
        Err(StorageError::EmptyNote) => Ok(None),
        Err(err) => {
            error!("save_note failed: {err}");
            Err(err.into())
        }
    }
}

fn page(limit: Option<u32>, offset: Option<u32>) -> (u32, u32) {
    (limit.unwrap_or(DEFAULT_LIST_LIMIT), offset.unwrap_or(0))
}

fn finite_delta(dx: f64, dy: f64) -> Option<(f64, f64)> {
    (dx.is_finite() && dy.is_finite()).then_some((dx, dy))
}
