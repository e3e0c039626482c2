pub mod registrar;

use anyhow::{anyhow, Result};
use log::{debug, error};
use tauri::{plugin::TauriPlugin, AppHandle, Manager, Wry};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

pub use registrar::{ShortcutAction, ShortcutBackend, ShortcutRegistrar};

use crate::AppState;

/// Registers combinations through the global-shortcut plugin.
pub struct TauriShortcutBackend {
    app: AppHandle,
}

impl TauriShortcutBackend {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl ShortcutBackend for TauriShortcutBackend {
    fn register(&self, accelerator: &str) -> Result<()> {
        self.app
            .global_shortcut()
            .register(accelerator)
            .map_err(|err| anyhow!("failed to register {accelerator}: {err}"))
    }

    fn unregister(&self, accelerator: &str) -> Result<()> {
        self.app
            .global_shortcut()
            .unregister(accelerator)
            .map_err(|err| anyhow!("failed to unregister {accelerator}: {err}"))
    }

    fn unregister_all(&self) -> Result<()> {
        self.app
            .global_shortcut()
            .unregister_all()
            .map_err(|err| anyhow!("failed to unregister shortcuts: {err}"))
    }
}

fn same_shortcut(accelerator: &str, pressed: &Shortcut) -> bool {
    accelerator
        .parse::<Shortcut>()
        .map(|parsed| parsed.id() == pressed.id())
        .unwrap_or(false)
}

/// The plugin with a single handler that routes presses to the overlay.
pub fn plugin() -> TauriPlugin<Wry> {
    tauri_plugin_global_shortcut::Builder::new()
        .with_handler(|app, shortcut, event| {
            if event.state() != ShortcutState::Pressed {
                return;
            }
            let Some(state) = app.try_state::<AppState>() else {
                return;
            };

            let overlay = state.overlay.clone();
            let Some(action) = overlay
                .shortcuts()
                .action_for(|accelerator| same_shortcut(accelerator, shortcut))
            else {
                debug!("Ignoring unbound shortcut {shortcut:?}");
                return;
            };

            tauri::async_runtime::spawn(async move {
                let result = match action {
                    ShortcutAction::Toggle => overlay.toggle().await,
                    ShortcutAction::Nudge { dx, dy } => overlay.nudge(dx, dy).await,
                };
                if let Err(err) = result {
                    error!("Shortcut action {action:?} failed: {err:#}");
                }
            });
        })
        .build()
}
