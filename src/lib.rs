mod channel;
mod config;
mod db;
mod first_run;
mod instance;
mod models;
mod overlay;
mod shortcuts;
mod storage;
mod tray;

use std::sync::Arc;

use anyhow::anyhow;
use channel::commands::{hide_overlay, list_notes, nudge_overlay, ping, save_note};
use config::OverlayConfig;
use first_run::{FirstRunMarker, MARKER_FILE_NAME};
use log::{info, LevelFilter};
use overlay::{OverlayController, TauriOverlayHost};
use shortcuts::{ShortcutRegistrar, TauriShortcutBackend};
use storage::PersistenceGateway;
use tauri::{Manager, RunEvent};

pub(crate) struct AppState {
    pub(crate) gateway: PersistenceGateway,
    pub(crate) overlay: OverlayController,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // RUST_LOG still applies; QUICKCAP_DEBUG only raises the default.
    let level = if config::debug_logging_enabled() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    info!("QuickCap starting up...");

    let app = tauri::Builder::default()
        .plugin(instance::plugin())
        .plugin(shortcuts::plugin())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let config = OverlayConfig::from_env();
                let gateway = PersistenceGateway::open(&app_data_dir, config.storage);
                info!("Storage backend: {:?}", gateway.backend_kind());

                let handle = app.handle().clone();
                let registrar = ShortcutRegistrar::new(
                    Box::new(TauriShortcutBackend::new(handle.clone())),
                    &config,
                );
                let first_run = FirstRunMarker::new(app_data_dir.join(MARKER_FILE_NAME));
                if first_run.is_pending() {
                    info!("First run; onboarding hint queued for the first show");
                }
                let overlay = OverlayController::new(
                    Arc::new(TauriOverlayHost::new(handle.clone())),
                    Arc::new(registrar),
                    Arc::new(first_run),
                    config,
                );

                app.manage(AppState {
                    gateway,
                    overlay: overlay.clone(),
                });

                if let Some(host_events) = overlay.host_event_loop() {
                    tauri::async_runtime::spawn(host_events);
                }
                overlay.start();
                tray::install(&handle)?;

                // Menu-bar utility: no Dock icon.
                #[cfg(target_os = "macos")]
                app.set_activation_policy(tauri::ActivationPolicy::Accessory);

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            ping,
            save_note,
            list_notes,
            hide_overlay,
            nudge_overlay,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app, event| match event {
        // Closing the overlay must not end the process; only Quit does.
        RunEvent::ExitRequested { code: None, api, .. } => api.prevent_exit(),
        RunEvent::Exit => {
            if let Some(state) = app.try_state::<AppState>() {
                state.overlay.shutdown();
            }
        }
        _ => {}
    });
}
