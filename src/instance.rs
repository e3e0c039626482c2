//! Single-instance guard. The plugin ends a second launch before its setup
//! runs, so that process never creates a window or opens storage; the
//! running process shows its overlay instead.

use log::{error, info, warn};
use tauri::{plugin::TauriPlugin, AppHandle, Manager, Wry};

use crate::{overlay::OverlayController, AppState};

/// Must be the first plugin registered on the builder.
pub fn plugin() -> TauriPlugin<Wry> {
    tauri_plugin_single_instance::init(|app, argv, _cwd| {
        info!("Another launch requested activation ({} arg(s))", argv.len());
        activate(app);
    })
}

fn activate(app: &AppHandle) {
    let Some(state) = app.try_state::<AppState>() else {
        warn!("Activation request before setup finished; ignoring");
        return;
    };

    tauri::async_runtime::spawn(show_for_second_launch(state.overlay.clone()));
}

/// Brings the existing overlay forward; never creates a second window.
async fn show_for_second_launch(overlay: OverlayController) {
    if let Err(err) = overlay.show().await {
        error!("Failed to show overlay for second launch: {err:#}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{state::OverlayState, testing::fixture};

    #[tokio::test]
    async fn second_launch_shows_the_existing_overlay() {
        let fx = fixture();
        fx.shown().await;
        fx.controller.hide().await.unwrap();

        show_for_second_launch(fx.controller.clone()).await;
        show_for_second_launch(fx.controller.clone()).await;

        assert_eq!(fx.controller.state().await, OverlayState::Visible);
        assert_eq!(fx.host.created(), 1);
    }

    #[tokio::test]
    async fn second_launch_before_first_show_creates_the_window() {
        let fx = fixture();

        show_for_second_launch(fx.controller.clone()).await;
        fx.controller.on_content_loaded().await;

        assert_eq!(fx.controller.state().await, OverlayState::Visible);
        assert_eq!(fx.host.created(), 1);
    }
}
