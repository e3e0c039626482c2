use log::{error, info};
use tauri::{
    menu::{Menu, MenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager,
};

use crate::AppState;

const TRAY_ID: &str = "quickcap";
const MENU_SHOW: &str = "show";
const MENU_QUIT: &str = "quit";

#[derive(Debug, Clone, Copy)]
enum TrayAction {
    Show,
    Toggle,
}

pub fn install(app: &AppHandle) -> tauri::Result<()> {
    let show_item = MenuItem::with_id(app, MENU_SHOW, "Show", true, None::<&str>)?;
    let quit_item = MenuItem::with_id(app, MENU_QUIT, "Quit", true, None::<&str>)?;
    let menu = Menu::with_items(app, &[&show_item, &quit_item])?;

    let mut builder = TrayIconBuilder::with_id(TRAY_ID)
        .tooltip("QuickCap")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(|app, event| match event.id.as_ref() {
            MENU_SHOW => dispatch(app, TrayAction::Show),
            MENU_QUIT => quit(app),
            _ => {}
        })
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                dispatch(tray.app_handle(), TrayAction::Toggle);
            }
        });

    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone());
    }
    builder.build(app)?;

    Ok(())
}

fn dispatch(app: &AppHandle, action: TrayAction) {
    let Some(state) = app.try_state::<AppState>() else {
        return;
    };

    let overlay = state.overlay.clone();
    tauri::async_runtime::spawn(async move {
        let result = match action {
            TrayAction::Show => overlay.show().await,
            TrayAction::Toggle => overlay.toggle().await,
        };
        if let Err(err) = result {
            error!("Tray {action:?} failed: {err:#}");
        }
    });
}

fn quit(app: &AppHandle) {
    info!("Quit requested from tray");
    if let Some(state) = app.try_state::<AppState>() {
        state.overlay.shutdown();
    }
    app.exit(0);
}
