use anyhow::{anyhow, Context, Result};
use log::{error, warn};
use tauri::{
    webview::PageLoadEvent, AppHandle, Emitter, Manager, PhysicalPosition, PhysicalSize,
    WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent,
};

use crate::{
    channel::{OnboardingPayload, OverlayEvent},
    AppState,
};

use super::{
    controller::HostEvent,
    geometry::{Display, Point, Rect},
};

pub const OVERLAY_LABEL: &str = "overlay";

/// Native window operations the controller needs. Geometry is in physical
/// pixels, except `create_window` which takes the logical panel size.
pub trait OverlayHost: Send + Sync {
    fn create_window(&self, width: f64, height: f64) -> Result<()>;
    fn cursor_position(&self) -> Option<Point>;
    fn displays(&self) -> Vec<Display>;
    fn window_bounds(&self) -> Option<Rect>;
    /// Set bounds, re-assert all-workspaces visibility, show and focus.
    fn present(&self, bounds: Rect) -> Result<()>;
    fn set_bounds(&self, bounds: Rect) -> Result<()>;
    fn focus(&self) -> Result<()>;
    fn hide(&self) -> Result<()>;
    fn emit(&self, event: &OverlayEvent);
}

pub struct TauriOverlayHost {
    app: AppHandle,
}

impl TauriOverlayHost {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn window(&self) -> Result<WebviewWindow> {
        self.app
            .get_webview_window(OVERLAY_LABEL)
            .ok_or_else(|| anyhow!("overlay window does not exist"))
    }
}

/// Queues `event` on the controller. Window callbacks fire on the event loop
/// thread and must not block on it.
fn notify_overlay(app: &AppHandle, event: HostEvent) {
    match app.try_state::<AppState>() {
        Some(state) => state.overlay.notify(event),
        None => warn!("Overlay {event:?} before app state was ready"),
    }
}

impl OverlayHost for TauriOverlayHost {
    fn create_window(&self, width: f64, height: f64) -> Result<()> {
        let window = WebviewWindowBuilder::new(
            &self.app,
            OVERLAY_LABEL,
            WebviewUrl::App("index.html".into()),
        )
        .title("QuickCap")
        .inner_size(width, height)
        .decorations(false)
        .always_on_top(true)
        .visible_on_all_workspaces(true)
        .skip_taskbar(true)
        .resizable(false)
        .visible(false)
        .on_page_load(|window, payload| {
            if payload.event() == PageLoadEvent::Finished {
                notify_overlay(window.app_handle(), HostEvent::ContentLoaded);
            }
        })
        .build()
        .context("failed to create overlay window")?;

        let app = self.app.clone();
        window.on_window_event(move |event| match event {
            WindowEvent::Focused(focused) => {
                notify_overlay(&app, HostEvent::FocusChanged(*focused));
            }
            WindowEvent::Destroyed => notify_overlay(&app, HostEvent::Destroyed),
            _ => {}
        });

        Ok(())
    }

    fn cursor_position(&self) -> Option<Point> {
        match self.app.cursor_position() {
            Ok(position) => Some(Point {
                x: position.x,
                y: position.y,
            }),
            Err(err) => {
                warn!("Cursor position unavailable: {err}");
                None
            }
        }
    }

    fn displays(&self) -> Vec<Display> {
        let monitors = match self.app.available_monitors() {
            Ok(monitors) => monitors,
            Err(err) => {
                warn!("Failed to enumerate monitors: {err}");
                return Vec::new();
            }
        };

        monitors
            .iter()
            .map(|monitor| {
                let area = monitor.work_area();
                Display {
                    work_area: Rect::new(
                        f64::from(area.position.x),
                        f64::from(area.position.y),
                        f64::from(area.size.width),
                        f64::from(area.size.height),
                    ),
                    scale_factor: monitor.scale_factor(),
                }
            })
            .collect()
    }

    fn window_bounds(&self) -> Option<Rect> {
        let window = self.window().ok()?;
        let position = window.outer_position().ok()?;
        let size = window.outer_size().ok()?;
        Some(Rect::new(
            f64::from(position.x),
            f64::from(position.y),
            f64::from(size.width),
            f64::from(size.height),
        ))
    }

    fn present(&self, bounds: Rect) -> Result<()> {
        let window = self.window()?;
        self.set_bounds(bounds)?;
        // Some platforms drop this flag while the window is hidden.
        window.set_visible_on_all_workspaces(true)?;
        window.show().context("failed to show overlay")?;
        window.set_focus().context("failed to focus overlay")?;
        Ok(())
    }

    fn set_bounds(&self, bounds: Rect) -> Result<()> {
        let window = self.window()?;
        window.set_size(PhysicalSize::new(
            bounds.width.round().max(1.0) as u32,
            bounds.height.round().max(1.0) as u32,
        ))?;
        window.set_position(PhysicalPosition::new(
            bounds.x.round() as i32,
            bounds.y.round() as i32,
        ))?;
        Ok(())
    }

    fn focus(&self) -> Result<()> {
        self.window()?
            .set_focus()
            .context("failed to focus overlay")
    }

    fn hide(&self) -> Result<()> {
        self.window()?.hide().context("failed to hide overlay")
    }

    fn emit(&self, event: &OverlayEvent) {
        let Ok(window) = self.window() else {
            return;
        };

        let result = match event {
            OverlayEvent::Onboarding(message) => window.emit(
                event.name(),
                OnboardingPayload {
                    message: message.clone(),
                },
            ),
            OverlayEvent::Shown | OverlayEvent::Hidden => window.emit(event.name(), ()),
        };
        if let Err(err) = result {
            error!("Failed to emit {}: {err}", event.name());
        }
    }
}
