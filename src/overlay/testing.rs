use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use tempfile::TempDir;

use crate::{
    channel::OverlayEvent,
    config::OverlayConfig,
    first_run::{FirstRunMarker, MARKER_FILE_NAME},
    shortcuts::{registrar::testing::FakeBackend, ShortcutRegistrar},
};

use super::{
    geometry::{Display, Point, Rect},
    host::OverlayHost,
    state::OverlayState,
    OverlayController,
};

#[derive(Default)]
struct HostLog {
    created: usize,
    visible: bool,
    bounds: Option<Rect>,
    events: Vec<OverlayEvent>,
}

/// In-memory window: records what the controller asked for.
pub struct FakeHost {
    displays: Vec<Display>,
    cursor: Mutex<Option<Point>>,
    pub fail_create: bool,
    log: Mutex<HostLog>,
}

impl FakeHost {
    pub fn with_displays(displays: Vec<Display>) -> Self {
        Self {
            displays,
            cursor: Mutex::new(Some(Point { x: 900.0, y: 500.0 })),
            fail_create: false,
            log: Mutex::new(HostLog::default()),
        }
    }

    pub fn set_cursor(&self, x: f64, y: f64) {
        *self.cursor.lock().unwrap() = Some(Point { x, y });
    }

    pub fn events(&self) -> Vec<OverlayEvent> {
        self.log.lock().unwrap().events.clone()
    }

    pub fn bounds(&self) -> Rect {
        self.log.lock().unwrap().bounds.unwrap()
    }

    pub fn created(&self) -> usize {
        self.log.lock().unwrap().created
    }

    pub fn window_visible(&self) -> bool {
        self.log.lock().unwrap().visible
    }
}

impl OverlayHost for FakeHost {
    fn create_window(&self, width: f64, height: f64) -> Result<()> {
        if self.fail_create {
            bail!("no display server");
        }
        let mut log = self.log.lock().unwrap();
        log.created += 1;
        log.bounds = Some(Rect::new(0.0, 0.0, width, height));
        Ok(())
    }

    fn cursor_position(&self) -> Option<Point> {
        *self.cursor.lock().unwrap()
    }

    fn displays(&self) -> Vec<Display> {
        self.displays.clone()
    }

    fn window_bounds(&self) -> Option<Rect> {
        self.log.lock().unwrap().bounds
    }

    fn present(&self, bounds: Rect) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.bounds = Some(bounds);
        log.visible = true;
        Ok(())
    }

    fn set_bounds(&self, bounds: Rect) -> Result<()> {
        self.log.lock().unwrap().bounds = Some(bounds);
        Ok(())
    }

    fn focus(&self) -> Result<()> {
        Ok(())
    }

    fn hide(&self) -> Result<()> {
        self.log.lock().unwrap().visible = false;
        Ok(())
    }

    fn emit(&self, event: &OverlayEvent) {
        self.log.lock().unwrap().events.push(event.clone());
    }
}

pub struct Fixture {
    pub controller: OverlayController,
    pub host: Arc<FakeHost>,
    pub shortcuts: Arc<FakeBackend>,
    _dir: TempDir,
}

impl Fixture {
    pub fn live_shortcuts(&self) -> usize {
        self.shortcuts.registered.lock().unwrap().len()
    }

    /// Shows the overlay and completes the content load.
    pub async fn shown(&self) {
        self.controller.show().await.unwrap();
        self.controller.on_content_loaded().await;
        assert_eq!(self.controller.state().await, OverlayState::Visible);
    }
}

pub fn screen(x: f64, width: f64) -> Display {
    Display {
        work_area: Rect::new(x, 0.0, width, 1080.0),
        scale_factor: 1.0,
    }
}

/// Must be called inside a tokio runtime: the host event loop is spawned.
pub fn fixture_with(host: FakeHost, shortcuts: FakeBackend) -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = OverlayConfig::default();
    let host = Arc::new(host);
    let shortcuts = Arc::new(shortcuts);
    let registrar = Arc::new(ShortcutRegistrar::new(Box::new(shortcuts.clone()), &config));
    let first_run = Arc::new(FirstRunMarker::new(dir.path().join(MARKER_FILE_NAME)));

    let controller = OverlayController::new(host.clone(), registrar, first_run, config);
    if let Some(host_events) = controller.host_event_loop() {
        tokio::spawn(host_events);
    }

    Fixture {
        controller,
        host,
        shortcuts,
        _dir: dir,
    }
}

pub fn fixture() -> Fixture {
    fixture_with(
        FakeHost::with_displays(vec![screen(0.0, 1920.0)]),
        FakeBackend::default(),
    )
}
