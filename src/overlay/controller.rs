use std::{
    future::Future,
    sync::{Arc, Mutex as StdMutex},
};

use anyhow::Result;
use log::{debug, error, info};
use tokio::{
    sync::{mpsc, Mutex},
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;

use crate::{
    channel::OverlayEvent, config::OverlayConfig, first_run::FirstRunMarker,
    shortcuts::ShortcutRegistrar,
};

use super::{
    geometry::{self, Display, Rect},
    host::OverlayHost,
    state::{OverlayState, ScheduledHide, WindowSession},
};

/// Notifications from the native window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    ContentLoaded,
    FocusChanged(bool),
    Destroyed,
}

type HostEventReceiver = mpsc::UnboundedReceiver<HostEvent>;

/// Owns the single overlay window and every transition it goes through.
///
/// All methods are cheap to call from any task; transitions are serialized by
/// the session lock. `None` in the session slot is the `Unborn` state.
#[derive(Clone)]
pub struct OverlayController {
    session: Arc<Mutex<Option<WindowSession>>>,
    host: Arc<dyn OverlayHost>,
    shortcuts: Arc<ShortcutRegistrar>,
    first_run: Arc<FirstRunMarker>,
    config: Arc<OverlayConfig>,
    lifetime: CancellationToken,
    host_events: mpsc::UnboundedSender<HostEvent>,
    host_events_rx: Arc<StdMutex<Option<HostEventReceiver>>>,
}

impl OverlayController {
    pub fn new(
        host: Arc<dyn OverlayHost>,
        shortcuts: Arc<ShortcutRegistrar>,
        first_run: Arc<FirstRunMarker>,
        config: OverlayConfig,
    ) -> Self {
        let (host_events, host_events_rx) = mpsc::unbounded_channel();
        Self {
            session: Arc::new(Mutex::new(None)),
            host,
            shortcuts,
            first_run,
            config: Arc::new(config),
            lifetime: CancellationToken::new(),
            host_events,
            host_events_rx: Arc::new(StdMutex::new(Some(host_events_rx))),
        }
    }

    pub fn shortcuts(&self) -> &ShortcutRegistrar {
        &self.shortcuts
    }

    /// Binds the toggle shortcut for the rest of the process.
    pub fn start(&self) {
        if !self.shortcuts.bind_toggle() {
            info!("Overlay reachable from the tray only");
        }
    }

    /// Releases every shortcut and stops all timers. Does not touch the window
    /// lock, so it is safe while the window is mid-transition or already gone.
    pub fn shutdown(&self) {
        self.lifetime.cancel();
        self.shortcuts.release_all();
        info!("Overlay controller shut down");
    }

    /// Queues a window notification. Queued notifications are applied one
    /// at a time, in the order they were queued.
    pub fn notify(&self, event: HostEvent) {
        if self.host_events.send(event).is_err() {
            debug!("Dropping {event:?}: host event loop has stopped");
        }
    }

    /// The task that applies queued notifications until shutdown. Only the
    /// first call receives it.
    pub fn host_event_loop(&self) -> Option<impl Future<Output = ()> + Send + 'static> {
        let mut events = {
            let mut slot = match self.host_events_rx.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            slot.take()?
        };

        let controller = self.clone();
        Some(async move {
            loop {
                tokio::select! {
                    _ = controller.lifetime.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => controller.apply_host_event(event).await,
                        None => break,
                    },
                }
            }
            debug!("Host event loop stopped");
        })
    }

    pub async fn state(&self) -> OverlayState {
        match self.session.lock().await.as_ref() {
            Some(session) => session.state(),
            None => OverlayState::Unborn,
        }
    }

    pub async fn show(&self) -> Result<()> {
        let mut guard = self.session.lock().await;
        self.show_locked(&mut guard)
    }

    /// Safe to call when already hidden or never shown.
    pub async fn hide(&self) -> Result<()> {
        let mut guard = self.session.lock().await;
        match guard.as_mut() {
            Some(session) => self.hide_session(session),
            None => Ok(()),
        }
    }

    pub async fn toggle(&self) -> Result<()> {
        let mut guard = self.session.lock().await;
        let visible = guard.as_ref().is_some_and(|session| session.visible);
        if visible {
            if let Some(session) = guard.as_mut() {
                return self.hide_session(session);
            }
        }
        self.show_locked(&mut guard)
    }

    /// Moves the window by a logical delta, staying on whichever display it
    /// overlaps most. No-op without a window.
    pub async fn nudge(&self, dx: f64, dy: f64) -> Result<()> {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            debug!("Nudge ignored: no overlay window");
            return Ok(());
        };
        let Some(bounds) = self.host.window_bounds() else {
            debug!("Nudge ignored: window bounds unavailable");
            return Ok(());
        };

        let displays = self.host.displays();
        let display =
            geometry::display_overlapping(&displays, bounds).unwrap_or_else(Display::fallback);
        let scale = display.scale();
        let next = geometry::translate_within(bounds, dx * scale, dy * scale, &display);
        self.host.set_bounds(next)?;

        // Moving the window can bounce focus; don't let that hide it.
        session.cancel_auto_hide();
        session.suppress_auto_hide_until(Instant::now() + self.config.nudge_grace);
        if session.visible {
            self.host.focus()?;
        }
        Ok(())
    }

    pub async fn on_focus_changed(&self, focused: bool) {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            return;
        };
        session.focused = focused;

        if focused {
            if session.cancel_auto_hide() {
                debug!("Focus regained; auto-hide cancelled");
            }
            return;
        }

        if !session.visible {
            return;
        }
        if session.auto_hide_suppressed(Instant::now()) {
            debug!("Blur during nudge grace window; staying visible");
            return;
        }
        self.schedule_auto_hide(session);
    }

    pub async fn on_content_loaded(&self) {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            return;
        };
        session.loaded = true;

        if session.present_pending {
            debug!("Content loaded; presenting deferred show");
            if let Err(err) = self.present(session) {
                error!("Failed to present overlay after load: {err:#}");
            }
        }
    }

    /// The OS closed the window. The next show creates a fresh one.
    pub async fn on_window_destroyed(&self) {
        let mut guard = self.session.lock().await;
        if guard.take().is_some() {
            self.shortcuts.release_nudges();
            info!("Overlay window destroyed");
        }
    }

    async fn apply_host_event(&self, event: HostEvent) {
        match event {
            HostEvent::ContentLoaded => self.on_content_loaded().await,
            HostEvent::FocusChanged(focused) => self.on_focus_changed(focused).await,
            HostEvent::Destroyed => self.on_window_destroyed().await,
        }
    }

    fn show_locked(&self, slot: &mut Option<WindowSession>) -> Result<()> {
        if slot.is_none() {
            self.host
                .create_window(self.config.panel_width, self.config.panel_height)?;
            info!("Overlay window created");
        }
        let session = slot.get_or_insert_with(WindowSession::new);

        if session.visible {
            return self.host.focus();
        }
        if !session.loaded {
            session.present_pending = true;
            debug!("Overlay content still loading; show deferred");
            return Ok(());
        }
        self.present(session)
    }

    fn present(&self, session: &mut WindowSession) -> Result<()> {
        let bounds = self.compute_bounds();
        self.host.present(bounds)?;

        session.present_pending = false;
        session.visible = true;
        session.focused = true;

        self.host.emit(&OverlayEvent::Shown);
        if let Some(message) = self.first_run.take_pending() {
            self.host.emit(&OverlayEvent::Onboarding(message));
        }

        // After shutdown every shortcut stays released.
        if self.lifetime.is_cancelled() {
            debug!("Overlay shown at {bounds:?} during shutdown");
        } else {
            let live = self.shortcuts.bind_nudges();
            debug!("Overlay shown at {bounds:?}; {live} nudge shortcut(s) live");
        }
        Ok(())
    }

    fn hide_session(&self, session: &mut WindowSession) -> Result<()> {
        session.cancel_auto_hide();
        session.present_pending = false;
        if !session.visible {
            return Ok(());
        }

        self.host.hide()?;
        session.visible = false;
        session.focused = false;

        self.host.emit(&OverlayEvent::Hidden);
        self.shortcuts.release_nudges();
        debug!("Overlay hidden");
        Ok(())
    }

    /// Fresh placement on every show: centered on the pointer, clamped to the
    /// display nearest to it.
    fn compute_bounds(&self) -> Rect {
        let displays = self.host.displays();
        let pointer = self.host.cursor_position();

        let display = pointer
            .and_then(|p| geometry::display_nearest(&displays, p))
            .or_else(|| displays.first().copied())
            .unwrap_or_else(Display::fallback);
        let scale = display.scale();

        geometry::place_near_pointer(
            &display,
            pointer,
            self.config.panel_width * scale,
            self.config.panel_height * scale,
        )
    }

    fn schedule_auto_hide(&self, session: &mut WindowSession) {
        session.cancel_auto_hide();

        let generation = session.next_generation();
        let token = self.lifetime.child_token();
        let cancelled = token.clone();
        let delay = self.config.auto_hide_delay;
        let controller = self.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = time::sleep(delay) => controller.auto_hide_elapsed(generation).await,
            }
        });

        session.arm_auto_hide(ScheduledHide::new(token, generation));
    }

    async fn auto_hide_elapsed(&self, generation: u64) {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut() else {
            return;
        };
        if !session.claim_elapsed(generation) || session.focused {
            return;
        }

        debug!("Focus lost; auto-hiding overlay");
        if let Err(err) = self.hide_session(session) {
            error!("Auto-hide failed: {err:#}");
        }
    }
}
