use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OverlayState {
    /// No native window exists.
    Unborn,
    Hidden,
    Visible,
}

/// Cancellable handle to a pending auto-hide.
#[derive(Debug)]
pub struct ScheduledHide {
    token: CancellationToken,
    generation: u64,
}

impl ScheduledHide {
    pub fn new(token: CancellationToken, generation: u64) -> Self {
        Self { token, generation }
    }
}

/// Everything tied to one native window. Dropped when the OS destroys it.
#[derive(Debug, Default)]
pub struct WindowSession {
    /// Content finished loading; presenting before this shows a blank frame.
    pub loaded: bool,
    /// A show arrived while loading and runs once loading completes.
    pub present_pending: bool,
    pub visible: bool,
    pub focused: bool,
    auto_hide: Option<ScheduledHide>,
    suppress_until: Option<Instant>,
    generation: u64,
}

impl WindowSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OverlayState {
        if self.visible {
            OverlayState::Visible
        } else {
            OverlayState::Hidden
        }
    }

    /// Id for the next auto-hide; a timer only acts if its id is still current.
    pub fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Replaces any pending auto-hide. The previous one is cancelled first.
    pub fn arm_auto_hide(&mut self, hide: ScheduledHide) {
        self.cancel_auto_hide();
        self.auto_hide = Some(hide);
    }

    /// Returns whether a timer was pending.
    pub fn cancel_auto_hide(&mut self) -> bool {
        match self.auto_hide.take() {
            Some(hide) => {
                hide.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Claims the pending auto-hide if `generation` is still the live one.
    pub fn claim_elapsed(&mut self, generation: u64) -> bool {
        match &self.auto_hide {
            Some(hide) if hide.generation == generation => {
                self.auto_hide = None;
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub fn has_pending_auto_hide(&self) -> bool {
        self.auto_hide.is_some()
    }

    pub fn suppress_auto_hide_until(&mut self, deadline: Instant) {
        self.suppress_until = Some(deadline);
    }

    pub fn auto_hide_suppressed(&mut self, now: Instant) -> bool {
        match self.suppress_until {
            Some(deadline) if now < deadline => true,
            Some(_) => {
                self.suppress_until = None;
                false
            }
            None => false,
        }
    }
}

impl Drop for WindowSession {
    fn drop(&mut self) {
        self.cancel_auto_hide();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn arming_cancels_the_previous_timer() {
        let mut session = WindowSession::new();
        let first = CancellationToken::new();
        let gen1 = session.next_generation();
        session.arm_auto_hide(ScheduledHide::new(first.clone(), gen1));

        let second = CancellationToken::new();
        let gen2 = session.next_generation();
        session.arm_auto_hide(ScheduledHide::new(second.clone(), gen2));

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!session.claim_elapsed(gen1));
        assert!(session.claim_elapsed(gen2));
        assert!(!session.has_pending_auto_hide());
    }

    #[test]
    fn dropping_a_session_cancels_its_timer() {
        let token = CancellationToken::new();
        {
            let mut session = WindowSession::new();
            let generation = session.next_generation();
            session.arm_auto_hide(ScheduledHide::new(token.clone(), generation));
        }
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn suppression_expires() {
        let mut session = WindowSession::new();
        let now = Instant::now();
        session.suppress_auto_hide_until(now + Duration::from_millis(400));

        assert!(session.auto_hide_suppressed(now));
        assert!(session.auto_hide_suppressed(now + Duration::from_millis(399)));
        assert!(!session.auto_hide_suppressed(now + Duration::from_millis(400)));
        assert!(!session.auto_hide_suppressed(now));
    }

    #[test]
    fn state_tracks_visibility() {
        let mut session = WindowSession::new();
        assert_eq!(session.state(), OverlayState::Hidden);
        session.visible = true;
        assert_eq!(session.state(), OverlayState::Visible);
    }
}
