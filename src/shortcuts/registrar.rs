use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use anyhow::Result;
use log::{debug, info, warn};

use crate::config::OverlayConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    Toggle,
    /// Deltas in logical pixels.
    Nudge { dx: f64, dy: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShortcutBinding {
    pub accelerator: String,
    pub action: ShortcutAction,
}

/// OS-level registration of key combinations.
pub trait ShortcutBackend: Send + Sync {
    fn register(&self, accelerator: &str) -> Result<()>;
    fn unregister(&self, accelerator: &str) -> Result<()>;
    fn unregister_all(&self) -> Result<()>;
}

pub fn toggle_binding(config: &OverlayConfig) -> ShortcutBinding {
    ShortcutBinding {
        accelerator: config.toggle_shortcut.clone(),
        action: ShortcutAction::Toggle,
    }
}

/// Four arrows with a small step, the same four with Shift for a large step.
pub fn nudge_bindings(config: &OverlayConfig) -> Vec<ShortcutBinding> {
    let arrows = [
        ("ArrowLeft", -1.0, 0.0),
        ("ArrowRight", 1.0, 0.0),
        ("ArrowUp", 0.0, -1.0),
        ("ArrowDown", 0.0, 1.0),
    ];

    let mut bindings = Vec::with_capacity(arrows.len() * 2);
    for (prefix, step) in [
        ("CommandOrControl+Alt", config.nudge_step),
        ("CommandOrControl+Alt+Shift", config.nudge_step_large),
    ] {
        for (key, ux, uy) in arrows {
            bindings.push(ShortcutBinding {
                accelerator: format!("{prefix}+{key}"),
                action: ShortcutAction::Nudge {
                    dx: ux * step,
                    dy: uy * step,
                },
            });
        }
    }
    bindings
}

/// Tracks which bindings are live and guarantees they can all be released.
///
/// Registration failures are logged and skipped; the rest of the bindings
/// keep working.
///
/// The backend may block on the thread that delivers key presses, and that
/// thread reads `live` through [`ShortcutRegistrar::action_for`]. `live` is
/// therefore never held across a backend call; `ops` serializes the
/// registration sequences instead.
pub struct ShortcutRegistrar {
    backend: Box<dyn ShortcutBackend>,
    toggle: ShortcutBinding,
    nudges: Vec<ShortcutBinding>,
    live: Mutex<HashSet<String>>,
    ops: Mutex<()>,
}

impl ShortcutRegistrar {
    pub fn new(backend: Box<dyn ShortcutBackend>, config: &OverlayConfig) -> Self {
        Self {
            backend,
            toggle: toggle_binding(config),
            nudges: nudge_bindings(config),
            live: Mutex::new(HashSet::new()),
            ops: Mutex::new(()),
        }
    }

    pub fn bind_toggle(&self) -> bool {
        let _ops = lock(&self.ops);
        let toggle = self.toggle.accelerator.clone();
        let bound = self.rebind(&toggle);
        if bound {
            info!("Toggle shortcut {toggle} registered");
        }
        bound
    }

    /// Unregister-then-register each nudge combination so repeated calls never
    /// stack duplicate bindings. Returns how many are live afterwards.
    pub fn bind_nudges(&self) -> usize {
        let _ops = lock(&self.ops);
        let accelerators: Vec<String> =
            self.nudges.iter().map(|b| b.accelerator.clone()).collect();
        accelerators
            .iter()
            .filter(|accelerator| self.rebind(accelerator))
            .count()
    }

    pub fn release_nudges(&self) {
        let _ops = lock(&self.ops);
        for binding in &self.nudges {
            self.release(&binding.accelerator);
        }
    }

    /// Releases every combination this process holds. Safe to call more than
    /// once and regardless of window state.
    pub fn release_all(&self) {
        let _ops = lock(&self.ops);
        let held: Vec<String> = self.live().drain().collect();
        for accelerator in &held {
            if let Err(err) = self.backend.unregister(accelerator) {
                debug!("Unregister of {accelerator} during teardown failed: {err:#}");
            }
        }
        if let Err(err) = self.backend.unregister_all() {
            warn!("Failed to release global shortcuts: {err:#}");
        }
        info!("Released {} global shortcut(s)", held.len());
    }

    #[cfg(test)]
    pub fn is_live(&self, accelerator: &str) -> bool {
        self.live().contains(accelerator)
    }

    /// Finds the action of the live binding that `matches` accepts.
    pub fn action_for(&self, matches: impl Fn(&str) -> bool) -> Option<ShortcutAction> {
        let live = self.live();
        std::iter::once(&self.toggle)
            .chain(self.nudges.iter())
            .filter(|binding| live.contains(&binding.accelerator))
            .find(|binding| matches(&binding.accelerator))
            .map(|binding| binding.action)
    }

    fn rebind(&self, accelerator: &str) -> bool {
        let was_live = self.live().remove(accelerator);
        if was_live {
            if let Err(err) = self.backend.unregister(accelerator) {
                debug!("Unregister of {accelerator} before rebinding failed: {err:#}");
            }
        }
        match self.backend.register(accelerator) {
            Ok(()) => {
                self.live().insert(accelerator.to_string());
                true
            }
            Err(err) => {
                warn!("Shortcut {accelerator} unavailable: {err:#}");
                false
            }
        }
    }

    fn release(&self, accelerator: &str) {
        if !self.live().remove(accelerator) {
            return;
        }
        if let Err(err) = self.backend.unregister(accelerator) {
            warn!("Failed to unregister {accelerator}: {err:#}");
        }
    }

    fn live(&self) -> MutexGuard<'_, HashSet<String>> {
        lock(&self.live)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use anyhow::{bail, Result};

    use super::ShortcutBackend;

    /// Records registrations; accelerators in `claimed` belong to another app.
    #[derive(Default)]
    pub struct FakeBackend {
        pub registered: Mutex<Vec<String>>,
        pub claimed: Vec<String>,
    }

    impl ShortcutBackend for Arc<FakeBackend> {
        fn register(&self, accelerator: &str) -> Result<()> {
            if self.claimed.iter().any(|c| c == accelerator) {
                bail!("{accelerator} is already registered by another application");
            }
            let mut registered = self.registered.lock().unwrap();
            if registered.iter().any(|r| r == accelerator) {
                bail!("{accelerator} registered twice");
            }
            registered.push(accelerator.to_string());
            Ok(())
        }

        fn unregister(&self, accelerator: &str) -> Result<()> {
            self.registered.lock().unwrap().retain(|r| r != accelerator);
            Ok(())
        }

        fn unregister_all(&self) -> Result<()> {
            self.registered.lock().unwrap().clear();
            Ok(())
        }
    }
}
