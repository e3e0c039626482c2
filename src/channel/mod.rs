//! Contract between the native side and the capture surface: request/response
//! commands, fire-and-forget commands, and pushed events.

pub mod commands;

use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

pub const EVENT_SHOWN: &str = "overlay://shown";
pub const EVENT_HIDDEN: &str = "overlay://hidden";
pub const EVENT_ONBOARDING: &str = "overlay://onboarding";

/// Notifications pushed to the capture surface. Only the overlay state
/// machine produces these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    Shown,
    Hidden,
    Onboarding(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingPayload {
    pub message: String,
}

impl OverlayEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OverlayEvent::Shown => EVENT_SHOWN,
            OverlayEvent::Hidden => EVENT_HIDDEN,
            OverlayEvent::Onboarding(_) => EVENT_ONBOARDING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    Storage,
    Overlay,
}

/// Failure shape the capture surface renders. Backend errors never cross the
/// boundary in any other form.
#[derive(Debug, Clone, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct CommandError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CommandError {
    pub fn overlay(err: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Overlay,
            message: format!("{err:#}"),
        }
    }
}

impl From<StorageError> for CommandError {
    fn from(err: StorageError) -> Self {
        let kind = match err {
            StorageError::EmptyNote => ErrorKind::Validation,
            StorageError::Write(_) | StorageError::Read(_) => ErrorKind::Storage,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}
