pub mod controller;
pub mod geometry;
pub mod host;
pub mod state;
#[cfg(test)]
pub(crate) mod testing;

pub use controller::OverlayController;
pub use host::TauriOverlayHost;
