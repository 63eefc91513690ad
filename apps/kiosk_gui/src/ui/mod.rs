//! Kiosk window: camera view, character panel, guess buttons and the
//! adapters that let the interaction controller drive them.

pub mod app;
pub mod camera;
pub mod feedback;
pub mod theme;
pub mod timer;

pub use app::KioskApp;
