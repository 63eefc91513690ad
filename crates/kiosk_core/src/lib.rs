//! Kiosk core: the item catalog, the session state and the interaction
//! controller that ties detections, guesses and resets together.

pub mod catalog;
pub mod controller;
pub mod ports;
pub mod session;

pub use catalog::{Catalog, ItemEntry};
pub use controller::{
    ControllerSettings, IgnoreReason, InteractionController, KioskEvent, Outcome,
    DEFAULT_HINT_DURATION, DEFAULT_RESET_DELAY, PRESENT_ITEM_HINT,
};
pub use ports::{
    CameraControl, DetectorControl, Detached, FeedbackPresenter, Ports, ResetTimer,
};
pub use session::{Phase, PhaseKind, SessionState};
