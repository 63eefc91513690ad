//! Seams between the controller and the pieces it drives. The controller
//! only ever talks to collaborators through these traits.

use std::time::Duration;

use shared::domain::{ButtonVisual, Category, Reaction};

pub trait DetectorControl {
    fn pause_detection(&mut self);
    fn resume_detection(&mut self);
    fn stop_detection(&mut self);
}

pub trait CameraControl {
    fn start_feed(&mut self);
    fn stop_feed(&mut self);
    fn release_camera(&mut self);
}

pub trait FeedbackPresenter {
    fn set_button(&mut self, category: Category, visual: ButtonVisual);
    fn set_reaction(&mut self, reaction: Reaction);
    /// `expires_after` removes the title again once elapsed.
    fn show_title(&mut self, text: &str, expires_after: Option<Duration>);
    fn show_body(&mut self, text: &str);
    fn clear_text(&mut self);
}

pub trait ResetTimer {
    fn arm_reset(&mut self, delay: Duration);
}

/// Borrowed collaborators for one dispatch.
pub struct Ports<'a> {
    pub detector: &'a mut dyn DetectorControl,
    pub camera: &'a mut dyn CameraControl,
    pub presenter: &'a mut dyn FeedbackPresenter,
    pub timer: &'a mut dyn ResetTimer,
}

/// Collaborator that ignores every call. Used where a surface is absent,
/// e.g. headless replays without a camera.
#[derive(Debug, Default, Clone, Copy)]
pub struct Detached;

impl DetectorControl for Detached {
    fn pause_detection(&mut self) {}
    fn resume_detection(&mut self) {}
    fn stop_detection(&mut self) {}
}

impl CameraControl for Detached {
    fn start_feed(&mut self) {}
    fn stop_feed(&mut self) {}
    fn release_camera(&mut self) {}
}
