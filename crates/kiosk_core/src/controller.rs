//! Interaction controller: the detect → guess → reset state machine.

use std::{sync::Arc, time::Duration};

use shared::domain::{ButtonVisual, Category, Reaction};
use tracing::{debug, info, warn};

use crate::{
    catalog::Catalog,
    ports::Ports,
    session::{PhaseKind, SessionState},
};

pub const DEFAULT_RESET_DELAY: Duration = Duration::from_millis(3500);
pub const DEFAULT_HINT_DURATION: Duration = Duration::from_millis(2000);
pub const PRESENT_ITEM_HINT: &str =
    "Please put an item up to the camera before selecting a category";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskEvent {
    Detected(String),
    Guess(Category),
    ResetTimerFired,
    Close,
}

impl KioskEvent {
    fn name(&self) -> &'static str {
        match self {
            KioskEvent::Detected(_) => "detected",
            KioskEvent::Guess(_) => "guess",
            KioskEvent::ResetTimerFired => "reset_timer",
            KioskEvent::Close => "close",
        }
    }
}

/// Why an event left the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Detected label has no catalog entry.
    UnknownLabel,
    /// A detection arrived while an item is already on screen.
    Busy,
    /// Category was already guessed for this item.
    AlreadyAttempted,
    /// The right bin was already found; a reset is pending.
    AlreadyResolved,
    /// Reset fired while nothing was resolved.
    StaleTimer,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Evaluating { label: String },
    /// A guess without an item; the user was told to present one.
    HintShown,
    Wrong(Category),
    Resolved(Category),
    Reset,
    Closed,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub reset_delay: Duration,
    pub hint_duration: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            reset_delay: DEFAULT_RESET_DELAY,
            hint_duration: DEFAULT_HINT_DURATION,
        }
    }
}

pub struct InteractionController {
    catalog: Arc<Catalog>,
    session: SessionState,
    settings: ControllerSettings,
}

impl InteractionController {
    pub fn new(catalog: Arc<Catalog>, settings: ControllerSettings) -> Self {
        Self {
            catalog,
            session: SessionState::new(),
            settings,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> ControllerSettings {
        self.settings
    }

    /// Applies one event. Callers deliver events one at a time in arrival
    /// order; every transition happens here.
    pub fn handle(&mut self, event: KioskEvent, ports: &mut Ports<'_>) -> Outcome {
        let event_name = event.name();
        let before = self.session.kind();
        let outcome = if before == PhaseKind::Closed {
            Outcome::Ignored(IgnoreReason::Closed)
        } else {
            match event {
                KioskEvent::Detected(label) => self.on_detected(label, ports),
                KioskEvent::Guess(category) => self.on_guess(category, ports),
                KioskEvent::ResetTimerFired => self.on_reset_timer(ports),
                KioskEvent::Close => self.on_close(ports),
            }
        };

        match &outcome {
            Outcome::Ignored(reason) => {
                debug!(event = event_name, phase = before.as_str(), ?reason, "event ignored")
            }
            _ => info!(
                event = event_name,
                from = before.as_str(),
                to = self.session.kind().as_str(),
                ?outcome,
                "session transition"
            ),
        }
        outcome
    }

    fn on_detected(&mut self, label: String, ports: &mut Ports<'_>) -> Outcome {
        if self.session.kind() != PhaseKind::Idle {
            return Outcome::Ignored(IgnoreReason::Busy);
        }
        let Some(entry) = self.catalog.get(&label) else {
            warn!(label = %label, "detected label missing from catalog; dropping detection");
            return Outcome::Ignored(IgnoreReason::UnknownLabel);
        };

        ports.detector.pause_detection();
        ports.camera.stop_feed();
        ports.presenter.clear_text();
        ports.presenter.show_title(&entry.curious_prompt, None);
        ports.presenter.set_reaction(Reaction::Curious {
            item_name: entry.display_name.clone(),
        });

        self.session.begin(label.clone());
        Outcome::Evaluating { label }
    }

    fn on_guess(&mut self, category: Category, ports: &mut Ports<'_>) -> Outcome {
        let label = match self.session.kind() {
            PhaseKind::Idle => {
                ports
                    .presenter
                    .show_title(PRESENT_ITEM_HINT, Some(self.settings.hint_duration));
                return Outcome::HintShown;
            }
            PhaseKind::Resolved => return Outcome::Ignored(IgnoreReason::AlreadyResolved),
            PhaseKind::Closed => return Outcome::Ignored(IgnoreReason::Closed),
            PhaseKind::Evaluating => self.session.current_label().unwrap_or_default().to_string(),
        };

        if self.session.has_attempted(category) {
            return Outcome::Ignored(IgnoreReason::AlreadyAttempted);
        }
        let Some(entry) = self.catalog.get(&label) else {
            warn!(label = %label, "item under evaluation vanished from catalog");
            return Outcome::Ignored(IgnoreReason::UnknownLabel);
        };

        self.session.record_attempt(category);
        let correct = entry.category == category;
        let (title, body) = entry.feedback_for(category);

        ports.presenter.set_button(
            category,
            if correct {
                ButtonVisual::Correct
            } else {
                ButtonVisual::Wrong
            },
        );
        ports
            .presenter
            .set_reaction(if correct { Reaction::Happy } else { Reaction::Sad });
        ports.presenter.clear_text();
        ports.presenter.show_title(title, None);
        ports.presenter.show_body(body);

        if correct {
            self.session.resolve();
            ports.timer.arm_reset(self.settings.reset_delay);
            Outcome::Resolved(category)
        } else {
            Outcome::Wrong(category)
        }
    }

    fn on_reset_timer(&mut self, ports: &mut Ports<'_>) -> Outcome {
        if self.session.kind() != PhaseKind::Resolved {
            return Outcome::Ignored(IgnoreReason::StaleTimer);
        }

        self.session.reset();
        ports.presenter.set_reaction(Reaction::Idle);
        for category in Category::ALL {
            ports.presenter.set_button(category, ButtonVisual::Default);
        }
        ports.presenter.clear_text();
        ports.camera.start_feed();
        ports.detector.resume_detection();
        Outcome::Reset
    }

    fn on_close(&mut self, ports: &mut Ports<'_>) -> Outcome {
        ports.detector.stop_detection();
        ports.camera.release_camera();
        self.session.close();
        Outcome::Closed
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
