use std::collections::BTreeSet;

use shared::domain::Category;

/// Where the kiosk is in the detect → guess → reset cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Camera live, detector active, nothing under evaluation.
    #[default]
    Idle,
    /// An item was detected and the kiosk waits for guesses.
    Evaluating {
        label: String,
        attempted: BTreeSet<Category>,
    },
    /// The right bin was picked; the reset timer is running.
    Resolved {
        label: String,
        attempted: BTreeSet<Category>,
    },
    /// Window closed. Terminal.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Idle,
    Evaluating,
    Resolved,
    Closed,
}

impl PhaseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::Idle => "idle",
            PhaseKind::Evaluating => "evaluating",
            PhaseKind::Resolved => "resolved",
            PhaseKind::Closed => "closed",
        }
    }
}

/// Mutable session owned by the controller. Label and attempted set live
/// inside the phase so they can only be cleared together.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    phase: Phase,
}

static NO_ATTEMPTS: BTreeSet<Category> = BTreeSet::new();

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn kind(&self) -> PhaseKind {
        match self.phase {
            Phase::Idle => PhaseKind::Idle,
            Phase::Evaluating { .. } => PhaseKind::Evaluating,
            Phase::Resolved { .. } => PhaseKind::Resolved,
            Phase::Closed => PhaseKind::Closed,
        }
    }

    pub fn current_label(&self) -> Option<&str> {
        match &self.phase {
            Phase::Evaluating { label, .. } | Phase::Resolved { label, .. } => Some(label),
            Phase::Idle | Phase::Closed => None,
        }
    }

    pub fn attempted(&self) -> &BTreeSet<Category> {
        match &self.phase {
            Phase::Evaluating { attempted, .. } | Phase::Resolved { attempted, .. } => attempted,
            Phase::Idle | Phase::Closed => &NO_ATTEMPTS,
        }
    }

    pub fn has_attempted(&self, category: Category) -> bool {
        self.attempted().contains(&category)
    }

    pub(crate) fn begin(&mut self, label: String) {
        self.phase = Phase::Evaluating {
            label,
            attempted: BTreeSet::new(),
        };
    }

    /// Records a guess. Returns `false` when there is no item under
    /// evaluation or the category was already tried.
    pub(crate) fn record_attempt(&mut self, category: Category) -> bool {
        match &mut self.phase {
            Phase::Evaluating { attempted, .. } => attempted.insert(category),
            _ => false,
        }
    }

    pub(crate) fn resolve(&mut self) {
        self.phase = match std::mem::take(&mut self.phase) {
            Phase::Evaluating { label, attempted } => Phase::Resolved { label, attempted },
            other => other,
        };
    }

    pub(crate) fn reset(&mut self) {
        if self.phase != Phase::Closed {
            self.phase = Phase::Idle;
        }
    }

    pub(crate) fn close(&mut self) {
        self.phase = Phase::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_session_has_no_label_and_no_attempts() {
        let session = SessionState::new();
        assert_eq!(session.kind(), PhaseKind::Idle);
        assert_eq!(session.current_label(), None);
        assert!(session.attempted().is_empty());
    }

    #[test]
    fn attempts_are_recorded_once_per_category() {
        let mut session = SessionState::new();
        session.begin("soda_can".to_string());

        assert!(session.record_attempt(Category::Waste));
        assert!(!session.record_attempt(Category::Waste));
        assert!(session.has_attempted(Category::Waste));
        assert!(!session.has_attempted(Category::Recyclable));
    }

    #[test]
    fn attempts_are_rejected_without_an_item() {
        let mut session = SessionState::new();
        assert!(!session.record_attempt(Category::Compostable));
        assert!(session.attempted().is_empty());
    }

    #[test]
    fn reset_clears_label_and_attempts_together() {
        let mut session = SessionState::new();
        session.begin("soda_can".to_string());
        session.record_attempt(Category::Waste);
        session.record_attempt(Category::Recyclable);
        session.resolve();
        assert_eq!(session.kind(), PhaseKind::Resolved);
        assert_eq!(session.current_label(), Some("soda_can"));
        assert_eq!(session.attempted().len(), 2);

        session.reset();
        assert_eq!(session.kind(), PhaseKind::Idle);
        assert_eq!(session.current_label(), None);
        assert!(session.attempted().is_empty());
    }

    #[test]
    fn resolve_only_applies_while_evaluating() {
        let mut session = SessionState::new();
        session.resolve();
        assert_eq!(session.kind(), PhaseKind::Idle);
    }

    #[test]
    fn closed_session_stays_closed() {
        let mut session = SessionState::new();
        session.begin("soda_can".to_string());
        session.close();
        session.reset();
        assert_eq!(session.kind(), PhaseKind::Closed);
    }
}
