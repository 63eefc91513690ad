use std::time::{Duration, Instant};

use eframe::egui;
use kiosk_core::{IgnoreReason, InteractionController, KioskEvent, Outcome, PhaseKind, Ports};

use crate::controller::{
    events::{error_label, UiError, UiErrorCategory, UiErrorContext, UiEvent},
    orchestration::DetectorHandle,
};
use crate::ui::{camera::CameraView, feedback::FeedbackView, theme, timer::ResetDeadline};

const CHARACTER_PANEL_WIDTH: f32 = 380.0;
const BUTTON_PANEL_HEIGHT: f32 = 96.0;
const BODY_RESERVE: f32 = 120.0;
const IDLE_REPAINT: Duration = Duration::from_millis(100);
const MIN_REPAINT: Duration = Duration::from_millis(16);

pub struct KioskApp {
    controller: InteractionController,
    detector: DetectorHandle,
    camera: CameraView,
    feedback: FeedbackView,
    reset_timer: ResetDeadline,
    status_banner: Option<UiError>,
    camera_poll: Duration,
    theme_applied: bool,
}

impl KioskApp {
    pub fn new(
        controller: InteractionController,
        detector: DetectorHandle,
        camera: CameraView,
        camera_poll: Duration,
    ) -> Self {
        Self {
            controller,
            detector,
            camera,
            feedback: FeedbackView::default(),
            reset_timer: ResetDeadline::default(),
            status_banner: None,
            camera_poll,
            theme_applied: false,
        }
    }

    fn dispatch(&mut self, event: KioskEvent) -> Outcome {
        let mut ports = Ports {
            detector: &mut self.detector,
            camera: &mut self.camera,
            presenter: &mut self.feedback,
            timer: &mut self.reset_timer,
        };
        let outcome = self.controller.handle(event, &mut ports);
        if let Some(err) = self.detector.take_error() {
            self.report(err);
        }
        outcome
    }

    fn report(&mut self, err: UiError) {
        let context = err.context();
        let paused = self.detector.is_paused();
        if err.halts_detection() {
            tracing::error!(?context, paused, "{}: {}", error_label(err.category()), err.message());
        } else {
            tracing::warn!(?context, paused, "{}: {}", error_label(err.category()), err.message());
        }
        self.status_banner = Some(err);
    }

    fn process_detector_events(&mut self) {
        while let Some(event) = self.detector.next_event() {
            match event {
                UiEvent::Detection(reading) => {
                    let outcome = self.dispatch(KioskEvent::Detected(reading.label.clone()));
                    if outcome == Outcome::Ignored(IgnoreReason::UnknownLabel) {
                        self.report_unknown_label(&reading.label);
                    }
                }
                UiEvent::Info(message) => tracing::info!("{message}"),
                UiEvent::Error(err) => self.report(err),
            }
        }
    }

    /// The banner is not raised again while it already shows this label.
    fn report_unknown_label(&mut self, label: &str) {
        let message = format!("label '{label}' is missing from the catalog");
        if self
            .status_banner
            .as_ref()
            .is_some_and(|banner| banner.message() == message)
        {
            return;
        }
        self.report(UiError::new(
            UiErrorCategory::Catalog,
            UiErrorContext::General,
            message,
        ));
    }

    /// Everything that does not need a frame: timers, detector traffic and
    /// transient text.
    fn tick(&mut self, now: Instant) {
        if self.reset_timer.fire_if_due(now) {
            self.dispatch(KioskEvent::ResetTimerFired);
        }
        self.process_detector_events();
        if let Some(err) = self.camera.take_error() {
            self.report(err);
        }
        self.feedback.expire(now);
    }

    fn close(&mut self) {
        if self.controller.session().kind() == PhaseKind::Closed {
            return;
        }
        self.reset_timer.cancel();
        self.dispatch(KioskEvent::Close);
    }

    fn next_repaint(&self, now: Instant) -> Duration {
        let mut wait = if self.camera.is_running() {
            self.camera_poll.max(MIN_REPAINT)
        } else {
            IDLE_REPAINT
        };
        for deadline in [self.reset_timer.deadline(), self.feedback.next_expiry()]
            .into_iter()
            .flatten()
        {
            wait = wait.min(deadline.saturating_duration_since(now));
        }
        wait
    }

    fn show_status_banner(&mut self, ctx: &egui::Context) {
        let Some(err) = &self.status_banner else {
            return;
        };
        let text = format!("{}: {}", error_label(err.category()), err.message());
        let mut dismissed = false;
        egui::TopBottomPanel::top("status_banner")
            .frame(
                egui::Frame::NONE
                    .fill(theme::WRONG)
                    .inner_margin(egui::Margin::symmetric(12, 6)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        dismissed = ui.button("Dismiss").clicked();
                    });
                });
            });
        if dismissed {
            self.status_banner = None;
        }
    }
}

impl eframe::App for KioskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply(ctx);
            self.theme_applied = true;
        }
        if ctx.input(|i| i.viewport().close_requested()) {
            self.close();
        }

        let now = Instant::now();
        self.tick(now);
        self.camera.refresh(ctx, now);

        self.show_status_banner(ctx);

        let mut pressed = None;
        egui::TopBottomPanel::bottom("guess_buttons")
            .exact_height(BUTTON_PANEL_HEIGHT)
            .show(ctx, |ui| {
                pressed = self.feedback.show_buttons(ui);
            });

        egui::SidePanel::left("character")
            .exact_width(CHARACTER_PANEL_WIDTH)
            .resizable(false)
            .show(ctx, |ui| self.feedback.show_character(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.feedback.show_title_panel(ui);
            ui.add_space(8.0);
            let max_size = egui::vec2(
                ui.available_width(),
                (ui.available_height() - BODY_RESERVE).max(0.0),
            );
            self.camera.show(ui, max_size);
            ui.add_space(8.0);
            self.feedback.show_body_panel(ui);
        });

        if let Some(category) = pressed {
            self.dispatch(KioskEvent::Guess(category));
        }

        ctx.request_repaint_after(self.next_repaint(Instant::now()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossbeam_channel::{bounded, Receiver, Sender};
    use kiosk_core::{Catalog, ControllerSettings};
    use shared::{
        domain::{ButtonVisual, Category, Reaction},
        error::CameraUnavailableError,
        protocol::DetectorReading,
    };

    use super::*;
    use crate::backend_bridge::commands::DetectorCommand;
    use crate::ui::camera::{FrameSource, RgbaFrame};

    struct StillFrame;

    impl FrameSource for StillFrame {
        fn poll_frame(&mut self) -> Result<Option<RgbaFrame>, CameraUnavailableError> {
            Ok(Some(RgbaFrame {
                size: [1, 1],
                pixels: vec![10, 20, 30, 255],
            }))
        }
    }

    const CATALOG: &str = r#"{
        "items": {
            "soda_can": {
                "name": "soda can",
                "recycling-type": "recyclable",
                "guessed_correct_title": "Nice!",
                "guessed_correct_body": "Cans are recyclable.",
                "guessed_incorrect_title": "Not quite",
                "guessed_incorrect_body": "Cans are metal."
            }
        }
    }"#;

    struct Rig {
        app: KioskApp,
        ui_tx: Sender<UiEvent>,
        cmd_rx: Receiver<DetectorCommand>,
    }

    fn rig(reset_delay: Duration) -> Rig {
        let catalog = Arc::new(Catalog::from_json_str(CATALOG).expect("catalog"));
        let controller = InteractionController::new(
            catalog,
            ControllerSettings {
                reset_delay,
                hint_duration: Duration::from_millis(2000),
            },
        );
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let detector = DetectorHandle::new(cmd_tx, ui_rx, None);
        let camera = CameraView::new(Box::new(StillFrame), Duration::ZERO);
        Rig {
            app: KioskApp::new(controller, detector, camera, Duration::from_millis(5)),
            ui_tx,
            cmd_rx,
        }
    }

    fn detection(label: &str) -> UiEvent {
        UiEvent::Detection(DetectorReading {
            label: label.to_string(),
            confidence: Some(0.9),
        })
    }

    #[test]
    fn detection_freezes_camera_and_pauses_detector() {
        let mut rig = rig(Duration::from_millis(3500));
        rig.ui_tx.send(detection("soda_can")).expect("send");

        rig.app.tick(Instant::now());

        assert_eq!(rig.app.controller.session().kind(), PhaseKind::Evaluating);
        assert!(!rig.app.camera.is_running());
        assert!(rig.app.detector.is_paused());
        assert_eq!(rig.cmd_rx.try_recv().ok(), Some(DetectorCommand::Pause));
        assert_eq!(
            rig.app.feedback.reaction(),
            &Reaction::Curious {
                item_name: "soda can".to_string()
            }
        );
    }

    #[test]
    fn correct_guess_resets_after_the_delay() {
        let mut rig = rig(Duration::ZERO);
        rig.ui_tx.send(detection("soda_can")).expect("send");
        rig.app.tick(Instant::now());

        let outcome = rig.app.dispatch(KioskEvent::Guess(Category::Recyclable));
        assert_eq!(outcome, Outcome::Resolved(Category::Recyclable));
        assert_eq!(
            rig.app.feedback.button(Category::Recyclable),
            ButtonVisual::Correct
        );
        assert!(rig.app.reset_timer.deadline().is_some());

        rig.app.tick(Instant::now() + Duration::from_millis(1));

        assert_eq!(rig.app.controller.session().kind(), PhaseKind::Idle);
        assert!(rig.app.camera.is_running());
        assert!(!rig.app.detector.is_paused());
        assert_eq!(
            rig.app.feedback.button(Category::Recyclable),
            ButtonVisual::Default
        );
        assert_eq!(rig.app.feedback.title(), None);
    }

    #[test]
    fn detector_stream_errors_raise_the_banner() {
        let mut rig = rig(Duration::from_millis(3500));
        rig.ui_tx
            .send(UiEvent::Error(UiError::from_message(
                UiErrorContext::DetectorStream,
                "detector stream ended",
            )))
            .expect("send");

        rig.app.tick(Instant::now());

        let banner = rig.app.status_banner.as_ref().expect("banner");
        assert!(banner.halts_detection());
    }

    #[test]
    fn unknown_labels_raise_a_single_catalog_banner() {
        let mut rig = rig(Duration::from_millis(3500));
        rig.ui_tx.send(detection("pizza_box")).expect("send");
        rig.ui_tx.send(detection("pizza_box")).expect("send");

        rig.app.tick(Instant::now());

        assert_eq!(rig.app.controller.session().kind(), PhaseKind::Idle);
        assert!(!rig.app.detector.is_paused());
        let banner = rig.app.status_banner.as_ref().expect("banner");
        assert_eq!(banner.category(), UiErrorCategory::Catalog);
        assert!(banner.message().contains("pizza_box"));
    }

    #[test]
    fn unknown_label_named_like_a_camera_term_is_still_a_catalog_banner() {
        let mut rig = rig(Duration::from_millis(3500));
        rig.ui_tx.send(detection("picture_frame")).expect("send");

        rig.app.tick(Instant::now());

        let banner = rig.app.status_banner.as_ref().expect("banner");
        assert_eq!(banner.category(), UiErrorCategory::Catalog);
        assert_eq!(error_label(banner.category()), "Catalog");
        assert!(banner.message().contains("picture_frame"));
    }

    #[test]
    fn close_releases_the_camera_once() {
        let mut rig = rig(Duration::from_millis(3500));
        rig.ui_tx.send(detection("soda_can")).expect("send");
        rig.app.tick(Instant::now());
        rig.app.dispatch(KioskEvent::Guess(Category::Recyclable));

        rig.app.close();
        rig.app.close();

        assert_eq!(rig.app.controller.session().kind(), PhaseKind::Closed);
        assert_eq!(rig.app.reset_timer.deadline(), None);
        assert!(!rig.app.camera.is_running());
        let commands: Vec<_> = rig.cmd_rx.try_iter().collect();
        assert_eq!(
            commands
                .iter()
                .filter(|cmd| **cmd == DetectorCommand::Stop)
                .count(),
            1
        );
    }

    #[test]
    fn repaint_waits_for_the_nearest_deadline() {
        let mut rig = rig(Duration::from_millis(3500));
        let now = Instant::now();
        assert_eq!(rig.app.next_repaint(now), MIN_REPAINT);

        rig.ui_tx.send(detection("soda_can")).expect("send");
        rig.app.tick(now);
        rig.app.feedback.show_title_at("hint", Some(Duration::from_millis(5)), now);
        assert_eq!(rig.app.next_repaint(now), Duration::from_millis(5));
    }
}
