//! Command orchestration from controller decisions to the detector worker.

use std::collections::VecDeque;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use kiosk_core::DetectorControl;

use crate::backend_bridge::{commands::DetectorCommand, runtime::DetectorWorker};
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn dispatch_detector_command(
    cmd_tx: &Sender<DetectorCommand>,
    cmd: DetectorCommand,
    status: &mut Option<UiError>,
) {
    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd.name(), "queued ui->detector command"),
        Err(TrySendError::Full(_)) => {
            *status = Some(UiError::from_message(
                UiErrorContext::DetectorCommand,
                "detector command queue is full",
            ));
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = Some(UiError::from_message(
                UiErrorContext::DetectorCommand,
                "detector worker disconnected; restart the kiosk to resume recognition",
            ));
        }
    }
}

/// UI-side half of the detector bridge. While paused no detection is handed
/// to the controller, including ones the worker queued before it saw the
/// pause.
pub struct DetectorHandle {
    cmd_tx: Sender<DetectorCommand>,
    ui_rx: Receiver<UiEvent>,
    worker: Option<DetectorWorker>,
    held: VecDeque<UiEvent>,
    paused: bool,
    stopped: bool,
    last_error: Option<UiError>,
}

impl DetectorHandle {
    pub fn new(
        cmd_tx: Sender<DetectorCommand>,
        ui_rx: Receiver<UiEvent>,
        worker: Option<DetectorWorker>,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            worker,
            held: VecDeque::new(),
            paused: false,
            stopped: false,
            last_error: None,
        }
    }

    /// Next event for the UI loop, in arrival order.
    pub fn next_event(&mut self) -> Option<UiEvent> {
        if let Some(event) = self.held.pop_front() {
            return Some(event);
        }
        loop {
            let event = self.ui_rx.try_recv().ok()?;
            if self.delivers(&event) {
                return Some(event);
            }
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn take_error(&mut self) -> Option<UiError> {
        self.last_error.take()
    }

    fn delivers(&self, event: &UiEvent) -> bool {
        match event {
            UiEvent::Detection(reading) => {
                if self.paused || self.stopped {
                    tracing::trace!(label = %reading.label, "discarding detection while paused");
                    false
                } else {
                    true
                }
            }
            UiEvent::Info(_) | UiEvent::Error(_) => true,
        }
    }

    /// Drops queued detections, keeping everything else in order.
    fn discard_queued_detections(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            if !matches!(event, UiEvent::Detection(_)) {
                self.held.push_back(event);
            }
        }
        self.held
            .retain(|event| !matches!(event, UiEvent::Detection(_)));
    }
}

impl DetectorControl for DetectorHandle {
    fn pause_detection(&mut self) {
        if self.stopped || self.paused {
            return;
        }
        self.paused = true;
        self.discard_queued_detections();
        dispatch_detector_command(&self.cmd_tx, DetectorCommand::Pause, &mut self.last_error);
    }

    fn resume_detection(&mut self) {
        if self.stopped || !self.paused {
            return;
        }
        // Anything still queued was produced before the worker paused.
        self.discard_queued_detections();
        self.paused = false;
        dispatch_detector_command(&self.cmd_tx, DetectorCommand::Resume, &mut self.last_error);
    }

    fn stop_detection(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        dispatch_detector_command(&self.cmd_tx, DetectorCommand::Stop, &mut self.last_error);
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}

impl Drop for DetectorHandle {
    fn drop(&mut self) {
        self.stop_detection();
    }
}
