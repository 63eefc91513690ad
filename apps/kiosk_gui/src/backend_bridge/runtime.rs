//! Runtime bridge between the detector sidecar and the UI event queue.

use std::{
    io::{self, BufRead, BufReader},
    process::{Child, Command, Stdio},
    thread::{self, JoinHandle},
};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use shared::{error::DetectorError, protocol::DetectorReading};

use crate::backend_bridge::commands::{DetectorCommand, LabelSource};
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

const LINE_QUEUE_CAPACITY: usize = 64;

/// Owns the sidecar process and the worker thread.
pub struct DetectorWorker {
    program: Option<String>,
    child: Option<Child>,
    worker: Option<JoinHandle<()>>,
}

impl DetectorWorker {
    /// Kills the sidecar. Does not wait for the worker thread: it exits on
    /// its own once it sees `Stop` or a closed queue.
    pub fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            let program = self.program.as_deref().unwrap_or("detector");
            match child.kill() {
                Ok(()) => {
                    let _ = child.wait();
                    tracing::info!(program, "detector sidecar stopped");
                }
                Err(err) => tracing::debug!(program, "detector sidecar already gone: {err}"),
            }
        }
        self.worker.take();
    }
}

impl Drop for DetectorWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn launch(
    source: &LabelSource,
    min_confidence: Option<f32>,
    cmd_rx: Receiver<DetectorCommand>,
    ui_tx: Sender<UiEvent>,
) -> Result<DetectorWorker, DetectorError> {
    let (line_tx, line_rx) = bounded::<String>(LINE_QUEUE_CAPACITY);

    let (program, child) = match source {
        LabelSource::Command(argv) => {
            let (program, args) = argv.split_first().ok_or(DetectorError::EmptyCommand)?;
            let mut child = Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()
                .map_err(|source| DetectorError::Spawn {
                    program: program.clone(),
                    source,
                })?;
            let Some(stdout) = child.stdout.take() else {
                let _ = child.kill();
                return Err(DetectorError::MissingStdout {
                    program: program.clone(),
                });
            };
            thread::spawn(move || forward_lines(BufReader::new(stdout), line_tx));
            tracing::info!(program = %program, pid = child.id(), "detector sidecar started");
            (Some(program.clone()), Some(child))
        }
        LabelSource::Stdin => {
            thread::spawn(move || forward_lines(io::stdin().lock(), line_tx));
            let _ = ui_tx.try_send(UiEvent::Info(
                "no detector command configured; reading labels from stdin".to_string(),
            ));
            (None, None)
        }
    };

    let worker = spawn_worker(cmd_rx, line_rx, ui_tx, min_confidence);
    Ok(DetectorWorker {
        program,
        child,
        worker: Some(worker),
    })
}

fn forward_lines(reader: impl BufRead, line_tx: Sender<String>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!("detector stream read failed: {err}");
                break;
            }
        };
        if line_tx.send(line).is_err() {
            break;
        }
    }
}

/// Pause/filter state applied to incoming lines.
#[derive(Debug, Clone, Copy, Default)]
struct WorkerState {
    paused: bool,
    min_confidence: Option<f32>,
}

impl WorkerState {
    /// Returns `false` once the worker should exit.
    fn apply(&mut self, cmd: DetectorCommand) -> bool {
        tracing::debug!(command = cmd.name(), "detector worker command");
        match cmd {
            DetectorCommand::Pause => self.paused = true,
            DetectorCommand::Resume => self.paused = false,
            DetectorCommand::Stop => return false,
        }
        true
    }

    fn accept(&self, line: &str) -> Option<DetectorReading> {
        if self.paused {
            return None;
        }
        let reading = DetectorReading::parse_line(line)?;
        if !reading.passes(self.min_confidence) {
            tracing::trace!(label = %reading.label, confidence = ?reading.confidence, "below confidence threshold");
            return None;
        }
        Some(reading)
    }
}

fn spawn_worker(
    cmd_rx: Receiver<DetectorCommand>,
    line_rx: Receiver<String>,
    ui_tx: Sender<UiEvent>,
    min_confidence: Option<f32>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut state = WorkerState {
            paused: false,
            min_confidence,
        };
        loop {
            let keep_running = select! {
                recv(cmd_rx) -> cmd => match cmd {
                    Ok(cmd) => state.apply(cmd),
                    Err(_) => false,
                },
                recv(line_rx) -> line => on_line(&mut state, line.ok(), &cmd_rx, &ui_tx),
            };
            if !keep_running {
                break;
            }
        }
        tracing::debug!("detector worker exited");
    })
}

/// Returns `false` once the worker should exit.
fn on_line(
    state: &mut WorkerState,
    line: Option<String>,
    cmd_rx: &Receiver<DetectorCommand>,
    ui_tx: &Sender<UiEvent>,
) -> bool {
    let Some(line) = line else {
        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
            UiErrorContext::DetectorStream,
            "detector stream ended; new items will not be recognized",
        )));
        return false;
    };

    // Commands queued before this line win.
    while let Ok(cmd) = cmd_rx.try_recv() {
        if !state.apply(cmd) {
            return false;
        }
    }

    let Some(reading) = state.accept(&line) else {
        return true;
    };
    tracing::debug!(label = %reading.label, confidence = ?reading.confidence, "detection");
    match ui_tx.try_send(UiEvent::Detection(reading)) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::warn!("ui event queue full; dropping detection");
            true
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, time::Duration};

    use super::*;

    #[test]
    fn paused_state_drops_lines() {
        let mut state = WorkerState::default();
        assert!(state.apply(DetectorCommand::Pause));
        assert_eq!(state.accept("soda_can"), None);
        assert!(state.apply(DetectorCommand::Resume));
        assert_eq!(
            state.accept("soda_can").map(|reading| reading.label),
            Some("soda_can".to_string())
        );
        assert!(!state.apply(DetectorCommand::Stop));
    }

    #[test]
    fn low_confidence_lines_are_filtered() {
        let state = WorkerState {
            paused: false,
            min_confidence: Some(0.6),
        };
        assert_eq!(state.accept("cup 0.4"), None);
        assert!(state.accept("cup 0.8").is_some());
        assert!(state.accept("cup").is_some());
    }

    #[test]
    fn forwards_detections_then_reports_stream_end() {
        let (cmd_tx, cmd_rx) = bounded(4);
        let (line_tx, line_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);

        let worker = spawn_worker(cmd_rx, line_rx, ui_tx, None);
        forward_lines(Cursor::new("# warming up\nbanana_peel 0.9\n\nsoda_can\n"), line_tx);

        let mut labels = Vec::new();
        loop {
            match ui_rx.recv_timeout(Duration::from_secs(5)).expect("event") {
                UiEvent::Detection(reading) => labels.push(reading.label),
                UiEvent::Error(err) => {
                    assert!(err.halts_detection());
                    break;
                }
                UiEvent::Info(_) => {}
            }
        }
        assert_eq!(labels, vec!["banana_peel".to_string(), "soda_can".to_string()]);

        worker.join().expect("worker join");
        drop(cmd_tx);
    }

    #[test]
    fn stop_command_ends_worker() {
        let (cmd_tx, cmd_rx) = bounded(4);
        let (_line_tx, line_rx) = bounded::<String>(8);
        let (ui_tx, _ui_rx) = bounded(8);

        let worker = spawn_worker(cmd_rx, line_rx, ui_tx, None);
        cmd_tx.send(DetectorCommand::Stop).expect("send stop");
        worker.join().expect("worker join");
    }

    #[test]
    fn empty_command_is_rejected() {
        let (_cmd_tx, cmd_rx) = bounded(1);
        let (ui_tx, _ui_rx) = bounded(1);
        let err = launch(&LabelSource::Command(Vec::new()), None, cmd_rx, ui_tx)
            .err()
            .expect("launch should fail");
        assert!(matches!(err, DetectorError::EmptyCommand));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let (_cmd_tx, cmd_rx) = bounded(1);
        let (ui_tx, _ui_rx) = bounded(1);
        let err = launch(
            &LabelSource::Command(vec!["./no-such-detector-binary".to_string()]),
            None,
            cmd_rx,
            ui_tx,
        )
        .err()
        .expect("launch should fail");
        assert!(matches!(err, DetectorError::Spawn { .. }));
    }
}
