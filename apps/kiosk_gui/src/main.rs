use std::{fs, path::Path, sync::Arc};

mod backend_bridge;
mod config;
mod controller;
mod ui;

use anyhow::{bail, Context};
use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;
use kiosk_core::{Catalog, InteractionController};
use shared::{error::CameraUnavailableError, protocol::parse_label_list};
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{commands::DetectorCommand, runtime};
use crate::controller::{events::UiEvent, orchestration::DetectorHandle};
use crate::ui::{
    camera::{CameraView, SnapshotFileSource},
    KioskApp,
};

const WINDOW_TITLE: &str = "Recycling Kiosk";

#[derive(Parser, Debug)]
#[command(name = "recycling-kiosk", about = "Camera-driven recycling guessing game")]
struct Args {
    /// Launch words; `verbose` enables debug logging.
    words: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct LaunchWords {
    verbose: bool,
    unrecognized: Vec<String>,
}

fn parse_words(words: &[String]) -> LaunchWords {
    let mut parsed = LaunchWords::default();
    for word in words {
        if word == "verbose" {
            parsed.verbose = true;
        } else {
            parsed.unrecognized.push(word.clone());
        }
    }
    parsed
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_labels(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read labels '{}'", path.display()))?;
    Ok(parse_label_list(&raw))
}

fn check_labels(catalog: &Catalog, labels: &[String]) -> anyhow::Result<()> {
    let missing = catalog.missing_labels(labels.iter().map(String::as_str));
    if !missing.is_empty() {
        bail!(
            "catalog has no entry for detector label(s): {}",
            missing.join(", ")
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let words = parse_words(&args.words);
    init_tracing(words.verbose);
    for word in &words.unrecognized {
        tracing::warn!("arg not recognized: {word}");
    }

    let settings = config::load_settings()?;
    let catalog = Catalog::load(&settings.catalog_path)
        .with_context(|| format!("cannot start without '{}'", settings.catalog_path.display()))?;
    if let Some(labels_path) = &settings.labels_path {
        let labels = read_labels(labels_path)?;
        check_labels(&catalog, &labels)?;
        tracing::info!(count = labels.len(), "detector labels validated against catalog");
    }

    let frame_path = settings
        .frame_path
        .clone()
        .ok_or(CameraUnavailableError::NotConfigured)?;
    let frame_source = SnapshotFileSource::open(frame_path)?;
    let camera = CameraView::new(Box::new(frame_source), settings.camera_poll);

    let (cmd_tx, cmd_rx) = bounded::<DetectorCommand>(16);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(64);
    let worker = runtime::launch(
        &settings.label_source(),
        settings.min_confidence,
        cmd_rx,
        ui_tx,
    )?;
    let detector = DetectorHandle::new(cmd_tx, ui_rx, Some(worker));

    let controller =
        InteractionController::new(Arc::new(catalog), settings.controller_settings());
    let app = KioskApp::new(controller, detector, camera, settings.camera_poll);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([1422.0, 800.0])
            .with_min_inner_size([960.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(WINDOW_TITLE, options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|err| anyhow::anyhow!("kiosk window failed: {err}"))
}
