use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use kiosk_core::{ControllerSettings, DEFAULT_HINT_DURATION, DEFAULT_RESET_DELAY};
use serde::Deserialize;

use crate::backend_bridge::commands::LabelSource;

pub const CONFIG_FILE_NAME: &str = "kiosk.toml";
const CONFIG_DIR_NAME: &str = "recycling_kiosk";
const ENV_PREFIX: &str = "KIOSK__";
const DEFAULT_CAMERA_POLL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub install_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub labels_path: Option<PathBuf>,
    pub detector_command: Vec<String>,
    pub frame_path: Option<PathBuf>,
    pub min_confidence: Option<f32>,
    pub reset_delay: Duration,
    pub hint_duration: Duration,
    pub camera_poll: Duration,
}

impl Settings {
    fn with_install_dir(install_dir: PathBuf) -> Self {
        Self {
            install_dir,
            catalog_path: PathBuf::from("assets/items.json"),
            labels_path: None,
            detector_command: Vec::new(),
            frame_path: None,
            min_confidence: None,
            reset_delay: DEFAULT_RESET_DELAY,
            hint_duration: DEFAULT_HINT_DURATION,
            camera_poll: DEFAULT_CAMERA_POLL,
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            reset_delay: self.reset_delay,
            hint_duration: self.hint_duration,
        }
    }

    pub fn label_source(&self) -> LabelSource {
        if self.detector_command.is_empty() {
            LabelSource::Stdin
        } else {
            LabelSource::Command(self.detector_command.clone())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    catalog_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    detector_command: Option<Vec<String>>,
    frame_path: Option<PathBuf>,
    min_confidence: Option<f32>,
    reset_delay_ms: Option<u64>,
    hint_duration_ms: Option<u64>,
    camera_poll_ms: Option<u64>,
}

/// Defaults, then `kiosk.toml`, then `KIOSK__*` environment variables.
/// Relative paths resolve against the install directory, falling back to
/// the working directory when launched from a checkout.
pub fn load_settings() -> anyhow::Result<Settings> {
    let install_dir = install_dir();
    let cwd = env::current_dir().unwrap_or_else(|_| install_dir.clone());
    let mut settings = Settings::with_install_dir(install_dir.clone());

    let candidates = config_candidates(&install_dir, &cwd);
    if let Some(path) = candidates.iter().find(|path| path.is_file()) {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config '{}'", path.display()))?;
        tracing::info!(path = %path.display(), "loaded kiosk config");
    } else {
        tracing::debug!("no {CONFIG_FILE_NAME} found; using defaults");
    }

    apply_env(&mut settings, |key| env::var(key).ok());
    resolve_paths(&mut settings, &cwd);
    Ok(settings)
}

fn install_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn config_candidates(install_dir: &Path, cwd: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![
        install_dir.join(CONFIG_FILE_NAME),
        cwd.join(CONFIG_FILE_NAME),
    ];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    }
    candidates
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file: FileConfig = toml::from_str(raw)?;

    if let Some(v) = file.catalog_path {
        settings.catalog_path = v;
    }
    if let Some(v) = file.labels_path {
        settings.labels_path = Some(v);
    }
    if let Some(v) = file.detector_command {
        settings.detector_command = v;
    }
    if let Some(v) = file.frame_path {
        settings.frame_path = Some(v);
    }
    if let Some(v) = file.min_confidence {
        settings.min_confidence = Some(v);
    }
    if let Some(v) = file.reset_delay_ms {
        settings.reset_delay = Duration::from_millis(v);
    }
    if let Some(v) = file.hint_duration_ms {
        settings.hint_duration = Duration::from_millis(v);
    }
    if let Some(v) = file.camera_poll_ms {
        settings.camera_poll = Duration::from_millis(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| {
        lookup(&format!("{ENV_PREFIX}{name}")).filter(|value| !value.trim().is_empty())
    };

    if let Some(v) = var("CATALOG_PATH") {
        settings.catalog_path = PathBuf::from(v);
    }
    if let Some(v) = var("LABELS_PATH") {
        settings.labels_path = Some(PathBuf::from(v));
    }
    if let Some(v) = var("DETECTOR_COMMAND") {
        settings.detector_command = v.split_whitespace().map(str::to_string).collect();
    }
    if let Some(v) = var("FRAME_PATH") {
        settings.frame_path = Some(PathBuf::from(v));
    }
    if let Some(v) = var("MIN_CONFIDENCE") {
        match v.trim().parse::<f32>() {
            Ok(parsed) => settings.min_confidence = Some(parsed),
            Err(err) => tracing::warn!("ignoring {ENV_PREFIX}MIN_CONFIDENCE={v}: {err}"),
        }
    }
    for (name, slot) in [
        ("RESET_DELAY_MS", &mut settings.reset_delay),
        ("HINT_DURATION_MS", &mut settings.hint_duration),
        ("CAMERA_POLL_MS", &mut settings.camera_poll),
    ] {
        if let Some(v) = var(name) {
            match v.trim().parse::<u64>() {
                Ok(parsed) => *slot = Duration::from_millis(parsed),
                Err(err) => tracing::warn!("ignoring {ENV_PREFIX}{name}={v}: {err}"),
            }
        }
    }
}

fn resolve_paths(settings: &mut Settings, cwd: &Path) {
    let install_dir = settings.install_dir.clone();
    settings.catalog_path = resolve_asset(&install_dir, cwd, &settings.catalog_path);
    if let Some(path) = settings.labels_path.take() {
        settings.labels_path = Some(resolve_asset(&install_dir, cwd, &path));
    }
    if let Some(path) = settings.frame_path.take() {
        settings.frame_path = Some(resolve_asset(&install_dir, cwd, &path));
    }
}

fn resolve_asset(install_dir: &Path, cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let installed = install_dir.join(path);
    if installed.exists() {
        installed
    } else {
        cwd.join(path)
    }
}
