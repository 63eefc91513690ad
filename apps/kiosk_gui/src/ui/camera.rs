//! Camera view. The sidecar owns the capture device and keeps its latest
//! frame in an image file; this view polls that file while started.

use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant, SystemTime},
};

use eframe::egui;
use kiosk_core::CameraControl;
use shared::error::CameraUnavailableError;

use crate::controller::events::{UiError, UiErrorContext};

/// Consecutive failed polls before the operator is told the feed is stuck.
const FAILURES_BEFORE_REPORT: u32 = 200;

pub struct RgbaFrame {
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}

pub trait FrameSource: Send {
    /// Latest frame, or `None` when nothing changed since the last call.
    fn poll_frame(&mut self) -> Result<Option<RgbaFrame>, CameraUnavailableError>;
}

pub struct SnapshotFileSource {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl SnapshotFileSource {
    /// Fails unless a decodable frame is already present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CameraUnavailableError> {
        let path = path.into();
        decode_frame(&path)?;
        tracing::info!(path = %path.display(), "camera frame source ready");
        Ok(Self {
            path,
            last_modified: None,
        })
    }
}

impl FrameSource for SnapshotFileSource {
    fn poll_frame(&mut self) -> Result<Option<RgbaFrame>, CameraUnavailableError> {
        let modified = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|source| CameraUnavailableError::Read {
                path: self.path.clone(),
                source,
            })?;
        if self.last_modified == Some(modified) {
            return Ok(None);
        }
        let frame = decode_frame(&self.path)?;
        self.last_modified = Some(modified);
        Ok(Some(frame))
    }
}

/// Decodes and mirrors a frame so the user sees themselves as in a mirror.
fn decode_frame(path: &Path) -> Result<RgbaFrame, CameraUnavailableError> {
    let bytes = fs::read(path).map_err(|source| CameraUnavailableError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded =
        image::load_from_memory(&bytes).map_err(|err| CameraUnavailableError::Decode {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    let mirrored = image::imageops::flip_horizontal(&decoded.to_rgba8());
    let size = [mirrored.width() as usize, mirrored.height() as usize];
    Ok(RgbaFrame {
        size,
        pixels: mirrored.into_raw(),
    })
}

pub struct CameraView {
    source: Box<dyn FrameSource>,
    poll_interval: Duration,
    last_poll: Option<Instant>,
    running: bool,
    released: bool,
    texture: Option<egui::TextureHandle>,
    frame_size: egui::Vec2,
    consecutive_failures: u32,
    last_error: Option<UiError>,
}

impl CameraView {
    pub fn new(source: Box<dyn FrameSource>, poll_interval: Duration) -> Self {
        Self {
            source,
            poll_interval,
            last_poll: None,
            running: true,
            released: false,
            texture: None,
            frame_size: egui::Vec2::ZERO,
            consecutive_failures: 0,
            last_error: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn take_error(&mut self) -> Option<UiError> {
        self.last_error.take()
    }

    /// One refresh tick. A tick that lands after `stop_feed` does nothing,
    /// so the last frame stays frozen on screen.
    pub fn tick(&mut self, now: Instant) -> Option<RgbaFrame> {
        if !self.running {
            return None;
        }
        if self
            .last_poll
            .is_some_and(|last| now.duration_since(last) < self.poll_interval)
        {
            return None;
        }
        self.last_poll = Some(now);

        match self.source.poll_frame() {
            Ok(frame) => {
                self.consecutive_failures = 0;
                frame
            }
            Err(err) => {
                // The sidecar rewrites the file continuously; a torn read is normal.
                self.consecutive_failures += 1;
                if self.consecutive_failures == FAILURES_BEFORE_REPORT {
                    self.last_error = Some(UiError::from_message(
                        UiErrorContext::CameraFeed,
                        format!("camera feed stalled: {err}"),
                    ));
                } else {
                    tracing::debug!("camera frame skipped: {err}");
                }
                None
            }
        }
    }

    pub fn refresh(&mut self, ctx: &egui::Context, now: Instant) {
        let Some(frame) = self.tick(now) else {
            return;
        };
        let image = egui::ColorImage::from_rgba_unmultiplied(frame.size, &frame.pixels);
        self.frame_size = egui::vec2(frame.size[0] as f32, frame.size[1] as f32);
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("camera-frame", image, egui::TextureOptions::LINEAR));
            }
        }
    }

    pub fn show(&self, ui: &mut egui::Ui, max_size: egui::Vec2) {
        match &self.texture {
            Some(texture) if self.frame_size.x > 0.0 && self.frame_size.y > 0.0 => {
                let scale = (max_size.x / self.frame_size.x)
                    .min(max_size.y / self.frame_size.y)
                    .max(0.0);
                ui.vertical_centered(|ui| {
                    ui.add(
                        egui::Image::new((texture.id(), self.frame_size * scale))
                            .corner_radius(8.0),
                    );
                });
            }
            _ => {
                ui.centered_and_justified(|ui| {
                    ui.weak("Waiting for camera…");
                });
            }
        }
    }
}

impl CameraControl for CameraView {
    fn start_feed(&mut self) {
        if self.released {
            return;
        }
        self.running = true;
        self.last_poll = None;
    }

    fn stop_feed(&mut self) {
        self.running = false;
    }

    fn release_camera(&mut self) {
        self.running = false;
        self.released = true;
        self.texture = None;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::UNIX_EPOCH,
    };

    use super::*;

    struct CountingSource {
        polls: Arc<AtomicUsize>,
    }

    impl FrameSource for CountingSource {
        fn poll_frame(&mut self) -> Result<Option<RgbaFrame>, CameraUnavailableError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(RgbaFrame {
                size: [1, 1],
                pixels: vec![0, 0, 0, 255],
            }))
        }
    }

    struct BrokenSource;

    impl FrameSource for BrokenSource {
        fn poll_frame(&mut self) -> Result<Option<RgbaFrame>, CameraUnavailableError> {
            Err(CameraUnavailableError::Decode {
                path: PathBuf::from("/tmp/frame.jpg"),
                reason: "truncated".to_string(),
            })
        }
    }

    fn view(poll_interval: Duration) -> (CameraView, Arc<AtomicUsize>) {
        let polls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            polls: Arc::clone(&polls),
        };
        (CameraView::new(Box::new(source), poll_interval), polls)
    }

    #[test]
    fn polls_are_throttled() {
        let (mut camera, polls) = view(Duration::from_millis(5));
        let start = Instant::now();

        assert!(camera.tick(start).is_some());
        assert!(camera.tick(start + Duration::from_millis(2)).is_none());
        assert!(camera.tick(start + Duration::from_millis(5)).is_some());
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn persistent_failures_are_reported_once() {
        let mut camera = CameraView::new(Box::new(BrokenSource), Duration::ZERO);
        let now = Instant::now();
        for _ in 0..FAILURES_BEFORE_REPORT - 1 {
            assert!(camera.tick(now).is_none());
        }
        assert!(camera.take_error().is_none());

        camera.tick(now);
        let err = camera.take_error().expect("stalled feed reported");
        assert!(err.message().contains("stalled"));

        camera.tick(now);
        assert!(camera.take_error().is_none());
    }

    #[test]
    fn tick_after_stop_is_a_no_op() {
        let (mut camera, polls) = view(Duration::ZERO);
        camera.stop_feed();

        assert!(camera.tick(Instant::now()).is_none());
        assert_eq!(polls.load(Ordering::SeqCst), 0);

        camera.start_feed();
        assert!(camera.tick(Instant::now()).is_some());
    }

    #[test]
    fn released_camera_cannot_restart() {
        let (mut camera, polls) = view(Duration::ZERO);
        camera.release_camera();
        camera.start_feed();

        assert!(!camera.is_running());
        assert!(camera.tick(Instant::now()).is_none());
        assert_eq!(polls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn snapshot_source_decodes_mirrors_and_skips_unchanged_frames() {
        let suffix = std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("kiosk_frame_test_{suffix}.png"));
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 255, 255]));
        img.save(&path).expect("write frame");

        let mut source = SnapshotFileSource::open(&path).expect("open");
        let frame = source.poll_frame().expect("poll").expect("frame");
        assert_eq!(frame.size, [2, 1]);
        assert_eq!(&frame.pixels[..4], &[0, 0, 255, 255]);
        assert!(source.poll_frame().expect("poll").is_none());

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn missing_frame_is_camera_unavailable() {
        let err = SnapshotFileSource::open("/definitely/not/here/frame.jpg")
            .err()
            .expect("open should fail");
        assert!(matches!(err, CameraUnavailableError::Read { .. }));
    }

    #[test]
    fn garbage_frame_is_camera_unavailable() {
        let suffix = std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("kiosk_frame_garbage_{suffix}.png"));
        fs::write(&path, b"not an image").expect("write");

        let err = SnapshotFileSource::open(&path).err().expect("open should fail");
        assert!(matches!(err, CameraUnavailableError::Decode { .. }));

        fs::remove_file(path).expect("cleanup");
    }
}
