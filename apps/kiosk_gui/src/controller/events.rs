//! Detector bridge events and error modeling for the kiosk UI.

use shared::protocol::DetectorReading;

pub enum UiEvent {
    Detection(DetectorReading),
    Info(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Detector,
    Camera,
    Catalog,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    DetectorStream,
    DetectorCommand,
    CameraFeed,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    /// For callers that already know what went wrong.
    pub fn new(
        category: UiErrorCategory,
        context: UiErrorContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context,
            message: message.into(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("detector")
            || message_lower.contains("sidecar")
            || message_lower.contains("stream ended")
        {
            UiErrorCategory::Detector
        } else if message_lower.contains("camera")
            || message_lower.contains("frame")
            || message_lower.contains("decode")
        {
            UiErrorCategory::Camera
        } else if message_lower.contains("catalog") || message_lower.contains("label") {
            UiErrorCategory::Catalog
        } else {
            match context {
                UiErrorContext::DetectorStream | UiErrorContext::DetectorCommand => {
                    UiErrorCategory::Detector
                }
                UiErrorContext::CameraFeed => UiErrorCategory::Camera,
                UiErrorContext::General => UiErrorCategory::Unknown,
            }
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Whether new items can no longer be recognized until restart.
    pub fn halts_detection(&self) -> bool {
        self.category == UiErrorCategory::Detector && self.context == UiErrorContext::DetectorStream
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn error_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Detector => "Detector",
        UiErrorCategory::Camera => "Camera",
        UiErrorCategory::Catalog => "Catalog",
        UiErrorCategory::Unknown => "Unexpected",
    }
}
