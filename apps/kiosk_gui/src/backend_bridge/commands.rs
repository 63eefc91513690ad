//! Commands queued from the UI to the detector worker.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorCommand {
    Pause,
    Resume,
    Stop,
}

impl DetectorCommand {
    pub fn name(self) -> &'static str {
        match self {
            DetectorCommand::Pause => "pause",
            DetectorCommand::Resume => "resume",
            DetectorCommand::Stop => "stop",
        }
    }
}

/// Where detection lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSource {
    /// Sidecar program and arguments; labels are read from its stdout.
    Command(Vec<String>),
    /// Labels typed or piped into this process.
    Stdin,
}
