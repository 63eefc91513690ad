//! Detector bridge: sidecar process, line reader and the worker that feeds the UI queue.

pub mod commands;
pub mod runtime;
