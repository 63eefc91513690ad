use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}' (expected recyclable, waste or compostable)")]
pub struct UnknownCategory(pub String);

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("catalog is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("catalog entry '{label}' is invalid: {source}")]
    InvalidEntry {
        label: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog entry '{label}' has an empty '{field}'")]
    EmptyField { label: String, field: &'static str },
    #[error("catalog contains no items")]
    Empty,
}

#[derive(Debug, Error)]
pub enum CameraUnavailableError {
    #[error("no frame source configured")]
    NotConfigured,
    #[error("camera frame '{path}' could not be read: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("camera frame '{path}' could not be decoded: {reason}")]
    Decode { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector command is empty")]
    EmptyCommand,
    #[error("failed to spawn detector '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("detector '{program}' has no stdout pipe")]
    MissingStdout { program: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_name_the_offending_entry() {
        let err = CatalogLoadError::EmptyField {
            label: "banana_peel".to_string(),
            field: "name",
        };
        assert_eq!(
            err.to_string(),
            "catalog entry 'banana_peel' has an empty 'name'"
        );
    }

    #[test]
    fn io_errors_keep_their_source() {
        let err = CatalogLoadError::Io {
            path: PathBuf::from("assets/items.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("assets/items.json"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
