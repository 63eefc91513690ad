//! On-disk and on-pipe formats: the item catalog document and the
//! line protocol spoken by the detector sidecar.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Category;

pub const DEFAULT_CURIOUS_PROMPT: &str = "Please select where this item belongs";

/// Top-level shape of `items.json`. Entries stay untyped here so that a bad
/// entry can be reported by label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub items: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    #[serde(rename = "recycling-type")]
    pub recycling_type: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curious_prompt: Option<String>,
    pub guessed_correct_title: String,
    pub guessed_correct_body: String,
    pub guessed_incorrect_title: String,
    pub guessed_incorrect_body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorReading {
    pub label: String,
    pub confidence: Option<f32>,
}

impl DetectorReading {
    /// Parses `<label>` or `<label> <confidence>`. Blank lines, `#` comments
    /// and lines with an unparsable confidence yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut parts = line.split_whitespace();
        let label = parts.next()?.to_string();
        let confidence = match parts.next() {
            Some(raw) => Some(raw.parse::<f32>().ok().filter(|c| c.is_finite())?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self { label, confidence })
    }

    pub fn passes(&self, min_confidence: Option<f32>) -> bool {
        match (min_confidence, self.confidence) {
            (Some(min), Some(confidence)) => confidence >= min,
            _ => true,
        }
    }
}

/// Detector label list, one label per line. Blank lines and `#` comments
/// are skipped.
pub fn parse_label_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
