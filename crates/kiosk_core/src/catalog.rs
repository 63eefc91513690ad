use std::{collections::HashMap, fs, path::Path};

use shared::{
    domain::Category,
    error::CatalogLoadError,
    protocol::{CatalogDocument, ItemRecord, DEFAULT_CURIOUS_PROMPT},
};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEntry {
    pub label: String,
    pub display_name: String,
    pub category: Category,
    pub curious_prompt: String,
    pub correct_title: String,
    pub correct_body: String,
    pub incorrect_title: String,
    pub incorrect_body: String,
}

impl ItemEntry {
    fn from_record(label: String, record: ItemRecord) -> Result<Self, CatalogLoadError> {
        let required = [
            ("name", &record.name),
            ("guessed_correct_title", &record.guessed_correct_title),
            ("guessed_correct_body", &record.guessed_correct_body),
            ("guessed_incorrect_title", &record.guessed_incorrect_title),
            ("guessed_incorrect_body", &record.guessed_incorrect_body),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(CatalogLoadError::EmptyField {
                label,
                field: *field,
            });
        }

        let curious_prompt = record
            .curious_prompt
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURIOUS_PROMPT.to_string());

        Ok(Self {
            label,
            display_name: record.name,
            category: record.recycling_type,
            curious_prompt,
            correct_title: record.guessed_correct_title,
            correct_body: record.guessed_correct_body,
            incorrect_title: record.guessed_incorrect_title,
            incorrect_body: record.guessed_incorrect_body,
        })
    }

    /// Feedback text for a guess of `guessed`: `(title, body)`.
    pub fn feedback_for(&self, guessed: Category) -> (&str, &str) {
        if guessed == self.category {
            (&self.correct_title, &self.correct_body)
        } else {
            (&self.incorrect_title, &self.incorrect_body)
        }
    }
}

/// Read-only label → entry table, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<String, ItemEntry>,
}

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogLoadError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            items = catalog.len(),
            "loaded item catalog"
        );
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogLoadError> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        if document.items.is_empty() {
            return Err(CatalogLoadError::Empty);
        }

        let mut items = HashMap::with_capacity(document.items.len());
        for (label, value) in document.items {
            let record: ItemRecord = serde_json::from_value(value).map_err(|source| {
                CatalogLoadError::InvalidEntry {
                    label: label.clone(),
                    source,
                }
            })?;
            let entry = ItemEntry::from_record(label.clone(), record)?;
            debug!(label = %entry.label, category = %entry.category, "catalog entry");
            items.insert(label, entry);
        }

        Ok(Self { items })
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ItemEntry>) -> Self {
        Self {
            items: entries
                .into_iter()
                .map(|entry| (entry.label.clone(), entry))
                .collect(),
        }
    }

    pub fn get(&self, label: &str) -> Option<&ItemEntry> {
        self.items.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.items.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries sorted by label.
    pub fn entries(&self) -> Vec<&ItemEntry> {
        let mut entries: Vec<_> = self.items.values().collect();
        entries.sort_by(|a, b| a.label.cmp(&b.label));
        entries
    }

    /// Labels the detector may emit that have no entry here, in input order
    /// with duplicates removed.
    pub fn missing_labels<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for label in labels {
            let label = label.trim();
            if label.is_empty() || self.contains(label) || missing.iter().any(|m| m == label) {
                continue;
            }
            missing.push(label.to_string());
        }
        missing
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
