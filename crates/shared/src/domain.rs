use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::UnknownCategory;

/// Disposal bin an item belongs in. One guess button exists per variant.
/// Deserialization goes through `FromStr`, so the catalog and the tools CLI
/// accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Category {
    Recyclable,
    Waste,
    Compostable,
}

impl Category {
    /// Button order on screen, left to right.
    pub const ALL: [Category; 3] = [Category::Recyclable, Category::Waste, Category::Compostable];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Recyclable => "recyclable",
            Category::Waste => "waste",
            Category::Compostable => "compostable",
        }
    }

    pub fn button_label(self) -> &'static str {
        match self {
            Category::Recyclable => "Recycle",
            Category::Waste => "Waste",
            Category::Compostable => "Compost",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "recyclable" => Ok(Category::Recyclable),
            "waste" => Ok(Category::Waste),
            "compostable" => Ok(Category::Compostable),
            _ => Err(UnknownCategory(value.to_string())),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonVisual {
    #[default]
    Default,
    Correct,
    Wrong,
}

/// Mood of the on-screen character.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Reaction {
    #[default]
    Idle,
    Curious { item_name: String },
    Happy,
    Sad,
}
