#![forbid(unsafe_code)]

use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CategoryColumn {
    State,
    CrimeType,
}

impl CategoryColumn {
    pub const fn as_str(self) -> &'static str {
        match self {
            CategoryColumn::State => "state",
            CategoryColumn::CrimeType => "crime_type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {} '{label}'", .column.as_str())]
pub struct UnknownCategory {
    pub column: CategoryColumn,
    pub label: String,
}

/// Sorted, de-duplicated label set. A label's code is its index.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct LabelVocabulary {
    classes: Vec<String>,
}

impl LabelVocabulary {
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = labels
            .into_iter()
            .map(|label| label.as_ref().to_string())
            .collect();
        Self {
            classes: set.into_iter().collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn transform(&self, label: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .ok()
            .map(|idx| idx as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EncoderMode {
    /// One vocabulary, fitted on states, applied to both columns.
    Shared,
    PerColumn,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CategoryEncoder {
    Shared {
        vocabulary: LabelVocabulary,
    },
    PerColumn {
        state: LabelVocabulary,
        crime_type: LabelVocabulary,
    },
}

impl CategoryEncoder {
    pub fn mode(&self) -> EncoderMode {
        match self {
            CategoryEncoder::Shared { .. } => EncoderMode::Shared,
            CategoryEncoder::PerColumn { .. } => EncoderMode::PerColumn,
        }
    }

    pub fn vocabulary(&self, column: CategoryColumn) -> &LabelVocabulary {
        match (self, column) {
            (CategoryEncoder::Shared { vocabulary }, _) => vocabulary,
            (CategoryEncoder::PerColumn { state, .. }, CategoryColumn::State) => state,
            (CategoryEncoder::PerColumn { crime_type, .. }, CategoryColumn::CrimeType) => {
                crime_type
            }
        }
    }

    pub fn encode(&self, column: CategoryColumn, label: &str) -> Result<u32, UnknownCategory> {
        self.vocabulary(column)
            .transform(label)
            .ok_or_else(|| UnknownCategory {
                column,
                label: label.to_string(),
            })
    }
}
