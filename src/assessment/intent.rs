//! Classifier output as seen by the dialog.

use serde::{Deserialize, Serialize};

// Labels.

pub const POSITIVE_ANSWER: &str = "Panswer";
pub const NEGATIVE_ANSWER: &str = "Nanswer";
pub const POSITIVE_FEELING: &str = "Pfeeling";
pub const NEGATIVE_FEELING: &str = "Nfeeling";
pub const ALONE: &str = "Alone";
pub const FREQUENCY: &str = "Frequency";
pub const PRIORITY_DANGER: &str = "Priority_Danger";

/// The top intent for one utterance.
///
/// Produced fresh every turn and never persisted. A failed or empty
/// classification is represented by [`ClassifiedIntent::none`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedIntent {
    pub label: String,
    pub confidence: f32,
    #[serde(default)]
    pub entity: Option<String>,
}

impl ClassifiedIntent {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            entity: None,
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// The "nothing recognized" classification.
    pub fn none() -> Self {
        Self::new("", 0.0)
    }

    /// Whether this classification may be acted on at the given threshold.
    ///
    /// The comparison is strict: a confidence equal to the threshold is not usable.
    pub fn is_usable(&self, threshold: f32) -> bool {
        !self.label.is_empty() && self.confidence > threshold
    }

    /// Whether this is a usable classification with the given label.
    pub fn is(&self, label: &str, threshold: f32) -> bool {
        self.is_usable(threshold) && self.label == label
    }
}

/// How often the user reports thoughts of suicide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyLevel {
    Never,
    Sometimes,
    Often,
    Always,
}

impl FrequencyLevel {
    /// Parses the entity text captured with a `Frequency` intent.
    pub fn from_entity(entity: &str) -> Option<Self> {
        match entity.trim() {
            "전혀" => Some(Self::Never),
            "가끔" => Some(Self::Sometimes),
            "자주" => Some(Self::Often),
            "항상" => Some(Self::Always),
            _ => None,
        }
    }

    pub fn risk_delta(self) -> i32 {
        match self {
            Self::Never => 0,
            Self::Sometimes => 1,
            Self::Often => 2,
            Self::Always => 3,
        }
    }
}
