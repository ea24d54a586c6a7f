//! Error types for pcdoc.

use std::path::PathBuf;
use thiserror::Error;

/// Minimum length of a symptom label, in characters
pub const MIN_LABEL_CHARS: usize = 10;

/// Minimum length of a diagnosis text, in characters
pub const MIN_DIAGNOSIS_CHARS: usize = 20;

/// A knowledge item failed validation.
///
/// Non-fatal when raised by a contribution; fatal when raised while loading
/// the static knowledge base (wrapped in [`KnowledgeLoadError::Invalid`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Symptom label has {len} characters, at least {min} required")]
    LabelTooShort { len: usize, min: usize },

    #[error("Diagnosis text has {len} characters, at least {min} required")]
    DiagnosisTooShort { len: usize, min: usize },

    #[error("Symptom category is required")]
    MissingCategory,

    #[error("Unknown symptom category '{0}' (expected hardware or software)")]
    UnknownCategory(String),

    #[error("Symptom id is empty")]
    EmptySymptomId,

    #[error("Rule has no positive conditions")]
    EmptyPositive,

    #[error("Rule lists {0:?} as both positive and negative conditions")]
    OverlappingConditions(Vec<String>),

    #[error("Unknown symptom id '{0}'")]
    UnknownSymptom(String),

    #[error("Symptom id '{0}' already exists")]
    DuplicateSymptom(String),

    #[error("Clue weight must be a positive number, got {0}")]
    NonPositiveWeight(f64),

    #[error("Combination hint needs at least one required symptom")]
    EmptyHintConditions,
}

impl ValidationError {
    /// Stable machine-readable code for API consumers
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::LabelTooShort { .. } => "label_too_short",
            ValidationError::DiagnosisTooShort { .. } => "diagnosis_too_short",
            ValidationError::MissingCategory => "missing_category",
            ValidationError::UnknownCategory(_) => "unknown_category",
            ValidationError::EmptySymptomId => "empty_symptom_id",
            ValidationError::EmptyPositive => "empty_positive",
            ValidationError::OverlappingConditions(_) => "overlapping_conditions",
            ValidationError::UnknownSymptom(_) => "unknown_symptom",
            ValidationError::DuplicateSymptom(_) => "duplicate_symptom",
            ValidationError::NonPositiveWeight(_) => "non_positive_weight",
            ValidationError::EmptyHintConditions => "empty_hint_conditions",
        }
    }
}

/// The static knowledge base could not be loaded. Fatal at startup.
#[derive(Error, Debug)]
pub enum KnowledgeLoadError {
    #[error("Knowledge base not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("Cannot read knowledge base {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed knowledge base {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid knowledge base ({context}): {source}")]
    Invalid {
        context: String,
        #[source]
        source: ValidationError,
    },
}

/// A contribution was rejected or could not be stored.
#[derive(Error, Debug)]
pub enum ContributionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Failed to persist contribution: {0}")]
    Persistence(String),
}
