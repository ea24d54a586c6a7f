//! Contribution Merger
//!
//! Turns raw user submissions into validated knowledge items and hands them
//! to the repository. Safe to call while evaluations are in flight.

use crate::error::{ContributionError, ValidationError};
use crate::knowledge::{
    check_diagnosis, check_label, derive_symptom_id, Category, Contribution, ContributionRecord,
    KnowledgeRepository, Origin, Rule, Symptom, WeightedClue,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// What a submission adds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    Symptom,
    DiagnosisRule,
}

/// A new symptom as submitted by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomPayload {
    /// Derived from the label when absent
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// A new diagnosis rule as submitted by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePayload {
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
    pub diagnosis: String,
    /// Optional clue weight applied to every positive symptom
    #[serde(default)]
    pub weight: Option<f64>,
}

/// Tagged submission: `{"kind": "symptom" | "rule", "payload": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ContributionRequest {
    Symptom(SymptomPayload),
    Rule(RulePayload),
}

impl ContributionRequest {
    pub fn kind(&self) -> ContributionKind {
        match self {
            ContributionRequest::Symptom(_) => ContributionKind::Symptom,
            ContributionRequest::Rule(_) => ContributionKind::DiagnosisRule,
        }
    }

    /// Field-level validation, independent of the current knowledge base
    pub fn into_contribution(self) -> Result<Contribution, ValidationError> {
        match self {
            ContributionRequest::Symptom(p) => {
                let label = p.label.trim().to_string();
                check_label(&label)?;

                let category: Category = p
                    .category
                    .as_deref()
                    .ok_or(ValidationError::MissingCategory)?
                    .parse()?;

                let id = match p.id.as_deref().map(str::trim) {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => derive_symptom_id(&label)?,
                };

                Ok(Contribution::Symptom {
                    symptom: Symptom {
                        id,
                        label,
                        category,
                        origin: Origin::User,
                    },
                })
            }
            ContributionRequest::Rule(p) => {
                let diagnosis = p.diagnosis.trim().to_string();
                check_diagnosis(&diagnosis)?;

                let rule = Rule::new(
                    p.positive.into_iter().map(|s| s.trim().to_string()).collect(),
                    p.negative.into_iter().map(|s| s.trim().to_string()).collect(),
                    diagnosis,
                    Origin::User,
                )?;

                let clues = match p.weight {
                    Some(weight) => rule
                        .positive
                        .iter()
                        .map(|id| WeightedClue::new(id.clone(), rule.diagnosis.clone(), weight, Origin::User))
                        .collect::<Result<Vec<_>, _>>()?,
                    None => Vec::new(),
                };

                Ok(Contribution::Rule { rule, clues })
            }
        }
    }
}

/// Validates submissions and appends them to the user partition
#[derive(Clone)]
pub struct ContributionMerger {
    repository: Arc<KnowledgeRepository>,
}

impl ContributionMerger {
    pub fn new(repository: Arc<KnowledgeRepository>) -> Self {
        Self { repository }
    }

    pub fn submit(&self, request: ContributionRequest) -> Result<ContributionRecord, ContributionError> {
        let kind = request.kind();
        let result = request
            .into_contribution()
            .map_err(ContributionError::from)
            .and_then(|item| self.repository.contribute(item));

        if let Err(e) = &result {
            warn!("Rejected {:?} contribution: {}", kind, e);
        }
        result
    }
}
