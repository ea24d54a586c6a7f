//! Knowledge Validation
//!
//! Cross-reference checks for the static knowledge base and field checks
//! for user contributions.

use super::schema::{KnowledgeBase, Rule, Symptom};
use super::store::Contribution;
use crate::error::{KnowledgeLoadError, ValidationError, MIN_DIAGNOSIS_CHARS, MIN_LABEL_CHARS};
use std::collections::HashSet;

/// Check a symptom label against the minimum length (inclusive)
pub fn check_label(label: &str) -> Result<(), ValidationError> {
    let len = label.trim().chars().count();
    if len < MIN_LABEL_CHARS {
        return Err(ValidationError::LabelTooShort {
            len,
            min: MIN_LABEL_CHARS,
        });
    }
    Ok(())
}

/// Check a diagnosis text against the minimum length (inclusive)
pub fn check_diagnosis(text: &str) -> Result<(), ValidationError> {
    let len = text.trim().chars().count();
    if len < MIN_DIAGNOSIS_CHARS {
        return Err(ValidationError::DiagnosisTooShort {
            len,
            min: MIN_DIAGNOSIS_CHARS,
        });
    }
    Ok(())
}

/// Derive a symptom id from a free-text label: "user_" + lowercase words.
/// Fails when the label has no alphanumeric characters.
pub fn derive_symptom_id(label: &str) -> Result<String, ValidationError> {
    let words: Vec<String> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    if words.is_empty() {
        return Err(ValidationError::EmptySymptomId);
    }
    Ok(format!("user_{}", words.join("_")))
}

/// Verify the static partition: unique ids and no dangling references.
///
/// Field-level invariants (empty positive set, overlap, weights) are
/// enforced when the items are constructed.
pub fn validate_static(kb: &KnowledgeBase) -> Result<(), KnowledgeLoadError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for symptom in &kb.symptoms {
        if symptom.id.trim().is_empty() {
            return Err(invalid("symptoms", ValidationError::EmptySymptomId));
        }
        if !seen.insert(symptom.id.as_str()) {
            return Err(invalid(
                "symptoms",
                ValidationError::DuplicateSymptom(symptom.id.clone()),
            ));
        }
    }

    for (i, rule) in kb.rules.iter().enumerate() {
        if let Some(id) = rule.referenced_ids().find(|id| !seen.contains(id.as_str())) {
            return Err(invalid(
                &format!("rule {} '{}'", i + 1, preview(&rule.diagnosis)),
                ValidationError::UnknownSymptom(id.clone()),
            ));
        }
    }

    for (i, clue) in kb.clues.iter().enumerate() {
        if !seen.contains(clue.symptom.as_str()) {
            return Err(invalid(
                &format!("clue {} '{}'", i + 1, preview(&clue.diagnosis)),
                ValidationError::UnknownSymptom(clue.symptom.clone()),
            ));
        }
    }

    for id in kb.hints.keys() {
        if !seen.contains(id.as_str()) {
            return Err(invalid(
                "single_symptom_hints",
                ValidationError::UnknownSymptom(id.clone()),
            ));
        }
    }

    for (i, hint) in kb.combination_hints.iter().enumerate() {
        if let Some(id) = hint.referenced_ids().find(|id| !seen.contains(id.as_str())) {
            return Err(invalid(
                &format!("combination hint {}", i + 1),
                ValidationError::UnknownSymptom(id.clone()),
            ));
        }
    }

    Ok(())
}

/// Validate a contribution against the current merged knowledge base
pub fn validate_contribution(item: &Contribution, merged: &KnowledgeBase) -> Result<(), ValidationError> {
    match item {
        Contribution::Symptom { symptom } => validate_symptom(symptom, merged),
        Contribution::Rule { rule, clues } => {
            validate_rule(rule, merged)?;
            for clue in clues {
                if !clue.weight.is_finite() || clue.weight <= 0.0 {
                    return Err(ValidationError::NonPositiveWeight(clue.weight));
                }
                if !merged.has_symptom(&clue.symptom) {
                    return Err(ValidationError::UnknownSymptom(clue.symptom.clone()));
                }
                check_diagnosis(&clue.diagnosis)?;
            }
            Ok(())
        }
    }
}

fn validate_symptom(symptom: &Symptom, merged: &KnowledgeBase) -> Result<(), ValidationError> {
    if symptom.id.trim().is_empty() {
        return Err(ValidationError::EmptySymptomId);
    }
    check_label(&symptom.label)?;
    if merged.has_symptom(&symptom.id) {
        return Err(ValidationError::DuplicateSymptom(symptom.id.clone()));
    }
    Ok(())
}

fn validate_rule(rule: &Rule, merged: &KnowledgeBase) -> Result<(), ValidationError> {
    check_diagnosis(&rule.diagnosis)?;

    // Rules deserialized from the contribution log bypass Rule::new
    Rule::new(
        rule.positive.clone(),
        rule.negative.clone(),
        rule.diagnosis.clone(),
        rule.origin,
    )?;

    if let Some(id) = rule.referenced_ids().find(|id| !merged.has_symptom(id)) {
        return Err(ValidationError::UnknownSymptom(id.clone()));
    }
    Ok(())
}

fn invalid(context: &str, source: ValidationError) -> KnowledgeLoadError {
    KnowledgeLoadError::Invalid {
        context: context.to_string(),
        source,
    }
}

fn preview(text: &str) -> String {
    text.chars().take(30).collect()
}
