//! Scoring Engine
//!
//! Sums clue weights per diagnosis over the observed symptoms. Confidence is
//! the raw weight total, on the same scale as the threshold.

use super::fallback::FallbackResolver;
use super::{DiagnosisResult, InferenceStrategy, Resolver, RuleOrigin};
use crate::knowledge::{KnowledgeBase, Origin, SymptomId};
use std::collections::BTreeSet;
use tracing::debug;

/// Minimum accumulated weight for a conclusive scoring result
pub const DEFAULT_SCORING_THRESHOLD: f64 = 10.0;

/// Accumulated weight of one diagnosis
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisScore {
    pub diagnosis: String,
    pub total: f64,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    threshold: f64,
    fallback: FallbackResolver,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SCORING_THRESHOLD)
    }
}

impl ScoringEngine {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            fallback: FallbackResolver::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Totals for every diagnosis label, in order of first appearance
    pub fn scores(&self, observed: &BTreeSet<SymptomId>, kb: &KnowledgeBase) -> Vec<DiagnosisScore> {
        let mut scores: Vec<DiagnosisScore> = Vec::new();

        for clue in &kb.clues {
            let index = match scores.iter().position(|s| s.diagnosis == clue.diagnosis) {
                Some(index) => index,
                None => {
                    scores.push(DiagnosisScore {
                        diagnosis: clue.diagnosis.clone(),
                        total: 0.0,
                    });
                    scores.len() - 1
                }
            };

            if observed.contains(&clue.symptom) {
                scores[index].total += clue.weight;
            }
        }

        scores
    }

    /// First diagnosis with the maximal total
    fn best(scores: &[DiagnosisScore]) -> Option<&DiagnosisScore> {
        scores.iter().fold(None, |best: Option<&DiagnosisScore>, s| match best {
            Some(b) if b.total >= s.total => Some(b),
            _ => Some(s),
        })
    }
}

impl InferenceStrategy for ScoringEngine {
    fn resolver(&self) -> Resolver {
        Resolver::Scoring
    }

    fn evaluate(&self, observed: &BTreeSet<SymptomId>, kb: &KnowledgeBase) -> DiagnosisResult {
        let scores = self.scores(observed, kb);

        let Some(best) = Self::best(&scores) else {
            debug!("No clues in knowledge base, falling back");
            return self.fallback.resolve_with_hints(observed, kb);
        };

        if best.total <= 0.0 || best.total < self.threshold {
            debug!(
                "Best score {} for '{}' below threshold {}, falling back",
                best.total, best.diagnosis, self.threshold
            );
            return self.fallback.resolve_with_hints(observed, kb);
        }

        let contributing: Vec<_> = kb
            .clues
            .iter()
            .filter(|c| c.diagnosis == best.diagnosis && observed.contains(&c.symptom))
            .collect();

        let origin = if contributing.iter().any(|c| c.origin == Origin::User) {
            RuleOrigin::User
        } else {
            RuleOrigin::Static
        };

        debug!("Scoring selected '{}' with {}", best.diagnosis, best.total);
        DiagnosisResult {
            diagnosis: best.diagnosis.clone(),
            matched_symptoms: contributing.iter().map(|c| c.symptom.clone()).collect(),
            confidence: Some(best.total),
            rule_origin: origin,
            conclusive: true,
            resolved_by: Resolver::Scoring,
            advice: None,
            unknown_symptoms: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::WeightedClue;

    fn ids(list: &[&str]) -> BTreeSet<SymptomId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn clue(symptom: &str, diagnosis: &str, weight: f64) -> WeightedClue {
        WeightedClue::new(symptom, diagnosis, weight, Origin::Static).unwrap()
    }

    fn kb(clues: Vec<WeightedClue>) -> KnowledgeBase {
        KnowledgeBase {
            clues,
            ..Default::default()
        }
    }

    #[test]
    fn test_weights_are_additive() {
        let kb = kb(vec![clue("a", "D", 10.0), clue("b", "D", 15.0)]);
        let result = ScoringEngine::default().evaluate(&ids(&["a", "b"]), &kb);

        assert!(result.conclusive);
        assert_eq!(result.diagnosis, "D");
        assert_eq!(result.confidence, Some(25.0));
        assert_eq!(result.matched_symptoms, ids(&["a", "b"]));
    }

    #[test]
    fn test_below_threshold_falls_back() {
        let kb = kb(vec![clue("a", "D", 5.0)]);
        let result = ScoringEngine::new(10.0).evaluate(&ids(&["a"]), &kb);

        assert!(!result.conclusive);
        assert_eq!(result.resolved_by, Resolver::Fallback);
        assert_eq!(result.confidence, None);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let kb = kb(vec![clue("a", "D", 10.0)]);
        assert!(ScoringEngine::new(10.0).evaluate(&ids(&["a"]), &kb).conclusive);
    }

    #[test]
    fn test_zero_threshold_still_needs_evidence() {
        let kb = kb(vec![clue("a", "D", 10.0)]);
        assert!(!ScoringEngine::new(0.0).evaluate(&ids(&["zzz"]), &kb).conclusive);
    }

    #[test]
    fn test_tie_goes_to_first_registered_diagnosis() {
        let kb = kb(vec![
            clue("x", "Second", 1.0),
            clue("a", "First", 12.0),
            clue("b", "Second", 11.0),
        ]);
        // Second appears first in the clue list
        let result = ScoringEngine::default().evaluate(&ids(&["a", "b", "x"]), &kb);
        assert_eq!(result.diagnosis, "Second");
        assert_eq!(result.confidence, Some(12.0));
    }

    #[test]
    fn test_unmatched_symptom_contributes_nothing() {
        let kb = kb(vec![clue("a", "D", 20.0)]);
        let result = ScoringEngine::default().evaluate(&ids(&["a", "nothing"]), &kb);
        assert_eq!(result.confidence, Some(20.0));
        assert_eq!(result.matched_symptoms, ids(&["a"]));
    }

    #[test]
    fn test_scores_in_registration_order() {
        let kb = kb(vec![clue("a", "One", 1.0), clue("b", "Two", 2.0), clue("c", "One", 3.0)]);
        let scores = ScoringEngine::default().scores(&ids(&["a", "b", "c"]), &kb);
        let labels: Vec<_> = scores.iter().map(|s| s.diagnosis.as_str()).collect();
        assert_eq!(labels, vec!["One", "Two"]);
        assert_eq!(scores[0].total, 4.0);
    }

    #[test]
    fn test_user_clue_marks_origin() {
        let mut kb = kb(vec![clue("a", "D", 5.0)]);
        kb.clues.push(WeightedClue::new("b", "D", 6.0, Origin::User).unwrap());
        let result = ScoringEngine::default().evaluate(&ids(&["a", "b"]), &kb);
        assert_eq!(result.rule_origin, RuleOrigin::User);
    }
}
