//! Fallback Resolver
//!
//! Terminal default when no strategy concludes. Deterministic stand-in for
//! a learned model: it never names a cause, only offers advice.

use super::{DiagnosisResult, InferenceStrategy, Resolver, RuleOrigin};
use crate::knowledge::{KnowledgeBase, SymptomId};
use std::collections::BTreeSet;
use tracing::debug;

/// Diagnosis text of every inconclusive result
pub const FALLBACK_DIAGNOSIS: &str = "no definitive match";

const ADVICE_EMPTY: &str = "Select at least one symptom to get a diagnosis.";
const ADVICE_GENERIC: &str = "The selected symptoms do not match a known fault. \
    Describe the problem as a contribution so it can be added to the knowledge base.";

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackResolver;

impl FallbackResolver {
    pub fn new() -> Self {
        Self
    }

    /// Inconclusive result with no knowledge-specific advice. Never fails.
    pub fn resolve(&self, observed: &BTreeSet<SymptomId>) -> DiagnosisResult {
        let advice = if observed.is_empty() {
            ADVICE_EMPTY
        } else {
            ADVICE_GENERIC
        };
        inconclusive(observed, advice.to_string())
    }

    /// Like `resolve`, but consults the knowledge base first: a
    /// single-symptom hint, then the first matching combination hint.
    pub fn resolve_with_hints(&self, observed: &BTreeSet<SymptomId>, kb: &KnowledgeBase) -> DiagnosisResult {
        if observed.len() == 1 {
            if let Some(hint) = observed.iter().next().and_then(|id| kb.hints.get(id)) {
                debug!("Fallback using single-symptom hint for {:?}", observed);
                return inconclusive(observed, hint.clone());
            }
        }

        if !observed.is_empty() {
            if let Some((i, hint)) = kb
                .combination_hints
                .iter()
                .enumerate()
                .find(|(_, hint)| hint.matches(observed))
            {
                debug!("Fallback using combination hint {} for {:?}", i + 1, observed);
                return inconclusive(observed, hint.advice.clone());
            }
        }

        self.resolve(observed)
    }
}

impl InferenceStrategy for FallbackResolver {
    fn resolver(&self) -> Resolver {
        Resolver::Fallback
    }

    fn evaluate(&self, observed: &BTreeSet<SymptomId>, kb: &KnowledgeBase) -> DiagnosisResult {
        self.resolve_with_hints(observed, kb)
    }
}

fn inconclusive(observed: &BTreeSet<SymptomId>, advice: String) -> DiagnosisResult {
    DiagnosisResult {
        diagnosis: FALLBACK_DIAGNOSIS.to_string(),
        matched_symptoms: observed.clone(),
        confidence: None,
        rule_origin: RuleOrigin::None,
        conclusive: false,
        resolved_by: Resolver::Fallback,
        advice: Some(advice),
        unknown_symptoms: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::CombinationHint;

    fn ids(list: &[&str]) -> BTreeSet<SymptomId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_is_inconclusive() {
        let result = FallbackResolver::new().resolve(&ids(&["a", "b"]));
        assert!(!result.conclusive);
        assert_eq!(result.diagnosis, FALLBACK_DIAGNOSIS);
        assert_eq!(result.matched_symptoms, ids(&["a", "b"]));
        assert_eq!(result.rule_origin, RuleOrigin::None);
    }

    #[test]
    fn test_empty_set_asks_for_symptoms() {
        let result = FallbackResolver::new().resolve(&ids(&[]));
        assert_eq!(result.advice.as_deref(), Some(ADVICE_EMPTY));
    }

    #[test]
    fn test_single_symptom_hint() {
        let mut kb = KnowledgeBase::default();
        kb.hints.insert("slow".into(), "Check startup programs.".into());

        let fallback = FallbackResolver::new();
        let hinted = fallback.evaluate(&ids(&["slow"]), &kb);
        assert_eq!(hinted.advice.as_deref(), Some("Check startup programs."));

        let two = fallback.evaluate(&ids(&["slow", "other"]), &kb);
        assert_eq!(two.advice.as_deref(), Some(ADVICE_GENERIC));
    }

    fn combination_kb() -> KnowledgeBase {
        let hint = |all: &[&str], any: &[&str], none: &[&str], advice: &str| {
            CombinationHint::new(ids(all), ids(any), ids(none), advice).unwrap()
        };

        let mut kb = KnowledgeBase::default();
        kb.hints.insert("slow".into(), "Check startup programs.".into());
        kb.combination_hints = vec![
            hint(&["slow"], &["no_wifi", "wifi_no_internet"], &[], "Look for bandwidth hogs."),
            hint(&["slow"], &["apps_crash", "blue_screen"], &[], "Update the system and test RAM."),
            hint(&["artifacts"], &["slow", "apps_crash"], &[], "Clean-install the GPU driver."),
            hint(&[], &["no_wifi", "wifi_no_internet"], &["slow"], "Check IP and DNS settings."),
        ];
        kb
    }

    #[test]
    fn test_combination_hint_slow_and_wifi() {
        let kb = combination_kb();
        let result = FallbackResolver::new().evaluate(&ids(&["slow", "wifi_no_internet"]), &kb);
        assert!(!result.conclusive);
        assert_eq!(result.diagnosis, FALLBACK_DIAGNOSIS);
        assert_eq!(result.advice.as_deref(), Some("Look for bandwidth hogs."));
    }

    #[test]
    fn test_combination_hint_artifacts_and_crash() {
        let kb = combination_kb();
        let result = FallbackResolver::new().evaluate(&ids(&["artifacts", "apps_crash"]), &kb);
        assert_eq!(result.advice.as_deref(), Some("Clean-install the GPU driver."));
    }

    #[test]
    fn test_combination_hint_first_match_wins() {
        let kb = combination_kb();
        // Matches both the wifi and the crash combinations
        let result = FallbackResolver::new().evaluate(&ids(&["slow", "no_wifi", "apps_crash"]), &kb);
        assert_eq!(result.advice.as_deref(), Some("Look for bandwidth hogs."));
    }

    #[test]
    fn test_combination_hint_excluded_symptom() {
        let kb = combination_kb();
        let fallback = FallbackResolver::new();

        let wifi = fallback.evaluate(&ids(&["no_wifi", "peripheral"]), &kb);
        assert_eq!(wifi.advice.as_deref(), Some("Check IP and DNS settings."));

        let unmatched = fallback.evaluate(&ids(&["slow", "peripheral"]), &kb);
        assert_eq!(unmatched.advice.as_deref(), Some(ADVICE_GENERIC));
    }

    #[test]
    fn test_single_symptom_hint_precedes_combinations() {
        let kb = combination_kb();
        let result = FallbackResolver::new().evaluate(&ids(&["slow"]), &kb);
        assert_eq!(result.advice.as_deref(), Some("Check startup programs."));
    }
}
