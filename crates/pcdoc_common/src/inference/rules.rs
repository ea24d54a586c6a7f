//! Rule Engine
//!
//! Filters rules by the condition evaluator and ranks the satisfied ones:
//! specificity, then positive coverage, then static before user, then load
//! order. The ranking key ends in the load index, so it is total.

use super::conditions::{positive_coverage, satisfies};
use super::fallback::FallbackResolver;
use super::{DiagnosisResult, InferenceStrategy, Resolver};
use crate::knowledge::{KnowledgeBase, Rule, SymptomId};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    /// Only rules that explain every observed symptom may win
    require_full_coverage: bool,
    fallback: FallbackResolver,
}

impl RuleEngine {
    pub fn new(require_full_coverage: bool) -> Self {
        Self {
            require_full_coverage,
            fallback: FallbackResolver::new(),
        }
    }

    /// Highest-ranked satisfied rule, if any. With full coverage required,
    /// rules that leave an observed symptom unexplained are not candidates.
    pub fn select<'a>(&self, observed: &BTreeSet<SymptomId>, kb: &'a KnowledgeBase) -> Option<&'a Rule> {
        let satisfied: Vec<(usize, &Rule)> = kb
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| satisfies(rule, observed))
            .collect();

        debug!("{} of {} rules satisfied", satisfied.len(), kb.rules.len());

        let candidates: Vec<(usize, &Rule)> = if self.require_full_coverage {
            let covering: Vec<(usize, &Rule)> = satisfied
                .into_iter()
                .filter(|(_, rule)| Self::covers_all(rule, observed))
                .collect();
            debug!("{} satisfied rules cover every observed symptom", covering.len());
            covering
        } else {
            satisfied
        };

        candidates
            .into_iter()
            .min_by_key(|(index, rule)| {
                (
                    Reverse(rule.specificity()),
                    Reverse(positive_coverage(rule, observed)),
                    rule.origin.rank(),
                    *index,
                )
            })
            .map(|(_, rule)| rule)
    }

    fn covers_all(rule: &Rule, observed: &BTreeSet<SymptomId>) -> bool {
        observed
            .iter()
            .filter(|id| !rule.negative.contains(*id))
            .all(|id| rule.positive.contains(id))
    }
}

impl InferenceStrategy for RuleEngine {
    fn resolver(&self) -> Resolver {
        Resolver::Rules
    }

    fn evaluate(&self, observed: &BTreeSet<SymptomId>, kb: &KnowledgeBase) -> DiagnosisResult {
        let Some(rule) = self.select(observed, kb) else {
            debug!("No rule accepted, falling back");
            return self.fallback.resolve_with_hints(observed, kb);
        };

        debug!("Rule selected: '{}' (specificity {})", rule.diagnosis, rule.specificity());
        DiagnosisResult {
            diagnosis: rule.diagnosis.clone(),
            matched_symptoms: rule.positive.intersection(observed).cloned().collect(),
            confidence: None,
            rule_origin: rule.origin.into(),
            conclusive: true,
            resolved_by: Resolver::Rules,
            advice: None,
            unknown_symptoms: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{RuleOrigin, FALLBACK_DIAGNOSIS};
    use crate::knowledge::Origin;

    fn ids(list: &[&str]) -> BTreeSet<SymptomId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn rule(positive: &[&str], negative: &[&str], diagnosis: &str, origin: Origin) -> Rule {
        Rule::new(ids(positive), ids(negative), diagnosis, origin).unwrap()
    }

    fn kb(rules: Vec<Rule>) -> KnowledgeBase {
        KnowledgeBase {
            rules,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_match_wins() {
        let kb = kb(vec![rule(&["no_power", "beeps"], &[], "RAM or video failure", Origin::Static)]);
        let result = RuleEngine::default().evaluate(&ids(&["no_power", "beeps"]), &kb);

        assert!(result.conclusive);
        assert_eq!(result.diagnosis, "RAM or video failure");
        assert_eq!(result.matched_symptoms, ids(&["no_power", "beeps"]));
        assert_eq!(result.confidence, None);
        assert_eq!(result.rule_origin, RuleOrigin::Static);
    }

    #[test]
    fn test_partial_match_falls_back() {
        let kb = kb(vec![rule(&["no_power", "beeps"], &[], "RAM or video failure", Origin::Static)]);
        let result = RuleEngine::default().evaluate(&ids(&["no_power"]), &kb);

        assert!(!result.conclusive);
        assert_eq!(result.diagnosis, FALLBACK_DIAGNOSIS);
        assert_eq!(result.resolved_by, Resolver::Fallback);
    }

    #[test]
    fn test_more_specific_rule_wins_regardless_of_order() {
        let general = rule(&["a"], &[], "general", Origin::Static);
        let specific = rule(&["a", "b"], &[], "specific", Origin::Static);
        let observed = ids(&["a", "b"]);

        let forward = kb(vec![general.clone(), specific.clone()]);
        let backward = kb(vec![specific, general]);

        assert_eq!(RuleEngine::default().evaluate(&observed, &forward).diagnosis, "specific");
        assert_eq!(RuleEngine::default().evaluate(&observed, &backward).diagnosis, "specific");
    }

    #[test]
    fn test_negated_conditions_count_toward_specificity() {
        let plain = rule(&["a"], &[], "plain", Origin::Static);
        let guarded = rule(&["a"], &["b"], "guarded", Origin::Static);
        let result = RuleEngine::default().evaluate(&ids(&["a"]), &kb(vec![plain, guarded]));
        assert_eq!(result.diagnosis, "guarded");
    }

    #[test]
    fn test_static_beats_user_on_tie() {
        let user = rule(&["a"], &[], "user", Origin::User);
        let stat = rule(&["a"], &[], "static", Origin::Static);
        let result = RuleEngine::default().evaluate(&ids(&["a"]), &kb(vec![user, stat]));
        assert_eq!(result.diagnosis, "static");
        assert_eq!(result.rule_origin, RuleOrigin::Static);
    }

    #[test]
    fn test_load_order_breaks_remaining_ties() {
        let first = rule(&["a"], &[], "first", Origin::Static);
        let second = rule(&["b"], &[], "second", Origin::Static);
        let result = RuleEngine::default().evaluate(&ids(&["a", "b"]), &kb(vec![first, second]));
        assert_eq!(result.diagnosis, "first");
    }

    #[test]
    fn test_full_coverage_rejects_unexplained_symptoms() {
        let kb = kb(vec![rule(&["a"], &["c"], "only a", Origin::Static)]);
        let strict = RuleEngine::new(true);

        assert!(strict.evaluate(&ids(&["a"]), &kb).conclusive);
        assert!(!strict.evaluate(&ids(&["a", "b"]), &kb).conclusive);
        assert!(RuleEngine::new(false).evaluate(&ids(&["a", "b"]), &kb).conclusive);
    }

    #[test]
    fn test_full_coverage_considers_less_specific_rules() {
        let guarded = rule(&["a"], &["x", "y"], "guarded a only", Origin::Static);
        let pair = rule(&["a", "b"], &[], "explains a and b", Origin::Static);
        let kb = kb(vec![guarded, pair]);
        let observed = ids(&["a", "b"]);

        // Without the gate the guarded rule wins on specificity
        assert_eq!(RuleEngine::new(false).evaluate(&observed, &kb).diagnosis, "guarded a only");

        let result = RuleEngine::new(true).evaluate(&observed, &kb);
        assert!(result.conclusive);
        assert_eq!(result.diagnosis, "explains a and b");
        assert_eq!(result.resolved_by, Resolver::Rules);
        assert_eq!(result.matched_symptoms, observed);
    }

    #[test]
    fn test_deterministic() {
        let kb = kb(vec![
            rule(&["a"], &[], "one", Origin::Static),
            rule(&["b"], &[], "two", Origin::User),
            rule(&["a", "b"], &["c"], "three", Origin::User),
        ]);
        let observed = ids(&["a", "b"]);
        let engine = RuleEngine::default();
        let first = engine.evaluate(&observed, &kb);
        for _ in 0..10 {
            assert_eq!(engine.evaluate(&observed, &kb), first);
        }
        assert_eq!(first.diagnosis, "three");
    }
}
