//! Condition evaluation
//!
//! Open-world semantics: a symptom that was not observed counts as absent.

use crate::knowledge::{Rule, SymptomId};
use std::collections::BTreeSet;

/// True iff every positive condition is observed and no negative one is
pub fn satisfies(rule: &Rule, observed: &BTreeSet<SymptomId>) -> bool {
    rule.positive.iter().all(|id| observed.contains(id))
        && !rule.negative.iter().any(|id| observed.contains(id))
}

/// Number of the rule's positive conditions present in `observed`
pub fn positive_coverage(rule: &Rule, observed: &BTreeSet<SymptomId>) -> usize {
    rule.positive.intersection(observed).count()
}
