//! Knowledge Schema
//!
//! Symptoms, rules and weighted clues, each tagged with its origin.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Identifier of a symptom (e.g. "no_power")
pub type SymptomId = String;

/// Symptom category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hardware,
    Software,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hardware => "hardware",
            Category::Software => "software",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" => Err(ValidationError::MissingCategory),
            "hardware" => Ok(Category::Hardware),
            "software" => Ok(Category::Software),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

/// Where a knowledge item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Shipped knowledge base, read-only for the process lifetime
    Static,
    /// Contributed by a user at runtime, provisional until curated
    User,
}

impl Origin {
    /// Ranking key: static knowledge outranks contributions on ties
    pub fn rank(&self) -> u8 {
        match self {
            Origin::Static => 0,
            Origin::User => 1,
        }
    }
}

/// An observable fact a user selects as present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symptom {
    pub id: SymptomId,
    pub label: String,
    pub category: Category,
    pub origin: Origin,
}

impl Symptom {
    /// Label with a "[contributed]" tag for user symptoms
    pub fn display_label(&self) -> String {
        match self.origin {
            Origin::Static => self.label.clone(),
            Origin::User => format!("{} [contributed]", self.label),
        }
    }
}

/// Condition set mapping to one diagnosis, evaluated all-or-nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub positive: BTreeSet<SymptomId>,
    pub negative: BTreeSet<SymptomId>,
    pub diagnosis: String,
    pub origin: Origin,
}

impl Rule {
    /// Build a rule, rejecting an empty positive set or overlapping conditions
    pub fn new(
        positive: BTreeSet<SymptomId>,
        negative: BTreeSet<SymptomId>,
        diagnosis: impl Into<String>,
        origin: Origin,
    ) -> Result<Self, ValidationError> {
        if positive.is_empty() {
            return Err(ValidationError::EmptyPositive);
        }

        let overlap: Vec<String> = positive.intersection(&negative).cloned().collect();
        if !overlap.is_empty() {
            return Err(ValidationError::OverlappingConditions(overlap));
        }

        Ok(Self {
            positive,
            negative,
            diagnosis: diagnosis.into(),
            origin,
        })
    }

    /// Number of conditions; larger is more specific
    pub fn specificity(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    /// Every symptom id this rule mentions
    pub fn referenced_ids(&self) -> impl Iterator<Item = &SymptomId> {
        self.positive.iter().chain(self.negative.iter())
    }
}

/// A (symptom, diagnosis, weight) triple used by the scoring strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedClue {
    pub symptom: SymptomId,
    pub diagnosis: String,
    pub weight: f64,
    pub origin: Origin,
}

impl WeightedClue {
    pub fn new(
        symptom: impl Into<SymptomId>,
        diagnosis: impl Into<String>,
        weight: f64,
        origin: Origin,
    ) -> Result<Self, ValidationError> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ValidationError::NonPositiveWeight(weight));
        }

        Ok(Self {
            symptom: symptom.into(),
            diagnosis: diagnosis.into(),
            weight,
            origin,
        })
    }
}

/// Advice for a combination of observed symptoms that no rule explains.
///
/// Matches when every `all` symptom is observed, at least one `any` symptom
/// is observed (if `any` is non-empty) and no `none` symptom is observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationHint {
    #[serde(default)]
    pub all: BTreeSet<SymptomId>,
    #[serde(default)]
    pub any: BTreeSet<SymptomId>,
    #[serde(default)]
    pub none: BTreeSet<SymptomId>,
    pub advice: String,
}

impl CombinationHint {
    pub fn new(
        all: BTreeSet<SymptomId>,
        any: BTreeSet<SymptomId>,
        none: BTreeSet<SymptomId>,
        advice: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        // With nothing required the hint would match every observation
        if all.is_empty() && any.is_empty() {
            return Err(ValidationError::EmptyHintConditions);
        }

        Ok(Self {
            all,
            any,
            none,
            advice: advice.into(),
        })
    }

    pub fn matches(&self, observed: &BTreeSet<SymptomId>) -> bool {
        self.all.is_subset(observed)
            && (self.any.is_empty() || !self.any.is_disjoint(observed))
            && self.none.is_disjoint(observed)
    }

    pub fn referenced_ids(&self) -> impl Iterator<Item = &SymptomId> {
        self.all.iter().chain(self.any.iter()).chain(self.none.iter())
    }
}

/// Rules, symptoms and clues in load order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeBase {
    pub symptoms: Vec<Symptom>,
    pub rules: Vec<Rule>,
    pub clues: Vec<WeightedClue>,
    /// Advice shown when exactly one symptom is observed and no rule matches
    pub hints: BTreeMap<SymptomId, String>,
    /// Fallback advice for symptom combinations, first match wins
    pub combination_hints: Vec<CombinationHint>,
}

impl KnowledgeBase {
    pub fn symptom(&self, id: &str) -> Option<&Symptom> {
        self.symptoms.iter().find(|s| s.id == id)
    }

    pub fn has_symptom(&self, id: &str) -> bool {
        self.symptom(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty() && self.rules.is_empty() && self.clues.is_empty()
    }

    /// Concatenate `first` then `second`, preserving order within each
    pub fn concat(first: &KnowledgeBase, second: &KnowledgeBase) -> KnowledgeBase {
        let mut hints = first.hints.clone();
        for (id, hint) in &second.hints {
            hints.entry(id.clone()).or_insert_with(|| hint.clone());
        }

        KnowledgeBase {
            symptoms: first.symptoms.iter().chain(&second.symptoms).cloned().collect(),
            rules: first.rules.iter().chain(&second.rules).cloned().collect(),
            clues: first.clues.iter().chain(&second.clues).cloned().collect(),
            hints,
            combination_hints: first
                .combination_hints
                .iter()
                .chain(&second.combination_hints)
                .cloned()
                .collect(),
        }
    }

    /// Distinct categories that have at least one symptom, sorted
    pub fn categories(&self) -> Vec<Category> {
        let set: BTreeSet<Category> = self.symptoms.iter().map(|s| s.category).collect();
        set.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> BTreeSet<SymptomId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("Hardware".parse::<Category>(), Ok(Category::Hardware));
        assert_eq!(" software ".parse::<Category>(), Ok(Category::Software));
        assert_eq!("".parse::<Category>(), Err(ValidationError::MissingCategory));
        assert_eq!(
            "network".parse::<Category>(),
            Err(ValidationError::UnknownCategory("network".to_string()))
        );
    }

    #[test]
    fn test_rule_specificity_counts_both_sides() {
        let rule = Rule::new(ids(&["a", "b"]), ids(&["c"]), "diag", Origin::Static).unwrap();
        assert_eq!(rule.specificity(), 3);
    }

    #[test]
    fn test_rule_rejects_empty_positive() {
        let err = Rule::new(ids(&[]), ids(&["c"]), "diag", Origin::Static).unwrap_err();
        assert_eq!(err, ValidationError::EmptyPositive);
    }

    #[test]
    fn test_rule_rejects_overlap() {
        let err = Rule::new(ids(&["a", "b"]), ids(&["b"]), "diag", Origin::Static).unwrap_err();
        assert_eq!(err, ValidationError::OverlappingConditions(vec!["b".to_string()]));
    }

    #[test]
    fn test_clue_rejects_non_positive_weight() {
        assert!(WeightedClue::new("a", "d", 0.0, Origin::Static).is_err());
        assert!(WeightedClue::new("a", "d", -3.0, Origin::Static).is_err());
        assert!(WeightedClue::new("a", "d", f64::NAN, Origin::Static).is_err());
        assert!(WeightedClue::new("a", "d", 0.5, Origin::Static).is_ok());
    }

    #[test]
    fn test_display_label_tags_contributions() {
        let symptom = Symptom {
            id: "x".into(),
            label: "Fan makes a grinding noise".into(),
            category: Category::Hardware,
            origin: Origin::User,
        };
        assert_eq!(symptom.display_label(), "Fan makes a grinding noise [contributed]");
    }

    #[test]
    fn test_concat_keeps_static_first() {
        let mut a = KnowledgeBase::default();
        a.symptoms.push(Symptom {
            id: "s1".into(),
            label: "first symptom".into(),
            category: Category::Software,
            origin: Origin::Static,
        });
        let mut b = KnowledgeBase::default();
        b.symptoms.push(Symptom {
            id: "u1".into(),
            label: "user symptom".into(),
            category: Category::Hardware,
            origin: Origin::User,
        });

        let merged = KnowledgeBase::concat(&a, &b);
        let order: Vec<_> = merged.symptoms.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["s1", "u1"]);
        assert_eq!(merged.categories(), vec![Category::Hardware, Category::Software]);
    }
}
