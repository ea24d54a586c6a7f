//! Inference
//!
//! Strategies that turn an observed symptom set into a diagnosis. Every
//! strategy is total: when it cannot conclude, it hands over to the
//! fallback resolver, so a caller always gets a `DiagnosisResult`.

pub mod conditions;
pub mod fallback;
pub mod rules;
pub mod scoring;

pub use conditions::*;
pub use fallback::*;
pub use rules::*;
pub use scoring::*;

use crate::knowledge::{KnowledgeBase, Origin, SymptomId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Strategy requested by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Strict positive/negative rule matching
    #[default]
    Rules,
    /// Weighted clue accumulation against a threshold
    Scoring,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Rules => "rules",
            Strategy::Scoring => "scoring",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rules" => Ok(Strategy::Rules),
            "scoring" => Ok(Strategy::Scoring),
            other => Err(format!("unknown strategy '{}' (expected rules or scoring)", other)),
        }
    }
}

/// Which component produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolver {
    Rules,
    Scoring,
    Fallback,
}

/// Provenance of the knowledge behind a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOrigin {
    Static,
    User,
    None,
}

impl From<Origin> for RuleOrigin {
    fn from(origin: Origin) -> Self {
        match origin {
            Origin::Static => RuleOrigin::Static,
            Origin::User => RuleOrigin::User,
        }
    }
}

/// Outcome of one evaluation. Created per call, never stored by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub diagnosis: String,
    pub matched_symptoms: BTreeSet<SymptomId>,
    /// Accumulated weight for scoring results; unset for rule results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub rule_origin: RuleOrigin,
    pub conclusive: bool,
    pub resolved_by: Resolver,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    /// Observed ids absent from the knowledge base
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_symptoms: Vec<SymptomId>,
}

/// Common interface of the rule, scoring and fallback strategies
pub trait InferenceStrategy: Send + Sync {
    fn resolver(&self) -> Resolver;

    /// Evaluate the observed set. Never fails; falls back when inconclusive.
    fn evaluate(&self, observed: &BTreeSet<SymptomId>, kb: &KnowledgeBase) -> DiagnosisResult;
}

/// Build the strategy selected by `strategy`
pub fn build_strategy(strategy: Strategy, settings: &InferenceSettings) -> Box<dyn InferenceStrategy> {
    match strategy {
        Strategy::Rules => Box::new(RuleEngine::new(settings.require_full_coverage)),
        Strategy::Scoring => Box::new(ScoringEngine::new(settings.scoring_threshold)),
    }
}

/// Tunables shared by the strategies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceSettings {
    pub scoring_threshold: f64,
    pub require_full_coverage: bool,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            scoring_threshold: DEFAULT_SCORING_THRESHOLD,
            require_full_coverage: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!("RULES".parse::<Strategy>(), Ok(Strategy::Rules));
        assert_eq!("scoring".parse::<Strategy>(), Ok(Strategy::Scoring));
        assert!("ml".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_result_uses_camel_case_fields() {
        let result = DiagnosisResult {
            diagnosis: "d".into(),
            matched_symptoms: BTreeSet::from(["a".to_string()]),
            confidence: None,
            rule_origin: RuleOrigin::Static,
            conclusive: true,
            resolved_by: Resolver::Rules,
            advice: None,
            unknown_symptoms: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["matchedSymptoms"][0], "a");
        assert_eq!(json["ruleOrigin"], "static");
        assert!(json.get("confidence").is_none());
        assert!(json.get("unknownSymptoms").is_none());
    }
}
