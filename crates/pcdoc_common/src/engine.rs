//! Diagnosis Engine
//!
//! Entry point for callers: evaluate a symptom set, list symptoms and
//! categories, submit contributions. Holds no per-call state, so concurrent
//! evaluations do not interfere.

use crate::config::{InferenceConfig, PcdocConfig};
use crate::contribution::{ContributionMerger, ContributionRequest};
use crate::error::{ContributionError, KnowledgeLoadError};
use crate::inference::{build_strategy, DiagnosisResult, InferenceSettings, Strategy};
use crate::knowledge::{
    Category, ContributionRecord, KnowledgeRepository, KnowledgeSource, Symptom, SymptomId,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DiagnosisEngine {
    repository: Arc<KnowledgeRepository>,
    merger: ContributionMerger,
    settings: InferenceSettings,
    default_strategy: Strategy,
}

impl DiagnosisEngine {
    pub fn new(repository: Arc<KnowledgeRepository>, inference: &InferenceConfig) -> Self {
        Self {
            merger: ContributionMerger::new(Arc::clone(&repository)),
            repository,
            settings: inference.settings(),
            default_strategy: inference.default_strategy,
        }
    }

    /// Load knowledge from `source`. Fails if the static partition is invalid.
    pub fn with_source(
        source: Arc<dyn KnowledgeSource>,
        inference: &InferenceConfig,
    ) -> Result<Self, KnowledgeLoadError> {
        let repository = Arc::new(KnowledgeRepository::load(source)?);
        Ok(Self::new(repository, inference))
    }

    /// Load knowledge from the files named in `config`
    pub fn from_config(config: &PcdocConfig) -> Result<Self, KnowledgeLoadError> {
        Self::with_source(Arc::new(config.knowledge.source()), &config.inference)
    }

    pub fn default_strategy(&self) -> Strategy {
        self.default_strategy
    }

    pub fn repository(&self) -> &Arc<KnowledgeRepository> {
        &self.repository
    }

    /// Diagnose `observed` with the given strategy. Total: never fails.
    ///
    /// Ids missing from the knowledge base simply match nothing; they are
    /// reported back in `unknown_symptoms`.
    pub fn evaluate(&self, observed: &BTreeSet<SymptomId>, strategy: Strategy) -> DiagnosisResult {
        let kb = self.repository.merged();

        let unknown: Vec<SymptomId> = observed
            .iter()
            .filter(|id| !kb.has_symptom(id))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            warn!("Unknown symptom ids in request: {:?}", unknown);
        }

        debug!("Evaluating {} symptoms with {} strategy", observed.len(), strategy);
        let mut result = build_strategy(strategy, &self.settings).evaluate(observed, &kb);
        result.unknown_symptoms = unknown;
        result
    }

    /// Symptoms in load order (static first), optionally filtered by category
    pub fn list_symptoms(&self, category: Option<Category>) -> Vec<Symptom> {
        self.repository
            .merged()
            .symptoms
            .into_iter()
            .filter(|s| category.map_or(true, |c| s.category == c))
            .collect()
    }

    pub fn list_categories(&self) -> Vec<Category> {
        self.repository.merged().categories()
    }

    pub fn submit_contribution(
        &self,
        request: ContributionRequest,
    ) -> Result<ContributionRecord, ContributionError> {
        self.merger.submit(request)
    }
}
