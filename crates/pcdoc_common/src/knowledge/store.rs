//! Knowledge Store
//!
//! Holds the read-only static partition and the append-only user partition.
//! The user partition is an immutable snapshot behind a lock; a contribution
//! builds the next snapshot and swaps it in, so a reader sees either the
//! state before an append or after it, never a half-written entry.

use super::schema::{KnowledgeBase, Origin, Rule, Symptom, WeightedClue};
use super::source::KnowledgeSource;
use super::validation::{validate_contribution, validate_static};
use crate::error::{ContributionError, KnowledgeLoadError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{info, warn};

/// A validated item destined for the user partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Contribution {
    Symptom {
        symptom: Symptom,
    },
    Rule {
        rule: Rule,
        /// Clues derived from the rule so the scoring strategy sees it too
        #[serde(default)]
        clues: Vec<WeightedClue>,
    },
}

impl Contribution {
    /// Force every nested item to `Origin::User`
    fn into_user(self) -> Self {
        match self {
            Contribution::Symptom { mut symptom } => {
                symptom.origin = Origin::User;
                Contribution::Symptom { symptom }
            }
            Contribution::Rule { mut rule, mut clues } => {
                rule.origin = Origin::User;
                for clue in &mut clues {
                    clue.origin = Origin::User;
                }
                Contribution::Rule { rule, clues }
            }
        }
    }

    fn apply_to(&self, kb: &mut KnowledgeBase) {
        match self {
            Contribution::Symptom { symptom } => kb.symptoms.push(symptom.clone()),
            Contribution::Rule { rule, clues } => {
                kb.rules.push(rule.clone());
                kb.clues.extend(clues.iter().cloned());
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Contribution::Symptom { symptom } => format!("symptom '{}'", symptom.id),
            Contribution::Rule { rule, .. } => {
                format!("rule '{}'", rule.diagnosis.chars().take(40).collect::<String>())
            }
        }
    }
}

/// A contribution as persisted in the user log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub contributed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub item: Contribution,
}

/// Static knowledge plus runtime contributions, shared across requests
pub struct KnowledgeRepository {
    static_kb: Arc<KnowledgeBase>,
    user: RwLock<Arc<KnowledgeBase>>,
    /// Serializes writers so persistence order matches in-memory order
    writer: Mutex<()>,
    source: Arc<dyn KnowledgeSource>,
}

impl KnowledgeRepository {
    /// Load the static partition and replay accepted contributions.
    ///
    /// Fails if the static partition is missing or invalid. Contributions
    /// that no longer validate are skipped with a warning.
    pub fn load(source: Arc<dyn KnowledgeSource>) -> Result<Self, KnowledgeLoadError> {
        let mut static_kb = source.load_static()?;
        force_static(&mut static_kb);
        validate_static(&static_kb)?;

        info!(
            "Knowledge base loaded: {} symptoms, {} rules, {} clues",
            static_kb.symptoms.len(),
            static_kb.rules.len(),
            static_kb.clues.len()
        );

        let mut user_kb = KnowledgeBase::default();
        let mut replayed = 0usize;
        for record in source.load_user()? {
            let item = record.item.into_user();
            let merged = KnowledgeBase::concat(&static_kb, &user_kb);
            match validate_contribution(&item, &merged) {
                Ok(()) => {
                    item.apply_to(&mut user_kb);
                    replayed += 1;
                }
                Err(e) => warn!("Skipping stored contribution {}: {}", item.describe(), e),
            }
        }
        if replayed > 0 {
            info!("Replayed {} user contributions", replayed);
        }

        Ok(Self {
            static_kb: Arc::new(static_kb),
            user: RwLock::new(Arc::new(user_kb)),
            writer: Mutex::new(()),
            source,
        })
    }

    /// STATIC followed by USER, in load order
    pub fn merged(&self) -> KnowledgeBase {
        let user = self.user_snapshot();
        KnowledgeBase::concat(&self.static_kb, &user)
    }

    pub fn static_snapshot(&self) -> Arc<KnowledgeBase> {
        Arc::clone(&self.static_kb)
    }

    pub fn user_snapshot(&self) -> Arc<KnowledgeBase> {
        let guard = self.user.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Validate, persist, then publish a contribution.
    ///
    /// The new item is visible to the next `merged()` call. A persistence
    /// failure leaves the in-memory state unchanged.
    pub fn contribute(&self, item: Contribution) -> Result<ContributionRecord, ContributionError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let item = item.into_user();
        let current = self.user_snapshot();
        let merged = KnowledgeBase::concat(&self.static_kb, &current);
        validate_contribution(&item, &merged)?;

        let record = ContributionRecord {
            contributed_at: Utc::now(),
            item,
        };
        self.source
            .append_user(&record)
            .map_err(|e| ContributionError::Persistence(e.to_string()))?;

        let mut next = (*current).clone();
        record.item.apply_to(&mut next);
        {
            let mut guard = self.user.write().unwrap_or_else(PoisonError::into_inner);
            *guard = Arc::new(next);
        }

        info!("Accepted contribution: {}", record.item.describe());
        Ok(record)
    }
}

fn force_static(kb: &mut KnowledgeBase) {
    for symptom in &mut kb.symptoms {
        symptom.origin = Origin::Static;
    }
    for rule in &mut kb.rules {
        rule.origin = Origin::Static;
    }
    for clue in &mut kb.clues {
        clue.origin = Origin::Static;
    }
}
