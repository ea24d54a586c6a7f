//! Knowledge Sources
//!
//! Persistence collaborators for the knowledge repository. The static
//! partition is a JSON document; accepted contributions are appended to a
//! JSON Lines log, one record per line.

use super::schema::{Category, CombinationHint, KnowledgeBase, Origin, Rule, Symptom, SymptomId, WeightedClue};
use super::store::ContributionRecord;
use crate::error::{KnowledgeLoadError, ValidationError};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Prefix marking a negated condition in the compact rule form
const NEGATION_PREFIX: &str = "NOT:";

/// Where knowledge is loaded from and contributions are written to
pub trait KnowledgeSource: Send + Sync {
    /// Load the static partition. Any failure is fatal to startup.
    fn load_static(&self) -> Result<KnowledgeBase, KnowledgeLoadError>;

    /// Load previously accepted contributions, oldest first
    fn load_user(&self) -> Result<Vec<ContributionRecord>, KnowledgeLoadError>;

    /// Persist one accepted contribution
    fn append_user(&self, record: &ContributionRecord) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    symptoms: Vec<RawSymptom>,
    #[serde(default)]
    rules: Vec<RawRule>,
    #[serde(default)]
    clues: Vec<RawClue>,
    #[serde(default)]
    single_symptom_hints: BTreeMap<SymptomId, String>,
    #[serde(default)]
    combination_hints: Vec<RawCombinationHint>,
}

#[derive(Debug, Deserialize)]
struct RawSymptom {
    id: String,
    label: String,
    category: String,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    diagnosis: String,
    #[serde(default)]
    positive: Vec<String>,
    #[serde(default)]
    negative: Vec<String>,
    /// Compact form: "id" is positive, "NOT:id" is negated
    #[serde(default)]
    conditions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawClue {
    symptom: String,
    diagnosis: String,
    weight: f64,
}

#[derive(Debug, Deserialize)]
struct RawCombinationHint {
    #[serde(default)]
    all: Vec<String>,
    #[serde(default)]
    any: Vec<String>,
    #[serde(default)]
    none: Vec<String>,
    advice: String,
}

impl RawRule {
    fn into_rule(self) -> Result<Rule, ValidationError> {
        let mut positive: BTreeSet<SymptomId> = self.positive.into_iter().collect();
        let mut negative: BTreeSet<SymptomId> = self.negative.into_iter().collect();

        for cond in self.conditions {
            match cond.strip_prefix(NEGATION_PREFIX) {
                Some(id) => negative.insert(id.to_string()),
                None => positive.insert(cond),
            };
        }

        Rule::new(positive, negative, self.diagnosis, Origin::Static)
    }
}

/// Parse a static knowledge document. `path` is only used in error messages.
pub fn parse_document(text: &str, path: &Path) -> Result<KnowledgeBase, KnowledgeLoadError> {
    let raw: RawDocument =
        serde_json::from_str(text).map_err(|source| KnowledgeLoadError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    let mut kb = KnowledgeBase::default();

    for (i, s) in raw.symptoms.into_iter().enumerate() {
        let category: Category = s.category.parse().map_err(|source| KnowledgeLoadError::Invalid {
            context: format!("symptom {} '{}'", i + 1, s.id),
            source,
        })?;
        kb.symptoms.push(Symptom {
            id: s.id,
            label: s.label,
            category,
            origin: Origin::Static,
        });
    }

    for (i, r) in raw.rules.into_iter().enumerate() {
        let context = format!("rule {} '{}'", i + 1, r.diagnosis.chars().take(30).collect::<String>());
        let rule = r
            .into_rule()
            .map_err(|source| KnowledgeLoadError::Invalid { context, source })?;
        kb.rules.push(rule);
    }

    for (i, c) in raw.clues.into_iter().enumerate() {
        let clue = WeightedClue::new(c.symptom, c.diagnosis, c.weight, Origin::Static).map_err(
            |source| KnowledgeLoadError::Invalid {
                context: format!("clue {}", i + 1),
                source,
            },
        )?;
        kb.clues.push(clue);
    }

    for (i, h) in raw.combination_hints.into_iter().enumerate() {
        let hint = CombinationHint::new(
            h.all.into_iter().collect(),
            h.any.into_iter().collect(),
            h.none.into_iter().collect(),
            h.advice,
        )
        .map_err(|source| KnowledgeLoadError::Invalid {
            context: format!("combination hint {}", i + 1),
            source,
        })?;
        kb.combination_hints.push(hint);
    }

    kb.hints = raw.single_symptom_hints;
    Ok(kb)
}

/// File-backed knowledge source
#[derive(Debug, Clone)]
pub struct JsonKnowledgeSource {
    static_path: PathBuf,
    user_path: Option<PathBuf>,
}

impl JsonKnowledgeSource {
    pub fn new(static_path: impl Into<PathBuf>, user_path: Option<PathBuf>) -> Self {
        Self {
            static_path: static_path.into(),
            user_path,
        }
    }

    pub fn static_path(&self) -> &Path {
        &self.static_path
    }

    pub fn user_path(&self) -> Option<&Path> {
        self.user_path.as_deref()
    }
}

impl KnowledgeSource for JsonKnowledgeSource {
    fn load_static(&self) -> Result<KnowledgeBase, KnowledgeLoadError> {
        let path = &self.static_path;
        debug!("Loading static knowledge from {}", path.display());

        let text = fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                KnowledgeLoadError::Missing { path: path.clone() }
            } else {
                KnowledgeLoadError::Unreadable {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        parse_document(&text, path)
    }

    fn load_user(&self) -> Result<Vec<ContributionRecord>, KnowledgeLoadError> {
        let Some(path) = &self.user_path else {
            return Ok(Vec::new());
        };

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(KnowledgeLoadError::Unreadable {
                    path: path.clone(),
                    source,
                })
            }
        };

        let mut records = Vec::new();
        for (n, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ContributionRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("{}:{}: skipping malformed contribution: {}", path.display(), n + 1, e),
            }
        }
        Ok(records)
    }

    fn append_user(&self, record: &ContributionRecord) -> Result<()> {
        let Some(path) = &self.user_path else {
            bail!("No contribution log configured");
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let line = serde_json::to_string(record).context("Failed to encode contribution")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open contribution log: {:?}", path))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write contribution log: {:?}", path))?;
        Ok(())
    }
}

/// In-process knowledge source
#[derive(Debug, Default)]
pub struct MemoryKnowledgeSource {
    static_kb: KnowledgeBase,
    user: Mutex<Vec<ContributionRecord>>,
    fail_appends: AtomicBool,
}

impl MemoryKnowledgeSource {
    pub fn new(static_kb: KnowledgeBase) -> Self {
        Self {
            static_kb,
            ..Default::default()
        }
    }

    /// Pre-populate the user log, as if written by an earlier run
    pub fn seed_user(&self, records: Vec<ContributionRecord>) {
        self.user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(records);
    }

    pub fn user_records(&self) -> Vec<ContributionRecord> {
        self.user.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Make subsequent appends fail, for exercising error paths
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

impl KnowledgeSource for MemoryKnowledgeSource {
    fn load_static(&self) -> Result<KnowledgeBase, KnowledgeLoadError> {
        Ok(self.static_kb.clone())
    }

    fn load_user(&self) -> Result<Vec<ContributionRecord>, KnowledgeLoadError> {
        Ok(self.user_records())
    }

    fn append_user(&self, record: &ContributionRecord) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            bail!("append disabled");
        }
        self.user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}
