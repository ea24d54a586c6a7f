//! Command implementations, run directly against the local knowledge files

use crate::cli::ContributeCommands;
use crate::display;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use pcdoc_common::{
    Category, Contribution, ContributionRequest, DiagnosisEngine, PcdocConfig, RulePayload,
    Strategy, SymptomPayload,
};
use std::collections::BTreeSet;

pub fn open_engine(config: &PcdocConfig) -> Result<DiagnosisEngine> {
    DiagnosisEngine::from_config(config).with_context(|| {
        format!(
            "Failed to load knowledge base {}",
            config.knowledge.static_path.display()
        )
    })
}

pub fn diagnose(
    engine: &DiagnosisEngine,
    symptoms: Vec<String>,
    strategy: Option<Strategy>,
    json: bool,
) -> Result<()> {
    let observed: BTreeSet<String> = symptoms.into_iter().collect();
    let strategy = strategy.unwrap_or_else(|| engine.default_strategy());
    let result = engine.evaluate(&observed, strategy);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", display::render_result(&result));
    }
    Ok(())
}

pub fn symptoms(engine: &DiagnosisEngine, category: Option<Category>, json: bool) -> Result<()> {
    let symptoms = engine.list_symptoms(category);

    if json {
        println!("{}", serde_json::to_string_pretty(&symptoms)?);
    } else if symptoms.is_empty() {
        println!("No symptoms found.");
    } else {
        print!("{}", display::render_symptoms(&symptoms));
    }
    Ok(())
}

pub fn categories(engine: &DiagnosisEngine) -> Result<()> {
    for category in engine.list_categories() {
        println!("{}", category);
    }
    Ok(())
}

pub fn contribute(engine: &DiagnosisEngine, item: ContributeCommands) -> Result<()> {
    let request = match item {
        ContributeCommands::Symptom { label, category, id } => {
            ContributionRequest::Symptom(SymptomPayload { id, label, category })
        }
        ContributeCommands::Rule {
            positive,
            negative,
            diagnosis,
            weight,
        } => ContributionRequest::Rule(RulePayload {
            positive,
            negative,
            diagnosis,
            weight,
        }),
    };

    let record = engine.submit_contribution(request)?;
    match &record.item {
        Contribution::Symptom { symptom } => {
            println!("{} symptom '{}'", "Contributed".green(), symptom.id)
        }
        Contribution::Rule { rule, clues } => println!(
            "{} rule with {} conditions ({} clues)",
            "Contributed".green(),
            rule.specificity(),
            clues.len()
        ),
    }
    Ok(())
}
