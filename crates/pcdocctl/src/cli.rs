//! CLI - Command-line argument parsing

use clap::{Parser, Subcommand};
use pcdoc_common::{Category, Strategy};
use std::path::PathBuf;

/// pcdoc command-line client
#[derive(Parser)]
#[command(name = "pcdocctl")]
#[command(about = "pcdoc - Diagnose PC faults from observed symptoms", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (overrides $PCDOC_CONFIG and defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Static knowledge base (overrides knowledge.static_path)
    #[arg(long, global = true)]
    pub knowledge: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Diagnose a set of observed symptom ids
    Diagnose {
        /// Symptom ids that are present
        symptoms: Vec<String>,

        /// Inference strategy (rules or scoring)
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<Strategy>,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// List known symptoms
    Symptoms {
        /// Only this category (hardware or software)
        #[arg(long, value_parser = parse_category)]
        category: Option<Category>,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// List symptom categories
    Categories,

    /// Contribute a symptom or rule to the knowledge base
    Contribute {
        #[command(subcommand)]
        item: ContributeCommands,
    },
}

#[derive(Subcommand)]
pub enum ContributeCommands {
    /// Add a new symptom
    Symptom {
        /// Text shown to users (at least 10 characters)
        #[arg(long)]
        label: String,

        /// hardware or software
        #[arg(long)]
        category: Option<String>,

        /// Explicit id (derived from the label when absent)
        #[arg(long)]
        id: Option<String>,
    },

    /// Add a new diagnosis rule
    Rule {
        /// Symptom ids that must be present
        #[arg(long, value_delimiter = ',', required = true)]
        positive: Vec<String>,

        /// Symptom ids that must be absent
        #[arg(long, value_delimiter = ',')]
        negative: Vec<String>,

        /// Diagnosis text (at least 20 characters)
        #[arg(long)]
        diagnosis: String,

        /// Also register weighted clues for the scoring strategy
        #[arg(long)]
        weight: Option<f64>,
    },
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    s.parse()
}

fn parse_category(s: &str) -> Result<Category, String> {
    s.parse().map_err(|e: pcdoc_common::ValidationError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diagnose() {
        let cli = Cli::try_parse_from([
            "pcdocctl", "diagnose", "no_power", "post_beeps", "--strategy", "scoring",
        ])
        .unwrap();
        match cli.command {
            Commands::Diagnose { symptoms, strategy, json } => {
                assert_eq!(symptoms, vec!["no_power", "post_beeps"]);
                assert_eq!(strategy, Some(Strategy::Scoring));
                assert!(!json);
            }
            _ => panic!("expected diagnose"),
        }
    }

    #[test]
    fn test_parse_rule_lists() {
        let cli = Cli::try_parse_from([
            "pcdocctl", "contribute", "rule", "--positive", "a,b", "--negative", "c",
            "--diagnosis", "Something long enough here",
        ])
        .unwrap();
        match cli.command {
            Commands::Contribute {
                item: ContributeCommands::Rule { positive, negative, .. },
            } => {
                assert_eq!(positive, vec!["a", "b"]);
                assert_eq!(negative, vec!["c"]);
            }
            _ => panic!("expected contribute rule"),
        }
    }

    #[test]
    fn test_bad_category_rejected() {
        assert!(Cli::try_parse_from(["pcdocctl", "symptoms", "--category", "network"]).is_err());
    }
}
