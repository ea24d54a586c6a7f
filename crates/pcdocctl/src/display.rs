//! Human-readable rendering of engine output

use owo_colors::OwoColorize;
use pcdoc_common::{Category, DiagnosisResult, Origin, Resolver, Symptom};
use std::collections::BTreeMap;

pub fn render_result(result: &DiagnosisResult) -> String {
    let mut out = String::new();

    if result.conclusive {
        out.push_str(&format!("{} {}\n", "Diagnosis:".green().bold(), result.diagnosis));
    } else {
        out.push_str(&format!("{} {}\n", "Inconclusive:".yellow().bold(), result.diagnosis));
    }

    let source = match result.resolved_by {
        Resolver::Rules => "rule engine",
        Resolver::Scoring => "weighted scoring",
        Resolver::Fallback => "fallback",
    };
    out.push_str(&format!("  {} {}\n", "Resolved by:".dimmed(), source));

    if let Some(confidence) = result.confidence {
        out.push_str(&format!("  {} {:.1}\n", "Score:".dimmed(), confidence));
    }

    if !result.matched_symptoms.is_empty() {
        let matched: Vec<&str> = result.matched_symptoms.iter().map(String::as_str).collect();
        out.push_str(&format!("  {} {}\n", "Symptoms:".dimmed(), matched.join(", ")));
    }

    if let Some(advice) = &result.advice {
        out.push_str(&format!("  {} {}\n", "Advice:".cyan(), advice));
    }

    if !result.unknown_symptoms.is_empty() {
        out.push_str(&format!(
            "  {} {}\n",
            "Unknown ids ignored:".red(),
            result.unknown_symptoms.join(", ")
        ));
    }

    out
}

/// One heading per category; load order is kept within each group
pub fn render_symptoms(symptoms: &[Symptom]) -> String {
    let mut groups: BTreeMap<Category, Vec<&Symptom>> = BTreeMap::new();
    for symptom in symptoms {
        groups.entry(symptom.category).or_default().push(symptom);
    }

    let mut out = String::new();
    for (category, members) in groups {
        out.push_str(&format!("{}\n", category.as_str().to_uppercase().bold()));
        for symptom in members {
            let label = symptom.display_label();
            match symptom.origin {
                Origin::Static => out.push_str(&format!("  {:<20} {}\n", symptom.id, label)),
                Origin::User => out.push_str(&format!("  {:<20} {}\n", symptom.id, label.italic())),
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcdoc_common::RuleOrigin;
    use std::collections::BTreeSet;

    #[test]
    fn test_render_fallback_includes_advice() {
        let result = DiagnosisResult {
            diagnosis: "no definitive match".into(),
            matched_symptoms: BTreeSet::new(),
            confidence: None,
            rule_origin: RuleOrigin::None,
            conclusive: false,
            resolved_by: Resolver::Fallback,
            advice: Some("Select at least one symptom".into()),
            unknown_symptoms: vec!["ghost".into()],
        };
        let text = render_result(&result);
        assert!(text.contains("no definitive match"));
        assert!(text.contains("Select at least one symptom"));
        assert!(text.contains("ghost"));
        assert!(!text.contains("Score:"));
    }

    #[test]
    fn test_render_symptoms_groups_categories() {
        let symptoms = vec![
            Symptom {
                id: "no_power".into(),
                label: "The PC does not power on".into(),
                category: Category::Hardware,
                origin: Origin::Static,
            },
            Symptom {
                id: "fan_noise".into(),
                label: "Fan makes a grinding noise".into(),
                category: Category::Hardware,
                origin: Origin::User,
            },
        ];
        let text = render_symptoms(&symptoms);
        assert_eq!(text.matches("HARDWARE").count(), 1);
        assert!(text.contains("[contributed]"));
    }

    #[test]
    fn test_render_symptoms_merges_late_user_symptoms_into_category() {
        let symptom = |id: &str, category, origin| Symptom {
            id: id.to_string(),
            label: format!("Label for symptom {}", id),
            category,
            origin,
        };
        let symptoms = vec![
            symptom("no_power", Category::Hardware, Origin::Static),
            symptom("system_slow", Category::Software, Origin::Static),
            symptom("user_fan_noise", Category::Hardware, Origin::User),
        ];

        let text = render_symptoms(&symptoms);
        assert_eq!(text.matches("HARDWARE").count(), 1);
        assert_eq!(text.matches("SOFTWARE").count(), 1);

        let fan = text.find("user_fan_noise").unwrap();
        let software = text.find("SOFTWARE").unwrap();
        assert!(text.find("no_power").unwrap() < fan);
        assert!(fan < software);
    }
}
