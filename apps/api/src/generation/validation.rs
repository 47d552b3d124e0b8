//! Intent validation: the gate in front of the generator.
//!
//! The generator has no recovery path of its own. It accepts only a
//! `ValidatedIntent`, and the only way to build one is `validate_intent`.
//! All problems with an intent are collected into one list of user-facing
//! messages rather than stopping at the first.

use serde::Serialize;
use thiserror::Error;

use crate::models::{Intent, SectionStrategy};

/// Upper bound on questions per assignment.
pub const MAX_QUESTIONS: u32 = 100;

/// Every user-facing problem found in an intent.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}", .messages.join("; "))]
pub struct IntentErrors {
    pub messages: Vec<String>,
}

/// An intent that passed `validate_intent`. Immutable; read through `Deref`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedIntent(Intent);

impl ValidatedIntent {
    pub fn into_inner(self) -> Intent {
        self.0
    }
}

impl std::ops::Deref for ValidatedIntent {
    type Target = Intent;

    fn deref(&self) -> &Intent {
        &self.0
    }
}

/// Report shape returned by the validate endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct IntentValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Validates an intent, returning either the sealed intent or every message.
///
/// Checks:
/// - topic is non-empty
/// - question_count in 1..=MAX_QUESTIONS
/// - time budget > 0
/// - every distribution bucket is at most 100, and they sum to exactly 100
/// - manual strategy: at least one section, each titled with a count in
///   1..=MAX_QUESTIONS, and section counts summing to question_count
pub fn validate_intent(intent: Intent) -> Result<ValidatedIntent, IntentErrors> {
    let messages = collect_errors(&intent);
    if messages.is_empty() {
        Ok(ValidatedIntent(intent))
    } else {
        Err(IntentErrors { messages })
    }
}

/// Non-consuming variant for preview/validate endpoints.
pub fn check_intent(intent: &Intent) -> IntentValidationReport {
    let errors = collect_errors(intent);
    IntentValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

fn collect_errors(intent: &Intent) -> Vec<String> {
    let mut messages = Vec::new();

    if intent.topic.trim().is_empty() {
        messages.push("Topic is required.".to_string());
    }

    if intent.question_count == 0 {
        messages.push("Question count must be at least 1.".to_string());
    } else if intent.question_count > MAX_QUESTIONS {
        messages.push(format!(
            "Question count must be at most {MAX_QUESTIONS} (got {}).",
            intent.question_count
        ));
    }

    if intent.time_budget_minutes == 0 {
        messages.push("Time budget must be greater than 0 minutes.".to_string());
    }

    for (level, pct) in intent.distribution.iter() {
        if pct > 100 {
            messages.push(format!(
                "{} percentage must be between 0 and 100 (got {pct}).",
                level.name()
            ));
        }
    }

    let pct_total = intent.distribution.total();
    if pct_total != 100 {
        messages.push(format!(
            "Bloom distribution percentages must sum to 100 (got {pct_total})."
        ));
    }

    if let SectionStrategy::Manual { sections } = &intent.section_strategy {
        if sections.is_empty() {
            messages.push("Manual organization requires at least one section.".to_string());
        }
        for (i, spec) in sections.iter().enumerate() {
            if spec.title.trim().is_empty() {
                messages.push(format!("Section {} needs a title.", i + 1));
            }
            if spec.question_count == 0 {
                messages.push(format!(
                    "Section {} must contain at least one question.",
                    i + 1
                ));
            } else if spec.question_count > MAX_QUESTIONS {
                messages.push(format!(
                    "Section {} must contain at most {MAX_QUESTIONS} questions (got {}).",
                    i + 1,
                    spec.question_count
                ));
            }
        }
        let section_total: u64 = sections.iter().map(|s| u64::from(s.question_count)).sum();
        if !sections.is_empty() && section_total != u64::from(intent.question_count) {
            messages.push(format!(
                "Section question counts add up to {section_total}, but the assignment asks for {}.",
                intent.question_count
            ));
        }
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssignmentType, BloomBuckets, DifficultyRange, SectionSpec};

    fn make_intent() -> Intent {
        Intent {
            assignment_type: AssignmentType::Quiz,
            title: None,
            topic: "Photosynthesis".to_string(),
            question_count: 10,
            time_budget_minutes: 30,
            distribution: BloomBuckets::new([30, 30, 20, 10, 5, 5]),
            preferred_formats: vec![],
            section_strategy: SectionStrategy::AiGenerated,
            tips_enabled: false,
            difficulty_range: DifficultyRange::Mixed,
        }
    }

    fn section(title: &str, count: u32) -> SectionSpec {
        SectionSpec {
            title: title.to_string(),
            instructions: None,
            question_count: count,
            include_tips: None,
        }
    }

    #[test]
    fn test_valid_intent_passes() {
        let validated = validate_intent(make_intent()).unwrap();
        assert_eq!(validated.question_count, 10);
    }

    #[test]
    fn test_distribution_must_sum_to_100() {
        let mut intent = make_intent();
        intent.distribution = BloomBuckets::new([30, 30, 20, 10, 5, 0]);
        let err = validate_intent(intent).unwrap_err();
        assert_eq!(err.messages.len(), 1);
        assert!(err.messages[0].contains("sum to 100 (got 95)"));
    }

    #[test]
    fn test_zero_questions_rejected() {
        let mut intent = make_intent();
        intent.question_count = 0;
        let err = validate_intent(intent).unwrap_err();
        assert!(err.messages.iter().any(|m| m.contains("at least 1")));
    }

    #[test]
    fn test_too_many_questions_rejected() {
        let mut intent = make_intent();
        intent.question_count = MAX_QUESTIONS + 1;
        assert!(validate_intent(intent).is_err());
    }

    #[test]
    fn test_collects_all_messages() {
        let mut intent = make_intent();
        intent.topic = "   ".to_string();
        intent.time_budget_minutes = 0;
        intent.distribution = BloomBuckets::default();
        let err = validate_intent(intent).unwrap_err();
        assert_eq!(err.messages.len(), 3, "got {:?}", err.messages);
    }

    #[test]
    fn test_manual_section_count_mismatch() {
        let mut intent = make_intent();
        intent.section_strategy = SectionStrategy::Manual {
            sections: vec![section("Part A", 4), section("Part B", 4)],
        };
        let err = validate_intent(intent).unwrap_err();
        assert!(err.messages[0].contains("add up to 8"));
    }

    #[test]
    fn test_manual_sections_need_titles_and_counts() {
        let mut intent = make_intent();
        intent.section_strategy = SectionStrategy::Manual {
            sections: vec![section("", 10), section("Empty", 0)],
        };
        let err = validate_intent(intent).unwrap_err();
        assert!(err.messages.iter().any(|m| m.contains("Section 1 needs a title")));
        assert!(err.messages.iter().any(|m| m.contains("Section 2 must contain")));
    }

    #[test]
    fn test_manual_without_sections_rejected() {
        let mut intent = make_intent();
        intent.section_strategy = SectionStrategy::Manual { sections: vec![] };
        let err = validate_intent(intent).unwrap_err();
        assert_eq!(err.messages.len(), 1);
    }

    #[test]
    fn test_distribution_bucket_over_100_cannot_wrap_to_valid() {
        let mut intent = make_intent();
        intent.distribution = BloomBuckets::new([u32::MAX, 101, 0, 0, 0, 0]);
        let report = check_intent(&intent);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|m| m.contains("between 0 and 100")));
        assert!(report
            .errors
            .iter()
            .any(|m| m.contains(&format!("got {}", u64::from(u32::MAX) + 101))));
    }

    #[test]
    fn test_section_counts_cannot_wrap_to_question_count() {
        let mut intent = make_intent();
        intent.section_strategy = SectionStrategy::Manual {
            sections: vec![section("Part A", u32::MAX), section("Part B", 11)],
        };
        let report = check_intent(&intent);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|m| m.contains("Section 1 must contain at most")));
        assert!(report.errors.iter().any(|m| m.contains("add up to")));
    }

    #[test]
    fn test_check_intent_report() {
        let report = check_intent(&make_intent());
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_error_display_joins_messages() {
        let err = IntentErrors {
            messages: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "a; b");
    }
}
