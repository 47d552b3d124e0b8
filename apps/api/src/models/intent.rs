//! Teacher intent: the single request shape for assignment generation.
//!
//! Replaces the several divergent form payloads with one discriminated union for
//! the section strategy. An `Intent` is immutable input; it reaches the generator
//! only after validation (see `generation::validation`).

use serde::{Deserialize, Serialize};

use crate::models::assignment::{AssignmentType, BloomBuckets, DifficultyRange, QuestionFormat};

/// One caller-specified section under the `manual` strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub question_count: u32,
    /// Overrides the intent-wide tips flag for this section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tips: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SectionStrategy {
    /// All problems go into one synthetic section.
    #[default]
    AiGenerated,
    /// Problems are split into the listed sections, in order.
    Manual { sections: Vec<SectionSpec> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub assignment_type: AssignmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub topic: String,
    pub question_count: u32,
    pub time_budget_minutes: u32,
    /// Percentages per Bloom level; must sum to 100.
    pub distribution: BloomBuckets,
    /// Empty means "any format".
    #[serde(default)]
    pub preferred_formats: Vec<QuestionFormat>,
    #[serde(default)]
    pub section_strategy: SectionStrategy,
    #[serde(default)]
    pub tips_enabled: bool,
    pub difficulty_range: DifficultyRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_deserializes_with_defaults() {
        let intent: Intent = serde_json::from_value(serde_json::json!({
            "assignment_type": "quiz",
            "topic": "Photosynthesis",
            "question_count": 10,
            "time_budget_minutes": 30,
            "distribution": {
                "Remember": 30, "Understand": 30, "Apply": 20,
                "Analyze": 10, "Evaluate": 5, "Create": 5
            },
            "difficulty_range": "mixed"
        }))
        .unwrap();
        assert_eq!(intent.section_strategy, SectionStrategy::AiGenerated);
        assert!(intent.preferred_formats.is_empty());
        assert!(!intent.tips_enabled);
        assert!(intent.title.is_none());
    }

    #[test]
    fn test_manual_strategy_tagged_by_mode() {
        let strategy: SectionStrategy = serde_json::from_value(serde_json::json!({
            "mode": "manual",
            "sections": [
                { "title": "Warm-up", "question_count": 4 },
                { "title": "Deep dive", "question_count": 6, "include_tips": false }
            ]
        }))
        .unwrap();
        match strategy {
            SectionStrategy::Manual { sections } => {
                assert_eq!(sections.len(), 2);
                assert_eq!(sections[1].include_tips, Some(false));
            }
            other => panic!("expected manual strategy, got {other:?}"),
        }
    }
}
