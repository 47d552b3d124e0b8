//! Bloom/format compatibility: which question formats are pedagogically valid
//! for each cognitive level.
//!
//! Nothing here fails. An incompatible request is healed by substituting the first
//! allowed format for the level, and the substitution is reported back to the caller.
//!
//! # Compatibility table (priority order, first entry is the fallback)
//! - Remember:   multiple-choice, true-false, fill-blank, short-answer
//! - Understand: multiple-choice, short-answer, true-false, fill-blank
//! - Apply:      short-answer, multiple-choice, fill-blank, free-response
//! - Analyze:    short-answer, free-response, multiple-choice
//! - Evaluate:   free-response, short-answer
//! - Create:     free-response, short-answer

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Assignment, BloomLevel, QuestionFormat};

use QuestionFormat::{FillBlank, FreeResponse, MultipleChoice, ShortAnswer, TrueFalse};

const REMEMBER_FORMATS: &[QuestionFormat] = &[MultipleChoice, TrueFalse, FillBlank, ShortAnswer];
const UNDERSTAND_FORMATS: &[QuestionFormat] = &[MultipleChoice, ShortAnswer, TrueFalse, FillBlank];
const APPLY_FORMATS: &[QuestionFormat] = &[ShortAnswer, MultipleChoice, FillBlank, FreeResponse];
const ANALYZE_FORMATS: &[QuestionFormat] = &[ShortAnswer, FreeResponse, MultipleChoice];
const EVALUATE_FORMATS: &[QuestionFormat] = &[FreeResponse, ShortAnswer];
const CREATE_FORMATS: &[QuestionFormat] = &[FreeResponse, ShortAnswer];

/// Max characters of problem text quoted in a violation.
const EXCERPT_CHARS: usize = 60;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of `enforce_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDecision {
    pub format: QuestionFormat,
    pub requested: QuestionFormat,
    pub substituted: bool,
}

/// One `(level, format, text)` triple to check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentItem {
    pub bloom_level: BloomLevel,
    pub format: QuestionFormat,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentViolation {
    pub index: usize,
    pub bloom_level: BloomLevel,
    pub expected: Vec<QuestionFormat>,
    pub actual: QuestionFormat,
    pub excerpt: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentReport {
    pub valid: bool,
    pub checked: usize,
    pub violations: Vec<AlignmentViolation>,
}

// ────────────────────────────────────────────────────────────────────────────
// Table lookups
// ────────────────────────────────────────────────────────────────────────────

/// Formats allowed at `level`, in fallback priority order.
pub fn allowed_formats(level: BloomLevel) -> &'static [QuestionFormat] {
    match level {
        BloomLevel::Remember => REMEMBER_FORMATS,
        BloomLevel::Understand => UNDERSTAND_FORMATS,
        BloomLevel::Apply => APPLY_FORMATS,
        BloomLevel::Analyze => ANALYZE_FORMATS,
        BloomLevel::Evaluate => EVALUATE_FORMATS,
        BloomLevel::Create => CREATE_FORMATS,
    }
}

pub fn is_allowed(level: BloomLevel, format: QuestionFormat) -> bool {
    allowed_formats(level).contains(&format)
}

/// Returns `preferred` when it is valid for `level`, otherwise the level's first
/// allowed format.
pub fn enforce_format(level: BloomLevel, preferred: QuestionFormat) -> FormatDecision {
    if is_allowed(level, preferred) {
        return FormatDecision {
            format: preferred,
            requested: preferred,
            substituted: false,
        };
    }

    let fallback = allowed_formats(level)[0];
    warn!(
        "Format '{}' is not valid at Bloom level {}; substituting '{}'",
        preferred, level, fallback
    );
    FormatDecision {
        format: fallback,
        requested: preferred,
        substituted: true,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Batch validation
// ────────────────────────────────────────────────────────────────────────────

/// Checks every item and reports each incompatible pair. Never fails.
pub fn validate_problem_bloom_alignment(items: &[AlignmentItem]) -> AlignmentReport {
    let violations: Vec<AlignmentViolation> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| !is_allowed(item.bloom_level, item.format))
        .map(|(index, item)| {
            let expected = allowed_formats(item.bloom_level).to_vec();
            let expected_list = expected
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            AlignmentViolation {
                index,
                bloom_level: item.bloom_level,
                actual: item.format,
                excerpt: item.text.chars().take(EXCERPT_CHARS).collect(),
                message: format!(
                    "Question {} uses '{}' at Bloom level {} (allowed: {})",
                    index + 1,
                    item.format,
                    item.bloom_level,
                    expected_list
                ),
                expected,
            }
        })
        .collect();

    AlignmentReport {
        valid: violations.is_empty(),
        checked: items.len(),
        violations,
    }
}

/// Runs `validate_problem_bloom_alignment` over every problem of an assignment,
/// indexed in document order.
pub fn validate_assignment_alignment(assignment: &Assignment) -> AlignmentReport {
    let items: Vec<AlignmentItem> = assignment
        .problems()
        .map(|p| AlignmentItem {
            bloom_level: p.bloom_level,
            format: p.format,
            text: p.text.clone(),
        })
        .collect();
    validate_problem_bloom_alignment(&items)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
