//! Canonical assignment schema shared by the generator, layout engine, and renderers.
//!
//! There is exactly one problem shape and one section shape. Producers (generator,
//! enricher, JSON import) and consumers (alignment check, layout, export) all speak it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Bloom's taxonomy
// ────────────────────────────────────────────────────────────────────────────

/// The six ordered cognitive-demand categories. Serialized as the integer 1–6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BloomLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

impl BloomLevel {
    /// All levels in canonical (ascending demand) order.
    pub const ALL: [BloomLevel; 6] = [
        BloomLevel::Remember,
        BloomLevel::Understand,
        BloomLevel::Apply,
        BloomLevel::Analyze,
        BloomLevel::Evaluate,
        BloomLevel::Create,
    ];

    /// 1-based level number.
    pub fn number(self) -> u8 {
        match self {
            BloomLevel::Remember => 1,
            BloomLevel::Understand => 2,
            BloomLevel::Apply => 3,
            BloomLevel::Analyze => 4,
            BloomLevel::Evaluate => 5,
            BloomLevel::Create => 6,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(BloomLevel::Remember),
            2 => Some(BloomLevel::Understand),
            3 => Some(BloomLevel::Apply),
            4 => Some(BloomLevel::Analyze),
            5 => Some(BloomLevel::Evaluate),
            6 => Some(BloomLevel::Create),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BloomLevel::Remember => "Remember",
            BloomLevel::Understand => "Understand",
            BloomLevel::Apply => "Apply",
            BloomLevel::Analyze => "Analyze",
            BloomLevel::Evaluate => "Evaluate",
            BloomLevel::Create => "Create",
        }
    }

    /// Position in `ALL` (0-based).
    pub fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl From<BloomLevel> for u8 {
    fn from(level: BloomLevel) -> u8 {
        level.number()
    }
}

impl TryFrom<u8> for BloomLevel {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        BloomLevel::from_number(n).ok_or_else(|| format!("Bloom level must be 1-6, got {n}"))
    }
}

impl fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BloomLevel {
    type Err = String;

    /// Accepts a level name (any case) or its number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u8>() {
            return BloomLevel::try_from(n);
        }
        BloomLevel::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("Unknown Bloom level '{trimmed}'"))
    }
}

/// Six named buckets, one per Bloom level.
///
/// Used for the intent's percentage targets and for the realized per-level
/// counts of a generated assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BloomBuckets {
    #[serde(default)]
    pub remember: u32,
    #[serde(default)]
    pub understand: u32,
    #[serde(default)]
    pub apply: u32,
    #[serde(default)]
    pub analyze: u32,
    #[serde(default)]
    pub evaluate: u32,
    #[serde(default)]
    pub create: u32,
}

impl BloomBuckets {
    pub fn new(values: [u32; 6]) -> Self {
        let [remember, understand, apply, analyze, evaluate, create] = values;
        Self {
            remember,
            understand,
            apply,
            analyze,
            evaluate,
            create,
        }
    }

    pub fn get(&self, level: BloomLevel) -> u32 {
        match level {
            BloomLevel::Remember => self.remember,
            BloomLevel::Understand => self.understand,
            BloomLevel::Apply => self.apply,
            BloomLevel::Analyze => self.analyze,
            BloomLevel::Evaluate => self.evaluate,
            BloomLevel::Create => self.create,
        }
    }

    pub fn set(&mut self, level: BloomLevel, value: u32) {
        let slot = match level {
            BloomLevel::Remember => &mut self.remember,
            BloomLevel::Understand => &mut self.understand,
            BloomLevel::Apply => &mut self.apply,
            BloomLevel::Analyze => &mut self.analyze,
            BloomLevel::Evaluate => &mut self.evaluate,
            BloomLevel::Create => &mut self.create,
        };
        *slot = value;
    }

    /// Sum of all buckets, widened so client-supplied values cannot wrap.
    pub fn total(&self) -> u64 {
        self.iter().map(|(_, v)| u64::from(v)).sum()
    }

    /// `(level, value)` pairs in canonical level order.
    pub fn iter(&self) -> impl Iterator<Item = (BloomLevel, u32)> + '_ {
        BloomLevel::ALL.into_iter().map(move |level| (level, self.get(level)))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Problem attributes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionFormat {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    FreeResponse,
    FillBlank,
}

impl QuestionFormat {
    pub const ALL: [QuestionFormat; 5] = [
        QuestionFormat::MultipleChoice,
        QuestionFormat::TrueFalse,
        QuestionFormat::ShortAnswer,
        QuestionFormat::FreeResponse,
        QuestionFormat::FillBlank,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionFormat::MultipleChoice => "multiple-choice",
            QuestionFormat::TrueFalse => "true-false",
            QuestionFormat::ShortAnswer => "short-answer",
            QuestionFormat::FreeResponse => "free-response",
            QuestionFormat::FillBlank => "fill-blank",
        }
    }

    /// Closed formats have a fixed answer set the student picks from.
    pub fn is_closed(self) -> bool {
        matches!(self, QuestionFormat::MultipleChoice | QuestionFormat::TrueFalse)
    }
}

impl fmt::Display for QuestionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemArchetype {
    Procedural,
    Conceptual,
    Application,
    Mixed,
}

impl ProblemArchetype {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemArchetype::Procedural => "procedural",
            ProblemArchetype::Conceptual => "conceptual",
            ProblemArchetype::Application => "application",
            ProblemArchetype::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingLevel {
    Low,
    Medium,
    High,
}

impl RatingLevel {
    /// Buckets a raw 0–1 score: < 0.4 low, < 0.7 medium, otherwise high.
    pub fn from_score(score: f32) -> Self {
        if score < 0.4 {
            RatingLevel::Low
        } else if score < 0.7 {
            RatingLevel::Medium
        } else {
            RatingLevel::High
        }
    }

    pub fn shifted(self, steps: i8) -> Self {
        let idx = match self {
            RatingLevel::Low => 0i8,
            RatingLevel::Medium => 1,
            RatingLevel::High => 2,
        };
        match (idx + steps).clamp(0, 2) {
            0 => RatingLevel::Low,
            1 => RatingLevel::Medium,
            _ => RatingLevel::High,
        }
    }

    /// Midpoint score used when no raw score has been computed yet.
    pub fn nominal_score(self) -> f32 {
        match self {
            RatingLevel::Low => 0.25,
            RatingLevel::Medium => 0.55,
            RatingLevel::High => 0.85,
        }
    }
}

/// A low/medium/high label with an optional raw 0–1 score (filled in by enrichment).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub level: RatingLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Rating {
    pub fn label(level: RatingLevel) -> Self {
        Self { level, score: None }
    }

    pub fn scored(score: f32) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            level: RatingLevel::from_score(score),
            score: Some(score),
        }
    }

    pub fn effective_score(&self) -> f32 {
        self.score.unwrap_or_else(|| self.level.nominal_score())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Problem / Section / Assignment
// ────────────────────────────────────────────────────────────────────────────

/// One question. Read-only once handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub section_id: String,
    pub text: String,
    pub bloom_level: BloomLevel,
    pub archetype: ProblemArchetype,
    pub format: QuestionFormat,
    pub complexity: Rating,
    pub novelty: Rating,
    pub estimated_minutes: u32,
    pub word_count: usize,
    #[serde(default)]
    pub has_tip: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Problem {
    /// Tip text if the tip flag is set and text is present.
    pub fn visible_tip(&self) -> Option<&str> {
        if self.has_tip {
            self.tip.as_deref().filter(|t| !t.trim().is_empty())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    pub include_tips: bool,
    pub problems: Vec<Problem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentType {
    Quiz,
    Test,
    Worksheet,
    Homework,
    Exam,
}

impl AssignmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentType::Quiz => "quiz",
            AssignmentType::Test => "test",
            AssignmentType::Worksheet => "worksheet",
            AssignmentType::Homework => "homework",
            AssignmentType::Exam => "exam",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AssignmentType::Quiz => "Quiz",
            AssignmentType::Test => "Test",
            AssignmentType::Worksheet => "Worksheet",
            AssignmentType::Homework => "Homework",
            AssignmentType::Exam => "Exam",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyRange {
    Easy,
    Medium,
    Hard,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrganizationMode {
    AiGenerated,
    Manual,
}

/// Top-level aggregate produced by the generation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub assignment_type: AssignmentType,
    pub title: String,
    pub topic: String,
    pub estimated_minutes: u32,
    pub question_count: usize,
    pub sections: Vec<Section>,
    /// Realized per-level counts after generation (not the requested percentages).
    pub bloom_histogram: BloomBuckets,
    pub organization: OrganizationMode,
    pub difficulty_range: DifficultyRange,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// All problems in document order.
    pub fn problems(&self) -> impl Iterator<Item = &Problem> {
        self.sections.iter().flat_map(|s| s.problems.iter())
    }

    pub fn problem_count(&self) -> usize {
        self.sections.iter().map(|s| s.problems.len()).sum()
    }

    /// Recounts the histogram from the problems actually present.
    pub fn realized_histogram(&self) -> BloomBuckets {
        let mut histogram = BloomBuckets::default();
        for problem in self.problems() {
            let level = problem.bloom_level;
            histogram.set(level, histogram.get(level) + 1);
        }
        histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bloom_level_serializes_as_integer() {
        let json = serde_json::to_string(&BloomLevel::Analyze).unwrap();
        assert_eq!(json, "4");
        let level: BloomLevel = serde_json::from_str("6").unwrap();
        assert_eq!(level, BloomLevel::Create);
    }

    #[test]
    fn test_bloom_level_rejects_out_of_range() {
        assert!(serde_json::from_str::<BloomLevel>("0").is_err());
        assert!(serde_json::from_str::<BloomLevel>("7").is_err());
    }

    #[test]
    fn test_bloom_level_parses_names_and_numbers() {
        assert_eq!("evaluate".parse::<BloomLevel>().unwrap(), BloomLevel::Evaluate);
        assert_eq!("Remember".parse::<BloomLevel>().unwrap(), BloomLevel::Remember);
        assert_eq!("3".parse::<BloomLevel>().unwrap(), BloomLevel::Apply);
        assert!("synthesize".parse::<BloomLevel>().is_err());
    }

    #[test]
    fn test_buckets_use_level_names_as_keys() {
        let buckets: BloomBuckets = serde_json::from_value(serde_json::json!({
            "Remember": 30, "Understand": 30, "Apply": 20,
            "Analyze": 10, "Evaluate": 5, "Create": 5
        }))
        .unwrap();
        assert_eq!(buckets.total(), 100);
        assert_eq!(buckets.get(BloomLevel::Evaluate), 5);
    }

    #[test]
    fn test_buckets_set_and_iter_in_level_order() {
        let mut buckets = BloomBuckets::default();
        buckets.set(BloomLevel::Create, 2);
        buckets.set(BloomLevel::Remember, 1);
        let levels: Vec<_> = buckets.iter().filter(|(_, v)| *v > 0).collect();
        assert_eq!(
            levels,
            vec![(BloomLevel::Remember, 1), (BloomLevel::Create, 2)]
        );
    }

    #[test]
    fn test_question_format_kebab_case() {
        let json = serde_json::to_string(&QuestionFormat::FillBlank).unwrap();
        assert_eq!(json, "\"fill-blank\"");
        assert_eq!(QuestionFormat::MultipleChoice.to_string(), "multiple-choice");
    }

    #[test]
    fn test_rating_level_from_score_boundaries() {
        assert_eq!(RatingLevel::from_score(0.0), RatingLevel::Low);
        assert_eq!(RatingLevel::from_score(0.4), RatingLevel::Medium);
        assert_eq!(RatingLevel::from_score(0.7), RatingLevel::High);
    }

    #[test]
    fn test_rating_scored_clamps() {
        let rating = Rating::scored(1.7);
        assert_eq!(rating.score, Some(1.0));
        assert_eq!(rating.level, RatingLevel::High);
    }

    #[test]
    fn test_rating_shift_saturates() {
        assert_eq!(RatingLevel::Low.shifted(-1), RatingLevel::Low);
        assert_eq!(RatingLevel::Medium.shifted(1), RatingLevel::High);
        assert_eq!(RatingLevel::High.shifted(3), RatingLevel::High);
    }
}
