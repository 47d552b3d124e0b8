//! Enrichment: pluggable post-processing that annotates generated problems.
//!
//! Default: `HeuristicEnricher` (pure-Rust, deterministic, no network).
//! `AppState` holds an `Arc<dyn Enricher>`, so a model-backed enricher can be
//! swapped in at startup without touching handlers.
//!
//! An enricher may refine metadata (scores, rubric, tags, word counts) but must
//! not change a problem's Bloom level or format.

use async_trait::async_trait;
use tracing::debug;

use crate::errors::AppError;
use crate::models::{
    Assignment, BloomLevel, DifficultyRange, Problem, ProblemArchetype, QuestionFormat, Rating,
};

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, assignment: Assignment) -> Result<Assignment, AppError>;

    /// Backend name, surfaced in API responses.
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// HeuristicEnricher
// ────────────────────────────────────────────────────────────────────────────

/// Scores each problem from its level, format, length and archetype.
///
/// complexity = 0.15 + 0.12 × level_index + format weight + length weight
///              + difficulty shift (easy −0.15, hard +0.15)
/// novelty    = 0.1 + 0.1 × level_index + archetype weight
pub struct HeuristicEnricher;

#[async_trait]
impl Enricher for HeuristicEnricher {
    async fn enrich(&self, mut assignment: Assignment) -> Result<Assignment, AppError> {
        if assignment.problem_count() == 0 {
            return Err(AppError::Enrichment(format!(
                "assignment {} has no problems to enrich",
                assignment.id
            )));
        }
        let topic = assignment.topic.clone();
        let difficulty = assignment.difficulty_range;
        for section in &mut assignment.sections {
            for problem in &mut section.problems {
                enrich_problem(problem, &topic, difficulty);
            }
        }
        debug!(
            "Enriched {} problems for assignment {}",
            assignment.problem_count(),
            assignment.id
        );
        Ok(assignment)
    }

    fn backend(&self) -> &'static str {
        "heuristic"
    }
}

fn enrich_problem(problem: &mut Problem, topic: &str, difficulty: DifficultyRange) {
    problem.word_count = problem.text.split_whitespace().count();
    problem.complexity = Rating::scored(complexity_score(problem, difficulty));
    problem.novelty = Rating::scored(novelty_score(problem));
    if problem.rubric.is_none() {
        problem.rubric = rubric_hint(problem.format, problem.bloom_level);
    }
    problem.tags = tags_for(problem, topic);
}

fn complexity_score(problem: &Problem, difficulty: DifficultyRange) -> f32 {
    let level = problem.bloom_level.index() as f32 * 0.12;
    let format = match problem.format {
        QuestionFormat::TrueFalse => 0.0,
        QuestionFormat::MultipleChoice | QuestionFormat::FillBlank => 0.05,
        QuestionFormat::ShortAnswer => 0.1,
        QuestionFormat::FreeResponse => 0.15,
    };
    let length = (problem.word_count as f32 / 40.0).min(1.0) * 0.1;
    let shift = match difficulty {
        DifficultyRange::Easy => -0.15,
        DifficultyRange::Medium | DifficultyRange::Mixed => 0.0,
        DifficultyRange::Hard => 0.15,
    };
    0.15 + level + format + length + shift
}

fn novelty_score(problem: &Problem) -> f32 {
    let archetype = match problem.archetype {
        ProblemArchetype::Procedural => 0.0,
        ProblemArchetype::Conceptual => 0.05,
        ProblemArchetype::Mixed => 0.1,
        ProblemArchetype::Application => 0.15,
    };
    0.1 + problem.bloom_level.index() as f32 * 0.1 + archetype
}

/// Grading hint for open formats; closed formats are keyed by `correct_answer`.
pub fn rubric_hint(format: QuestionFormat, level: BloomLevel) -> Option<String> {
    match format {
        QuestionFormat::ShortAnswer => Some(format!(
            "2 points: accurate and complete ({} level). 1 point: partially correct. 0 points: missing or incorrect.",
            level.name().to_lowercase()
        )),
        QuestionFormat::FreeResponse => Some(format!(
            "4 points: clear claim, specific evidence, and reasoning at the {} level. \
             3 points: claim and evidence with thin reasoning. \
             2 points: claim with little support. 1 point: attempt without a clear claim.",
            level.name().to_lowercase()
        )),
        QuestionFormat::MultipleChoice | QuestionFormat::TrueFalse | QuestionFormat::FillBlank => {
            None
        }
    }
}

fn tags_for(problem: &Problem, topic: &str) -> Vec<String> {
    let mut tags = vec![
        topic.trim().to_lowercase(),
        problem.bloom_level.name().to_lowercase(),
        problem.format.as_str().to_string(),
        problem.archetype.as_str().to_string(),
    ];
    tags.retain(|t| !t.is_empty());
    tags.dedup();
    tags
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bloom::validate_assignment_alignment;
    use crate::generation::generator::generate_assignment;
    use crate::generation::validation::validate_intent;
    use crate::models::{AssignmentType, BloomBuckets, Intent, SectionStrategy};
    use chrono::Utc;

    fn make_assignment() -> Assignment {
        let intent = Intent {
            assignment_type: AssignmentType::Worksheet,
            title: None,
            topic: "Fractions".to_string(),
            question_count: 12,
            time_budget_minutes: 60,
            distribution: BloomBuckets::new([20, 20, 20, 20, 10, 10]),
            preferred_formats: vec![],
            section_strategy: SectionStrategy::AiGenerated,
            tips_enabled: true,
            difficulty_range: DifficultyRange::Medium,
        };
        generate_assignment(&validate_intent(intent).unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn test_enrich_sets_scores_in_range() {
        let enriched = HeuristicEnricher.enrich(make_assignment()).await.unwrap();
        for p in enriched.problems() {
            let c = p.complexity.score.expect("complexity scored");
            let n = p.novelty.score.expect("novelty scored");
            assert!((0.0..=1.0).contains(&c), "complexity {c} out of range");
            assert!((0.0..=1.0).contains(&n), "novelty {n} out of range");
        }
    }

    #[tokio::test]
    async fn test_enrich_preserves_level_and_format() {
        let original = make_assignment();
        let enriched = HeuristicEnricher.enrich(original.clone()).await.unwrap();
        for (before, after) in original.problems().zip(enriched.problems()) {
            assert_eq!(before.bloom_level, after.bloom_level);
            assert_eq!(before.format, after.format);
            assert_eq!(before.id, after.id);
        }
        assert!(validate_assignment_alignment(&enriched).valid);
    }

    #[tokio::test]
    async fn test_open_formats_get_rubrics_and_all_get_tags() {
        let enriched = HeuristicEnricher.enrich(make_assignment()).await.unwrap();
        for p in enriched.problems() {
            let open = matches!(
                p.format,
                QuestionFormat::ShortAnswer | QuestionFormat::FreeResponse
            );
            assert_eq!(p.rubric.is_some(), open, "rubric mismatch for {}", p.id);
            assert!(p.tags.contains(&"fractions".to_string()));
            assert!(p.tags.contains(&p.format.as_str().to_string()));
        }
    }

    #[test]
    fn test_complexity_rises_with_level() {
        let assignment = make_assignment();
        let mut low = assignment.problems().next().unwrap().clone();
        let mut high = low.clone();
        low.bloom_level = BloomLevel::Remember;
        high.bloom_level = BloomLevel::Create;
        assert!(
            complexity_score(&high, DifficultyRange::Medium)
                > complexity_score(&low, DifficultyRange::Medium)
        );
    }

    #[tokio::test]
    async fn test_empty_assignment_is_an_error() {
        let mut assignment = make_assignment();
        assignment.sections.clear();
        assert!(matches!(
            HeuristicEnricher.enrich(assignment).await,
            Err(AppError::Enrichment(_))
        ));
    }

    #[test]
    fn test_backend_name() {
        assert_eq!(HeuristicEnricher.backend(), "heuristic");
    }
}
