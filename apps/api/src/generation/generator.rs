//! Assignment Generation: turns a validated intent into a structured assignment.
//!
//! Flow: compute_bloom_counts → per-level template draw → enforce_format →
//!       section packing → numbering → realized histogram.
//!
//! Deterministic: the same intent and timestamp always yield the same problems
//! (only the assignment UUID differs). Input must come through `validate_intent`.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bloom::{allowed_formats, enforce_format};
use crate::generation::distribution::compute_bloom_counts;
use crate::generation::templates::{pick_template, shape_question, tip_for};
use crate::generation::validation::ValidatedIntent;
use crate::models::{
    Assignment, AssignmentType, BloomLevel, DifficultyRange, OrganizationMode, Problem,
    QuestionFormat, Rating, RatingLevel, Section, SectionSpec, SectionStrategy,
};

const DEFAULT_INSTRUCTIONS: &str = "Read each question carefully and answer in the space provided.";

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Generates a complete assignment from a validated intent.
///
/// Postconditions:
/// - problem count == intent.question_count
/// - every (bloom_level, format) pair is allowed by the constraint checker
/// - problems ordered by Bloom level, then generation order
/// - `bloom_histogram` holds the realized counts
pub fn generate_assignment(intent: &ValidatedIntent, now: DateTime<Utc>) -> Assignment {
    let counts = compute_bloom_counts(&intent.distribution, intent.question_count);
    debug!("Bloom counts for {} questions: {:?}", intent.question_count, counts);

    let topic = intent.topic.trim();
    let mut problems = Vec::with_capacity(intent.question_count as usize);
    let mut substitutions = 0usize;

    for (level, count) in counts.iter() {
        for n in 0..count as usize {
            let seq = problems.len();
            let preferred = preferred_format(&intent.preferred_formats, level, seq, n);
            let decision = enforce_format(level, preferred);
            if decision.substituted {
                substitutions += 1;
            }

            let template = pick_template(level, n);
            let shaped = shape_question(template, decision.format, topic, seq);
            let tip = intent.tips_enabled.then(|| tip_for(level, n).to_string());

            problems.push(Problem {
                id: String::new(),
                section_id: String::new(),
                word_count: shaped.text.split_whitespace().count(),
                text: shaped.text,
                bloom_level: level,
                archetype: template.archetype,
                format: decision.format,
                complexity: Rating::label(
                    base_complexity(level).shifted(difficulty_shift(intent.difficulty_range)),
                ),
                novelty: Rating::label(base_novelty(level)),
                estimated_minutes: estimate_minutes(decision.format, level),
                has_tip: tip.is_some(),
                tip,
                options: shaped.options,
                correct_answer: shaped.correct_answer,
                rubric: None,
                tags: Vec::new(),
            });
        }
    }

    if substitutions > 0 {
        info!(
            "{} preferred format(s) were substituted to satisfy Bloom constraints",
            substitutions
        );
    }

    let (organization, mut sections) = match &intent.section_strategy {
        SectionStrategy::AiGenerated => (
            OrganizationMode::AiGenerated,
            vec![synthetic_section(intent.assignment_type, intent.tips_enabled, problems)],
        ),
        SectionStrategy::Manual { sections: specs } => (
            OrganizationMode::Manual,
            pack_manual_sections(specs, intent.tips_enabled, problems),
        ),
    };
    number_problems(&mut sections);

    let estimated_minutes: u32 = sections
        .iter()
        .flat_map(|s| s.problems.iter())
        .map(|p| p.estimated_minutes)
        .sum();
    if estimated_minutes > intent.time_budget_minutes {
        warn!(
            "Estimated time {} min exceeds the {} min budget for '{}'",
            estimated_minutes, intent.time_budget_minutes, topic
        );
    }

    let mut assignment = Assignment {
        id: Uuid::new_v4(),
        assignment_type: intent.assignment_type,
        title: assignment_title(intent),
        topic: topic.to_string(),
        estimated_minutes,
        question_count: 0,
        sections,
        bloom_histogram: Default::default(),
        organization,
        difficulty_range: intent.difficulty_range,
        created_at: now,
    };
    assignment.question_count = assignment.problem_count();
    assignment.bloom_histogram = assignment.realized_histogram();

    info!(
        "Generated assignment {} '{}': {} questions in {} section(s), ~{} min",
        assignment.id,
        assignment.title,
        assignment.question_count,
        assignment.sections.len(),
        assignment.estimated_minutes
    );

    assignment
}

// ────────────────────────────────────────────────────────────────────────────
// Section packing
// ────────────────────────────────────────────────────────────────────────────

fn synthetic_section(
    assignment_type: AssignmentType,
    include_tips: bool,
    problems: Vec<Problem>,
) -> Section {
    Section {
        id: String::new(),
        title: format!("{} Questions", assignment_type.display_name()),
        instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
        include_tips,
        problems,
    }
}

/// Splits the ordered problem list into the caller's sections, in order.
///
/// Section counts were checked against the total during validation; any
/// leftover problems (none for a validated intent) land in the last section.
fn pack_manual_sections(
    specs: &[SectionSpec],
    tips_enabled: bool,
    problems: Vec<Problem>,
) -> Vec<Section> {
    let mut remaining = problems.into_iter();
    let mut sections: Vec<Section> = specs
        .iter()
        .map(|spec| {
            let include_tips = spec.include_tips.unwrap_or(tips_enabled);
            let mut section_problems: Vec<Problem> =
                remaining.by_ref().take(spec.question_count as usize).collect();
            if !include_tips {
                for problem in &mut section_problems {
                    problem.has_tip = false;
                    problem.tip = None;
                }
            }
            Section {
                id: String::new(),
                title: spec.title.trim().to_string(),
                instructions: spec
                    .instructions
                    .as_ref()
                    .map(|i| i.trim().to_string())
                    .filter(|i| !i.is_empty()),
                include_tips,
                problems: section_problems,
            }
        })
        .collect();

    let leftover: Vec<Problem> = remaining.collect();
    if !leftover.is_empty() {
        warn!("{} problem(s) did not fit the declared sections", leftover.len());
        if let Some(last) = sections.last_mut() {
            last.problems.extend(leftover);
        }
    }
    sections
}

/// Assigns section ids in order and problem ids in document order.
fn number_problems(sections: &mut [Section]) {
    let mut number = 0usize;
    for (i, section) in sections.iter_mut().enumerate() {
        section.id = format!("section-{}", i + 1);
        for problem in &mut section.problems {
            number += 1;
            problem.id = format!("q-{number}");
            problem.section_id = section.id.clone();
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-problem attributes
// ────────────────────────────────────────────────────────────────────────────

/// The caller's preferred-format cycle, or the level's own formats when the
/// caller accepts any format.
fn preferred_format(
    preferred: &[QuestionFormat],
    level: BloomLevel,
    seq: usize,
    n: usize,
) -> QuestionFormat {
    if preferred.is_empty() {
        let allowed = allowed_formats(level);
        allowed[n % allowed.len()]
    } else {
        preferred[seq % preferred.len()]
    }
}

fn base_complexity(level: BloomLevel) -> RatingLevel {
    match level {
        BloomLevel::Remember | BloomLevel::Understand => RatingLevel::Low,
        BloomLevel::Apply | BloomLevel::Analyze => RatingLevel::Medium,
        BloomLevel::Evaluate | BloomLevel::Create => RatingLevel::High,
    }
}

fn base_novelty(level: BloomLevel) -> RatingLevel {
    match level {
        BloomLevel::Remember | BloomLevel::Understand => RatingLevel::Low,
        BloomLevel::Apply | BloomLevel::Analyze | BloomLevel::Evaluate => RatingLevel::Medium,
        BloomLevel::Create => RatingLevel::High,
    }
}

fn difficulty_shift(range: DifficultyRange) -> i8 {
    match range {
        DifficultyRange::Easy => -1,
        DifficultyRange::Medium | DifficultyRange::Mixed => 0,
        DifficultyRange::Hard => 1,
    }
}

/// Minutes to solve: a per-format base plus one extra minute per two Bloom levels.
pub fn estimate_minutes(format: QuestionFormat, level: BloomLevel) -> u32 {
    let base = match format {
        QuestionFormat::TrueFalse | QuestionFormat::FillBlank => 1,
        QuestionFormat::MultipleChoice => 2,
        QuestionFormat::ShortAnswer => 3,
        QuestionFormat::FreeResponse => 8,
    };
    base + (level.index() as u32) / 2
}

fn assignment_title(intent: &ValidatedIntent) -> String {
    intent
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "{} {}",
                intent.topic.trim(),
                intent.assignment_type.display_name()
            )
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bloom::validate_assignment_alignment;
    use crate::generation::validation::validate_intent;
    use crate::models::{BloomBuckets, Intent};

    fn make_intent() -> Intent {
        Intent {
            assignment_type: AssignmentType::Quiz,
            title: None,
            topic: "Photosynthesis".to_string(),
            question_count: 10,
            time_budget_minutes: 45,
            distribution: BloomBuckets::new([30, 30, 20, 10, 5, 5]),
            preferred_formats: vec![],
            section_strategy: SectionStrategy::AiGenerated,
            tips_enabled: false,
            difficulty_range: DifficultyRange::Mixed,
        }
    }

    fn generate(intent: Intent) -> Assignment {
        let validated = validate_intent(intent).expect("intent should be valid");
        generate_assignment(&validated, Utc::now())
    }

    fn spec(title: &str, count: u32, include_tips: Option<bool>) -> SectionSpec {
        SectionSpec {
            title: title.to_string(),
            instructions: Some(format!("Instructions for {title}")),
            question_count: count,
            include_tips,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let assignment = generate(make_intent());
        assert_eq!(assignment.problem_count(), 10);
        assert_eq!(assignment.question_count, 10);
        assert_eq!(assignment.bloom_histogram.total(), 10);
        assert_eq!(assignment.sections.len(), 1);
        assert_eq!(assignment.organization, OrganizationMode::AiGenerated);
        assert!(validate_assignment_alignment(&assignment).valid);
    }

    #[test]
    fn test_histogram_is_realized_counts() {
        let assignment = generate(make_intent());
        assert_eq!(assignment.bloom_histogram, assignment.realized_histogram());
        assert_eq!(
            assignment.bloom_histogram,
            compute_bloom_counts(&BloomBuckets::new([30, 30, 20, 10, 5, 5]), 10)
        );
    }

    #[test]
    fn test_problems_ordered_by_bloom_level() {
        let assignment = generate(make_intent());
        let levels: Vec<u8> = assignment.problems().map(|p| p.bloom_level.number()).collect();
        let mut sorted = levels.clone();
        sorted.sort();
        assert_eq!(levels, sorted);
    }

    #[test]
    fn test_ids_are_sequential() {
        let assignment = generate(make_intent());
        for (i, problem) in assignment.problems().enumerate() {
            assert_eq!(problem.id, format!("q-{}", i + 1));
            assert_eq!(problem.section_id, "section-1");
        }
    }

    #[test]
    fn test_preferred_true_false_is_healed_at_high_levels() {
        let mut intent = make_intent();
        intent.preferred_formats = vec![QuestionFormat::TrueFalse];
        intent.distribution = BloomBuckets::new([0, 0, 0, 0, 50, 50]);
        let assignment = generate(intent);
        assert!(assignment
            .problems()
            .all(|p| p.format != QuestionFormat::TrueFalse));
        assert!(validate_assignment_alignment(&assignment).valid);
    }

    #[test]
    fn test_preferred_formats_are_cycled_when_allowed() {
        let mut intent = make_intent();
        intent.distribution = BloomBuckets::new([100, 0, 0, 0, 0, 0]);
        intent.question_count = 4;
        intent.preferred_formats = vec![QuestionFormat::TrueFalse, QuestionFormat::FillBlank];
        let assignment = generate(intent);
        let formats: Vec<_> = assignment.problems().map(|p| p.format).collect();
        assert_eq!(
            formats,
            vec![
                QuestionFormat::TrueFalse,
                QuestionFormat::FillBlank,
                QuestionFormat::TrueFalse,
                QuestionFormat::FillBlank
            ]
        );
    }

    #[test]
    fn test_alignment_holds_for_all_distributions_and_preferences() {
        let distributions = [
            [100, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 100],
            [17, 17, 17, 17, 16, 16],
            [5, 5, 5, 5, 40, 40],
        ];
        let preferences = [
            vec![],
            vec![QuestionFormat::TrueFalse],
            vec![QuestionFormat::MultipleChoice, QuestionFormat::FillBlank],
            QuestionFormat::ALL.to_vec(),
        ];
        for values in distributions {
            for prefs in &preferences {
                for count in [1, 7, 23] {
                    let mut intent = make_intent();
                    intent.distribution = BloomBuckets::new(values);
                    intent.preferred_formats = prefs.clone();
                    intent.question_count = count;
                    let assignment = generate(intent);
                    assert_eq!(assignment.problem_count(), count as usize);
                    assert!(
                        validate_assignment_alignment(&assignment).valid,
                        "violations for {values:?} / {prefs:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_manual_sections_split_in_order() {
        let mut intent = make_intent();
        intent.section_strategy = SectionStrategy::Manual {
            sections: vec![spec("Warm-up", 4, None), spec("Challenge", 6, None)],
        };
        let assignment = generate(intent);
        assert_eq!(assignment.organization, OrganizationMode::Manual);
        assert_eq!(assignment.sections.len(), 2);
        assert_eq!(assignment.sections[0].problems.len(), 4);
        assert_eq!(assignment.sections[1].problems.len(), 6);
        assert_eq!(assignment.sections[1].id, "section-2");
        assert!(assignment.sections[1]
            .problems
            .iter()
            .all(|p| p.section_id == "section-2"));
        assert_eq!(assignment.sections[1].problems[0].id, "q-5");
    }

    #[test]
    fn test_manual_section_counts_sum_to_spec() {
        let mut intent = make_intent();
        intent.question_count = 12;
        let specs = vec![spec("A", 2, None), spec("B", 7, None), spec("C", 3, None)];
        intent.section_strategy = SectionStrategy::Manual {
            sections: specs.clone(),
        };
        let assignment = generate(intent);
        let produced: usize = assignment.sections.iter().map(|s| s.problems.len()).sum();
        let specified: u32 = specs.iter().map(|s| s.question_count).sum();
        assert_eq!(produced, specified as usize);
    }

    #[test]
    fn test_tips_follow_intent_and_section_override() {
        let mut intent = make_intent();
        intent.tips_enabled = true;
        intent.section_strategy = SectionStrategy::Manual {
            sections: vec![spec("With tips", 5, None), spec("No tips", 5, Some(false))],
        };
        let assignment = generate(intent);
        assert!(assignment.sections[0]
            .problems
            .iter()
            .all(|p| p.has_tip && p.tip.is_some()));
        assert!(assignment.sections[1]
            .problems
            .iter()
            .all(|p| !p.has_tip && p.tip.is_none()));
        assert!(!assignment.sections[1].include_tips);
    }

    #[test]
    fn test_no_tips_when_disabled() {
        let assignment = generate(make_intent());
        assert!(assignment.problems().all(|p| !p.has_tip));
    }

    #[test]
    fn test_title_defaults_to_topic_and_type() {
        let assignment = generate(make_intent());
        assert_eq!(assignment.title, "Photosynthesis Quiz");

        let mut intent = make_intent();
        intent.title = Some("  Unit 3 Check-in ".to_string());
        assert_eq!(generate(intent).title, "Unit 3 Check-in");
    }

    #[test]
    fn test_estimated_minutes_is_sum_of_problems() {
        let assignment = generate(make_intent());
        let sum: u32 = assignment.problems().map(|p| p.estimated_minutes).sum();
        assert_eq!(assignment.estimated_minutes, sum);
    }

    #[test]
    fn test_difficulty_shifts_complexity() {
        let mut easy = make_intent();
        easy.difficulty_range = DifficultyRange::Easy;
        easy.distribution = BloomBuckets::new([0, 0, 100, 0, 0, 0]);
        let mut hard = easy.clone();
        hard.difficulty_range = DifficultyRange::Hard;

        let easy = generate(easy);
        let hard = generate(hard);
        assert!(easy.problems().all(|p| p.complexity.level == RatingLevel::Low));
        assert!(hard.problems().all(|p| p.complexity.level == RatingLevel::High));
    }

    #[test]
    fn test_generation_is_deterministic_apart_from_id() {
        let validated = validate_intent(make_intent()).unwrap();
        let now = Utc::now();
        let a = generate_assignment(&validated, now);
        let mut b = generate_assignment(&validated, now);
        assert_ne!(a.id, b.id);
        b.id = a.id;
        assert_eq!(a, b);
    }

    #[test]
    fn test_word_count_matches_text() {
        let assignment = generate(make_intent());
        for p in assignment.problems() {
            assert_eq!(p.word_count, p.text.split_whitespace().count());
        }
    }
}
