//! Problem height estimation.
//!
//! Pure and conservative: the estimate reserves at least as many question
//! lines as the metric wrap produces, and never fewer than the character
//! heuristic ⌈chars / chars_per_line⌉. The same `ProblemLayout` is what the
//! renderers draw, so reserved and drawn space agree.

use serde::Serialize;

use crate::generation::templates::option_label;
use crate::layout::font_metrics::get_metrics;
use crate::layout::page::PageLayoutConfig;
use crate::models::{Problem, QuestionFormat};

/// Indent of the question text after the problem number.
pub const NUMBER_INDENT_MM: f32 = 8.0;
/// Minimum indent of option text after the checkbox and label.
pub const OPTION_INDENT_MM: f32 = 16.0;
/// Checkbox edge length.
pub const CHECKBOX_MM: f32 = 3.2;
/// Horizontal gap between a checkbox, its label and the text after it.
pub const CHOICE_GAP_MM: f32 = 1.5;
/// Gap between the "True" label and the "False" checkbox.
pub const TRUE_FALSE_GAP_MM: f32 = 8.0;
/// Spacing between ruled answer lines.
pub const ANSWER_LINE_MM: f32 = 8.0;
/// Vertical gap after every problem.
pub const PROBLEM_SPACING_MM: f32 = 6.0;
/// Gap between question text and answer area.
pub const ANSWER_GAP_MM: f32 = 1.5;

pub const SHORT_ANSWER_LINES: u32 = 3;
pub const FREE_RESPONSE_LINES: u32 = 8;

pub const TIP_PREFIX: &str = "Tip: ";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceLine {
    pub label: String,
    pub lines: Vec<String>,
}

/// Horizontal positions, in mm from the left margin, of a true/false row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrueFalseRow {
    pub true_box_mm: f32,
    pub true_label_mm: f32,
    pub false_box_mm: f32,
    pub false_label_mm: f32,
}

impl TrueFalseRow {
    pub fn measure(config: &PageLayoutConfig) -> Self {
        let true_box_mm = NUMBER_INDENT_MM;
        let true_label_mm = true_box_mm + CHECKBOX_MM + CHOICE_GAP_MM;
        let false_box_mm = true_label_mm + text_width_mm("True", config) + TRUE_FALSE_GAP_MM;
        TrueFalseRow {
            true_box_mm,
            true_label_mm,
            false_box_mm,
            false_label_mm: false_box_mm + CHECKBOX_MM + CHOICE_GAP_MM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnswerArea {
    Choices {
        choices: Vec<ChoiceLine>,
        /// Where option text starts, in mm from the left margin.
        text_indent_mm: f32,
    },
    TrueFalse(TrueFalseRow),
    Lines { count: u32 },
    Blank,
}

/// A problem resolved to wrapped lines and a reserved height.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemLayout {
    pub problem_id: String,
    pub number: usize,
    pub question_lines: Vec<String>,
    /// Lines reserved for the question text (≥ `question_lines.len()`).
    pub reserved_question_lines: usize,
    pub answer: AnswerArea,
    pub tip_lines: Vec<String>,
    pub height_mm: f32,
}

impl ProblemLayout {
    pub fn answer_height_mm(&self, config: &PageLayoutConfig) -> f32 {
        answer_height(&self.answer, config)
    }
}

/// Height in millimetres a problem occupies, including trailing spacing.
pub fn estimate_problem_height(problem: &Problem, config: &PageLayoutConfig) -> f32 {
    layout_problem(problem, 0, config).height_mm
}

/// Resolves a problem into the wrapped content both renderers draw.
pub fn layout_problem(problem: &Problem, number: usize, config: &PageLayoutConfig) -> ProblemLayout {
    let metrics = get_metrics(config.font);
    let lh = config.line_height_mm();

    let question_width_mm = config.content_width_mm() - NUMBER_INDENT_MM;
    let question_lines = metrics.wrap_text(&problem.text, config.width_em(question_width_mm));
    let heuristic_lines = problem
        .text
        .chars()
        .count()
        .div_ceil(config.chars_per_line(question_width_mm));
    let reserved_question_lines = question_lines.len().max(heuristic_lines).max(1);

    let answer = answer_area(problem, config);

    let tip_lines = match problem.visible_tip() {
        Some(tip) => metrics.wrap_text(
            &format!("{TIP_PREFIX}{tip}"),
            config.width_em(question_width_mm),
        ),
        None => Vec::new(),
    };
    let tip_h = if tip_lines.is_empty() {
        0.0
    } else {
        ANSWER_GAP_MM + tip_lines.len() as f32 * lh
    };

    let height_mm = reserved_question_lines as f32 * lh
        + ANSWER_GAP_MM
        + answer_height(&answer, config)
        + tip_h
        + PROBLEM_SPACING_MM;

    ProblemLayout {
        problem_id: problem.id.clone(),
        number,
        question_lines,
        reserved_question_lines,
        answer,
        tip_lines,
        height_mm,
    }
}

/// Rendered width of `text` in the body font.
pub fn text_width_mm(text: &str, config: &PageLayoutConfig) -> f32 {
    get_metrics(config.font).measure_str(text) * config.em_mm()
}

/// x of a choice label, in mm from the left margin.
pub fn choice_label_x_mm() -> f32 {
    NUMBER_INDENT_MM + CHECKBOX_MM + CHOICE_GAP_MM
}

/// Option text starts after the widest "A." style label, never before `OPTION_INDENT_MM`.
pub fn choice_text_indent_mm(option_count: usize, config: &PageLayoutConfig) -> f32 {
    let widest = (0..option_count)
        .map(|i| text_width_mm(&format!("{}.", option_label(i)), config))
        .fold(0.0_f32, f32::max);
    (choice_label_x_mm() + widest + CHOICE_GAP_MM).max(OPTION_INDENT_MM)
}

fn answer_area(problem: &Problem, config: &PageLayoutConfig) -> AnswerArea {
    match problem.format {
        QuestionFormat::MultipleChoice => {
            let metrics = get_metrics(config.font);
            let options = problem.options.as_deref().unwrap_or_default();
            let text_indent_mm = choice_text_indent_mm(options.len(), config);
            let width_em = config.width_em(config.content_width_mm() - text_indent_mm);
            let choices = options
                .iter()
                .enumerate()
                .map(|(i, option)| {
                    let mut lines = metrics.wrap_text(option, width_em);
                    if lines.is_empty() {
                        lines.push(String::new());
                    }
                    ChoiceLine {
                        label: option_label(i),
                        lines,
                    }
                })
                .collect();
            AnswerArea::Choices {
                choices,
                text_indent_mm,
            }
        }
        QuestionFormat::TrueFalse => AnswerArea::TrueFalse(TrueFalseRow::measure(config)),
        QuestionFormat::ShortAnswer => AnswerArea::Lines {
            count: SHORT_ANSWER_LINES,
        },
        QuestionFormat::FreeResponse => AnswerArea::Lines {
            count: FREE_RESPONSE_LINES,
        },
        QuestionFormat::FillBlank => AnswerArea::Blank,
    }
}

fn answer_height(answer: &AnswerArea, config: &PageLayoutConfig) -> f32 {
    let lh = config.line_height_mm();
    match answer {
        AnswerArea::Choices { choices, .. } => {
            choices.iter().map(|c| c.lines.len() as f32 * lh).sum()
        }
        AnswerArea::TrueFalse(_) => lh,
        AnswerArea::Lines { count } => *count as f32 * ANSWER_LINE_MM,
        AnswerArea::Blank => ANSWER_LINE_MM,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BloomLevel, ProblemArchetype, Rating, RatingLevel};

    fn make_problem(format: QuestionFormat, text: &str) -> Problem {
        Problem {
            id: "q-1".to_string(),
            section_id: "section-1".to_string(),
            text: text.to_string(),
            bloom_level: BloomLevel::Apply,
            archetype: ProblemArchetype::Application,
            format,
            complexity: Rating::label(RatingLevel::Medium),
            novelty: Rating::label(RatingLevel::Medium),
            estimated_minutes: 3,
            word_count: text.split_whitespace().count(),
            has_tip: false,
            tip: None,
            options: None,
            correct_answer: None,
            rubric: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let config = PageLayoutConfig::default();
        let problem = make_problem(QuestionFormat::ShortAnswer, "Explain the water cycle.");
        let a = estimate_problem_height(&problem, &config);
        let b = estimate_problem_height(&problem, &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_free_response_taller_than_short_answer() {
        let config = PageLayoutConfig::default();
        let short = make_problem(QuestionFormat::ShortAnswer, "Explain osmosis.");
        let free = make_problem(QuestionFormat::FreeResponse, "Explain osmosis.");
        let diff = estimate_problem_height(&free, &config) - estimate_problem_height(&short, &config);
        let expected = (FREE_RESPONSE_LINES - SHORT_ANSWER_LINES) as f32 * ANSWER_LINE_MM;
        assert!((diff - expected).abs() < 1e-3);
    }

    #[test]
    fn test_multiple_choice_counts_option_lines() {
        let config = PageLayoutConfig::default();
        let mut problem = make_problem(QuestionFormat::MultipleChoice, "Pick one.");
        problem.options = Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        let layout = layout_problem(&problem, 1, &config);
        let AnswerArea::Choices { choices, .. } = &layout.answer else {
            panic!("expected choices");
        };
        assert_eq!(choices.len(), 4);
        assert_eq!(choices[2].label, "C");
        let expected = 4.0 * config.line_height_mm();
        assert!((layout.answer_height_mm(&config) - expected).abs() < 1e-4);
    }

    #[test]
    fn test_choice_labels_never_overlap_option_text() {
        for font_size_pt in [6.0, 12.0, 24.0, 36.0] {
            let config = PageLayoutConfig {
                font_size_pt,
                ..PageLayoutConfig::default()
            };
            let mut problem = make_problem(QuestionFormat::MultipleChoice, "Pick one.");
            problem.options = Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
            let layout = layout_problem(&problem, 1, &config);
            let AnswerArea::Choices {
                choices,
                text_indent_mm,
            } = &layout.answer
            else {
                panic!("expected choices");
            };
            for choice in choices {
                let label_end =
                    choice_label_x_mm() + text_width_mm(&format!("{}.", choice.label), &config);
                assert!(
                    label_end < *text_indent_mm,
                    "{font_size_pt}pt: label {} ends at {label_end}, text at {text_indent_mm}",
                    choice.label
                );
            }
        }
    }

    #[test]
    fn test_true_false_row_never_overlaps() {
        for font_size_pt in [6.0, 12.0, 24.0, 36.0] {
            let config = PageLayoutConfig {
                font_size_pt,
                ..PageLayoutConfig::default()
            };
            let row = TrueFalseRow::measure(&config);
            assert!(row.true_label_mm >= row.true_box_mm + CHECKBOX_MM);
            assert!(row.true_label_mm + text_width_mm("True", &config) < row.false_box_mm);
            let row_end = row.false_label_mm + text_width_mm("False", &config);
            assert!(row_end <= config.content_width_mm(), "{font_size_pt}pt row ends at {row_end}");
        }
    }

    #[test]
    fn test_long_text_reserves_more_lines() {
        let config = PageLayoutConfig::default();
        let short = make_problem(QuestionFormat::FillBlank, "The capital is _____.");
        let long = make_problem(QuestionFormat::FillBlank, &"word ".repeat(120));
        let short_layout = layout_problem(&short, 1, &config);
        let long_layout = layout_problem(&long, 1, &config);
        assert_eq!(short_layout.reserved_question_lines, 1);
        assert!(long_layout.reserved_question_lines >= 6);
        assert!(long_layout.reserved_question_lines >= long_layout.question_lines.len());
    }

    #[test]
    fn test_tip_adds_height_only_when_visible() {
        let config = PageLayoutConfig::default();
        let mut problem = make_problem(QuestionFormat::ShortAnswer, "Explain osmosis.");
        let without = estimate_problem_height(&problem, &config);
        problem.tip = Some("Think about concentration.".into());
        assert_eq!(estimate_problem_height(&problem, &config), without);
        problem.has_tip = true;
        let with = estimate_problem_height(&problem, &config);
        assert!(with > without);
        assert!(layout_problem(&problem, 1, &config).tip_lines[0].starts_with(TIP_PREFIX));
    }

    #[test]
    fn test_larger_font_is_taller() {
        let small = PageLayoutConfig::default();
        let large = PageLayoutConfig {
            font_size_pt: 16.0,
            ..Default::default()
        };
        let problem = make_problem(QuestionFormat::TrueFalse, &"statement ".repeat(20));
        assert!(estimate_problem_height(&problem, &large) > estimate_problem_height(&problem, &small));
    }
}
