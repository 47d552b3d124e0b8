//! Per-level template pools and format shaping.
//!
//! Problem text is placeholder text parameterised by topic. Each template carries
//! an open prompt, a declarative statement (true/false), and a cloze sentence
//! (fill-in-the-blank), so any format the constraint checker approves can be
//! shaped from it.

use crate::models::{BloomLevel, ProblemArchetype, QuestionFormat};

const TOPIC: &str = "{topic}";
const OPTION_LETTERS: [&str; 4] = ["A", "B", "C", "D"];

pub struct ProblemTemplate {
    pub archetype: ProblemArchetype,
    pub prompt: &'static str,
    pub statement: &'static str,
    pub cloze: &'static str,
}

/// Shaped question ready to become a `Problem`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedQuestion {
    pub text: String,
    pub options: Option<Vec<String>>,
    pub correct_answer: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Template pools
// ────────────────────────────────────────────────────────────────────────────

const REMEMBER: &[ProblemTemplate] = &[
    ProblemTemplate {
        archetype: ProblemArchetype::Conceptual,
        prompt: "Which term best describes the central idea of {topic}?",
        statement: "{topic} can be described by a small set of key terms.",
        cloze: "The central idea of {topic} is called _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Procedural,
        prompt: "List the main steps involved in {topic}.",
        statement: "The steps of {topic} always happen in the same order.",
        cloze: "The first step in {topic} is _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Conceptual,
        prompt: "Define the most important vocabulary word related to {topic}.",
        statement: "Every part of {topic} has a specific name.",
        cloze: "One key vocabulary word for {topic} is _____.",
    },
];

const UNDERSTAND: &[ProblemTemplate] = &[
    ProblemTemplate {
        archetype: ProblemArchetype::Conceptual,
        prompt: "Explain in your own words why {topic} matters.",
        statement: "{topic} can be explained without any examples.",
        cloze: "{topic} matters because it _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Conceptual,
        prompt: "Summarize the relationship between the main parts of {topic}.",
        statement: "The parts of {topic} work independently of each other.",
        cloze: "The main parts of {topic} are connected through _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Mixed,
        prompt: "Which example best illustrates {topic}?",
        statement: "An everyday example can illustrate {topic}.",
        cloze: "A good everyday example of {topic} is _____.",
    },
];

const APPLY: &[ProblemTemplate] = &[
    ProblemTemplate {
        archetype: ProblemArchetype::Application,
        prompt: "Use what you know about {topic} to solve a new problem you have not seen before.",
        statement: "Ideas from {topic} can be used to solve unfamiliar problems.",
        cloze: "To apply {topic} to a new situation, you would first _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Procedural,
        prompt: "Demonstrate how the procedure for {topic} would be carried out in a real situation.",
        statement: "The procedure for {topic} changes in real situations.",
        cloze: "Carrying out {topic} correctly requires _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Application,
        prompt: "Predict what would happen if one condition in {topic} were changed.",
        statement: "Changing one condition in {topic} changes the outcome.",
        cloze: "If one condition in {topic} changed, the result would be _____.",
    },
];

const ANALYZE: &[ProblemTemplate] = &[
    ProblemTemplate {
        archetype: ProblemArchetype::Mixed,
        prompt: "Compare and contrast two different aspects of {topic}.",
        statement: "Two aspects of {topic} share the same underlying cause.",
        cloze: "The biggest difference between two aspects of {topic} is _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Conceptual,
        prompt: "Identify the underlying cause behind a pattern you observe in {topic}.",
        statement: "Patterns in {topic} have identifiable causes.",
        cloze: "The pattern observed in {topic} is caused by _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Application,
        prompt: "Break {topic} into its components and explain how each one contributes to the whole.",
        statement: "Every component of {topic} contributes equally.",
        cloze: "The component of {topic} that contributes most is _____.",
    },
];

const EVALUATE: &[ProblemTemplate] = &[
    ProblemTemplate {
        archetype: ProblemArchetype::Mixed,
        prompt: "Evaluate the strengths and weaknesses of a common argument about {topic}.",
        statement: "Every argument about {topic} is equally strong.",
        cloze: "The weakest part of the common argument about {topic} is _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Conceptual,
        prompt: "Decide which of two approaches to {topic} is more effective and justify your choice.",
        statement: "One approach to {topic} is always more effective.",
        cloze: "The more effective approach to {topic} is _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Application,
        prompt: "Critique a proposed solution to a problem involving {topic}.",
        statement: "Proposed solutions involving {topic} can be critiqued with evidence.",
        cloze: "A proposed solution involving {topic} fails when _____.",
    },
];

const CREATE: &[ProblemTemplate] = &[
    ProblemTemplate {
        archetype: ProblemArchetype::Application,
        prompt: "Design an original experiment or project that tests an idea about {topic}.",
        statement: "An experiment can test ideas about {topic}.",
        cloze: "An original project about {topic} would measure _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Mixed,
        prompt: "Propose a new way to explain {topic} to a younger student.",
        statement: "{topic} can be explained to a younger student.",
        cloze: "A new way to explain {topic} would use _____.",
    },
    ProblemTemplate {
        archetype: ProblemArchetype::Application,
        prompt: "Develop a plan that uses {topic} to address a real problem in your community.",
        statement: "{topic} can address real community problems.",
        cloze: "A community plan based on {topic} would start with _____.",
    },
];

const TIPS: [&[&str]; 6] = [
    &[
        "Look for the key term that appears most often in your notes.",
        "Think back to the definitions from class.",
        "Picture the diagram from the lesson.",
    ],
    &[
        "Try explaining it to a friend in one sentence first.",
        "Connect the idea to something you already know.",
        "Ask yourself why this works, not just what it is.",
    ],
    &[
        "Start by identifying what is given and what is asked.",
        "Check which rule or procedure from class fits this situation.",
        "Work through a small example before the full problem.",
    ],
    &[
        "Look for similarities first, then differences.",
        "Ask what would change if one part were removed.",
        "Organize the parts in a quick table before writing.",
    ],
    &[
        "State your criteria before you judge.",
        "Use evidence to support each claim you make.",
        "Consider the strongest counterargument.",
    ],
    &[
        "Brainstorm several ideas before choosing one.",
        "Build on what you already know about the topic.",
        "Sketch your plan before writing it out.",
    ],
];

// ────────────────────────────────────────────────────────────────────────────
// Lookups
// ────────────────────────────────────────────────────────────────────────────

pub fn templates_for(level: BloomLevel) -> &'static [ProblemTemplate] {
    match level {
        BloomLevel::Remember => REMEMBER,
        BloomLevel::Understand => UNDERSTAND,
        BloomLevel::Apply => APPLY,
        BloomLevel::Analyze => ANALYZE,
        BloomLevel::Evaluate => EVALUATE,
        BloomLevel::Create => CREATE,
    }
}

/// Picks the `n`-th template for a level, cycling through the pool.
pub fn pick_template(level: BloomLevel, n: usize) -> &'static ProblemTemplate {
    let pool = templates_for(level);
    &pool[n % pool.len()]
}

pub fn tip_for(level: BloomLevel, n: usize) -> &'static str {
    let pool = TIPS[level.index()];
    pool[n % pool.len()]
}

fn fill(template: &str, topic: &str) -> String {
    template.replace(TOPIC, topic)
}

// ────────────────────────────────────────────────────────────────────────────
// Format shaping
// ────────────────────────────────────────────────────────────────────────────

/// Shapes a template into question text (and options) for the chosen format.
///
/// `seed` rotates the position of the correct multiple-choice option and
/// alternates true/false answers, so a generated set does not always answer "A".
pub fn shape_question(
    template: &ProblemTemplate,
    format: QuestionFormat,
    topic: &str,
    seed: usize,
) -> ShapedQuestion {
    match format {
        QuestionFormat::MultipleChoice => {
            let correct_slot = seed % OPTION_LETTERS.len();
            let mut distractors = vec![
                format!("A common misconception about {topic}"),
                format!("An idea unrelated to {topic}"),
                format!("A detail that is only partly true of {topic}"),
            ]
            .into_iter();
            let options = (0..OPTION_LETTERS.len())
                .map(|slot| {
                    if slot == correct_slot {
                        format!("The answer that best fits {topic}")
                    } else {
                        distractors.next().unwrap_or_default()
                    }
                })
                .collect();
            ShapedQuestion {
                text: fill(template.prompt, topic),
                options: Some(options),
                correct_answer: Some(OPTION_LETTERS[correct_slot].to_string()),
            }
        }
        QuestionFormat::TrueFalse => ShapedQuestion {
            text: format!("True or false: {}", fill(template.statement, topic)),
            options: Some(vec!["True".to_string(), "False".to_string()]),
            correct_answer: Some(if seed % 2 == 0 { "True" } else { "False" }.to_string()),
        },
        QuestionFormat::FillBlank => ShapedQuestion {
            text: fill(template.cloze, topic),
            options: None,
            correct_answer: None,
        },
        QuestionFormat::ShortAnswer => ShapedQuestion {
            text: format!("{} Answer in two or three sentences.", fill(template.prompt, topic)),
            options: None,
            correct_answer: None,
        },
        QuestionFormat::FreeResponse => ShapedQuestion {
            text: format!(
                "{} Support your answer with specific evidence.",
                fill(template.prompt, topic)
            ),
            options: None,
            correct_answer: None,
        },
    }
}

/// Letter label for an option index ("A".."D"); falls back to the 1-based number.
pub fn option_label(index: usize) -> String {
    OPTION_LETTERS
        .get(index)
        .map(|l| l.to_string())
        .unwrap_or_else(|| (index + 1).to_string())
}
