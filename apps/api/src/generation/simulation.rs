//! Student performance simulation: predicted success per problem and per persona.
//!
//! Deterministic model, no sampling:
//!   success = base(level) − 0.15·(complexity − 0.25) − 0.10·(novelty − 0.25)
//!             + ability − language_load·min(words / 30, 1)
//! clamped to [guess_floor(format), 0.98].

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::models::{Assignment, BloomLevel, Problem, QuestionFormat};

/// Problems predicted below this success rate count as struggles.
const STRUGGLE_THRESHOLD: f32 = 0.5;
const MAX_SUCCESS: f32 = 0.98;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: String,
    /// Additive shift on every success rate (−0.3 … 0.3).
    pub ability: f32,
    /// Multiplier on estimated solve time.
    pub pace: f32,
    /// Penalty for long question text (English-language learners).
    #[serde(default)]
    pub language_load: f32,
}

impl StudentProfile {
    fn new(name: &str, ability: f32, pace: f32, language_load: f32) -> Self {
        Self {
            name: name.to_string(),
            ability,
            pace,
            language_load,
        }
    }

    pub fn defaults() -> Vec<StudentProfile> {
        vec![
            StudentProfile::new("Struggling learner", -0.2, 1.4, 0.0),
            StudentProfile::new("Typical learner", 0.0, 1.0, 0.0),
            StudentProfile::new("Advanced learner", 0.15, 0.8, 0.0),
            StudentProfile::new("English-language learner", -0.05, 1.3, 0.15),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentFeedback {
    pub persona: String,
    pub predicted_score_pct: u32,
    pub predicted_minutes: u32,
    /// Problem ids predicted below 50% success.
    pub struggles: Vec<String>,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemPrediction {
    pub problem_id: String,
    pub bloom_level: BloomLevel,
    pub format: QuestionFormat,
    /// Mean success across profiles.
    pub success_rate: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSimulation {
    pub assignment_id: Uuid,
    pub average_score_pct: u32,
    pub problems: Vec<ProblemPrediction>,
    pub feedback: Vec<StudentFeedback>,
}

// ────────────────────────────────────────────────────────────────────────────
// Model
// ────────────────────────────────────────────────────────────────────────────

fn base_rate(level: BloomLevel) -> f32 {
    match level {
        BloomLevel::Remember => 0.9,
        BloomLevel::Understand => 0.85,
        BloomLevel::Apply => 0.75,
        BloomLevel::Analyze => 0.65,
        BloomLevel::Evaluate => 0.55,
        BloomLevel::Create => 0.5,
    }
}

/// Chance of answering correctly by guessing.
fn guess_floor(format: QuestionFormat) -> f32 {
    match format {
        QuestionFormat::MultipleChoice => 0.25,
        QuestionFormat::TrueFalse => 0.5,
        QuestionFormat::ShortAnswer | QuestionFormat::FreeResponse | QuestionFormat::FillBlank => {
            0.05
        }
    }
}

pub fn predicted_success(problem: &Problem, profile: &StudentProfile) -> f32 {
    let complexity = problem.complexity.effective_score();
    let novelty = problem.novelty.effective_score();
    let reading = (problem.word_count as f32 / 30.0).min(1.0);
    let raw = base_rate(problem.bloom_level) - 0.15 * (complexity - 0.25)
        - 0.10 * (novelty - 0.25)
        + profile.ability
        - profile.language_load * reading;
    raw.clamp(guess_floor(problem.format), MAX_SUCCESS)
}

// ────────────────────────────────────────────────────────────────────────────
// Simulation
// ────────────────────────────────────────────────────────────────────────────

/// Simulates every profile against every problem. An empty profile list uses
/// `StudentProfile::defaults()`.
pub fn simulate_performance(
    assignment: &Assignment,
    profiles: &[StudentProfile],
) -> PerformanceSimulation {
    let defaults;
    let profiles = if profiles.is_empty() {
        defaults = StudentProfile::defaults();
        &defaults[..]
    } else {
        profiles
    };

    let problems: Vec<&Problem> = assignment.problems().collect();
    let feedback: Vec<StudentFeedback> = profiles
        .iter()
        .map(|profile| feedback_for(&problems, profile))
        .collect();

    let predictions = problems
        .iter()
        .map(|p| {
            let total: f32 = profiles.iter().map(|prof| predicted_success(p, prof)).sum();
            ProblemPrediction {
                problem_id: p.id.clone(),
                bloom_level: p.bloom_level,
                format: p.format,
                success_rate: total / profiles.len() as f32,
            }
        })
        .collect();

    let average_score_pct = if feedback.is_empty() {
        0
    } else {
        let sum: u32 = feedback.iter().map(|f| f.predicted_score_pct).sum();
        (sum as f32 / feedback.len() as f32).round() as u32
    };

    debug!(
        "Simulated {} profile(s) on assignment {}, average {}%",
        profiles.len(),
        assignment.id,
        average_score_pct
    );

    PerformanceSimulation {
        assignment_id: assignment.id,
        average_score_pct,
        problems: predictions,
        feedback,
    }
}

fn feedback_for(problems: &[&Problem], profile: &StudentProfile) -> StudentFeedback {
    let rates: Vec<f32> = problems
        .iter()
        .map(|p| predicted_success(p, profile))
        .collect();
    let predicted_score_pct = if rates.is_empty() {
        0
    } else {
        (rates.iter().sum::<f32>() / rates.len() as f32 * 100.0).round() as u32
    };
    let minutes: u32 = problems.iter().map(|p| p.estimated_minutes).sum();
    let predicted_minutes = (minutes as f32 * profile.pace).round() as u32;

    let struggles: Vec<String> = problems
        .iter()
        .zip(&rates)
        .filter(|(_, rate)| **rate < STRUGGLE_THRESHOLD)
        .map(|(p, _)| p.id.clone())
        .collect();

    let comment = match predicted_score_pct {
        85.. => "Comfortable with this assignment; consider an extension question.".to_string(),
        65..=84 => format!(
            "Mostly on track; {} question(s) may need a second look.",
            struggles.len()
        ),
        _ => format!(
            "Likely to struggle; {} question(s) fall below 50% predicted success. Consider scaffolding or tips.",
            struggles.len()
        ),
    };

    StudentFeedback {
        persona: profile.name.clone(),
        predicted_score_pct,
        predicted_minutes,
        struggles,
        comment,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
