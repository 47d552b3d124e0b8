//! Derives the current wizard step from a flat bag of accumulated form state.
//!
//! The snapshot is the loose shape clients persisted before the wizard had an
//! explicit state type; `current_route` keeps those snapshots routable.

use serde::{Deserialize, Serialize};

use crate::generation::simulation::StudentFeedback;
use crate::models::{Assignment, Intent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    /// Build a new assessment.
    Create,
    /// Review an assessment the teacher already has.
    Analyze,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    GoalSelection,
    DocumentChoice,
    SourceUpload,
    IntentForm,
    Generating,
    AssignmentReview,
    AssessmentInput,
    ClassroomAnalysis,
    FeedbackReview,
    Editing,
    Rewrite,
}

impl Step {
    pub fn path(self) -> &'static str {
        match self {
            Step::GoalSelection => "/",
            Step::DocumentChoice => "/source",
            Step::SourceUpload => "/source/upload",
            Step::IntentForm => "/create/intent",
            Step::Generating => "/create/generating",
            Step::AssignmentReview => "/create/review",
            Step::AssessmentInput => "/analyze/input",
            Step::ClassroomAnalysis => "/analysis/classroom",
            Step::FeedbackReview => "/analysis/feedback",
            Step::Editing => "/edit",
            Step::Rewrite => "/rewrite",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowSnapshot {
    pub goal: Option<Goal>,
    pub has_source_docs: Option<bool>,
    pub source_file: Option<String>,
    pub assessment_text: Option<String>,
    pub intent_data: Option<Intent>,
    pub generated_assignment: Option<Assignment>,
    pub ready_for_classroom_analysis: bool,
    pub student_feedback: Option<Vec<StudentFeedback>>,
    pub ready_for_editing: bool,
    pub ready_for_rewrite: bool,
}

/// Later flags win over earlier ones; the branch only matters before analysis.
pub fn current_route(snapshot: &FlowSnapshot) -> Step {
    let Some(goal) = snapshot.goal else {
        return Step::GoalSelection;
    };
    match snapshot.has_source_docs {
        None => return Step::DocumentChoice,
        Some(true) if snapshot.source_file.is_none() => return Step::SourceUpload,
        Some(_) => {}
    }

    if snapshot.ready_for_rewrite {
        return Step::Rewrite;
    }
    if snapshot.ready_for_editing {
        return Step::Editing;
    }
    if snapshot.student_feedback.is_some() {
        return Step::FeedbackReview;
    }
    if snapshot.ready_for_classroom_analysis {
        return Step::ClassroomAnalysis;
    }

    match goal {
        Goal::Create if snapshot.intent_data.is_none() => Step::IntentForm,
        Goal::Create if snapshot.generated_assignment.is_none() => Step::Generating,
        Goal::Create => Step::AssignmentReview,
        Goal::Analyze if snapshot.assessment_text.is_none() => Step::AssessmentInput,
        Goal::Analyze => Step::ClassroomAnalysis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_snapshot(goal: Goal, has_docs: bool) -> FlowSnapshot {
        FlowSnapshot {
            goal: Some(goal),
            has_source_docs: Some(has_docs),
            source_file: has_docs.then(|| "unit.pdf".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_snapshot_starts_at_goal_selection() {
        assert_eq!(current_route(&FlowSnapshot::default()), Step::GoalSelection);
    }

    #[test]
    fn test_document_choice_then_upload() {
        let mut snapshot = FlowSnapshot {
            goal: Some(Goal::Create),
            ..Default::default()
        };
        assert_eq!(current_route(&snapshot), Step::DocumentChoice);
        snapshot.has_source_docs = Some(true);
        assert_eq!(current_route(&snapshot), Step::SourceUpload);
        snapshot.source_file = Some("notes.docx".to_string());
        assert_eq!(current_route(&snapshot), Step::IntentForm);
    }

    #[test]
    fn test_analyze_without_docs_asks_for_assessment() {
        let mut snapshot = make_snapshot(Goal::Analyze, false);
        assert_eq!(current_route(&snapshot), Step::AssessmentInput);
        snapshot.assessment_text = Some("1. What is 2 + 2?".to_string());
        assert_eq!(current_route(&snapshot), Step::ClassroomAnalysis);
    }

    #[test]
    fn test_late_flags_take_precedence() {
        let mut snapshot = make_snapshot(Goal::Create, true);
        snapshot.ready_for_editing = true;
        assert_eq!(current_route(&snapshot), Step::Editing);
        snapshot.ready_for_rewrite = true;
        assert_eq!(current_route(&snapshot), Step::Rewrite);
    }

    #[test]
    fn test_snapshot_accepts_camel_case_and_missing_fields() {
        let snapshot: FlowSnapshot = serde_json::from_value(serde_json::json!({
            "goal": "analyze",
            "hasSourceDocs": false,
            "assessmentText": "Quiz text",
            "readyForClassroomAnalysis": true
        }))
        .unwrap();
        assert_eq!(current_route(&snapshot), Step::ClassroomAnalysis);
    }

    #[test]
    fn test_paths_are_unique() {
        let steps = [
            Step::GoalSelection,
            Step::DocumentChoice,
            Step::SourceUpload,
            Step::IntentForm,
            Step::Generating,
            Step::AssignmentReview,
            Step::AssessmentInput,
            Step::ClassroomAnalysis,
            Step::FeedbackReview,
            Step::Editing,
            Step::Rewrite,
        ];
        let paths: std::collections::HashSet<_> = steps.iter().map(|s| s.path()).collect();
        assert_eq!(paths.len(), steps.len());
    }
}
