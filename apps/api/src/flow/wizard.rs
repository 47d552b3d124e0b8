//! Explicit wizard state machine.
//!
//! Each variant carries exactly the data valid at its step, so an inconsistent
//! combination of fields cannot be represented. `next_step` is total: an event
//! that does not apply to the current step returns the state unchanged.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::flow::route::{FlowSnapshot, Goal, Step};
use crate::generation::simulation::StudentFeedback;
use crate::models::{Assignment, Intent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub file_name: String,
}

/// What the classroom analysis is run against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnalysisSubject {
    Generated {
        source: Option<SourceRef>,
        intent: Intent,
        assignment: Assignment,
    },
    Existing {
        source: Option<SourceRef>,
        text: String,
    },
}

impl AnalysisSubject {
    fn goal(&self) -> Goal {
        match self {
            AnalysisSubject::Generated { .. } => Goal::Create,
            AnalysisSubject::Existing { .. } => Goal::Analyze,
        }
    }

    fn source(&self) -> &Option<SourceRef> {
        match self {
            AnalysisSubject::Generated { source, .. } | AnalysisSubject::Existing { source, .. } => {
                source
            }
        }
    }

    /// The step analysis was entered from.
    fn previous_state(self) -> WizardState {
        match self {
            AnalysisSubject::Generated {
                source,
                intent,
                assignment,
            } => WizardState::AssignmentReview {
                source,
                intent,
                assignment,
            },
            AnalysisSubject::Existing { source, .. } => WizardState::AssessmentInput { source },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum WizardState {
    #[default]
    GoalSelection,
    DocumentChoice {
        goal: Goal,
    },
    SourceUpload {
        goal: Goal,
    },
    IntentForm {
        source: Option<SourceRef>,
    },
    Generating {
        source: Option<SourceRef>,
        intent: Intent,
    },
    AssignmentReview {
        source: Option<SourceRef>,
        intent: Intent,
        assignment: Assignment,
    },
    AssessmentInput {
        source: Option<SourceRef>,
    },
    ClassroomAnalysis {
        subject: AnalysisSubject,
    },
    FeedbackReview {
        subject: AnalysisSubject,
        feedback: Vec<StudentFeedback>,
    },
    Editing {
        subject: AnalysisSubject,
        feedback: Vec<StudentFeedback>,
    },
    Rewrite {
        subject: AnalysisSubject,
        feedback: Vec<StudentFeedback>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WizardEvent {
    ChooseGoal { goal: Goal },
    SetHasDocuments { has_documents: bool },
    UploadSource { file_name: String },
    SubmitIntent { intent: Intent },
    AssignmentGenerated { assignment: Assignment },
    SubmitAssessment { text: String },
    StartClassroomAnalysis,
    FeedbackReady { feedback: Vec<StudentFeedback> },
    EditAssignment,
    RequestRewrite,
    Back,
    Reset,
}

impl WizardState {
    pub fn step(&self) -> Step {
        match self {
            WizardState::GoalSelection => Step::GoalSelection,
            WizardState::DocumentChoice { .. } => Step::DocumentChoice,
            WizardState::SourceUpload { .. } => Step::SourceUpload,
            WizardState::IntentForm { .. } => Step::IntentForm,
            WizardState::Generating { .. } => Step::Generating,
            WizardState::AssignmentReview { .. } => Step::AssignmentReview,
            WizardState::AssessmentInput { .. } => Step::AssessmentInput,
            WizardState::ClassroomAnalysis { .. } => Step::ClassroomAnalysis,
            WizardState::FeedbackReview { .. } => Step::FeedbackReview,
            WizardState::Editing { .. } => Step::Editing,
            WizardState::Rewrite { .. } => Step::Rewrite,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Entry state after the document question is answered, for either branch.
fn branch_entry(goal: Goal, source: Option<SourceRef>) -> WizardState {
    match goal {
        Goal::Create => WizardState::IntentForm { source },
        Goal::Analyze => WizardState::AssessmentInput { source },
    }
}

/// Back from a branch entry: to the upload if one happened, else the document question.
fn before_branch(goal: Goal, source: &Option<SourceRef>) -> WizardState {
    match source {
        Some(_) => WizardState::SourceUpload { goal },
        None => WizardState::DocumentChoice { goal },
    }
}

pub fn next_step(state: WizardState, event: WizardEvent) -> WizardState {
    use WizardEvent as E;
    use WizardState as S;

    let from = state.step();
    let next = match (state, event) {
        (_, E::Reset) => S::GoalSelection,

        (S::GoalSelection, E::ChooseGoal { goal }) => S::DocumentChoice { goal },
        (S::DocumentChoice { goal }, E::SetHasDocuments { has_documents: true }) => {
            S::SourceUpload { goal }
        }
        (S::DocumentChoice { goal }, E::SetHasDocuments { has_documents: false }) => {
            branch_entry(goal, None)
        }
        (S::SourceUpload { goal }, E::UploadSource { file_name }) if !file_name.trim().is_empty() => {
            branch_entry(goal, Some(SourceRef { file_name }))
        }

        (S::IntentForm { source }, E::SubmitIntent { intent }) => S::Generating { source, intent },
        (S::Generating { source, intent }, E::AssignmentGenerated { assignment }) => {
            S::AssignmentReview {
                source,
                intent,
                assignment,
            }
        }
        (
            S::AssignmentReview {
                source,
                intent,
                assignment,
            },
            E::StartClassroomAnalysis,
        ) => S::ClassroomAnalysis {
            subject: AnalysisSubject::Generated {
                source,
                intent,
                assignment,
            },
        },

        (S::AssessmentInput { source }, E::SubmitAssessment { text }) if !text.trim().is_empty() => {
            S::ClassroomAnalysis {
                subject: AnalysisSubject::Existing { source, text },
            }
        }

        (S::ClassroomAnalysis { subject }, E::FeedbackReady { feedback }) => {
            S::FeedbackReview { subject, feedback }
        }
        (S::FeedbackReview { subject, feedback }, E::EditAssignment) => {
            S::Editing { subject, feedback }
        }
        (S::FeedbackReview { subject, feedback }, E::RequestRewrite) => {
            S::Rewrite { subject, feedback }
        }

        (state, E::Back) => back(state),
        (state, _) => state,
    };

    if next.step() != from {
        debug!("Wizard {:?} -> {:?}", from, next.step());
    }
    next
}

fn back(state: WizardState) -> WizardState {
    use WizardState as S;

    match state {
        S::GoalSelection => S::GoalSelection,
        S::DocumentChoice { .. } => S::GoalSelection,
        S::SourceUpload { goal } => S::DocumentChoice { goal },
        S::IntentForm { source } => before_branch(Goal::Create, &source),
        S::AssessmentInput { source } => before_branch(Goal::Analyze, &source),
        S::Generating { source, .. } | S::AssignmentReview { source, .. } => {
            S::IntentForm { source }
        }
        S::ClassroomAnalysis { subject } => subject.previous_state(),
        S::FeedbackReview { subject, .. } => S::ClassroomAnalysis { subject },
        S::Editing { subject, feedback } | S::Rewrite { subject, feedback } => {
            S::FeedbackReview { subject, feedback }
        }
    }
}

impl From<&WizardState> for FlowSnapshot {
    fn from(state: &WizardState) -> Self {
        use WizardState as S;

        let with_source = |goal: Goal, source: &Option<SourceRef>| FlowSnapshot {
            goal: Some(goal),
            has_source_docs: Some(source.is_some()),
            source_file: source.as_ref().map(|s| s.file_name.clone()),
            ..Default::default()
        };
        let analysed = |subject: &AnalysisSubject| {
            let mut snapshot = with_source(subject.goal(), subject.source());
            snapshot.ready_for_classroom_analysis = true;
            match subject {
                AnalysisSubject::Generated {
                    intent, assignment, ..
                } => {
                    snapshot.intent_data = Some(intent.clone());
                    snapshot.generated_assignment = Some(assignment.clone());
                }
                AnalysisSubject::Existing { text, .. } => {
                    snapshot.assessment_text = Some(text.clone());
                }
            }
            snapshot
        };

        match state {
            S::GoalSelection => FlowSnapshot::default(),
            S::DocumentChoice { goal } => FlowSnapshot {
                goal: Some(*goal),
                ..Default::default()
            },
            S::SourceUpload { goal } => FlowSnapshot {
                goal: Some(*goal),
                has_source_docs: Some(true),
                ..Default::default()
            },
            S::IntentForm { source } => with_source(Goal::Create, source),
            S::AssessmentInput { source } => with_source(Goal::Analyze, source),
            S::Generating { source, intent } => FlowSnapshot {
                intent_data: Some(intent.clone()),
                ..with_source(Goal::Create, source)
            },
            S::AssignmentReview {
                source,
                intent,
                assignment,
            } => FlowSnapshot {
                intent_data: Some(intent.clone()),
                generated_assignment: Some(assignment.clone()),
                ..with_source(Goal::Create, source)
            },
            S::ClassroomAnalysis { subject } => analysed(subject),
            S::FeedbackReview { subject, feedback } => FlowSnapshot {
                student_feedback: Some(feedback.clone()),
                ..analysed(subject)
            },
            S::Editing { subject, feedback } => FlowSnapshot {
                student_feedback: Some(feedback.clone()),
                ready_for_editing: true,
                ..analysed(subject)
            },
            S::Rewrite { subject, feedback } => FlowSnapshot {
                student_feedback: Some(feedback.clone()),
                ready_for_rewrite: true,
                ..analysed(subject)
            },
        }
    }
}
