//! `assignment-v1` JSON interchange.
//!
//! The export carries a plain-text rendering (`content`) for humans and the full
//! structured assignment (`metadata`) so an export can be re-imported losslessly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::generation::simulation::{simulate_performance, StudentFeedback};
use crate::generation::templates::option_label;
use crate::layout::paginator::metadata_line;
use crate::layout::RenderOptions;
use crate::models::{Assignment, QuestionFormat};
use crate::render::ExportError;

pub const EXPORT_FORMAT: &str = "assignment-v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentExport {
    pub export_date: DateTime<Utc>,
    pub format: String,
    pub assignment: ExportedAssignment,
    pub analysis: ExportAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedAssignment {
    pub title: String,
    pub content: String,
    pub metadata: Assignment,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportAnalysis {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub student_feedback: Vec<StudentFeedback>,
}

pub fn build_export(
    assignment: &Assignment,
    options: &RenderOptions,
    now: DateTime<Utc>,
) -> AssignmentExport {
    let mut tags: Vec<String> = Vec::new();
    for tag in assignment.problems().flat_map(|p| p.tags.iter()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }

    AssignmentExport {
        export_date: now,
        format: EXPORT_FORMAT.to_string(),
        assignment: ExportedAssignment {
            title: assignment.title.clone(),
            content: plain_text(assignment, options),
            metadata: assignment.clone(),
        },
        analysis: ExportAnalysis {
            tags,
            student_feedback: simulate_performance(assignment, &[]).feedback,
        },
    }
}

pub fn export_json(
    assignment: &Assignment,
    options: &RenderOptions,
    now: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(&build_export(assignment, options, now))?)
}

/// Parses an `assignment-v1` export. Any other `format` tag is rejected.
pub fn parse_json_export(bytes: &[u8]) -> Result<AssignmentExport, ExportError> {
    let export: AssignmentExport = serde_json::from_slice(bytes)
        .map_err(|e| ExportError::InvalidImport(e.to_string()))?;
    if export.format != EXPORT_FORMAT {
        return Err(ExportError::InvalidImport(format!(
            "unsupported format '{}', expected '{EXPORT_FORMAT}'",
            export.format
        )));
    }
    if export.assignment.metadata.problem_count() == 0 {
        return Err(ExportError::InvalidImport(
            "assignment metadata contains no problems".to_string(),
        ));
    }
    Ok(export)
}

/// Text rendering in document order, same content the paged renderers draw.
pub fn plain_text(assignment: &Assignment, options: &RenderOptions) -> String {
    let mut lines = vec![assignment.title.clone()];
    if options.include_metadata {
        lines.push(metadata_line(assignment, options));
    }
    if options.include_name_date {
        lines.push("Name: ____________________    Date: __________".to_string());
    }

    let mut number = 0;
    for section in &assignment.sections {
        lines.push(String::new());
        lines.push(section.title.clone());
        if let Some(instructions) = section.instructions.as_deref() {
            lines.push(instructions.to_string());
        }
        for problem in &section.problems {
            number += 1;
            lines.push(String::new());
            lines.push(format!("{number}. {}", problem.text));
            match problem.format {
                QuestionFormat::MultipleChoice => {
                    for (i, option) in problem.options.iter().flatten().enumerate() {
                        lines.push(format!("   [ ] {}. {option}", option_label(i)));
                    }
                }
                QuestionFormat::TrueFalse => lines.push("   [ ] True   [ ] False".to_string()),
                QuestionFormat::FillBlank => lines.push("   Answer: ____________".to_string()),
                QuestionFormat::ShortAnswer | QuestionFormat::FreeResponse => {}
            }
            if let Some(tip) = problem.visible_tip() {
                lines.push(format!("   Tip: {tip}"));
            }
        }
    }
    lines.join("\n")
}
