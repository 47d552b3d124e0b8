//! Document export: PDF, Word and JSON artifacts from one assignment.
//!
//! Flow: validate_for_export → paginate → Renderer (pdf | docx) or JSON
//! interchange → Artifact.
//!
//! Validation runs before any bytes are produced, so a malformed problem fails
//! the whole export and no partial document is ever emitted. Renderers treat the
//! assignment as read-only.

pub mod docx;
pub mod handlers;
pub mod json;
pub mod pdf;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::layout::{paginate, PageLayoutConfig, PaginatedDocument, RenderOptions};
use crate::models::{Assignment, QuestionFormat};

pub use docx::DocxRenderer;
pub use pdf::PdfRenderer;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!(
                "Unsupported export format '{other}'. Use pdf, docx or json."
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Assignment has no problems to export")]
    EmptyAssignment,

    #[error("Problem {problem_id} cannot be exported: {reason}")]
    MalformedProblem { problem_id: String, reason: String },

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("Word rendering failed: {0}")]
    Docx(String),

    #[error("Invalid assignment export: {0}")]
    InvalidImport(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A finished export, ready to download or write to disk.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!("Wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// A document backend drawing a paginated document.
pub trait Renderer {
    fn format(&self) -> ExportFormat;

    fn render(&self, document: &PaginatedDocument) -> Result<Vec<u8>, ExportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Export pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Validates, lays out and renders an assignment in the requested format.
pub fn export(
    assignment: &Assignment,
    config: &PageLayoutConfig,
    format: ExportFormat,
    options: &RenderOptions,
    now: DateTime<Utc>,
) -> Result<Artifact, ExportError> {
    validate_for_export(assignment)?;

    let bytes = match format {
        ExportFormat::Json => json::export_json(assignment, options, now)?,
        ExportFormat::Pdf => PdfRenderer.render(&paginate(assignment, config, options))?,
        ExportFormat::Docx => DocxRenderer.render(&paginate(assignment, config, options))?,
    };

    let artifact = Artifact {
        file_name: export_file_name(&assignment.title, now, format),
        content_type: format.content_type(),
        bytes,
    };
    info!(
        "Exported assignment {} as {} ({} bytes)",
        assignment.id,
        artifact.file_name,
        artifact.bytes.len()
    );
    Ok(artifact)
}

/// Rejects assignments a renderer cannot draw faithfully.
pub fn validate_for_export(assignment: &Assignment) -> Result<(), ExportError> {
    if assignment.problem_count() == 0 {
        return Err(ExportError::EmptyAssignment);
    }

    for section in &assignment.sections {
        for problem in &section.problems {
            let malformed = |reason: String| ExportError::MalformedProblem {
                problem_id: problem.id.clone(),
                reason,
            };

            if problem.text.trim().is_empty() {
                return Err(malformed("question text is empty".to_string()));
            }
            if problem.format == QuestionFormat::MultipleChoice
                && problem.options.as_ref().map_or(true, |o| o.is_empty())
            {
                return Err(malformed("multiple-choice problem has no options".to_string()));
            }
            if problem.has_tip && problem.tip.as_deref().map_or(true, |t| t.trim().is_empty()) {
                return Err(malformed("tip flag is set but the tip text is missing".to_string()));
            }
            if problem.section_id != section.id {
                return Err(malformed(format!(
                    "belongs to section '{}' but is listed under '{}'",
                    problem.section_id, section.id
                )));
            }
        }
    }
    Ok(())
}

/// `<sanitized title>_<timestamp ms>.<ext>`
pub fn export_file_name(title: &str, now: DateTime<Utc>, format: ExportFormat) -> String {
    format!(
        "{}_{}.{}",
        sanitize_title(title),
        now.timestamp_millis(),
        format.extension()
    )
}

/// Lowercases and strips everything but ASCII letters and digits.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if cleaned.is_empty() {
        "assignment".to_string()
    } else {
        cleaned
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
