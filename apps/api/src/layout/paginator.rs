//! Greedy pagination.
//!
//! Walks the document top to bottom and breaks before any block where
//! `cursor + height > usable_bottom`. A section header is never left alone at
//! the bottom of a page: it moves with its first problem. A problem taller than
//! a whole page still starts on a fresh page and is reported as oversize.
//!
//! Positions are millimetres from the top margin. Both renderers consume the
//! resulting `PaginatedDocument`, so the PDF and DOCX break in the same places.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::layout::estimator::{layout_problem, ProblemLayout};
use crate::layout::font_metrics::get_metrics;
use crate::layout::page::PageLayoutConfig;
use crate::models::{Assignment, Section};

/// Title font size relative to body text.
pub const TITLE_SCALE: f32 = 1.5;
/// Section title font size relative to body text.
pub const SECTION_TITLE_SCALE: f32 = 1.15;

const TITLE_GAP_MM: f32 = 3.0;
const METADATA_GAP_MM: f32 = 2.0;
const NAME_DATE_GAP_MM: f32 = 6.0;
const SECTION_GAP_MM: f32 = 3.0;

/// Presentation switches that change what is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub include_name_date: bool,
    pub include_metadata: bool,
    /// Shown in the metadata line, e.g. the uploaded file the assessment came from.
    pub source_label: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_name_date: true,
            include_metadata: true,
            source_label: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BlockKind {
    Title { lines: Vec<String> },
    Metadata { text: String },
    NameDate,
    SectionHeader {
        title: String,
        instruction_lines: Vec<String>,
    },
    Problem(ProblemLayout),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedBlock {
    pub top_mm: f32,
    pub height_mm: f32,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub number: usize,
    pub blocks: Vec<PlacedBlock>,
}

impl Page {
    pub fn used_mm(&self) -> f32 {
        self.blocks
            .last()
            .map(|b| b.top_mm + b.height_mm)
            .unwrap_or(0.0)
    }

    pub fn problem_ids(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(|b| match &b.kind {
                BlockKind::Problem(p) => Some(p.problem_id.clone()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedDocument {
    pub title: String,
    pub config: PageLayoutConfig,
    pub pages: Vec<Page>,
    /// Problems taller than one page; they overflow the bottom margin.
    pub oversize_problems: Vec<String>,
}

impl PaginatedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn footer_label(&self, page_number: usize) -> String {
        format!("Page {} of {}", page_number, self.page_count())
    }

    pub fn summary(&self) -> PaginationSummary {
        PaginationSummary {
            page_count: self.page_count(),
            usable_height_mm: self.config.usable_height_mm(),
            pages: self
                .pages
                .iter()
                .map(|p| PageSummary {
                    number: p.number,
                    used_mm: p.used_mm(),
                    problem_ids: p.problem_ids(),
                })
                .collect(),
            oversize_problems: self.oversize_problems.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub number: usize,
    pub used_mm: f32,
    pub problem_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationSummary {
    pub page_count: usize,
    pub usable_height_mm: f32,
    pub pages: Vec<PageSummary>,
    pub oversize_problems: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

struct PageCursor {
    bottom_mm: f32,
    cursor_mm: f32,
    current: Vec<PlacedBlock>,
    pages: Vec<Page>,
}

impl PageCursor {
    fn new(bottom_mm: f32) -> Self {
        Self {
            bottom_mm,
            cursor_mm: 0.0,
            current: Vec::new(),
            pages: Vec::new(),
        }
    }

    fn fits(&self, height_mm: f32) -> bool {
        self.cursor_mm + height_mm <= self.bottom_mm
    }

    fn is_fresh(&self) -> bool {
        self.current.is_empty()
    }

    fn break_page(&mut self) {
        let number = self.pages.len() + 1;
        debug!("Page {} closed at {:.1} mm", number, self.cursor_mm);
        self.pages.push(Page {
            number,
            blocks: std::mem::take(&mut self.current),
        });
        self.cursor_mm = 0.0;
    }

    /// Breaks first when the block would cross the bottom of a non-empty page.
    fn place_with_break(&mut self, kind: BlockKind, height_mm: f32) {
        if !self.fits(height_mm) && !self.is_fresh() {
            self.break_page();
        }
        self.place(kind, height_mm);
    }

    fn place(&mut self, kind: BlockKind, height_mm: f32) {
        self.current.push(PlacedBlock {
            top_mm: self.cursor_mm,
            height_mm,
            kind,
        });
        self.cursor_mm += height_mm;
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.break_page();
        }
        self.pages
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pagination
// ────────────────────────────────────────────────────────────────────────────

pub fn paginate(
    assignment: &Assignment,
    config: &PageLayoutConfig,
    options: &RenderOptions,
) -> PaginatedDocument {
    let usable = config.usable_height_mm();
    let lh = config.line_height_mm();
    let mut cursor = PageCursor::new(usable);
    let mut oversize_problems = Vec::new();

    let title_lines = wrap_scaled(&assignment.title, config, TITLE_SCALE);
    let title_h = title_lines.len() as f32 * lh * TITLE_SCALE + TITLE_GAP_MM;
    cursor.place(BlockKind::Title { lines: title_lines }, title_h);

    if options.include_metadata {
        cursor.place(
            BlockKind::Metadata {
                text: metadata_line(assignment, options),
            },
            lh + METADATA_GAP_MM,
        );
    }
    if options.include_name_date {
        cursor.place(BlockKind::NameDate, lh + NAME_DATE_GAP_MM);
    }

    let mut number = 0usize;
    for section in &assignment.sections {
        let (header, header_h) = section_header(section, config);
        let mut problems = section.problems.iter().map(|p| {
            number += 1;
            layout_problem(p, number, config)
        });

        let Some(first) = problems.next() else {
            cursor.place_with_break(header, header_h);
            continue;
        };

        // Keep the header with its first problem.
        if !cursor.fits(header_h + first.height_mm) && !cursor.is_fresh() {
            cursor.break_page();
        }
        cursor.place(header, header_h);
        if !cursor.fits(first.height_mm) && first.height_mm <= usable {
            debug!(
                "Section '{}' header and first problem exceed one page; splitting",
                section.title
            );
            cursor.break_page();
        }
        place_problem(&mut cursor, first, usable, &mut oversize_problems);

        for layout in problems {
            if !cursor.fits(layout.height_mm) && !cursor.is_fresh() {
                cursor.break_page();
            }
            place_problem(&mut cursor, layout, usable, &mut oversize_problems);
        }
    }

    let pages = cursor.finish();
    debug!(
        "Paginated '{}' into {} page(s) at {:.1} mm usable height",
        assignment.title,
        pages.len(),
        usable
    );

    PaginatedDocument {
        title: assignment.title.clone(),
        config: *config,
        pages,
        oversize_problems,
    }
}

fn place_problem(
    cursor: &mut PageCursor,
    layout: ProblemLayout,
    usable_mm: f32,
    oversize: &mut Vec<String>,
) {
    if layout.height_mm > usable_mm {
        warn!(
            "Problem {} needs {:.1} mm but a page holds {:.1} mm; it will overflow",
            layout.problem_id, layout.height_mm, usable_mm
        );
        oversize.push(layout.problem_id.clone());
    }
    let height = layout.height_mm;
    cursor.place(BlockKind::Problem(layout), height);
}

fn section_header(section: &Section, config: &PageLayoutConfig) -> (BlockKind, f32) {
    let metrics = get_metrics(config.font);
    let lh = config.line_height_mm();
    let instruction_lines = section
        .instructions
        .as_deref()
        .map(|i| metrics.wrap_text(i, config.width_em(config.content_width_mm())))
        .unwrap_or_default();
    let height =
        lh * SECTION_TITLE_SCALE + instruction_lines.len() as f32 * lh + SECTION_GAP_MM;
    (
        BlockKind::SectionHeader {
            title: section.title.clone(),
            instruction_lines,
        },
        height,
    )
}

fn wrap_scaled(text: &str, config: &PageLayoutConfig, scale: f32) -> Vec<String> {
    let width_em = config.width_em(config.content_width_mm()) / scale;
    let lines = get_metrics(config.font).wrap_text(text, width_em);
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// "Time: 25 min · Questions: 10 · Type: Quiz · Source: notes.pdf"
pub fn metadata_line(assignment: &Assignment, options: &RenderOptions) -> String {
    let mut parts = vec![
        format!("Time: {} min", assignment.estimated_minutes),
        format!("Questions: {}", assignment.problem_count()),
        format!("Type: {}", assignment.assignment_type.display_name()),
    ];
    if let Some(source) = options.source_label.as_deref().filter(|s| !s.trim().is_empty()) {
        parts.push(format!("Source: {}", source.trim()));
    }
    parts.join(" · ")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
