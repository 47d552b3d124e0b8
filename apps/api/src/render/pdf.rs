//! PDF backend: draws a `PaginatedDocument` with lopdf.
//!
//! Uses the standard Type1 fonts with WinAnsiEncoding, so nothing is embedded.
//! Layout positions are millimetres from the top margin; PDF user space is
//! points from the bottom-left corner, so every y is flipped here.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::layout::estimator::{
    choice_label_x_mm, AnswerArea, ProblemLayout, ANSWER_GAP_MM, ANSWER_LINE_MM, CHECKBOX_MM,
    NUMBER_INDENT_MM,
};
use crate::layout::paginator::{BlockKind, PlacedBlock, SECTION_TITLE_SCALE, TITLE_SCALE};
use crate::layout::{get_metrics, PageLayoutConfig, PaginatedDocument, MM_PER_PT};
use crate::render::{ExportError, ExportFormat, Renderer};

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
const FONT_ITALIC: &str = "F3";

/// Baseline position inside a line box, as a fraction of the line height.
const BASELINE_RATIO: f32 = 0.75;

pub struct PdfRenderer;

impl Renderer for PdfRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, document: &PaginatedDocument) -> Result<Vec<u8>, ExportError> {
        render_pdf(document)
    }
}

fn pdf_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(e.to_string())
}

fn pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

// ────────────────────────────────────────────────────────────────────────────
// Document assembly
// ────────────────────────────────────────────────────────────────────────────

fn render_pdf(document: &PaginatedDocument) -> Result<Vec<u8>, ExportError> {
    let config = &document.config;
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font = |name: &str| {
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => Object::Name(name.as_bytes().to_vec()),
            "Encoding" => "WinAnsiEncoding",
        }
    };
    let regular_id = doc.add_object(font(config.font.pdf_regular()));
    let bold_id = doc.add_object(font(config.font.pdf_bold()));
    let italic_id = doc.add_object(font(config.font.pdf_italic()));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular_id,
            FONT_BOLD => bold_id,
            FONT_ITALIC => italic_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let mut painter = PagePainter::new(config);
        for block in &page.blocks {
            painter.draw_block(block);
        }
        painter.footer(&document.footer_label(page.number));

        let content = Content {
            operations: painter.finish(),
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(pdf_err)?,
        ));
        let page_id = add_page(&mut doc, pages_id, content_id);
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                pt(config.page_width_mm()).into(),
                pt(config.page_height_mm()).into(),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(pdf_err)?;
    Ok(bytes)
}

fn add_page(doc: &mut Document, pages_id: ObjectId, content_id: ObjectId) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Page painter
// ────────────────────────────────────────────────────────────────────────────

struct PagePainter<'a> {
    config: &'a PageLayoutConfig,
    ops: Vec<Operation>,
}

impl<'a> PagePainter<'a> {
    fn new(config: &'a PageLayoutConfig) -> Self {
        Self {
            config,
            ops: vec![Operation::new("w", vec![0.5_f32.into()])],
        }
    }

    fn finish(self) -> Vec<Operation> {
        self.ops
    }

    fn left_mm(&self) -> f32 {
        self.config.margins_mm
    }

    fn right_mm(&self) -> f32 {
        self.config.page_width_mm() - self.config.margins_mm
    }

    /// Converts a top-margin offset to a PDF y coordinate in points.
    fn y(&self, top_mm: f32) -> f32 {
        pt(self.config.page_height_mm() - self.config.margins_mm - top_mm)
    }

    fn text(&mut self, font: &str, size_pt: f32, x_mm: f32, baseline_top_mm: f32, text: &str) {
        let y = self.y(baseline_top_mm);
        self.ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size_pt.into()]),
            Operation::new("Td", vec![pt(x_mm).into(), y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    fn centered(&mut self, font: &str, size_pt: f32, baseline_top_mm: f32, text: &str) {
        let width_mm = get_metrics(self.config.font).measure_str(text) * size_pt * MM_PER_PT;
        let x = (self.config.page_width_mm() - width_mm) / 2.0;
        self.text(font, size_pt, x.max(self.left_mm()), baseline_top_mm, text);
    }

    fn rule(&mut self, x1_mm: f32, x2_mm: f32, top_mm: f32) {
        let y = self.y(top_mm);
        self.ops.extend([
            Operation::new("m", vec![pt(x1_mm).into(), y.into()]),
            Operation::new("l", vec![pt(x2_mm).into(), y.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    /// Square checkbox whose bottom edge sits on the given baseline.
    fn checkbox(&mut self, x_mm: f32, baseline_top_mm: f32) {
        let size = pt(CHECKBOX_MM);
        self.ops.extend([
            Operation::new(
                "re",
                vec![
                    pt(x_mm).into(),
                    self.y(baseline_top_mm).into(),
                    size.into(),
                    size.into(),
                ],
            ),
            Operation::new("S", vec![]),
        ]);
    }

    fn draw_block(&mut self, block: &PlacedBlock) {
        let lh = self.config.line_height_mm();
        let size = self.config.font_size_pt;
        let top = block.top_mm;

        match &block.kind {
            BlockKind::Title { lines } => {
                let title_lh = lh * TITLE_SCALE;
                for (i, line) in lines.iter().enumerate() {
                    let baseline = top + i as f32 * title_lh + title_lh * BASELINE_RATIO;
                    self.centered(FONT_BOLD, size * TITLE_SCALE, baseline, line);
                }
            }
            BlockKind::Metadata { text } => {
                self.centered(FONT_ITALIC, size * 0.9, top + lh * BASELINE_RATIO, text);
            }
            BlockKind::NameDate => {
                let baseline = top + lh * BASELINE_RATIO;
                let left = self.left_mm();
                let right = self.right_mm();
                self.text(FONT_REGULAR, size, left, baseline, "Name:");
                self.rule(left + 15.0, left + 100.0, baseline);
                self.text(FONT_REGULAR, size, left + 110.0, baseline, "Date:");
                self.rule(left + 123.0, right, baseline);
            }
            BlockKind::SectionHeader {
                title,
                instruction_lines,
            } => {
                let title_lh = lh * SECTION_TITLE_SCALE;
                let left = self.left_mm();
                self.text(
                    FONT_BOLD,
                    size * SECTION_TITLE_SCALE,
                    left,
                    top + title_lh * BASELINE_RATIO,
                    title,
                );
                for (i, line) in instruction_lines.iter().enumerate() {
                    let baseline = top + title_lh + i as f32 * lh + lh * BASELINE_RATIO;
                    self.text(FONT_ITALIC, size, left, baseline, line);
                }
            }
            BlockKind::Problem(layout) => self.draw_problem(top, layout),
        }
    }

    fn draw_problem(&mut self, top: f32, layout: &ProblemLayout) {
        let lh = self.config.line_height_mm();
        let size = self.config.font_size_pt;
        let left = self.left_mm();
        let text_x = left + NUMBER_INDENT_MM;

        self.text(
            FONT_BOLD,
            size,
            left,
            top + lh * BASELINE_RATIO,
            &format!("{}.", layout.number),
        );
        for (i, line) in layout.question_lines.iter().enumerate() {
            self.text(
                FONT_REGULAR,
                size,
                text_x,
                top + i as f32 * lh + lh * BASELINE_RATIO,
                line,
            );
        }

        let area_top = top + layout.reserved_question_lines as f32 * lh + ANSWER_GAP_MM;
        match &layout.answer {
            AnswerArea::Choices {
                choices,
                text_indent_mm,
            } => {
                let mut row = area_top;
                for choice in choices {
                    let baseline = row + lh * BASELINE_RATIO;
                    self.checkbox(text_x, baseline);
                    let label = format!("{}.", choice.label);
                    self.text(FONT_REGULAR, size, left + choice_label_x_mm(), baseline, &label);
                    for (i, line) in choice.lines.iter().enumerate() {
                        let baseline = row + i as f32 * lh + lh * BASELINE_RATIO;
                        self.text(FONT_REGULAR, size, left + text_indent_mm, baseline, line);
                    }
                    row += choice.lines.len() as f32 * lh;
                }
            }
            AnswerArea::TrueFalse(tf) => {
                let baseline = area_top + lh * BASELINE_RATIO;
                self.checkbox(left + tf.true_box_mm, baseline);
                self.text(FONT_REGULAR, size, left + tf.true_label_mm, baseline, "True");
                self.checkbox(left + tf.false_box_mm, baseline);
                self.text(FONT_REGULAR, size, left + tf.false_label_mm, baseline, "False");
            }
            AnswerArea::Lines { count } => {
                let right = self.right_mm();
                for i in 1..=*count {
                    self.rule(text_x, right, area_top + i as f32 * ANSWER_LINE_MM);
                }
            }
            AnswerArea::Blank => {
                let baseline = area_top + ANSWER_LINE_MM;
                self.text(FONT_REGULAR, size, text_x, baseline, "Answer:");
                self.rule(text_x + 18.0, text_x + 90.0, baseline);
            }
        }

        if !layout.tip_lines.is_empty() {
            let tip_top = area_top + layout.answer_height_mm(self.config) + ANSWER_GAP_MM;
            for (i, line) in layout.tip_lines.iter().enumerate() {
                let baseline = tip_top + i as f32 * lh + lh * BASELINE_RATIO;
                self.text(FONT_ITALIC, size * 0.9, text_x, baseline, line);
            }
        }
    }

    /// "Page X of Y", centred in the bottom margin.
    fn footer(&mut self, label: &str) {
        let size = self.config.font_size_pt * 0.8;
        let baseline = self.config.usable_height_mm() + self.config.margins_mm / 2.0;
        self.centered(FONT_REGULAR, size, baseline, label);
    }
}

/// Encodes text for a WinAnsiEncoding font; unmappable characters become '?'.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{20AC}' => 0x80,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
