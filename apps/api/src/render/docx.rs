//! Word backend: writes a minimal WordprocessingML package with `zip`.
//!
//! Word reflows text itself, so the estimator's breaks are pinned explicitly:
//! the first paragraph of every laid-out page gets `pageBreakBefore`, and each
//! problem's paragraphs carry `keepLines`/`keepNext` so a problem is never split.
//! The footer holds PAGE / NUMPAGES fields for "Page X of Y".

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::layout::estimator::{AnswerArea, ProblemLayout, ANSWER_LINE_MM, NUMBER_INDENT_MM};
use crate::layout::paginator::{BlockKind, SECTION_TITLE_SCALE, TITLE_SCALE};
use crate::layout::{PageLayoutConfig, PaginatedDocument};
use crate::render::{ExportError, ExportFormat, Renderer};

/// Twentieths of a point per millimetre.
const TWIPS_PER_MM: f32 = 1440.0 / 25.4;
const CHECKBOX: &str = "\u{2610}";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>
</Relationships>"#;

const W_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

pub struct DocxRenderer;

impl Renderer for DocxRenderer {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn render(&self, document: &PaginatedDocument) -> Result<Vec<u8>, ExportError> {
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/styles.xml", styles_xml(&document.config)),
            ("word/footer1.xml", footer_xml()),
            ("word/document.xml", document_xml(document)),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, body) in parts {
            zip.start_file(name, options).map_err(docx_err)?;
            zip.write_all(body.as_bytes())?;
        }
        let cursor = zip.finish().map_err(docx_err)?;
        Ok(cursor.into_inner())
    }
}

fn docx_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Docx(e.to_string())
}

fn twips(mm: f32) -> i64 {
    (mm * TWIPS_PER_MM).round() as i64
}

/// Font size in half-points, as `w:sz` expects.
fn half_points(pt: f32) -> i64 {
    (pt * 2.0).round() as i64
}

/// Escapes markup and drops characters XML 1.0 does not allow in a document.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' | '\n' | '\r' => out.push(c),
            c if c < '\u{20}' => {}
            '\u{FFFE}' | '\u{FFFF}' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Paragraph builder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Para {
    align_center: bool,
    keep_next: bool,
    keep_lines: bool,
    page_break_before: bool,
    bottom_border: bool,
    indent_mm: f32,
    /// First line starts this far left of `indent_mm`.
    hanging_mm: f32,
    tab_stops_mm: Vec<f32>,
    exact_height_mm: Option<f32>,
    space_after_mm: f32,
    runs: Vec<Run>,
}

struct Run {
    text: String,
    tab: bool,
    bold: bool,
    italic: bool,
    size_pt: Option<f32>,
}

impl Run {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tab: false,
            bold: false,
            italic: false,
            size_pt: None,
        }
    }

    fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }

    fn italic(text: impl Into<String>) -> Self {
        Self {
            italic: true,
            ..Self::plain(text)
        }
    }

    fn tab() -> Self {
        Self {
            tab: true,
            ..Self::plain("")
        }
    }

    fn sized(mut self, size_pt: f32) -> Self {
        self.size_pt = Some(size_pt);
        self
    }

    fn to_xml(&self) -> String {
        if self.tab {
            return "<w:r><w:tab/></w:r>".to_string();
        }
        let mut props = String::new();
        if self.bold {
            props.push_str("<w:b/>");
        }
        if self.italic {
            props.push_str("<w:i/>");
        }
        if let Some(size) = self.size_pt {
            props.push_str(&format!(r#"<w:sz w:val="{}"/>"#, half_points(size)));
        }
        let rpr = if props.is_empty() {
            String::new()
        } else {
            format!("<w:rPr>{props}</w:rPr>")
        };
        format!(
            r#"<w:r>{rpr}<w:t xml:space="preserve">{}</w:t></w:r>"#,
            xml_escape(&self.text)
        )
    }
}

impl Para {
    fn with_runs(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    fn to_xml(&self) -> String {
        let mut ppr = String::new();
        if self.keep_next {
            ppr.push_str("<w:keepNext/>");
        }
        if self.keep_lines {
            ppr.push_str("<w:keepLines/>");
        }
        if self.page_break_before {
            ppr.push_str("<w:pageBreakBefore/>");
        }
        if self.bottom_border {
            ppr.push_str(
                r#"<w:pBdr><w:bottom w:val="single" w:sz="4" w:space="1" w:color="auto"/></w:pBdr>"#,
            );
        }
        let line = self
            .exact_height_mm
            .map(|h| format!(r#" w:line="{}" w:lineRule="exact""#, twips(h)))
            .unwrap_or_default();
        if !self.tab_stops_mm.is_empty() {
            let stops: String = self
                .tab_stops_mm
                .iter()
                .map(|mm| format!(r#"<w:tab w:val="left" w:pos="{}"/>"#, twips(*mm)))
                .collect();
            ppr.push_str(&format!("<w:tabs>{stops}</w:tabs>"));
        }
        ppr.push_str(&format!(
            r#"<w:spacing w:before="0" w:after="{}"{line}/>"#,
            twips(self.space_after_mm)
        ));
        if self.hanging_mm > 0.0 {
            ppr.push_str(&format!(
                r#"<w:ind w:left="{}" w:hanging="{}"/>"#,
                twips(self.indent_mm),
                twips(self.hanging_mm)
            ));
        } else if self.indent_mm > 0.0 {
            ppr.push_str(&format!(r#"<w:ind w:left="{}"/>"#, twips(self.indent_mm)));
        }
        if self.align_center {
            ppr.push_str(r#"<w:jc w:val="center"/>"#);
        }
        let runs: String = self.runs.iter().map(Run::to_xml).collect();
        format!("<w:p><w:pPr>{ppr}</w:pPr>{runs}</w:p>")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parts
// ────────────────────────────────────────────────────────────────────────────

fn document_xml(document: &PaginatedDocument) -> String {
    let config = &document.config;
    let mut body = String::new();

    for page in &document.pages {
        let mut paras: Vec<Para> = Vec::new();
        for block in &page.blocks {
            paras.extend(block_paragraphs(&block.kind, config));
        }
        if page.number > 1 {
            if let Some(first) = paras.first_mut() {
                first.page_break_before = true;
            }
        }
        for para in &paras {
            body.push_str(&para.to_xml());
        }
    }

    let footer_margin = config.margins_mm / 2.0;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document {W_NS}><w:body>{body}<w:sectPr><w:footerReference w:type="default" r:id="rId2"/><w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="{f}" w:footer="{f}" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
        twips(config.page_width_mm()),
        twips(config.page_height_mm()),
        m = twips(config.margins_mm),
        f = twips(footer_margin),
    )
}

fn block_paragraphs(kind: &BlockKind, config: &PageLayoutConfig) -> Vec<Para> {
    let size = config.font_size_pt;
    match kind {
        BlockKind::Title { lines } => {
            let mut para = Para::with_runs(vec![Run::bold(lines.join(" ")).sized(size * TITLE_SCALE)]);
            para.align_center = true;
            para.space_after_mm = 3.0;
            vec![para]
        }
        BlockKind::Metadata { text } => {
            let mut para = Para::with_runs(vec![Run::italic(text.clone()).sized(size * 0.9)]);
            para.align_center = true;
            para.space_after_mm = 2.0;
            vec![para]
        }
        BlockKind::NameDate => {
            let mut para = Para::with_runs(vec![Run::plain(
                "Name: ______________________________    Date: ______________",
            )]);
            para.space_after_mm = 6.0;
            vec![para]
        }
        BlockKind::SectionHeader {
            title,
            instruction_lines,
        } => {
            let mut header = Para::with_runs(vec![Run::bold(title.clone()).sized(size * SECTION_TITLE_SCALE)]);
            header.keep_next = true;
            let mut paras = vec![header];
            if !instruction_lines.is_empty() {
                let mut instructions = Para::with_runs(vec![Run::italic(instruction_lines.join(" "))]);
                instructions.keep_next = true;
                paras.push(instructions);
            }
            if let Some(last) = paras.last_mut() {
                last.space_after_mm = 3.0;
            }
            paras
        }
        BlockKind::Problem(layout) => problem_paragraphs(layout, config),
    }
}

fn problem_paragraphs(layout: &ProblemLayout, config: &PageLayoutConfig) -> Vec<Para> {
    let mut paras = vec![Para::with_runs(vec![
        Run::bold(format!("{}. ", layout.number)),
        Run::plain(layout.question_lines.join(" ")),
    ])];

    match &layout.answer {
        AnswerArea::Choices {
            choices,
            text_indent_mm,
        } => {
            for choice in choices {
                let mut para = Para::with_runs(vec![
                    Run::plain(format!("{CHECKBOX} {}.", choice.label)),
                    Run::tab(),
                    Run::plain(choice.lines.join(" ")),
                ]);
                para.indent_mm = *text_indent_mm;
                para.hanging_mm = text_indent_mm - NUMBER_INDENT_MM;
                paras.push(para);
            }
        }
        AnswerArea::TrueFalse(tf) => {
            let mut para = Para::with_runs(vec![
                Run::plain(format!("{CHECKBOX} True")),
                Run::tab(),
                Run::plain(format!("{CHECKBOX} False")),
            ]);
            para.indent_mm = tf.true_box_mm;
            para.tab_stops_mm = vec![tf.false_box_mm];
            paras.push(para);
        }
        AnswerArea::Lines { count } => {
            for _ in 0..*count {
                let mut para = Para::with_runs(vec![]);
                para.bottom_border = true;
                para.exact_height_mm = Some(ANSWER_LINE_MM);
                para.indent_mm = NUMBER_INDENT_MM;
                paras.push(para);
            }
        }
        AnswerArea::Blank => {
            let mut para = Para::with_runs(vec![Run::plain("Answer: ______________________________")]);
            para.indent_mm = NUMBER_INDENT_MM;
            paras.push(para);
        }
    }

    if !layout.tip_lines.is_empty() {
        let mut tip = Para::with_runs(vec![Run::italic(layout.tip_lines.join(" ")).sized(config.font_size_pt * 0.9)]);
        tip.indent_mm = NUMBER_INDENT_MM;
        paras.push(tip);
    }

    let last = paras.len() - 1;
    for (i, para) in paras.iter_mut().enumerate() {
        para.keep_lines = true;
        para.keep_next = i < last;
    }
    paras[last].space_after_mm = 6.0;
    paras
}

fn styles_xml(config: &PageLayoutConfig) -> String {
    let font = xml_escape(config.font.docx_name());
    let line = (config.line_spacing * 240.0).round() as i64;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles {W_NS}><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/><w:sz w:val="{sz}"/><w:szCs w:val="{sz}"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="0" w:line="{line}" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults></w:styles>"#,
        sz = half_points(config.font_size_pt),
    )
}

fn footer_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:ftr {W_NS}><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:t xml:space="preserve">Page </w:t></w:r><w:fldSimple w:instr=" PAGE "><w:r><w:t>1</w:t></w:r></w:fldSimple><w:r><w:t xml:space="preserve"> of </w:t></w:r><w:fldSimple w:instr=" NUMPAGES "><w:r><w:t>1</w:t></w:r></w:fldSimple></w:p></w:ftr>"#
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
