//! Source-document ingestion for uploaded teaching material.
//!
//! Files are checked (extension, size, emptiness) before any extraction runs,
//! and the extracted text never reaches the generator if a check fails.

pub mod handlers;

use std::io::{Cursor, Read};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".txt", ".pdf", ".docx", ".doc"];

/// Shortest printable run kept when scanning a legacy Word binary.
const DOC_MIN_RUN: usize = 8;
const TOPIC_MAX_WORDS: usize = 8;
/// Ceiling on the decompressed size of `word/document.xml`.
pub const MAX_DOCX_XML_BYTES: u64 = 32 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Txt,
    Pdf,
    Docx,
    Doc,
}

impl DocumentKind {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "txt" => Some(DocumentKind::Txt),
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "doc" => Some(DocumentKind::Doc),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported file type '{file_name}'. Allowed extensions: {}", ALLOWED_EXTENSIONS.join(", "))]
    UnsupportedType { file_name: String },

    #[error("File '{file_name}' is {size} bytes; the limit is {limit} bytes")]
    TooLarge {
        file_name: String,
        size: usize,
        limit: usize,
    },

    #[error("File '{0}' is empty")]
    Empty(String),

    #[error("Could not read text from '{file_name}': {reason}")]
    Extraction { file_name: String, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceDocument {
    pub id: Uuid,
    pub file_name: String,
    pub kind: DocumentKind,
    pub text: String,
    pub word_count: usize,
    /// First meaningful line, offered as the intent topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_topic: Option<String>,
}

/// Checks the upload and extracts its text.
pub fn ingest(file_name: &str, bytes: &[u8], max_bytes: usize) -> Result<SourceDocument, UploadError> {
    let kind = DocumentKind::from_file_name(file_name).ok_or_else(|| UploadError::UnsupportedType {
        file_name: file_name.to_string(),
    })?;
    if bytes.len() > max_bytes {
        return Err(UploadError::TooLarge {
            file_name: file_name.to_string(),
            size: bytes.len(),
            limit: max_bytes,
        });
    }
    if bytes.is_empty() {
        return Err(UploadError::Empty(file_name.to_string()));
    }

    let extraction_err = |reason: String| UploadError::Extraction {
        file_name: file_name.to_string(),
        reason,
    };
    let text = match kind {
        DocumentKind::Txt => String::from_utf8_lossy(bytes).into_owned(),
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| extraction_err(e.to_string()))?
        }
        DocumentKind::Docx => {
            extract_docx_text(bytes, MAX_DOCX_XML_BYTES).map_err(extraction_err)?
        }
        DocumentKind::Doc => scan_printable_runs(bytes),
    };
    let text = normalize_whitespace(&text);
    if text.is_empty() {
        warn!("Upload {file_name} produced no text");
        return Err(UploadError::Empty(file_name.to_string()));
    }

    let word_count = text.split_whitespace().count();
    info!("Ingested {file_name} ({kind:?}, {word_count} words)");
    Ok(SourceDocument {
        id: Uuid::new_v4(),
        file_name: file_name.to_string(),
        kind,
        suggested_topic: suggest_topic(&text),
        word_count,
        text,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Reads `word/document.xml` and keeps the text between tags, one line per paragraph.
///
/// The entry is never inflated past `max_xml_bytes`, whatever its header claims.
pub fn extract_docx_text(bytes: &[u8], max_xml_bytes: u64) -> Result<String, String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?;
    let too_large = || format!("document.xml expands past the {max_xml_bytes} byte limit");
    if entry.size() > max_xml_bytes {
        return Err(too_large());
    }

    let mut xml = String::new();
    entry
        .take(max_xml_bytes + 1)
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;
    if xml.len() as u64 > max_xml_bytes {
        return Err(too_large());
    }
    Ok(strip_xml(&xml))
}

fn strip_xml(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    let mut rest = xml;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start + 1..start + end];
        if tag == "/w:p" || tag.starts_with("w:br") {
            out.push('\n');
        } else if tag.starts_with("w:tab") && tag.ends_with('/') {
            out.push(' ');
        }
        rest = &rest[start + end + 1..];
    }
    decode_entities(&out)
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Best effort for legacy binary `.doc`: long runs of printable ASCII.
pub fn scan_printable_runs(bytes: &[u8]) -> String {
    let mut runs = Vec::new();
    let mut current = String::new();
    for &b in bytes {
        if b == b' ' || b.is_ascii_graphic() || b == b'\t' {
            current.push(b as char);
        } else {
            if current.trim().len() >= DOC_MIN_RUN && current.contains(' ') {
                runs.push(current.trim().to_string());
            }
            current.clear();
        }
    }
    if current.trim().len() >= DOC_MIN_RUN && current.contains(' ') {
        runs.push(current.trim().to_string());
    }
    runs.join("\n")
}

fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn suggest_topic(text: &str) -> Option<String> {
    let line = text.lines().find(|l| l.chars().any(char::is_alphabetic))?;
    let topic = line
        .split_whitespace()
        .take(TOPIC_MAX_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    let topic = topic.trim_end_matches(|c: char| !c.is_alphanumeric()).to_string();
    (!topic.is_empty()).then_some(topic)
}
