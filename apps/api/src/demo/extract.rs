//! Plain-text extraction from uploaded CV documents.
//!
//! Parsing is CPU-bound and, for PDFs, may panic on malformed input, so it
//! always runs inside `tokio::task::spawn_blocking`.

use std::borrow::Cow;
use std::io::{Cursor, Read};
use std::sync::OnceLock;

use bytes::Bytes;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const DOCX_BODY: &str = "word/document.xml";

/// Inflated XML read per character of wanted text. Markup dominates DOCX
/// bodies, so this leaves room for the text cap while bounding decompression.
const XML_BYTES_PER_TEXT_CHAR: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detects the format from the declared MIME type, falling back to the
    /// file extension when the MIME type is missing or not recognised.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());
        match mime.as_deref() {
            Some(PDF_MIME) => return Some(DocumentFormat::Pdf),
            Some(DOCX_MIME) => return Some(DocumentFormat::Docx),
            _ => {}
        }

        let extension = file_name?.rsplit_once('.')?.1.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not read document: {0}")]
    Corrupt(String),

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Extracts the document text. `max_chars` is the text budget; DOCX bodies
/// are inflated only as far as that budget can use.
pub async fn extract_text(
    bytes: Bytes,
    format: DocumentFormat,
    max_chars: usize,
) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || match format {
        DocumentFormat::Pdf => extract_pdf(&bytes),
        DocumentFormat::Docx => {
            extract_docx(&bytes, max_chars.saturating_mul(XML_BYTES_PER_TEXT_CHAR))
        }
    })
    .await
    .map_err(|e| ExtractError::Task(e.to_string()))?
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Corrupt(e.to_string()))
}

fn extract_docx(bytes: &[u8], max_xml_bytes: usize) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Corrupt(e.to_string()))?;
    let entry = archive
        .by_name(DOCX_BODY)
        .map_err(|e| ExtractError::Corrupt(format!("{DOCX_BODY}: {e}")))?;

    let mut xml = Vec::new();
    entry
        .take(max_xml_bytes as u64)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::Corrupt(e.to_string()))?;
    if xml.len() == max_xml_bytes {
        debug!(max_xml_bytes, "DOCX body truncated at inflate limit");
    }
    Ok(docx_xml_to_text(&String::from_utf8_lossy(&xml)))
}

fn docx_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab\s*/>|<w:br\s*/>|</w:p>")
            .expect("valid regex")
    })
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("valid regex")
    })
}

/// Text runs in document order; paragraphs and breaks become newlines.
fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len() / 4);
    for caps in docx_token_re().captures_iter(xml) {
        match caps.get(1) {
            Some(run) => out.push_str(&decode_entities(run.as_str())),
            None if caps[0].starts_with("<w:tab") => out.push('\t'),
            None => out.push('\n'),
        }
    }
    out.trim().to_string()
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    entity_re().replace_all(text, |caps: &Captures| {
        let entity = &caps[1];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .map(|hex| u32::from_str_radix(hex, 16))
                .unwrap_or_else(|| entity[1..].parse())
                .ok()
                .and_then(char::from_u32),
        };
        decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
    })
}
