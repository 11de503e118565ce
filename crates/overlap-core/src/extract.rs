//! Text extraction backends
//!
//! Both backends return the document's text layer with pages concatenated in
//! page order. A PDF without a text layer (scanned images) produces an empty
//! string rather than an error; corrupt or encrypted files fail with
//! [`OverlapError::Extraction`].

use std::str::FromStr;

use lopdf::Document as PdfDocument;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Document;
use crate::error::OverlapError;
use crate::layout::page_word_spans;

/// A text-layer extractor.
pub trait TextBackend {
    fn name(&self) -> &'static str;

    fn extract(&self, document: &Document) -> Result<String, OverlapError>;
}

/// Which backend to use for extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractorKind {
    #[default]
    Lopdf,
    PdfExtract,
}

impl ExtractorKind {
    pub fn backend(self) -> Box<dyn TextBackend + Send + Sync> {
        match self {
            ExtractorKind::Lopdf => Box::new(LopdfBackend),
            ExtractorKind::PdfExtract => Box::new(PdfExtractBackend),
        }
    }
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lopdf" => Ok(ExtractorKind::Lopdf),
            "pdf-extract" | "pdf_extract" => Ok(ExtractorKind::PdfExtract),
            other => Err(format!(
                "Invalid extractor '{}'. Must be 'lopdf' or 'pdf-extract'",
                other
            )),
        }
    }
}

/// Extract with the default backend
pub fn extract(document: &Document) -> Result<String, OverlapError> {
    LopdfBackend.extract(document)
}

/// Parse bytes with lopdf and reject encrypted files.
pub(crate) fn load_unencrypted(document: &Document) -> Result<PdfDocument, OverlapError> {
    let doc = PdfDocument::load_mem(document.pdf_bytes())
        .map_err(|e| OverlapError::Extraction(e.to_string()))?;

    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(OverlapError::Extraction(
            "PDF is encrypted".to_string(),
        ));
    }

    Ok(doc)
}

/// Per-page extraction through lopdf.
///
/// Strings are decoded per font the same way [`crate::layout`] decodes them,
/// so every extracted word has a span to highlight. A page's words are
/// joined with spaces and end with a newline; pages follow each other with
/// no separator.
pub struct LopdfBackend;

impl TextBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, document: &Document) -> Result<String, OverlapError> {
        let doc = load_unencrypted(document)?;
        let pages = doc.get_pages();

        let mut text = String::new();
        for (index, (_, page_id)) in pages.iter().enumerate() {
            let words = page_word_spans(&doc, index, *page_id)?;
            if words.is_empty() {
                continue;
            }
            let page_text: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
            text.push_str(&page_text.join(" "));
            text.push('\n');
        }

        debug!(
            backend = self.name(),
            pages = pages.len(),
            chars = text.len(),
            "Extracted text layer"
        );
        Ok(text)
    }
}

/// Whole-document extraction through `pdf-extract`.
///
/// Better glyph decoding than the lopdf backend, at the cost of page breaks
/// showing up as form feeds, which are stripped here.
pub struct PdfExtractBackend;

impl TextBackend for PdfExtractBackend {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, document: &Document) -> Result<String, OverlapError> {
        // lopdf gives a cleaner error for garbage and catches encryption up front
        load_unencrypted(document)?;

        let text = pdf_extract::extract_text_from_mem(document.pdf_bytes())
            .map_err(|e| OverlapError::Extraction(e.to_string()))?;
        let text = text.replace('\u{c}', "");

        debug!(backend = self.name(), chars = text.len(), "Extracted text layer");
        Ok(text)
    }
}
