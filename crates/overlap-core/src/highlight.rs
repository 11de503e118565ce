//! Highlight shared words in the original PDF

use std::str::FromStr;

use lopdf::{Dictionary, Document as PdfDocument, Object, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Document;
use crate::error::OverlapError;
use crate::extract::load_unencrypted;
use crate::font::{number, resolve};
use crate::layout::{page_word_spans, Rect, WordSpan};
use crate::normalize::lemmatize_word;
use crate::score::TokenSet;

/// How a drawn word is compared against the shared tokens.
///
/// Shared tokens are lemmas. `Literal` compares the case-folded surface word
/// as drawn, so inflected forms ("jumping" when only `jump` is shared) and
/// words with attached punctuation ("mat.") are not highlighted. `Lemma` runs
/// each drawn word through the normalizer first and matches on its lemma.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Literal,
    Lemma,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "literal" => Ok(MatchMode::Literal),
            "lemma" => Ok(MatchMode::Lemma),
            other => Err(format!(
                "Invalid match mode '{}'. Must be 'literal' or 'lemma'",
                other
            )),
        }
    }
}

impl MatchMode {
    pub fn matches(self, word: &str, shared: &TokenSet) -> bool {
        match self {
            MatchMode::Literal => shared.contains(&word.to_lowercase()),
            MatchMode::Lemma => lemmatize_word(word).is_some_and(|lemma| shared.contains(&lemma)),
        }
    }
}

/// Visual style of highlight annotations (RGB components in 0-1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HighlightStyle {
    pub stroke: [f32; 3],
    pub fill: [f32; 3],
    pub opacity: f32,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            stroke: [1.0, 0.0, 0.0],
            fill: [1.0, 0.8, 0.8],
            opacity: 0.4,
        }
    }
}

/// A copy of the source PDF with highlight annotations added
#[derive(Debug, Clone)]
pub struct HighlightedDocument {
    pub bytes: Vec<u8>,
    /// Annotations added by this run
    pub highlight_count: usize,
}

impl HighlightedDocument {
    pub const FILENAME: &'static str = "highlighted_plagiarism.pdf";
    pub const MIME_TYPE: &'static str = "application/pdf";
}

/// Highlight literal matches with the default style.
pub fn highlight(
    document: &Document,
    shared_tokens: &TokenSet,
) -> Result<HighlightedDocument, OverlapError> {
    highlight_with(
        document,
        shared_tokens,
        MatchMode::Literal,
        &HighlightStyle::default(),
    )
}

/// Add a highlight annotation over every word span matching `shared_tokens`.
///
/// A rectangle that already carries a highlight annotation is skipped, so
/// running this on its own output adds nothing. Any failure aborts the whole
/// run; no partially annotated output is returned.
pub fn highlight_with(
    document: &Document,
    shared_tokens: &TokenSet,
    mode: MatchMode,
    style: &HighlightStyle,
) -> Result<HighlightedDocument, OverlapError> {
    let mut doc = load_unencrypted(document)?;
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();

    let mut added = 0;
    for (index, (_, page_id)) in pages.iter().enumerate() {
        let spans: Vec<WordSpan> = page_word_spans(&doc, index, *page_id)?
            .into_iter()
            .filter(|span| mode.matches(&span.text, shared_tokens))
            .collect();
        if spans.is_empty() {
            continue;
        }

        let mut existing = existing_highlights(&doc, *page_id);
        for span in spans {
            if existing.iter().any(|r| r.approx_eq(&span.rect)) {
                continue;
            }
            add_highlight_annotation(&mut doc, *page_id, &span.rect, style)?;
            existing.push(span.rect);
            added += 1;
        }
    }

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| OverlapError::Highlight(e.to_string()))?;

    debug!(
        pages = pages.len(),
        highlights = added,
        bytes = output.len(),
        "Highlighted PDF"
    );

    Ok(HighlightedDocument {
        bytes: output,
        highlight_count: added,
    })
}

fn real_array(values: &[f32]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v)).collect())
}

fn add_highlight_annotation(
    doc: &mut PdfDocument,
    page_id: ObjectId,
    rect: &Rect,
    style: &HighlightStyle,
) -> Result<(), OverlapError> {
    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
    annot.set("Rect", real_array(&[rect.x0, rect.y0, rect.x1, rect.y1]));
    // Upper-left, upper-right, lower-left, lower-right
    annot.set(
        "QuadPoints",
        real_array(&[
            rect.x0, rect.y1, rect.x1, rect.y1, rect.x0, rect.y0, rect.x1, rect.y0,
        ]),
    );
    annot.set("C", real_array(&style.stroke));
    annot.set("IC", real_array(&style.fill));
    annot.set("CA", Object::Real(style.opacity));
    // Print flag
    annot.set("F", Object::Integer(4));
    annot.set("P", Object::Reference(page_id));

    let annot_id = doc.add_object(Object::Dictionary(annot));
    add_annotation_to_page(doc, page_id, annot_id)
}

fn add_annotation_to_page(
    doc: &mut PdfDocument,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> Result<(), OverlapError> {
    // Annots may live in a separate array object
    let annots_ref = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
        .and_then(|annots| match annots {
            Object::Reference(id) => Some(*id),
            _ => None,
        });

    if let Some(array_id) = annots_ref {
        return match doc.get_object_mut(array_id) {
            Ok(Object::Array(arr)) => {
                arr.push(Object::Reference(annot_id));
                Ok(())
            }
            _ => Err(OverlapError::Highlight(format!(
                "Annots of page {:?} references {:?}, which is not an array",
                page_id, array_id
            ))),
        };
    }

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| OverlapError::Highlight(e.to_string()))?;

    let Object::Dictionary(page_dict) = page else {
        return Err(OverlapError::Highlight(format!(
            "page object {:?} is not a dictionary",
            page_id
        )));
    };
    if let Ok(Object::Array(arr)) = page_dict.get_mut(b"Annots") {
        arr.push(Object::Reference(annot_id));
        return Ok(());
    }
    if !matches!(page_dict.get(b"Annots"), Ok(Object::Null) | Err(_)) {
        return Err(OverlapError::Highlight(format!(
            "Annots of page {:?} is not an array",
            page_id
        )));
    }
    page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
    Ok(())
}

/// Rectangles of the page's existing highlight annotations
fn existing_highlights(doc: &PdfDocument, page_id: ObjectId) -> Vec<Rect> {
    let Some(annots) = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
        .and_then(|annots| resolve(doc, annots).as_array().ok())
    else {
        return Vec::new();
    };

    annots
        .iter()
        .filter_map(|annot| resolve(doc, annot).as_dict().ok())
        .filter(|annot| {
            matches!(annot.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype == b"Highlight")
        })
        .filter_map(|annot| {
            let rect = resolve(doc, annot.get(b"Rect").ok()?).as_array().ok()?;
            let values: Vec<f32> = rect.iter().filter_map(number).collect();
            match values.as_slice() {
                [x0, y0, x1, y1] => Some(Rect {
                    x0: *x0,
                    y0: *y0,
                    x1: *x1,
                    y1: *y1,
                }),
                _ => None,
            }
        })
        .collect()
}
