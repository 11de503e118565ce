//! Word-level text layout
//!
//! Walks each page's content stream with a simplified text-rendering state
//! machine and reports every word together with its bounding box in default
//! user space. Strings are decoded per font (see [`crate::font`]). Glyph
//! widths come from the font's `/Widths` or `/W` array when present and are
//! approximated otherwise, so boxes are close but not exact for the standard
//! 14 fonts.
//!
//! | Operator | Action |
//! |----------|--------|
//! | `q` `Q` `cm` | Save / restore / concatenate the graphics state CTM |
//! | `BT`     | Begin text object, reset matrices |
//! | `Tf`     | Set font and size |
//! | `Tm`     | Set text matrix |
//! | `Td` `TD` `T*` | Move to the next line |
//! | `TL` `Tc` `Tw` `Tz` `Ts` | Text state parameters |
//! | `Tj` `TJ` `'` `"` | Show text |
//!
//! Form XObjects are not entered.

use std::collections::HashMap;

use lopdf::content::Content;
use lopdf::{Document as PdfDocument, Object, ObjectId};
use serde::Serialize;

use crate::document::Document;
use crate::error::OverlapError;
use crate::extract::load_unencrypted;
use crate::font::{number, page_fonts, FontDecoder, FALLBACK_FONT};

/// Portion of the em box below the baseline
const DESCENT: f32 = 0.2;

/// Portion of the em box above the baseline
const ASCENT: f32 = 0.8;

/// Largest gap between glyphs, as a share of the font size, that still
/// continues the same word
const WORD_GAP_RATIO: f32 = 0.15;

type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// `a × b` in PDF row-vector convention
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn transform(m: &Matrix, x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn translation(tx: f32, ty: f32) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Axis-aligned rectangle in PDF user space (origin bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    fn from_points(points: &[(f32, f32)]) -> Self {
        let mut rect = Rect {
            x0: f32::INFINITY,
            y0: f32::INFINITY,
            x1: f32::NEG_INFINITY,
            y1: f32::NEG_INFINITY,
        };
        for &(x, y) in points {
            rect.x0 = rect.x0.min(x);
            rect.y0 = rect.y0.min(y);
            rect.x1 = rect.x1.max(x);
            rect.y1 = rect.y1.max(y);
        }
        rect
    }

    fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Equal within a hundredth of a point, which survives a save/load cycle
    pub fn approx_eq(&self, other: &Rect) -> bool {
        const EPS: f32 = 0.01;
        (self.x0 - other.x0).abs() < EPS
            && (self.y0 - other.y0).abs() < EPS
            && (self.x1 - other.x1).abs() < EPS
            && (self.y1 - other.y1).abs() < EPS
    }
}

/// A single word on a page, in reading order of the content stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordSpan {
    /// Zero-based page index
    pub page: usize,
    pub rect: Rect,
    /// Literal text as drawn, punctuation included
    pub text: String,
}

/// Word spans of every page, pages in document order.
pub fn word_spans(document: &Document) -> Result<Vec<WordSpan>, OverlapError> {
    let doc = load_unencrypted(document)?;
    let mut spans = Vec::new();
    for (index, (_, page_id)) in doc.get_pages().into_iter().enumerate() {
        spans.extend(page_word_spans(&doc, index, page_id)?);
    }
    Ok(spans)
}

/// Word spans of a single page.
pub(crate) fn page_word_spans(
    doc: &PdfDocument,
    page_index: usize,
    page_id: ObjectId,
) -> Result<Vec<WordSpan>, OverlapError> {
    let raw = doc
        .get_page_content(page_id)
        .map_err(|e| OverlapError::Extraction(format!("page {}: {}", page_index + 1, e)))?;
    let content = Content::decode(&raw)
        .map_err(|e| OverlapError::Extraction(format!("page {}: {}", page_index + 1, e)))?;
    let fonts = page_fonts(doc, page_id);

    let mut walker = PageWalker::new(page_index, &fonts);
    for op in &content.operations {
        walker.apply(&op.operator, &op.operands);
    }
    Ok(walker.finish())
}

// ---------------------------------------------------------------------------
// Content stream walker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font_key: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horiz_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            font_key: Vec::new(),
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horiz_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

/// Word being assembled from consecutive glyphs
struct PendingWord {
    text: String,
    rect: Rect,
    /// User-space pen position after the last glyph
    end: (f32, f32),
    size: f32,
}

struct PageWalker<'a> {
    page: usize,
    fonts: &'a HashMap<Vec<u8>, FontDecoder>,
    gs: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    pending: Option<PendingWord>,
    words: Vec<WordSpan>,
}

impl<'a> PageWalker<'a> {
    fn new(page: usize, fonts: &'a HashMap<Vec<u8>, FontDecoder>) -> Self {
        Self {
            page,
            fonts,
            gs: GraphicsState::default(),
            stack: Vec::new(),
            tm: IDENTITY,
            tlm: IDENTITY,
            pending: None,
            words: Vec::new(),
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        let num = |i: usize| operands.get(i).and_then(number);

        match operator {
            "q" => self.stack.push(self.gs.clone()),
            "Q" => {
                if let Some(gs) = self.stack.pop() {
                    self.gs = gs;
                }
            }
            "cm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.gs.ctm = multiply(&m, &self.gs.ctm);
                }
            }
            "BT" => {
                self.tm = IDENTITY;
                self.tlm = IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(key)) = operands.first() {
                    self.gs.font_key = key.clone();
                }
                if let Some(size) = num(1) {
                    self.gs.font_size = size;
                }
            }
            "Tm" => {
                if let Some(m) = matrix_operands(operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.next_line(tx, ty);
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                    self.gs.leading = -ty;
                    self.next_line(tx, ty);
                }
            }
            "T*" => self.next_line(0.0, -self.gs.leading),
            "TL" => {
                if let Some(v) = num(0) {
                    self.gs.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = num(0) {
                    self.gs.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = num(0) {
                    self.gs.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = num(0) {
                    self.gs.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = num(0) {
                    self.gs.rise = v;
                }
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if let Some(adj) = number(other) {
                                    let tx = -adj / 1000.0 * self.gs.font_size * self.gs.horiz_scale;
                                    self.tm = multiply(&translation(tx, 0.0), &self.tm);
                                }
                            }
                        }
                    }
                }
            }
            "'" => {
                self.next_line(0.0, -self.gs.leading);
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (num(0), num(1)) {
                    self.gs.word_spacing = aw;
                    self.gs.char_spacing = ac;
                }
                self.next_line(0.0, -self.gs.leading);
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    self.show(bytes);
                }
            }
            _ => {}
        }
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.tlm = multiply(&translation(tx, ty), &self.tlm);
        self.tm = self.tlm;
    }

    fn show(&mut self, bytes: &[u8]) {
        let fonts = self.fonts;
        let font = fonts.get(&self.gs.font_key).unwrap_or(&FALLBACK_FONT);

        for glyph in font.decode(bytes) {
            let glyph_width = glyph.width / 1000.0 * self.gs.font_size;
            let mut advance = glyph_width + self.gs.char_spacing;
            if glyph.is_space {
                advance += self.gs.word_spacing;
            }
            advance *= self.gs.horiz_scale;

            if glyph.text.chars().any(char::is_whitespace) {
                self.flush();
            } else if !glyph.text.is_empty() {
                self.push_glyph(&glyph.text, glyph_width * self.gs.horiz_scale);
            }

            self.tm = multiply(&translation(advance, 0.0), &self.tm);
        }
    }

    fn push_glyph(&mut self, text: &str, width: f32) {
        let trm = multiply(&self.tm, &self.gs.ctm);
        let size = self.gs.font_size * (trm[1].powi(2) + trm[3].powi(2)).sqrt();

        let low = self.gs.rise - DESCENT * self.gs.font_size;
        let high = self.gs.rise + ASCENT * self.gs.font_size;
        let rect = Rect::from_points(&[
            transform(&trm, 0.0, low),
            transform(&trm, width, low),
            transform(&trm, 0.0, high),
            transform(&trm, width, high),
        ]);
        let start = transform(&trm, 0.0, 0.0);
        let end = transform(&trm, width, 0.0);

        if let Some(word) = &self.pending {
            let gap = start.0 - word.end.0;
            let same_line = (start.1 - word.end.1).abs() < 0.5 * word.size.max(size);
            let tolerance = WORD_GAP_RATIO * word.size.max(size);
            if !same_line || gap > tolerance || gap < -tolerance {
                self.flush();
            }
        }

        match &mut self.pending {
            Some(word) => {
                word.text.push_str(text);
                word.rect = word.rect.union(&rect);
                word.end = end;
            }
            None => {
                self.pending = Some(PendingWord {
                    text: text.to_string(),
                    rect,
                    end,
                    size,
                });
            }
        }
    }

    fn flush(&mut self) {
        if let Some(word) = self.pending.take() {
            self.words.push(WordSpan {
                page: self.page,
                rect: word.rect,
                text: word.text,
            });
        }
    }

    fn finish(mut self) -> Vec<WordSpan> {
        self.flush();
        self.words
    }
}

fn matrix_operands(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut m = IDENTITY;
    for (slot, operand) in m.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::DEFAULT_GLYPH_WIDTH;
    use crate::test_support::{
        image_only_pdf, pdf_with_cid_font, pdf_with_pages, pdf_with_split_runs, FIRST_BASELINE,
        FONT_SIZE, LEFT_MARGIN, LINE_HEIGHT,
    };
    use pretty_assertions::assert_eq;

    fn texts(spans: &[WordSpan]) -> Vec<&str> {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_words_in_reading_order() {
        let doc = Document::from_bytes(pdf_with_pages(&[&["The cat sat on the mat."]]));
        let spans = word_spans(&doc).unwrap();
        assert_eq!(texts(&spans), vec!["The", "cat", "sat", "on", "the", "mat."]);
        assert!(spans.iter().all(|s| s.page == 0));
    }

    #[test]
    fn test_first_word_box_sits_on_baseline() {
        let doc = Document::from_bytes(pdf_with_pages(&[&["cat mat"]]));
        let spans = word_spans(&doc).unwrap();
        let cat = &spans[0].rect;
        let size = FONT_SIZE as f32;

        assert!((cat.x0 - LEFT_MARGIN as f32).abs() < 0.01);
        assert!((cat.y0 - (FIRST_BASELINE as f32 - DESCENT * size)).abs() < 0.01);
        assert!((cat.y1 - (FIRST_BASELINE as f32 + ASCENT * size)).abs() < 0.01);
        // three glyphs at the fallback width
        assert!((cat.width() - 3.0 * DEFAULT_GLYPH_WIDTH / 1000.0 * size).abs() < 0.01);
    }

    #[test]
    fn test_words_advance_left_to_right() {
        let doc = Document::from_bytes(pdf_with_pages(&[&["cat mat hat"]]));
        let spans = word_spans(&doc).unwrap();
        assert_eq!(spans.len(), 3);
        assert!(spans[0].rect.x1 < spans[1].rect.x0);
        assert!(spans[1].rect.x1 < spans[2].rect.x0);
    }

    #[test]
    fn test_lines_stack_downwards() {
        let doc = Document::from_bytes(pdf_with_pages(&[&["upper", "lower"]]));
        let spans = word_spans(&doc).unwrap();
        assert_eq!(texts(&spans), vec!["upper", "lower"]);
        let drop = spans[0].rect.y0 - spans[1].rect.y0;
        assert!((drop - LINE_HEIGHT as f32).abs() < 0.01);
    }

    #[test]
    fn test_page_indices() {
        let doc = Document::from_bytes(pdf_with_pages(&[&["alpha"], &["beta"]]));
        let spans = word_spans(&doc).unwrap();
        assert_eq!(spans[0].page, 0);
        assert_eq!(spans[1].page, 1);
    }

    #[test]
    fn test_adjacent_runs_join_and_kerning_gaps_split() {
        let doc = Document::from_bytes(pdf_with_split_runs());
        let spans = word_spans(&doc).unwrap();
        assert_eq!(texts(&spans), vec!["cat", "sat", "down"]);
    }

    #[test]
    fn test_composite_font_words_match_simple_font_words() {
        let lines: &[&str] = &["The cat sat", "on the mat."];
        let simple = word_spans(&Document::from_bytes(pdf_with_pages(&[lines]))).unwrap();
        let composite = word_spans(&Document::from_bytes(pdf_with_cid_font(&[lines]))).unwrap();

        assert_eq!(texts(&composite), vec!["The", "cat", "sat", "on", "the", "mat."]);
        // both fixtures draw every glyph 500 units wide
        for (a, b) in simple.iter().zip(&composite) {
            assert!(a.rect.approx_eq(&b.rect), "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_no_text_layer_yields_no_words() {
        let doc = Document::from_bytes(image_only_pdf());
        assert!(word_spans(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_cm_scales_boxes() {
        let mut walker_fonts = HashMap::new();
        walker_fonts.insert(b"F1".to_vec(), FALLBACK_FONT.clone());
        let mut walker = PageWalker::new(0, &walker_fonts);
        walker.apply(
            "cm",
            &[2.into(), 0.into(), 0.into(), 2.into(), 0.into(), 0.into()],
        );
        walker.apply("BT", &[]);
        walker.apply("Tf", &["F1".into(), 10.into()]);
        walker.apply("Td", &[10.into(), 10.into()]);
        walker.apply("Tj", &[Object::string_literal("ab")]);
        let spans = walker.finish();

        assert_eq!(spans.len(), 1);
        assert!((spans[0].rect.x0 - 20.0).abs() < 0.01);
        assert!((spans[0].rect.width() - 20.0).abs() < 0.01);
        assert!((spans[0].rect.height() - 20.0).abs() < 0.01);
    }

    #[test]
    fn test_rect_approx_eq() {
        let a = Rect { x0: 1.0, y0: 2.0, x1: 3.0, y1: 4.0 };
        let b = Rect { x0: 1.001, y0: 2.0, x1: 3.0, y1: 4.004 };
        assert!(a.approx_eq(&b));
        assert!(!a.approx_eq(&Rect { x0: 1.5, ..b }));
    }
}
