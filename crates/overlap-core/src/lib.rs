//! Lexical overlap checking for PDF documents
//!
//! Extracts the text layer of a user PDF and a target PDF, normalizes both
//! (stopword removal and lemmatization), and reports the share of the user
//! vocabulary that also appears in the target. Shared words are then
//! highlighted in the user PDF with standard highlight annotations.
//!
//! - `extract`: text-layer extraction through lopdf or pdf-extract
//! - `normalize` / `score`: token filtering, lemmas and the overlap percentage
//! - `layout` / `highlight`: font-aware word positions and annotation writing
//! - `pipeline::check`: all of the above plus a donut chart, in one call

pub mod chart;
pub mod document;
pub mod error;
pub mod extract;
mod font;
pub mod highlight;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod score;

#[cfg(test)]
pub(crate) mod test_support;

pub use chart::DonutChart;
pub use document::{Document, TargetSource};
pub use error::OverlapError;
pub use extract::{extract, ExtractorKind, LopdfBackend, PdfExtractBackend, TextBackend};
pub use highlight::{highlight, highlight_with, HighlightStyle, HighlightedDocument, MatchMode};
pub use layout::{word_spans, Rect, WordSpan};
pub use normalize::{lemmatize_word, normalize, tokenize};
pub use pipeline::{check, check_against, resolve_target, CheckOptions, CheckReport};
pub use score::{score, score_sets, OverlapResult, TokenSet};
