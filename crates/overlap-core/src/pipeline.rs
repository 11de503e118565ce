//! End-to-end check: extract, normalize, score, chart, highlight

use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::chart::DonutChart;
use crate::document::{Document, TargetSource};
use crate::error::OverlapError;
use crate::extract::ExtractorKind;
use crate::highlight::{highlight_with, HighlightStyle, HighlightedDocument, MatchMode};
use crate::normalize::normalize;
use crate::score::{score, OverlapResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckOptions {
    pub extractor: ExtractorKind,
    pub match_mode: MatchMode,
    pub style: HighlightStyle,
}

#[derive(Debug, Clone)]
pub struct CheckReport {
    pub result: OverlapResult,
    pub chart_svg: String,
    pub highlighted: HighlightedDocument,
}

/// Load the comparison target.
///
/// Fails with [`OverlapError::MissingTargetFile`] when the default path does
/// not exist; callers must stop there and produce neither chart nor PDF.
pub fn resolve_target(source: TargetSource) -> Result<Document, OverlapError> {
    source.resolve()
}

/// Compare `user` against `target` and highlight the shared vocabulary in
/// the user document.
pub fn check(
    user: &Document,
    target: &Document,
    options: &CheckOptions,
) -> Result<CheckReport, OverlapError> {
    let _span = info_span!(
        "check",
        user_bytes = user.len(),
        target_bytes = target.len(),
        extractor = ?options.extractor,
        match_mode = ?options.match_mode,
    )
    .entered();

    let backend = options.extractor.backend();
    let user_text = backend.extract(user)?;
    let target_text = backend.extract(target)?;
    info!(
        backend = backend.name(),
        user_chars = user_text.len(),
        target_chars = target_text.len(),
        "Extracted text"
    );

    let user_norm = normalize(&user_text);
    let target_norm = normalize(&target_text);

    let result = score(&user_norm, &target_norm);
    info!(
        percentage = result.percentage,
        shared = result.shared_tokens.len(),
        user_vocabulary = result.user_vocabulary,
        target_vocabulary = result.target_vocabulary,
        "Scored overlap"
    );

    let chart_svg = DonutChart::from_result(&result).to_svg();

    // Always annotate the original upload, never a previous output
    let highlighted = highlight_with(
        user,
        &result.shared_tokens,
        options.match_mode,
        &options.style,
    )?;
    info!(
        highlights = highlighted.highlight_count,
        "Highlighted user document"
    );

    Ok(CheckReport {
        result,
        chart_svg,
        highlighted,
    })
}

/// Resolve the target, then run [`check`].
pub fn check_against(
    user: &Document,
    target: TargetSource,
    options: &CheckOptions,
) -> Result<CheckReport, OverlapError> {
    let target = resolve_target(target)?;
    check(user, &target, options)
}
