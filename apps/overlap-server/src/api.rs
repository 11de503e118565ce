//! API handlers for the overlap server
//!
//! Provides endpoints for:
//! - The upload page
//! - Overlap checks returning JSON (score, chart, highlighted PDF)
//! - Highlighted PDF download

use std::path::Path;

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use overlap_core::{
    check_against, CheckOptions, CheckReport, Document, HighlightedDocument, MatchMode,
    TargetSource,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServerError;
use crate::AppState;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "overlap-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: GET /
pub async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Check response
#[derive(Serialize)]
pub struct CheckResponse {
    pub success: bool,
    pub percentage: f64,
    /// One decimal place, e.g. "42.5%"
    pub percentage_label: String,
    pub shared_tokens: Vec<String>,
    pub shared_count: usize,
    pub user_vocabulary: usize,
    pub target_vocabulary: usize,
    pub chart_svg: String,
    pub highlight_count: usize,
    pub filename: &'static str,
    pub mime_type: &'static str,
    /// Base64-encoded highlighted user PDF
    pub highlighted_pdf: String,
}

impl From<CheckReport> for CheckResponse {
    fn from(report: CheckReport) -> Self {
        let result = report.result;
        Self {
            success: true,
            percentage: result.percentage,
            percentage_label: result.label(),
            shared_count: result.shared_tokens.len(),
            shared_tokens: result.shared_tokens.iter().map(str::to_string).collect(),
            user_vocabulary: result.user_vocabulary,
            target_vocabulary: result.target_vocabulary,
            chart_svg: report.chart_svg,
            highlight_count: report.highlighted.highlight_count,
            filename: HighlightedDocument::FILENAME,
            mime_type: HighlightedDocument::MIME_TYPE,
            highlighted_pdf: STANDARD.encode(&report.highlighted.bytes),
        }
    }
}

/// Handler: POST /api/check
pub async fn handle_check(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CheckResponse>, ServerError> {
    let upload = read_upload(&state, multipart).await?;
    let report = run_check(&state, upload).await?;
    Ok(Json(report.into()))
}

/// Handler: POST /api/highlight
pub async fn handle_highlight(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ServerError> {
    let upload = read_upload(&state, multipart).await?;
    let report = run_check(&state, upload).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        HighlightedDocument::FILENAME
    );
    Ok((
        [
            (header::CONTENT_TYPE, HighlightedDocument::MIME_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.highlighted.bytes,
    )
        .into_response())
}

/// A parsed check request
pub struct CheckUpload {
    pub user: Document,
    pub target: TargetSource,
    pub match_mode: MatchMode,
}

async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<CheckUpload, ServerError> {
    let mut user = None;
    let mut uploaded_target = None;
    let mut target_option = None;
    let mut match_mode = state.options.match_mode;

    let limit = state.max_upload_bytes;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, limit, "Malformed upload"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "user" => user = read_pdf(field, "user", limit).await?,
            "target" => uploaded_target = read_pdf(field, "target", limit).await?,
            "target_option" => target_option = Some(read_text(field, limit).await?),
            "match_mode" => {
                match_mode = read_text(field, limit)
                    .await?
                    .parse()
                    .map_err(ServerError::InvalidRequest)?
            }
            other => debug!("Ignoring multipart field '{}'", other),
        }
    }

    let user = user.ok_or_else(|| {
        ServerError::InvalidRequest("Please upload your PDF in the 'user' field".to_string())
    })?;
    let target = select_target(
        target_option.as_deref(),
        uploaded_target,
        &state.default_target,
    )?;

    Ok(CheckUpload {
        user,
        target,
        match_mode,
    })
}

/// Map a multipart read failure, naming the limit when the body was too big.
fn upload_error(e: MultipartError, limit: usize, context: &str) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::InvalidRequest(format!(
            "Upload exceeds the {} limit",
            format_size(limit)
        ))
    } else {
        ServerError::InvalidRequest(format!("{}: {}", context, e.body_text()))
    }
}

/// Human-readable byte count: whole MiB or KiB when exact
pub fn format_size(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = 1024 * KIB;
    match bytes {
        0 => "0 bytes".to_string(),
        b if b % MIB == 0 => format!("{} MiB", b / MIB),
        b if b % KIB == 0 => format!("{} KiB", b / KIB),
        b => format!("{} bytes", b),
    }
}

/// Read a file field. An empty part (no file chosen) counts as absent.
async fn read_pdf(
    field: Field<'_>,
    name: &str,
    limit: usize,
) -> Result<Option<Document>, ServerError> {
    let bytes = field
        .bytes()
        .await
        .map_err(|e| upload_error(e, limit, &format!("Failed to read '{}'", name)))?;
    if bytes.is_empty() {
        return Ok(None);
    }

    let document = Document::from_bytes(bytes.to_vec());
    if !document.looks_like_pdf() {
        return Err(ServerError::InvalidRequest(format!(
            "'{}' is not a PDF file",
            name
        )));
    }
    debug!(field = name, bytes = document.len(), "Received PDF");
    Ok(Some(document))
}

async fn read_text(field: Field<'_>, limit: usize) -> Result<String, ServerError> {
    field
        .text()
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| upload_error(e, limit, "Malformed upload"))
}

/// Pick the comparison target.
///
/// `default` always uses the configured path; `upload` requires a target
/// file. Without an option an uploaded target wins over the default.
pub fn select_target(
    option: Option<&str>,
    uploaded: Option<Document>,
    default_target: &Path,
) -> Result<TargetSource, ServerError> {
    let option = option
        .map(str::to_lowercase)
        .filter(|o| !o.is_empty());
    match (option.as_deref(), uploaded) {
        (Some("default"), _) | (None, None) => {
            Ok(TargetSource::DefaultPath(default_target.to_path_buf()))
        }
        (Some("upload"), Some(doc)) | (None, Some(doc)) => Ok(TargetSource::Uploaded(doc)),
        (Some("upload"), None) => Err(ServerError::InvalidRequest(
            "Please upload a target PDF in the 'target' field".to_string(),
        )),
        (Some(other), _) => Err(ServerError::InvalidRequest(format!(
            "Invalid target_option '{}'. Must be 'upload' or 'default'",
            other
        ))),
    }
}

async fn run_check(state: &AppState, upload: CheckUpload) -> Result<CheckReport, ServerError> {
    let options = CheckOptions {
        match_mode: upload.match_mode,
        ..state.options
    };
    let source = match &upload.target {
        TargetSource::Uploaded(_) => "upload",
        TargetSource::DefaultPath(_) => "default",
    };
    info!(
        user_bytes = upload.user.len(),
        target = source,
        match_mode = ?options.match_mode,
        "Check request"
    );

    let report = tokio::task::spawn_blocking(move || {
        check_against(&upload.user, upload.target, &options)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Check task panicked: {}", e)))??;

    info!(
        percentage = %report.result.label(),
        highlights = report.highlighted.highlight_count,
        "Check complete"
    );
    Ok(report)
}
