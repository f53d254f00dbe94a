// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP routes.
//
//   GET /                 index page linking every document and its QR code
//   GET /download/{name}  the PDF as an attachment
//   GET /qr/{name}        the cached QR image
//   GET /favicon.ico      favicon, or 204 when none is installed
//
// Unknown names answer 400, known names whose file is missing answer 404.
// File bodies are streamed by `tower_http::services::ServeFile`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{self, Request, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use docqr_core::types::DocumentCatalog;
use docqr_core::AppConfig;

/// Read-only state shared by all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub files_dir: PathBuf,
    pub documents: DocumentCatalog,
    pub favicon_path: PathBuf,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            files_dir: config.files_dir.clone(),
            documents: config.documents.clone(),
            favicon_path: config.favicon_path(),
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/download/{name}", get(download))
        .route("/qr/{name}", get(qr_image))
        .route("/favicon.ico", get(favicon))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut html = String::from("<h2>Available Downloads &amp; QR Codes</h2><ul>");
    for record in state.documents.iter() {
        let route = escape_html(&record.route);
        html.push_str(&format!(
            "\n<li>\n  <b>{key}</b><br>\n  <a href='/download/{route}'>Download PDF</a> |\n  <a href='/qr/{route}'>View QR</a>\n</li>",
            key = escape_html(&record.key),
        ));
    }
    html.push_str("\n</ul>");
    Html(html)
}

async fn download(
    State(state): State<Arc<AppState>>,
    extract::Path(name): extract::Path<String>,
    request: Request,
) -> Response {
    let Some(record) = state.documents.find_by_route(&name) else {
        debug!(name = %name, "unknown document requested");
        return (StatusCode::BAD_REQUEST, "Invalid PDF name").into_response();
    };

    let path = record.source_path(&state.files_dir);
    if !is_file(&path).await {
        warn!(key = %record.key, path = %path.display(), "document file missing");
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    }

    let mut response = serve_file(&path, request).await;
    if response.status().is_success() {
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
        headers.insert(CONTENT_DISPOSITION, attachment_header(&record.file_name));
    }
    response
}

async fn qr_image(
    State(state): State<Arc<AppState>>,
    extract::Path(name): extract::Path<String>,
    request: Request,
) -> Response {
    let Some(record) = state.documents.find_by_route(&name) else {
        debug!(name = %name, "unknown QR requested");
        return (StatusCode::BAD_REQUEST, "Invalid QR name").into_response();
    };

    let path = record.qr_path(&state.files_dir);
    if !is_file(&path).await {
        warn!(key = %record.key, path = %path.display(), "QR image missing");
        return (StatusCode::NOT_FOUND, "QR code not found").into_response();
    }

    let mut response = serve_file(&path, request).await;
    if response.status().is_success() {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
    }
    response
}

async fn favicon(State(state): State<Arc<AppState>>, request: Request) -> Response {
    if !is_file(&state.favicon_path).await {
        return StatusCode::NO_CONTENT.into_response();
    }
    serve_file(&state.favicon_path, request).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

async fn serve_file(path: &Path, request: Request) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

/// `attachment; filename="..."`, falling back to a bare `attachment` when the
/// name cannot be carried in a header.
fn attachment_header(file_name: &str) -> HeaderValue {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
