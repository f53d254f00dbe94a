// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Startup steps run before the HTTP server accepts connections.

use docqr_core::error::Result;
use docqr_core::types::GenerationOutcome;
use docqr_core::AppConfig;
use docqr_document::ensure_qr_codes;
use tracing::{error, info};

/// Create the files directory if it does not exist yet.
pub fn prepare_files_dir(config: &AppConfig) -> Result<()> {
    std::fs::create_dir_all(&config.files_dir)?;
    info!(path = %config.files_dir.display(), "files directory ready");
    Ok(())
}

/// Run the QR pass on a blocking thread and log a summary.
///
/// Never fails: per-document errors are already logged by the pass, and a
/// panicking pass is logged here so the server still starts.
pub async fn generate_qr_codes(config: &AppConfig) -> Vec<(String, GenerationOutcome)> {
    let config = config.clone();
    let outcomes = match tokio::task::spawn_blocking(move || ensure_qr_codes(&config)).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!(error = %e, "QR generation task aborted");
            return Vec::new();
        }
    };

    let generated = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, GenerationOutcome::Generated { .. }))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|(_, o)| *o == GenerationOutcome::Skipped)
        .count();
    let failed = outcomes.len() - generated - skipped;
    info!(generated, skipped, failed, "QR pass complete");
    outcomes
}
