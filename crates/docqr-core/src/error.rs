// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docqr.

use thiserror::Error;

/// Top-level error type for all docqr operations.
#[derive(Debug, Error)]
pub enum DocqrError {
    // -- QR / image errors --
    #[error("QR encoding failed: {0}")]
    QrEncode(String),

    #[error("image processing failed: {0}")]
    Image(String),

    // -- Catalog / configuration --
    #[error("invalid document catalog: {0}")]
    Catalog(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    // -- Server --
    #[error("HTTP server error: {0}")]
    Server(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocqrError>;
