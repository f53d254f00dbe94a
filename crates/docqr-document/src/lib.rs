// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docqr-document: Image work for the docqr download server.
//
// Provides an image processing pipeline (resize, sharpness and brightness
// enhancement, circular masking) and the QR composer that renders a document's
// download URL as a PNG with an optional centred logo.

pub mod image;
pub mod qr;

// Re-export the primary structs so callers can use `docqr_document::QrComposer` etc.
pub use crate::image::processor::ImageProcessor;
pub use qr::composer::{QrComposer, QrMatrix};
pub use qr::startup::{ensure_qr_codes, load_logo};
