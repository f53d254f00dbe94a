// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR module: symbol encoding, rasterization, logo compositing, and the
// startup pass that caches one PNG per document.

pub mod composer;
pub mod startup;

pub use composer::{QrComposer, QrMatrix};
