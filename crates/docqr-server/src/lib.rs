// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docqr-server: HTTP routes and server lifecycle for the docqr download server.

pub mod routes;
pub mod server;

pub use routes::{AppState, router};
pub use server::DocumentServer;
