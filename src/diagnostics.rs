//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Fatal compile diagnostics for the lowering engine.
//!
//! Lowering knows exactly two error kinds: a **fatal diagnostic**, which
//! unwinds lowering of the current call cleanly as an `Err` value (never by
//! aborting the process), and the best-effort return-repaint fallback, which
//! is only logged (see [`crate::lower`]). There are no retries; lowering is
//! a pure function of its inputs.

use crate::ir::SourceLoc;
use thiserror::Error;

/// A fatal compile error produced during call lowering.
///
/// These are non-recoverable from the perspective of the enclosing
/// compilation: the caller is expected to stop lowering the current
/// function and report the message at `loc`. No partial IR should be
/// consumed after one of these is returned.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("{loc}: {message}")]
pub struct Diagnostic {
    /// Where in the original source the offending call expression is.
    pub loc: SourceLoc,
    /// Human-readable description of the failure.
    pub message: String,
}

impl Diagnostic {
    /// Creates a fatal diagnostic at a given source location.
    pub fn fatal(loc: SourceLoc, message: impl Into<String>) -> Self {
        Self {
            loc,
            message: message.into(),
        }
    }
}

/// The result type used throughout the lowering engine.
pub type LowerResult<T> = Result<T, Diagnostic>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_includes_location() {
        let d = Diagnostic::fatal(SourceLoc::new(3, 14), "va_start expects 1 (or 2) arguments");
        assert_eq!(format!("{d}"), "3:14: va_start expects 1 (or 2) arguments");
    }
}
