//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use static_assertions::assert_eq_size;
use std::fmt;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Where an instruction (or a diagnostic) came from in the original source.
///
/// Every instruction emitted by the lowering engine carries one of these,
/// copied from the call expression being lowered, so multiple GIR
/// instructions frequently share the same location.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Default)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct SourceLoc {
    line: u32,
    col: u32,
}

impl SourceLoc {
    /// Creates a location from a 1-based line and column.
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Returns the line in the original file.
    pub fn line(self) -> u32 {
        self.line
    }

    /// Returns the column in the original file.
    pub fn col(self) -> u32 {
        self.col
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

assert_eq_size!(SourceLoc, u64);
