//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The front-end-facing data model.
//!
//! Everything in here is resolved and type-checked before lowering sees
//! it: semantic types, function signatures with passing modes, callee
//! declarations carrying their special-case flags, and the
//! addressable-or-materialized logical values that expression lowering
//! trades in.

mod decl;
mod types;
mod value;

pub use decl::*;
pub use types::*;
pub use value::*;
