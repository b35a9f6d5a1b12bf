//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The ABI-aware call-lowering engine.
//!
//! [`lower_call`] is the single entry point: given a resolved callee, the
//! argument expressions, and the caller-expected result type, it emits a
//! calling-convention-correct call (implicit arguments, marshaled explicit
//! arguments, attributes) and reconstructs a logical result value. Calls
//! to declarations carrying a primitive-operation tag are intercepted by
//! [`try_lower_intrinsic`] and never reach the call machinery.
//!
//! Target specifics live behind [`TargetAbi`]; the engine itself is
//! target-agnostic and purely transforms in-memory representations. All
//! fatal conditions come back as [`Diagnostic`](crate::diagnostics::Diagnostic)
//! values.

mod abi;
mod args;
mod call;
mod context;
mod intrinsic;

#[cfg(test)]
pub(crate) mod testutil;

pub use abi::*;
pub use args::*;
pub use call::*;
pub use context::*;
pub use intrinsic::*;
