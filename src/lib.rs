//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

#![allow(dead_code)]
#![deny(
    unreachable_pub,
    missing_docs,
    missing_abi,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]

//! # Garnet
//!
//! Garnet is the code-generation core of a compiler back end: it turns
//! fully type-checked call expressions (and a small catalogue of
//! compiler-recognized primitive operations) into calling-convention-correct
//! GIR, a generic register-machine IR.
//!
//! The crate is split into three layers:
//!
//! - [`ir`]: GIR itself, along with the builders used to emit it.
//! - [`sema`]: the data model handed over by the front end, with semantic
//!   types, resolved signatures and declarations, and logical values.
//! - [`lower`]: the ABI-aware call-lowering engine, argument marshaling,
//!   and the intrinsic dispatcher. [`lower::lower_call`] is the single
//!   entry point consumed by expression lowering.

pub mod diagnostics;
pub mod ir;
pub mod lower;
pub mod sema;
