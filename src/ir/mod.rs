//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! The GIR ("Garnet IR") object model.
//!
//! This defines the in-memory form of GIR that the lowering engine emits
//! into: types, values, instructions, functions, modules, and the builder
//! APIs for putting them together.

mod builders;
mod data_flow;
mod debug;
mod entities;
mod function;
mod inst_builder;
mod instruction;
mod layout;
mod module;
mod types;

pub use builders::*;
pub use data_flow::*;
pub use debug::*;
pub use entities::*;
pub use function::*;
pub use inst_builder::*;
pub use instruction::*;
pub use layout::*;
pub use module::*;
pub use types::*;
