//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use cranelift_entity::entity_impl;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A reference to a single SSA value inside of a function.
///
/// Values are produced by instructions and by block parameters, and are
/// only meaningful inside the [`DataFlowGraph`](crate::ir::DataFlowGraph)
/// that created them.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Value(u32);
entity_impl!(Value, "v");

/// A reference to a single instruction inside of a function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Inst(u32);
entity_impl!(Inst, "inst");

/// A reference to a basic block inside of a function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Block(u32);
entity_impl!(Block, "bb");

/// A reference to a function at the [`Module`](crate::ir::Module) level.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Func(u32);
entity_impl!(Func, "fn");

/// A reference to a [`Signature`](crate::ir::Signature) imported into a
/// function's data-flow graph. Only valid inside its own function.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Sig(u32);
entity_impl!(Sig, "sig");
