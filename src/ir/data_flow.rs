//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, Inst, InstData, Sig, Signature, SourceLoc, Type, Value};
use cranelift_entity::packed_option::PackedOption;
use cranelift_entity::{PrimaryMap, SecondaryMap};
use smallvec::SmallVec;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Where a given [`Value`] came from.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ValueDef {
    /// The value is the result of an instruction.
    Inst(Inst),
    /// The value is the `i`th parameter of a block.
    Param(Block, u32),
}

/// The single storage for everything inside one function: instructions,
/// the values they define, block parameters, and imported signatures.
///
/// The [`Layout`](crate::ir::Layout) decides *where* instructions sit;
/// the graph only knows *what* they are.
#[derive(Debug, Clone, Default)]
pub struct DataFlowGraph {
    insts: PrimaryMap<Inst, InstData>,
    debug: SecondaryMap<Inst, SourceLoc>,
    results: SecondaryMap<Inst, PackedOption<Value>>,
    values: PrimaryMap<Value, (Type, ValueDef)>,
    sigs: PrimaryMap<Sig, Signature>,
    block_params: PrimaryMap<Block, SmallVec<[Value; 4]>>,
}

impl DataFlowGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an instruction into the graph and creates its result value
    /// when it defines one. Does not place the instruction anywhere.
    pub fn create_inst(&mut self, data: InstData, loc: SourceLoc) -> (Inst, Option<Value>) {
        let result_ty = data.result_ty();
        let inst = self.insts.push(data);

        self.debug[inst] = loc;

        let result = result_ty.map(|ty| self.values.push((ty, ValueDef::Inst(inst))));

        self.results[inst] = result.into();

        (inst, result)
    }

    /// Creates a new basic block with no parameters.
    pub fn create_block(&mut self) -> Block {
        self.block_params.push(SmallVec::default())
    }

    /// Appends a parameter of type `ty` to a block, yielding its value.
    pub fn append_block_param(&mut self, block: Block, ty: Type) -> Value {
        let index = self.block_params[block].len() as u32;
        let val = self.values.push((ty, ValueDef::Param(block, index)));

        self.block_params[block].push(val);

        val
    }

    /// The parameter values of a block, in order.
    pub fn block_params(&self, block: Block) -> &[Value] {
        &self.block_params[block]
    }

    /// Imports a signature so call sites inside this function can refer
    /// to it.
    pub fn import_signature(&mut self, sig: Signature) -> Sig {
        self.sigs.push(sig)
    }

    /// Resolves an imported signature.
    pub fn signature(&self, sig: Sig) -> &Signature {
        &self.sigs[sig]
    }

    /// Gets the data of an instruction.
    pub fn inst_data(&self, inst: Inst) -> &InstData {
        &self.insts[inst]
    }

    /// Mutable access to the data of an instruction.
    pub fn inst_data_mut(&mut self, inst: Inst) -> &mut InstData {
        &mut self.insts[inst]
    }

    /// The source location an instruction was emitted at.
    pub fn inst_loc(&self, inst: Inst) -> SourceLoc {
        self.debug[inst]
    }

    /// The result value of an instruction, if it defines one.
    pub fn inst_result(&self, inst: Inst) -> Option<Value> {
        self.results[inst].expand()
    }

    /// The type of a value.
    pub fn ty(&self, value: Value) -> Type {
        self.values[value].0
    }

    /// Where a value was defined.
    pub fn value_def(&self, value: Value) -> ValueDef {
        self.values[value].1
    }

    /// The number of instructions ever created in this function.
    pub fn num_insts(&self) -> usize {
        self.insts.len()
    }

    /// Iterates over every instruction ever created, in creation order.
    pub fn insts(&self) -> impl Iterator<Item = (Inst, &InstData)> + '_ {
        self.insts.iter()
    }
}
