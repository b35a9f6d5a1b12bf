//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, Inst};
use cranelift_entity::SecondaryMap;
use smallvec::SmallVec;

/// The program order of one function: which blocks exist, the order they
/// appear in, and the instructions inside each one.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    blocks: Vec<Block>,
    insts: SecondaryMap<Block, SmallVec<[Inst; 16]>>,
}

impl Layout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a block at the end of the function.
    pub fn append_block(&mut self, block: Block) {
        debug_assert!(!self.blocks.contains(&block));

        self.blocks.push(block);
    }

    /// Appends an instruction at the end of a block.
    pub fn append_inst(&mut self, block: Block, inst: Inst) {
        self.insts[block].push(inst);
    }

    /// The first block of the function, if any block was ever appended.
    pub fn entry_block(&self) -> Option<Block> {
        self.blocks.first().copied()
    }

    /// The blocks of the function, in program order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// The instructions of a block, in program order.
    pub fn insts_of(&self, block: Block) -> &[Inst] {
        &self.insts[block]
    }

    /// The last instruction of a block, if the block is non-empty.
    pub fn last_inst(&self, block: Block) -> Option<Inst> {
        self.insts[block].last().copied()
    }
}
