//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::*;

/// Builds up the body of a single function inside a [`Module`].
///
/// The builder owns the [`FunctionDefinition`] while the body is being
/// emitted; [`FuncBuilder::define`] installs it into the module.
pub struct FuncBuilder<'m> {
    module: &'m mut Module,
    func: Func,
    def: FunctionDefinition,
    current: Option<Block>,
}

impl<'m> FuncBuilder<'m> {
    /// Starts building the body of a previously declared function.
    pub fn new(module: &'m mut Module, func: Func) -> Self {
        Self {
            module,
            func,
            def: FunctionDefinition::default(),
            current: None,
        }
    }

    /// The function being built.
    pub fn func(&self) -> Func {
        self.func
    }

    /// The signature of the function being built.
    pub fn signature(&self) -> &Signature {
        self.module.function(self.func).signature()
    }

    /// The module the function lives in.
    pub fn module(&self) -> &Module {
        self.module
    }

    /// Mutable access to the module, for declaring callees on the fly.
    pub fn module_mut(&mut self) -> &mut Module {
        self.module
    }

    /// The type pool of the module.
    pub fn types(&self) -> &TypePool {
        self.module.types()
    }

    /// Mutable access to the type pool, for interning compound types.
    pub fn types_mut(&mut self) -> &mut TypePool {
        self.module.types_mut()
    }

    /// The data-flow graph of the function under construction.
    pub fn dfg(&self) -> &DataFlowGraph {
        &self.def.dfg
    }

    /// The layout of the function under construction.
    pub fn layout(&self) -> &Layout {
        &self.def.layout
    }

    /// Creates a new basic block. The block is not placed until
    /// [`FuncBuilder::switch_to`] is called on it.
    pub fn create_block(&mut self) -> Block {
        self.def.dfg.create_block()
    }

    /// Appends a parameter of type `ty` to a block.
    pub fn append_block_param(&mut self, block: Block, ty: Type) -> Value {
        self.def.dfg.append_block_param(block, ty)
    }

    /// Places a block at the end of the function and makes it the
    /// insertion point.
    pub fn switch_to(&mut self, block: Block) {
        self.def.layout.append_block(block);
        self.current = Some(block);
    }

    /// The current insertion block.
    pub fn current_block(&self) -> Option<Block> {
        self.current
    }

    /// Imports a signature for use at call sites in this function.
    pub fn import_signature(&mut self, sig: Signature) -> Sig {
        self.def.dfg.import_signature(sig)
    }

    /// The type of a value in this function.
    pub fn ty(&self, value: Value) -> Type {
        self.def.dfg.ty(value)
    }

    /// Gets an [`InstBuilder`] that appends at the end of the current
    /// block.
    pub fn append(&mut self) -> AppendBuilder<'_> {
        let block = match self.current {
            Some(bb) => bb,
            None => panic!("no insertion point, call `switch_to` first"),
        };

        AppendBuilder {
            dfg: &mut self.def.dfg,
            layout: &mut self.def.layout,
            block,
        }
    }

    /// Finishes the function, installing the body into the module.
    pub fn define(self) {
        self.module.define_existing_function(self.func, self.def);
    }
}

/// An [`InstBuilder`] that appends instructions at the end of a block.
pub struct AppendBuilder<'f> {
    dfg: &'f mut DataFlowGraph,
    layout: &'f mut Layout,
    block: Block,
}

impl<'f> InstBuilder<'f> for AppendBuilder<'f> {
    fn dfg(&self) -> &DataFlowGraph {
        self.dfg
    }

    fn build(self, data: InstData, loc: SourceLoc) -> (Inst, Option<Value>) {
        let (inst, result) = self.dfg.create_inst(data, loc);

        self.layout.append_inst(self.block, inst);

        (inst, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_simple_body() {
        let mut module = Module::new("test", 64);
        let sig = SigBuilder::new().ret(Some(Type::int(32))).build();
        let func = module.declare_function("answer", sig);

        let mut fx = FuncBuilder::new(&mut module, func);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let v = fx.append().iconst(Type::int(32), 42, SourceLoc::default());
        fx.append().ret(Some(v), SourceLoc::default());
        fx.define();

        let def = module.function(func).definition().unwrap();
        let entry = def.layout.entry_block().unwrap();

        assert_eq!(def.layout.insts_of(entry).len(), 2);
        assert_eq!(def.dfg.ty(v), Type::int(32));
    }
}
