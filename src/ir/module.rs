//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Func, Function, FunctionDefinition, Signature, TypePool};
use ahash::AHashMap;
use cranelift_entity::PrimaryMap;

/// A single module of GIR: the functions (declared or defined) and the
/// type pool their compound types are interned in.
///
/// Modules are not thread-safe; lowering operates on one module from one
/// thread.
#[derive(Debug)]
pub struct Module {
    name: String,
    types: TypePool,
    functions: PrimaryMap<Func, Function>,
    names: AHashMap<String, Func>,
}

impl Module {
    /// Creates an empty module for a target with the given pointer width
    /// in bits.
    pub fn new(name: &str, ptr_width_bits: u32) -> Self {
        Self {
            name: name.to_owned(),
            types: TypePool::new(ptr_width_bits),
            functions: PrimaryMap::default(),
            names: AHashMap::default(),
        }
    }

    /// The name of the module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type pool of the module.
    pub fn types(&self) -> &TypePool {
        &self.types
    }

    /// Mutable access to the type pool.
    pub fn types_mut(&mut self) -> &mut TypePool {
        &mut self.types
    }

    /// Declares a function. If a function of the same name was already
    /// declared, the existing declaration is returned unchanged.
    pub fn declare_function(&mut self, name: &str, sig: Signature) -> Func {
        if let Some(&existing) = self.names.get(name) {
            return existing;
        }

        let func = self.functions.next_key();
        let function = Function::new(name.to_owned(), sig, func);

        self.functions.push(function);
        self.names.insert(name.to_owned(), func);

        func
    }

    /// Installs a body into a previously declared function.
    pub fn define_existing_function(&mut self, func: Func, def: FunctionDefinition) {
        self.functions[func].replace_definition(def);
    }

    /// Resolves a [`Func`] into the function it refers to.
    pub fn function(&self, func: Func) -> &Function {
        &self.functions[func]
    }

    /// Looks up a function by its (mangled) name.
    pub fn find_function_by_name(&self, name: &str) -> Option<Func> {
        self.names.get(name).copied()
    }

    /// Iterates over every function in the module, in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (Func, &Function)> + '_ {
        self.functions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{SigBuilder, Type};

    #[test]
    fn declarations_are_deduplicated() {
        let mut module = Module::new("m", 64);
        let sig = SigBuilder::new().ret(Some(Type::int(32))).build();

        let f1 = module.declare_function("memcmp", sig.clone());
        let f2 = module.declare_function("memcmp", sig);

        assert_eq!(f1, f2);
        assert_eq!(module.find_function_by_name("memcmp"), Some(f1));
        assert!(module.function(f1).is_decl());
    }
}
