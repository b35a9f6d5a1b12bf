//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{AttrSet, CallConv};
use crate::sema::Ty;

/// How one formal parameter receives its argument.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum PassMode {
    /// The argument's value is passed.
    ByValue,
    /// The argument's address is passed; the callee sees the caller's
    /// storage.
    ByRef,
    /// The argument is passed unevaluated, as a closure the callee may
    /// invoke. The front end hands lowering the thunk already built.
    Lazy,
}

/// The flavor of variable-argument tail a signature accepts.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum Variadic {
    /// No variadic tail.
    None,
    /// A C-style tail: extra physical arguments, no metadata.
    C,
    /// The source language's typed tail: extra physical arguments plus an
    /// implicit runtime array of type descriptors so the callee can
    /// inspect what it was given.
    Typed,
}

/// One formal parameter of a resolved signature.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub struct Param {
    /// The declared semantic type.
    pub ty: Ty,
    /// How the argument reaches the callee.
    pub mode: PassMode,
}

impl Param {
    /// A parameter passed by value.
    pub fn by_value(ty: Ty) -> Self {
        Self {
            ty,
            mode: PassMode::ByValue,
        }
    }

    /// A parameter passed by reference.
    pub fn by_ref(ty: Ty) -> Self {
        Self {
            ty,
            mode: PassMode::ByRef,
        }
    }
}

/// A resolved function signature, immutable once the front end hands it
/// over.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct FnSig {
    /// The formal parameters, in declaration order.
    pub params: Vec<Param>,
    /// The declared return type (possibly `void`).
    pub ret: Ty,
    /// Whether the return is reference-qualified, making the raw call
    /// result an address rather than a value.
    pub ret_ref: bool,
    /// The declared calling convention.
    pub conv: CallConv,
    /// The variadic tail flavor.
    pub variadic: Variadic,
}

impl FnSig {
    /// Creates a non-variadic signature at the source language's own
    /// convention.
    pub fn new(params: Vec<Param>, ret: Ty) -> Self {
        Self {
            params,
            ret,
            ret_ref: false,
            conv: CallConv::Garnet,
            variadic: Variadic::None,
        }
    }

    /// The formal arity of the signature.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// The primitive operations the compiler recognizes and lowers directly,
/// bypassing the call machinery. Dispatch is purely on this tag; the
/// declaration's name never matters.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum Intrinsic {
    /// Initialize a variadic cursor from the enclosing function's tail.
    VaStart,
    /// Duplicate a variadic cursor.
    VaCopy,
    /// Fetch the next value through a variadic cursor.
    VaArg,
    /// Dynamically-sized stack allocation, byte granularity.
    Alloca,
    /// A memory fence at a requested ordering.
    Fence,
    /// An atomic store.
    AtomicStore,
    /// An atomic load.
    AtomicLoad,
    /// An atomic compare-exchange returning the previous value.
    AtomicCmpXchg,
    /// An atomic read-modify-write; the sub-operation comes from the
    /// declaration's [`FuncDecl::intrinsic_name`].
    AtomicRmw,
    /// Test a bit of a word in memory.
    BitTest,
    /// Test a bit and clear it.
    BitTestAndReset,
    /// Test a bit and flip it.
    BitTestAndComplement,
    /// Test a bit and set it.
    BitTestAndSet,
    /// A load no optimization may reorder or eliminate.
    VolatileLoad,
    /// A store no optimization may reorder or eliminate.
    VolatileStore,
}

/// A resolved callee declaration, as the front end hands it to lowering.
///
/// The flags gathered here are the named special cases of call lowering:
/// compiler-generated array operations marshal right-to-left, struct
/// constructors return their receiver, contract invocations forward the
/// enclosing receiver, and so on. Everything is data; lowering never
/// inspects source syntax.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// The mangled symbol name.
    pub name: String,
    /// The resolved signature.
    pub sig: FnSig,
    /// The primitive-operation tag, if the declaration is one.
    pub intrinsic: Option<Intrinsic>,
    /// The sub-operation name for name-resolved primitives
    /// ([`Intrinsic::AtomicRmw`]).
    pub intrinsic_name: Option<String>,
    /// Whether this is a compiler-generated array operation, which
    /// marshals its arguments strictly right-to-left.
    pub is_array_op: bool,
    /// Whether this is a struct constructor, whose result is delivered
    /// through its receiver argument.
    pub is_struct_ctor: bool,
    /// Whether this is a contract of the enclosing function, receiving
    /// the enclosing function's receiver.
    pub is_contract: bool,
    /// Whether the callee is a method taking an object receiver.
    pub has_this: bool,
    /// Whether the callee is a nested function taking a static-chain
    /// context argument.
    pub needs_nest: bool,
    /// The dynamic-messaging selector, for object-messaging methods.
    pub selector: Option<String>,
    /// The fixed attribute table of a recognized native builtin, which
    /// overrides whatever lowering computed.
    pub builtin_attrs: Option<AttrSet>,
}

impl FuncDecl {
    /// Creates a plain declaration with no special-case flags.
    pub fn new(name: &str, sig: FnSig) -> Self {
        Self {
            name: name.to_owned(),
            sig,
            intrinsic: None,
            intrinsic_name: None,
            is_array_op: false,
            is_struct_ctor: false,
            is_contract: false,
            has_this: false,
            needs_nest: false,
            selector: None,
            builtin_attrs: None,
        }
    }

    /// Creates a declaration tagged as a primitive operation.
    pub fn intrinsic(name: &str, sig: FnSig, tag: Intrinsic) -> Self {
        Self {
            intrinsic: Some(tag),
            ..Self::new(name, sig)
        }
    }
}
