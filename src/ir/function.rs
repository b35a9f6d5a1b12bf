//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{DataFlowGraph, Func, Layout, Type};
use bitflags::bitflags;
use smallvec::SmallVec;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Models the calling-convention attributes that can sit on a physical
    /// argument slot (or on the return, at slot 0).
    #[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default)]
    pub struct ParamAttributes: u32 {
        /// `sret`: the slot is a hidden pointer that the callee writes its
        /// return value through.
        const SRET = 1;
        /// `byval`: the slot is a pointer to an aggregate that is passed by
        /// copying its bytes. Carries an alignment, see [`ArgAttrs`].
        const BYVAL = 2;
        /// `inreg`: the slot must be passed in a register even where the
        /// convention would place it in memory.
        const INREG = 4;
        /// `sext`: a sub-word integer widened by sign extension.
        const SEXT = 8;
        /// `zext`: a sub-word integer widened by zero extension.
        const ZEXT = 16;
        /// `noalias`: the pointer does not alias any other pointer
        /// accessible by the callee.
        const NOALIAS = 32;
        /// `nest`: the slot carries a nested-function static chain.
        const NEST = 64;
    }
}

// `bitflags!` does not generate serde impls for the flag types it
// defines, so the raw bits stand in for the set on the wire.
#[cfg(feature = "enable-serde")]
impl Serialize for ParamAttributes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.bits())
    }
}

#[cfg(feature = "enable-serde")]
impl<'de> Deserialize<'de> for ParamAttributes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::from_bits_retain(u32::deserialize(deserializer)?))
    }
}

/// The attributes of a single physical argument slot: a flag set plus the
/// alignment that accompanies `byval`.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Default)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ArgAttrs {
    flags: ParamAttributes,
    byval_align: u32,
}

impl ArgAttrs {
    /// Creates an empty attribute set for a slot.
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates an attribute set holding the given flags (without a
    /// `byval` alignment).
    pub fn with(flags: ParamAttributes) -> Self {
        debug_assert!(!flags.contains(ParamAttributes::BYVAL));

        Self {
            flags,
            byval_align: 0,
        }
    }

    /// Creates a `byval` attribute with the alignment of the copied
    /// aggregate.
    pub fn byval(align: u32) -> Self {
        Self {
            flags: ParamAttributes::BYVAL,
            byval_align: align,
        }
    }

    /// The flags of the slot.
    pub fn flags(self) -> ParamAttributes {
        self.flags
    }

    /// The alignment accompanying `byval`, meaningless otherwise.
    pub fn byval_align(self) -> u32 {
        self.byval_align
    }

    /// Checks whether a given flag is present.
    pub fn contains(self, flags: ParamAttributes) -> bool {
        self.flags.contains(flags)
    }

    /// Merges another attribute set into this one. Flags union; the larger
    /// `byval` alignment wins.
    pub fn merge(&mut self, other: ArgAttrs) {
        self.flags |= other.flags;
        self.byval_align = self.byval_align.max(other.byval_align);
    }
}

/// Maps physical slot indices to calling-convention attributes.
///
/// Slot 0 is the return; explicit and implicit arguments begin at slot 1.
/// Built incrementally during call lowering and attached to the emitted
/// call site.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Default)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct AttrSet {
    slots: SmallVec<[ArgAttrs; 8]>,
}

impl AttrSet {
    /// Creates an attribute set with every slot empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `attrs` into the attributes of `slot`, growing the set as
    /// needed. Slot 0 is the return.
    pub fn add(&mut self, slot: usize, attrs: ArgAttrs) {
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, ArgAttrs::none());
        }

        self.slots[slot].merge(attrs);
    }

    /// Gets the attributes of a slot. Slots never touched are empty.
    pub fn get(&self, slot: usize) -> ArgAttrs {
        self.slots.get(slot).copied().unwrap_or_default()
    }

    /// The number of slots that have ever been touched.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Checks if no slot was ever touched.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Models which calling convention a given call site or function should
/// be emitted to follow.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum CallConv {
    /// The default C convention for the target platform.
    C,
    /// The System-V convention for the target architecture.
    SysV,
    /// The Windows x64 convention.
    Win64,
    /// Similar to `fastcc` on LLVM, makes calls fast.
    Fast,
    /// The source language's own convention. Its explicit arguments occupy
    /// reversed physical positions relative to source order, a legacy
    /// evaluation-order contract honored by argument marshaling.
    Garnet,
}

/// Holds all of the information necessary to call a function: the physical
/// parameter slots with their attributes, the return, the convention, and
/// whether the callee accepts a variable argument tail.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Signature {
    params: SmallVec<[(Type, ArgAttrs); 4]>,
    ret: (Option<Type>, ArgAttrs),
    call_conv: CallConv,
    vararg: bool,
}

impl Signature {
    /// Creates a signature from its parts. `None` as the return type
    /// means `void`.
    pub fn new(
        params: SmallVec<[(Type, ArgAttrs); 4]>,
        ret: (Option<Type>, ArgAttrs),
        call_conv: CallConv,
        vararg: bool,
    ) -> Self {
        Self {
            params,
            ret,
            call_conv,
            vararg,
        }
    }

    /// Gets the return type. `None` represents `void`.
    #[inline]
    pub fn return_ty(&self) -> Option<Type> {
        self.ret.0
    }

    /// Gets the attributes on the return value.
    #[inline]
    pub fn return_attributes(&self) -> ArgAttrs {
        self.ret.1
    }

    /// Gets the physical parameter slots with their attributes.
    #[inline]
    pub fn params(&self) -> &[(Type, ArgAttrs)] {
        &self.params
    }

    /// Gets the declared type of physical parameter `i`.
    #[inline]
    pub fn param_ty(&self, i: usize) -> Option<Type> {
        self.params.get(i).map(|(ty, _)| *ty)
    }

    /// Gets the function's calling convention.
    #[inline]
    pub fn calling_conv(&self) -> CallConv {
        self.call_conv
    }

    /// Checks if the signature accepts a variable argument tail at the
    /// physical level.
    #[inline]
    pub fn vararg(&self) -> bool {
        self.vararg
    }

    /// Checks if the signature refers to a `void` function.
    #[inline]
    pub fn is_void(&self) -> bool {
        self.return_ty().is_none()
    }
}

/// Helper type for building a [`Signature`].
pub struct SigBuilder {
    vararg: bool,
    abi: CallConv,
    ret: Option<Type>,
    ret_attrs: ArgAttrs,
    params: SmallVec<[(Type, ArgAttrs); 4]>,
}

impl SigBuilder {
    /// Creates a [`SigBuilder`] for the signature `void ()`.
    pub fn new() -> Self {
        Self {
            vararg: false,
            abi: CallConv::C,
            ret: None,
            ret_attrs: ArgAttrs::none(),
            params: SmallVec::default(),
        }
    }

    /// Marks the signature as having a variable argument tail.
    pub fn vararg(mut self, value: bool) -> Self {
        self.vararg = value;
        self
    }

    /// Marks the function as following a specified convention.
    pub fn abi(mut self, abi: CallConv) -> Self {
        self.abi = abi;
        self
    }

    /// Marks the signature as having a given return type.
    pub fn ret(mut self, ret: Option<Type>) -> Self {
        self.ret = ret;
        self
    }

    /// Sets the attributes on the return value.
    pub fn ret_attrs(mut self, attrs: ArgAttrs) -> Self {
        self.ret_attrs = attrs;
        self
    }

    /// Appends a parameter slot without attributes.
    pub fn param(mut self, param: Type) -> Self {
        self.params.push((param, ArgAttrs::none()));
        self
    }

    /// Appends a parameter slot with attributes.
    pub fn param_with(mut self, param: Type, attrs: ArgAttrs) -> Self {
        self.params.push((param, attrs));
        self
    }

    /// Builds the signature.
    pub fn build(self) -> Signature {
        Signature::new(
            self.params,
            (self.ret, self.ret_attrs),
            self.abi,
            self.vararg,
        )
    }
}

impl Default for SigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The definition of a function: the storage for everything in the
/// function, and the layout that strings it into basic blocks.
#[derive(Debug, Clone, Default)]
pub struct FunctionDefinition {
    /// The "data-flow graph" of the function, the storage for every
    /// entity (instruction, value, block, signature) used inside it.
    pub dfg: DataFlowGraph,
    /// The block ordering and per-block instruction lists.
    pub layout: Layout,
}

/// Models a single function at the module level.
///
/// A function without a definition is a declaration (an external symbol
/// that can be called but has no body here).
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    sig: Signature,
    func: Func,
    definition: Option<FunctionDefinition>,
}

impl Function {
    /// Creates an empty function with a given name and signature. This is
    /// equivalent to "declaring" the function.
    pub fn new(name: String, sig: Signature, func: Func) -> Self {
        Self {
            name,
            sig,
            func,
            definition: None,
        }
    }

    /// Gets the signature of the function.
    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    /// Gets the return type of the function, `None` for `void`.
    #[inline]
    pub fn return_ty(&self) -> Option<Type> {
        self.sig.return_ty()
    }

    /// Checks if the function is a declaration without a body.
    #[inline]
    pub fn is_decl(&self) -> bool {
        self.definition.is_none()
    }

    /// Gets the function definition if it exists.
    #[inline]
    pub fn definition(&self) -> Option<&FunctionDefinition> {
        self.definition.as_ref()
    }

    /// Gets the name of the function.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a [`Func`] that refers to `self`.
    #[inline]
    pub fn func(&self) -> Func {
        self.func
    }

    pub(in crate::ir) fn replace_definition(&mut self, def: FunctionDefinition) {
        self.definition.replace(def);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_set_merges_by_slot() {
        let mut attrs = AttrSet::new();

        attrs.add(1, ArgAttrs::with(ParamAttributes::SRET));
        attrs.add(1, ArgAttrs::with(ParamAttributes::NOALIAS));
        attrs.add(3, ArgAttrs::byval(16));

        assert!(attrs.get(1).contains(ParamAttributes::SRET | ParamAttributes::NOALIAS));
        assert_eq!(attrs.get(2), ArgAttrs::none());
        assert_eq!(attrs.get(3).byval_align(), 16);
        assert_eq!(attrs.len(), 4);
    }

    #[test]
    fn sig_builder_roundtrip() {
        let sig = SigBuilder::new()
            .abi(CallConv::Garnet)
            .ret(Some(Type::int(32)))
            .param(Type::ptr())
            .param_with(Type::int(8), ArgAttrs::with(ParamAttributes::ZEXT))
            .vararg(true)
            .build();

        assert_eq!(sig.return_ty(), Some(Type::int(32)));
        assert_eq!(sig.params().len(), 2);
        assert!(sig.vararg());
        assert_eq!(sig.calling_conv(), CallConv::Garnet);
        assert!(sig.params()[1].1.contains(ParamAttributes::ZEXT));
    }

    #[cfg(feature = "enable-serde")]
    use serde_test::{assert_tokens, Token};

    #[test]
    #[cfg(feature = "enable-serde")]
    fn param_attributes_serialize_as_their_bits() {
        let flags = ParamAttributes::SRET | ParamAttributes::NOALIAS;

        assert_tokens(&flags, &[Token::U32(flags.bits())]);
    }

    #[test]
    #[cfg(feature = "enable-serde")]
    fn arg_attrs_round_trip() {
        assert_tokens(
            &ArgAttrs::byval(16),
            &[
                Token::Struct {
                    name: "ArgAttrs",
                    len: 2,
                },
                Token::Str("flags"),
                Token::U32(ParamAttributes::BYVAL.bits()),
                Token::Str("byval_align"),
                Token::U32(16),
                Token::StructEnd,
            ],
        );
    }
}
