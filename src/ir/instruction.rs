//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{AttrSet, Block, CallConv, Func, Sig, Type, Value};
use cranelift_entity::packed_option::PackedOption;
use smallvec::SmallVec;
use std::mem;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The memory ordering attached to an atomic operation.
///
/// Lowering translates the ordering tag requested by the target program
/// into this without imposing any ordering of its own. The numbering of
/// [`AtomicOrdering::from_u64`] matches the constants the front end's
/// runtime library hands through primitive calls.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum AtomicOrdering {
    /// No ordering constraint, only atomicity.
    Unordered,
    /// Monotonic (C11 `memory_order_relaxed`).
    Monotonic,
    /// Acquire.
    Acquire,
    /// Release.
    Release,
    /// Acquire and release.
    AcqRel,
    /// Sequentially consistent.
    SeqCst,
}

impl AtomicOrdering {
    /// Decodes the integer tag used by the source-language runtime.
    /// Unknown tags produce `None` (a fatal diagnostic at the call site).
    pub fn from_u64(raw: u64) -> Option<Self> {
        match raw {
            1 => Some(Self::Unordered),
            2 => Some(Self::Monotonic),
            4 => Some(Self::Acquire),
            5 => Some(Self::Release),
            6 => Some(Self::AcqRel),
            7 => Some(Self::SeqCst),
            _ => None,
        }
    }
}

/// The operation selected by an atomic read-modify-write instruction.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum AtomicRmwOp {
    /// Exchange the value.
    Xchg,
    /// Wrapping addition.
    Add,
    /// Wrapping subtraction.
    Sub,
    /// Bitwise AND.
    And,
    /// Bitwise NAND.
    Nand,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Signed maximum.
    Max,
    /// Signed minimum.
    Min,
    /// Unsigned maximum.
    UMax,
    /// Unsigned minimum.
    UMin,
}

impl AtomicRmwOp {
    /// Resolves a read-modify-write sub-operation by its source-level
    /// name. Unknown names produce `None` (a fatal diagnostic).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "xchg" => Some(Self::Xchg),
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            "and" => Some(Self::And),
            "nand" => Some(Self::Nand),
            "or" => Some(Self::Or),
            "xor" => Some(Self::Xor),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "umax" => Some(Self::UMax),
            "umin" => Some(Self::UMin),
            _ => None,
        }
    }
}

/// The comparison performed by an `icmp` instruction.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ICmpOp {
    /// Equality.
    EQ,
    /// Inequality.
    NE,
    /// Signed less-than.
    SLT,
    /// Signed greater-than.
    SGT,
    /// Unsigned less-than.
    ULT,
    /// Unsigned greater-than.
    UGT,
}

/// `call T @function(args...)`, a direct call to a known function.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct CallInst {
    result: Option<Type>,
    sig: Sig,
    callee: Func,
    args: SmallVec<[Value; 4]>,
    attrs: AttrSet,
    conv: CallConv,
    unwind: PackedOption<Block>,
}

impl CallInst {
    /// Creates a direct call.
    pub fn new(result: Option<Type>, sig: Sig, callee: Func, args: &[Value]) -> Self {
        Self {
            result,
            sig,
            callee,
            args: args.into(),
            attrs: AttrSet::new(),
            conv: CallConv::C,
            unwind: PackedOption::default(),
        }
    }

    /// The callee of the call.
    pub fn callee(&self) -> Func {
        self.callee
    }

    /// The signature the call site was emitted against.
    pub fn sig(&self) -> Sig {
        self.sig
    }

    /// The full physical argument list, implicit prefix included.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The attributes attached to the call site, indexed by slot
    /// (0 = return).
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    /// The convention the call is emitted at.
    pub fn conv(&self) -> CallConv {
        self.conv
    }

    /// The unwind edge, if the call was emitted invoke-style inside an
    /// exception-handling scope.
    pub fn unwind(&self) -> Option<Block> {
        self.unwind.expand()
    }

    /// The declared result type of the call.
    pub fn result_ty(&self) -> Option<Type> {
        self.result
    }

    /// Attaches an attribute set to the call site.
    pub fn with_attrs(mut self, attrs: AttrSet) -> Self {
        self.attrs = attrs;
        self
    }

    /// Sets the convention the call is emitted at.
    pub fn with_conv(mut self, conv: CallConv) -> Self {
        self.conv = conv;
        self
    }

    /// Makes the call invoke-style, unwinding to `block`.
    pub fn with_unwind(mut self, block: Option<Block>) -> Self {
        self.unwind = block.into();
        self
    }
}

/// `call T %callee(args...)`, an indirect call through a pointer value.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct IndirectCallInst {
    result: Option<Type>,
    sig: Sig,
    callee: Value,
    args: SmallVec<[Value; 4]>,
    attrs: AttrSet,
    conv: CallConv,
    unwind: PackedOption<Block>,
}

impl IndirectCallInst {
    /// Creates an indirect call through `callee`.
    pub fn new(result: Option<Type>, sig: Sig, callee: Value, args: &[Value]) -> Self {
        Self {
            result,
            sig,
            callee,
            args: args.into(),
            attrs: AttrSet::new(),
            conv: CallConv::C,
            unwind: PackedOption::default(),
        }
    }

    /// The pointer value being called.
    pub fn callee(&self) -> Value {
        self.callee
    }

    /// The signature the call site was emitted against.
    pub fn sig(&self) -> Sig {
        self.sig
    }

    /// The full physical argument list, implicit prefix included.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The attributes attached to the call site, indexed by slot
    /// (0 = return).
    pub fn attrs(&self) -> &AttrSet {
        &self.attrs
    }

    /// The convention the call is emitted at.
    pub fn conv(&self) -> CallConv {
        self.conv
    }

    /// The unwind edge, if the call was emitted invoke-style.
    pub fn unwind(&self) -> Option<Block> {
        self.unwind.expand()
    }

    /// The declared result type of the call.
    pub fn result_ty(&self) -> Option<Type> {
        self.result
    }

    /// Attaches an attribute set to the call site.
    pub fn with_attrs(mut self, attrs: AttrSet) -> Self {
        self.attrs = attrs;
        self
    }

    /// Sets the convention the call is emitted at.
    pub fn with_conv(mut self, conv: CallConv) -> Self {
        self.conv = conv;
        self
    }

    /// Makes the call invoke-style, unwinding to `block`.
    pub fn with_unwind(mut self, block: Option<Block>) -> Self {
        self.unwind = block.into();
        self
    }
}

/// `icmp op T %a, %b`, an integer/pointer comparison.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ICmpInst {
    op: ICmpOp,
    lhs: Value,
    rhs: Value,
}

impl ICmpInst {
    /// Creates an `icmp`.
    pub fn new(op: ICmpOp, lhs: Value, rhs: Value) -> Self {
        Self { op, lhs, rhs }
    }

    /// The comparison performed.
    pub fn op(&self) -> ICmpOp {
        self.op
    }

    /// The left operand.
    pub fn lhs(&self) -> Value {
        self.lhs
    }

    /// The right operand.
    pub fn rhs(&self) -> Value {
        self.rhs
    }
}

/// `sel bool %cond, T %a, T %b`, a ternary-like instruction.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct SelInst {
    ty: Type,
    cond: Value,
    if_true: Value,
    if_false: Value,
}

impl SelInst {
    /// Creates a `sel`.
    pub fn new(ty: Type, cond: Value, if_true: Value, if_false: Value) -> Self {
        Self {
            ty,
            cond,
            if_true,
            if_false,
        }
    }

    /// The condition being selected on.
    pub fn cond(&self) -> Value {
        self.cond
    }

    /// The value produced when the condition is true.
    pub fn if_true(&self) -> Value {
        self.if_true
    }

    /// The value produced when the condition is false.
    pub fn if_false(&self) -> Value {
        self.if_false
    }

    /// The type of the result.
    pub fn result_ty(&self) -> Type {
        self.ty
    }
}

/// `ret T %val`, returns from the current function.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct RetInst {
    val: Option<Value>,
}

impl RetInst {
    /// Creates a `ret`, `None` for `ret void`.
    pub fn new(val: Option<Value>) -> Self {
        Self { val }
    }

    /// The value being returned, if any.
    pub fn value(&self) -> Option<Value> {
        self.val
    }
}

/// A binary bitwise/arithmetic instruction (`and`, `or`, `xor`, `shl`,
/// `lshr`).
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ArithInst {
    ty: Type,
    lhs: Value,
    rhs: Value,
}

impl ArithInst {
    /// Creates a binary instruction producing `ty`.
    pub fn new(ty: Type, lhs: Value, rhs: Value) -> Self {
        Self { ty, lhs, rhs }
    }

    /// The left operand.
    pub fn lhs(&self) -> Value {
        self.lhs
    }

    /// The right operand.
    pub fn rhs(&self) -> Value {
        self.rhs
    }

    /// The type of both operands and the result.
    pub fn result_ty(&self) -> Type {
        self.ty
    }
}

/// `alloca T`, static stack allocation in the enclosing function's
/// stack-allocation region.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct AllocaInst {
    ty: Type,
}

impl AllocaInst {
    /// Creates an `alloca` of a given type.
    pub fn new(ty: Type) -> Self {
        Self { ty }
    }

    /// The type being allocated.
    pub fn alloc_ty(&self) -> Type {
        self.ty
    }
}

/// `dynalloca i8 x %n`, dynamically-sized byte-granularity stack
/// allocation.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct DynAllocaInst {
    count: Value,
}

impl DynAllocaInst {
    /// Creates a dynamic allocation of `count` bytes.
    pub fn new(count: Value) -> Self {
        Self { count }
    }

    /// The byte count operand.
    pub fn count(&self) -> Value {
        self.count
    }
}

/// `load T, ptr %p`, loads from a pointer. Can be tagged volatile and/or
/// atomic.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct LoadInst {
    ptr: Value,
    ty: Type,
    volatile: bool,
    ordering: Option<AtomicOrdering>,
}

impl LoadInst {
    /// Creates a plain (possibly volatile) load.
    pub fn new(ptr: Value, ty: Type, volatile: bool) -> Self {
        Self {
            ptr,
            ty,
            volatile,
            ordering: None,
        }
    }

    /// Creates an atomic load at a given ordering.
    pub fn atomic(ptr: Value, ty: Type, ordering: AtomicOrdering) -> Self {
        Self {
            ptr,
            ty,
            volatile: false,
            ordering: Some(ordering),
        }
    }

    /// The address being loaded from.
    pub fn ptr(&self) -> Value {
        self.ptr
    }

    /// The type being loaded.
    pub fn result_ty(&self) -> Type {
        self.ty
    }

    /// Whether the load may not be reordered or eliminated.
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// The atomic ordering, if the load is atomic.
    pub fn ordering(&self) -> Option<AtomicOrdering> {
        self.ordering
    }
}

/// `store T %a, ptr %p`, stores a value to a pointer. Can be tagged
/// volatile and/or atomic.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct StoreInst {
    ptr: Value,
    val: Value,
    volatile: bool,
    ordering: Option<AtomicOrdering>,
}

impl StoreInst {
    /// Creates a plain (possibly volatile) store.
    pub fn new(ptr: Value, val: Value, volatile: bool) -> Self {
        Self {
            ptr,
            val,
            volatile,
            ordering: None,
        }
    }

    /// Creates an atomic store at a given ordering.
    pub fn atomic(ptr: Value, val: Value, ordering: AtomicOrdering) -> Self {
        Self {
            ptr,
            val,
            volatile: false,
            ordering: Some(ordering),
        }
    }

    /// The address being stored to.
    pub fn ptr(&self) -> Value {
        self.ptr
    }

    /// The value being stored.
    pub fn stored(&self) -> Value {
        self.val
    }

    /// Whether the store may not be reordered or eliminated.
    pub fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// The atomic ordering, if the store is atomic.
    pub fn ordering(&self) -> Option<AtomicOrdering> {
        self.ordering
    }
}

/// `fence ord`, a memory fence.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct FenceInst {
    ordering: AtomicOrdering,
}

impl FenceInst {
    /// Creates a fence at a given ordering.
    pub fn new(ordering: AtomicOrdering) -> Self {
        Self { ordering }
    }

    /// The ordering of the fence.
    pub fn ordering(&self) -> AtomicOrdering {
        self.ordering
    }
}

/// `atomicrmw op T %val, ptr %p`, an atomic read-modify-write. Produces
/// the value the cell held before the mutation.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct AtomicRmwInst {
    op: AtomicRmwOp,
    ptr: Value,
    val: Value,
    ty: Type,
    ordering: AtomicOrdering,
}

impl AtomicRmwInst {
    /// Creates an `atomicrmw` producing the previous value of type `ty`.
    pub fn new(op: AtomicRmwOp, ptr: Value, val: Value, ty: Type, ordering: AtomicOrdering) -> Self {
        Self {
            op,
            ptr,
            val,
            ty,
            ordering,
        }
    }

    /// The sub-operation.
    pub fn op(&self) -> AtomicRmwOp {
        self.op
    }

    /// The address being mutated.
    pub fn ptr(&self) -> Value {
        self.ptr
    }

    /// The operand applied to the cell.
    pub fn operand(&self) -> Value {
        self.val
    }

    /// The type of the cell (and of the result).
    pub fn result_ty(&self) -> Type {
        self.ty
    }

    /// The ordering of the operation.
    pub fn ordering(&self) -> AtomicOrdering {
        self.ordering
    }
}

/// `cmpxchg T %expected, T %desired, ptr %p`, an atomic compare-exchange.
///
/// Produces a `{ T, bool }` pair: the previous value of the cell and a
/// success flag. The same ordering applies to both the success and the
/// failure path.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct CmpXchgInst {
    ptr: Value,
    expected: Value,
    desired: Value,
    result: Type,
    ordering: AtomicOrdering,
}

impl CmpXchgInst {
    /// Creates a `cmpxchg`. `result` must be the `{ T, bool }` pair type.
    pub fn new(
        ptr: Value,
        expected: Value,
        desired: Value,
        result: Type,
        ordering: AtomicOrdering,
    ) -> Self {
        Self {
            ptr,
            expected,
            desired,
            result,
            ordering,
        }
    }

    /// The address being mutated.
    pub fn ptr(&self) -> Value {
        self.ptr
    }

    /// The value the cell is expected to hold.
    pub fn expected(&self) -> Value {
        self.expected
    }

    /// The value stored on success.
    pub fn desired(&self) -> Value {
        self.desired
    }

    /// The `{ T, bool }` result pair type.
    pub fn result_ty(&self) -> Type {
        self.result
    }

    /// The ordering applied symmetrically to success and failure.
    pub fn ordering(&self) -> AtomicOrdering {
        self.ordering
    }
}

/// `offset T, ptr %p, iN %n`, pointer arithmetic in units of `T`.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct OffsetInst {
    ptr: Value,
    offset: Value,
    ty: Type,
}

impl OffsetInst {
    /// Creates an `offset` over elements of type `ty`.
    pub fn new(ptr: Value, offset: Value, ty: Type) -> Self {
        Self { ptr, offset, ty }
    }

    /// The base pointer.
    pub fn base(&self) -> Value {
        self.ptr
    }

    /// The element count being offset by.
    pub fn offset(&self) -> Value {
        self.offset
    }

    /// The element type being stepped over.
    pub fn elem_ty(&self) -> Type {
        self.ty
    }
}

/// `elemptr T, ptr %p, N`, gets a pointer to member `N` of an aggregate
/// of type `T` located at `%p`.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ElemPtrInst {
    agg_ty: Type,
    ptr: Value,
    index: u64,
}

impl ElemPtrInst {
    /// Creates an `elemptr`.
    pub fn new(agg_ty: Type, ptr: Value, index: u64) -> Self {
        Self { agg_ty, ptr, index }
    }

    /// The aggregate type being indexed into.
    pub fn agg_ty(&self) -> Type {
        self.agg_ty
    }

    /// The base pointer.
    pub fn base(&self) -> Value {
        self.ptr
    }

    /// The member index.
    pub fn index(&self) -> u64 {
        self.index
    }
}

/// `extract T %agg, N`, extracts member `N` out of an aggregate value.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ExtractInst {
    output: Type,
    agg: Value,
    index: u64,
}

impl ExtractInst {
    /// Creates an `extract` producing `output`.
    pub fn new(output: Type, agg: Value, index: u64) -> Self {
        Self { output, agg, index }
    }

    /// The aggregate being read.
    pub fn agg(&self) -> Value {
        self.agg
    }

    /// The member index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The type of the extracted member.
    pub fn result_ty(&self) -> Type {
        self.output
    }
}

/// `insert T %agg, U %val, N`, produces a copy of an aggregate value with
/// member `N` replaced.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct InsertInst {
    ty: Type,
    agg: Value,
    val: Value,
    index: u64,
}

impl InsertInst {
    /// Creates an `insert`.
    pub fn new(ty: Type, agg: Value, val: Value, index: u64) -> Self {
        Self {
            ty,
            agg,
            val,
            index,
        }
    }

    /// The aggregate being copied.
    pub fn agg(&self) -> Value {
        self.agg
    }

    /// The member value being inserted.
    pub fn value(&self) -> Value {
        self.val
    }

    /// The member index.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The aggregate type.
    pub fn result_ty(&self) -> Type {
        self.ty
    }
}

/// A cast-class instruction (`sext`, `zext`, `trunc`, `itop`, `ptoi`,
/// `bitcast`).
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct CastInst {
    into: Type,
    from: Value,
}

impl CastInst {
    /// Creates a cast producing `into`.
    pub fn new(into: Type, from: Value) -> Self {
        Self { into, from }
    }

    /// The operand being cast.
    pub fn operand(&self) -> Value {
        self.from
    }

    /// The type being cast into.
    pub fn result_ty(&self) -> Type {
        self.into
    }
}

/// `iconst T N`, materializes an integer constant.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct IConstInst {
    ty: Type,
    value: u64,
}

impl IConstInst {
    /// Creates an `iconst`. The value is interpreted at the width of `ty`.
    pub fn new(ty: Type, value: u64) -> Self {
        Self { ty, value }
    }

    /// The raw constant bits.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The integer type produced.
    pub fn result_ty(&self) -> Type {
        self.ty
    }
}

/// `undef T`, materializes an uninitialized value.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct UndefConstInst {
    ty: Type,
}

impl UndefConstInst {
    /// Creates an `undef` of a given type.
    pub fn new(ty: Type) -> Self {
        Self { ty }
    }

    /// The type produced.
    pub fn result_ty(&self) -> Type {
        self.ty
    }
}

/// `null`, materializes a null pointer.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct NullConstInst {
    ty: Type,
}

impl NullConstInst {
    /// Creates a `null` of a given (pointer) type.
    pub fn new(ty: Type) -> Self {
        Self { ty }
    }

    /// The type produced.
    pub fn result_ty(&self) -> Type {
        self.ty
    }
}

/// `memcpy T, ptr %dst, ptr %src`, copies `sizeof(T)` bytes.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct MemCpyInst {
    dst: Value,
    src: Value,
    ty: Type,
}

impl MemCpyInst {
    /// Creates a copy of `sizeof(ty)` bytes from `src` to `dst`.
    pub fn new(dst: Value, src: Value, ty: Type) -> Self {
        Self { dst, src, ty }
    }

    /// The destination address.
    pub fn dst(&self) -> Value {
        self.dst
    }

    /// The source address.
    pub fn src(&self) -> Value {
        self.src
    }

    /// The type whose size determines the byte count.
    pub fn copied_ty(&self) -> Type {
        self.ty
    }
}

/// `vastart ptr %list`, initializes a native variadic cursor.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct VaStartInst {
    list: Value,
}

impl VaStartInst {
    /// Creates a `vastart` against a cursor address.
    pub fn new(list: Value) -> Self {
        Self { list }
    }

    /// The cursor address.
    pub fn list(&self) -> Value {
        self.list
    }
}

/// `vacopy ptr %dst, ptr %src`, duplicates a native variadic cursor.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct VaCopyInst {
    dst: Value,
    src: Value,
}

impl VaCopyInst {
    /// Creates a `vacopy`.
    pub fn new(dst: Value, src: Value) -> Self {
        Self { dst, src }
    }

    /// The destination cursor address.
    pub fn dst(&self) -> Value {
        self.dst
    }

    /// The source cursor address.
    pub fn src(&self) -> Value {
        self.src
    }
}

/// `vaarg T, ptr %list`, fetches the next variadic value through a native
/// cursor.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct VaArgInst {
    list: Value,
    ty: Type,
}

impl VaArgInst {
    /// Creates a `vaarg` producing `ty`.
    pub fn new(list: Value, ty: Type) -> Self {
        Self { list, ty }
    }

    /// The cursor address.
    pub fn list(&self) -> Value {
        self.list
    }

    /// The type being fetched.
    pub fn result_ty(&self) -> Type {
        self.ty
    }
}

/// This holds both the opcode of a given instruction and all the state
/// that makes up that specific instruction.
///
/// While each instruction may have wildly different actual data, they all
/// are stored in the same table and all inside the same `InstData` type.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum InstData {
    /// `call T @function(args...)`, a direct call to a known function.
    Call(CallInst),
    /// `call T %var(args...)`, an indirect call through a pointer.
    IndirectCall(IndirectCallInst),
    /// `icmp op T %a, %b`, an integer comparison.
    ICmp(ICmpInst),
    /// `sel bool %cond, T %a, T %b`, a ternary-like instruction.
    Sel(SelInst),
    /// `ret T %val`, returns from the current function.
    Ret(RetInst),
    /// `and T %a, %b`.
    And(ArithInst),
    /// `or T %a, %b`.
    Or(ArithInst),
    /// `xor T %a, %b`.
    Xor(ArithInst),
    /// `shl T %a, %b`.
    Shl(ArithInst),
    /// `lshr T %a, %b`.
    LShr(ArithInst),
    /// `alloca T`, static stack allocation.
    Alloca(AllocaInst),
    /// `dynalloca i8 x %n`, dynamic byte-granularity stack allocation.
    DynAlloca(DynAllocaInst),
    /// `load T, ptr %p`, possibly volatile and/or atomic.
    Load(LoadInst),
    /// `store T %a, ptr %p`, possibly volatile and/or atomic.
    Store(StoreInst),
    /// `fence ord`, a memory fence.
    Fence(FenceInst),
    /// `atomicrmw op T %val, ptr %p`.
    AtomicRmw(AtomicRmwInst),
    /// `cmpxchg T %expected, T %desired, ptr %p`.
    CmpXchg(CmpXchgInst),
    /// `offset T, ptr %p, iN %n`, pointer arithmetic.
    Offset(OffsetInst),
    /// `elemptr T, ptr %p, N`, a pointer into an aggregate.
    ElemPtr(ElemPtrInst),
    /// `extract T %agg, N`, reads a member out of an aggregate value.
    Extract(ExtractInst),
    /// `insert T %agg, U %val, N`, replaces a member of an aggregate value.
    Insert(InsertInst),
    /// `sext T, U %v`, sign extension.
    Sext(CastInst),
    /// `zext T, U %v`, zero extension.
    Zext(CastInst),
    /// `trunc T, U %v`, integer truncation.
    Trunc(CastInst),
    /// `itop T, U %v`, integer-to-pointer.
    IToP(CastInst),
    /// `ptoi T, U %v`, pointer-to-integer.
    PToI(CastInst),
    /// `bitcast T, U %v`, bit-level reinterpretation without conversion.
    Bitcast(CastInst),
    /// `iconst T N`, an integer constant.
    IConst(IConstInst),
    /// `undef T`, an uninitialized value.
    Undef(UndefConstInst),
    /// `null T`, a null pointer.
    Null(NullConstInst),
    /// `memcpy T, ptr %dst, ptr %src`.
    MemCpy(MemCpyInst),
    /// `vastart ptr %list`.
    VaStart(VaStartInst),
    /// `vacopy ptr %dst, ptr %src`.
    VaCopy(VaCopyInst),
    /// `vaarg T, ptr %list`.
    VaArg(VaArgInst),
}

/// The "opcode" of an instruction, without any of its data.
pub type Opcode = mem::Discriminant<InstData>;

impl InstData {
    /// Gets the discriminant of the [`InstData`], the "opcode" of the
    /// instruction.
    pub fn opc(&self) -> Opcode {
        mem::discriminant(self)
    }

    /// The type of the value the instruction produces, `None` when it
    /// produces nothing.
    pub fn result_ty(&self) -> Option<Type> {
        match self {
            Self::Call(i) => i.result_ty(),
            Self::IndirectCall(i) => i.result_ty(),
            Self::ICmp(_) => Some(Type::bool()),
            Self::Sel(i) => Some(i.result_ty()),
            Self::Ret(_) | Self::Store(_) | Self::Fence(_) => None,
            Self::And(i) | Self::Or(i) | Self::Xor(i) | Self::Shl(i) | Self::LShr(i) => {
                Some(i.result_ty())
            }
            Self::Alloca(_) | Self::DynAlloca(_) => Some(Type::ptr()),
            Self::Load(i) => Some(i.result_ty()),
            Self::AtomicRmw(i) => Some(i.result_ty()),
            Self::CmpXchg(i) => Some(i.result_ty()),
            Self::Offset(_) | Self::ElemPtr(_) => Some(Type::ptr()),
            Self::Extract(i) => Some(i.result_ty()),
            Self::Insert(i) => Some(i.result_ty()),
            Self::Sext(i)
            | Self::Zext(i)
            | Self::Trunc(i)
            | Self::IToP(i)
            | Self::PToI(i)
            | Self::Bitcast(i) => Some(i.result_ty()),
            Self::IConst(i) => Some(i.result_ty()),
            Self::Undef(i) => Some(i.result_ty()),
            Self::Null(i) => Some(i.result_ty()),
            Self::MemCpy(_) | Self::VaStart(_) | Self::VaCopy(_) => None,
            Self::VaArg(i) => Some(i.result_ty()),
        }
    }

    /// Checks if the instruction is one of the two call instructions.
    pub fn is_call(&self) -> bool {
        matches!(self, Self::Call(_) | Self::IndirectCall(_))
    }
}
