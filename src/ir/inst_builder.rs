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

/// The base for anything that can insert instructions. Provides one
/// short method per opcode so emission code reads like the IR it emits.
///
/// Every method takes the [`SourceLoc`] of the construct being lowered;
/// lowering copies the location of the call expression onto everything it
/// emits for that call.
pub trait InstBuilder<'f>: Sized {
    /// Gets the graph instructions are being inserted into.
    fn dfg(&self) -> &DataFlowGraph;

    /// Inserts the instruction and places it, yielding the instruction
    /// and its result (if it defines one).
    fn build(self, data: InstData, loc: SourceLoc) -> (Inst, Option<Value>);

    /// Emits a direct call. The result is `None` for `void` callees.
    fn call(self, callee: Func, sig: Sig, args: &[Value], loc: SourceLoc) -> (Inst, Option<Value>) {
        let result = self.dfg().signature(sig).return_ty();

        self.build(InstData::Call(CallInst::new(result, sig, callee, args)), loc)
    }

    /// Emits an indirect call through a pointer value.
    fn indirect_call(
        self,
        callee: Value,
        sig: Sig,
        args: &[Value],
        loc: SourceLoc,
    ) -> (Inst, Option<Value>) {
        debug_assert!(self.dfg().ty(callee).is_ptr());

        let result = self.dfg().signature(sig).return_ty();

        self.build(
            InstData::IndirectCall(IndirectCallInst::new(result, sig, callee, args)),
            loc,
        )
    }

    /// Emits an `icmp`.
    fn icmp(self, op: ICmpOp, lhs: Value, rhs: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::ICmp(ICmpInst::new(op, lhs, rhs)), loc))
    }

    /// Emits a `sel`.
    fn sel(self, cond: Value, if_true: Value, if_false: Value, loc: SourceLoc) -> Value {
        let ty = self.dfg().ty(if_true);

        result_of(self.build(InstData::Sel(SelInst::new(ty, cond, if_true, if_false)), loc))
    }

    /// Emits a `ret`, `None` for `ret void`.
    fn ret(self, val: Option<Value>, loc: SourceLoc) -> Inst {
        self.build(InstData::Ret(RetInst::new(val)), loc).0
    }

    /// Emits an `and`.
    fn and(self, lhs: Value, rhs: Value, loc: SourceLoc) -> Value {
        let ty = self.dfg().ty(lhs);

        result_of(self.build(InstData::And(ArithInst::new(ty, lhs, rhs)), loc))
    }

    /// Emits an `or`.
    fn or(self, lhs: Value, rhs: Value, loc: SourceLoc) -> Value {
        let ty = self.dfg().ty(lhs);

        result_of(self.build(InstData::Or(ArithInst::new(ty, lhs, rhs)), loc))
    }

    /// Emits an `xor`.
    fn xor(self, lhs: Value, rhs: Value, loc: SourceLoc) -> Value {
        let ty = self.dfg().ty(lhs);

        result_of(self.build(InstData::Xor(ArithInst::new(ty, lhs, rhs)), loc))
    }

    /// Emits a `shl`.
    fn shl(self, lhs: Value, rhs: Value, loc: SourceLoc) -> Value {
        let ty = self.dfg().ty(lhs);

        result_of(self.build(InstData::Shl(ArithInst::new(ty, lhs, rhs)), loc))
    }

    /// Emits a `lshr`.
    fn lshr(self, lhs: Value, rhs: Value, loc: SourceLoc) -> Value {
        let ty = self.dfg().ty(lhs);

        result_of(self.build(InstData::LShr(ArithInst::new(ty, lhs, rhs)), loc))
    }

    /// Emits an `alloca`, yielding the address of the slot.
    fn alloca(self, ty: Type, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Alloca(AllocaInst::new(ty)), loc))
    }

    /// Emits a `dynalloca` of `count` bytes.
    fn dyn_alloca(self, count: Value, loc: SourceLoc) -> Value {
        debug_assert!(self.dfg().ty(count).is_int());

        result_of(self.build(InstData::DynAlloca(DynAllocaInst::new(count)), loc))
    }

    /// Emits a plain `load`.
    fn load(self, ty: Type, ptr: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Load(LoadInst::new(ptr, ty, false)), loc))
    }

    /// Emits a volatile `load`.
    fn load_volatile(self, ty: Type, ptr: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Load(LoadInst::new(ptr, ty, true)), loc))
    }

    /// Emits an atomic `load` at a given ordering.
    fn load_atomic(self, ty: Type, ptr: Value, ordering: AtomicOrdering, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Load(LoadInst::atomic(ptr, ty, ordering)), loc))
    }

    /// Emits a plain `store`.
    fn store(self, val: Value, ptr: Value, loc: SourceLoc) -> Inst {
        self.build(InstData::Store(StoreInst::new(ptr, val, false)), loc).0
    }

    /// Emits a volatile `store`.
    fn store_volatile(self, val: Value, ptr: Value, loc: SourceLoc) -> Inst {
        self.build(InstData::Store(StoreInst::new(ptr, val, true)), loc).0
    }

    /// Emits an atomic `store` at a given ordering.
    fn store_atomic(self, val: Value, ptr: Value, ordering: AtomicOrdering, loc: SourceLoc) -> Inst {
        self.build(InstData::Store(StoreInst::atomic(ptr, val, ordering)), loc)
            .0
    }

    /// Emits a `fence`.
    fn fence(self, ordering: AtomicOrdering, loc: SourceLoc) -> Inst {
        self.build(InstData::Fence(FenceInst::new(ordering)), loc).0
    }

    /// Emits an `atomicrmw`, yielding the previous value of the cell.
    fn atomic_rmw(
        self,
        op: AtomicRmwOp,
        ptr: Value,
        val: Value,
        ordering: AtomicOrdering,
        loc: SourceLoc,
    ) -> Value {
        let ty = self.dfg().ty(val);

        result_of(self.build(
            InstData::AtomicRmw(AtomicRmwInst::new(op, ptr, val, ty, ordering)),
            loc,
        ))
    }

    /// Emits a `cmpxchg`, yielding the `{ T, bool }` result pair.
    fn cmpxchg(
        self,
        pair_ty: Type,
        ptr: Value,
        expected: Value,
        desired: Value,
        ordering: AtomicOrdering,
        loc: SourceLoc,
    ) -> Value {
        result_of(self.build(
            InstData::CmpXchg(CmpXchgInst::new(ptr, expected, desired, pair_ty, ordering)),
            loc,
        ))
    }

    /// Emits an `offset` stepping over elements of `ty`.
    fn offset(self, ty: Type, ptr: Value, offset: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Offset(OffsetInst::new(ptr, offset, ty)), loc))
    }

    /// Emits an `elemptr` pointing at member `index` of an aggregate.
    fn elemptr(self, agg_ty: Type, ptr: Value, index: u64, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::ElemPtr(ElemPtrInst::new(agg_ty, ptr, index)), loc))
    }

    /// Emits an `extract` reading member `index` out of an aggregate value.
    fn extract(self, output: Type, agg: Value, index: u64, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Extract(ExtractInst::new(output, agg, index)), loc))
    }

    /// Emits an `insert` replacing member `index` of an aggregate value.
    fn insert(self, agg: Value, val: Value, index: u64, loc: SourceLoc) -> Value {
        let ty = self.dfg().ty(agg);

        result_of(self.build(InstData::Insert(InsertInst::new(ty, agg, val, index)), loc))
    }

    /// Emits a `sext` into `into`.
    fn sext(self, into: Type, from: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Sext(CastInst::new(into, from)), loc))
    }

    /// Emits a `zext` into `into`.
    fn zext(self, into: Type, from: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Zext(CastInst::new(into, from)), loc))
    }

    /// Emits a `trunc` into `into`.
    fn trunc(self, into: Type, from: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Trunc(CastInst::new(into, from)), loc))
    }

    /// Emits an `itop` into `into`.
    fn itop(self, into: Type, from: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::IToP(CastInst::new(into, from)), loc))
    }

    /// Emits a `ptoi` into `into`.
    fn ptoi(self, into: Type, from: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::PToI(CastInst::new(into, from)), loc))
    }

    /// Emits a `bitcast` into `into`.
    fn bitcast(self, into: Type, from: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Bitcast(CastInst::new(into, from)), loc))
    }

    /// Emits an `iconst`.
    fn iconst(self, ty: Type, value: u64, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::IConst(IConstInst::new(ty, value)), loc))
    }

    /// Emits an `undef`.
    fn undef(self, ty: Type, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Undef(UndefConstInst::new(ty)), loc))
    }

    /// Emits a `null` pointer.
    fn null(self, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::Null(NullConstInst::new(Type::ptr())), loc))
    }

    /// Emits a `memcpy` of `sizeof(ty)` bytes.
    fn memcpy(self, ty: Type, dst: Value, src: Value, loc: SourceLoc) -> Inst {
        self.build(InstData::MemCpy(MemCpyInst::new(dst, src, ty)), loc).0
    }

    /// Emits a `vastart`.
    fn va_start(self, list: Value, loc: SourceLoc) -> Inst {
        self.build(InstData::VaStart(VaStartInst::new(list)), loc).0
    }

    /// Emits a `vacopy`.
    fn va_copy(self, dst: Value, src: Value, loc: SourceLoc) -> Inst {
        self.build(InstData::VaCopy(VaCopyInst::new(dst, src)), loc).0
    }

    /// Emits a `vaarg` fetching a `ty` through a native cursor.
    fn va_arg(self, ty: Type, list: Value, loc: SourceLoc) -> Value {
        result_of(self.build(InstData::VaArg(VaArgInst::new(list, ty)), loc))
    }
}

fn result_of((inst, value): (Inst, Option<Value>)) -> Value {
    match value {
        Some(v) => v,
        None => panic!("instruction '{inst}' should define a result"),
    }
}
