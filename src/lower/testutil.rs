//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! A fabricated front end and a synthetic ABI for exercising the engine
//! in isolation.

use crate::diagnostics::LowerResult;
use crate::ir::{
    ArgAttrs, CallConv, CallInst, DataFlowGraph, Func, IndirectCallInst, InstBuilder, InstData,
    SigBuilder, SourceLoc, Type, TypePool, Value,
};
use crate::lower::{ExprId, FrontEnd, LowerCtx, ReturnPlan, TargetAbi, VarArgSlot};
use crate::sema::{DValue, FnSig, FuncDecl, Ty, TyPool};
use cranelift_entity::PrimaryMap;

pub(crate) enum TestKind {
    Int(i64),
    Slot,
}

pub(crate) struct TestExpr {
    pub(crate) ty: Ty,
    pub(crate) kind: TestKind,
}

/// A toy expression store standing in for the expression-lowering pass.
/// Records the order the engine asked expressions to be evaluated in.
pub(crate) struct TestFrontEnd {
    exprs: PrimaryMap<ExprId, TestExpr>,
    pub(crate) order: Vec<ExprId>,
}

impl TestFrontEnd {
    pub(crate) fn new() -> Self {
        Self {
            exprs: PrimaryMap::default(),
            order: Vec::new(),
        }
    }

    /// An integer-constant argument expression.
    pub(crate) fn int(&mut self, ty: Ty, value: i64) -> ExprId {
        self.exprs.push(TestExpr {
            ty,
            kind: TestKind::Int(value),
        })
    }

    /// An addressable argument expression (evaluates to fresh storage).
    pub(crate) fn slot(&mut self, ty: Ty) -> ExprId {
        self.exprs.push(TestExpr {
            ty,
            kind: TestKind::Slot,
        })
    }
}

impl FrontEnd for TestFrontEnd {
    fn ty_of(&self, expr: ExprId) -> Ty {
        self.exprs[expr].ty
    }

    fn lower_expr(&mut self, cx: &mut LowerCtx<'_, '_>, expr: ExprId) -> LowerResult<DValue> {
        let loc = SourceLoc::default();

        self.order.push(expr);

        let ty = self.exprs[expr].ty;

        match self.exprs[expr].kind {
            TestKind::Int(value) => {
                let ir_ty = cx.ir_ty(ty, loc)?;

                Ok(DValue::rval(ty, cx.fx.append().iconst(ir_ty, value as u64, loc)))
            }
            TestKind::Slot => {
                let ir_ty = cx.ir_ty(ty, loc)?;

                Ok(DValue::lval(ty, cx.fx.append().alloca(ir_ty, loc)))
            }
        }
    }

    fn const_int(&self, expr: ExprId) -> Option<i64> {
        match self.exprs[expr].kind {
            TestKind::Int(value) => Some(value),
            TestKind::Slot => None,
        }
    }

    fn typeinfo_of(&mut self, cx: &mut LowerCtx<'_, '_>, _: Ty) -> LowerResult<Value> {
        Ok(cx.fx.append().null(SourceLoc::default()))
    }

    fn runtime_func(&mut self, cx: &mut LowerCtx<'_, '_>, name: &str) -> LowerResult<Func> {
        let sig = SigBuilder::new().build();

        Ok(cx.fx.module_mut().declare_function(name, sig))
    }

    fn selector_ref(&mut self, cx: &mut LowerCtx<'_, '_>, _: &str) -> LowerResult<Value> {
        Ok(cx.fx.append().null(SourceLoc::default()))
    }
}

/// A synthetic descriptor whose only interesting property is the relative
/// order of the `{this, sret}` implicit pair.
pub(crate) struct PrefixAbi {
    pub(crate) this_first: bool,
}

impl TargetAbi for PrefixAbi {
    fn pass_by_val(&self, tys: &TyPool, _: &mut TypePool, ty: Ty) -> bool {
        tys.in_memory_only(ty)
    }

    fn return_plan(&self, tys: &TyPool, _: &mut TypePool, sig: &FnSig) -> ReturnPlan {
        if tys.is_void(sig.ret) {
            ReturnPlan::Direct
        } else if sig.ret_ref {
            ReturnPlan::ByRef
        } else if tys.in_memory_only(sig.ret) {
            ReturnPlan::Sret
        } else {
            ReturnPlan::Direct
        }
    }

    fn reconstruct_return(
        &self,
        _: &mut LowerCtx<'_, '_>,
        raw: Value,
        ty: Ty,
        _: SourceLoc,
    ) -> LowerResult<DValue> {
        Ok(DValue::rval(ty, raw))
    }

    fn extend_attr(&self, _: &TyPool, _: Ty) -> ArgAttrs {
        ArgAttrs::none()
    }

    fn pass_this_before_sret(&self, _: &FnSig) -> bool {
        self.this_first
    }

    fn rewrite_varargs(&self, _: &TyPool, _: &mut TypePool, _: &mut [VarArgSlot]) {}

    fn calling_conv(&self, declared: CallConv, _: Option<&FuncDecl>) -> CallConv {
        declared
    }

    fn prepare_va_start(
        &self,
        cx: &mut LowerCtx<'_, '_>,
        list: Value,
        loc: SourceLoc,
    ) -> LowerResult<()> {
        cx.fx.append().va_start(list, loc);

        Ok(())
    }

    fn va_copy(
        &self,
        cx: &mut LowerCtx<'_, '_>,
        dst: Value,
        src: Value,
        loc: SourceLoc,
    ) -> LowerResult<()> {
        cx.fx.append().va_copy(dst, src, loc);

        Ok(())
    }

    fn prepare_va_arg(
        &self,
        cx: &mut LowerCtx<'_, '_>,
        list: Value,
        ty: Type,
        loc: SourceLoc,
    ) -> LowerResult<Value> {
        Ok(cx.fx.append().va_arg(ty, list, loc))
    }
}

/// The first direct call emitted into a function, for slot assertions.
pub(crate) fn first_call(dfg: &DataFlowGraph) -> &CallInst {
    dfg.insts()
        .find_map(|(_, data)| match data {
            InstData::Call(call) => Some(call),
            _ => None,
        })
        .expect("a call should have been emitted")
}

/// The first indirect call emitted into a function.
pub(crate) fn first_indirect(dfg: &DataFlowGraph) -> &IndirectCallInst {
    dfg.insts()
        .find_map(|(_, data)| match data {
            InstData::IndirectCall(call) => Some(call),
            _ => None,
        })
        .expect("an indirect call should have been emitted")
}
