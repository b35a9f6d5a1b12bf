//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::diagnostics::{Diagnostic, LowerResult};
use crate::ir::{Block, Func, FuncBuilder, InstBuilder, SourceLoc, Type, Value};
use crate::lower::TargetAbi;
use crate::sema::{DValue, Ty, TyPool};
use cranelift_entity::entity_impl;

/// A reference to one argument expression, owned by the front end. The
/// engine never looks inside; it only hands these back through
/// [`FrontEnd::lower_expr`] in the evaluation order it chose.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);
entity_impl!(ExprId, "expr");

/// Everything call lowering needs from its surroundings, threaded
/// explicitly instead of living in ambient compiler state.
pub struct LowerCtx<'f, 'm> {
    /// The builder positioned inside the function being compiled.
    pub fx: &'f mut FuncBuilder<'m>,
    /// The active ABI descriptor, selected once per target.
    pub abi: &'f dyn TargetAbi,
    /// The semantic type pool of the compilation.
    pub tys: &'f mut TyPool,
    /// The landing block of the innermost exception-handling scope, when
    /// calls must be emitted invoke-style.
    pub eh_scope: Option<Block>,
    /// The enclosing function's implicit variadic cursor, present when it
    /// has a typed variadic tail.
    pub arg_cursor: Option<Value>,
    /// The enclosing function's receiver, forwarded to contract callees.
    pub receiver: Option<DValue>,
    /// The enclosing function's static-chain context, for calling nested
    /// functions.
    pub nest_context: Option<Value>,
}

impl<'f, 'm> LowerCtx<'f, 'm> {
    /// Creates a context with no exception scope, cursor, receiver, or
    /// static chain.
    pub fn new(fx: &'f mut FuncBuilder<'m>, abi: &'f dyn TargetAbi, tys: &'f mut TyPool) -> Self {
        Self {
            fx,
            abi,
            tys,
            eh_scope: None,
            arg_cursor: None,
            receiver: None,
            nest_context: None,
        }
    }

    /// The physical type of a semantic type, fatal when the type has no
    /// physical values (`void`).
    pub fn ir_ty(&mut self, ty: Ty, loc: SourceLoc) -> LowerResult<Type> {
        self.tys
            .to_ir(ty, self.fx.types_mut())
            .ok_or_else(|| Diagnostic::fatal(loc, "type has no physical representation"))
    }

    /// Produces the value held by a logical value, loading through the
    /// address when it is only addressable.
    pub fn materialize(&mut self, value: DValue, loc: SourceLoc) -> LowerResult<Value> {
        match value {
            DValue::Rval { val, .. } => Ok(val),
            DValue::Lval { ty, addr } => {
                let ir_ty = self.ir_ty(ty, loc)?;

                Ok(self.fx.append().load(ir_ty, addr, loc))
            }
            DValue::Void(_) => Err(Diagnostic::fatal(loc, "cannot use a void value")),
        }
    }

    /// Produces an address holding a logical value, spilling materialized
    /// values into fresh function-scoped storage.
    pub fn address_of(&mut self, value: DValue, loc: SourceLoc) -> LowerResult<Value> {
        match value {
            DValue::Lval { addr, .. } => Ok(addr),
            DValue::Rval { ty, val } => {
                let ir_ty = self.ir_ty(ty, loc)?;
                let addr = self.fx.append().alloca(ir_ty, loc);

                self.fx.append().store(val, addr, loc);

                Ok(addr)
            }
            DValue::Void(_) => Err(Diagnostic::fatal(loc, "cannot take the address of a void value")),
        }
    }
}

/// The seam between the engine and the expression-lowering pass that owns
/// it.
///
/// The engine drives argument evaluation through this trait so that it
/// controls evaluation *order* while the front end controls evaluation
/// itself. The remaining methods fetch front-end-owned artifacts the
/// engine occasionally needs: runtime type descriptors, runtime entry
/// points, and dynamic-messaging selector references.
pub trait FrontEnd {
    /// The resolved semantic type of an argument expression.
    fn ty_of(&self, expr: ExprId) -> Ty;

    /// Evaluates an argument expression into a logical value, emitting
    /// whatever instructions that takes.
    fn lower_expr(&mut self, cx: &mut LowerCtx<'_, '_>, expr: ExprId) -> LowerResult<DValue>;

    /// The compile-time integer value of an expression, for operands that
    /// must be constants (atomic orderings). `None` when not constant.
    fn const_int(&self, expr: ExprId) -> Option<i64>;

    /// Produces a handle to the runtime type descriptor of a type, for
    /// typed-variadic descriptor arrays.
    fn typeinfo_of(&mut self, cx: &mut LowerCtx<'_, '_>, ty: Ty) -> LowerResult<Value>;

    /// Resolves (declaring if needed) a runtime-library entry point.
    fn runtime_func(&mut self, cx: &mut LowerCtx<'_, '_>, name: &str) -> LowerResult<Func>;

    /// Produces a reference to a dynamic-messaging selector.
    fn selector_ref(&mut self, cx: &mut LowerCtx<'_, '_>, name: &str) -> LowerResult<Value>;
}
