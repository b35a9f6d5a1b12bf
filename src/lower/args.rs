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
use crate::ir::{ArgAttrs, CallConv, InstBuilder, ParamAttributes, SourceLoc, Type, Value};
use crate::lower::{ExprId, FrontEnd, LowerCtx, ReturnPlan};
use crate::sema::{DValue, FnSig, FuncDecl, PassMode, Ty, Variadic};

/// The physical shape of one formal parameter slot after the ABI has had
/// its say.
#[derive(Debug, Copy, Clone)]
pub struct ArgSlot {
    /// The physical type the call site passes in this slot.
    pub ty: Type,
    /// The calling-convention attributes of the slot.
    pub attrs: ArgAttrs,
    /// The declared passing mode of the parameter behind the slot.
    pub mode: PassMode,
}

/// One variadic argument's descriptor, built during marshaling and handed
/// to [`TargetAbi::rewrite_varargs`](crate::lower::TargetAbi::rewrite_varargs)
/// for target-specific adjustment before final placement.
#[derive(Debug, Copy, Clone)]
pub struct VarArgSlot {
    /// The semantic type of the argument.
    pub ty: Ty,
    /// The evaluated argument.
    pub value: DValue,
    /// The physical type the slot passes.
    pub slot_ty: Type,
    /// The attributes of the slot.
    pub attrs: ArgAttrs,
    /// Whether the argument travels as a hidden by-value pointer.
    pub byval: bool,
}

/// A resolved signature translated into physical terms: the return plan,
/// the formal slots, and which implicit-prefix members the call carries.
///
/// Physical slot order is: the `{sret, context}` pair (in either order,
/// per the ABI), the selector, the typed-variadic descriptor, then the
/// explicit suffix (possibly reversed).
#[derive(Debug, Clone)]
pub struct LoweredSig {
    /// How the return travels.
    pub plan: ReturnPlan,
    /// The physical return type; `None` for `void` and for `sret`.
    pub ret: Option<Type>,
    /// The attributes of the return (attribute slot 0).
    pub ret_attrs: ArgAttrs,
    /// The pointee type of the hidden return pointer, when the plan is
    /// [`ReturnPlan::Sret`].
    pub sret_ty: Option<Type>,
    /// Whether the call carries a context/this implicit argument.
    pub needs_context: bool,
    /// Whether the call carries a dynamic-messaging selector argument.
    pub has_selector: bool,
    /// Whether the call carries a typed-variadic descriptor argument.
    pub typed_varargs: bool,
    /// Whether the context argument precedes the hidden return pointer.
    pub this_before_sret: bool,
    /// Whether the explicit suffix occupies reversed physical positions.
    pub reverse_explicit: bool,
    /// The formal parameter slots, in declaration order.
    pub formals: Vec<ArgSlot>,
    /// The convention to emit the call at.
    pub conv: CallConv,
    /// Whether the physical signature accepts a variable argument tail.
    pub vararg: bool,
}

impl LoweredSig {
    /// Whether the return travels through a hidden pointer.
    pub fn has_sret(&self) -> bool {
        self.plan == ReturnPlan::Sret
    }

    /// The number of implicit arguments preceding the explicit suffix.
    pub fn implicit_len(&self) -> usize {
        usize::from(self.has_sret())
            + usize::from(self.needs_context)
            + usize::from(self.has_selector)
            + usize::from(self.typed_varargs)
    }

    /// The physical argument index of the hidden return pointer.
    pub fn sret_index(&self) -> Option<usize> {
        if !self.has_sret() {
            return None;
        }

        Some(usize::from(self.needs_context && self.this_before_sret))
    }

    /// The physical argument index of the context/this argument.
    pub fn context_index(&self) -> Option<usize> {
        if !self.needs_context {
            return None;
        }

        Some(usize::from(self.has_sret() && !self.this_before_sret))
    }
}

/// Translates a resolved signature into physical terms for one call site.
pub fn lower_function_sig(
    cx: &mut LowerCtx<'_, '_>,
    decl: Option<&FuncDecl>,
    sig: &FnSig,
    loc: SourceLoc,
) -> LowerResult<LoweredSig> {
    let abi = cx.abi;
    let plan = abi.return_plan(cx.tys, cx.fx.types_mut(), sig);

    let (ret, ret_attrs, sret_ty) = match plan {
        ReturnPlan::Direct => {
            let ret = cx.tys.to_ir(sig.ret, cx.fx.types_mut());
            let attrs = match ret {
                Some(_) => abi.extend_attr(cx.tys, sig.ret),
                None => ArgAttrs::none(),
            };

            (ret, attrs, None)
        }
        ReturnPlan::ByRef => (Some(Type::ptr()), ArgAttrs::none(), None),
        ReturnPlan::Sret => (None, ArgAttrs::none(), Some(cx.ir_ty(sig.ret, loc)?)),
    };

    let mut formals = Vec::with_capacity(sig.params.len());

    for param in &sig.params {
        let slot = match param.mode {
            PassMode::ByRef => ArgSlot {
                ty: Type::ptr(),
                attrs: ArgAttrs::none(),
                mode: param.mode,
            },
            // A lazy parameter receives its thunk as a closure pair.
            PassMode::Lazy => ArgSlot {
                ty: Type::structure(cx.fx.types_mut(), &[Type::ptr(), Type::ptr()]),
                attrs: ArgAttrs::none(),
                mode: param.mode,
            },
            PassMode::ByValue => {
                if abi.pass_by_val(cx.tys, cx.fx.types_mut(), param.ty) {
                    let ir_ty = cx.ir_ty(param.ty, loc)?;
                    let align = cx.fx.types().layout_of(ir_ty).align();

                    ArgSlot {
                        ty: Type::ptr(),
                        attrs: ArgAttrs::byval(align as u32),
                        mode: param.mode,
                    }
                } else {
                    ArgSlot {
                        ty: cx.ir_ty(param.ty, loc)?,
                        attrs: abi.extend_attr(cx.tys, param.ty),
                        mode: param.mode,
                    }
                }
            }
        };

        formals.push(slot);
    }

    Ok(LoweredSig {
        plan,
        ret,
        ret_attrs,
        sret_ty,
        needs_context: decl.map(|d| d.has_this || d.needs_nest).unwrap_or(false),
        has_selector: decl.map(|d| d.selector.is_some()).unwrap_or(false),
        typed_varargs: sig.variadic == Variadic::Typed,
        this_before_sret: abi.pass_this_before_sret(sig),
        reverse_explicit: abi.reverse_explicit(sig.conv),
        formals,
        conv: abi.calling_conv(sig.conv, decl),
        vararg: sig.variadic != Variadic::None,
    })
}

/// The explicit suffix of a call after marshaling: physical values and
/// per-slot attributes in final physical order, plus the semantic types
/// of the variadic tail (source order) for descriptor construction.
#[derive(Debug)]
pub struct MarshaledArgs {
    /// The explicit physical argument values, in final (possibly
    /// reversed) order.
    pub values: Vec<Value>,
    /// The attributes of each explicit slot, parallel to `values`.
    pub attrs: Vec<ArgAttrs>,
    /// The semantic types of the variadic arguments, in source order.
    pub vararg_tys: Vec<Ty>,
}

/// Evaluates and places the explicit arguments of one call.
///
/// Formal arguments evaluate left-to-right, except for compiler-generated
/// array operations which evaluate strictly right-to-left. Variadic
/// arguments always evaluate left-to-right, after the formals.
pub fn marshal_args(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    lowered: &LoweredSig,
    decl: Option<&FuncDecl>,
    sig: &FnSig,
    args: &[ExprId],
    loc: SourceLoc,
) -> LowerResult<MarshaledArgs> {
    let abi = cx.abi;
    let arity = sig.arity();

    if args.len() < arity {
        return Err(Diagnostic::fatal(
            loc,
            format!("expected {arity} arguments, found {}", args.len()),
        ));
    }

    if args.len() > arity && sig.variadic == Variadic::None {
        return Err(Diagnostic::fatal(
            loc,
            format!("expected {arity} arguments, found {}", args.len()),
        ));
    }

    let mut formal_vals: Vec<Option<DValue>> = vec![None; arity];
    let right_to_left = decl.map(|d| d.is_array_op).unwrap_or(false);

    if right_to_left {
        for i in (0..arity).rev() {
            formal_vals[i] = Some(fe.lower_expr(cx, args[i])?);
        }
    } else {
        for i in 0..arity {
            formal_vals[i] = Some(fe.lower_expr(cx, args[i])?);
        }
    }

    let mut values = Vec::with_capacity(args.len());
    let mut attrs = Vec::with_capacity(args.len());

    for (i, slot) in lowered.formals.iter().enumerate() {
        let value = formal_vals[i]
            .take()
            .expect("formal argument was evaluated exactly once");

        values.push(place_formal(cx, slot, value, loc)?);
        attrs.push(slot.attrs);
    }

    let mut varargs = Vec::with_capacity(args.len() - arity);

    for &expr in &args[arity..] {
        let ty = fe.ty_of(expr);
        let value = fe.lower_expr(cx, expr)?;
        let byval = abi.pass_by_val(cx.tys, cx.fx.types_mut(), ty);

        let (slot_ty, slot_attrs) = if byval {
            let ir_ty = cx.ir_ty(ty, loc)?;
            let align = cx.fx.types().layout_of(ir_ty).align();

            (Type::ptr(), ArgAttrs::byval(align as u32))
        } else {
            (cx.ir_ty(ty, loc)?, abi.extend_attr(cx.tys, ty))
        };

        varargs.push(VarArgSlot {
            ty,
            value,
            slot_ty,
            attrs: slot_attrs,
            byval,
        });
    }

    abi.rewrite_varargs(cx.tys, cx.fx.types_mut(), &mut varargs);

    let vararg_tys = varargs.iter().map(|s| s.ty).collect();

    for slot in &varargs {
        let value = if slot.byval {
            cx.address_of(slot.value, loc)?
        } else {
            let raw = cx.materialize(slot.value, loc)?;

            coerce(cx, raw, slot.slot_ty, loc)?
        };

        values.push(value);
        attrs.push(slot.attrs);
    }

    // Physical positions reverse; each value keeps its own attributes, so
    // the attribute vectors reverse in lockstep.
    if lowered.reverse_explicit {
        values.reverse();
        attrs.reverse();
    }

    Ok(MarshaledArgs {
        values,
        attrs,
        vararg_tys,
    })
}

fn place_formal(
    cx: &mut LowerCtx<'_, '_>,
    slot: &ArgSlot,
    value: DValue,
    loc: SourceLoc,
) -> LowerResult<Value> {
    match slot.mode {
        PassMode::ByRef => cx.address_of(value, loc),
        PassMode::Lazy => {
            let raw = cx.materialize(value, loc)?;

            coerce(cx, raw, slot.ty, loc)
        }
        PassMode::ByValue => {
            if slot.attrs.contains(ParamAttributes::BYVAL) {
                return cx.address_of(value, loc);
            }

            // The slot expects the aggregate in registers; an in-memory
            // aggregate gets loaded here, the converse mismatch is fixed
            // below by a representation-preserving reinterpretation.
            let raw = cx.materialize(value, loc)?;

            coerce(cx, raw, slot.ty, loc)
        }
    }
}

/// Fixes a residual mismatch between a marshaled value and its slot's
/// declared physical type. The signature's logical types and the physical
/// ABI types are derived independently and only agree up to
/// representation, never identity.
fn coerce(
    cx: &mut LowerCtx<'_, '_>,
    value: Value,
    expected: Type,
    loc: SourceLoc,
) -> LowerResult<Value> {
    let actual = cx.fx.ty(value);

    if actual == expected {
        return Ok(value);
    }

    if expected.is_aggregate() || actual.is_aggregate() {
        // Byte-layout-preserving reinterpretation through memory.
        let addr = cx.fx.append().alloca(actual, loc);

        cx.fx.append().store(value, addr, loc);

        return Ok(cx.fx.append().load(expected, addr, loc));
    }

    let fixed = if expected.is_ptr() && actual.is_int() {
        cx.fx.append().itop(expected, value, loc)
    } else if expected.is_int() && actual.is_ptr() {
        cx.fx.append().ptoi(expected, value, loc)
    } else {
        cx.fx.append().bitcast(expected, value, loc)
    };

    Ok(fixed)
}
