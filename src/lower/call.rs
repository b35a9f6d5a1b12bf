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
use crate::ir::{
    ArgAttrs, AttrSet, CallInst, Func, IndirectCallInst, InstBuilder, InstData, ParamAttributes,
    SigBuilder, SourceLoc, Type, Value,
};
use crate::lower::{
    lower_function_sig, marshal_args, try_lower_intrinsic, ExprId, FrontEnd, LowerCtx, ReturnPlan,
};
use crate::sema::{DValue, FnSig, FuncDecl, Ty, TyData};

/// The runtime entry point dynamic message sends are retargeted to.
const MSG_SEND: &str = "_garnet_msgSend";

/// A resolved callee, as expression lowering hands it over.
pub enum Callee {
    /// A statically known function. Only this variant carries a
    /// declaration (and therefore special-case flags and intrinsic tags).
    Direct {
        /// The resolved declaration.
        decl: FuncDecl,
        /// The function at the module level.
        func: Func,
        /// The object receiver, for method calls.
        this: Option<DValue>,
    },
    /// A closure value: a captured-context pointer paired with a code
    /// pointer.
    Closure(DValue),
    /// A raw function pointer.
    Pointer(DValue),
}

enum Callable {
    Direct(Func),
    Indirect(Value),
}

/// Lowers one function call: implicit prefix, marshaled explicit suffix,
/// the call itself, and reconstruction of a logical result value.
///
/// `result_ty` is the type the *caller* expects of the result, which can
/// differ from the callee's declared return type by qualifiers or by a
/// known front-end naming artifact; the difference is resolved by
/// [`repaint`]. `sret_storage` lets the caller donate storage for a
/// hidden-pointer return instead of having fresh storage allocated.
pub fn lower_call(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    result_ty: Ty,
    callee: Callee,
    args: &[ExprId],
    sret_storage: Option<Value>,
) -> LowerResult<DValue> {
    // Primitive operations never reach the call machinery.
    if let Callee::Direct { decl, .. } = &callee {
        if let Some(result) = try_lower_intrinsic(cx, fe, loc, decl, args, result_ty) {
            return result;
        }
    }

    log::trace!("lowering call with {} arguments at {loc}", args.len());

    let (sig, decl, mut callable, context, receiver) = resolve_callee(cx, callee, loc)?;

    // Dynamic message sends go through the runtime dispatcher with the
    // selector as an extra implicit argument.
    let mut selector = None;

    if let Some(name) = decl.as_ref().and_then(|d| d.selector.clone()) {
        selector = Some(fe.selector_ref(cx, &name)?);
        callable = Callable::Direct(fe.runtime_func(cx, MSG_SEND)?);
    }

    let mut lowered = lower_function_sig(cx, decl.as_ref(), &sig, loc)?;

    lowered.needs_context = context.is_some();

    let sret_ptr = match lowered.sret_ty {
        Some(pointee) => Some(match sret_storage {
            Some(storage) => storage,
            None => cx.fx.append().alloca(pointee, loc),
        }),
        None => None,
    };

    let typed_desc = match lowered.typed_varargs {
        true => Some(build_vararg_descriptor(cx, fe, &sig, args, loc)?),
        false => None,
    };

    let marshaled = marshal_args(cx, fe, &lowered, decl.as_ref(), &sig, args, loc)?;

    // Assemble the final physical argument list. Attribute slot 0 is the
    // return; argument `i` sits at attribute slot `i + 1`.
    let mut phys = Vec::with_capacity(lowered.implicit_len() + marshaled.values.len());
    let mut attrs = AttrSet::new();

    attrs.add(0, lowered.ret_attrs);

    let sret_attrs = ArgAttrs::with(ParamAttributes::SRET | ParamAttributes::NOALIAS);
    let context_attrs = match decl.as_ref() {
        Some(d) if d.needs_nest => ArgAttrs::with(ParamAttributes::NEST),
        _ => ArgAttrs::none(),
    };

    if lowered.this_before_sret {
        if let Some(c) = context {
            push_arg(&mut phys, &mut attrs, c, context_attrs);
        }

        if let Some(p) = sret_ptr {
            push_arg(&mut phys, &mut attrs, p, sret_attrs);
        }
    } else {
        if let Some(p) = sret_ptr {
            push_arg(&mut phys, &mut attrs, p, sret_attrs);
        }

        if let Some(c) = context {
            push_arg(&mut phys, &mut attrs, c, context_attrs);
        }
    }

    if let Some(s) = selector {
        push_arg(&mut phys, &mut attrs, s, ArgAttrs::none());
    }

    if let Some(d) = typed_desc {
        push_arg(&mut phys, &mut attrs, d, ArgAttrs::none());
    }

    debug_assert_eq!(phys.len(), lowered.implicit_len());

    for (&value, &attr) in marshaled.values.iter().zip(marshaled.attrs.iter()) {
        push_arg(&mut phys, &mut attrs, value, attr);
    }

    // Recognized native builtins carry a fixed attribute table that wins
    // over whatever was computed here.
    let attrs = match decl.as_ref().and_then(|d| d.builtin_attrs.clone()) {
        Some(fixed) => fixed,
        None => attrs,
    };

    let mut builder = SigBuilder::new()
        .abi(lowered.conv)
        .ret(lowered.ret)
        .ret_attrs(lowered.ret_attrs)
        .vararg(lowered.vararg);

    for (i, &value) in phys.iter().enumerate() {
        builder = builder.param_with(cx.fx.ty(value), attrs.get(i + 1));
    }

    let sig_ref = cx.fx.import_signature(builder.build());

    let data = match callable {
        Callable::Direct(func) => InstData::Call(
            CallInst::new(lowered.ret, sig_ref, func, &phys)
                .with_conv(lowered.conv)
                .with_attrs(attrs)
                .with_unwind(cx.eh_scope),
        ),
        Callable::Indirect(code) => InstData::IndirectCall(
            IndirectCallInst::new(lowered.ret, sig_ref, code, &phys)
                .with_conv(lowered.conv)
                .with_attrs(attrs)
                .with_unwind(cx.eh_scope),
        ),
    };

    let (_, raw) = cx.fx.append().build(data, loc);

    // A struct constructor delivers its result through its receiver; the
    // receiver location *is* the result, independent of anything the call
    // produced, so cleanup bookkeeping around the call never sees a
    // second copy of the value.
    if let Some(d) = decl.as_ref() {
        if d.is_struct_ctor {
            return receiver
                .ok_or_else(|| Diagnostic::fatal(loc, "constructor call without a receiver"));
        }
    }

    let value = match lowered.plan {
        ReturnPlan::Sret => {
            let addr = sret_ptr.expect("sret plan always computes a hidden pointer");

            DValue::lval(sig.ret, addr)
        }
        ReturnPlan::ByRef => {
            let addr = raw.expect("reference-qualified return produces an address");

            DValue::lval(sig.ret, addr)
        }
        ReturnPlan::Direct => match raw {
            Some(raw) => {
                let abi = cx.abi;

                abi.reconstruct_return(cx, raw, sig.ret, loc)?
            }
            None => DValue::Void(sig.ret),
        },
    };

    repaint(cx, loc, value, result_ty)
}

fn push_arg(phys: &mut Vec<Value>, attrs: &mut AttrSet, value: Value, attr: ArgAttrs) {
    attrs.add(phys.len() + 1, attr);
    phys.push(value);
}

type ResolvedCallee = (
    FnSig,
    Option<FuncDecl>,
    Callable,
    Option<Value>,
    Option<DValue>,
);

fn resolve_callee(
    cx: &mut LowerCtx<'_, '_>,
    callee: Callee,
    loc: SourceLoc,
) -> LowerResult<ResolvedCallee> {
    match callee {
        Callee::Direct { decl, func, this } => {
            let context = direct_context(cx, &decl, this, loc)?;

            Ok((sig_of(&decl), Some(decl), Callable::Direct(func), context, this))
        }
        Callee::Closure(value) => {
            let sig = cx
                .tys
                .signature_of(value.ty())
                .cloned()
                .ok_or_else(|| Diagnostic::fatal(loc, "closure value has no function signature"))?;

            let (context, code) = match value {
                // In memory, the pair is `{ context, code }`.
                DValue::Lval { ty, addr } => {
                    let pair_ty = cx.ir_ty(ty, loc)?;
                    let context_slot = cx.fx.append().elemptr(pair_ty, addr, 0, loc);
                    let context = cx.fx.append().load(Type::ptr(), context_slot, loc);
                    let code_slot = cx.fx.append().elemptr(pair_ty, addr, 1, loc);
                    let code = cx.fx.append().load(Type::ptr(), code_slot, loc);

                    (context, code)
                }
                DValue::Rval { val, .. } => {
                    let context = cx.fx.append().extract(Type::ptr(), val, 0, loc);
                    let code = cx.fx.append().extract(Type::ptr(), val, 1, loc);

                    (context, code)
                }
                DValue::Void(_) => {
                    return Err(Diagnostic::fatal(loc, "cannot call a void value"))
                }
            };

            Ok((sig, None, Callable::Indirect(code), Some(context), None))
        }
        Callee::Pointer(value) => {
            let sig = cx
                .tys
                .signature_of(value.ty())
                .cloned()
                .ok_or_else(|| Diagnostic::fatal(loc, "called value is not a function"))?;
            let code = cx.materialize(value, loc)?;

            Ok((sig, None, Callable::Indirect(code), None, None))
        }
    }
}

fn sig_of(decl: &FuncDecl) -> FnSig {
    decl.sig.clone()
}

/// Resolves the context/this implicit argument of a direct call by case
/// analysis: the receiver, the enclosing receiver (contracts), or the
/// enclosing static chain (nested functions).
fn direct_context(
    cx: &mut LowerCtx<'_, '_>,
    decl: &FuncDecl,
    this: Option<DValue>,
    loc: SourceLoc,
) -> LowerResult<Option<Value>> {
    if decl.has_this {
        if let Some(receiver) = this {
            return Ok(Some(receiver_value(cx, receiver, loc)?));
        }

        // Contracts run against the frame of the function they annotate
        // and inherit its receiver.
        if decl.is_contract {
            if let Some(receiver) = cx.receiver {
                return Ok(Some(receiver_value(cx, receiver, loc)?));
            }
        }

        return Err(Diagnostic::fatal(
            loc,
            format!("call to '{}' requires a receiver, but none is available", decl.name),
        ));
    }

    if decl.needs_nest {
        return Ok(Some(match cx.nest_context {
            Some(chain) => chain,
            // The chain is only known indirectly; the callee cannot
            // actually use it.
            None => cx.fx.append().undef(Type::ptr(), loc),
        }));
    }

    Ok(None)
}

/// The physical form of a receiver: in-memory aggregates pass their
/// address, object references pass the reference itself.
fn receiver_value(cx: &mut LowerCtx<'_, '_>, value: DValue, loc: SourceLoc) -> LowerResult<Value> {
    if cx.tys.in_memory_only(value.ty()) {
        cx.address_of(value, loc)
    } else {
        cx.materialize(value, loc)
    }
}

/// Builds the typed-variadic descriptor: a `{ len, ptr }` view of a stack
/// array holding one runtime type descriptor per variadic argument, so
/// the callee can inspect its tail.
fn build_vararg_descriptor(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    sig: &FnSig,
    args: &[ExprId],
    loc: SourceLoc,
) -> LowerResult<Value> {
    let tail = args.get(sig.arity()..).unwrap_or(&[]);
    let word = cx.fx.types().ptr_sized_int();
    let array_ty = Type::array(cx.fx.types_mut(), Type::ptr(), tail.len() as u64);
    let array = cx.fx.append().alloca(array_ty, loc);

    for (i, &expr) in tail.iter().enumerate() {
        let ty = fe.ty_of(expr);
        let info = fe.typeinfo_of(cx, ty)?;
        let index = cx.fx.append().iconst(word, i as u64, loc);
        let slot = cx.fx.append().offset(Type::ptr(), array, index, loc);

        cx.fx.append().store(info, slot, loc);
    }

    let slice_ty = Type::structure(cx.fx.types_mut(), &[word, Type::ptr()]);
    let len = cx.fx.append().iconst(word, tail.len() as u64, loc);
    let empty = cx.fx.append().undef(slice_ty, loc);
    let with_len = cx.fx.append().insert(empty, len, 0, loc);

    Ok(cx.fx.append().insert(with_len, array, 1, loc))
}

enum RepaintKind {
    Identity,
    Reinterpret,
    Positional,
    MaterializeStruct,
    Unhandled,
}

/// Reinterprets a call result's representation when the declared return
/// type and the caller-expected type differ.
///
/// The two can legitimately differ only by qualifiers or by a front-end
/// naming artifact where structurally identical types carry different
/// names across translation stages, so this never converts, it only
/// relabels (and, for one struct-vs-map corner, re-materializes to
/// normalize indirection depth). Unhandled categories are assumed
/// representation-compatible and logged.
pub fn repaint(
    cx: &mut LowerCtx<'_, '_>,
    loc: SourceLoc,
    value: DValue,
    to: Ty,
) -> LowerResult<DValue> {
    let from = cx.tys.strip_quals(value.ty());
    let target = cx.tys.strip_quals(to);

    let kind = if from == target {
        RepaintKind::Identity
    } else {
        match cx.tys.data(target) {
            TyData::Slice(_)
            | TyData::Ptr(_)
            | TyData::Ref(_)
            | TyData::Class { .. }
            | TyData::Map(..) => RepaintKind::Reinterpret,
            TyData::Array(..) => RepaintKind::Positional,
            TyData::Struct { .. }
                if matches!(cx.tys.data(from), TyData::Map(..)) && !value.is_lval() =>
            {
                RepaintKind::MaterializeStruct
            }
            _ => RepaintKind::Unhandled,
        }
    };

    match kind {
        RepaintKind::Identity | RepaintKind::Reinterpret => Ok(value.with_ty(to)),
        // Fixed-size arrays are positional either way; nothing to do.
        RepaintKind::Positional => Ok(value),
        RepaintKind::MaterializeStruct => {
            // A struct that is interchangeable with a map: wrap the raw
            // map reference into the struct and force it into memory so
            // both spellings have the same indirection depth.
            let struct_ty = cx.ir_ty(target, loc)?;
            let raw = cx.materialize(value, loc)?;
            let empty = cx.fx.append().undef(struct_ty, loc);
            let wrapped = cx.fx.append().insert(empty, raw, 0, loc);
            let addr = cx.fx.append().alloca(struct_ty, loc);

            cx.fx.append().store(wrapped, addr, loc);

            Ok(DValue::lval(to, addr))
        }
        RepaintKind::Unhandled => {
            log::warn!("ignoring repaint of return value at {loc}");

            Ok(value.with_ty(to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{CallConv, FuncBuilder, Module, ValueDef};
    use crate::lower::testutil::{first_call, first_indirect, PrefixAbi, TestFrontEnd};
    use crate::lower::SysVAbi;
    use crate::sema::{Param, TyPool, Variadic};

    fn const_of(fx: &FuncBuilder<'_>, value: Value) -> u64 {
        match fx.dfg().value_def(value) {
            ValueDef::Inst(inst) => match fx.dfg().inst_data(inst) {
                InstData::IConst(c) => c.value(),
                other => panic!("expected an iconst, found {other:?}"),
            },
            def => panic!("expected an instruction result, found {def:?}"),
        }
    }

    fn big_struct(tys: &mut TyPool) -> Ty {
        let i64t = tys.int(64, true);

        tys.intern(TyData::Struct {
            name: "big".into(),
            fields: vec![i64t, i64t, i64t],
        })
    }

    #[test]
    fn physical_slot_count_matches_arity() {
        let mut tys = TyPool::new();
        let i32t = tys.int(32, true);
        let void = tys.void();
        let sig = FnSig {
            params: vec![Param::by_value(i32t), Param::by_value(i32t)],
            ret: void,
            ret_ref: false,
            conv: CallConv::C,
            variadic: Variadic::None,
        };
        let decl = FuncDecl::new("callee", sig);

        let mut module = Module::new("t", 64);
        let callee = module.declare_function("callee", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let a = fe.int(i32t, 1);
        let b = fe.int(i32t, 2);

        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);
        let result = lower_call(
            &mut cx,
            &mut fe,
            SourceLoc::default(),
            void,
            Callee::Direct {
                decl,
                func: callee,
                this: None,
            },
            &[a, b],
            None,
        )
        .unwrap();

        assert!(matches!(result, DValue::Void(_)));
        assert_eq!(first_call(fx.dfg()).args().len(), 2);
    }

    #[test]
    fn sret_returns_addressable_result_backed_by_the_hidden_pointer() {
        let mut tys = TyPool::new();
        let big = big_struct(&mut tys);
        let sig = FnSig {
            params: vec![],
            ret: big,
            ret_ref: false,
            conv: CallConv::C,
            variadic: Variadic::None,
        };
        let decl = FuncDecl::new("produce", sig);

        let mut module = Module::new("t", 64);
        let callee = module.declare_function("produce", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);

        let result = lower_call(
            &mut cx,
            &mut fe,
            SourceLoc::default(),
            big,
            Callee::Direct {
                decl,
                func: callee,
                this: None,
            },
            &[],
            None,
        )
        .unwrap();

        let call = first_call(fx.dfg());

        assert_eq!(call.args().len(), 1);
        assert_eq!(result.addr(), Some(call.args()[0]));
        assert!(call
            .attrs()
            .get(1)
            .contains(ParamAttributes::SRET | ParamAttributes::NOALIAS));
    }

    #[test]
    fn sret_reuses_caller_supplied_storage() {
        let mut tys = TyPool::new();
        let big = big_struct(&mut tys);
        let sig = FnSig {
            params: vec![],
            ret: big,
            ret_ref: false,
            conv: CallConv::C,
            variadic: Variadic::None,
        };
        let decl = FuncDecl::new("produce", sig);

        let mut module = Module::new("t", 64);
        let callee = module.declare_function("produce", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);
        let loc = SourceLoc::default();
        let storage_ty = cx.ir_ty(big, loc).unwrap();
        let storage = cx.fx.append().alloca(storage_ty, loc);

        let result = lower_call(
            &mut cx,
            &mut fe,
            loc,
            big,
            Callee::Direct {
                decl,
                func: callee,
                this: None,
            },
            &[],
            Some(storage),
        )
        .unwrap();

        assert_eq!(result.addr(), Some(storage));
        assert_eq!(first_call(fx.dfg()).args()[0], storage);
    }

    #[test]
    fn prefix_order_follows_the_abi() {
        for this_first in [false, true] {
            let mut tys = TyPool::new();
            let big = big_struct(&mut tys);
            let class = tys.intern(TyData::Class {
                name: "widget".into(),
            });
            let sig = FnSig {
                params: vec![],
                ret: big,
                ret_ref: false,
                conv: CallConv::C,
                variadic: Variadic::None,
            };
            let decl = FuncDecl {
                has_this: true,
                ..FuncDecl::new("method", sig)
            };

            let mut module = Module::new("t", 64);
            let callee = module.declare_function("method", SigBuilder::new().build());
            let caller = module.declare_function("caller", SigBuilder::new().build());
            let mut fx = FuncBuilder::new(&mut module, caller);
            let bb = fx.create_block();
            fx.switch_to(bb);

            let mut fe = TestFrontEnd::new();
            let abi = PrefixAbi { this_first };
            let mut cx = LowerCtx::new(&mut fx, &abi, &mut tys);
            let loc = SourceLoc::default();
            let this_ptr = cx.fx.append().null(loc);

            lower_call(
                &mut cx,
                &mut fe,
                loc,
                big,
                Callee::Direct {
                    decl,
                    func: callee,
                    this: Some(DValue::rval(class, this_ptr)),
                },
                &[],
                None,
            )
            .unwrap();

            let call = first_call(fx.dfg());

            assert_eq!(call.args().len(), 2);

            if this_first {
                assert_eq!(call.args()[0], this_ptr);
                assert!(call.attrs().get(2).contains(ParamAttributes::SRET));
            } else {
                assert_eq!(call.args()[1], this_ptr);
                assert!(call.attrs().get(1).contains(ParamAttributes::SRET));
            }
        }
    }

    #[test]
    fn garnet_convention_reverses_the_explicit_suffix() {
        let mut tys = TyPool::new();
        let i32t = tys.int(32, true);
        let void = tys.void();
        let sig = FnSig::new(
            vec![Param::by_value(i32t), Param::by_value(i32t)],
            void,
        );
        let decl = FuncDecl::new("callee", sig);

        let mut module = Module::new("t", 64);
        let callee = module.declare_function("callee", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let a = fe.int(i32t, 1);
        let b = fe.int(i32t, 2);

        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);

        lower_call(
            &mut cx,
            &mut fe,
            SourceLoc::default(),
            void,
            Callee::Direct {
                decl,
                func: callee,
                this: None,
            },
            &[a, b],
            None,
        )
        .unwrap();

        // Evaluation stays left-to-right; only physical positions flip.
        assert_eq!(fe.order, vec![a, b]);

        let call = first_call(fx.dfg());

        assert_eq!(const_of(&fx, call.args()[0]), 2);
        assert_eq!(const_of(&fx, call.args()[1]), 1);
    }

    #[test]
    fn array_ops_evaluate_right_to_left_without_moving_slots() {
        let mut tys = TyPool::new();
        let i32t = tys.int(32, true);
        let void = tys.void();
        let sig = FnSig {
            params: vec![Param::by_value(i32t), Param::by_value(i32t)],
            ret: void,
            ret_ref: false,
            conv: CallConv::C,
            variadic: Variadic::None,
        };
        let decl = FuncDecl {
            is_array_op: true,
            ..FuncDecl::new("_arrayop", sig)
        };

        let mut module = Module::new("t", 64);
        let callee = module.declare_function("_arrayop", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let a = fe.int(i32t, 1);
        let b = fe.int(i32t, 2);

        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);

        lower_call(
            &mut cx,
            &mut fe,
            SourceLoc::default(),
            void,
            Callee::Direct {
                decl,
                func: callee,
                this: None,
            },
            &[a, b],
            None,
        )
        .unwrap();

        assert_eq!(fe.order, vec![b, a]);

        let call = first_call(fx.dfg());

        assert_eq!(const_of(&fx, call.args()[0]), 1);
        assert_eq!(const_of(&fx, call.args()[1]), 2);
    }

    #[test]
    fn typed_variadic_calls_carry_one_descriptor() {
        for (variadic, extra_slots) in [(Variadic::C, 0), (Variadic::Typed, 1)] {
            let mut tys = TyPool::new();
            let i32t = tys.int(32, true);
            let i64t = tys.int(64, true);
            let void = tys.void();
            let sig = FnSig {
                params: vec![Param::by_value(i32t), Param::by_value(i32t)],
                ret: void,
                ret_ref: false,
                conv: CallConv::C,
                variadic,
            };
            let decl = FuncDecl::new("printfish", sig.clone());

            let mut module = Module::new("t", 64);
            let callee = module.declare_function("printfish", SigBuilder::new().build());
            let caller = module.declare_function("caller", SigBuilder::new().build());
            let mut fx = FuncBuilder::new(&mut module, caller);
            let bb = fx.create_block();
            fx.switch_to(bb);

            let mut fe = TestFrontEnd::new();
            let a = fe.int(i32t, 1);
            let b = fe.int(i32t, 2);
            let c = fe.int(i64t, 3);

            let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);

            lower_call(
                &mut cx,
                &mut fe,
                SourceLoc::default(),
                void,
                Callee::Direct {
                    decl: decl.clone(),
                    func: callee,
                    this: None,
                },
                &[a, b, c],
                None,
            )
            .unwrap();

            let call = first_call(fx.dfg());

            // 2 formals + 1 variadic + the descriptor (typed only).
            assert_eq!(call.args().len(), 3 + extra_slots);
        }
    }

    #[test]
    fn exactly_one_descriptor_per_extra_argument_group() {
        let mut tys = TyPool::new();
        let i32t = tys.int(32, true);
        let i64t = tys.int(64, true);
        let void = tys.void();
        let sig = FnSig {
            params: vec![Param::by_value(i32t), Param::by_value(i32t)],
            ret: void,
            ret_ref: false,
            conv: CallConv::C,
            variadic: Variadic::Typed,
        };
        let decl = FuncDecl::new("printfish", sig.clone());

        let mut module = Module::new("t", 64);
        module.declare_function("printfish", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let a = fe.int(i32t, 1);
        let b = fe.int(i32t, 2);
        let c = fe.int(i64t, 3);

        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);
        let loc = SourceLoc::default();
        let lowered = lower_function_sig(&mut cx, Some(&decl), &sig, loc).unwrap();
        let marshaled =
            marshal_args(&mut cx, &mut fe, &lowered, Some(&decl), &sig, &[a, b, c], loc).unwrap();

        assert_eq!(marshaled.vararg_tys, vec![i64t]);
        assert_eq!(marshaled.values.len(), 3);
    }

    #[test]
    fn closure_calls_extract_code_and_context() {
        let mut tys = TyPool::new();
        let void = tys.void();
        let closure_ty = tys.intern(TyData::Closure(FnSig::new(vec![], void)));

        let mut module = Module::new("t", 64);
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);
        let loc = SourceLoc::default();

        let pair_ty = cx.ir_ty(closure_ty, loc).unwrap();
        let context = cx.fx.append().null(loc);
        let code = cx.fx.append().null(loc);
        let empty = cx.fx.append().undef(pair_ty, loc);
        let with_context = cx.fx.append().insert(empty, context, 0, loc);
        let pair = cx.fx.append().insert(with_context, code, 1, loc);

        lower_call(
            &mut cx,
            &mut fe,
            loc,
            void,
            Callee::Closure(DValue::rval(closure_ty, pair)),
            &[],
            None,
        )
        .unwrap();

        let call = first_indirect(fx.dfg());
        let extracts: Vec<_> = fx
            .dfg()
            .insts()
            .filter_map(|(inst, data)| match data {
                InstData::Extract(e) => Some((fx.dfg().inst_result(inst).unwrap(), e.index())),
                _ => None,
            })
            .collect();

        assert_eq!(extracts.len(), 2);
        assert_eq!(call.args().len(), 1);

        // Field 0 is the captured context, field 1 the code pointer.
        assert_eq!(call.args()[0], extracts[0].0);
        assert_eq!(extracts[0].1, 0);
        assert_eq!(call.callee(), extracts[1].0);
        assert_eq!(extracts[1].1, 1);
    }

    #[test]
    fn struct_ctor_returns_its_receiver() {
        let mut tys = TyPool::new();
        let i64t = tys.int(64, true);
        let small = tys.intern(TyData::Struct {
            name: "point".into(),
            fields: vec![i64t],
        });
        let sig = FnSig {
            params: vec![],
            ret: small,
            ret_ref: false,
            conv: CallConv::C,
            variadic: Variadic::None,
        };
        let decl = FuncDecl {
            has_this: true,
            is_struct_ctor: true,
            ..FuncDecl::new("point_ctor", sig)
        };

        let mut module = Module::new("t", 64);
        let callee = module.declare_function("point_ctor", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);
        let loc = SourceLoc::default();

        let storage_ty = cx.ir_ty(small, loc).unwrap();
        let storage = cx.fx.append().alloca(storage_ty, loc);
        let receiver = DValue::lval(small, storage);

        let result = lower_call(
            &mut cx,
            &mut fe,
            loc,
            small,
            Callee::Direct {
                decl,
                func: callee,
                this: Some(receiver),
            },
            &[],
            None,
        )
        .unwrap();

        assert_eq!(result, receiver);
        assert_eq!(first_call(fx.dfg()).args()[0], storage);
    }

    #[test]
    fn missing_receiver_is_fatal() {
        let mut tys = TyPool::new();
        let void = tys.void();
        let decl = FuncDecl {
            has_this: true,
            ..FuncDecl::new("method", FnSig::new(vec![], void))
        };

        let mut module = Module::new("t", 64);
        let callee = module.declare_function("method", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);

        let result = lower_call(
            &mut cx,
            &mut fe,
            SourceLoc::default(),
            void,
            Callee::Direct {
                decl,
                func: callee,
                this: None,
            },
            &[],
            None,
        );

        assert!(result.is_err());
    }

    #[test]
    fn exception_scopes_make_calls_invoke_style() {
        let mut tys = TyPool::new();
        let void = tys.void();
        let decl = FuncDecl::new("may_throw", FnSig::new(vec![], void));

        let mut module = Module::new("t", 64);
        let callee = module.declare_function("may_throw", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);
        let landing = fx.create_block();

        let mut fe = TestFrontEnd::new();
        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);

        cx.eh_scope = Some(landing);

        lower_call(
            &mut cx,
            &mut fe,
            SourceLoc::default(),
            void,
            Callee::Direct {
                decl,
                func: callee,
                this: None,
            },
            &[],
            None,
        )
        .unwrap();

        assert_eq!(first_call(fx.dfg()).unwind(), Some(landing));
    }

    #[test]
    fn builtin_attribute_tables_override_computed_attributes() {
        let mut tys = TyPool::new();
        let i8t = tys.int(8, true);
        let void = tys.void();
        let sig = FnSig {
            params: vec![Param::by_value(i8t)],
            ret: void,
            ret_ref: false,
            conv: CallConv::C,
            variadic: Variadic::None,
        };

        let mut fixed = AttrSet::new();
        fixed.add(1, ArgAttrs::with(ParamAttributes::NOALIAS));

        let decl = FuncDecl {
            builtin_attrs: Some(fixed),
            ..FuncDecl::new("builtin", sig)
        };

        let mut module = Module::new("t", 64);
        let callee = module.declare_function("builtin", SigBuilder::new().build());
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut fe = TestFrontEnd::new();
        let a = fe.int(i8t, 1);

        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);

        lower_call(
            &mut cx,
            &mut fe,
            SourceLoc::default(),
            void,
            Callee::Direct {
                decl,
                func: callee,
                this: None,
            },
            &[a],
            None,
        )
        .unwrap();

        let attrs = first_call(fx.dfg()).attrs();

        // The fixed table wins; the computed `sext` never lands.
        assert!(attrs.get(1).contains(ParamAttributes::NOALIAS));
        assert!(!attrs.get(1).contains(ParamAttributes::SEXT));
    }

    #[test]
    fn repaint_identity_is_a_noop() {
        let mut tys = TyPool::new();
        let i32t = tys.int(32, true);

        let mut module = Module::new("t", 64);
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);
        let loc = SourceLoc::default();
        let raw = cx.fx.append().iconst(Type::int(32), 7, loc);
        let value = DValue::rval(i32t, raw);

        let painted = repaint(&mut cx, loc, value, i32t).unwrap();

        assert_eq!(painted, value);
    }

    #[test]
    fn repaint_relabels_pointer_categories_in_place() {
        let mut tys = TyPool::new();
        let first = tys.intern(TyData::Class {
            name: "list_stage1".into(),
        });
        let second = tys.intern(TyData::Class {
            name: "list_stage2".into(),
        });

        let mut module = Module::new("t", 64);
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);
        let loc = SourceLoc::default();
        let addr = cx.fx.append().alloca(Type::ptr(), loc);
        let before = cx.fx.dfg().num_insts();

        let painted = repaint(&mut cx, loc, DValue::lval(first, addr), second).unwrap();

        assert_eq!(painted, DValue::lval(second, addr));
        assert_eq!(cx.fx.dfg().num_insts(), before);
    }

    #[test]
    fn repaint_materializes_the_struct_map_corner() {
        let mut tys = TyPool::new();
        let i32t = tys.int(32, true);
        let map = tys.intern(TyData::Map(i32t, i32t));
        let wrapper = tys.intern(TyData::Struct {
            name: "int_map".into(),
            fields: vec![map],
        });

        let mut module = Module::new("t", 64);
        let caller = module.declare_function("caller", SigBuilder::new().build());
        let mut fx = FuncBuilder::new(&mut module, caller);
        let bb = fx.create_block();
        fx.switch_to(bb);

        let mut cx = LowerCtx::new(&mut fx, &SysVAbi, &mut tys);
        let loc = SourceLoc::default();
        let raw = cx.fx.append().null(loc);

        let painted = repaint(&mut cx, loc, DValue::rval(map, raw), wrapper).unwrap();

        assert!(painted.is_lval());
        assert_eq!(painted.ty(), wrapper);
    }
}
