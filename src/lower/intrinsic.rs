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
use crate::ir::{AtomicOrdering, AtomicRmwOp, ICmpOp, InstBuilder, SourceLoc, Type, Value};
use crate::lower::{ExprId, FrontEnd, LowerCtx};
use crate::sema::{DValue, FuncDecl, Intrinsic, Ty};

/// Intercepts a call to a declaration carrying a primitive-operation tag,
/// lowering it directly instead of through the call machinery. Returns
/// `None` when the declaration carries no tag; dispatch never looks at
/// the declaration's name.
pub fn try_lower_intrinsic(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    decl: &FuncDecl,
    args: &[ExprId],
    result_ty: Ty,
) -> Option<LowerResult<DValue>> {
    let tag = decl.intrinsic?;

    Some(lower_intrinsic(cx, fe, loc, decl, tag, args, result_ty))
}

fn lower_intrinsic(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    decl: &FuncDecl,
    tag: Intrinsic,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    match tag {
        Intrinsic::VaStart => lower_va_start(cx, fe, loc, args, result_ty),
        Intrinsic::VaCopy => lower_va_copy(cx, fe, loc, args, result_ty),
        Intrinsic::VaArg => lower_va_arg(cx, fe, loc, args, result_ty),
        Intrinsic::Alloca => lower_alloca(cx, fe, loc, args, result_ty),
        Intrinsic::Fence => lower_fence(cx, fe, loc, args, result_ty),
        Intrinsic::AtomicStore => lower_atomic_store(cx, fe, loc, args, result_ty),
        Intrinsic::AtomicLoad => lower_atomic_load(cx, fe, loc, args, result_ty),
        Intrinsic::AtomicCmpXchg => lower_cmpxchg(cx, fe, loc, args, result_ty),
        Intrinsic::AtomicRmw => lower_atomic_rmw(cx, fe, loc, decl, args, result_ty),
        Intrinsic::BitTest => lower_bit_test(cx, fe, loc, Mutation::None, args, result_ty),
        Intrinsic::BitTestAndReset => lower_bit_test(cx, fe, loc, Mutation::Reset, args, result_ty),
        Intrinsic::BitTestAndComplement => {
            lower_bit_test(cx, fe, loc, Mutation::Complement, args, result_ty)
        }
        Intrinsic::BitTestAndSet => lower_bit_test(cx, fe, loc, Mutation::Set, args, result_ty),
        Intrinsic::VolatileLoad => lower_volatile_load(cx, fe, loc, args, result_ty),
        Intrinsic::VolatileStore => lower_volatile_store(cx, fe, loc, args, result_ty),
    }
}

fn expect_arity(args: &[ExprId], n: usize, what: &str, loc: SourceLoc) -> LowerResult<()> {
    if args.len() != n {
        return Err(Diagnostic::fatal(
            loc,
            format!("{what} expects {n} arguments, found {}", args.len()),
        ));
    }

    Ok(())
}

fn ordering_of(fe: &dyn FrontEnd, expr: ExprId, loc: SourceLoc) -> LowerResult<AtomicOrdering> {
    fe.const_int(expr)
        .and_then(|raw| AtomicOrdering::from_u64(raw as u64))
        .ok_or_else(|| Diagnostic::fatal(loc, "atomic ordering must be a valid constant"))
}

/// The same-width integer representation an atomic operation runs at for
/// a given logical type. Integers participate directly; structs and
/// fixed-size arrays are accepted via reinterpretation when their size is
/// a power of two in `{8, 16, 32, 64, 128}` bits. Any other type (floats,
/// pointers) is a fatal error.
fn atomic_int_repr(
    cx: &mut LowerCtx<'_, '_>,
    ty: Ty,
    loc: SourceLoc,
) -> LowerResult<(Type, bool)> {
    let ir_ty = cx.ir_ty(ty, loc)?;

    if ir_ty.is_int() {
        return Ok((ir_ty, false));
    }

    if !cx.tys.in_memory_only(ty) {
        return Err(Diagnostic::fatal(
            loc,
            "atomic operations require an integer or sized aggregate type",
        ));
    }

    let bits = cx.fx.types().layout_of(ir_ty).bit_size();

    match bits {
        8 | 16 | 32 | 64 | 128 => Ok((Type::int(bits as u32), true)),
        _ => Err(Diagnostic::fatal(
            loc,
            format!("cannot lower atomic operation on a type of {bits} bits"),
        )),
    }
}

/// Re-expresses a logical value as the integer an atomic instruction
/// operates on. Addressable values load the integer straight through
/// their address; materialized aggregates go through memory.
fn as_atomic_int(
    cx: &mut LowerCtx<'_, '_>,
    value: DValue,
    int_ty: Type,
    loc: SourceLoc,
) -> LowerResult<Value> {
    if let DValue::Lval { addr, .. } = value {
        return Ok(cx.fx.append().load(int_ty, addr, loc));
    }

    let raw = cx.materialize(value, loc)?;
    let actual = cx.fx.ty(raw);

    if actual == int_ty {
        return Ok(raw);
    }

    let addr = cx.fx.append().alloca(actual, loc);

    cx.fx.append().store(raw, addr, loc);

    Ok(cx.fx.append().load(int_ty, addr, loc))
}

/// Reconstructs a value of the original logical type from the integer an
/// atomic instruction produced, materializing to storage when the
/// representations differ.
fn from_atomic_int(
    cx: &mut LowerCtx<'_, '_>,
    raw: Value,
    ty: Ty,
    punned: bool,
    loc: SourceLoc,
) -> LowerResult<DValue> {
    if !punned {
        return Ok(DValue::rval(ty, raw));
    }

    let int_ty = cx.fx.ty(raw);
    let addr = cx.fx.append().alloca(int_ty, loc);

    cx.fx.append().store(raw, addr, loc);

    Ok(DValue::lval(ty, addr))
}

fn lower_va_start(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    // The optional second operand is the C-style "last named parameter",
    // which carries no information the signature doesn't.
    if args.is_empty() || args.len() > 2 {
        return Err(Diagnostic::fatal(
            loc,
            format!("va_start expects 1 (or 2) arguments, found {}", args.len()),
        ));
    }

    let target = fe.lower_expr(cx, args[0])?;
    let target = cx.address_of(target, loc)?;

    match cx.arg_cursor {
        // The enclosing function already owns an implicit cursor; copy it.
        Some(cursor) => {
            cx.fx.append().memcpy(Type::ptr(), target, cursor, loc);
        }
        None => {
            let abi = cx.abi;

            abi.prepare_va_start(cx, target, loc)?;
        }
    }

    Ok(DValue::Void(result_ty))
}

fn lower_va_copy(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 2, "va_copy", loc)?;

    let dst = fe.lower_expr(cx, args[0])?;
    let dst = cx.address_of(dst, loc)?;
    let src = fe.lower_expr(cx, args[1])?;
    let src = cx.address_of(src, loc)?;
    let abi = cx.abi;

    abi.va_copy(cx, dst, src, loc)?;

    Ok(DValue::Void(result_ty))
}

fn lower_va_arg(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 1, "va_arg", loc)?;

    if cx.tys.in_memory_only(result_ty) {
        return Err(Diagnostic::fatal(
            loc,
            "va_arg cannot produce struct or array values",
        ));
    }

    let list = fe.lower_expr(cx, args[0])?;
    let list = cx.address_of(list, loc)?;
    let ty = cx.ir_ty(result_ty, loc)?;
    let abi = cx.abi;
    let fetched = abi.prepare_va_arg(cx, list, ty, loc)?;

    Ok(DValue::rval(result_ty, fetched))
}

fn lower_alloca(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 1, "alloca", loc)?;

    let signed = cx.tys.is_signed_int(fe.ty_of(args[0]));
    let size = fe.lower_expr(cx, args[0])?;
    let mut size = cx.materialize(size, loc)?;

    // The size operand runs at a fixed 32-bit width.
    let size_ty = cx.fx.ty(size);

    if !size_ty.is_int() {
        return Err(Diagnostic::fatal(loc, "alloca size must be an integer"));
    }

    let width = size_ty.unwrap_int().width();

    if width > 32 {
        size = cx.fx.append().trunc(Type::int(32), size, loc);
    } else if width < 32 {
        size = if signed {
            cx.fx.append().sext(Type::int(32), size, loc)
        } else {
            cx.fx.append().zext(Type::int(32), size, loc)
        };
    }

    let addr = cx.fx.append().dyn_alloca(size, loc);

    Ok(DValue::rval(result_ty, addr))
}

fn lower_fence(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 1, "fence", loc)?;

    let ordering = ordering_of(fe, args[0], loc)?;

    cx.fx.append().fence(ordering, loc);

    Ok(DValue::Void(result_ty))
}

fn lower_atomic_store(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 3, "atomic store", loc)?;

    let ty = fe.ty_of(args[0]);
    let (int_ty, _) = atomic_int_repr(cx, ty, loc)?;

    let value = fe.lower_expr(cx, args[0])?;
    let value = as_atomic_int(cx, value, int_ty, loc)?;
    let ptr = fe.lower_expr(cx, args[1])?;
    let ptr = cx.materialize(ptr, loc)?;
    let ordering = ordering_of(fe, args[2], loc)?;

    cx.fx.append().store_atomic(value, ptr, ordering, loc);

    Ok(DValue::Void(result_ty))
}

fn lower_atomic_load(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 2, "atomic load", loc)?;

    let (int_ty, punned) = atomic_int_repr(cx, result_ty, loc)?;

    let ptr = fe.lower_expr(cx, args[0])?;
    let ptr = cx.materialize(ptr, loc)?;
    let ordering = ordering_of(fe, args[1], loc)?;
    let loaded = cx.fx.append().load_atomic(int_ty, ptr, ordering, loc);

    from_atomic_int(cx, loaded, result_ty, punned, loc)
}

fn lower_cmpxchg(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 4, "compare-and-swap", loc)?;

    let (int_ty, punned) = atomic_int_repr(cx, result_ty, loc)?;

    let ptr = fe.lower_expr(cx, args[0])?;
    let ptr = cx.materialize(ptr, loc)?;
    let expected = fe.lower_expr(cx, args[1])?;
    let expected = as_atomic_int(cx, expected, int_ty, loc)?;
    let desired = fe.lower_expr(cx, args[2])?;
    let desired = as_atomic_int(cx, desired, int_ty, loc)?;
    let ordering = ordering_of(fe, args[3], loc)?;

    let pair_ty = Type::structure(cx.fx.types_mut(), &[int_ty, Type::bool()]);
    let pair = cx
        .fx
        .append()
        .cmpxchg(pair_ty, ptr, expected, desired, ordering, loc);

    // Only the previous value survives; the success flag is discarded.
    let prev = cx.fx.append().extract(int_ty, pair, 0, loc);

    from_atomic_int(cx, prev, result_ty, punned, loc)
}

fn lower_atomic_rmw(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    decl: &FuncDecl,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 3, "atomic read-modify-write", loc)?;

    let name = decl
        .intrinsic_name
        .as_deref()
        .ok_or_else(|| Diagnostic::fatal(loc, "atomic operation is missing its sub-operation"))?;
    let op = AtomicRmwOp::from_name(name)
        .ok_or_else(|| Diagnostic::fatal(loc, format!("unknown atomic operation '{name}'")))?;

    if !cx.tys.is_int(fe.ty_of(args[1])) {
        return Err(Diagnostic::fatal(
            loc,
            "atomic read-modify-write operands must be integers",
        ));
    }

    let ptr = fe.lower_expr(cx, args[0])?;
    let ptr = cx.materialize(ptr, loc)?;
    let value = fe.lower_expr(cx, args[1])?;
    let value = cx.materialize(value, loc)?;
    let ordering = ordering_of(fe, args[2], loc)?;
    let prev = cx.fx.append().atomic_rmw(op, ptr, value, ordering, loc);

    Ok(DValue::rval(result_ty, prev))
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mutation {
    None,
    Set,
    Reset,
    Complement,
}

fn lower_bit_test(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    mutation: Mutation,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 2, "bit test", loc)?;

    let base = fe.lower_expr(cx, args[0])?;
    let base = cx.materialize(base, loc)?;
    let bitnum = fe.lower_expr(cx, args[1])?;
    let mut bitnum = cx.materialize(bitnum, loc)?;

    let word = cx.fx.types().ptr_sized_int();
    let word_bits = u64::from(cx.fx.types().ptr_width_bits());

    // The bit number indexes a flat bit array of platform words.
    let bit_ty = cx.fx.ty(bitnum);

    if bit_ty != word {
        if !bit_ty.is_int() {
            return Err(Diagnostic::fatal(loc, "bit number must be an integer"));
        }

        bitnum = if bit_ty.unwrap_int().width() > word.unwrap_int().width() {
            cx.fx.append().trunc(word, bitnum, loc)
        } else {
            cx.fx.append().zext(word, bitnum, loc)
        };
    }

    let shift = cx
        .fx
        .append()
        .iconst(word, u64::from(word_bits.trailing_zeros()), loc);
    let word_idx = cx.fx.append().lshr(bitnum, shift, loc);
    let cell = cx.fx.append().offset(word, base, word_idx, loc);
    let loaded = cx.fx.append().load(word, cell, loc);

    let low_mask = cx.fx.append().iconst(word, word_bits - 1, loc);
    let bit_in_word = cx.fx.append().and(bitnum, low_mask, loc);
    let one = cx.fx.append().iconst(word, 1, loc);
    let mask = cx.fx.append().shl(one, bit_in_word, loc);

    let tested = cx.fx.append().and(loaded, mask, loc);
    let zero = cx.fx.append().iconst(word, 0, loc);
    let is_set = cx.fx.append().icmp(ICmpOp::NE, tested, zero, loc);

    // All-ones when the bit was set, zero when it wasn't.
    let ret_ty = cx.ir_ty(result_ty, loc)?;

    if !ret_ty.is_int() {
        return Err(Diagnostic::fatal(loc, "bit test must produce an integer"));
    }

    let ones = cx.fx.append().iconst(ret_ty, all_ones(ret_ty), loc);
    let ret_zero = cx.fx.append().iconst(ret_ty, 0, loc);
    let result = cx.fx.append().sel(is_set, ones, ret_zero, loc);

    match mutation {
        Mutation::None => {}
        Mutation::Set => {
            let updated = cx.fx.append().or(loaded, mask, loc);

            cx.fx.append().store(updated, cell, loc);
        }
        Mutation::Reset => {
            let word_ones = cx.fx.append().iconst(word, all_ones(word), loc);
            let inverted = cx.fx.append().xor(mask, word_ones, loc);
            let updated = cx.fx.append().and(loaded, inverted, loc);

            cx.fx.append().store(updated, cell, loc);
        }
        Mutation::Complement => {
            let updated = cx.fx.append().xor(loaded, mask, loc);

            cx.fx.append().store(updated, cell, loc);
        }
    }

    Ok(DValue::rval(result_ty, result))
}

fn all_ones(ty: Type) -> u64 {
    let width = ty.unwrap_int().width();

    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

fn lower_volatile_load(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 1, "volatile load", loc)?;

    let ptr = fe.lower_expr(cx, args[0])?;
    let ptr = cx.materialize(ptr, loc)?;
    let ty = cx.ir_ty(result_ty, loc)?;
    let loaded = cx.fx.append().load_volatile(ty, ptr, loc);

    Ok(DValue::rval(result_ty, loaded))
}

fn lower_volatile_store(
    cx: &mut LowerCtx<'_, '_>,
    fe: &mut dyn FrontEnd,
    loc: SourceLoc,
    args: &[ExprId],
    result_ty: Ty,
) -> LowerResult<DValue> {
    expect_arity(args, 2, "volatile store", loc)?;

    let ptr = fe.lower_expr(cx, args[0])?;
    let ptr = cx.materialize(ptr, loc)?;
    let value = fe.lower_expr(cx, args[1])?;
    let value = cx.materialize(value, loc)?;

    cx.fx.append().store_volatile(value, ptr, loc);

    Ok(DValue::Void(result_ty))
}
