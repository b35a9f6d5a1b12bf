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
    ArgAttrs, CallConv, InstBuilder, ParamAttributes, SourceLoc, Type, TypePool, Value,
};
use crate::lower::{LowerCtx, VarArgSlot};
use crate::sema::{DValue, FnSig, FuncDecl, Ty, TyData, TyPool};
use target_lexicon::{Architecture, Triple};

/// How a value of some type comes back from a call.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum ReturnPlan {
    /// In the call's raw result, reconstructed by the descriptor.
    Direct,
    /// Through a hidden pointer passed as an implicit argument.
    Sret,
    /// The raw result is itself the address of caller-visible storage
    /// (reference-qualified returns).
    ByRef,
}

/// The ABI questions call lowering asks of a target, one implementation
/// per target / calling-convention family.
///
/// Descriptors are stateless: every answer is a pure function of the
/// types and convention involved, so one shared instance serves every
/// call of a compilation.
pub trait TargetAbi: Sync {
    /// Whether an argument of this type must be passed as a hidden
    /// pointer carrying a by-value copy attribute, rather than decomposed
    /// into registers.
    fn pass_by_val(&self, tys: &TyPool, pool: &mut TypePool, ty: Ty) -> bool;

    /// How a value of the signature's return type comes back from a call.
    fn return_plan(&self, tys: &TyPool, pool: &mut TypePool, sig: &FnSig) -> ReturnPlan;

    /// Turns the raw result of a [`ReturnPlan::Direct`] call into a usable
    /// logical value of the declared type.
    fn reconstruct_return(
        &self,
        cx: &mut LowerCtx<'_, '_>,
        raw: Value,
        ty: Ty,
        loc: SourceLoc,
    ) -> LowerResult<DValue>;

    /// The extension attribute of a scalar passed (or returned) at this
    /// type, empty when the type needs none.
    fn extend_attr(&self, tys: &TyPool, ty: Ty) -> ArgAttrs;

    /// Whether the context/this implicit argument precedes the hidden
    /// return pointer.
    fn pass_this_before_sret(&self, sig: &FnSig) -> bool;

    /// Whether the explicit argument suffix occupies reversed physical
    /// positions relative to source order.
    fn reverse_explicit(&self, conv: CallConv) -> bool {
        conv == CallConv::Garnet
    }

    /// Adjusts the variadic descriptors before final placement; vararg
    /// ABIs frequently diverge from fixed-arity rules.
    fn rewrite_varargs(&self, tys: &TyPool, pool: &mut TypePool, varargs: &mut [VarArgSlot]);

    /// The convention a call site should actually be emitted at.
    fn calling_conv(&self, declared: CallConv, decl: Option<&FuncDecl>) -> CallConv;

    /// Initializes a native variadic cursor at `list` from the enclosing
    /// function's tail.
    fn prepare_va_start(
        &self,
        cx: &mut LowerCtx<'_, '_>,
        list: Value,
        loc: SourceLoc,
    ) -> LowerResult<()>;

    /// Duplicates a native variadic cursor.
    fn va_copy(
        &self,
        cx: &mut LowerCtx<'_, '_>,
        dst: Value,
        src: Value,
        loc: SourceLoc,
    ) -> LowerResult<()>;

    /// Fetches the next variadic value of physical type `ty` through a
    /// native cursor.
    fn prepare_va_arg(
        &self,
        cx: &mut LowerCtx<'_, '_>,
        list: Value,
        ty: Type,
        loc: SourceLoc,
    ) -> LowerResult<Value>;
}

/// The System-V family descriptor (x86-64).
///
/// Aggregates larger than two eightbytes travel through memory (`byval`
/// arguments, `sret` returns); smaller ones stay in registers. Sub-word
/// integers are extended to 32 bits.
pub struct SysVAbi;

/// Aggregate size over which SysV stops using register pairs.
const SYSV_MAX_REG_AGGREGATE: u64 = 16;

impl SysVAbi {
    fn size_of(&self, tys: &TyPool, pool: &mut TypePool, ty: Ty) -> u64 {
        match tys.to_ir(ty, pool) {
            Some(ir_ty) => pool.layout_of(ir_ty).size(),
            None => 0,
        }
    }
}

impl TargetAbi for SysVAbi {
    fn pass_by_val(&self, tys: &TyPool, pool: &mut TypePool, ty: Ty) -> bool {
        tys.in_memory_only(ty) && self.size_of(tys, pool, ty) > SYSV_MAX_REG_AGGREGATE
    }

    fn return_plan(&self, tys: &TyPool, pool: &mut TypePool, sig: &FnSig) -> ReturnPlan {
        if tys.is_void(sig.ret) {
            return ReturnPlan::Direct;
        }

        if sig.ret_ref {
            return ReturnPlan::ByRef;
        }

        if tys.in_memory_only(sig.ret) && self.size_of(tys, pool, sig.ret) > SYSV_MAX_REG_AGGREGATE
        {
            return ReturnPlan::Sret;
        }

        ReturnPlan::Direct
    }

    fn reconstruct_return(
        &self,
        cx: &mut LowerCtx<'_, '_>,
        raw: Value,
        ty: Ty,
        loc: SourceLoc,
    ) -> LowerResult<DValue> {
        // Small aggregates come back as a register pair. Normalize them to
        // an addressable value so downstream indirection depth matches the
        // memory-returned case.
        if cx.tys.in_memory_only(ty) {
            let addr = cx.address_of(DValue::rval(ty, raw), loc)?;

            return Ok(DValue::lval(ty, addr));
        }

        Ok(DValue::rval(ty, raw))
    }

    fn extend_attr(&self, tys: &TyPool, ty: Ty) -> ArgAttrs {
        match tys.data(tys.strip_quals(ty)) {
            TyData::Bool => ArgAttrs::with(ParamAttributes::ZEXT),
            TyData::Int { bits, signed } if *bits < 32 => {
                if *signed {
                    ArgAttrs::with(ParamAttributes::SEXT)
                } else {
                    ArgAttrs::with(ParamAttributes::ZEXT)
                }
            }
            _ => ArgAttrs::none(),
        }
    }

    fn pass_this_before_sret(&self, _: &FnSig) -> bool {
        false
    }

    fn rewrite_varargs(&self, tys: &TyPool, pool: &mut TypePool, varargs: &mut [VarArgSlot]) {
        for slot in varargs {
            // Fixed-arity rules carry over on SysV except that nothing is
            // ever passed `inreg`; recompute byval and extension from the
            // argument's own type.
            slot.byval = self.pass_by_val(tys, pool, slot.ty);

            if slot.byval {
                let ir_ty = tys.to_ir(slot.ty, pool);
                let align = ir_ty.map(|t| pool.layout_of(t).align()).unwrap_or(1);

                slot.slot_ty = Type::ptr();
                slot.attrs = ArgAttrs::byval(align as u32);
            } else {
                slot.attrs = self.extend_attr(tys, slot.ty);
            }
        }
    }

    fn calling_conv(&self, declared: CallConv, _: Option<&FuncDecl>) -> CallConv {
        match declared {
            CallConv::C => CallConv::SysV,
            other => other,
        }
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

/// Selects the descriptor for a target triple, once at start-up. A triple
/// without a descriptor is a build configuration defect, reported as a
/// fatal diagnostic.
pub fn abi_for_target(triple: &Triple) -> LowerResult<&'static dyn TargetAbi> {
    match triple.architecture {
        Architecture::X86_64 => Ok(&SysVAbi),
        _ => Err(Diagnostic::fatal(
            SourceLoc::default(),
            format!("no ABI descriptor for target '{triple}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::Param;
    use std::str::FromStr;

    #[test]
    fn sysv_aggregate_thresholds() {
        let mut tys = TyPool::new();
        let mut pool = TypePool::new(64);

        let i64t = tys.int(64, true);
        let small = tys.intern(TyData::Struct {
            name: "pair".into(),
            fields: vec![i64t, i64t],
        });
        let big = tys.intern(TyData::Struct {
            name: "triple".into(),
            fields: vec![i64t, i64t, i64t],
        });

        let abi = SysVAbi;
        assert!(!abi.pass_by_val(&tys, &mut pool, small));
        assert!(abi.pass_by_val(&tys, &mut pool, big));

        let sig = FnSig::new(vec![Param::by_value(i64t)], big);
        assert_eq!(abi.return_plan(&tys, &mut pool, &sig), ReturnPlan::Sret);
    }

    #[test]
    fn sysv_extends_small_ints() {
        let mut tys = TyPool::new();

        let i8t = tys.int(8, true);
        let u16t = tys.int(16, false);
        let i64t = tys.int(64, true);

        let abi = SysVAbi;
        assert!(abi.extend_attr(&tys, i8t).contains(ParamAttributes::SEXT));
        assert!(abi.extend_attr(&tys, u16t).contains(ParamAttributes::ZEXT));
        assert_eq!(abi.extend_attr(&tys, i64t), ArgAttrs::none());
    }

    #[test]
    fn unknown_targets_are_fatal() {
        let triple = Triple::from_str("riscv64gc-unknown-linux-gnu").unwrap();

        assert!(abi_for_target(&triple).is_err());
        assert!(abi_for_target(&Triple::from_str("x86_64-unknown-linux-gnu").unwrap()).is_ok());
    }
}
