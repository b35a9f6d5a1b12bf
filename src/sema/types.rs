//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir;
use crate::sema::FnSig;
use ahash::AHashMap;
use bitflags::bitflags;
use cranelift_entity::{entity_impl, PrimaryMap};

/// A reference to an interned semantic type inside a [`TyPool`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ty(u32);
entity_impl!(Ty, "ty");

bitflags! {
    /// Type qualifiers of the source language. Qualifiers never change a
    /// type's representation, only what the type system allows on it, so
    /// lowering strips them before any representation comparison.
    #[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
    pub struct Quals: u32 {
        /// `const`-qualified.
        const CONST = 1;
        /// `immutable`-qualified.
        const IMMUTABLE = 2;
        /// `shared`-qualified.
        const SHARED = 4;
    }
}

/// The structure of one semantic type.
///
/// These are the types the front end resolved the program against, not
/// the physical GIR types; [`TyPool::to_ir`] maps between the two.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub enum TyData {
    /// The `void` type. Only valid as a return type.
    Void,
    /// The boolean type.
    Bool,
    /// An integer of a given width and signedness.
    Int {
        /// The width in bits, one of `{8, 16, 32, 64, 128}`.
        bits: u32,
        /// Whether the integer is signed.
        signed: bool,
    },
    /// A floating-point number, 32 or 64 bits wide.
    Float {
        /// The width in bits.
        bits: u32,
    },
    /// A raw pointer to a pointee type.
    Ptr(Ty),
    /// A reference. Physically a pointer; semantically always valid.
    Ref(Ty),
    /// A slice of an element type, physically a `{ len, ptr }` pair.
    Slice(Ty),
    /// A fixed-size array.
    Array(Ty, u64),
    /// A nominal struct with ordered fields.
    Struct {
        /// The nominal name of the struct.
        name: String,
        /// The field types, in declaration order.
        fields: Vec<Ty>,
    },
    /// A class reference. Physically a pointer to garbage-collected
    /// storage.
    Class {
        /// The nominal name of the class.
        name: String,
    },
    /// An associative map. Physically a pointer to an opaque runtime
    /// structure.
    Map(Ty, Ty),
    /// A function type. Physically a code pointer.
    Func(FnSig),
    /// A closure: a code pointer plus a captured-context pointer.
    Closure(FnSig),
    /// A qualified wrapping of another type.
    Qual(Ty, Quals),
}

/// Owns and interns the semantic types of one compilation.
///
/// Interning makes [`Ty`] comparison structural, the same trick the GIR
/// [`TypePool`](crate::ir::TypePool) plays for compound physical types.
#[derive(Debug, Default)]
pub struct TyPool {
    data: PrimaryMap<Ty, TyData>,
    lookup: AHashMap<TyData, Ty>,
}

impl TyPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a type, returning the existing handle for structurally
    /// identical types.
    pub fn intern(&mut self, data: TyData) -> Ty {
        if let Some(&existing) = self.lookup.get(&data) {
            return existing;
        }

        let ty = self.data.push(data.clone());

        self.lookup.insert(data, ty);

        ty
    }

    /// The structure of a type.
    pub fn data(&self, ty: Ty) -> &TyData {
        &self.data[ty]
    }

    /// Interns `void`.
    pub fn void(&mut self) -> Ty {
        self.intern(TyData::Void)
    }

    /// Interns `bool`.
    pub fn bool(&mut self) -> Ty {
        self.intern(TyData::Bool)
    }

    /// Interns an integer type.
    pub fn int(&mut self, bits: u32, signed: bool) -> Ty {
        debug_assert!(matches!(bits, 8 | 16 | 32 | 64 | 128));

        self.intern(TyData::Int { bits, signed })
    }

    /// Interns a raw pointer type.
    pub fn ptr(&mut self, to: Ty) -> Ty {
        self.intern(TyData::Ptr(to))
    }

    /// Interns a slice type.
    pub fn slice(&mut self, elem: Ty) -> Ty {
        self.intern(TyData::Slice(elem))
    }

    /// Interns a qualified wrapping of `inner`. Wrapping with empty
    /// qualifiers is the identity.
    pub fn qual(&mut self, inner: Ty, quals: Quals) -> Ty {
        if quals.is_empty() {
            return inner;
        }

        self.intern(TyData::Qual(inner, quals))
    }

    /// Strips every layer of qualifiers off a type.
    pub fn strip_quals(&self, ty: Ty) -> Ty {
        let mut current = ty;

        while let TyData::Qual(inner, _) = self.data(current) {
            current = *inner;
        }

        current
    }

    /// Checks if a type is `void` (after stripping qualifiers).
    pub fn is_void(&self, ty: Ty) -> bool {
        matches!(self.data(self.strip_quals(ty)), TyData::Void)
    }

    /// Checks if a type is an integer (after stripping qualifiers).
    pub fn is_int(&self, ty: Ty) -> bool {
        matches!(self.data(self.strip_quals(ty)), TyData::Int { .. })
    }

    /// Checks if a type is a signed integer (after stripping qualifiers).
    pub fn is_signed_int(&self, ty: Ty) -> bool {
        matches!(
            self.data(self.strip_quals(ty)),
            TyData::Int { signed: true, .. }
        )
    }

    /// Checks if a type only exists in memory at the physical level:
    /// structs and fixed-size arrays. These are the types the variadic
    /// fetch primitive cannot produce and the ABI may demand `byval` /
    /// `sret` treatment for.
    pub fn in_memory_only(&self, ty: Ty) -> bool {
        matches!(
            self.data(self.strip_quals(ty)),
            TyData::Struct { .. } | TyData::Array(..)
        )
    }

    /// Maps a semantic type onto its physical GIR representation. `None`
    /// is `void`, which has no physical values.
    pub fn to_ir(&self, ty: Ty, pool: &mut ir::TypePool) -> Option<ir::Type> {
        match self.data(self.strip_quals(ty)) {
            TyData::Void => None,
            TyData::Bool => Some(ir::Type::bool()),
            TyData::Int { bits, .. } => Some(ir::Type::int(*bits)),
            TyData::Float { bits } => Some(match *bits {
                32 => ir::Type::float(ir::FloatFormat::Single),
                _ => ir::Type::float(ir::FloatFormat::Double),
            }),
            TyData::Ptr(_) | TyData::Ref(_) | TyData::Class { .. } | TyData::Map(..) => {
                Some(ir::Type::ptr())
            }
            TyData::Func(_) => Some(ir::Type::ptr()),
            TyData::Slice(_) => {
                let len = pool.ptr_sized_int();

                Some(ir::Type::structure(pool, &[len, ir::Type::ptr()]))
            }
            TyData::Array(elem, len) => {
                let (elem, len) = (*elem, *len);
                let inner = self.to_ir(elem, pool)?;

                Some(ir::Type::array(pool, inner, len))
            }
            TyData::Struct { fields, .. } => {
                let fields = fields.clone();
                let mut members = Vec::with_capacity(fields.len());

                for field in fields {
                    members.push(self.to_ir(field, pool)?);
                }

                Some(ir::Type::structure(pool, &members))
            }
            TyData::Closure(_) => Some(ir::Type::structure(
                pool,
                &[ir::Type::ptr(), ir::Type::ptr()],
            )),
            TyData::Qual(..) => unreachable!("qualifiers were stripped"),
        }
    }

    /// The signature carried by a function or closure type, if the type
    /// is one of those.
    pub fn signature_of(&self, ty: Ty) -> Option<&FnSig> {
        match self.data(self.strip_quals(ty)) {
            TyData::Func(sig) | TyData::Closure(sig) => Some(sig),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_structural() {
        let mut tys = TyPool::new();

        let a = tys.int(32, true);
        let b = tys.int(32, true);
        let c = tys.int(32, false);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn strip_quals_unwraps_every_layer() {
        let mut tys = TyPool::new();

        let base = tys.int(64, false);
        let shared = tys.qual(base, Quals::SHARED);
        let both = tys.qual(shared, Quals::CONST);

        assert_eq!(tys.strip_quals(both), base);
        assert_eq!(tys.qual(base, Quals::empty()), base);
    }

    #[test]
    fn slices_lower_to_len_ptr_pairs() {
        let mut tys = TyPool::new();
        let mut pool = ir::TypePool::new(64);

        let byte = tys.int(8, false);
        let slice = tys.slice(byte);
        let ir_ty = tys.to_ir(slice, &mut pool).unwrap();

        let members = ir_ty.unwrap_struct().members(&pool);
        assert_eq!(members, &[ir::Type::int(64), ir::Type::ptr()]);
    }
}
