//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::Value;
use crate::sema::Ty;

/// A logical value during lowering: something the front end's expression
/// layer produced, tagged with whether it is addressable.
///
/// The distinction drives everything downstream of a call: an `Lval` can
/// be written through (hidden-return storage, receiver arguments), while
/// an `Rval` must be spilled before anything needs its address.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DValue {
    /// An addressable location holding a value of `ty`.
    Lval {
        /// The semantic type of the stored value.
        ty: Ty,
        /// The address of the storage.
        addr: Value,
    },
    /// A materialized value of `ty`.
    Rval {
        /// The semantic type of the value.
        ty: Ty,
        /// The physical value.
        val: Value,
    },
    /// The absence of a value, produced by `void` calls.
    Void(Ty),
}

impl DValue {
    /// Creates an addressable value.
    pub fn lval(ty: Ty, addr: Value) -> Self {
        Self::Lval { ty, addr }
    }

    /// Creates a materialized value.
    pub fn rval(ty: Ty, val: Value) -> Self {
        Self::Rval { ty, val }
    }

    /// The semantic type of the value.
    pub fn ty(&self) -> Ty {
        match self {
            Self::Lval { ty, .. } | Self::Rval { ty, .. } | Self::Void(ty) => *ty,
        }
    }

    /// Checks whether the value is addressable.
    pub fn is_lval(&self) -> bool {
        matches!(self, Self::Lval { .. })
    }

    /// The address, when the value is addressable.
    pub fn addr(&self) -> Option<Value> {
        match self {
            Self::Lval { addr, .. } => Some(*addr),
            _ => None,
        }
    }

    /// Produces the same representation at a different semantic type.
    /// This is the representation-only "repaint"; it never converts.
    pub fn with_ty(self, ty: Ty) -> Self {
        match self {
            Self::Lval { addr, .. } => Self::Lval { ty, addr },
            Self::Rval { val, .. } => Self::Rval { ty, val },
            Self::Void(_) => Self::Void(ty),
        }
    }
}
