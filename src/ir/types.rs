//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2024-2025 The Garnet Authors. All rights reserved.              //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use ahash::AHashMap;
use smallvec::SmallVec;
use static_assertions::assert_eq_size;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Models the `iN` class of fundamental GIR types.
///
/// Integers are in the form `iN`, such that $N \in \\{8, 16, 32, 64, 128\\}$.
/// The 128-bit width exists because the atomic primitives accept it; it is
/// not otherwise special.
///
/// ```
/// # use garnet::ir::*;
/// let t1 = Int::i8();
/// assert_eq!(t1.width(), 8);
///
/// let t2 = Int::new(8).unwrap();
/// assert_eq!(t1, t2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Int {
    width: u32,
}

impl Int {
    /// Creates an `Int` with a given width, if the width is supported.
    #[inline]
    pub fn new(bit_width: u32) -> Option<Self> {
        match bit_width {
            8 | 16 | 32 | 64 | 128 => Some(Self { width: bit_width }),
            _ => None,
        }
    }

    /// Shorthand for `Int::new(8)`.
    pub const fn i8() -> Self {
        Self { width: 8 }
    }

    /// Shorthand for `Int::new(16)`.
    pub const fn i16() -> Self {
        Self { width: 16 }
    }

    /// Shorthand for `Int::new(32)`.
    pub const fn i32() -> Self {
        Self { width: 32 }
    }

    /// Shorthand for `Int::new(64)`.
    pub const fn i64() -> Self {
        Self { width: 64 }
    }

    /// Shorthand for `Int::new(128)`.
    pub const fn i128() -> Self {
        Self { width: 128 }
    }

    /// Gets the width of the integer, in bits.
    #[inline]
    pub fn width(self) -> u32 {
        self.width
    }
}

/// Maps the hardware representation of the floating-point types
/// to enum variants. These map directly to IEEE-754 formats.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum FloatFormat {
    /// An IEEE single-precision float (`binary32`).
    Single,
    /// An IEEE double-precision float (`binary64`).
    Double,
}

/// Models the `fN` class of fundamental GIR types.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Float {
    real: FloatFormat,
}

impl Float {
    /// Creates an `fN` type from a given IEEE floating-point format.
    #[inline]
    pub const fn new(real: FloatFormat) -> Self {
        Self { real }
    }

    /// Gets the underlying IEEE format.
    #[inline]
    pub const fn format(self) -> FloatFormat {
        self.real
    }
}

/// Models an array type in GIR. Internally, contains a reference into
/// the [`TypePool`] being used for the module being operated on.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Array(u32);

impl Array {
    /// Gets the element type of the array.
    pub fn element(self, pool: &TypePool) -> Type {
        self.data(pool).0
    }

    /// Gets the number of elements in the array.
    pub fn len(self, pool: &TypePool) -> u64 {
        self.data(pool).1
    }

    /// Checks whether the array has no elements.
    pub fn is_empty(self, pool: &TypePool) -> bool {
        self.len(pool) == 0
    }

    fn data(self, pool: &TypePool) -> (Type, u64) {
        pool.info_for(self.0)
            .as_array()
            .expect("somehow got `Type::Array` that refers to non-array type")
    }
}

/// Models a structure type in GIR. Internally, contains a reference into
/// the [`TypePool`] being used for the module being operated on.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Struct(u32);

impl Struct {
    /// Gets the member types of the structure, in declaration order.
    pub fn members(self, pool: &TypePool) -> &[Type] {
        pool.info_for(self.0)
            .as_struct()
            .expect("somehow got `Type::Struct` that refers to non-struct type")
    }
}

/// A reference to a GIR type. Copyable, compact, and able to model every
/// type the lowering engine can emit.
///
/// Fundamental types carry all their information inline; arrays and
/// structures reference a [`TypePool`].
///
/// ```
/// # use garnet::ir::*;
/// let t1 = Type::bool();
/// let t2 = Type::ptr();
/// assert_ne!(t1, t2);
/// ```
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// A `bool` in the IR.
    Bool,
    /// A `ptr` in the IR. Pointers are untyped addresses.
    Ptr,
    /// An `iN` in the IR.
    Int(Int),
    /// An `fN` in the IR.
    Float(Float),
    /// A `[T; N]` in the IR.
    Array(Array),
    /// A `{ T... }` in the IR.
    Struct(Struct),
}

assert_eq_size!(Type, u64);

impl Type {
    /// Creates a boolean type.
    pub const fn bool() -> Self {
        Self::Bool
    }

    /// Creates a pointer type.
    pub const fn ptr() -> Self {
        Self::Ptr
    }

    /// Creates an integer type of a given width. The width must be one of
    /// `{8, 16, 32, 64, 128}`.
    pub fn int(width: u32) -> Self {
        Self::Int(Int::new(width).expect("unsupported integer width"))
    }

    /// Creates a float type of the given format.
    pub const fn float(format: FloatFormat) -> Self {
        Self::Float(Float::new(format))
    }

    /// Creates an array type. Note that these are interned inside a pool.
    pub fn array(pool: &mut TypePool, inner: Type, length: u64) -> Self {
        Self::Array(Array(pool.create_array(inner, length)))
    }

    /// Creates a struct type. Note that these are interned inside a pool.
    pub fn structure(pool: &mut TypePool, members: &[Type]) -> Self {
        Self::Struct(Struct(pool.create_struct(members)))
    }

    /// Checks if the type is `bool`.
    pub fn is_bool(self) -> bool {
        matches!(self, Self::Bool)
    }

    /// Checks if the type is `ptr`.
    pub fn is_ptr(self) -> bool {
        matches!(self, Self::Ptr)
    }

    /// Checks if the type is an `iN`.
    pub fn is_int(self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Checks if the type is an `iN` of a given width.
    pub fn is_int_of_width(self, width: u32) -> bool {
        matches!(self, Self::Int(i) if i.width() == width)
    }

    /// Checks if the type is an `fN`.
    pub fn is_float(self) -> bool {
        matches!(self, Self::Float(_))
    }

    /// Checks if the type is `bool` or an `iN`.
    pub fn is_bool_or_int(self) -> bool {
        self.is_bool() || self.is_int()
    }

    /// Checks if the type is an array.
    pub fn is_array(self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Checks if the type is a struct.
    pub fn is_struct(self) -> bool {
        matches!(self, Self::Struct(_))
    }

    /// Checks if the type is an aggregate (array or struct).
    pub fn is_aggregate(self) -> bool {
        self.is_array() || self.is_struct()
    }

    /// Extracts the [`Int`] out of the type, panicking if it isn't one.
    pub fn unwrap_int(self) -> Int {
        match self {
            Self::Int(i) => i,
            _ => panic!("attempted `Type::unwrap_int` with type '{self:?}'"),
        }
    }

    /// Extracts the [`Struct`] out of the type, panicking if it isn't one.
    pub fn unwrap_struct(self) -> Struct {
        match self {
            Self::Struct(s) => s,
            _ => panic!("attempted `Type::unwrap_struct` with type '{self:?}'"),
        }
    }

    /// Extracts the [`Array`] out of the type, panicking if it isn't one.
    pub fn unwrap_array(self) -> Array {
        match self {
            Self::Array(a) => a,
            _ => panic!("attempted `Type::unwrap_array` with type '{self:?}'"),
        }
    }
}

/// The size and alignment of a type, as the target lays it out.
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct TypeLayout {
    size: u64,
    align: u64,
}

impl TypeLayout {
    /// Creates a layout from a size and alignment, both in bytes.
    pub fn new(size: u64, align: u64) -> Self {
        debug_assert!(align.is_power_of_two());

        Self { size, align }
    }

    /// The allocation size of the type, in bytes.
    pub fn size(self) -> u64 {
        self.size
    }

    /// The required alignment of the type, in bytes.
    pub fn align(self) -> u64 {
        self.align
    }

    /// The allocation size of the type, in bits.
    pub fn bit_size(self) -> u64 {
        self.size * 8
    }
}

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
enum CompoundTypeData {
    Array(Type, u64),
    Struct(SmallVec<[Type; 4]>),
}

impl CompoundTypeData {
    fn as_array(&self) -> Option<(Type, u64)> {
        match self {
            CompoundTypeData::Array(ty, len) => Some((*ty, *len)),
            _ => None,
        }
    }

    fn as_struct(&self) -> Option<&[Type]> {
        match self {
            CompoundTypeData::Struct(tys) => Some(tys),
            _ => None,
        }
    }
}

/// Owns the data for the compound types of a module, and answers the
/// physical layout questions that lowering needs (size, alignment,
/// pointer width).
///
/// Compound types are de-duplicated on creation, so comparing [`Type`]s by
/// value is equivalent to structural comparison.
#[derive(Debug, Clone)]
pub struct TypePool {
    ptr_width: u32,
    data: Vec<CompoundTypeData>,
    lookup: AHashMap<CompoundTypeData, u32>,
}

impl TypePool {
    /// Creates an empty pool for a target with the given pointer width
    /// in bits (32 or 64).
    pub fn new(ptr_width_bits: u32) -> Self {
        debug_assert!(ptr_width_bits == 32 || ptr_width_bits == 64);

        Self {
            ptr_width: ptr_width_bits,
            data: Vec::default(),
            lookup: AHashMap::default(),
        }
    }

    /// The pointer width of the target, in bits.
    pub fn ptr_width_bits(&self) -> u32 {
        self.ptr_width
    }

    /// The integer type with the same width as a pointer (the target's
    /// "word" type, used by the bit-test primitives).
    pub fn ptr_sized_int(&self) -> Type {
        Type::int(self.ptr_width)
    }

    /// Computes the target layout of a type.
    ///
    /// Aggregates get C-like layout: members at aligned offsets, the whole
    /// padded out to its own alignment.
    pub fn layout_of(&self, ty: Type) -> TypeLayout {
        match ty {
            Type::Bool => TypeLayout::new(1, 1),
            Type::Ptr => TypeLayout::new(u64::from(self.ptr_width / 8), u64::from(self.ptr_width / 8)),
            Type::Int(i) => {
                let bytes = u64::from(i.width() / 8);

                TypeLayout::new(bytes, bytes.min(16))
            }
            Type::Float(f) => match f.format() {
                FloatFormat::Single => TypeLayout::new(4, 4),
                FloatFormat::Double => TypeLayout::new(8, 8),
            },
            Type::Array(arr) => {
                let inner = self.layout_of(arr.element(self));

                TypeLayout::new(inner.size() * arr.len(self), inner.align())
            }
            Type::Struct(st) => {
                let mut size = 0u64;
                let mut align = 1u64;

                for &member in st.members(self) {
                    let ml = self.layout_of(member);

                    size = align_up(size, ml.align()) + ml.size();
                    align = align.max(ml.align());
                }

                TypeLayout::new(align_up(size, align), align)
            }
        }
    }

    /// Computes the byte offset of member `index` of a struct type.
    pub fn offset_of(&self, st: Struct, index: usize) -> u64 {
        let members = st.members(self);
        debug_assert!(index < members.len());

        let mut offset = 0u64;

        for (i, &member) in members.iter().enumerate() {
            let ml = self.layout_of(member);

            offset = align_up(offset, ml.align());

            if i == index {
                return offset;
            }

            offset += ml.size();
        }

        unreachable!()
    }

    fn create_array(&mut self, inner: Type, length: u64) -> u32 {
        self.insert(CompoundTypeData::Array(inner, length))
    }

    fn create_struct(&mut self, members: &[Type]) -> u32 {
        self.insert(CompoundTypeData::Struct(members.into()))
    }

    fn insert(&mut self, data: CompoundTypeData) -> u32 {
        if let Some(&existing) = self.lookup.get(&data) {
            return existing;
        }

        let key = self.data.len() as u32;

        self.data.push(data.clone());
        self.lookup.insert(data, key);

        key
    }

    fn info_for(&self, key: u32) -> &CompoundTypeData {
        &self.data[key as usize]
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new(64)
    }
}

fn align_up(value: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());

    (value + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_types_are_interned() {
        let mut pool = TypePool::default();
        let t1 = Type::structure(&mut pool, &[Type::ptr(), Type::int(64)]);
        let t2 = Type::structure(&mut pool, &[Type::ptr(), Type::int(64)]);
        let t3 = Type::structure(&mut pool, &[Type::int(64), Type::ptr()]);

        assert_eq!(t1, t2);
        assert_ne!(t1, t3);
    }

    #[test]
    fn struct_layout_pads_members() {
        let mut pool = TypePool::new(64);
        let ty = Type::structure(&mut pool, &[Type::int(8), Type::int(64)]);
        let layout = pool.layout_of(ty);

        assert_eq!(layout.size(), 16);
        assert_eq!(layout.align(), 8);
        assert_eq!(pool.offset_of(ty.unwrap_struct(), 1), 8);
    }

    #[test]
    fn ptr_sized_int_follows_target_width() {
        let pool32 = TypePool::new(32);
        let pool64 = TypePool::new(64);

        assert_eq!(pool32.ptr_sized_int(), Type::int(32));
        assert_eq!(pool64.ptr_sized_int(), Type::int(64));
        assert_eq!(pool64.layout_of(Type::ptr()).size(), 8);
    }
}
