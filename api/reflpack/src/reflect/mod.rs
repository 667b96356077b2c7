// Copyright 2015-2023 Swim Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::any::Any;

use either::Either;

use crate::reader::DecodeError;
use crate::record::Record;
use crate::value::{ExtValue, Value};

mod impls;

/// Access to the dynamic type of a value. This is implemented for every `'static` type and
/// exists so that the concrete type behind a `&dyn Reflect` can be recovered.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The name of the concrete type (for diagnostics only).
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Trait for types that can describe their shape at runtime. The encoder walks a value through
/// [`Reflect::shape`] and the decoder fills a destination through [`Reflect::shape_mut`], so
/// nothing about the concrete type needs to be known statically by either of them.
pub trait Reflect: AsAny {
    /// A read-only view of the kind of this value.
    fn shape(&self) -> Shape<'_>;

    /// A writable view of the kind of this value, used when it is the destination of a decode.
    fn shape_mut(&mut self) -> ShapeMut<'_>;

    /// View a slice of this type as raw bytes. Only overridden by `u8` so that `Vec<u8>` is
    /// treated as a byte sequence rather than a sequence of integers.
    #[doc(hidden)]
    fn byte_slice(items: &[Self]) -> Option<&[u8]>
    where
        Self: Sized,
    {
        let _ = items;
        None
    }

    /// Mutable counterpart of [`Reflect::byte_slice`]. The vector is handed back unchanged if it
    /// is not a byte vector.
    #[doc(hidden)]
    fn byte_vec(items: &mut Vec<Self>) -> Either<&mut Vec<u8>, &mut Vec<Self>>
    where
        Self: Sized,
    {
        Either::Right(items)
    }
}

/// The kind of a value being encoded.
pub enum Shape<'a> {
    /// An absent value.
    Nil,
    Bool(bool),
    /// A signed integer of any width, widened to 64 bits.
    Signed(i64),
    /// An unsigned integer of any width, widened to 64 bits.
    Unsigned(u64),
    F32(f32),
    F64(f64),
    Str(&'a str),
    /// A sequence of single bytes.
    Bytes(&'a [u8]),
    /// Any other ordered collection.
    Seq(&'a dyn Sequence),
    /// An associative container.
    Map(&'a dyn Associative),
    /// A fixed-schema type with named fields.
    Record(&'a dyn Record),
    /// A pointer-like value that may or may not refer to another value.
    Ptr(Option<&'a dyn Reflect>),
    /// An extension value that has already been encoded.
    Ext(&'a ExtValue),
    /// A type with no structure of its own. These can only be encoded with a registered
    /// extension.
    Opaque,
}

/// The kind of a destination being decoded into.
pub enum ShapeMut<'a> {
    Bool(&'a mut bool),
    Int(IntSlot<'a>),
    Float(FloatSlot<'a>),
    Str(&'a mut String),
    Bytes(&'a mut Vec<u8>),
    Seq(&'a mut dyn SequenceMut),
    Map(&'a mut dyn AssociativeMut),
    Record(&'a mut dyn Record),
    /// An indirection that must be followed (and possibly allocated) before decoding.
    Ptr(&'a mut dyn Pointer),
    /// A destination that will take whatever shape the data has.
    Open(&'a mut Value),
    /// A destination that can only be filled by a registered extension.
    Opaque,
}

/// A value could not be stored because it was out of the range of the destination type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// The value was above the maximum of the type.
    Overflow,
    /// The value was below the minimum of the type.
    Underflow,
}

/// A fixed width integer destination.
pub enum IntSlot<'a> {
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    Isize(&'a mut isize),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Usize(&'a mut usize),
}

fn narrow<T: TryFrom<i128>>(slot: &mut T, n: i128) -> Result<(), RangeError> {
    match T::try_from(n) {
        Ok(m) => {
            *slot = m;
            Ok(())
        }
        Err(_) if n > 0 => Err(RangeError::Overflow),
        Err(_) => Err(RangeError::Underflow),
    }
}

impl<'a> IntSlot<'a> {
    /// Store an integer, failing if it does not fit exactly.
    pub fn set(self, n: i128) -> Result<(), RangeError> {
        match self {
            IntSlot::I8(slot) => narrow(slot, n),
            IntSlot::I16(slot) => narrow(slot, n),
            IntSlot::I32(slot) => narrow(slot, n),
            IntSlot::I64(slot) => narrow(slot, n),
            IntSlot::Isize(slot) => narrow(slot, n),
            IntSlot::U8(slot) => narrow(slot, n),
            IntSlot::U16(slot) => narrow(slot, n),
            IntSlot::U32(slot) => narrow(slot, n),
            IntSlot::U64(slot) => narrow(slot, n),
            IntSlot::Usize(slot) => narrow(slot, n),
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            IntSlot::I8(_) | IntSlot::I16(_) | IntSlot::I32(_) | IntSlot::I64(_) | IntSlot::Isize(_)
        )
    }
}

/// A floating point destination.
pub enum FloatSlot<'a> {
    F32(&'a mut f32),
    F64(&'a mut f64),
}

impl<'a> FloatSlot<'a> {
    /// Store a float. Narrowing to 32 bits only succeeds if the value is exactly representable.
    pub fn set(self, value: f64) -> Result<(), RangeError> {
        match self {
            FloatSlot::F64(slot) => {
                *slot = value;
                Ok(())
            }
            FloatSlot::F32(slot) => {
                let narrowed = value as f32;
                if value.is_nan() || f64::from(narrowed) == value {
                    *slot = narrowed;
                    Ok(())
                } else {
                    Err(RangeError::Overflow)
                }
            }
        }
    }
}

/// Read access to an ordered collection.
pub trait Sequence {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;
}

/// Write access to an ordered collection.
pub trait SequenceMut {
    /// Grow or shrink the collection to exactly `len` elements, reusing existing storage.
    fn resize(&mut self, len: usize);

    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;
}

/// Read access to an associative container.
pub trait Associative {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;
}

/// Write access to an associative container.
pub trait AssociativeMut {
    /// Create a new, default, key and value, pass them to `fill` and then insert them.
    fn insert_with(
        &mut self,
        fill: &mut dyn FnMut(&mut dyn Reflect, &mut dyn Reflect) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError>;
}

/// An indirection to another value.
pub trait Pointer {
    /// Set the pointer to its empty state. Returns false if the pointer cannot be empty.
    fn set_nil(&mut self) -> bool;

    /// The value referred to, allocating a default value first if it is absent.
    fn pointee(&mut self) -> &mut dyn Reflect;
}
