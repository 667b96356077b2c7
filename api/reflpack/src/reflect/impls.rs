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

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use either::Either;

use crate::reader::DecodeError;
use crate::reflect::{
    Associative, AssociativeMut, FloatSlot, IntSlot, Pointer, Reflect, Sequence, SequenceMut,
    Shape, ShapeMut,
};
use crate::value::Value;

macro_rules! reflect_signed {
    ($($t:ty => $slot:ident),* $(,)?) => {
        $(
            impl Reflect for $t {
                fn shape(&self) -> Shape<'_> {
                    Shape::Signed(*self as i64)
                }

                fn shape_mut(&mut self) -> ShapeMut<'_> {
                    ShapeMut::Int(IntSlot::$slot(self))
                }
            }
        )*
    };
}

macro_rules! reflect_unsigned {
    ($($t:ty => $slot:ident),* $(,)?) => {
        $(
            impl Reflect for $t {
                fn shape(&self) -> Shape<'_> {
                    Shape::Unsigned(*self as u64)
                }

                fn shape_mut(&mut self) -> ShapeMut<'_> {
                    ShapeMut::Int(IntSlot::$slot(self))
                }
            }
        )*
    };
}

reflect_signed! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
}

reflect_unsigned! {
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
}

impl Reflect for u8 {
    fn shape(&self) -> Shape<'_> {
        Shape::Unsigned(u64::from(*self))
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Int(IntSlot::U8(self))
    }

    fn byte_slice(items: &[Self]) -> Option<&[u8]> {
        Some(items)
    }

    fn byte_vec(items: &mut Vec<Self>) -> Either<&mut Vec<u8>, &mut Vec<Self>> {
        Either::Left(items)
    }
}

impl Reflect for bool {
    fn shape(&self) -> Shape<'_> {
        Shape::Bool(*self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Bool(self)
    }
}

impl Reflect for f32 {
    fn shape(&self) -> Shape<'_> {
        Shape::F32(*self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Float(FloatSlot::F32(self))
    }
}

impl Reflect for f64 {
    fn shape(&self) -> Shape<'_> {
        Shape::F64(*self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Float(FloatSlot::F64(self))
    }
}

impl Reflect for String {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self.as_str())
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Str(self)
    }
}

// String literals can be written but never be the destination of a decode.
impl Reflect for &'static str {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Opaque
    }
}

impl<T: Reflect + Default> Reflect for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        match T::byte_slice(self.as_slice()) {
            Some(bytes) => Shape::Bytes(bytes),
            None => Shape::Seq(self),
        }
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        match T::byte_vec(self) {
            Either::Left(bytes) => ShapeMut::Bytes(bytes),
            Either::Right(items) => ShapeMut::Seq(items),
        }
    }
}

impl<T: Reflect> Sequence for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn items(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }
}

impl<T: Reflect + Default> SequenceMut for Vec<T> {
    fn resize(&mut self, len: usize) {
        self.resize_with(len, T::default);
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.get_mut(index).map(|item| item as &mut dyn Reflect)
    }
}

impl<K, V, S> Reflect for HashMap<K, V, S>
where
    K: Reflect + Default + Eq + Hash,
    V: Reflect + Default,
    S: BuildHasher + Default + 'static,
{
    fn shape(&self) -> Shape<'_> {
        Shape::Map(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Map(self)
    }
}

impl<K, V, S> Associative for HashMap<K, V, S>
where
    K: Reflect,
    V: Reflect,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
        )
    }
}

impl<K, V, S> AssociativeMut for HashMap<K, V, S>
where
    K: Reflect + Default + Eq + Hash,
    V: Reflect + Default,
    S: BuildHasher,
{
    fn insert_with(
        &mut self,
        fill: &mut dyn FnMut(&mut dyn Reflect, &mut dyn Reflect) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        let mut key = K::default();
        let mut value = V::default();
        fill(&mut key, &mut value)?;
        self.insert(key, value);
        Ok(())
    }
}

impl<K, V> Reflect for BTreeMap<K, V>
where
    K: Reflect + Default + Ord,
    V: Reflect + Default,
{
    fn shape(&self) -> Shape<'_> {
        Shape::Map(self)
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Map(self)
    }
}

impl<K, V> Associative for BTreeMap<K, V>
where
    K: Reflect,
    V: Reflect,
{
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
        )
    }
}

impl<K, V> AssociativeMut for BTreeMap<K, V>
where
    K: Reflect + Default + Ord,
    V: Reflect + Default,
{
    fn insert_with(
        &mut self,
        fill: &mut dyn FnMut(&mut dyn Reflect, &mut dyn Reflect) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        let mut key = K::default();
        let mut value = V::default();
        fill(&mut key, &mut value)?;
        self.insert(key, value);
        Ok(())
    }
}

// The entries of an open map are kept in the order in which they were decoded.
impl Associative for Vec<(Value, Value)> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(
            self.iter()
                .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
        )
    }
}

impl AssociativeMut for Vec<(Value, Value)> {
    fn insert_with(
        &mut self,
        fill: &mut dyn FnMut(&mut dyn Reflect, &mut dyn Reflect) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        let mut key = Value::Nil;
        let mut value = Value::Nil;
        fill(&mut key, &mut value)?;
        self.push((key, value));
        Ok(())
    }
}

impl<T: Reflect + Default> Reflect for Option<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Ptr(self.as_ref().map(|value| value as &dyn Reflect))
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Ptr(self)
    }
}

impl<T: Reflect + Default> Pointer for Option<T> {
    fn set_nil(&mut self) -> bool {
        *self = None;
        true
    }

    fn pointee(&mut self) -> &mut dyn Reflect {
        self.get_or_insert_with(T::default)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Ptr(Some(&**self as &dyn Reflect))
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Ptr(self)
    }
}

impl<T: Reflect> Pointer for Box<T> {
    fn set_nil(&mut self) -> bool {
        false
    }

    fn pointee(&mut self) -> &mut dyn Reflect {
        &mut **self
    }
}

// A boxed trait object is an open slot that already holds a concrete value. Decoding goes
// through to that value, except for nil which replaces it with an open nil.
impl Reflect for Box<dyn Reflect> {
    fn shape(&self) -> Shape<'_> {
        Shape::Ptr(Some(&**self))
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Ptr(self)
    }
}

impl Pointer for Box<dyn Reflect> {
    fn set_nil(&mut self) -> bool {
        *self = Box::new(Value::Nil);
        true
    }

    fn pointee(&mut self) -> &mut dyn Reflect {
        &mut **self
    }
}

impl Reflect for Value {
    fn shape(&self) -> Shape<'_> {
        match self {
            Value::Nil => Shape::Nil,
            Value::Bool(p) => Shape::Bool(*p),
            Value::Int(n) => Shape::Signed(*n),
            Value::UInt(n) => Shape::Unsigned(*n),
            Value::Float(x) => Shape::F64(*x),
            Value::Str(s) => Shape::Str(s.as_str()),
            Value::Bin(blob) => Shape::Bytes(blob.as_slice()),
            Value::Array(items) => Shape::Seq(items),
            Value::Map(entries) => Shape::Map(entries),
            Value::Ext(ext) => Shape::Ext(ext),
        }
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Open(self)
    }
}
