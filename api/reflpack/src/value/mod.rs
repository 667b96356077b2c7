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
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use bytes::Bytes;


/// A dynamically typed MessagePack value. This is the type synthesized when decoding into an
/// open destination and it can be encoded like any other value.
///
/// Maps are kept as a list of entries so that the order of the wire data is preserved and keys
/// of any kind are allowed.
///
/// Integers compare by numeric value, so `Int(5)` and `UInt(5)` are equal. Which of the two a
/// decoded integer becomes depends only on the tag it was written with.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    /// Integers read from a signed (or positive fixint) tag.
    Int(i64),
    /// Integers read from an unsigned tag.
    UInt(u64),
    Float(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Ext(ExtValue),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(p) => Some(*p),
            _ => None,
        }
    }

    /// Interpret the value as a signed integer, if it is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::UInt(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Interpret the value as an unsigned integer, if it is an integer in range.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(n) => u64::try_from(*n).ok(),
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bin(blob) => Some(blob.as_slice()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_ext(&self) -> Option<&ExtValue> {
        match self {
            Value::Ext(ext) => Some(ext),
            _ => None,
        }
    }

    /// Find the first entry of a map with a string key equal to `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(p), Value::Bool(q)) => p == q,
            (Value::Int(n), Value::Int(m)) => n == m,
            (Value::UInt(n), Value::UInt(m)) => n == m,
            (Value::Int(n), Value::UInt(m)) | (Value::UInt(m), Value::Int(n)) => {
                u64::try_from(*n).map_or(false, |n| n == *m)
            }
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Str(s), Value::Str(t)) => s == t,
            (Value::Bin(a), Value::Bin(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Ext(a), Value::Ext(b)) => a == b,
            _ => false,
        }
    }
}

macro_rules! value_from {
    ($($t:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::$variant(<$target>::from(value))
                }
            }
        )*
    };
}

value_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => Str as String,
    &str => Str as String,
    Vec<u8> => Bin as Vec<u8>,
    Vec<Value> => Array as Vec<Value>,
    ExtValue => Ext as ExtValue,
}

/// An extension value: an application defined type id with an opaque payload.
///
/// When an extension is decoded with a registered handler into an open destination, the
/// native value produced by the handler is kept alongside the payload and can be recovered
/// with [`ExtValue::downcast_ref`]. Two extension values are equal if their ids and payloads
/// are equal.
#[derive(Clone)]
pub struct ExtValue {
    id: i8,
    data: Bytes,
    native: Option<Arc<dyn Any + Send + Sync>>,
}

impl ExtValue {
    pub fn new(id: i8, data: impl Into<Bytes>) -> Self {
        ExtValue {
            id,
            data: data.into(),
            native: None,
        }
    }

    pub(crate) fn with_native(id: i8, data: Bytes, native: Box<dyn Any + Send + Sync>) -> Self {
        ExtValue {
            id,
            data,
            native: Some(Arc::from(native)),
        }
    }

    pub fn id(&self) -> i8 {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// The decoded native value, if it was produced by a handler of type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.native
            .as_deref()
            .and_then(|native| native.downcast_ref::<T>())
    }
}

impl PartialEq for ExtValue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.data == other.data
    }
}

impl Debug for ExtValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtValue")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("native", &self.native.is_some())
            .finish()
    }
}
