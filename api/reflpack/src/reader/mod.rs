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

use std::fmt::{Display, Formatter};
use std::mem::size_of;
use std::str::Utf8Error;

use bytes::Buf;
use rmp::Marker;
use thiserror::Error;
use tracing::trace;

use crate::config::CodecConfig;
use crate::record::{Field, FieldTable, Record};
use crate::reflect::{RangeError, Reflect, ShapeMut};
use crate::registry::{ExtError, ExtensionRegistry};
use crate::value::{ExtValue, Value};


// Strings up to this length are validated on the stack before being copied to the destination.
const STACK_STR_LEN: usize = 255;

/// A numeric value read from the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Signed(n) => write!(f, "{}", n),
            Number::Unsigned(n) => write!(f, "{}", n),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// The category of a wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    Bin,
    Array,
    Map,
    Ext(i8),
}

impl Display for WireKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WireKind::Nil => write!(f, "nil"),
            WireKind::Bool => write!(f, "boolean"),
            WireKind::Int => write!(f, "integer"),
            WireKind::Float => write!(f, "float"),
            WireKind::Str => write!(f, "string"),
            WireKind::Bin => write!(f, "binary blob"),
            WireKind::Array => write!(f, "array"),
            WireKind::Map => write!(f, "map"),
            WireKind::Ext(id) => write!(f, "extension {}", id),
        }
    }
}

/// The position of a nested value within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment {
    /// An element of an array.
    Index(usize),
    /// The key of an entry of a map.
    Key(usize),
    /// The value of an entry of a map.
    Value(usize),
    /// A field of a record.
    Field(&'static str),
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "index {}", i),
            PathSegment::Key(i) => write!(f, "key of entry {}", i),
            PathSegment::Value(i) => write!(f, "value of entry {}", i),
            PathSegment::Field(name) => write!(f, "field {}", name),
        }
    }
}

/// Errors that can occur when decoding a value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The destination is not a writable reference.
    #[error("Cannot decode into a read-only reference to {0}.")]
    NotAPointer(&'static str),
    /// The destination is an empty reference.
    #[error("Cannot decode into an empty reference to {0}.")]
    NilPointer(&'static str),
    /// A field of a record cannot be set.
    #[error("Field {field} of {record} cannot be set.")]
    NotAddressable {
        record: &'static str,
        field: &'static str,
    },
    /// The wire value cannot be stored in the destination.
    #[error("Cannot decode {wire} into {target}.")]
    TypeMismatch {
        wire: WireKind,
        target: &'static str,
    },
    /// A number is above the maximum of the destination.
    #[error("{value} is too large for {target}.")]
    Overflow { value: Number, target: &'static str },
    /// A number is below the minimum of the destination.
    #[error("{value} is too small for {target}.")]
    Underflow { value: Number, target: &'static str },
    /// The input contains a tag byte that is never used.
    #[error("Invalid MessagePack tag: {0:#04x}.")]
    UnknownFormat(u8),
    /// The input contains an extension with an id that has not been registered.
    #[error("No extension is registered with id {0}.")]
    UnregisteredExtension(i8),
    /// The input ended before a complete value could be read.
    #[error("The input ended before the value was complete.")]
    TruncatedInput,
    #[error("A string contained invalid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),
    /// A declared length exceeded the configured maximum.
    #[error("A {kind} of length {len} exceeds the limit of {max}.")]
    LimitExceeded { kind: &'static str, len: u32, max: u32 },
    /// Values were nested more deeply than the configured limit.
    #[error("Nesting depth exceeded the limit of {0}.")]
    DepthExceeded(usize),
    /// A registered extension failed to decode its payload.
    #[error("Decoding extension {id} failed: {error}")]
    Extension { id: i8, error: ExtError },
    /// An error that occurred within a nested value.
    #[error("At {segment}: {source}")]
    At {
        segment: PathSegment,
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Record the position at which this error occurred, within the parent value.
    pub fn at(self, segment: PathSegment) -> Self {
        DecodeError::At {
            segment,
            source: Box::new(self),
        }
    }

    /// The error without any position information.
    pub fn root_cause(&self) -> &DecodeError {
        let mut current = self;
        while let DecodeError::At { source, .. } = current {
            current = source;
        }
        current
    }

    /// The position of the error from the outermost value inwards.
    pub fn path(&self) -> Vec<PathSegment> {
        let mut path = vec![];
        let mut current = self;
        while let DecodeError::At { segment, source } = current {
            path.push(*segment);
            current = source;
        }
        path
    }
}

fn out_of_range(err: RangeError, value: Number, target: &'static str) -> DecodeError {
    match err {
        RangeError::Overflow => DecodeError::Overflow { value, target },
        RangeError::Underflow => DecodeError::Underflow { value, target },
    }
}

fn mismatch(wire: WireKind, target: &'static str) -> DecodeError {
    DecodeError::TypeMismatch { wire, target }
}

fn check_limit(kind: &'static str, len: u32, max: u32) -> Result<(), DecodeError> {
    if len > max {
        Err(DecodeError::LimitExceeded { kind, len, max })
    } else {
        Ok(())
    }
}

/// Reads a single MessagePack value from a buffer into a destination.
pub(crate) struct Decoder<'a, R> {
    input: &'a mut R,
    registry: &'a ExtensionRegistry,
    config: &'a CodecConfig,
    depth: usize,
}

impl<'a, R: Buf> Decoder<'a, R> {
    pub fn new(input: &'a mut R, registry: &'a ExtensionRegistry, config: &'a CodecConfig) -> Self {
        Decoder {
            input,
            registry,
            config,
            depth: 0,
        }
    }

    pub fn decode(&mut self, target: &mut dyn Reflect) -> Result<(), DecodeError> {
        let marker = self.read_marker()?;
        self.decode_marked(marker, target)
    }

    fn decode_marked(
        &mut self,
        marker: Marker,
        target: &mut dyn Reflect,
    ) -> Result<(), DecodeError> {
        if let ShapeMut::Ptr(ptr) = target.shape_mut() {
            if matches!(marker, Marker::Null) && ptr.set_nil() {
                return Ok(());
            }
            return self.nested(|this| this.decode_marked(marker, ptr.pointee()));
        }

        let type_name = (*target).type_name();
        match marker {
            Marker::Null => match target.shape_mut() {
                ShapeMut::Open(value) => {
                    *value = Value::Nil;
                    Ok(())
                }
                _ => Err(mismatch(WireKind::Nil, type_name)),
            },
            Marker::True => decode_bool(true, target, type_name),
            Marker::False => decode_bool(false, target, type_name),
            Marker::FixPos(n) => decode_int(Number::Signed(i64::from(n)), target, type_name),
            Marker::FixNeg(n) => decode_int(Number::Signed(i64::from(n)), target, type_name),
            Marker::I8 => {
                let n = self.read(Buf::get_i8)?;
                decode_int(Number::Signed(i64::from(n)), target, type_name)
            }
            Marker::I16 => {
                let n = self.read(Buf::get_i16)?;
                decode_int(Number::Signed(i64::from(n)), target, type_name)
            }
            Marker::I32 => {
                let n = self.read(Buf::get_i32)?;
                decode_int(Number::Signed(i64::from(n)), target, type_name)
            }
            Marker::I64 => {
                let n = self.read(Buf::get_i64)?;
                decode_int(Number::Signed(n), target, type_name)
            }
            Marker::U8 => {
                let n = self.read(Buf::get_u8)?;
                decode_int(Number::Unsigned(u64::from(n)), target, type_name)
            }
            Marker::U16 => {
                let n = self.read(Buf::get_u16)?;
                decode_int(Number::Unsigned(u64::from(n)), target, type_name)
            }
            Marker::U32 => {
                let n = self.read(Buf::get_u32)?;
                decode_int(Number::Unsigned(u64::from(n)), target, type_name)
            }
            Marker::U64 => {
                let n = self.read(Buf::get_u64)?;
                decode_int(Number::Unsigned(n), target, type_name)
            }
            Marker::F32 => {
                let x = self.read(Buf::get_f32)?;
                decode_float(f64::from(x), target, type_name)
            }
            Marker::F64 => {
                let x = self.read(Buf::get_f64)?;
                decode_float(x, target, type_name)
            }
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => {
                self.decode_str(marker, target, type_name)
            }
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => {
                self.decode_bin(marker, target, type_name)
            }
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => {
                self.decode_array(marker, target, type_name)
            }
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => {
                self.decode_map(marker, target, type_name)
            }
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => {
                let len = self.read_len(marker)?;
                self.decode_ext(len, target, type_name)
            }
            Marker::Reserved => Err(DecodeError::UnknownFormat(Marker::Reserved.to_u8())),
        }
    }

    // Kept out of line so that a level of nesting only costs a small stack frame.
    #[inline(never)]
    fn decode_str(
        &mut self,
        marker: Marker,
        target: &mut dyn Reflect,
        type_name: &'static str,
    ) -> Result<(), DecodeError> {
        let len = self.read_len(marker)?;
        check_limit("string", len, self.config.max_str_len)?;
        let len = self.ensure(len)?;
        match target.shape_mut() {
            ShapeMut::Str(string) => self.with_str(len, |text| {
                string.clear();
                string.push_str(text);
            }),
            ShapeMut::Open(value) => {
                *value = Value::Str(self.with_str(len, |text| text.to_owned())?);
                Ok(())
            }
            _ => Err(mismatch(WireKind::Str, type_name)),
        }
    }

    #[inline(never)]
    fn decode_bin(
        &mut self,
        marker: Marker,
        target: &mut dyn Reflect,
        type_name: &'static str,
    ) -> Result<(), DecodeError> {
        let len = self.read_len(marker)?;
        check_limit("binary blob", len, self.config.max_bin_len)?;
        let len = self.ensure(len)?;
        match target.shape_mut() {
            ShapeMut::Bytes(blob) => {
                blob.clear();
                blob.resize(len, 0);
                self.input.copy_to_slice(blob.as_mut_slice());
                Ok(())
            }
            ShapeMut::Open(value) => {
                let mut blob = vec![0; len];
                self.input.copy_to_slice(blob.as_mut_slice());
                *value = Value::Bin(blob);
                Ok(())
            }
            _ => Err(mismatch(WireKind::Bin, type_name)),
        }
    }

    #[inline(never)]
    fn decode_array(
        &mut self,
        marker: Marker,
        target: &mut dyn Reflect,
        type_name: &'static str,
    ) -> Result<(), DecodeError> {
        let len = self.read_len(marker)?;
        check_limit("array", len, self.config.max_array_len)?;
        // Every element takes at least one byte.
        let len = self.ensure(len)?;
        match target.shape_mut() {
            ShapeMut::Seq(seq) => self.nested(|this| {
                seq.resize(len);
                for index in 0..len {
                    let item = seq
                        .item_mut(index)
                        .ok_or_else(|| mismatch(WireKind::Array, type_name))?;
                    this.decode(item)
                        .map_err(|err| err.at(PathSegment::Index(index)))?;
                }
                Ok(())
            }),
            // An array of integers can fill a byte vector, one element at a time.
            ShapeMut::Bytes(blob) => self.nested(|this| {
                blob.clear();
                blob.resize(len, 0);
                for (index, item) in blob.iter_mut().enumerate() {
                    this.decode(item)
                        .map_err(|err| err.at(PathSegment::Index(index)))?;
                }
                Ok(())
            }),
            ShapeMut::Open(value) => self.nested(|this| {
                let mut items = Vec::with_capacity(len);
                for index in 0..len {
                    let mut item = Value::Nil;
                    this.decode(&mut item)
                        .map_err(|err| err.at(PathSegment::Index(index)))?;
                    items.push(item);
                }
                *value = Value::Array(items);
                Ok(())
            }),
            _ => Err(mismatch(WireKind::Array, type_name)),
        }
    }

    #[inline(never)]
    fn decode_map(
        &mut self,
        marker: Marker,
        target: &mut dyn Reflect,
        type_name: &'static str,
    ) -> Result<(), DecodeError> {
        let len = self.read_len(marker)?;
        check_limit("map", len, self.config.max_map_len)?;
        let len = self.ensure_entries(len)?;
        match target.shape_mut() {
            ShapeMut::Map(map) => self.nested(|this| {
                for index in 0..len {
                    let mut fill = |key: &mut dyn Reflect, value: &mut dyn Reflect| {
                        this.decode(key)
                            .map_err(|err| err.at(PathSegment::Key(index)))?;
                        this.decode(value)
                            .map_err(|err| err.at(PathSegment::Value(index)))
                    };
                    map.insert_with(&mut fill)?;
                }
                Ok(())
            }),
            ShapeMut::Open(value) => self.nested(|this| {
                let mut entries = Vec::with_capacity(len);
                for index in 0..len {
                    let mut key = Value::Nil;
                    let mut item = Value::Nil;
                    this.decode(&mut key)
                        .map_err(|err| err.at(PathSegment::Key(index)))?;
                    this.decode(&mut item)
                        .map_err(|err| err.at(PathSegment::Value(index)))?;
                    entries.push((key, item));
                }
                *value = Value::Map(entries);
                Ok(())
            }),
            ShapeMut::Record(record) => {
                self.nested(|this| this.decode_record(len, record, type_name))
            }
            _ => Err(mismatch(WireKind::Map, type_name)),
        }
    }

    fn decode_record(
        &mut self,
        len: usize,
        record: &mut dyn Record,
        type_name: &'static str,
    ) -> Result<(), DecodeError> {
        let fields = record.fields();
        let table = FieldTable::new(fields);
        for _ in 0..len {
            let marker = self.read_marker()?;
            let key_len = match marker {
                Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => {
                    self.read_len(marker)?
                }
                _ => return Err(mismatch(self.wire_kind(marker)?, type_name)),
            };
            check_limit("string", key_len, self.config.max_str_len)?;
            let key_len = self.ensure(key_len)?;
            let index = self.with_str(key_len, |name| {
                let index = table.lookup(name);
                if index.is_none() {
                    trace!(record = type_name, field = name, "Skipping unknown field.");
                }
                index
            })?;
            match index {
                Some(index) => {
                    let name = fields.get(index).map_or("", Field::name);
                    let field = record
                        .field_mut(index)
                        .ok_or(DecodeError::NotAddressable {
                            record: type_name,
                            field: name,
                        })?;
                    self.decode(field)
                        .map_err(|err| err.at(PathSegment::Field(name)))?;
                }
                None => self.skip()?,
            }
        }
        Ok(())
    }

    #[inline(never)]
    fn decode_ext(
        &mut self,
        len: u32,
        target: &mut dyn Reflect,
        type_name: &'static str,
    ) -> Result<(), DecodeError> {
        let id = self.read(Buf::get_i8)?;
        let registry = self.registry;
        let handler = registry
            .by_id(id)
            .ok_or(DecodeError::UnregisteredExtension(id))?;
        check_limit("extension payload", len, self.config.max_ext_len)?;
        let len = self.ensure(len)?;
        let extension_error = |error: ExtError| DecodeError::Extension { id, error };
        match target.shape_mut() {
            ShapeMut::Open(value) => {
                let data = self.input.copy_to_bytes(len);
                let native = handler.decode(data.as_ref()).map_err(extension_error)?;
                *value = Value::Ext(ExtValue::with_native(id, data, native));
                Ok(())
            }
            _ => {
                if !handler.accepts((*target).as_any()) {
                    return Err(mismatch(WireKind::Ext(id), type_name));
                }
                let data = self.input.copy_to_bytes(len);
                let native = handler.decode(data.as_ref()).map_err(extension_error)?;
                if handler.assign(native, target.as_any_mut()) {
                    Ok(())
                } else {
                    Err(mismatch(WireKind::Ext(id), type_name))
                }
            }
        }
    }

    /// Classify a wire value that cannot be used. The type id of an extension is read.
    fn wire_kind(&mut self, marker: Marker) -> Result<WireKind, DecodeError> {
        let kind = match marker {
            Marker::Null => WireKind::Nil,
            Marker::True | Marker::False => WireKind::Bool,
            Marker::FixPos(_)
            | Marker::FixNeg(_)
            | Marker::U8
            | Marker::U16
            | Marker::U32
            | Marker::U64
            | Marker::I8
            | Marker::I16
            | Marker::I32
            | Marker::I64 => WireKind::Int,
            Marker::F32 | Marker::F64 => WireKind::Float,
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => WireKind::Str,
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => WireKind::Bin,
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => WireKind::Array,
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => WireKind::Map,
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => {
                self.read_len(marker)?;
                WireKind::Ext(self.read(Buf::get_i8)?)
            }
            Marker::Reserved => return Err(DecodeError::UnknownFormat(Marker::Reserved.to_u8())),
        };
        Ok(kind)
    }

    /// Consume a complete value without storing it. Extensions need not be registered.
    fn skip(&mut self) -> Result<(), DecodeError> {
        let marker = self.read_marker()?;
        match marker {
            Marker::Null
            | Marker::True
            | Marker::False
            | Marker::FixPos(_)
            | Marker::FixNeg(_) => Ok(()),
            Marker::U8 | Marker::I8 => self.advance(1),
            Marker::U16 | Marker::I16 => self.advance(2),
            Marker::U32 | Marker::I32 | Marker::F32 => self.advance(4),
            Marker::U64 | Marker::I64 | Marker::F64 => self.advance(8),
            Marker::FixStr(_)
            | Marker::Str8
            | Marker::Str16
            | Marker::Str32
            | Marker::Bin8
            | Marker::Bin16
            | Marker::Bin32 => {
                let len = self.read_len(marker)?;
                self.advance(len as usize)
            }
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => {
                let len = self.read_len(marker)?;
                let len = self.ensure(len)?;
                self.nested(|this| (0..len).try_for_each(|_| this.skip()))
            }
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => {
                let len = self.read_len(marker)?;
                let len = self.ensure_entries(len)?;
                self.nested(|this| {
                    (0..len).try_for_each(|_| {
                        this.skip()?;
                        this.skip()
                    })
                })
            }
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => {
                let len = self.read_len(marker)?;
                // The payload is preceded by the type id.
                self.advance(len as usize + 1)
            }
            Marker::Reserved => Err(DecodeError::UnknownFormat(Marker::Reserved.to_u8())),
        }
    }

    fn nested<F>(&mut self, f: F) -> Result<(), DecodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), DecodeError>,
    {
        let max_depth = self.config.max_depth;
        if self.depth >= max_depth {
            return Err(DecodeError::DepthExceeded(max_depth));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn read_marker(&mut self) -> Result<Marker, DecodeError> {
        let tag = self.read(Buf::get_u8)?;
        Ok(Marker::from_u8(tag))
    }

    fn read<T>(&mut self, get: fn(&mut R) -> T) -> Result<T, DecodeError> {
        if self.input.remaining() < size_of::<T>() {
            Err(DecodeError::TruncatedInput)
        } else {
            Ok(get(&mut *self.input))
        }
    }

    /// Read the length of a string, blob, collection or extension. This is either part of the
    /// marker or follows it.
    fn read_len(&mut self, marker: Marker) -> Result<u32, DecodeError> {
        match marker {
            Marker::FixStr(n) | Marker::FixArray(n) | Marker::FixMap(n) => Ok(u32::from(n)),
            Marker::FixExt1 => Ok(1),
            Marker::FixExt2 => Ok(2),
            Marker::FixExt4 => Ok(4),
            Marker::FixExt8 => Ok(8),
            Marker::FixExt16 => Ok(16),
            Marker::Str8 | Marker::Bin8 | Marker::Ext8 => self.read(Buf::get_u8).map(u32::from),
            Marker::Str16 | Marker::Bin16 | Marker::Ext16 | Marker::Array16 | Marker::Map16 => {
                self.read(Buf::get_u16).map(u32::from)
            }
            Marker::Str32 | Marker::Bin32 | Marker::Ext32 | Marker::Array32 | Marker::Map32 => {
                self.read(Buf::get_u32)
            }
            _ => Ok(0),
        }
    }

    /// Check that at least `len` bytes remain.
    fn ensure(&self, len: u32) -> Result<usize, DecodeError> {
        let len = len as usize;
        if self.input.remaining() < len {
            Err(DecodeError::TruncatedInput)
        } else {
            Ok(len)
        }
    }

    /// Check that enough input remains for `len` map entries.
    fn ensure_entries(&self, len: u32) -> Result<usize, DecodeError> {
        let len = len as usize;
        if self.input.remaining() / 2 < len {
            Err(DecodeError::TruncatedInput)
        } else {
            Ok(len)
        }
    }

    fn advance(&mut self, len: usize) -> Result<(), DecodeError> {
        if self.input.remaining() < len {
            Err(DecodeError::TruncatedInput)
        } else {
            self.input.advance(len);
            Ok(())
        }
    }

    /// Read a string of `len` bytes (which must be available) and pass it to `f`.
    fn with_str<T, F>(&mut self, len: usize, f: F) -> Result<T, DecodeError>
    where
        F: FnOnce(&str) -> T,
    {
        if len <= STACK_STR_LEN {
            let mut stack = [0u8; STACK_STR_LEN];
            let bytes = &mut stack[..len];
            self.input.copy_to_slice(bytes);
            Ok(f(std::str::from_utf8(bytes)?))
        } else {
            let bytes = self.input.copy_to_bytes(len);
            Ok(f(std::str::from_utf8(bytes.as_ref())?))
        }
    }
}

fn decode_bool(
    value: bool,
    target: &mut dyn Reflect,
    type_name: &'static str,
) -> Result<(), DecodeError> {
    match target.shape_mut() {
        ShapeMut::Bool(slot) => {
            *slot = value;
            Ok(())
        }
        ShapeMut::Open(slot) => {
            *slot = Value::Bool(value);
            Ok(())
        }
        _ => Err(mismatch(WireKind::Bool, type_name)),
    }
}

fn decode_int(
    number: Number,
    target: &mut dyn Reflect,
    type_name: &'static str,
) -> Result<(), DecodeError> {
    match (target.shape_mut(), number) {
        (ShapeMut::Int(slot), Number::Signed(n)) => slot
            .set(i128::from(n))
            .map_err(|err| out_of_range(err, number, type_name)),
        (ShapeMut::Int(slot), Number::Unsigned(n)) => slot
            .set(i128::from(n))
            .map_err(|err| out_of_range(err, number, type_name)),
        (ShapeMut::Open(slot), Number::Signed(n)) => {
            *slot = Value::Int(n);
            Ok(())
        }
        (ShapeMut::Open(slot), Number::Unsigned(n)) => {
            *slot = Value::UInt(n);
            Ok(())
        }
        _ => Err(mismatch(WireKind::Int, type_name)),
    }
}

fn decode_float(
    value: f64,
    target: &mut dyn Reflect,
    type_name: &'static str,
) -> Result<(), DecodeError> {
    match target.shape_mut() {
        ShapeMut::Float(slot) => slot
            .set(value)
            .map_err(|err| out_of_range(err, Number::Float(value), type_name)),
        ShapeMut::Open(slot) => {
            *slot = Value::Float(value);
            Ok(())
        }
        _ => Err(mismatch(WireKind::Float, type_name)),
    }
}
