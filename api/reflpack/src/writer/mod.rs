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

use std::convert::Infallible;

use rmp::encode::{
    write_array_len, write_bin_len, write_bool, write_ext_meta, write_f32, write_f64, write_i16,
    write_i32, write_i64, write_i8, write_map_len, write_nfix, write_nil, write_pfix,
    write_str_len, write_uint, ByteBuf, RmpWrite, ValueWriteError,
};
use thiserror::Error;

use crate::config::CodecConfig;
use crate::record::{wire_fields, Record};
use crate::reflect::{Reflect, Shape};
use crate::registry::{ExtError, ExtHandler, ExtensionRegistry};


const I8_MIN: i64 = i8::MIN as i64;
const I16_MIN: i64 = i16::MIN as i64;
const I16_MAX: i64 = i16::MAX as i64;
const I32_MIN: i64 = i32::MIN as i64;
const I32_MAX: i64 = i32::MAX as i64;

/// Errors that can occur when encoding a value.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value has no structural representation and no extension is registered for its type.
    #[error("Values of type {0} cannot be encoded without a registered extension.")]
    UnsupportedKind(&'static str),
    /// A registered extension failed to encode a value.
    #[error("Encoding extension {id} failed: {error}")]
    Extension { id: i8, error: ExtError },
    /// A string, blob, collection or extension payload is too long for MessagePack.
    #[error("A {kind} of length {len} is too long to be encoded.")]
    TooLong { kind: &'static str, len: usize },
    /// Values were nested more deeply than the configured limit.
    #[error("Nesting depth exceeded the limit of {0}.")]
    DepthExceeded(usize),
    /// A record reported a field that it could not produce.
    #[error("Record {record} did not provide field {field}.")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },
}

impl From<ValueWriteError<Infallible>> for EncodeError {
    fn from(value: ValueWriteError<Infallible>) -> Self {
        match value {
            ValueWriteError::InvalidMarkerWrite(e) => match e {},
            ValueWriteError::InvalidDataWrite(e) => match e {},
        }
    }
}

impl From<Infallible> for EncodeError {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

fn wire_len(kind: &'static str, len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::TooLong { kind, len })
}

/// Walks a value, depth first, writing its MessagePack representation into a buffer.
pub(crate) struct Encoder<'a> {
    registry: &'a ExtensionRegistry,
    max_depth: usize,
    depth: usize,
    buf: ByteBuf,
}

impl<'a> Encoder<'a> {
    pub fn new(registry: &'a ExtensionRegistry, config: &CodecConfig) -> Self {
        Encoder {
            registry,
            max_depth: config.max_depth,
            depth: 0,
            buf: ByteBuf::new(),
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.into_vec()
    }

    pub fn encode(&mut self, value: &dyn Reflect) -> Result<(), EncodeError> {
        let registry = self.registry;
        if !registry.is_empty() {
            if let Some(handler) = registry.by_type(value.as_any().type_id()) {
                return self.encode_with(handler, value);
            }
        }
        let buf = &mut self.buf;
        match value.shape() {
            Shape::Nil | Shape::Ptr(None) => write_nil(buf)?,
            Shape::Bool(p) => write_bool(buf, p)?,
            Shape::Signed(n) => write_signed(buf, n)?,
            Shape::Unsigned(n) => {
                write_uint(buf, n)?;
            }
            Shape::F32(x) => write_f32(buf, x)?,
            Shape::F64(x) => write_f64(buf, x)?,
            Shape::Str(string) => {
                write_str_len(buf, wire_len("string", string.len())?)?;
                buf.write_bytes(string.as_bytes())?;
            }
            Shape::Bytes(blob) => {
                write_bin_len(buf, wire_len("binary blob", blob.len())?)?;
                buf.write_bytes(blob)?;
            }
            Shape::Seq(seq) => {
                write_array_len(buf, wire_len("sequence", seq.len())?)?;
                self.nested(|this| seq.items().try_for_each(|item| this.encode(item)))?;
            }
            Shape::Map(map) => {
                write_map_len(buf, wire_len("map", map.len())?)?;
                self.nested(|this| {
                    map.entries().try_for_each(|(key, value)| {
                        this.encode(key)?;
                        this.encode(value)
                    })
                })?;
            }
            Shape::Record(record) => self.encode_record(value.type_name(), record)?,
            Shape::Ptr(Some(inner)) => self.nested(|this| this.encode(inner))?,
            Shape::Ext(ext) => write_ext(buf, ext.id(), ext.data())?,
            Shape::Opaque => return Err(EncodeError::UnsupportedKind(value.type_name())),
        }
        Ok(())
    }

    fn encode_with(&mut self, handler: &ExtHandler, value: &dyn Reflect) -> Result<(), EncodeError> {
        let id = handler.id();
        let payload = handler
            .encode(value.as_any())
            .map_err(|error| EncodeError::Extension { id, error })?;
        write_ext(&mut self.buf, id, payload.as_slice())
    }

    fn encode_record(
        &mut self,
        type_name: &'static str,
        record: &dyn Record,
    ) -> Result<(), EncodeError> {
        let fields = record.fields();
        let count = wire_fields(fields).count();
        write_map_len(&mut self.buf, wire_len("record", count)?)?;
        self.nested(|this| {
            wire_fields(fields).try_for_each(|(index, name)| {
                let value = record.field(index).ok_or(EncodeError::MissingField {
                    record: type_name,
                    field: name,
                })?;
                write_str_len(&mut this.buf, wire_len("string", name.len())?)?;
                this.buf.write_bytes(name.as_bytes())?;
                this.encode(value)
            })
        })
    }

    fn nested<F>(&mut self, f: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodeError>,
    {
        if self.depth >= self.max_depth {
            return Err(EncodeError::DepthExceeded(self.max_depth));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Write a signed integer with the narrowest signed tag. Non-negative values below 128 use a
/// positive fixint.
fn write_signed(buf: &mut ByteBuf, n: i64) -> Result<(), EncodeError> {
    match n {
        -32..=-1 => write_nfix(buf, n as i8)?,
        0..=127 => write_pfix(buf, n as u8)?,
        I8_MIN..=-33 => write_i8(buf, n as i8)?,
        I16_MIN..=I16_MAX => write_i16(buf, n as i16)?,
        I32_MIN..=I32_MAX => write_i32(buf, n as i32)?,
        _ => write_i64(buf, n)?,
    }
    Ok(())
}

fn write_ext(buf: &mut ByteBuf, id: i8, payload: &[u8]) -> Result<(), EncodeError> {
    write_ext_meta(buf, wire_len("extension payload", payload.len())?, id)?;
    buf.write_bytes(payload)?;
    Ok(())
}
