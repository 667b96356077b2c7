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

//! A reflective MessagePack codec.
//!
//! Values are described to the codec through the [`Reflect`] trait, which exposes the shape of a
//! value at runtime. The encoder walks that shape and writes the narrowest MessagePack encoding
//! for each part of it. The decoder reads MessagePack and fills in a destination of whatever
//! shape the caller provides, converting between compatible representations and failing when
//! the wire data does not fit.
//!
//! Fixed-schema types are described with [`Record`] (usually through [`reflect_record`]) and are
//! written as maps keyed by field name. Types with no structure of their own can be written as
//! MessagePack extensions by registering encoding and decoding functions with a [`Codec`].

mod codec;
mod config;
mod reader;
mod record;
mod reflect;
mod registry;
mod value;
mod writer;

pub use codec::{Codec, Target};
pub use config::CodecConfig;
pub use reader::{DecodeError, Number, PathSegment, WireKind};
pub use record::{wire_fields, Field, FieldTable, Record, SKIP_NAME};
pub use reflect::{
    AsAny, Associative, AssociativeMut, FloatSlot, IntSlot, Pointer, RangeError, Reflect,
    Sequence, SequenceMut, Shape, ShapeMut,
};
pub use registry::{ExtError, ExtHandler, ExtensionRegistry};
pub use value::{ExtValue, Value};
pub use writer::EncodeError;
