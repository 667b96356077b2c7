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

use bytes::{Buf, Bytes, BytesMut};

use crate::config::CodecConfig;
use crate::reader::{DecodeError, Decoder};
use crate::reflect::Reflect;
use crate::registry::{ExtError, ExtensionRegistry};
use crate::writer::{EncodeError, Encoder};

/// The destination of a decode operation.
pub enum Target<'a> {
    /// A writable reference.
    Slot(&'a mut dyn Reflect),
    /// A reference that cannot be written to.
    ReadOnly(&'a dyn Reflect),
    /// An empty reference to a value of the named type.
    Nil(&'static str),
}

impl<'a, T: Reflect> From<&'a mut T> for Target<'a> {
    fn from(value: &'a mut T) -> Self {
        Target::Slot(value)
    }
}

impl<'a> From<&'a mut dyn Reflect> for Target<'a> {
    fn from(value: &'a mut dyn Reflect) -> Self {
        Target::Slot(value)
    }
}

impl<'a, T: Reflect> From<&'a T> for Target<'a> {
    fn from(value: &'a T) -> Self {
        Target::ReadOnly(value)
    }
}

impl<'a> From<&'a dyn Reflect> for Target<'a> {
    fn from(value: &'a dyn Reflect) -> Self {
        Target::ReadOnly(value)
    }
}

impl<'a, T: Reflect> From<Option<&'a mut T>> for Target<'a> {
    fn from(value: Option<&'a mut T>) -> Self {
        match value {
            Some(value) => Target::Slot(value),
            None => Target::Nil(std::any::type_name::<T>()),
        }
    }
}

/// Encodes values to, and decodes values from, MessagePack.
///
/// A codec holds the registered extension types and the limits applied when reading. Once
/// configured it can be shared between threads freely.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use reflpack::{Codec, Value};
///
/// let codec = Codec::new();
/// let mut scores = BTreeMap::new();
/// scores.insert("a".to_string(), 1i32);
///
/// let bytes = codec.encode(&scores).unwrap();
/// assert_eq!(&bytes[..], &[0x81, 0xa1, b'a', 0x01]);
///
/// let mut open = Value::Nil;
/// codec.decode(&bytes, &mut open).unwrap();
/// assert_eq!(open.get("a"), Some(&Value::Int(1)));
/// ```
#[derive(Debug, Default)]
pub struct Codec {
    registry: ExtensionRegistry,
    config: CodecConfig,
}

impl Codec {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Codec {
            registry: ExtensionRegistry::default(),
            config,
        }
    }

    pub fn from_parts(registry: ExtensionRegistry, config: CodecConfig) -> Self {
        Codec { registry, config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Register a native type as an extension. See [`ExtensionRegistry::register`].
    pub fn register_extension<T, E, D>(&mut self, id: i8, encode: E, decode: D) -> &mut Self
    where
        T: Any + Send + Sync,
        E: Fn(&T) -> Result<Vec<u8>, ExtError> + Send + Sync + 'static,
        D: Fn(&[u8]) -> Result<T, ExtError> + Send + Sync + 'static,
    {
        self.registry.register(id, encode, decode);
        self
    }

    /// Encode a value as a single MessagePack value.
    pub fn encode(&self, value: &dyn Reflect) -> Result<Bytes, EncodeError> {
        let mut encoder = Encoder::new(&self.registry, &self.config);
        encoder.encode(value)?;
        Ok(Bytes::from(encoder.into_vec()))
    }

    /// Append the encoding of a value to a buffer. Nothing is written if encoding fails.
    pub fn encode_into(&self, value: &dyn Reflect, buf: &mut BytesMut) -> Result<(), EncodeError> {
        let mut encoder = Encoder::new(&self.registry, &self.config);
        encoder.encode(value)?;
        buf.extend_from_slice(encoder.into_vec().as_slice());
        Ok(())
    }

    /// Decode the first MessagePack value in `bytes` into a destination. Any further bytes are
    /// ignored.
    pub fn decode<'t>(
        &self,
        bytes: &[u8],
        target: impl Into<Target<'t>>,
    ) -> Result<(), DecodeError> {
        let mut input = bytes;
        self.decode_from(&mut input, target)
    }

    /// Decode a MessagePack value from the front of a buffer into a destination. The buffer is
    /// advanced past the value so that consecutive values can be read.
    pub fn decode_from<'t, R: Buf>(
        &self,
        input: &mut R,
        target: impl Into<Target<'t>>,
    ) -> Result<(), DecodeError> {
        match target.into() {
            Target::Slot(target) => {
                Decoder::new(input, &self.registry, &self.config).decode(target)
            }
            Target::ReadOnly(target) => Err(DecodeError::NotAPointer(target.type_name())),
            Target::Nil(type_name) => Err(DecodeError::NilPointer(type_name)),
        }
    }

    /// Decode the first MessagePack value in `bytes` into a new value.
    pub fn decode_value<T: Reflect + Default>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        let mut value = T::default();
        self.decode(bytes, &mut value)?;
        Ok(value)
    }

    /// Encode a value, panicking if this fails.
    pub fn must_encode(&self, value: &dyn Reflect) -> Bytes {
        match self.encode(value) {
            Ok(bytes) => bytes,
            Err(err) => panic!("{}", err),
        }
    }

    /// Decode a value, panicking if this fails.
    pub fn must_decode<'t>(&self, bytes: &[u8], target: impl Into<Target<'t>>) {
        if let Err(err) = self.decode(bytes, target) {
            panic!("{}", err);
        }
    }
}
