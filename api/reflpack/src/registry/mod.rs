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

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use tracing::{debug, warn};


/// The error type returned by extension encoding and decoding functions.
pub type ExtError = Box<dyn std::error::Error + Send + Sync>;

type EncodeFn = dyn Fn(&dyn Any) -> Result<Vec<u8>, ExtError> + Send + Sync;
type DecodeFn = dyn Fn(&[u8]) -> Result<Box<dyn Any + Send + Sync>, ExtError> + Send + Sync;
type AssignFn = fn(Box<dyn Any + Send + Sync>, &mut dyn Any) -> bool;

/// Encoding and decoding functions for a native type that is written as a MessagePack
/// extension with a fixed type id.
pub struct ExtHandler {
    id: i8,
    type_id: TypeId,
    type_name: &'static str,
    encode: Box<EncodeFn>,
    decode: Box<DecodeFn>,
    assign: AssignFn,
}

#[derive(Debug)]
struct WrongType(&'static str);

impl std::fmt::Display for WrongType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Extension handler expected a value of type {}.", self.0)
    }
}

impl std::error::Error for WrongType {}

fn assign_as<T: Any>(value: Box<dyn Any + Send + Sync>, target: &mut dyn Any) -> bool {
    match (target.downcast_mut::<T>(), value.downcast::<T>()) {
        (Some(target), Ok(value)) => {
            *target = *value;
            true
        }
        _ => false,
    }
}

impl ExtHandler {
    fn new<T, E, D>(id: i8, encode: E, decode: D) -> Self
    where
        T: Any + Send + Sync,
        E: Fn(&T) -> Result<Vec<u8>, ExtError> + Send + Sync + 'static,
        D: Fn(&[u8]) -> Result<T, ExtError> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        ExtHandler {
            id,
            type_id: TypeId::of::<T>(),
            type_name,
            encode: Box::new(
                move |value: &dyn Any| -> Result<Vec<u8>, ExtError> {
                    match value.downcast_ref::<T>() {
                        Some(value) => encode(value),
                        None => Err(Box::new(WrongType(type_name))),
                    }
                },
            ),
            decode: Box::new(move |data: &[u8]| {
                decode(data).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
            }),
            assign: assign_as::<T>,
        }
    }

    /// The extension type id written to the wire.
    pub fn id(&self) -> i8 {
        self.id
    }

    /// The name of the native type (for diagnostics only).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn encode(&self, value: &dyn Any) -> Result<Vec<u8>, ExtError> {
        (self.encode)(value)
    }

    pub(crate) fn decode(&self, data: &[u8]) -> Result<Box<dyn Any + Send + Sync>, ExtError> {
        (self.decode)(data)
    }

    /// Whether the handler produces values of the type of `target`.
    pub(crate) fn accepts(&self, target: &dyn Any) -> bool {
        target.type_id() == self.type_id
    }

    /// Move a decoded value into a destination of the same type.
    pub(crate) fn assign(&self, value: Box<dyn Any + Send + Sync>, target: &mut dyn Any) -> bool {
        (self.assign)(value, target)
    }
}

impl Debug for ExtHandler {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtHandler")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Registered extension types, indexed both by native type and by wire id.
#[derive(Default)]
pub struct ExtensionRegistry {
    by_type: HashMap<TypeId, Arc<ExtHandler>>,
    by_id: HashMap<i8, Arc<ExtHandler>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Register a native type as an extension with the given id. A previous registration for
    /// either the same id or the same type is replaced.
    ///
    /// # Arguments
    /// * `id` - The extension type id. Negative ids are reserved for predefined extensions.
    /// * `encode` - Produces the payload for a value.
    /// * `decode` - Restores a value from a payload.
    pub fn register<T, E, D>(&mut self, id: i8, encode: E, decode: D) -> &mut Self
    where
        T: Any + Send + Sync,
        E: Fn(&T) -> Result<Vec<u8>, ExtError> + Send + Sync + 'static,
        D: Fn(&[u8]) -> Result<T, ExtError> + Send + Sync + 'static,
    {
        let handler = Arc::new(ExtHandler::new::<T, E, D>(id, encode, decode));
        let type_id = TypeId::of::<T>();
        if let Some(previous) = self.by_id.insert(id, handler.clone()) {
            warn!(
                id,
                previous = previous.type_name(),
                replacement = handler.type_name(),
                "Extension id registered more than once."
            );
            if previous.type_id != type_id {
                self.by_type.remove(&previous.type_id);
            }
        }
        if let Some(previous) = self.by_type.insert(type_id, handler.clone()) {
            if previous.id != id {
                warn!(
                    type_name = handler.type_name(),
                    previous = previous.id,
                    replacement = id,
                    "Extension type registered more than once."
                );
                self.by_id.remove(&previous.id);
            }
        }
        debug!(id, type_name = handler.type_name(), "Registered extension type.");
        self
    }

    pub fn by_type(&self, type_id: TypeId) -> Option<&ExtHandler> {
        self.by_type.get(&type_id).map(|handler| &**handler)
    }

    pub fn by_id(&self, id: i8) -> Option<&ExtHandler> {
        self.by_id.get(&id).map(|handler| &**handler)
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }
}

impl Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut ids = self.by_id.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        f.debug_struct("ExtensionRegistry")
            .field("ids", &ids)
            .finish()
    }
}
