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

use std::collections::HashMap;

use crate::reflect::Reflect;


/// The name that excludes a field from the wire format.
pub const SKIP_NAME: &str = "-";

/// A fixed-schema type with named fields. Records are written as MessagePack maps, keyed by
/// the wire name of each field (see [`Field::wire_name`]).
///
/// Implementations will usually be generated with [`reflect_record`](crate::reflect_record).
pub trait Record {
    /// Descriptors for the fields of the record, in declaration order.
    fn fields(&self) -> &'static [Field];

    /// The value of the field at `index` in [`Record::fields`].
    fn field(&self, index: usize) -> Option<&dyn Reflect>;

    /// A writable reference to the field at `index`. Returns nothing for fields that are
    /// readable but cannot be set.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;
}

/// Describes a single field of a [`Record`].
///
/// # Examples
///
/// ```
/// use reflpack::Field;
///
/// const ID: Field = Field::new("id");
/// const NAME: Field = Field::new("name").rename("n");
/// const CACHE: Field = Field::new("cache").skip();
///
/// assert_eq!(ID.wire_name(), Some("id"));
/// assert_eq!(NAME.wire_name(), Some("n"));
/// assert_eq!(CACHE.wire_name(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    rename: Option<&'static str>,
    alias: Option<&'static str>,
    visible: bool,
}

impl Field {
    /// A visible field with its declared name.
    pub const fn new(name: &'static str) -> Self {
        Field {
            name,
            rename: None,
            alias: None,
            visible: true,
        }
    }

    /// Use an explicit wire name for the field. An empty name is ignored.
    pub const fn rename(mut self, wire_name: &'static str) -> Self {
        self.rename = Some(wire_name);
        self
    }

    /// A secondary wire name, used if there is no explicit wire name.
    pub const fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Exclude the field from the wire format.
    pub const fn skip(self) -> Self {
        self.rename(SKIP_NAME)
    }

    /// Mark the field as not externally visible. Such fields are never written and are
    /// ignored when reading.
    pub const fn private(mut self) -> Self {
        self.visible = false;
        self
    }

    /// The declared name of the field.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Resolve the name used for this field on the wire, if it has one.
    pub fn wire_name(&self) -> Option<&'static str> {
        if !self.visible {
            return None;
        }
        let name = [self.rename, self.alias]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
            .unwrap_or(self.name);
        if name == SKIP_NAME || name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// Iterate over the fields that appear on the wire, with their index and wire name.
pub fn wire_fields(fields: &'static [Field]) -> impl Iterator<Item = (usize, &'static str)> {
    fields
        .iter()
        .enumerate()
        .filter_map(|(index, field)| field.wire_name().map(|name| (index, name)))
}

/// Reverse lookup from wire names to field indices for a record type. If two fields resolve
/// to the same name, the later one wins.
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    names: HashMap<&'static str, usize>,
}

impl FieldTable {
    pub fn new(fields: &'static [Field]) -> Self {
        FieldTable {
            names: wire_fields(fields).map(|(index, name)| (name, index)).collect(),
        }
    }

    pub fn lookup(&self, wire_name: &str) -> Option<usize> {
        self.names.get(wire_name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Implement [`Record`] and [`Reflect`] for a struct by listing its fields, in declaration
/// order, with their descriptors.
///
/// # Examples
///
/// ```
/// use reflpack::{reflect_record, Codec, Field};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
///     label: Option<String>,
/// }
///
/// reflect_record! {
///     Point {
///         x: Field::new("x"),
///         y: Field::new("y"),
///         label: Field::new("label").rename("l"),
///     }
/// }
///
/// let codec = Codec::new();
/// let point = Point { x: 1, y: -2, label: None };
/// let bytes = codec.encode(&point).unwrap();
/// let restored: Point = codec.decode_value(&bytes).unwrap();
/// assert_eq!(restored, point);
/// ```
#[macro_export]
macro_rules! reflect_record {
    ($ty:ident { $($field:ident : $desc:expr),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn fields(&self) -> &'static [$crate::Field] {
                const FIELDS: &[$crate::Field] = &[$($desc),*];
                FIELDS
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field(&self, index: usize) -> ::core::option::Option<&dyn $crate::Reflect> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::core::option::Option::Some(&self.$field as &dyn $crate::Reflect);
                    }
                    position += 1;
                )*
                ::core::option::Option::None
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn $crate::Reflect> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::core::option::Option::Some(
                            &mut self.$field as &mut dyn $crate::Reflect,
                        );
                    }
                    position += 1;
                )*
                ::core::option::Option::None
            }
        }

        impl $crate::Reflect for $ty {
            fn shape(&self) -> $crate::Shape<'_> {
                $crate::Shape::Record(self)
            }

            fn shape_mut(&mut self) -> $crate::ShapeMut<'_> {
                $crate::ShapeMut::Record(self)
            }
        }
    };
}
