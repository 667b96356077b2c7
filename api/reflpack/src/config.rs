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

const DEFAULT_MAX_DEPTH: usize = 128;

/// Limits applied by a [`crate::Codec`] to protect against hostile input.
///
/// Length limits are checked against the length declared in the wire data before anything is
/// allocated. The depth limit applies to nested arrays, maps, records and pointers when both
/// encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum length, in bytes, of a string.
    pub max_str_len: u32,
    /// Maximum length, in bytes, of a binary blob.
    pub max_bin_len: u32,
    /// Maximum length, in bytes, of an extension payload.
    pub max_ext_len: u32,
    /// Maximum number of elements in an array.
    pub max_array_len: u32,
    /// Maximum number of entries in a map.
    pub max_map_len: u32,
    /// Maximum nesting depth.
    pub max_depth: usize,
}

impl CodecConfig {
    pub const DEFAULT: CodecConfig = CodecConfig {
        max_str_len: u32::MAX,
        max_bin_len: u32::MAX,
        max_ext_len: u32::MAX,
        max_array_len: u32::MAX,
        max_map_len: u32::MAX,
        max_depth: DEFAULT_MAX_DEPTH,
    };

    pub const fn with_max_str_len(mut self, max: u32) -> Self {
        self.max_str_len = max;
        self
    }

    pub const fn with_max_bin_len(mut self, max: u32) -> Self {
        self.max_bin_len = max;
        self
    }

    pub const fn with_max_ext_len(mut self, max: u32) -> Self {
        self.max_ext_len = max;
        self
    }

    pub const fn with_max_array_len(mut self, max: u32) -> Self {
        self.max_array_len = max;
        self
    }

    pub const fn with_max_map_len(mut self, max: u32) -> Self {
        self.max_map_len = max;
        self
    }

    pub const fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
