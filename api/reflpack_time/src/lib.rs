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

//! The MessagePack timestamp extension (type id -1) for `reflpack`.

use bytes::{Buf, BufMut};
use chrono::{DateTime, LocalResult, TimeZone, Utc};
use reflpack::{Codec, Reflect, Shape, ShapeMut};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// The extension type id reserved for timestamps.
pub const TIMESTAMP_EXT: i8 = -1;

const MAX_NANOS: u32 = 999_999_999;
const SECONDS_34_BITS: u64 = 0x3_ffff_ffff;

/// A point in time, written to MessagePack as a timestamp extension.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Ord, PartialOrd, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// A timestamp for the current time.
    pub fn now() -> Timestamp {
        Timestamp(Utc::now())
    }
}

impl AsRef<DateTime<Utc>> for Timestamp {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl<TZ> From<DateTime<TZ>> for Timestamp
where
    TZ: TimeZone,
{
    fn from(dt: DateTime<TZ>) -> Self {
        Timestamp(dt.with_timezone(&Utc))
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl Reflect for Timestamp {
    fn shape(&self) -> Shape<'_> {
        Shape::Opaque
    }

    fn shape_mut(&mut self) -> ShapeMut<'_> {
        ShapeMut::Opaque
    }
}

/// Errors produced by the timestamp extension.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimestampError {
    #[error("A timestamp must be 4, 8 or 12 bytes long, not {0}.")]
    InvalidSize(usize),
    #[error("{0} is not a valid number of nanoseconds.")]
    InvalidNanos(u32),
    #[error("The timestamp is out of range.")]
    OutOfRange,
}

/// Write a timestamp with the smallest of the three timestamp formats that can hold it.
///
/// * 4 bytes: unsigned 32 bit seconds, when there is no fractional part.
/// * 8 bytes: 30 bit nanoseconds and unsigned 34 bit seconds.
/// * 12 bytes: 32 bit nanoseconds and signed 64 bit seconds.
pub fn encode_timestamp(timestamp: &Timestamp) -> Result<Vec<u8>, TimestampError> {
    let seconds = timestamp.0.timestamp();
    let nanos = timestamp.0.timestamp_subsec_nanos();
    if nanos > MAX_NANOS {
        return Err(TimestampError::InvalidNanos(nanos));
    }
    match u64::try_from(seconds) {
        Ok(secs) if secs >> 34 == 0 => {
            let content = (u64::from(nanos) << 34) | secs;
            if content >> 32 == 0 {
                let mut buf = Vec::with_capacity(4);
                buf.put_u32(content as u32);
                Ok(buf)
            } else {
                let mut buf = Vec::with_capacity(8);
                buf.put_u64(content);
                Ok(buf)
            }
        }
        _ => {
            let mut buf = Vec::with_capacity(12);
            buf.put_u32(nanos);
            buf.put_i64(seconds);
            Ok(buf)
        }
    }
}

/// Read a timestamp in any of the three timestamp formats.
pub fn decode_timestamp(mut data: &[u8]) -> Result<Timestamp, TimestampError> {
    let (seconds, nanos) = match data.len() {
        4 => (i64::from(data.get_u32()), 0),
        8 => {
            let content = data.get_u64();
            ((content & SECONDS_34_BITS) as i64, (content >> 34) as u32)
        }
        12 => {
            let nanos = data.get_u32();
            (data.get_i64(), nanos)
        }
        len => return Err(TimestampError::InvalidSize(len)),
    };
    if nanos > MAX_NANOS {
        return Err(TimestampError::InvalidNanos(nanos));
    }
    match Utc.timestamp_opt(seconds, nanos) {
        LocalResult::Single(dt) => Ok(Timestamp(dt)),
        _ => Err(TimestampError::OutOfRange),
    }
}

/// Register the timestamp extension with a codec.
pub fn register(codec: &mut Codec) -> &mut Codec {
    codec.register_extension(
        TIMESTAMP_EXT,
        |timestamp: &Timestamp| encode_timestamp(timestamp).map_err(Into::into),
        |data: &[u8]| decode_timestamp(data).map_err(Into::into),
    )
}
