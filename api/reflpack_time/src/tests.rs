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

use chrono::{DateTime, TimeZone, Utc};
use reflpack::{Codec, DecodeError, Value};

use crate::{decode_timestamp, encode_timestamp, register, Timestamp, TimestampError};

fn at(secs: i64, nanos: u32) -> Timestamp {
    Timestamp::from(Utc.timestamp_opt(secs, nanos).unwrap())
}

fn codec() -> Codec {
    let mut codec = Codec::new();
    register(&mut codec);
    codec
}

#[test]
fn whole_seconds_use_four_bytes() {
    assert_eq!(encode_timestamp(&at(0, 0)), Ok(vec![0, 0, 0, 0]));
    assert_eq!(encode_timestamp(&at(1, 0)), Ok(vec![0, 0, 0, 1]));
    assert_eq!(
        encode_timestamp(&at(u32::MAX as i64, 0)),
        Ok(vec![0xff, 0xff, 0xff, 0xff])
    );
}

#[test]
fn fractional_seconds_use_eight_bytes() {
    assert_eq!(
        encode_timestamp(&at(1, 1)),
        Ok(vec![0, 0, 0, 0x04, 0, 0, 0, 0x01])
    );
    let largest = (1i64 << 34) - 1;
    let bytes = encode_timestamp(&at(largest, 999_999_999)).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(decode_timestamp(&bytes), Ok(at(largest, 999_999_999)));
}

#[test]
fn wide_seconds_use_twelve_bytes() {
    assert_eq!(
        encode_timestamp(&at(-1, 0)),
        Ok(vec![0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
    );
    let bytes = encode_timestamp(&at(1 << 34, 5)).unwrap();
    assert_eq!(bytes, vec![0, 0, 0, 5, 0, 0, 0, 0x04, 0, 0, 0, 0]);
    assert_eq!(decode_timestamp(&bytes), Ok(at(1 << 34, 5)));
}

#[test]
fn decode_each_form() {
    assert_eq!(decode_timestamp(&[0, 0, 0, 0x2a]), Ok(at(42, 0)));
    assert_eq!(
        decode_timestamp(&[0, 0, 0, 0x04, 0, 0, 0, 0x01]),
        Ok(at(1, 1))
    );
    assert_eq!(
        decode_timestamp(&[0, 0, 0, 0x07, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]),
        Ok(at(-2, 7))
    );
}

#[test]
fn reject_bad_sizes() {
    assert_eq!(decode_timestamp(&[]), Err(TimestampError::InvalidSize(0)));
    assert_eq!(
        decode_timestamp(&[0, 0, 0, 0, 0]),
        Err(TimestampError::InvalidSize(5))
    );
    assert_eq!(
        decode_timestamp(&[0; 16]),
        Err(TimestampError::InvalidSize(16))
    );
}

#[test]
fn reject_bad_nanos() {
    let mut twelve = vec![];
    twelve.extend_from_slice(&1_000_000_000u32.to_be_bytes());
    twelve.extend_from_slice(&0i64.to_be_bytes());
    assert_eq!(
        decode_timestamp(&twelve),
        Err(TimestampError::InvalidNanos(1_000_000_000))
    );

    let eight = (((1u64 << 30) - 1) << 34).to_be_bytes();
    assert_eq!(
        decode_timestamp(&eight),
        Err(TimestampError::InvalidNanos((1 << 30) - 1))
    );

    let leap_second = at(59, 1_500_000_000);
    assert_eq!(
        encode_timestamp(&leap_second),
        Err(TimestampError::InvalidNanos(1_500_000_000))
    );
}

#[test]
fn reject_out_of_range() {
    let mut twelve = vec![0, 0, 0, 0];
    twelve.extend_from_slice(&i64::MAX.to_be_bytes());
    assert_eq!(decode_timestamp(&twelve), Err(TimestampError::OutOfRange));
}

#[test]
fn chrono_conversions() {
    let dt: DateTime<Utc> = Utc.timestamp_opt(1_700_000_000, 250).unwrap();
    let timestamp = Timestamp::from(dt);
    assert_eq!(timestamp.as_ref(), &dt);
    assert_eq!(DateTime::<Utc>::from(timestamp), dt);
    assert!(Timestamp::now() > timestamp);
}

#[test]
fn codec_wire_format() {
    let codec = codec();
    let bytes = codec.encode(&at(1, 0)).unwrap();
    assert_eq!(&bytes[..], &[0xd6, 0xff, 0, 0, 0, 1]);

    let bytes = codec.encode(&at(1, 1)).unwrap();
    assert_eq!(&bytes[..], &[0xd7, 0xff, 0, 0, 0, 0x04, 0, 0, 0, 0x01]);

    let bytes = codec.encode(&at(-1, 0)).unwrap();
    assert_eq!(&bytes[..3], &[0xc7, 0x0c, 0xff]);
    assert_eq!(bytes.len(), 15);
}

#[test]
fn codec_round_trip() {
    let codec = codec();
    for timestamp in [
        at(0, 0),
        at(1_700_000_000, 0),
        at(1_700_000_000, 123_456_789),
        at(-86_400, 1),
        at(1 << 40, 0),
    ] {
        let bytes = codec.encode(&timestamp).unwrap();
        let restored: Timestamp = codec.decode_value(&bytes).unwrap();
        assert_eq!(restored, timestamp);
    }
}

#[test]
fn optional_timestamps() {
    let codec = codec();
    let present = Some(at(3, 0));
    let bytes = codec.encode(&present).unwrap();
    let restored: Option<Timestamp> = codec.decode_value(&bytes).unwrap();
    assert_eq!(restored, present);

    let bytes = codec.encode(&None::<Timestamp>).unwrap();
    assert_eq!(&bytes[..], &[0xc0]);
    let restored: Option<Timestamp> = codec.decode_value(&bytes).unwrap();
    assert_eq!(restored, None);
}

#[test]
fn open_destination_keeps_timestamp() {
    let codec = codec();
    let timestamp = at(1_700_000_000, 5);
    let bytes = codec.encode(&timestamp).unwrap();
    let value: Value = codec.decode_value(&bytes).unwrap();
    match &value {
        Value::Ext(ext) => {
            assert_eq!(ext.id(), crate::TIMESTAMP_EXT);
            assert_eq!(ext.downcast_ref::<Timestamp>(), Some(&timestamp));
        }
        other => panic!("Unexpected value: {:?}", other),
    }
    assert_eq!(codec.encode(&value).unwrap(), bytes);
}

#[test]
fn invalid_payload_is_a_decode_error() {
    let codec = codec();
    let mut timestamp = Timestamp::default();
    let result = codec.decode(&[0xd5, 0xff, 0, 0], &mut timestamp);
    assert!(matches!(result, Err(DecodeError::Extension { id: -1, .. })));
}
