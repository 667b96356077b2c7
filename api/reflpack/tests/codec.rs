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

use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

use bytes::{Buf, BytesMut};
use reflpack::{Codec, CodecConfig, DecodeError, EncodeError, Reflect, Value};

fn round_trip<T>(codec: &Codec, value: T)
where
    T: Reflect + Default + PartialEq + Debug,
{
    let bytes = codec.encode(&value).expect("Encoding failed.");
    let restored = codec
        .decode_value::<T>(&bytes)
        .expect("Decoding failed.");
    assert_eq!(restored, value);
}

#[test]
fn unsigned_boundaries() {
    let codec = Codec::new();
    for n in [
        0u64,
        1,
        127,
        128,
        255,
        256,
        65535,
        65536,
        u32::MAX as u64,
        u32::MAX as u64 + 1,
        u64::MAX,
    ] {
        round_trip(&codec, n);
    }
    for n in [0u8, 1, 127, 128, 255] {
        round_trip(&codec, n);
    }
    for n in [0usize, 65536, usize::MAX] {
        round_trip(&codec, n);
    }
}

#[test]
fn signed_boundaries() {
    let codec = Codec::new();
    for n in [
        0i64,
        1,
        127,
        128,
        -1,
        -32,
        -33,
        -128,
        -129,
        -32768,
        -32769,
        i32::MIN as i64,
        i32::MIN as i64 - 1,
        i64::MIN,
        i64::MAX,
    ] {
        round_trip(&codec, n);
    }
    for n in [i8::MIN, -33, -32, -1, 0, 127] {
        round_trip(&codec, n);
    }
    for n in [i32::MIN, -32769, 65536, i32::MAX] {
        round_trip(&codec, n);
    }
}

#[test]
fn minimal_encodings() {
    let codec = Codec::new();
    assert_eq!(&codec.must_encode(&0u32)[..], &[0x00]);
    assert_eq!(&codec.must_encode(&127i64)[..], &[0x7f]);
    assert_eq!(&codec.must_encode(&-1i64)[..], &[0xff]);
    assert_eq!(&codec.must_encode(&true)[..], &[0xc3]);
    assert_eq!(&codec.must_encode(&false)[..], &[0xc2]);
    let max = codec.must_encode(&u64::MAX);
    assert_eq!(max[0], 0xcf);
    assert_eq!(max.len(), 9);
}

#[test]
fn scalars_and_strings() {
    let codec = Codec::new();
    round_trip(&codec, true);
    round_trip(&codec, 1.25f32);
    round_trip(&codec, -0.1f64);
    round_trip(&codec, f64::INFINITY);
    round_trip(&codec, String::new());
    round_trip(&codec, "héllo".to_string());
    round_trip(&codec, "x".repeat(31));
    round_trip(&codec, "x".repeat(255));
    round_trip(&codec, "x".repeat(65536));
}

#[test]
fn nan_round_trip() {
    let codec = Codec::new();
    let bytes = codec.must_encode(&f64::NAN);
    let restored: f64 = codec.decode_value(&bytes).expect("Decoding failed.");
    assert!(restored.is_nan());

    let bytes = codec.must_encode(&f32::NAN);
    let restored: f32 = codec.decode_value(&bytes).expect("Decoding failed.");
    assert!(restored.is_nan());
}

#[test]
fn collections() {
    let codec = Codec::new();
    round_trip(&codec, vec![0u8, 1, 2, 255]);
    round_trip(&codec, vec![0u8; 300]);
    round_trip(&codec, vec![-1i32, 0, 1]);
    round_trip(&codec, vec![vec!["a".to_string()], vec![]]);
    round_trip(&codec, (0..20u16).collect::<Vec<_>>());
    round_trip(&codec, vec![Some(1i64), None, Some(-1)]);

    let mut map = HashMap::new();
    map.insert("a".to_string(), vec![1u32]);
    map.insert("b".to_string(), vec![]);
    round_trip(&codec, map);

    let mut map = BTreeMap::new();
    for i in 0..40i32 {
        map.insert(i, i.to_string());
    }
    round_trip(&codec, map);
}

#[test]
fn open_values() {
    let codec = Codec::new();
    let value = Value::Map(vec![
        (Value::from("z"), Value::Array(vec![Value::Int(-5), Value::UInt(5)])),
        (Value::from(1u8), Value::Bin(vec![1, 2])),
        (Value::Nil, Value::Float(0.5)),
        (Value::from("a"), Value::Bool(false)),
    ]);
    round_trip(&codec, value);
}

#[test]
fn typed_into_open() {
    let codec = Codec::new();
    let bytes = codec.must_encode(&vec![1u16, 300]);
    let value: Value = codec.decode_value(&bytes).expect("Decoding failed.");
    assert_eq!(value, Value::Array(vec![Value::Int(1), Value::UInt(300)]));

    let bytes = codec.must_encode(&-7i32);
    let value: Value = codec.decode_value(&bytes).expect("Decoding failed.");
    assert_eq!(value, Value::Int(-7));

    let bytes = codec.must_encode(&2.5f32);
    let value: Value = codec.decode_value(&bytes).expect("Decoding failed.");
    assert_eq!(value, Value::Float(2.5));
}

#[test]
fn overflow_and_underflow() {
    let codec = Codec::new();
    let bytes = codec.must_encode(&300u32);
    assert!(matches!(
        codec.decode_value::<u8>(&bytes),
        Err(DecodeError::Overflow { .. })
    ));
    assert!(matches!(
        codec.decode_value::<i8>(&bytes),
        Err(DecodeError::Overflow { .. })
    ));
    assert_eq!(codec.decode_value::<u16>(&bytes).ok(), Some(300));

    let bytes = codec.must_encode(&-1i32);
    assert!(matches!(
        codec.decode_value::<u64>(&bytes),
        Err(DecodeError::Underflow { .. })
    ));

    let bytes = codec.must_encode(&i64::MIN);
    assert!(matches!(
        codec.decode_value::<i32>(&bytes),
        Err(DecodeError::Underflow { .. })
    ));

    let bytes = codec.must_encode(&u64::MAX);
    assert!(matches!(
        codec.decode_value::<i64>(&bytes),
        Err(DecodeError::Overflow { .. })
    ));
}

#[test]
fn destinations_must_be_writable() {
    let codec = Codec::new();
    let bytes = codec.must_encode(&1u8);

    let value = 0u8;
    assert!(matches!(
        codec.decode(&bytes, &value),
        Err(DecodeError::NotAPointer("u8"))
    ));

    let missing: Option<&mut u8> = None;
    assert!(matches!(
        codec.decode(&bytes, missing),
        Err(DecodeError::NilPointer("u8"))
    ));

    let mut present = 0u8;
    assert!(codec.decode(&bytes, Some(&mut present)).is_ok());
    assert_eq!(present, 1);
}

#[test]
fn nil_propagation() {
    let codec = Codec::new();
    let bytes = codec.must_encode(&None::<String>);
    assert_eq!(&bytes[..], &[0xc0]);

    let mut target = Some(Some("full".to_string()));
    codec.must_decode(&bytes, &mut target);
    assert_eq!(target, None);

    let mut open = Value::Str("full".to_string());
    codec.must_decode(&bytes, &mut open);
    assert_eq!(open, Value::Nil);
}

#[test]
fn concatenated_values() {
    let codec = Codec::new();
    let mut buf = BytesMut::new();
    codec
        .encode_into(&"first".to_string(), &mut buf)
        .expect("Encoding failed.");
    codec.encode_into(&2u8, &mut buf).expect("Encoding failed.");
    codec
        .encode_into(&vec![3i8], &mut buf)
        .expect("Encoding failed.");

    let mut input = buf.freeze();
    let mut first = String::new();
    let mut second = 0u8;
    let mut third: Vec<i8> = vec![];
    codec
        .decode_from(&mut input, &mut first)
        .expect("Decoding failed.");
    codec
        .decode_from(&mut input, &mut second)
        .expect("Decoding failed.");
    codec
        .decode_from(&mut input, &mut third)
        .expect("Decoding failed.");
    assert_eq!(first, "first");
    assert_eq!(second, 2);
    assert_eq!(third, vec![3]);
    assert!(!input.has_remaining());
}

#[test]
fn trailing_bytes_ignored() {
    let codec = Codec::new();
    let value: u8 = codec
        .decode_value(&[0x05, 0xc1, 0xc1])
        .expect("Decoding failed.");
    assert_eq!(value, 5);
}

#[test]
fn failed_encode_writes_nothing() {
    #[derive(Default)]
    struct Opaque;

    impl Reflect for Opaque {
        fn shape(&self) -> reflpack::Shape<'_> {
            reflpack::Shape::Opaque
        }

        fn shape_mut(&mut self) -> reflpack::ShapeMut<'_> {
            reflpack::ShapeMut::Opaque
        }
    }

    let codec = Codec::new();
    let mut buf = BytesMut::new();
    let result = codec.encode_into(&vec![Opaque], &mut buf);
    assert!(matches!(result, Err(EncodeError::UnsupportedKind(_))));
    assert!(buf.is_empty());
}

#[test]
fn configured_limits() {
    let codec = Codec::with_config(CodecConfig::DEFAULT.with_max_str_len(4).with_max_depth(2));
    let bytes = codec.must_encode(&"hello".to_string());
    assert!(matches!(
        codec.decode_value::<String>(&bytes),
        Err(DecodeError::LimitExceeded { len: 5, max: 4, .. })
    ));

    assert!(matches!(
        codec.encode(&vec![vec![vec![1u16]]]),
        Err(EncodeError::DepthExceeded(2))
    ));

    let unlimited = Codec::new();
    let bytes = unlimited.must_encode(&vec![vec![vec![1u16]]]);
    let err = codec
        .decode_value::<Vec<Vec<Vec<u16>>>>(&bytes)
        .expect_err("Decoding succeeded.");
    assert!(matches!(err.root_cause(), DecodeError::DepthExceeded(2)));
}

fn nested_arrays(depth: usize) -> Vec<u8> {
    let mut bytes = vec![0x91; depth];
    bytes.push(0xc0);
    bytes
}

#[test]
fn default_depth_limit_on_small_stack() {
    let worker = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let codec = Codec::new();
            let max_depth = codec.config().max_depth;

            let value: Value = codec
                .decode_value(&nested_arrays(max_depth - 1))
                .expect("Decoding failed.");
            let mut depth = 0;
            let mut current = &value;
            while let Value::Array(items) = current {
                depth += 1;
                current = &items[0];
            }
            assert_eq!(depth, max_depth - 1);
            assert!(current.is_nil());

            let err = codec
                .decode_value::<Value>(&nested_arrays(max_depth + 1))
                .expect_err("Decoding succeeded.");
            assert!(matches!(
                err.root_cause(),
                DecodeError::DepthExceeded(limit) if *limit == max_depth
            ));
        })
        .expect("Failed to start thread.");
    worker.join().expect("Decoding thread failed.");
}

#[test]
#[should_panic]
fn must_decode_panics() {
    let codec = Codec::new();
    let mut target = 0u8;
    codec.must_decode(&[0xc1], &mut target);
}

#[test]
fn codec_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Codec>();
}
