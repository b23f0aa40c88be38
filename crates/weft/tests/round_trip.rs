//! Round-trip properties across both formats.

use std::collections::BTreeMap;

use rstest::rstest;
use weft::codec::Either;
use weft::{Decode, Encode, cbor, json, transcode};

fn cbor_round_trip<T: Encode + Decode + PartialEq + core::fmt::Debug>(value: &T) {
    let bytes = cbor::encode(value).to_byte_array().unwrap();
    let back: T = cbor::decode(&bytes).to_value().unwrap();
    assert_eq!(&back, value);
    // Re-encoding what was decoded reproduces the bytes.
    assert_eq!(cbor::encode(&back).to_byte_array().unwrap(), bytes);
}

fn json_round_trip<T: Encode + Decode + PartialEq + core::fmt::Debug>(value: &T) {
    let text = json::encode(value).to_byte_array().unwrap();
    let back: T = json::decode(&text).to_value().unwrap();
    assert_eq!(&back, value);
    assert_eq!(json::encode(&back).to_byte_array().unwrap(), text);
}

fn both_formats<T: Encode + Decode + PartialEq + core::fmt::Debug>(value: T) {
    cbor_round_trip(&value);
    json_round_trip(&value);
}

#[rstest]
#[case(0i32)]
#[case(23)]
#[case(24)]
#[case(-1)]
#[case(i32::MIN)]
#[case(i32::MAX)]
fn int_boundaries(#[case] value: i32) {
    both_formats(value);
}

#[rstest]
#[case(i64::from(i32::MAX) + 1)]
#[case(i64::from(i32::MIN) - 1)]
#[case(i64::MIN)]
#[case(i64::MAX)]
fn long_boundaries(#[case] value: i64) {
    both_formats(value);
}

#[rstest]
#[case(0u64)]
#[case(u64::from(u32::MAX))]
#[case(i64::MAX as u64)]
#[case(i64::MAX as u64 + 1)]
#[case(u64::MAX)]
fn unsigned_long_boundaries(#[case] value: u64) {
    both_formats(value);
}

#[rstest]
#[case(0.0f64)]
#[case(-0.0)]
#[case(1.1)]
#[case(1.5)]
#[case(3.402_823_466_385_288_6e38)]
#[case(1.0e300)]
#[case(f64::MIN_POSITIVE)]
#[case(f64::MAX)]
fn double_boundaries(#[case] value: f64) {
    both_formats(value);
    // The sign of zero survives.
    if value == 0.0 {
        let text = json::encode(&value).to_byte_array().unwrap();
        let back: f64 = json::decode(&text).to_value().unwrap();
        assert_eq!(back.is_sign_negative(), value.is_sign_negative());
    }
}

#[test]
fn nan_round_trips_in_cbor() {
    let bytes = cbor::encode(&f64::NAN).to_byte_array().unwrap();
    let back: f64 = cbor::decode(&bytes).to_value().unwrap();
    assert!(back.is_nan());
}

#[rstest]
#[case("")]
#[case("plain ascii")]
#[case("with \"quotes\" and \\ backslashes")]
#[case("\u{8}\u{c}\n\r\t")]
#[case("\u{0}\u{1}\u{1f}")]
#[case("two-byte é, three-byte ₿, four-byte 😀")]
fn string_escaping(#[case] value: &str) {
    both_formats(value.to_string());
}

#[test]
fn collections_round_trip() {
    both_formats(vec![1i32, 2, 3]);
    both_formats(Vec::<String>::new());
    both_formats(vec![vec![1i64], vec![], vec![2, 3]]);
    both_formats(Some("boxed".to_string()));
    both_formats(None::<String>);
    both_formats((1u8, -2i64, "three".to_string()));
    both_formats(BTreeMap::from([
        ("a".to_string(), 1.5f64),
        ("b".to_string(), -0.25),
    ]));
    both_formats(BTreeMap::<String, i32>::new());
    both_formats(Either::<i32, String>::Left(-1));
    both_formats(Either::<i32, String>::Right("right".to_string()));
}

#[test]
fn deep_nesting_round_trips_at_the_limit() {
    // 64 nested arrays, the maximum supported depth.
    let mut bytes = vec![0x81u8; 64];
    bytes.push(0x01);
    let json = transcode::cbor_to_json(&bytes).unwrap();
    let back = transcode::json_to_cbor(&json).unwrap();
    let again = transcode::cbor_to_json(&back).unwrap();
    assert_eq!(json, again);
}

#[test]
fn transcoding_is_stable() {
    let value = BTreeMap::from([
        ("ints".to_string(), vec![1i64, -1, 1 << 40]),
        ("empty".to_string(), vec![]),
    ]);
    let direct = json::encode(&value).to_byte_array().unwrap();
    let cbor_bytes = cbor::encode(&value).to_byte_array().unwrap();
    let transcoded = transcode::cbor_to_json(&cbor_bytes).unwrap();
    assert_eq!(direct, transcoded);
}

#[test]
fn json_int_may_widen_to_long() {
    // An i32 travels through JSON as a bare number; a decoder asking for
    // i64 widens it.
    let text = json::encode(&7i32).to_byte_array().unwrap();
    let widened: i64 = json::decode(&text).to_value().unwrap();
    assert_eq!(widened, 7);
}

#[test]
fn indefinite_text_decodes_as_one_string() {
    let mut bytes = vec![0x7F, 0x62];
    bytes.extend_from_slice(b"he");
    bytes.push(0x63);
    bytes.extend_from_slice(b"llo");
    bytes.push(0xFF);
    let s: String = cbor::decode(&bytes).to_value().unwrap();
    assert_eq!(s, "hello");
}
