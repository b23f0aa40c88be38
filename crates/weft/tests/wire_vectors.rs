//! Byte-exact wire fixtures for both formats.

use std::collections::BTreeMap;

use weft::codec::{BigInt, ByteString, Either};
use weft::{Error, Item, cbor, json};

#[test]
fn nested_integer_arrays() {
    let value = (1, vec![2, 3], vec![4, 5]);
    let bytes = cbor::encode(&value).to_byte_array().unwrap();
    assert_eq!(hex::encode(&bytes), "8301820203820405");
}

#[test]
fn big_integer_with_bignum_tag() {
    let value: BigInt = "3141592653589793238462643383279502884197169399375105820974944592307816"
        .parse()
        .unwrap();
    let bytes = cbor::encode(&value).to_byte_array().unwrap();
    assert_eq!(
        hex::encode(&bytes),
        "c2581d748734b402b41df49150f2d71eaa36fa06d63b69f95a89da23e14fa668"
    );
}

#[test]
fn tiny_decimal_stays_a_verbatim_lexeme() {
    let mut reader = json::decode(b"1.234567890123E-23").reader().unwrap();
    assert_eq!(
        *reader.peek(),
        Item::NumberString("1.234567890123E-23".to_string())
    );
}

#[test]
fn fourteen_digit_integer_is_a_long() {
    let mut reader = json::decode(b"12345678901234").reader().unwrap();
    assert_eq!(*reader.peek(), Item::Long(12_345_678_901_234));
}

#[test]
fn float_encodings_depend_on_the_written_width() {
    let bytes = cbor::encode(&1.0f32).to_byte_array().unwrap();
    assert_eq!(hex::encode(&bytes), "fa3f800000");

    let half = half::f16::from_f32(1.0);
    let bytes = cbor::encode(&half).to_byte_array().unwrap();
    assert_eq!(hex::encode(&bytes), "f93c00");
}

#[test]
fn eithers_in_a_json_object() {
    let value: BTreeMap<String, Either<i32, Vec<i32>>> = BTreeMap::from([
        ("a".to_string(), Either::Left(1)),
        ("b".to_string(), Either::Right(vec![2, 3])),
    ]);
    let text = json::encode(&value).to_byte_array().unwrap();
    assert_eq!(text, br#"{"a":[0,1],"b":[1,[2,3]]}"#);
}

#[test]
fn missing_array_element_reports_the_offset() {
    let err = json::decode(b"[12,,42]").to_value::<Vec<i32>>().unwrap_err();
    assert!(matches!(err, Error::InvalidInputData { .. }));
    assert_eq!(err.to_string(), "Expected JSON value but got ',' at 4");
}

#[test]
fn byte_strings_in_json_are_base64() {
    let value: ByteString = ByteString::new(vec![0xDE, 0xAD, 0xBE, 0xEF]);
    let text = json::encode(&value).to_byte_array().unwrap();
    assert_eq!(text, b"\"3q2+7w==\"");
}
