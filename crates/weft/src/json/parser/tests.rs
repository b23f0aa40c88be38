use super::*;
use crate::io::input::{from_chunks, from_slice};

fn pull_all(json: &str) -> Result<Vec<Item>> {
    pull_all_with(json, JsonDecodeConfig::default())
}

fn pull_all_with(json: &str, config: JsonDecodeConfig) -> Result<Vec<Item>> {
    let mut parser = JsonParser::new(from_slice(json.as_bytes()), config);
    let mut items = Vec::new();
    loop {
        let item = parser.pull()?;
        let done = item == Item::EndOfInput;
        items.push(item);
        if done {
            return Ok(items);
        }
    }
}

fn first(json: &str) -> Result<Item> {
    pull_all(json).map(|items| items[0].clone())
}

#[test]
fn scalars() {
    assert_eq!(first("null").unwrap(), Item::Null);
    assert_eq!(first("true").unwrap(), Item::Bool(true));
    assert_eq!(first("false").unwrap(), Item::Bool(false));
    assert_eq!(first("\"hi\"").unwrap(), Item::Str("hi".into()));
    assert_eq!(first("0").unwrap(), Item::Int(0));
    assert_eq!(first("-0").unwrap(), Item::Int(0));
    assert_eq!(first("42").unwrap(), Item::Int(42));
    assert_eq!(first("-42").unwrap(), Item::Int(-42));
}

#[test]
fn surrounding_whitespace_is_skipped() {
    assert_eq!(
        pull_all(" \t\r\n true \n").unwrap(),
        vec![Item::Bool(true), Item::EndOfInput]
    );
}

#[test]
fn arrays_emit_start_and_break() {
    assert_eq!(
        pull_all("[1, [2], []]").unwrap(),
        vec![
            Item::ArrayStart,
            Item::Int(1),
            Item::ArrayStart,
            Item::Int(2),
            Item::Break,
            Item::ArrayStart,
            Item::Break,
            Item::Break,
            Item::EndOfInput,
        ]
    );
}

#[test]
fn objects_alternate_keys_and_values() {
    assert_eq!(
        pull_all(r#"{"a": 1, "b": {"c": null}}"#).unwrap(),
        vec![
            Item::MapStart,
            Item::Str("a".into()),
            Item::Int(1),
            Item::Str("b".into()),
            Item::MapStart,
            Item::Str("c".into()),
            Item::Null,
            Item::Break,
            Item::Break,
            Item::EndOfInput,
        ]
    );
}

#[test]
fn duplicate_keys_pass_through() {
    assert_eq!(
        pull_all(r#"{"a":1,"a":2}"#).unwrap(),
        vec![
            Item::MapStart,
            Item::Str("a".into()),
            Item::Int(1),
            Item::Str("a".into()),
            Item::Int(2),
            Item::Break,
            Item::EndOfInput,
        ]
    );
}

// --- numbers ------------------------------------------------------------

#[test]
fn integer_width_classification() {
    assert_eq!(first("2147483647").unwrap(), Item::Int(i32::MAX));
    assert_eq!(first("2147483648").unwrap(), Item::Long(2_147_483_648));
    assert_eq!(first("-2147483648").unwrap(), Item::Int(i32::MIN));
    assert_eq!(first("-2147483649").unwrap(), Item::Long(-2_147_483_649));
    assert_eq!(
        first("12345678901234").unwrap(),
        Item::Long(12_345_678_901_234)
    );
    assert_eq!(
        first("9223372036854775807").unwrap(),
        Item::Long(i64::MAX)
    );
    assert_eq!(
        first("-9223372036854775808").unwrap(),
        Item::Long(i64::MIN)
    );
}

#[test]
fn integers_beyond_long_become_number_strings() {
    assert_eq!(
        first("9223372036854775808").unwrap(),
        Item::NumberString("9223372036854775808".into())
    );
    assert_eq!(
        first("18446744073709551615").unwrap(),
        Item::NumberString("18446744073709551615".into())
    );
}

#[test]
fn lossless_decimals_become_doubles() {
    assert_eq!(first("1.5").unwrap(), Item::Double(1.5));
    assert_eq!(first("-1.5").unwrap(), Item::Double(-1.5));
    assert_eq!(first("1.1").unwrap(), Item::Double(1.1));
    assert_eq!(first("42.0").unwrap(), Item::Double(42.0));
    assert_eq!(first("1e2").unwrap(), Item::Double(100.0));
    assert_eq!(first("1.5e1").unwrap(), Item::Double(15.0));
    assert_eq!(first("2e-2").unwrap(), Item::Double(0.02));
    assert_eq!(first("4e18").unwrap(), Item::Double(4e18));
}

#[test]
fn negative_zero_with_fraction_keeps_its_sign() {
    match first("-0.0").unwrap() {
        Item::Double(d) => {
            assert_eq!(d, 0.0);
            assert!(d.is_sign_negative());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn wide_integral_exponents_scale_into_longs() {
    // Mantissa beyond 53 bits but integral and within the long range.
    assert_eq!(
        first("9007199254740993e0").unwrap(),
        Item::Long(9_007_199_254_740_993)
    );
    assert_eq!(
        first("900719925474099.31e2").unwrap(),
        Item::Long(90_071_992_547_409_931)
    );
}

#[test]
fn out_of_window_decimals_stay_verbatim() {
    assert_eq!(
        first("1.234567890123E-23").unwrap(),
        Item::NumberString("1.234567890123E-23".into())
    );
    assert_eq!(first("1e300").unwrap(), Item::NumberString("1e300".into()));
    assert_eq!(
        first("-1.0e300").unwrap(),
        Item::NumberString("-1.0e300".into())
    );
}

#[test]
fn number_strings_only_mode() {
    let config = JsonDecodeConfig {
        read_decimal_numbers_only_as_number_strings: true,
        ..Default::default()
    };
    assert_eq!(
        pull_all_with("1.5", config.clone()).unwrap()[0],
        Item::NumberString("1.5".into())
    );
    // Plain integers still narrow.
    assert_eq!(pull_all_with("15", config).unwrap()[0], Item::Int(15));
}

#[test]
fn mantissa_digit_bound() {
    let forty_digits = "1".repeat(40);
    let err = pull_all(&forty_digits).unwrap_err();
    assert!(matches!(err, Error::Overflow { .. }));
}

#[test]
fn exponent_bound() {
    let err = pull_all("1e1000").unwrap_err();
    assert!(matches!(err, Error::Overflow { .. }));
    assert!(pull_all("1e999").is_ok());
}

#[test]
fn malformed_numbers() {
    assert!(matches!(first("01"), Err(Error::InvalidInputData { .. })));
    assert!(matches!(first("1."), Err(Error::InvalidInputData { .. })));
    assert!(matches!(first("-"), Err(Error::UnexpectedEndOfInput { .. })));
    assert!(matches!(first("1e"), Err(Error::UnexpectedEndOfInput { .. })));
    assert!(matches!(first("+1"), Err(Error::InvalidInputData { .. })));
}

// --- strings ------------------------------------------------------------

#[test]
fn escape_sequences() {
    assert_eq!(
        first(r#""a\"b\\c\/d\be\ff\ng\rh\ti""#).unwrap(),
        Item::Str("a\"b\\c/d\u{8}e\u{c}f\ng\rh\ti".into())
    );
}

#[test]
fn unicode_escapes_and_surrogate_pairs() {
    assert_eq!(first(r#""\u0041""#).unwrap(), Item::Str("A".into()));
    assert_eq!(first(r#""\u00e9""#).unwrap(), Item::Str("é".into()));
    assert_eq!(first(r#""\u265E""#).unwrap(), Item::Str("\u{265E}".into()));
    assert_eq!(
        first(r#""\ud83d\ude00""#).unwrap(),
        Item::Str("\u{1F600}".into())
    );
}

#[test]
fn unpaired_surrogates_are_rejected() {
    assert!(matches!(
        first(r#""\ud83d""#),
        Err(Error::InvalidInputData { .. })
    ));
    assert!(matches!(
        first(r#""\ude00""#),
        Err(Error::InvalidInputData { .. })
    ));
    assert!(matches!(
        first(r#""\ud83dA""#),
        Err(Error::InvalidInputData { .. })
    ));
}

#[test]
fn multi_byte_utf8() {
    assert_eq!(first("\"é\"").unwrap(), Item::Str("é".into()));
    assert_eq!(first("\"日本語\"").unwrap(), Item::Str("日本語".into()));
    assert_eq!(first("\"\u{1F600}\"").unwrap(), Item::Str("\u{1F600}".into()));
}

#[test]
fn long_strings_cross_word_boundaries() {
    let long = "abcdefghijklmnopqrstuvwxyz0123456789".repeat(8);
    let json = format!("\"{long}\"");
    assert_eq!(first(&json).unwrap(), Item::Str(long));
}

#[test]
fn invalid_utf8_bytes_are_rejected() {
    let bytes = [b'"', 0xC3, 0x28, b'"'];
    let mut parser = JsonParser::new(from_slice(&bytes), JsonDecodeConfig::default());
    assert!(matches!(
        parser.pull(),
        Err(Error::InvalidInputData { .. })
    ));
}

#[test]
fn overlong_utf8_is_rejected() {
    // 0xE0 0x80 0x80 is an over-long encoding of NUL.
    let bytes = [b'"', 0xE0, 0x80, 0x80, b'"'];
    let mut parser = JsonParser::new(from_slice(&bytes), JsonDecodeConfig::default());
    assert!(matches!(
        parser.pull(),
        Err(Error::InvalidInputData { .. })
    ));
}

#[test]
fn raw_control_characters_are_rejected() {
    assert!(matches!(
        first("\"a\u{0}b\""),
        Err(Error::InvalidInputData { .. })
    ));
}

#[test]
fn string_length_bound() {
    let config = JsonDecodeConfig {
        max_string_length: 8,
        ..Default::default()
    };
    let err = pull_all_with("\"123456789\"", config).unwrap_err();
    assert!(matches!(err, Error::Overflow { .. }));
}

// --- structure ----------------------------------------------------------

#[test]
fn syntax_error_positions() {
    let err = pull_all("[12,,42]").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Expected JSON value but got ',' at 4"
    );
}

#[test]
fn truncated_documents() {
    assert!(matches!(
        pull_all("[1, 2"),
        Err(Error::UnexpectedEndOfInput { .. })
    ));
    assert!(matches!(
        pull_all("{\"a\""),
        Err(Error::UnexpectedEndOfInput { .. })
    ));
    assert!(matches!(
        pull_all("\"abc"),
        Err(Error::UnexpectedEndOfInput { .. })
    ));
    assert!(matches!(
        pull_all(""),
        Err(Error::UnexpectedEndOfInput { .. })
    ));
    assert!(matches!(
        pull_all("tru"),
        Err(Error::UnexpectedEndOfInput { .. })
    ));
}

#[test]
fn trailing_content_is_rejected() {
    assert!(matches!(
        pull_all("1 2"),
        Err(Error::InvalidInputData { .. })
    ));
    assert!(matches!(
        pull_all("{} x"),
        Err(Error::InvalidInputData { .. })
    ));
}

#[test]
fn nesting_limit_is_64() {
    let ok = format!("{}1{}", "[".repeat(64), "]".repeat(64));
    assert!(pull_all(&ok).is_ok());
    let too_deep = format!("{}1{}", "[".repeat(65), "]".repeat(65));
    assert!(matches!(
        pull_all(&too_deep),
        Err(Error::Overflow { .. })
    ));
}

#[test]
fn keys_must_be_strings() {
    assert!(matches!(
        pull_all("{1: 2}"),
        Err(Error::InvalidInputData { .. })
    ));
}

#[test]
fn chunked_input_parses_identically() {
    let json = r#"{"key": [1, 2.5, "value with a longer tail"], "k2": true}"#;
    let whole = pull_all(json).unwrap();
    let chunks: Vec<Vec<u8>> = json.as_bytes().chunks(3).map(<[u8]>::to_vec).collect();
    let mut parser = JsonParser::new(from_chunks(chunks), JsonDecodeConfig::default());
    let mut items = Vec::new();
    loop {
        let item = parser.pull().unwrap();
        let done = item == Item::EndOfInput;
        items.push(item);
        if done {
            break;
        }
    }
    assert_eq!(items, whole);
}
