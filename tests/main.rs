#![allow(clippy::float_cmp)]

use std::str::FromStr;

use tracejson::{
    decode_bytes, decode_str, encode_pretty, encode_str, lexer, BTreeMapDecoder, BigDecimal, BigDecimalDecoder,
    BigDecimalEncoder, BigInt, BigIntegerDecoder, BigIntegerEncoder, BooleanDecoder, BooleanEncoder, ByteDecoder,
    DecodeError, DoubleDecoder, DoubleEncoder, Either, EitherDecoder, EitherEncoder, HashSetDecoder, IntDecoder,
    LongDecoder, LongEncoder, LongFieldDecoder, MapDecoder, MapEncoder, NumberInt, NumberIntDecoder, ObjectDecoder,
    ObjectEncoder, OptionDecoder, OptionEncoder, RetractReader, StrReader, StringDecoder, StringEncoder,
    StringFieldDecoder, StringFieldEncoder, TaggedSumDecoder, TaggedSumEncoder, ULongDecoder, VecDecoder, VecEncoder,
    WrapperSumDecoder, WrapperSumEncoder,
};

macro_rules! decode_ok {
    ($name:ident, $decoder:expr, $json:literal, $expected:expr) => {
        paste::item! {
            #[test]
            fn [< decode_ok__ $name >]() {
                let value = decode_str(&$decoder, $json).unwrap();
                assert_eq!(value, $expected);
            }
        }
    };
}

macro_rules! decode_err {
    ($name:ident, $decoder:expr, $json:literal, $expected:literal) => {
        paste::item! {
            #[test]
            fn [< decode_err__ $name >]() {
                let error = decode_str(&$decoder, $json).unwrap_err();
                assert_eq!(error.to_string(), $expected);
            }
        }
    };
}

macro_rules! round_trip {
    ($name:ident, $decoder:expr, $encoder:expr, $value:expr) => {
        paste::item! {
            #[test]
            fn [< round_trip__ $name >]() {
                let value = $value;
                let json = encode_str(&$encoder, &value);
                let back = decode_str(&$decoder, &json).unwrap();
                assert_eq!(back, value, "via {json}");
            }
        }
    };
}

decode_ok!(int_padded, IntDecoder, "  42  ", 42);
decode_ok!(int_string_form, IntDecoder, "\"42\"", 42);
decode_ok!(int_negative, IntDecoder, "-7", -7);
decode_ok!(long_max, LongDecoder, "9223372036854775807", i64::MAX);
decode_ok!(long_min, LongDecoder, "-9223372036854775808", i64::MIN);
decode_ok!(ulong_max, ULongDecoder, "18446744073709551615", u64::MAX);
decode_ok!(bool_true, BooleanDecoder, "true", true);
decode_ok!(bool_false, BooleanDecoder, " false ", false);
decode_ok!(double_exponent, DoubleDecoder, "1e+3", 1000.0);
decode_ok!(double_negative, DoubleDecoder, "-2.5e-3", -2.5e-3);
decode_ok!(double_string_form, DoubleDecoder, "\"1.5\"", 1.5);
decode_ok!(string_plain, StringDecoder, r#""hello""#, "hello");
decode_ok!(string_escapes, StringDecoder, r#""a\nb\t\"c\"""#, "a\nb\t\"c\"");
decode_ok!(string_charcode, StringDecoder, "\"\\u20ac\"", "€");
decode_ok!(string_surrogate_pair, StringDecoder, "\"\\ud83d\\ude00\"", "😀");
decode_ok!(option_null, OptionDecoder::new(IntDecoder), "null", None::<i32>);
decode_ok!(option_present, OptionDecoder::new(IntDecoder), "7", Some(7));
decode_ok!(vec_ints, VecDecoder::new(LongDecoder), "[1, 2, 3]", vec![1i64, 2, 3]);
decode_ok!(vec_empty, VecDecoder::new(LongDecoder), " [ ] ", Vec::<i64>::new());
decode_ok!(
    either_left,
    EitherDecoder::new(IntDecoder, IntDecoder),
    r#"{"left":1}"#,
    Either::<i32, i32>::Left(1)
);
decode_ok!(
    either_right_wrapper_case,
    EitherDecoder::new(IntDecoder, IntDecoder),
    r#"{"Right": 2}"#,
    Either::<i32, i32>::Right(2)
);
decode_ok!(
    big_integer,
    BigIntegerDecoder,
    "123456789012345678901234567890",
    BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap()
);
decode_ok!(
    number_int_small,
    NumberIntDecoder,
    "12",
    NumberInt::Int(12)
);
decode_ok!(
    number_int_promotes,
    NumberIntDecoder,
    "9223372036854775808",
    NumberInt::BigInt(BigInt::parse_bytes(b"9223372036854775808", 10).unwrap())
);
decode_ok!(
    big_decimal,
    BigDecimalDecoder,
    "123.450e2",
    BigDecimal::from_str("12345.0").unwrap()
);

decode_err!(int_float, IntDecoder, "4.2", ".(expected an Int)");
decode_err!(byte_overflow, ByteDecoder, "300", ".(expected a Byte)");
decode_err!(ulong_negative, ULongDecoder, "-1", ".(expected an unsigned Long)");
decode_err!(int_not_number, IntDecoder, "[1]", ".(expected a number, got [)");
decode_err!(bool_garbage, BooleanDecoder, "frue", ".(expected false)");
decode_err!(bool_not_bool, BooleanDecoder, "1", ".(expected 'true' or 'false' got '1')");
decode_err!(string_control, StringDecoder, "\"a\u{1}b\"", ".(invalid control in string)");
decode_err!(string_bad_escape, StringDecoder, r#""\x""#, ".(invalid '\\x' in string)");
decode_err!(string_bad_charcode, StringDecoder, "\"\\u00g0\"", ".(invalid charcode in string)");
decode_err!(trailing_junk, LongDecoder, "42 x", ".(unexpected 'x')");
decode_err!(
    vec_bad_separator,
    VecDecoder::new(LongDecoder),
    "[1; 2]",
    ".(expected ',' or ']' got ';')"
);
decode_err!(
    vec_element_traced,
    VecDecoder::new(LongDecoder),
    "[1, true]",
    "[1](expected a number, got t)"
);
decode_err!(
    either_ambiguous,
    EitherDecoder::new(IntDecoder, IntDecoder),
    r#"{"left":1,"right":2}"#,
    ".(ambiguous either, both present)"
);
decode_err!(
    either_empty,
    EitherDecoder::new(IntDecoder, IntDecoder),
    "{}",
    ".(missing fields)"
);
decode_err!(
    either_unknown_key,
    EitherDecoder::new(IntDecoder, IntDecoder),
    r#"{"middle":1}"#,
    ".(invalid disambiguator)"
);

#[test]
fn unexpected_end_of_input() {
    assert_eq!(decode_str(&LongDecoder, "").unwrap_err(), DecodeError::UnexpectedEnd);
    assert_eq!(
        decode_str(&StringDecoder, "\"abc").unwrap_err().to_string(),
        "unexpected end of input"
    );
}

#[test]
fn big_integer_bit_cap() {
    // with the default 128-bit cap, 40 digits scan and 41 do not
    let ok = "9".repeat(40);
    assert!(decode_str(&BigIntegerDecoder, &ok).is_ok());
    let too_big = "9".repeat(41);
    assert_eq!(
        decode_str(&BigIntegerDecoder, &too_big).unwrap_err().to_string(),
        ".(expected a BigInteger)"
    );
}

#[test]
fn lexer_retracts_the_over_read() {
    let mut r = StrReader::new("123, 4");
    assert_eq!(lexer::long(None, &mut r).unwrap(), 123);
    // the reader sits exactly one past the primitive
    assert_eq!(r.read_char().unwrap(), ',');
}

#[test]
fn decode_from_bytes() {
    assert_eq!(decode_str(&StringDecoder, "\"héllo\"").unwrap(), "héllo");
    assert_eq!(decode_bytes(&StringDecoder, "\"héllo\"".as_bytes()).unwrap(), "héllo");
    assert_eq!(
        decode_bytes(&StringDecoder, b"\"\xff\"").unwrap_err(),
        DecodeError::InvalidUtf8
    );
}

#[derive(Debug, PartialEq)]
struct Pair {
    a: i64,
    b: String,
}

fn pair_decoder() -> ObjectDecoder<Pair> {
    ObjectDecoder::builder()
        .field("a", LongDecoder)
        .field("b", StringDecoder)
        .build(|mut slots| Pair {
            a: slots.take(0),
            b: slots.take(1),
        })
}

fn pair_encoder() -> ObjectEncoder<Pair> {
    ObjectEncoder::builder()
        .field("a", LongEncoder, |p: &Pair| &p.a)
        .field("b", StringEncoder, |p: &Pair| &p.b)
        .build()
}

#[test]
fn record_decodes_in_any_field_order() {
    let decoder = pair_decoder();
    let expected = Pair {
        a: 1,
        b: "x".to_owned(),
    };
    assert_eq!(decode_str(&decoder, r#"{"a":1,"b":"x"}"#).unwrap(), expected);
    assert_eq!(decode_str(&decoder, r#"{ "b" : "x" , "a" : 1 }"#).unwrap(), expected);
}

#[test]
fn record_duplicate_key() {
    let error = decode_str(&pair_decoder(), r#"{"a":1,"a":2,"b":"x"}"#).unwrap_err();
    assert_eq!(error.to_string(), ".a(duplicate)");
}

#[test]
fn record_missing_field() {
    let error = decode_str(&pair_decoder(), r#"{"a":1}"#).unwrap_err();
    assert_eq!(error.to_string(), ".b(missing)");
}

#[test]
fn record_skips_unknown_fields() {
    let value = decode_str(&pair_decoder(), r#"{"zz":{"deep":[1,{"x":"}"}]},"a":1,"b":"x"}"#).unwrap();
    assert_eq!(
        value,
        Pair {
            a: 1,
            b: "x".to_owned()
        }
    );
}

#[test]
fn record_no_extra_fields() {
    let decoder = ObjectDecoder::builder()
        .field("a", LongDecoder)
        .no_extra_fields()
        .build(|mut slots| slots.take::<i64>(0));
    assert_eq!(decode_str(&decoder, r#"{"a":1}"#).unwrap(), 1);
    let error = decode_str(&decoder, r#"{"a":1,"zz":2}"#).unwrap_err();
    assert_eq!(error.to_string(), ".(invalid extra field)");
}

#[test]
fn record_option_field_defaults_to_none() {
    let decoder = ObjectDecoder::builder()
        .field("a", LongDecoder)
        .field("note", OptionDecoder::new(StringDecoder))
        .build(|mut slots| (slots.take::<i64>(0), slots.take::<Option<String>>(1)));
    assert_eq!(decode_str(&decoder, r#"{"a":1}"#).unwrap(), (1, None));
    assert_eq!(decode_str(&decoder, r#"{"a":1,"note":null}"#).unwrap(), (1, None));
    assert_eq!(
        decode_str(&decoder, r#"{"a":1,"note":"hi"}"#).unwrap(),
        (1, Some("hi".to_owned()))
    );
}

#[derive(Debug, PartialEq)]
struct Distance {
    value: i64,
}

#[derive(Debug, PartialEq)]
struct Element {
    distance: Distance,
}

#[derive(Debug, PartialEq)]
struct Row {
    elements: Vec<Element>,
}

#[derive(Debug, PartialEq)]
struct Response {
    rows: Vec<Row>,
}

fn response_decoder() -> ObjectDecoder<Response> {
    let distance = ObjectDecoder::builder()
        .field("value", LongDecoder)
        .build(|mut slots| Distance { value: slots.take(0) });
    let element = ObjectDecoder::builder()
        .field("distance", distance)
        .build(|mut slots| Element { distance: slots.take(0) });
    let row = ObjectDecoder::builder()
        .field("elements", VecDecoder::new(element))
        .build(|mut slots| Row { elements: slots.take(0) });
    ObjectDecoder::builder()
        .field("rows", VecDecoder::new(row))
        .build(|mut slots| Response { rows: slots.take(0) })
}

#[test]
fn nested_error_carries_the_full_path() {
    let error = decode_str(&response_decoder(), r#"{"rows":[{"elements":[{"distance":{}}]}]}"#).unwrap_err();
    assert_eq!(error.to_string(), ".rows[0].elements[0].distance.value(missing)");
}

#[test]
fn nested_decode_succeeds() {
    let value = decode_str(
        &response_decoder(),
        r#"{"rows":[{"elements":[{"distance":{"value":123}},{"distance":{"value":456}}]}]}"#,
    )
    .unwrap();
    assert_eq!(value.rows[0].elements[1].distance.value, 456);
}

#[derive(Debug, PartialEq)]
enum Shape {
    Circle { radius: f64 },
    Square { side: f64 },
}

fn circle_decoder() -> ObjectDecoder<Shape> {
    ObjectDecoder::builder()
        .field("radius", DoubleDecoder)
        .build(|mut slots| Shape::Circle { radius: slots.take(0) })
}

fn square_decoder() -> ObjectDecoder<Shape> {
    ObjectDecoder::builder()
        .field("side", DoubleDecoder)
        .build(|mut slots| Shape::Square { side: slots.take(0) })
}

fn shape_wrapper_decoder() -> WrapperSumDecoder<Shape> {
    WrapperSumDecoder::builder()
        .variant("Circle", circle_decoder(), |s| s)
        .variant("Square", square_decoder(), |s| s)
        .build()
}

fn shape_tagged_decoder() -> TaggedSumDecoder<Shape> {
    TaggedSumDecoder::builder("type")
        .variant("Circle", circle_decoder(), |s| s)
        .variant("Square", square_decoder(), |s| s)
        .build()
}

fn circle_fields_encoder() -> ObjectEncoder<Shape> {
    ObjectEncoder::builder()
        .field("radius", DoubleEncoder, |s: &Shape| match s {
            Shape::Circle { radius } => radius,
            Shape::Square { .. } => unreachable!(),
        })
        .build()
}

fn square_fields_encoder() -> ObjectEncoder<Shape> {
    ObjectEncoder::builder()
        .field("side", DoubleEncoder, |s: &Shape| match s {
            Shape::Square { side } => side,
            Shape::Circle { .. } => unreachable!(),
        })
        .build()
}

fn shape_wrapper_encoder() -> WrapperSumEncoder<Shape> {
    WrapperSumEncoder::builder()
        .variant("Circle", circle_fields_encoder(), |s: &Shape| {
            matches!(s, Shape::Circle { .. }).then_some(s)
        })
        .variant("Square", square_fields_encoder(), |s: &Shape| {
            matches!(s, Shape::Square { .. }).then_some(s)
        })
        .build()
}

fn shape_tagged_encoder() -> TaggedSumEncoder<Shape> {
    TaggedSumEncoder::builder("type")
        .variant("Circle", circle_fields_encoder(), |s: &Shape| {
            matches!(s, Shape::Circle { .. }).then_some(s)
        })
        .variant("Square", square_fields_encoder(), |s: &Shape| {
            matches!(s, Shape::Square { .. }).then_some(s)
        })
        .build()
}

#[test]
fn wrapper_sum_decodes() {
    let value = decode_str(&shape_wrapper_decoder(), r#"{"Circle":{"radius":1.5}}"#).unwrap();
    assert_eq!(value, Shape::Circle { radius: 1.5 });
}

#[test]
fn wrapper_sum_empty_object() {
    let error = decode_str(&shape_wrapper_decoder(), "{}").unwrap_err();
    assert_eq!(error.to_string(), ".(expected non-empty object)");
}

#[test]
fn wrapper_sum_unknown_tag() {
    let error = decode_str(&shape_wrapper_decoder(), r#"{"Oval":{}}"#).unwrap_err();
    assert_eq!(error.to_string(), ".(invalid disambiguator)");
}

#[test]
fn wrapper_sum_rejects_second_key() {
    let error = decode_str(
        &shape_wrapper_decoder(),
        r#"{"Circle":{"radius":1},"Square":{"side":2}}"#,
    )
    .unwrap_err();
    assert_eq!(error.to_string(), ".(expected '}' got ',')");
}

#[test]
fn wrapper_sum_error_inside_variant() {
    let error = decode_str(&shape_wrapper_decoder(), r#"{"Circle":{}}"#).unwrap_err();
    assert_eq!(error.to_string(), "{Circle}.radius(missing)");
}

#[test]
fn tagged_sum_decodes_tag_first() {
    let value = decode_str(&shape_tagged_decoder(), r#"{"type":"Circle","radius":1.5}"#).unwrap();
    assert_eq!(value, Shape::Circle { radius: 1.5 });
}

#[test]
fn tagged_sum_decodes_tag_last() {
    // fields before the tag are captured and replayed
    let value = decode_str(&shape_tagged_decoder(), r#"{"radius":1.5,"type":"Circle"}"#).unwrap();
    assert_eq!(value, Shape::Circle { radius: 1.5 });
}

#[test]
fn tagged_sum_missing_discriminator() {
    let error = decode_str(&shape_tagged_decoder(), r#"{"radius":1.5}"#).unwrap_err();
    assert_eq!(error.to_string(), ".(missing disambiguator 'type')");
}

#[test]
fn tagged_sum_duplicate_discriminator() {
    let error = decode_str(&shape_tagged_decoder(), r#"{"type":"Circle","type":"Circle"}"#).unwrap_err();
    assert_eq!(error.to_string(), ".(duplicate disambiguator 'type')");
}

#[test]
fn tagged_sum_unknown_tag() {
    let error = decode_str(&shape_tagged_decoder(), r#"{"type":"Oval"}"#).unwrap_err();
    assert_eq!(error.to_string(), ".(invalid disambiguator in 'type')");
}

#[test]
fn tagged_sum_error_inside_variant() {
    let error = decode_str(&shape_tagged_decoder(), r#"{"type":"Circle"}"#).unwrap_err();
    assert_eq!(error.to_string(), "{Circle}.radius(missing)");
}

#[test]
fn maps_and_sets() {
    let decoder = MapDecoder::new(StringFieldDecoder, LongDecoder);
    let m = decode_str(&decoder, r#"{"x": 1, "y": 2}"#).unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m.get("x"), Some(&1));

    let decoder = MapDecoder::new(LongFieldDecoder, BooleanDecoder);
    let m = decode_str(&decoder, r#"{"1": true}"#).unwrap();
    assert_eq!(m.get(&1), Some(&true));
    let error = decode_str(&decoder, r#"{"one": true}"#).unwrap_err();
    assert_eq!(error.to_string(), ".one(expected a Long)");

    let decoder = BTreeMapDecoder::new(StringFieldDecoder, LongDecoder);
    let m = decode_str(&decoder, r#"{"b": 2, "a": 1}"#).unwrap();
    assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "b"]);

    let decoder = HashSetDecoder::new(LongDecoder);
    let s = decode_str(&decoder, "[1, 2, 2, 3]").unwrap();
    assert_eq!(s.len(), 3);
}

#[test]
fn map_duplicate_key() {
    let decoder = MapDecoder::new(StringFieldDecoder, LongDecoder);
    let error = decode_str(&decoder, r#"{"x":1,"x":2}"#).unwrap_err();
    assert_eq!(error.to_string(), ".x(duplicate)");
}

#[test]
fn map_value_error_is_traced_by_key() {
    let decoder = MapDecoder::new(StringFieldDecoder, LongDecoder);
    let error = decode_str(&decoder, r#"{"x": true}"#).unwrap_err();
    assert_eq!(error.to_string(), ".x(expected a number, got t)");
}

round_trip!(bool_value, BooleanDecoder, BooleanEncoder, true);
round_trip!(long_value, LongDecoder, LongEncoder, -1234567890123i64);
round_trip!(double_value, DoubleDecoder, DoubleEncoder, 2.75f64);
round_trip!(
    string_value,
    StringDecoder,
    StringEncoder,
    "a\"b\\c\nd\te\u{1}é😀".to_owned()
);
round_trip!(
    vec_value,
    VecDecoder::new(LongDecoder),
    VecEncoder::new(LongEncoder),
    vec![1i64, -2, 3]
);
round_trip!(
    option_some,
    OptionDecoder::new(LongDecoder),
    OptionEncoder::new(LongEncoder),
    Some(5i64)
);
round_trip!(
    option_none,
    OptionDecoder::new(LongDecoder),
    OptionEncoder::new(LongEncoder),
    None::<i64>
);
round_trip!(
    either_value,
    EitherDecoder::new(LongDecoder, StringDecoder),
    EitherEncoder::new(LongEncoder, StringEncoder),
    Either::<i64, String>::Right("r".to_owned())
);
round_trip!(
    big_integer_value,
    BigIntegerDecoder,
    BigIntegerEncoder,
    BigInt::parse_bytes(b"-123456789012345678901234567890", 10).unwrap()
);
round_trip!(
    big_decimal_value,
    BigDecimalDecoder,
    BigDecimalEncoder,
    BigDecimal::from_str("-123.456").unwrap()
);
round_trip!(
    record_value,
    pair_decoder(),
    pair_encoder(),
    Pair {
        a: 42,
        b: "x\ny".to_owned()
    }
);
round_trip!(
    wrapper_sum_value,
    shape_wrapper_decoder(),
    shape_wrapper_encoder(),
    Shape::Square { side: 2.5 }
);
round_trip!(
    tagged_sum_value,
    shape_tagged_decoder(),
    shape_tagged_encoder(),
    Shape::Circle { radius: 0.5 }
);

#[test]
fn round_trip_map() {
    let decoder = MapDecoder::new(StringFieldDecoder, LongDecoder);
    let encoder = MapEncoder::new(StringFieldEncoder, LongEncoder);
    let value = decode_str(&decoder, r#"{"x": 1, "naïve": 2}"#).unwrap();
    let back = decode_str(&decoder, &encode_str(&encoder, &value)).unwrap();
    assert_eq!(back, value);
}

#[test]
fn encode_compact() {
    let pair = Pair {
        a: 1,
        b: "x".to_owned(),
    };
    assert_eq!(encode_str(&pair_encoder(), &pair), r#"{"a":1,"b":"x"}"#);
    assert_eq!(
        encode_str(&shape_wrapper_encoder(), &Shape::Circle { radius: 1.5 }),
        r#"{"Circle":{"radius":1.5}}"#
    );
    assert_eq!(
        encode_str(&shape_tagged_encoder(), &Shape::Square { side: 2.0 }),
        r#"{"type":"Square","side":2}"#
    );
}

#[test]
fn encode_pretty_indents() {
    let pair = Pair {
        a: 1,
        b: "x".to_owned(),
    };
    assert_eq!(encode_pretty(&pair_encoder(), &pair), "{\n  \"a\": 1,\n  \"b\": \"x\"\n}");
    let nested = VecEncoder::new(VecEncoder::new(LongEncoder));
    assert_eq!(
        encode_pretty(&nested, &vec![vec![1i64], vec![]]),
        "[\n  [\n    1\n  ],\n  []\n]"
    );
}

#[test]
fn encode_escapes_strings() {
    assert_eq!(
        encode_str(&StringEncoder, &"a\"b\\c\nd\u{1}".to_owned()),
        r#""a\"b\\c\nd\u0001""#
    );
}

#[test]
fn encoded_non_finite_floats_are_null() {
    assert_eq!(encode_str(&DoubleEncoder, &f64::NAN), "null");
    assert_eq!(encode_str(&DoubleEncoder, &f64::INFINITY), "null");
}
