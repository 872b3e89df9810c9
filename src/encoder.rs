use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::{self, Write};
use std::marker::PhantomData;

use bigdecimal::BigDecimal;
use either::Either;
use num_bigint::BigInt;

/// A growable UTF-8 output buffer with JSON string escaping.
#[derive(Debug, Default)]
pub struct JsonWriter {
    buf: String,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, c: char) {
        self.buf.push(c);
    }

    pub fn push_str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub fn push_display<T: fmt::Display>(&mut self, value: T) {
        // writing to a String cannot fail
        let _ = write!(self.buf, "{value}");
    }

    /// Append `s` as a quoted JSON string, escaping as needed.
    pub fn push_escaped(&mut self, s: &str) {
        self.buf.push('"');
        for c in s.chars() {
            match c {
                '"' => self.buf.push_str("\\\""),
                '\\' => self.buf.push_str("\\\\"),
                '\u{0008}' => self.buf.push_str("\\b"),
                '\u{000C}' => self.buf.push_str("\\f"),
                '\n' => self.buf.push_str("\\n"),
                '\r' => self.buf.push_str("\\r"),
                '\t' => self.buf.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    let _ = write!(self.buf, "\\u{:04x}", c as u32);
                }
                c => self.buf.push(c),
            }
        }
        self.buf.push('"');
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// With an indent level, emit a newline and two spaces per level.
pub(crate) fn newline_indent(out: &mut JsonWriter, indent: Option<usize>) {
    if let Some(level) = indent {
        out.push('\n');
        for _ in 0..level * 2 {
            out.push(' ');
        }
    }
}

/// Push-style serializer for `A`. Total: encoding a valid value cannot
/// fail. `indent` is `None` for compact output or the current indentation
/// level for pretty output.
pub trait Encoder<A>: Send + Sync {
    fn unsafe_encode(&self, value: &A, indent: Option<usize>, out: &mut JsonWriter);
}

/// Encodes a map key as a quoted JSON string.
pub trait FieldEncoder<K>: Send + Sync {
    fn encode_field(&self, key: &K, out: &mut JsonWriter);
}

/// Serialize with the given encoder, compact.
pub fn encode_str<A, E: Encoder<A> + ?Sized>(encoder: &E, value: &A) -> String {
    let mut out = JsonWriter::new();
    encoder.unsafe_encode(value, None, &mut out);
    out.into_string()
}

/// Serialize with the given encoder, two-space indented.
pub fn encode_pretty<A, E: Encoder<A> + ?Sized>(encoder: &E, value: &A) -> String {
    let mut out = JsonWriter::new();
    encoder.unsafe_encode(value, Some(0), &mut out);
    out.into_string()
}

pub struct BooleanEncoder;

impl Encoder<bool> for BooleanEncoder {
    fn unsafe_encode(&self, value: &bool, _indent: Option<usize>, out: &mut JsonWriter) {
        out.push_str(if *value { "true" } else { "false" });
    }
}

pub struct StringEncoder;

impl Encoder<String> for StringEncoder {
    fn unsafe_encode(&self, value: &String, _indent: Option<usize>, out: &mut JsonWriter) {
        out.push_escaped(value);
    }
}

pub struct CharEncoder;

impl Encoder<char> for CharEncoder {
    fn unsafe_encode(&self, value: &char, _indent: Option<usize>, out: &mut JsonWriter) {
        let mut tmp = [0u8; 4];
        out.push_escaped(value.encode_utf8(&mut tmp));
    }
}

macro_rules! display_encoder {
    ($name:ident, $ty:ty) => {
        pub struct $name;

        impl Encoder<$ty> for $name {
            fn unsafe_encode(&self, value: &$ty, _indent: Option<usize>, out: &mut JsonWriter) {
                out.push_display(value);
            }
        }
    };
}

display_encoder!(ByteEncoder, i8);
display_encoder!(ShortEncoder, i16);
display_encoder!(IntEncoder, i32);
display_encoder!(LongEncoder, i64);
display_encoder!(UIntEncoder, u32);
display_encoder!(ULongEncoder, u64);
display_encoder!(BigIntegerEncoder, BigInt);
display_encoder!(BigDecimalEncoder, BigDecimal);

pub struct FloatEncoder;

impl Encoder<f32> for FloatEncoder {
    fn unsafe_encode(&self, value: &f32, _indent: Option<usize>, out: &mut JsonWriter) {
        if value.is_finite() {
            out.push_display(value);
        } else {
            out.push_str("null");
        }
    }
}

pub struct DoubleEncoder;

impl Encoder<f64> for DoubleEncoder {
    fn unsafe_encode(&self, value: &f64, _indent: Option<usize>, out: &mut JsonWriter) {
        if value.is_finite() {
            out.push_display(value);
        } else {
            out.push_str("null");
        }
    }
}

pub struct OptionEncoder<A, E> {
    inner: E,
    _marker: PhantomData<fn(&A)>,
}

impl<A, E: Encoder<A>> OptionEncoder<A, E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<A, E: Encoder<A>> Encoder<Option<A>> for OptionEncoder<A, E> {
    fn unsafe_encode(&self, value: &Option<A>, indent: Option<usize>, out: &mut JsonWriter) {
        match value {
            Some(v) => self.inner.unsafe_encode(v, indent, out),
            None => out.push_str("null"),
        }
    }
}

fn encode_elements<'a, A: 'a, E: Encoder<A>>(
    encoder: &E,
    items: impl Iterator<Item = &'a A>,
    indent: Option<usize>,
    out: &mut JsonWriter,
) {
    out.push('[');
    let inner = indent.map(|level| level + 1);
    let mut any = false;
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(',');
        }
        newline_indent(out, inner);
        encoder.unsafe_encode(item, inner, out);
        any = true;
    }
    if any {
        newline_indent(out, indent);
    }
    out.push(']');
}

pub struct VecEncoder<A, E> {
    inner: E,
    _marker: PhantomData<fn(&A)>,
}

impl<A, E: Encoder<A>> VecEncoder<A, E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<A, E: Encoder<A>> Encoder<Vec<A>> for VecEncoder<A, E> {
    fn unsafe_encode(&self, value: &Vec<A>, indent: Option<usize>, out: &mut JsonWriter) {
        encode_elements(&self.inner, value.iter(), indent, out);
    }
}

pub struct HashSetEncoder<A, E> {
    inner: E,
    _marker: PhantomData<fn(&A)>,
}

impl<A, E: Encoder<A>> HashSetEncoder<A, E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<A, E: Encoder<A>> Encoder<HashSet<A, ahash::RandomState>> for HashSetEncoder<A, E> {
    fn unsafe_encode(&self, value: &HashSet<A, ahash::RandomState>, indent: Option<usize>, out: &mut JsonWriter) {
        encode_elements(&self.inner, value.iter(), indent, out);
    }
}

pub struct BTreeSetEncoder<A, E> {
    inner: E,
    _marker: PhantomData<fn(&A)>,
}

impl<A, E: Encoder<A>> BTreeSetEncoder<A, E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<A: Ord, E: Encoder<A>> Encoder<BTreeSet<A>> for BTreeSetEncoder<A, E> {
    fn unsafe_encode(&self, value: &BTreeSet<A>, indent: Option<usize>, out: &mut JsonWriter) {
        encode_elements(&self.inner, value.iter(), indent, out);
    }
}

fn encode_entries<'a, K: 'a, V: 'a, FK: FieldEncoder<K>, EV: Encoder<V>>(
    key_encoder: &FK,
    value_encoder: &EV,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
    indent: Option<usize>,
    out: &mut JsonWriter,
) {
    out.push('{');
    let inner = indent.map(|level| level + 1);
    let mut any = false;
    for (i, (k, v)) in entries.enumerate() {
        if i > 0 {
            out.push(',');
        }
        newline_indent(out, inner);
        key_encoder.encode_field(k, out);
        out.push(':');
        if inner.is_some() {
            out.push(' ');
        }
        value_encoder.unsafe_encode(v, inner, out);
        any = true;
    }
    if any {
        newline_indent(out, indent);
    }
    out.push('}');
}

pub struct MapEncoder<K, V, FK, EV> {
    key: FK,
    value: EV,
    _marker: PhantomData<fn(&K, &V)>,
}

impl<K, V, FK: FieldEncoder<K>, EV: Encoder<V>> MapEncoder<K, V, FK, EV> {
    pub fn new(key: FK, value: EV) -> Self {
        Self {
            key,
            value,
            _marker: PhantomData,
        }
    }
}

impl<K, V, FK: FieldEncoder<K>, EV: Encoder<V>> Encoder<HashMap<K, V, ahash::RandomState>>
    for MapEncoder<K, V, FK, EV>
{
    fn unsafe_encode(&self, value: &HashMap<K, V, ahash::RandomState>, indent: Option<usize>, out: &mut JsonWriter) {
        encode_entries(&self.key, &self.value, value.iter(), indent, out);
    }
}

pub struct BTreeMapEncoder<K, V, FK, EV> {
    key: FK,
    value: EV,
    _marker: PhantomData<fn(&K, &V)>,
}

impl<K, V, FK: FieldEncoder<K>, EV: Encoder<V>> BTreeMapEncoder<K, V, FK, EV> {
    pub fn new(key: FK, value: EV) -> Self {
        Self {
            key,
            value,
            _marker: PhantomData,
        }
    }
}

impl<K: Ord, V, FK: FieldEncoder<K>, EV: Encoder<V>> Encoder<BTreeMap<K, V>> for BTreeMapEncoder<K, V, FK, EV> {
    fn unsafe_encode(&self, value: &BTreeMap<K, V>, indent: Option<usize>, out: &mut JsonWriter) {
        encode_entries(&self.key, &self.value, value.iter(), indent, out);
    }
}

/// Wrapper-object encoding of [Either]: `{"Left": l}` / `{"Right": r}`.
pub struct EitherEncoder<L, R, EL, ER> {
    left: EL,
    right: ER,
    _marker: PhantomData<fn(&L, &R)>,
}

impl<L, R, EL: Encoder<L>, ER: Encoder<R>> EitherEncoder<L, R, EL, ER> {
    pub fn new(left: EL, right: ER) -> Self {
        Self {
            left,
            right,
            _marker: PhantomData,
        }
    }
}

impl<L, R, EL: Encoder<L>, ER: Encoder<R>> Encoder<Either<L, R>> for EitherEncoder<L, R, EL, ER> {
    fn unsafe_encode(&self, value: &Either<L, R>, indent: Option<usize>, out: &mut JsonWriter) {
        out.push('{');
        let inner = indent.map(|level| level + 1);
        newline_indent(out, inner);
        match value {
            Either::Left(l) => {
                out.push_escaped("Left");
                out.push(':');
                if inner.is_some() {
                    out.push(' ');
                }
                self.left.unsafe_encode(l, inner, out);
            }
            Either::Right(r) => {
                out.push_escaped("Right");
                out.push(':');
                if inner.is_some() {
                    out.push(' ');
                }
                self.right.unsafe_encode(r, inner, out);
            }
        }
        newline_indent(out, indent);
        out.push('}');
    }
}

pub struct StringFieldEncoder;

impl FieldEncoder<String> for StringFieldEncoder {
    fn encode_field(&self, key: &String, out: &mut JsonWriter) {
        out.push_escaped(key);
    }
}

macro_rules! display_field_encoder {
    ($name:ident, $ty:ty) => {
        pub struct $name;

        impl FieldEncoder<$ty> for $name {
            fn encode_field(&self, key: &$ty, out: &mut JsonWriter) {
                out.push('"');
                out.push_display(key);
                out.push('"');
            }
        }
    };
}

display_field_encoder!(IntFieldEncoder, i32);
display_field_encoder!(LongFieldEncoder, i64);
display_field_encoder!(UIntFieldEncoder, u32);
display_field_encoder!(ULongFieldEncoder, u64);
