use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;

use bigdecimal::BigDecimal;
use either::Either;
use num_bigint::BigInt;

use crate::errors::{decode_err, DecodeError, ErrorKind, Frame, Trace};
use crate::lexer;
use crate::matrix::StringMatrix;
use crate::numbers::NumberInt;
use crate::reader::{ByteReader, RetractReader, StrReader};

/// The capability to consume one JSON value of type `A` from a reader.
///
/// Decoders are immutable values; a decode is a pure function of the
/// reader's bytes, so decoders may be shared freely across threads.
pub trait Decoder<A>: Send + Sync {
    /// Consume one value. On failure the error carries the full path
    /// built from `trace`.
    fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<A, DecodeError>;

    /// Called for an absent object field. The default raises `missing`;
    /// option-like decoders override it to produce an empty value.
    fn decode_missing(&self, trace: Option<&Trace<'_>>) -> Result<A, DecodeError> {
        decode_err!(trace, ErrorKind::Missing)
    }
}

/// Decodes a map key from an already-materialized string.
pub trait FieldDecoder<A>: Send + Sync {
    fn decode_field(&self, trace: Option<&Trace<'_>>, key: &str) -> Result<A, DecodeError>;
}

/// Decode a whole document from text; trailing non-whitespace is an error.
pub fn decode_str<A, D: Decoder<A> + ?Sized>(decoder: &D, input: &str) -> Result<A, DecodeError> {
    let mut r = StrReader::new(input);
    let value = decoder.unsafe_decode(None, &mut r)?;
    finish(&mut r)?;
    Ok(value)
}

/// Decode a whole document from bytes, UTF-8 decoded on the fly.
pub fn decode_bytes<A, D: Decoder<A> + ?Sized>(decoder: &D, input: &[u8]) -> Result<A, DecodeError> {
    let mut r = ByteReader::new(input);
    let value = decoder.unsafe_decode(None, &mut r)?;
    finish(&mut r)?;
    Ok(value)
}

fn finish(r: &mut dyn RetractReader) -> Result<(), DecodeError> {
    match r.next_non_whitespace() {
        Ok(c) => decode_err!(None, ErrorKind::Unexpected(c)),
        Err(DecodeError::UnexpectedEnd) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Type-erased child decoder producing uniform slots for the record
/// machinery.
pub(crate) trait AnyDecoder: Send + Sync {
    fn decode_any(
        &self,
        trace: Option<&Trace<'_>>,
        r: &mut dyn RetractReader,
    ) -> Result<Box<dyn Any + Send>, DecodeError>;

    fn missing_any(&self, trace: Option<&Trace<'_>>) -> Result<Box<dyn Any + Send>, DecodeError>;
}

pub(crate) struct Erased<A, D> {
    inner: D,
    _marker: PhantomData<fn() -> A>,
}

impl<A, D> Erased<A, D> {
    pub(crate) fn new(inner: D) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<A: Send + 'static, D: Decoder<A>> AnyDecoder for Erased<A, D> {
    fn decode_any(
        &self,
        trace: Option<&Trace<'_>>,
        r: &mut dyn RetractReader,
    ) -> Result<Box<dyn Any + Send>, DecodeError> {
        Ok(Box::new(self.inner.unsafe_decode(trace, r)?))
    }

    fn missing_any(&self, trace: Option<&Trace<'_>>) -> Result<Box<dyn Any + Send>, DecodeError> {
        Ok(Box::new(self.inner.decode_missing(trace)?))
    }
}

macro_rules! lexer_decoder {
    ($name:ident, $ty:ty, $lex:path) => {
        pub struct $name;

        impl Decoder<$ty> for $name {
            fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<$ty, DecodeError> {
                $lex(trace, r)
            }
        }
    };
}

lexer_decoder!(BooleanDecoder, bool, lexer::boolean);
lexer_decoder!(StringDecoder, String, lexer::string);
lexer_decoder!(ByteDecoder, i8, lexer::byte);
lexer_decoder!(ShortDecoder, i16, lexer::short);
lexer_decoder!(IntDecoder, i32, lexer::int);
lexer_decoder!(LongDecoder, i64, lexer::long);
lexer_decoder!(UIntDecoder, u32, lexer::unsigned_int);
lexer_decoder!(ULongDecoder, u64, lexer::unsigned_long);
lexer_decoder!(BigIntegerDecoder, BigInt, lexer::big_integer);
lexer_decoder!(NumberIntDecoder, NumberInt, lexer::number_int);
lexer_decoder!(FloatDecoder, f32, lexer::float);
lexer_decoder!(DoubleDecoder, f64, lexer::double);
lexer_decoder!(BigDecimalDecoder, BigDecimal, lexer::big_decimal);

pub struct CharDecoder;

impl Decoder<char> for CharDecoder {
    fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<char, DecodeError> {
        let s = lexer::string(trace, r)?;
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => decode_err!(trace, ErrorKind::ExpectedType("a Char")),
        }
    }
}

/// `missing` and `null` both produce `None`; anything else decodes `A`.
pub struct OptionDecoder<A, D> {
    inner: D,
    _marker: PhantomData<fn() -> A>,
}

impl<A, D: Decoder<A>> OptionDecoder<A, D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<A: Send + Sync, D: Decoder<A>> Decoder<Option<A>> for OptionDecoder<A, D> {
    fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<Option<A>, DecodeError> {
        let c = r.next_non_whitespace()?;
        if c == 'n' {
            lexer::read_chars(trace, r, &['u', 'l', 'l'], "null")?;
            Ok(None)
        } else {
            r.retract();
            self.inner.unsafe_decode(trace, r).map(Some)
        }
    }

    fn decode_missing(&self, _trace: Option<&Trace<'_>>) -> Result<Option<A>, DecodeError> {
        Ok(None)
    }
}

pub struct VecDecoder<A, D> {
    inner: D,
    _marker: PhantomData<fn() -> A>,
}

impl<A, D: Decoder<A>> VecDecoder<A, D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<A: Send + Sync, D: Decoder<A>> Decoder<Vec<A>> for VecDecoder<A, D> {
    fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<Vec<A>, DecodeError> {
        lexer::expect_char(trace, r, '[')?;
        let mut out = Vec::new();
        if lexer::first_array(trace, r)? {
            let mut i = 0usize;
            loop {
                let t = Trace::new(Frame::Index(i), trace);
                out.push(self.inner.unsafe_decode(Some(&t), r)?);
                i += 1;
                if !lexer::next_array(trace, r)? {
                    break;
                }
            }
        }
        Ok(out)
    }
}

pub struct HashSetDecoder<A, D> {
    inner: VecDecoder<A, D>,
}

impl<A, D: Decoder<A>> HashSetDecoder<A, D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner: VecDecoder::new(inner),
        }
    }
}

impl<A, D> Decoder<HashSet<A, ahash::RandomState>> for HashSetDecoder<A, D>
where
    A: Eq + Hash + Send + Sync,
    D: Decoder<A>,
{
    fn unsafe_decode(
        &self,
        trace: Option<&Trace<'_>>,
        r: &mut dyn RetractReader,
    ) -> Result<HashSet<A, ahash::RandomState>, DecodeError> {
        Ok(self.inner.unsafe_decode(trace, r)?.into_iter().collect())
    }
}

pub struct BTreeSetDecoder<A, D> {
    inner: VecDecoder<A, D>,
}

impl<A, D: Decoder<A>> BTreeSetDecoder<A, D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner: VecDecoder::new(inner),
        }
    }
}

impl<A, D> Decoder<BTreeSet<A>> for BTreeSetDecoder<A, D>
where
    A: Ord + Send + Sync,
    D: Decoder<A>,
{
    fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<BTreeSet<A>, DecodeError> {
        Ok(self.inner.unsafe_decode(trace, r)?.into_iter().collect())
    }
}

fn decode_entries<K, V, FK, DV>(
    key_decoder: &FK,
    value_decoder: &DV,
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
    mut insert: impl FnMut(K, V) -> bool,
) -> Result<(), DecodeError>
where
    FK: FieldDecoder<K>,
    DV: Decoder<V>,
{
    lexer::expect_char(trace, r, '{')?;
    if lexer::first_object(trace, r)? {
        loop {
            let key_text = lexer::string(trace, r)?;
            lexer::expect_char(trace, r, ':')?;
            let t = Trace::new(Frame::Field(&key_text), trace);
            let key = key_decoder.decode_field(Some(&t), &key_text)?;
            let value = value_decoder.unsafe_decode(Some(&t), r)?;
            if !insert(key, value) {
                return decode_err!(Some(&t), ErrorKind::Duplicate);
            }
            if !lexer::next_object(trace, r)? {
                break;
            }
        }
    }
    Ok(())
}

pub struct MapDecoder<K, V, FK, DV> {
    key: FK,
    value: DV,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, FK: FieldDecoder<K>, DV: Decoder<V>> MapDecoder<K, V, FK, DV> {
    pub fn new(key: FK, value: DV) -> Self {
        Self {
            key,
            value,
            _marker: PhantomData,
        }
    }
}

impl<K, V, FK, DV> Decoder<HashMap<K, V, ahash::RandomState>> for MapDecoder<K, V, FK, DV>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
    FK: FieldDecoder<K>,
    DV: Decoder<V>,
{
    fn unsafe_decode(
        &self,
        trace: Option<&Trace<'_>>,
        r: &mut dyn RetractReader,
    ) -> Result<HashMap<K, V, ahash::RandomState>, DecodeError> {
        let mut out: HashMap<K, V, ahash::RandomState> = HashMap::default();
        decode_entries(&self.key, &self.value, trace, r, |k, v| out.insert(k, v).is_none())?;
        Ok(out)
    }
}

pub struct BTreeMapDecoder<K, V, FK, DV> {
    key: FK,
    value: DV,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V, FK: FieldDecoder<K>, DV: Decoder<V>> BTreeMapDecoder<K, V, FK, DV> {
    pub fn new(key: FK, value: DV) -> Self {
        Self {
            key,
            value,
            _marker: PhantomData,
        }
    }
}

impl<K, V, FK, DV> Decoder<BTreeMap<K, V>> for BTreeMapDecoder<K, V, FK, DV>
where
    K: Ord + Send + Sync,
    V: Send + Sync,
    FK: FieldDecoder<K>,
    DV: Decoder<V>,
{
    fn unsafe_decode(
        &self,
        trace: Option<&Trace<'_>>,
        r: &mut dyn RetractReader,
    ) -> Result<BTreeMap<K, V>, DecodeError> {
        let mut out = BTreeMap::new();
        decode_entries(&self.key, &self.value, trace, r, |k, v| out.insert(k, v).is_none())?;
        Ok(out)
    }
}

// left-ish and right-ish candidate spellings, in matcher order
const EITHER_NAMES: [&str; 6] = ["a", "Left", "left", "b", "Right", "right"];

/// Wrapper-object decoding of [Either] over the candidate keys
/// `a`/`Left`/`left` and `b`/`Right`/`right`.
pub struct EitherDecoder<L, R, DL, DR> {
    matrix: StringMatrix,
    left: DL,
    right: DR,
    _marker: PhantomData<fn() -> (L, R)>,
}

impl<L, R, DL: Decoder<L>, DR: Decoder<R>> EitherDecoder<L, R, DL, DR> {
    pub fn new(left: DL, right: DR) -> Self {
        Self {
            matrix: StringMatrix::new(&EITHER_NAMES),
            left,
            right,
            _marker: PhantomData,
        }
    }
}

impl<L, R, DL, DR> Decoder<Either<L, R>> for EitherDecoder<L, R, DL, DR>
where
    L: Send + Sync,
    R: Send + Sync,
    DL: Decoder<L>,
    DR: Decoder<R>,
{
    fn unsafe_decode(
        &self,
        trace: Option<&Trace<'_>>,
        r: &mut dyn RetractReader,
    ) -> Result<Either<L, R>, DecodeError> {
        lexer::expect_char(trace, r, '{')?;
        let mut left: Option<L> = None;
        let mut right: Option<R> = None;
        if lexer::first_object(trace, r)? {
            loop {
                let ord = lexer::field(trace, r, &self.matrix)?;
                match ord {
                    0..=2 => {
                        let t = Trace::new(Frame::Field(EITHER_NAMES[ord as usize]), trace);
                        if left.is_some() {
                            return decode_err!(Some(&t), ErrorKind::Duplicate);
                        }
                        left = Some(self.left.unsafe_decode(Some(&t), r)?);
                    }
                    3..=5 => {
                        let t = Trace::new(Frame::Field(EITHER_NAMES[ord as usize]), trace);
                        if right.is_some() {
                            return decode_err!(Some(&t), ErrorKind::Duplicate);
                        }
                        right = Some(self.right.unsafe_decode(Some(&t), r)?);
                    }
                    _ => return decode_err!(trace, ErrorKind::InvalidDisambiguator),
                }
                if !lexer::next_object(trace, r)? {
                    break;
                }
            }
        }
        match (left, right) {
            (Some(l), None) => Ok(Either::Left(l)),
            (None, Some(r)) => Ok(Either::Right(r)),
            (Some(_), Some(_)) => decode_err!(trace, ErrorKind::AmbiguousEither),
            (None, None) => decode_err!(trace, ErrorKind::MissingFields),
        }
    }
}

/// Post-processing combinator: decode `A`, then apply a pure function.
pub struct MappedDecoder<A, B, D, F> {
    inner: D,
    f: F,
    _marker: PhantomData<fn(A) -> B>,
}

impl<A, B, D: Decoder<A>, F: Fn(A) -> B + Send + Sync> MappedDecoder<A, B, D, F> {
    pub fn new(inner: D, f: F) -> Self {
        Self {
            inner,
            f,
            _marker: PhantomData,
        }
    }
}

impl<A, B, D, F> Decoder<B> for MappedDecoder<A, B, D, F>
where
    D: Decoder<A>,
    F: Fn(A) -> B + Send + Sync,
{
    fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<B, DecodeError> {
        self.inner.unsafe_decode(trace, r).map(&self.f)
    }
}

pub struct StringFieldDecoder;

impl FieldDecoder<String> for StringFieldDecoder {
    fn decode_field(&self, _trace: Option<&Trace<'_>>, key: &str) -> Result<String, DecodeError> {
        Ok(key.to_owned())
    }
}

macro_rules! parsed_field_decoder {
    ($name:ident, $ty:ty, $type_name:literal) => {
        pub struct $name;

        impl FieldDecoder<$ty> for $name {
            fn decode_field(&self, trace: Option<&Trace<'_>>, key: &str) -> Result<$ty, DecodeError> {
                key.parse()
                    .map_err(|_| DecodeError::traced(trace, ErrorKind::ExpectedType($type_name)))
            }
        }
    };
}

parsed_field_decoder!(IntFieldDecoder, i32, "an Int");
parsed_field_decoder!(LongFieldDecoder, i64, "a Long");
parsed_field_decoder!(UIntFieldDecoder, u32, "an unsigned Int");
parsed_field_decoder!(ULongFieldDecoder, u64, "an unsigned Long");
