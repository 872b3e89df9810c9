use std::str::FromStr;

use bigdecimal::BigDecimal;
use lexical_parse_float::{format as lexical_format, FromLexicalWithOptions, Options as ParseFloatOptions};
use num_bigint::BigInt;
use num_traits::cast::ToPrimitive;
use smallvec::SmallVec;

use crate::config;
use crate::errors::DecodeError;
use crate::reader::RetractReader;

/// Failure channel for the number parsers.
///
/// `Unsafe` is a single sentinel for everything that makes the value
/// unrepresentable in the target type: wrong shape, overflow, or a digit
/// count past the configured bit cap. The lexer renders it as
/// `expected a <Type>`.
#[derive(Debug)]
pub enum NumberError {
    Unsafe,
    Read(DecodeError),
}

type Scratch = SmallVec<[u8; 32]>;

/// All parsers consume characters matching
/// `[-]digit+(.digit+)?([eE][+-]?digit+)?` and over-read exactly one
/// character to find the end; the caller retracts once. At EOF the
/// over-read is zero-width and the retract is a no-op.
fn read_opt(r: &mut dyn RetractReader) -> Result<Option<char>, NumberError> {
    match r.read_char() {
        Ok(c) => Ok(Some(c)),
        Err(DecodeError::UnexpectedEnd) => Ok(None),
        Err(e) => Err(NumberError::Read(e)),
    }
}

fn sign(r: &mut dyn RetractReader) -> Result<(bool, char), NumberError> {
    let c = r.read_char().map_err(NumberError::Read)?;
    if c == '-' {
        let d = r.read_char().map_err(NumberError::Read)?;
        Ok((true, d))
    } else {
        Ok((false, c))
    }
}

/// Parse an integer. Accumulation is checked, in the negative domain so
/// `i64::MIN` round-trips; a `.` or exponent makes the value non-integral
/// and raises the sentinel.
pub fn long(r: &mut dyn RetractReader) -> Result<i64, NumberError> {
    let (negative, first) = sign(r)?;
    if !first.is_ascii_digit() {
        return Err(NumberError::Unsafe);
    }
    let mut value = -((first as u8 - b'0') as i64);
    loop {
        match read_opt(r)? {
            Some(c) if c.is_ascii_digit() => {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_sub((c as u8 - b'0') as i64))
                    .ok_or(NumberError::Unsafe)?;
            }
            Some('.' | 'e' | 'E') => return Err(NumberError::Unsafe),
            _ => break,
        }
    }
    if negative {
        Ok(value)
    } else {
        value.checked_neg().ok_or(NumberError::Unsafe)
    }
}

pub fn byte(r: &mut dyn RetractReader) -> Result<i8, NumberError> {
    i8::try_from(long(r)?).map_err(|_| NumberError::Unsafe)
}

pub fn short(r: &mut dyn RetractReader) -> Result<i16, NumberError> {
    i16::try_from(long(r)?).map_err(|_| NumberError::Unsafe)
}

pub fn int(r: &mut dyn RetractReader) -> Result<i32, NumberError> {
    i32::try_from(long(r)?).map_err(|_| NumberError::Unsafe)
}

/// Unsigned variant: a leading `-` is unrepresentable.
pub fn unsigned_long(r: &mut dyn RetractReader) -> Result<u64, NumberError> {
    let (negative, first) = sign(r)?;
    if negative || !first.is_ascii_digit() {
        return Err(NumberError::Unsafe);
    }
    let mut value = (first as u8 - b'0') as u64;
    loop {
        match read_opt(r)? {
            Some(c) if c.is_ascii_digit() => {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add((c as u8 - b'0') as u64))
                    .ok_or(NumberError::Unsafe)?;
            }
            Some('.' | 'e' | 'E') => return Err(NumberError::Unsafe),
            _ => break,
        }
    }
    Ok(value)
}

pub fn unsigned_int(r: &mut dyn RetractReader) -> Result<u32, NumberError> {
    u32::try_from(unsigned_long(r)?).map_err(|_| NumberError::Unsafe)
}

/// Parse an arbitrary-precision integer, bounded by the bit cap.
///
/// The cap is enforced during the scan, before any big-integer
/// conversion, so a billion-digit input fails after `max_digits` bytes.
pub fn big_integer(r: &mut dyn RetractReader) -> Result<BigInt, NumberError> {
    let max_digits = config::max_digits();
    let mut buf = Scratch::new();
    let (negative, first) = sign(r)?;
    if !first.is_ascii_digit() {
        return Err(NumberError::Unsafe);
    }
    buf.push(first as u8);
    loop {
        match read_opt(r)? {
            Some(c) if c.is_ascii_digit() => {
                if buf.len() >= max_digits {
                    return Err(NumberError::Unsafe);
                }
                buf.push(c as u8);
            }
            Some('.' | 'e' | 'E') => return Err(NumberError::Unsafe),
            _ => break,
        }
    }
    let value = BigInt::parse_bytes(&buf, 10).ok_or(NumberError::Unsafe)?;
    Ok(if negative { -value } else { value })
}

/// An integer that is an `i64` whenever it fits, a [BigInt] otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberInt {
    Int(i64),
    BigInt(BigInt),
}

impl From<NumberInt> for f64 {
    fn from(num: NumberInt) -> Self {
        match num {
            NumberInt::Int(int) => int as f64,
            NumberInt::BigInt(big_int) => big_int.to_f64().unwrap_or(f64::NAN),
        }
    }
}

/// Parse an integer of any width under the bit cap, preferring the
/// machine word.
pub fn number_int(r: &mut dyn RetractReader) -> Result<NumberInt, NumberError> {
    let max_digits = config::max_digits();
    let mut buf = Scratch::new();
    let (negative, first) = sign(r)?;
    if negative {
        buf.push(b'-');
    }
    if !first.is_ascii_digit() {
        return Err(NumberError::Unsafe);
    }
    buf.push(first as u8);
    let mut digits = 1usize;
    loop {
        match read_opt(r)? {
            Some(c) if c.is_ascii_digit() => {
                if digits >= max_digits {
                    return Err(NumberError::Unsafe);
                }
                digits += 1;
                buf.push(c as u8);
            }
            Some('.' | 'e' | 'E') => return Err(NumberError::Unsafe),
            _ => break,
        }
    }
    let text = std::str::from_utf8(&buf).map_err(|_| NumberError::Unsafe)?;
    if let Ok(value) = i64::from_str(text) {
        return Ok(NumberInt::Int(value));
    }
    let value = BigInt::parse_bytes(&buf, 10).ok_or(NumberError::Unsafe)?;
    Ok(NumberInt::BigInt(value))
}

/// Scan the full number grammar into `buf`, normalizing `E` to `e`.
/// The digit cap applies to the whole scan, so pathological mantissas and
/// exponents are both cut short.
fn scan_number(r: &mut dyn RetractReader, buf: &mut Scratch) -> Result<(), NumberError> {
    let max_digits = config::max_digits();
    let mut digits = 0usize;
    let mut push_digit = |buf: &mut Scratch, c: char| {
        if digits >= max_digits {
            return Err(NumberError::Unsafe);
        }
        digits += 1;
        buf.push(c as u8);
        Ok(())
    };

    let (negative, first) = sign(r)?;
    if negative {
        buf.push(b'-');
    }
    if !first.is_ascii_digit() {
        return Err(NumberError::Unsafe);
    }
    push_digit(buf, first)?;

    let mut next = loop {
        match read_opt(r)? {
            Some(c) if c.is_ascii_digit() => push_digit(buf, c)?,
            other => break other,
        }
    };

    if next == Some('.') {
        buf.push(b'.');
        match read_opt(r)? {
            Some(c) if c.is_ascii_digit() => push_digit(buf, c)?,
            Some(_) => return Err(NumberError::Unsafe),
            None => return Err(NumberError::Read(DecodeError::UnexpectedEnd)),
        }
        next = loop {
            match read_opt(r)? {
                Some(c) if c.is_ascii_digit() => push_digit(buf, c)?,
                other => break other,
            }
        };
    }

    if matches!(next, Some('e' | 'E')) {
        buf.push(b'e');
        // a redundant leading '+' is tolerated here
        let mut c = match read_opt(r)? {
            Some(c) => c,
            None => return Err(NumberError::Read(DecodeError::UnexpectedEnd)),
        };
        if c == '+' || c == '-' {
            if c == '-' {
                buf.push(b'-');
            }
            c = match read_opt(r)? {
                Some(c) => c,
                None => return Err(NumberError::Read(DecodeError::UnexpectedEnd)),
            };
        }
        if !c.is_ascii_digit() {
            return Err(NumberError::Unsafe);
        }
        push_digit(buf, c)?;
        loop {
            match read_opt(r)? {
                Some(c) if c.is_ascii_digit() => push_digit(buf, c)?,
                _ => break,
            }
        }
    }

    Ok(())
}

pub fn double(r: &mut dyn RetractReader) -> Result<f64, NumberError> {
    let mut buf = Scratch::new();
    scan_number(r, &mut buf)?;
    const STANDARD: u128 = lexical_format::STANDARD;
    let options = ParseFloatOptions::new();
    f64::from_lexical_with_options::<STANDARD>(&buf, &options).map_err(|_| NumberError::Unsafe)
}

pub fn float(r: &mut dyn RetractReader) -> Result<f32, NumberError> {
    let mut buf = Scratch::new();
    scan_number(r, &mut buf)?;
    const STANDARD: u128 = lexical_format::STANDARD;
    let options = ParseFloatOptions::new();
    f32::from_lexical_with_options::<STANDARD>(&buf, &options).map_err(|_| NumberError::Unsafe)
}

pub fn big_decimal(r: &mut dyn RetractReader) -> Result<BigDecimal, NumberError> {
    let mut buf = Scratch::new();
    scan_number(r, &mut buf)?;
    let text = std::str::from_utf8(&buf).map_err(|_| NumberError::Unsafe)?;
    BigDecimal::from_str(text).map_err(|_| NumberError::Unsafe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::StrReader;

    #[test]
    fn long_bounds() {
        let mut r = StrReader::new("9223372036854775807 ");
        assert_eq!(long(&mut r).unwrap(), i64::MAX);
        let mut r = StrReader::new("-9223372036854775808 ");
        assert_eq!(long(&mut r).unwrap(), i64::MIN);
        let mut r = StrReader::new("9223372036854775808 ");
        assert!(matches!(long(&mut r), Err(NumberError::Unsafe)));
    }

    #[test]
    fn long_over_reads_once() {
        let mut r = StrReader::new("42,");
        assert_eq!(long(&mut r).unwrap(), 42);
        r.retract();
        assert_eq!(r.read_char().unwrap(), ',');
    }

    #[test]
    fn long_at_eof_retract_is_noop() {
        let mut r = StrReader::new("7");
        assert_eq!(long(&mut r).unwrap(), 7);
        r.retract();
        assert_eq!(r.read_char(), Err(DecodeError::UnexpectedEnd));
    }

    #[test]
    fn long_rejects_fractions() {
        let mut r = StrReader::new("4.2");
        assert!(matches!(long(&mut r), Err(NumberError::Unsafe)));
        let mut r = StrReader::new("4e2");
        assert!(matches!(long(&mut r), Err(NumberError::Unsafe)));
    }

    #[test]
    fn doubles() {
        let mut r = StrReader::new("-2.5e-3 ");
        assert_eq!(double(&mut r).unwrap(), -2.5e-3);
        let mut r = StrReader::new("1e+3 ");
        assert_eq!(double(&mut r).unwrap(), 1e3);
        let mut r = StrReader::new("1.x");
        assert!(matches!(double(&mut r), Err(NumberError::Unsafe)));
    }

    #[test]
    fn big_integer_cap() {
        let ok = "9".repeat(config::max_digits());
        let mut r = StrReader::new(&ok);
        assert!(big_integer(&mut r).is_ok());
        let too_big = "9".repeat(config::max_digits() + 1);
        let mut r = StrReader::new(&too_big);
        assert!(matches!(big_integer(&mut r), Err(NumberError::Unsafe)));
    }

    #[test]
    fn big_decimals() {
        let mut r = StrReader::new("123.450e2 ");
        assert_eq!(big_decimal(&mut r).unwrap(), BigDecimal::from_str("12345.0").unwrap());
    }
}
