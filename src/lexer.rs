//! Token-level JSON grammar primitives.
//!
//! Every function takes the current error trace and a reader, consumes one
//! grammatical element and raises a traced [DecodeError] on mismatch. The
//! composite decoders are thin loops over these primitives.

use crate::encoder::JsonWriter;
use crate::errors::{decode_err, DecodeError, ErrorKind, Trace, RECURSION_LIMIT};
use crate::escape::EscapedString;
use crate::matrix::StringMatrix;
use crate::numbers::{self, NumberError};
use crate::reader::RetractReader;

/// Expect `"` (retracted, returns true) or `}` (consumed, returns false)
/// after the opening brace.
pub fn first_object(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<bool, DecodeError> {
    let c = r.next_non_whitespace()?;
    match c {
        '"' => {
            r.retract();
            Ok(true)
        }
        '}' => Ok(false),
        c => decode_err!(trace, ErrorKind::ExpectedStringOrObjectEnd(c)),
    }
}

/// After an object member: `,` continues, `}` ends.
pub fn next_object(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<bool, DecodeError> {
    let c = r.next_non_whitespace()?;
    match c {
        ',' => Ok(true),
        '}' => Ok(false),
        c => decode_err!(trace, ErrorKind::ExpectedCommaOrObjectEnd(c)),
    }
}

/// Expect a value (retracted, returns true) or `]` after the opening bracket.
pub fn first_array(_trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<bool, DecodeError> {
    let c = r.next_non_whitespace()?;
    if c == ']' {
        Ok(false)
    } else {
        r.retract();
        Ok(true)
    }
}

/// After an array element: `,` continues, `]` ends.
pub fn next_array(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<bool, DecodeError> {
    let c = r.next_non_whitespace()?;
    match c {
        ',' => Ok(true),
        ']' => Ok(false),
        c => decode_err!(trace, ErrorKind::ExpectedCommaOrArrayEnd(c)),
    }
}

/// Skip whitespace and require exactly `want`.
pub fn expect_char(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader, want: char) -> Result<(), DecodeError> {
    let got = r.next_non_whitespace()?;
    if got == want {
        Ok(())
    } else {
        decode_err!(trace, ErrorKind::ExpectedChar { want, got })
    }
}

/// Require exactly `want` with no whitespace skipping.
pub fn expect_char_only(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader, want: char) -> Result<(), DecodeError> {
    let got = r.read_char()?;
    if got == want {
        Ok(())
    } else {
        decode_err!(trace, ErrorKind::ExpectedChar { want, got })
    }
}

/// Verbatim match of a fixed literal tail, e.g. `ull` after a leading `n`.
pub fn read_chars(
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
    expected: &[char],
    literal: &'static str,
) -> Result<(), DecodeError> {
    for &c in expected {
        if r.read_char()? != c {
            return decode_err!(trace, ErrorKind::ExpectedLiteral(literal));
        }
    }
    Ok(())
}

/// Read a field name through the matcher and consume the `:`.
/// Returns the matched ordinal or -1.
pub fn field(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader, matrix: &StringMatrix) -> Result<i32, DecodeError> {
    let ord = ordinal(trace, r, matrix)?;
    expect_char(trace, r, ':')?;
    Ok(ord)
}

/// Stream a JSON string through the matcher without materializing it.
/// Returns the matched ordinal or -1; does not consume a `:`.
pub fn ordinal(
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
    matrix: &StringMatrix,
) -> Result<i32, DecodeError> {
    expect_char(trace, r, '"')?;
    let mut escaped = EscapedString::new(r);
    let mut mask = matrix.initial();
    let mut length = 0usize;
    while let Some(c) = escaped.read(trace)? {
        mask = matrix.update(mask, length, c);
        length += 1;
    }
    Ok(matrix.first(matrix.exact(mask, length)))
}

/// Read a full JSON string into an owned buffer.
pub fn string(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<String, DecodeError> {
    expect_char(trace, r, '"')?;
    let mut escaped = EscapedString::new(r);
    let mut out = String::new();
    while let Some(c) = escaped.read(trace)? {
        out.push(c);
    }
    Ok(out)
}

pub fn boolean(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<bool, DecodeError> {
    let c = r.next_non_whitespace()?;
    match c {
        't' => {
            read_chars(trace, r, &['r', 'u', 'e'], "true")?;
            Ok(true)
        }
        'f' => {
            read_chars(trace, r, &['a', 'l', 's', 'e'], "false")?;
            Ok(false)
        }
        c => decode_err!(trace, ErrorKind::ExpectedBool { got: c }),
    }
}

fn number<T>(
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
    type_name: &'static str,
    parse: fn(&mut dyn RetractReader) -> Result<T, NumberError>,
) -> Result<T, DecodeError> {
    let render = |e: NumberError| match e {
        NumberError::Unsafe => DecodeError::traced(trace, ErrorKind::ExpectedType(type_name)),
        NumberError::Read(e) => e,
    };
    let c = r.next_non_whitespace()?;
    if c == '"' {
        // the string form "42" parses identically inside the quotes
        let value = parse(r).map_err(render)?;
        r.retract();
        expect_char_only(trace, r, '"')?;
        Ok(value)
    } else if c == '-' || c.is_ascii_digit() {
        r.retract();
        let value = parse(r).map_err(render)?;
        r.retract();
        Ok(value)
    } else {
        decode_err!(trace, ErrorKind::ExpectedNumber { got: c })
    }
}

pub fn byte(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<i8, DecodeError> {
    number(trace, r, "a Byte", numbers::byte)
}

pub fn short(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<i16, DecodeError> {
    number(trace, r, "a Short", numbers::short)
}

pub fn int(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<i32, DecodeError> {
    number(trace, r, "an Int", numbers::int)
}

pub fn long(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<i64, DecodeError> {
    number(trace, r, "a Long", numbers::long)
}

pub fn unsigned_int(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<u32, DecodeError> {
    number(trace, r, "an unsigned Int", numbers::unsigned_int)
}

pub fn unsigned_long(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<u64, DecodeError> {
    number(trace, r, "an unsigned Long", numbers::unsigned_long)
}

pub fn big_integer(
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
) -> Result<num_bigint::BigInt, DecodeError> {
    number(trace, r, "a BigInteger", numbers::big_integer)
}

pub fn number_int(
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
) -> Result<numbers::NumberInt, DecodeError> {
    number(trace, r, "an integer", numbers::number_int)
}

pub fn float(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<f32, DecodeError> {
    number(trace, r, "a Float", numbers::float)
}

pub fn double(trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<f64, DecodeError> {
    number(trace, r, "a Double", numbers::double)
}

pub fn big_decimal(
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
) -> Result<bigdecimal::BigDecimal, DecodeError> {
    number(trace, r, "a BigDecimal", numbers::big_decimal)
}

/// Consume one complete JSON value. With a writer, echo its normalized
/// form: whitespace between tokens dropped, string contents verbatim,
/// commas and colons reinserted. Used by the discriminated-sum replay.
pub fn skip_value(
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
    mut out: Option<&mut JsonWriter>,
) -> Result<(), DecodeError> {
    skip_value_inner(trace, r, &mut out, 0)
}

fn emit(out: &mut Option<&mut JsonWriter>, c: char) {
    if let Some(w) = out {
        w.push(c);
    }
}

fn emit_str(out: &mut Option<&mut JsonWriter>, s: &str) {
    if let Some(w) = out {
        w.push_str(s);
    }
}

fn skip_value_inner(
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
    out: &mut Option<&mut JsonWriter>,
    depth: u8,
) -> Result<(), DecodeError> {
    if depth > RECURSION_LIMIT {
        return decode_err!(trace, ErrorKind::RecursionLimitExceeded);
    }
    let c = r.next_non_whitespace()?;
    match c {
        'n' => {
            read_chars(trace, r, &['u', 'l', 'l'], "null")?;
            emit_str(out, "null");
            Ok(())
        }
        't' => {
            read_chars(trace, r, &['r', 'u', 'e'], "true")?;
            emit_str(out, "true");
            Ok(())
        }
        'f' => {
            read_chars(trace, r, &['a', 'l', 's', 'e'], "false")?;
            emit_str(out, "false");
            Ok(())
        }
        '"' => copy_string(trace, r, out),
        '-' | '0'..='9' => {
            emit(out, c);
            copy_number(r, out);
            Ok(())
        }
        '{' => {
            emit(out, '{');
            if first_object(trace, r)? {
                let mut first = true;
                loop {
                    if !first {
                        emit(out, ',');
                    }
                    first = false;
                    expect_char(trace, r, '"')?;
                    copy_string(trace, r, out)?;
                    expect_char(trace, r, ':')?;
                    emit(out, ':');
                    skip_value_inner(trace, r, out, depth + 1)?;
                    if !next_object(trace, r)? {
                        break;
                    }
                }
            }
            emit(out, '}');
            Ok(())
        }
        '[' => {
            emit(out, '[');
            if first_array(trace, r)? {
                let mut first = true;
                loop {
                    if !first {
                        emit(out, ',');
                    }
                    first = false;
                    skip_value_inner(trace, r, out, depth + 1)?;
                    if !next_array(trace, r)? {
                        break;
                    }
                }
            }
            emit(out, ']');
            Ok(())
        }
        c => decode_err!(trace, ErrorKind::Unexpected(c)),
    }
}

// after the opening quote has been consumed; escapes pass through unexpanded
fn copy_string(
    trace: Option<&Trace<'_>>,
    r: &mut dyn RetractReader,
    out: &mut Option<&mut JsonWriter>,
) -> Result<(), DecodeError> {
    emit(out, '"');
    loop {
        let c = r.read_char()?;
        match c {
            '"' => {
                emit(out, '"');
                return Ok(());
            }
            '\\' => {
                emit(out, '\\');
                let e = r.read_char()?;
                emit(out, e);
            }
            c if (c as u32) < 0x20 => return decode_err!(trace, ErrorKind::InvalidControl),
            c => emit(out, c),
        }
    }
}

// lenient scan: the replayed value is re-validated by the variant decoder
fn copy_number(r: &mut dyn RetractReader, out: &mut Option<&mut JsonWriter>) {
    loop {
        match r.read_char() {
            Ok(c) if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-') => emit(out, c),
            Ok(_) => {
                r.retract();
                return;
            }
            Err(_) => return,
        }
    }
}
