use crate::errors::{decode_err, DecodeError, ErrorKind, Trace};
use crate::reader::RetractReader;

/// A sub-reader that yields the logical contents of a JSON string,
/// materializing escape sequences on demand.
///
/// Construct it with the reader positioned just after the opening `"`.
/// [read](EscapedString::read) returns `None` once the closing quote has
/// been consumed. Surrogate pairs written as two `\uXXXX` escapes are
/// combined into the supplementary codepoint.
pub struct EscapedString<'r> {
    reader: &'r mut dyn RetractReader,
}

impl<'r> EscapedString<'r> {
    pub fn new(reader: &'r mut dyn RetractReader) -> Self {
        Self { reader }
    }

    pub fn read(&mut self, trace: Option<&Trace<'_>>) -> Result<Option<char>, DecodeError> {
        let c = self.reader.read_char()?;
        match c {
            '"' => Ok(None),
            '\\' => self.escape(trace),
            c if (c as u32) < 0x20 => decode_err!(trace, ErrorKind::InvalidControl),
            c => Ok(Some(c)),
        }
    }

    fn escape(&mut self, trace: Option<&Trace<'_>>) -> Result<Option<char>, DecodeError> {
        let c = self.reader.read_char()?;
        match c {
            '"' | '\\' | '/' => Ok(Some(c)),
            'b' => Ok(Some('\u{0008}')),
            'f' => Ok(Some('\u{000C}')),
            'n' => Ok(Some('\n')),
            'r' => Ok(Some('\r')),
            't' => Ok(Some('\t')),
            'u' => self.charcode(trace).map(Some),
            c => decode_err!(trace, ErrorKind::InvalidEscape(c)),
        }
    }

    fn charcode(&mut self, trace: Option<&Trace<'_>>) -> Result<char, DecodeError> {
        let n = self.hex4(trace)?;
        match n {
            // a lone trailing surrogate can never start a pair
            0xDC00..=0xDFFF => decode_err!(trace, ErrorKind::InvalidCharCode),
            0xD800..=0xDBFF => {
                if self.reader.read_char()? != '\\' || self.reader.read_char()? != 'u' {
                    return decode_err!(trace, ErrorKind::InvalidCharCode);
                }
                let n2 = self.hex4(trace)?;
                if !(0xDC00..=0xDFFF).contains(&n2) {
                    return decode_err!(trace, ErrorKind::InvalidCharCode);
                }
                let cp = 0x1_0000 + ((n - 0xD800) << 10) + (n2 - 0xDC00);
                match char::from_u32(cp) {
                    Some(c) => Ok(c),
                    None => decode_err!(trace, ErrorKind::InvalidCharCode),
                }
            }
            n => match char::from_u32(n) {
                Some(c) => Ok(c),
                None => decode_err!(trace, ErrorKind::InvalidCharCode),
            },
        }
    }

    fn hex4(&mut self, trace: Option<&Trace<'_>>) -> Result<u32, DecodeError> {
        let mut n = 0u32;
        for _ in 0..4 {
            let c = self.reader.read_char()?;
            let hex = match c {
                '0'..='9' => c as u32 - '0' as u32,
                'a'..='f' => c as u32 - 'a' as u32 + 10,
                'A'..='F' => c as u32 - 'A' as u32 + 10,
                _ => return decode_err!(trace, ErrorKind::InvalidCharCode),
            };
            n = (n << 4) + hex;
        }
        Ok(n)
    }
}
