use std::fmt;

use smallvec::SmallVec;

/// One breadcrumb on the path from the document root to a decode site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// An object field, rendered as `.name`.
    Field(&'a str),
    /// An array element, rendered as `[i]`.
    Index(usize),
    /// A sum-type variant, rendered as `{tag}`.
    Variant(&'a str),
}

/// A stack of [Frame]s threaded through recursive descent.
///
/// Each composite decoder allocates one `Trace` on its own call stack and
/// links it to the parent's, so extending the path is O(1) per level with no
/// heap involved. The chain is only walked (and reversed) on the cold path,
/// when an error is actually raised.
#[derive(Debug, Clone, Copy)]
pub struct Trace<'a> {
    pub frame: Frame<'a>,
    pub parent: Option<&'a Trace<'a>>,
}

impl<'a> Trace<'a> {
    pub fn new(frame: Frame<'a>, parent: Option<&'a Trace<'a>>) -> Self {
        Self { frame, parent }
    }

    /// Render the tip-first chain as a jq-style path, root first.
    ///
    /// An empty chain renders as `.`, the document root.
    pub fn render(trace: Option<&Trace<'_>>) -> String {
        let mut frames: SmallVec<[Frame<'_>; 16]> = SmallVec::new();
        let mut next = trace;
        while let Some(t) = next {
            frames.push(t.frame);
            next = t.parent;
        }
        if frames.is_empty() {
            return ".".to_owned();
        }
        let mut out = String::new();
        for frame in frames.iter().rev() {
            match frame {
                Frame::Field(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                Frame::Index(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
                Frame::Variant(tag) => {
                    out.push('{');
                    out.push_str(tag);
                    out.push('}');
                }
            }
        }
        out
    }
}

/// What went wrong, without the location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    ExpectedChar { want: char, got: char },
    ExpectedNumber { got: char },
    /// The type string carries its article, e.g. `an Int`, `a BigInteger`.
    ExpectedType(&'static str),
    ExpectedLiteral(&'static str),
    ExpectedBool { got: char },
    InvalidControl,
    InvalidEscape(char),
    InvalidCharCode,
    Missing,
    MissingFields,
    Duplicate,
    AmbiguousEither,
    InvalidDisambiguator,
    InvalidDisambiguatorIn(String),
    DuplicateDisambiguator(String),
    MissingDisambiguator(String),
    ExpectedNonEmptyObject,
    InvalidExtraField,
    Unexpected(char),
    ExpectedStringOrObjectEnd(char),
    ExpectedCommaOrObjectEnd(char),
    ExpectedCommaOrArrayEnd(char),
    RecursionLimitExceeded,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpectedChar { want, got } => write!(f, "expected '{want}' got '{got}'"),
            Self::ExpectedNumber { got } => write!(f, "expected a number, got {got}"),
            Self::ExpectedType(ty) => write!(f, "expected {ty}"),
            Self::ExpectedLiteral(lit) => write!(f, "expected {lit}"),
            Self::ExpectedBool { got } => write!(f, "expected 'true' or 'false' got '{got}'"),
            Self::InvalidControl => f.write_str("invalid control in string"),
            Self::InvalidEscape(c) => write!(f, "invalid '\\{c}' in string"),
            Self::InvalidCharCode => f.write_str("invalid charcode in string"),
            Self::Missing => f.write_str("missing"),
            Self::MissingFields => f.write_str("missing fields"),
            Self::Duplicate => f.write_str("duplicate"),
            Self::AmbiguousEither => f.write_str("ambiguous either, both present"),
            Self::InvalidDisambiguator => f.write_str("invalid disambiguator"),
            Self::InvalidDisambiguatorIn(field) => write!(f, "invalid disambiguator in '{field}'"),
            Self::DuplicateDisambiguator(field) => write!(f, "duplicate disambiguator '{field}'"),
            Self::MissingDisambiguator(field) => write!(f, "missing disambiguator '{field}'"),
            Self::ExpectedNonEmptyObject => f.write_str("expected non-empty object"),
            Self::InvalidExtraField => f.write_str("invalid extra field"),
            Self::Unexpected(c) => write!(f, "unexpected '{c}'"),
            Self::ExpectedStringOrObjectEnd(c) => write!(f, "expected string or '}}' got '{c}'"),
            Self::ExpectedCommaOrObjectEnd(c) => write!(f, "expected ',' or '}}' got '{c}'"),
            Self::ExpectedCommaOrArrayEnd(c) => write!(f, "expected ',' or ']' got '{c}'"),
            Self::RecursionLimitExceeded => f.write_str("recursion limit exceeded"),
        }
    }
}

/// A decode failure.
///
/// `Traced` carries the rendered jq-style path to the failure site, so a
/// missing field three levels down displays as
/// `.rows[0].elements[0].distance.value(missing)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended before the value did.
    UnexpectedEnd,
    /// The input bytes were not valid UTF-8.
    InvalidUtf8,
    Traced { path: String, kind: ErrorKind },
}

impl DecodeError {
    pub(crate) fn traced(trace: Option<&Trace<'_>>, kind: ErrorKind) -> Self {
        Self::Traced {
            path: Trace::render(trace),
            kind,
        }
    }

    /// The error kind, if the failure carries one.
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            Self::Traced { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEnd => f.write_str("unexpected end of input"),
            Self::InvalidUtf8 => f.write_str("invalid unicode"),
            Self::Traced { path, kind } => write!(f, "{path}({kind})"),
        }
    }
}

impl std::error::Error for DecodeError {}

macro_rules! decode_err {
    ($trace:expr, $kind:expr) => {
        Err(crate::errors::DecodeError::traced($trace, $kind))
    };
}

pub(crate) use decode_err;

pub(crate) const RECURSION_LIMIT: u8 = 200;
