use smallvec::SmallVec;

use crate::decoder::Decoder;
use crate::encoder::{newline_indent, Encoder, JsonWriter};
use crate::errors::{decode_err, DecodeError, ErrorKind, Frame, Trace};
use crate::lexer;
use crate::matrix::StringMatrix;
use crate::object::ObjectEncoder;
use crate::reader::{RetractReader, StrReader};

type VariantReader<A> = Box<dyn Fn(Option<&Trace<'_>>, &mut dyn RetractReader) -> Result<A, DecodeError> + Send + Sync>;
type VariantWriter<A> = Box<dyn Fn(&A, Option<usize>, &mut JsonWriter) -> bool + Send + Sync>;

/// Decoder for the wrapper-object sum encoding `{"Tag": value}`:
/// exactly one key, naming the variant.
pub struct WrapperSumDecoder<A> {
    variants: Vec<String>,
    matrix: StringMatrix,
    children: Vec<VariantReader<A>>,
}

impl<A> WrapperSumDecoder<A> {
    pub fn builder() -> WrapperSumBuilder<A> {
        WrapperSumBuilder {
            variants: Vec::new(),
            children: Vec::new(),
        }
    }
}

pub struct WrapperSumBuilder<A> {
    variants: Vec<String>,
    children: Vec<VariantReader<A>>,
}

impl<A> WrapperSumBuilder<A> {
    pub fn variant<B>(
        mut self,
        tag: &str,
        decoder: impl Decoder<B> + 'static,
        inject: impl Fn(B) -> A + Send + Sync + 'static,
    ) -> Self {
        self.variants.push(tag.to_owned());
        self.children
            .push(Box::new(move |trace, r| decoder.unsafe_decode(trace, r).map(&inject)));
        self
    }

    /// # Panics
    /// If there are no variants, 64 or more, or duplicate tags.
    pub fn build(self) -> WrapperSumDecoder<A> {
        assert_distinct(&self.variants);
        WrapperSumDecoder {
            matrix: StringMatrix::new(&self.variants),
            variants: self.variants,
            children: self.children,
        }
    }
}

impl<A> Decoder<A> for WrapperSumDecoder<A> {
    fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<A, DecodeError> {
        lexer::expect_char(trace, r, '{')?;
        if !lexer::first_object(trace, r)? {
            return decode_err!(trace, ErrorKind::ExpectedNonEmptyObject);
        }
        let ord = lexer::field(trace, r, &self.matrix)?;
        if ord < 0 {
            return decode_err!(trace, ErrorKind::InvalidDisambiguator);
        }
        let i = ord as usize;
        let t = Trace::new(Frame::Variant(&self.variants[i]), trace);
        let value = (self.children[i])(Some(&t), r)?;
        // a second key trips here
        lexer::expect_char(trace, r, '}')?;
        Ok(value)
    }
}

/// Decoder for the discriminator-field sum encoding
/// `{"type": "Tag", ...fields}`.
///
/// Fields seen before the discriminator cannot be dispatched yet, so
/// their normalized bytes are captured and the whole object is replayed
/// into the selected variant's decoder once the tag is known.
pub struct TaggedSumDecoder<A> {
    discriminator: String,
    variants: Vec<String>,
    matrix: StringMatrix,
    children: Vec<VariantReader<A>>,
}

impl<A> TaggedSumDecoder<A> {
    pub fn builder(discriminator: &str) -> TaggedSumBuilder<A> {
        TaggedSumBuilder {
            discriminator: discriminator.to_owned(),
            variants: Vec::new(),
            children: Vec::new(),
        }
    }
}

pub struct TaggedSumBuilder<A> {
    discriminator: String,
    variants: Vec<String>,
    children: Vec<VariantReader<A>>,
}

impl<A> TaggedSumBuilder<A> {
    pub fn variant<B>(
        mut self,
        tag: &str,
        decoder: impl Decoder<B> + 'static,
        inject: impl Fn(B) -> A + Send + Sync + 'static,
    ) -> Self {
        self.variants.push(tag.to_owned());
        self.children
            .push(Box::new(move |trace, r| decoder.unsafe_decode(trace, r).map(&inject)));
        self
    }

    /// # Panics
    /// If there are no variants, 64 or more, or duplicate tags.
    pub fn build(self) -> TaggedSumDecoder<A> {
        assert_distinct(&self.variants);
        TaggedSumDecoder {
            discriminator: self.discriminator,
            matrix: StringMatrix::new(&self.variants),
            variants: self.variants,
            children: self.children,
        }
    }
}

impl<A> Decoder<A> for TaggedSumDecoder<A> {
    fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<A, DecodeError> {
        lexer::expect_char(trace, r, '{')?;
        let mut ord: i32 = -1;
        let mut captured: SmallVec<[(String, String); 8]> = SmallVec::new();
        if lexer::first_object(trace, r)? {
            loop {
                let key = lexer::string(trace, r)?;
                lexer::expect_char(trace, r, ':')?;
                if key == self.discriminator {
                    if ord >= 0 {
                        return decode_err!(trace, ErrorKind::DuplicateDisambiguator(self.discriminator.clone()));
                    }
                    ord = lexer::ordinal(trace, r, &self.matrix)?;
                    if ord < 0 {
                        return decode_err!(trace, ErrorKind::InvalidDisambiguatorIn(self.discriminator.clone()));
                    }
                } else {
                    let mut value = JsonWriter::new();
                    lexer::skip_value(trace, r, Some(&mut value))?;
                    captured.push((key, value.into_string()));
                }
                if !lexer::next_object(trace, r)? {
                    break;
                }
            }
        }
        if ord < 0 {
            return decode_err!(trace, ErrorKind::MissingDisambiguator(self.discriminator.clone()));
        }
        // replay the remaining members into the selected variant
        let mut replay = JsonWriter::new();
        replay.push('{');
        for (i, (key, value)) in captured.iter().enumerate() {
            if i > 0 {
                replay.push(',');
            }
            replay.push_escaped(key);
            replay.push(':');
            replay.push_str(value);
        }
        replay.push('}');
        let text = replay.into_string();
        let i = ord as usize;
        let t = Trace::new(Frame::Variant(&self.variants[i]), trace);
        let mut sub = StrReader::new(&text);
        (self.children[i])(Some(&t), &mut sub)
    }
}

fn assert_distinct(variants: &[String]) {
    assert!((1..64).contains(&variants.len()), "1..=63 variants required");
    for (i, tag) in variants.iter().enumerate() {
        assert!(!variants[..i].contains(tag), "duplicate variant tag {tag:?}");
    }
}

/// Encoder for the wrapper-object sum encoding.
pub struct WrapperSumEncoder<A> {
    variants: Vec<VariantWriter<A>>,
}

impl<A> WrapperSumEncoder<A> {
    pub fn builder() -> WrapperSumEncoderBuilder<A> {
        WrapperSumEncoderBuilder { variants: Vec::new() }
    }
}

pub struct WrapperSumEncoderBuilder<A> {
    variants: Vec<VariantWriter<A>>,
}

impl<A> WrapperSumEncoderBuilder<A> {
    /// `project` returns the payload when `A` is this variant.
    pub fn variant<B>(
        mut self,
        tag: &str,
        encoder: impl Encoder<B> + 'static,
        project: impl for<'a> Fn(&'a A) -> Option<&'a B> + Send + Sync + 'static,
    ) -> Self {
        let tag = tag.to_owned();
        self.variants.push(Box::new(move |value, indent, out| {
            let Some(payload) = project(value) else {
                return false;
            };
            out.push('{');
            let inner = indent.map(|level| level + 1);
            newline_indent(out, inner);
            out.push_escaped(&tag);
            out.push(':');
            if inner.is_some() {
                out.push(' ');
            }
            encoder.unsafe_encode(payload, inner, out);
            newline_indent(out, indent);
            out.push('}');
            true
        }));
        self
    }

    pub fn build(self) -> WrapperSumEncoder<A> {
        WrapperSumEncoder { variants: self.variants }
    }
}

impl<A> Encoder<A> for WrapperSumEncoder<A> {
    fn unsafe_encode(&self, value: &A, indent: Option<usize>, out: &mut JsonWriter) {
        let matched = self.variants.iter().any(|write| write(value, indent, out));
        debug_assert!(matched, "no variant projected the value");
    }
}

/// Encoder for the discriminator-field sum encoding: the tag member is
/// written first, then the variant's own fields.
pub struct TaggedSumEncoder<A> {
    variants: Vec<VariantWriter<A>>,
}

impl<A> TaggedSumEncoder<A> {
    pub fn builder(discriminator: &str) -> TaggedSumEncoderBuilder<A> {
        TaggedSumEncoderBuilder {
            discriminator: discriminator.to_owned(),
            variants: Vec::new(),
        }
    }
}

pub struct TaggedSumEncoderBuilder<A> {
    discriminator: String,
    variants: Vec<VariantWriter<A>>,
}

impl<A> TaggedSumEncoderBuilder<A> {
    pub fn variant<B: 'static>(
        mut self,
        tag: &str,
        fields: ObjectEncoder<B>,
        project: impl for<'a> Fn(&'a A) -> Option<&'a B> + Send + Sync + 'static,
    ) -> Self {
        let discriminator = self.discriminator.clone();
        let tag = tag.to_owned();
        self.variants.push(Box::new(move |value, indent, out| {
            let Some(payload) = project(value) else {
                return false;
            };
            out.push('{');
            let inner = indent.map(|level| level + 1);
            newline_indent(out, inner);
            out.push_escaped(&discriminator);
            out.push(':');
            if inner.is_some() {
                out.push(' ');
            }
            out.push_escaped(&tag);
            fields.encode_interior(payload, inner, out);
            newline_indent(out, indent);
            out.push('}');
            true
        }));
        self
    }

    pub fn build(self) -> TaggedSumEncoder<A> {
        TaggedSumEncoder { variants: self.variants }
    }
}

impl<A> Encoder<A> for TaggedSumEncoder<A> {
    fn unsafe_encode(&self, value: &A, indent: Option<usize>, out: &mut JsonWriter) {
        let matched = self.variants.iter().any(|write| write(value, indent, out));
        debug_assert!(matched, "no variant projected the value");
    }
}
