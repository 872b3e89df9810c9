use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::decoder::{AnyDecoder, Decoder, Erased};
use crate::encoder::{newline_indent, Encoder, JsonWriter};
use crate::errors::{decode_err, DecodeError, ErrorKind, Frame, Trace};
use crate::lexer;
use crate::matrix::StringMatrix;
use crate::reader::RetractReader;

/// The uniform slot array a record constructor reads its fields from.
pub struct Slots<'s>(&'s mut [Option<Box<dyn Any + Send>>]);

impl Slots<'_> {
    /// Take field `i`, downcast to its declared type.
    ///
    /// # Panics
    /// If the requested type differs from the one the field was declared
    /// with, a bug in the shape description.
    pub fn take<A: 'static>(&mut self, i: usize) -> A {
        let slot = self.0[i].take().expect("slot already taken");
        *slot.downcast::<A>().expect("slot type mismatch")
    }
}

/// Generic recursive-descent decoder for a product type.
///
/// Built once from a shape description; each decode allocates a single
/// slot vector and matches field names through the [StringMatrix], so no
/// string is materialized for known keys.
pub struct ObjectDecoder<A> {
    names: Vec<String>,
    matrix: StringMatrix,
    children: Vec<Arc<dyn AnyDecoder>>,
    no_extra: bool,
    build: Box<dyn Fn(Slots<'_>) -> A + Send + Sync>,
}

impl<A> ObjectDecoder<A> {
    pub fn builder() -> ObjectDecoderBuilder<A> {
        ObjectDecoderBuilder {
            names: Vec::new(),
            children: Vec::new(),
            no_extra: false,
            _marker: PhantomData,
        }
    }
}

pub struct ObjectDecoderBuilder<A> {
    names: Vec<String>,
    children: Vec<Arc<dyn AnyDecoder>>,
    no_extra: bool,
    _marker: PhantomData<fn() -> A>,
}

impl<A> ObjectDecoderBuilder<A> {
    /// Declare the next field, under the JSON name it is serialized as.
    pub fn field<B: Send + 'static>(mut self, name: &str, decoder: impl Decoder<B> + 'static) -> Self {
        self.names.push(name.to_owned());
        self.children.push(Arc::new(Erased::new(decoder)));
        self
    }

    /// Reject unknown keys instead of skipping them.
    pub fn no_extra_fields(mut self) -> Self {
        self.no_extra = true;
        self
    }

    /// # Panics
    /// If there are no fields, 64 or more, or duplicate names.
    pub fn build(self, build: impl Fn(Slots<'_>) -> A + Send + Sync + 'static) -> ObjectDecoder<A> {
        let n = self.names.len();
        assert!((1..64).contains(&n), "1..=63 fields required");
        for (i, name) in self.names.iter().enumerate() {
            assert!(
                !self.names[..i].contains(name),
                "duplicate field name {name:?}"
            );
        }
        ObjectDecoder {
            matrix: StringMatrix::new(&self.names),
            names: self.names,
            children: self.children,
            no_extra: self.no_extra,
            build: Box::new(build),
        }
    }
}

impl<A> Decoder<A> for ObjectDecoder<A> {
    fn unsafe_decode(&self, trace: Option<&Trace<'_>>, r: &mut dyn RetractReader) -> Result<A, DecodeError> {
        lexer::expect_char(trace, r, '{')?;
        let mut slots: Vec<Option<Box<dyn Any + Send>>> = (0..self.names.len()).map(|_| None).collect();
        if lexer::first_object(trace, r)? {
            loop {
                let ord = lexer::field(trace, r, &self.matrix)?;
                if ord >= 0 {
                    let i = ord as usize;
                    let t = Trace::new(Frame::Field(&self.names[i]), trace);
                    if slots[i].is_some() {
                        return decode_err!(Some(&t), ErrorKind::Duplicate);
                    }
                    slots[i] = Some(self.children[i].decode_any(Some(&t), r)?);
                } else if self.no_extra {
                    return decode_err!(trace, ErrorKind::InvalidExtraField);
                } else {
                    lexer::skip_value(trace, r, None)?;
                }
                if !lexer::next_object(trace, r)? {
                    break;
                }
            }
        }
        for (i, slot) in slots.iter_mut().enumerate() {
            if slot.is_none() {
                let t = Trace::new(Frame::Field(&self.names[i]), trace);
                *slot = Some(self.children[i].missing_any(Some(&t))?);
            }
        }
        Ok((self.build)(Slots(&mut slots)))
    }
}

type FieldWriter<A> = Box<dyn Fn(&A, Option<usize>, &mut JsonWriter) + Send + Sync>;

/// Push-style encoder for a product type: the destructor side of the
/// shape description.
pub struct ObjectEncoder<A> {
    fields: Vec<(String, FieldWriter<A>)>,
}

impl<A> ObjectEncoder<A> {
    pub fn builder() -> ObjectEncoderBuilder<A> {
        ObjectEncoderBuilder { fields: Vec::new() }
    }

    /// Write the members without surrounding braces, each preceded by a
    /// comma. Lets a discriminator field share the object.
    pub(crate) fn encode_interior(&self, value: &A, indent: Option<usize>, out: &mut JsonWriter) {
        for (name, write) in &self.fields {
            out.push(',');
            newline_indent(out, indent);
            out.push_escaped(name);
            out.push(':');
            if indent.is_some() {
                out.push(' ');
            }
            write(value, indent, out);
        }
    }
}

pub struct ObjectEncoderBuilder<A> {
    fields: Vec<(String, FieldWriter<A>)>,
}

impl<A> ObjectEncoderBuilder<A> {
    pub fn field<B>(
        mut self,
        name: &str,
        encoder: impl Encoder<B> + 'static,
        get: impl Fn(&A) -> &B + Send + Sync + 'static,
    ) -> Self {
        self.fields.push((
            name.to_owned(),
            Box::new(move |a, indent, out| encoder.unsafe_encode(get(a), indent, out)),
        ));
        self
    }

    pub fn build(self) -> ObjectEncoder<A> {
        ObjectEncoder { fields: self.fields }
    }
}

impl<A> Encoder<A> for ObjectEncoder<A> {
    fn unsafe_encode(&self, value: &A, indent: Option<usize>, out: &mut JsonWriter) {
        out.push('{');
        let inner = indent.map(|level| level + 1);
        for (i, (name, write)) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            newline_indent(out, inner);
            out.push_escaped(name);
            out.push(':');
            if inner.is_some() {
                out.push(' ');
            }
            write(value, inner, out);
        }
        if !self.fields.is_empty() {
            newline_indent(out, indent);
        }
        out.push('}');
    }
}

impl<A> std::fmt::Debug for ObjectDecoder<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectDecoder")
            .field("names", &self.names)
            .field("no_extra", &self.no_extra)
            .finish_non_exhaustive()
    }
}

impl<A> std::fmt::Debug for ObjectEncoder<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("ObjectEncoder").field("names", &names).finish_non_exhaustive()
    }
}
