#![doc = include_str!("../README.md")]

mod chunker;
mod config;
mod decoder;
mod encoder;
mod errors;
mod escape;
pub mod lexer;
mod matrix;
pub mod numbers;
mod object;
mod reader;
mod sum;

pub use chunker::{for_each_document, ChunkError, Chunker, ChunkerBuilder};
pub use config::{number_max_bits, set_number_max_bits};
pub use decoder::{
    decode_bytes, decode_str, BTreeMapDecoder, BTreeSetDecoder, BigDecimalDecoder, BigIntegerDecoder, BooleanDecoder,
    ByteDecoder, CharDecoder, Decoder, DoubleDecoder, EitherDecoder, FieldDecoder, FloatDecoder, HashSetDecoder,
    IntDecoder, IntFieldDecoder, LongDecoder, LongFieldDecoder, MapDecoder, MappedDecoder, NumberIntDecoder,
    OptionDecoder, ShortDecoder, StringDecoder, StringFieldDecoder, UIntDecoder, UIntFieldDecoder, ULongDecoder,
    ULongFieldDecoder, VecDecoder,
};
pub use encoder::{
    encode_pretty, encode_str, BTreeMapEncoder, BTreeSetEncoder, BigDecimalEncoder, BigIntegerEncoder, BooleanEncoder,
    ByteEncoder, CharEncoder, DoubleEncoder, EitherEncoder, Encoder, FieldEncoder, FloatEncoder, HashSetEncoder,
    IntEncoder, IntFieldEncoder, JsonWriter, LongEncoder, LongFieldEncoder, MapEncoder, OptionEncoder, ShortEncoder,
    StringEncoder, StringFieldEncoder, UIntEncoder, UIntFieldEncoder, ULongEncoder, ULongFieldEncoder, VecEncoder,
};
pub use errors::{DecodeError, ErrorKind, Frame, Trace};
pub use escape::EscapedString;
pub use matrix::StringMatrix;
pub use numbers::NumberInt;
pub use object::{ObjectDecoder, ObjectDecoderBuilder, ObjectEncoder, ObjectEncoderBuilder, Slots};
pub use reader::{ByteReader, RetractReader, StrReader};
pub use sum::{
    TaggedSumBuilder, TaggedSumDecoder, TaggedSumEncoder, TaggedSumEncoderBuilder, WrapperSumBuilder,
    WrapperSumDecoder, WrapperSumEncoder, WrapperSumEncoderBuilder,
};

pub use bigdecimal::BigDecimal;
pub use either::Either;
pub use num_bigint::BigInt;
