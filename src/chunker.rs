use std::fmt;
use std::io::Read;

/// Failure modes of the [Chunker].
#[derive(Debug)]
pub enum ChunkError {
    /// A single document exceeded the configured byte limit.
    DocumentTooLarge { limit: usize },
    /// End of stream inside a document, in strict mode.
    TruncatedDocument,
    Io(std::io::Error),
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentTooLarge { limit } => write!(f, "document exceeds {limit} bytes"),
            Self::TruncatedDocument => f.write_str("truncated document at end of stream"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for ChunkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

const DEFAULT_MAX_DOC_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ChunkerBuilder {
    max_doc_bytes: usize,
    strict: bool,
}

impl Default for ChunkerBuilder {
    fn default() -> Self {
        Self {
            max_doc_bytes: DEFAULT_MAX_DOC_BYTES,
            strict: false,
        }
    }
}

impl ChunkerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upper bound on a single document, in bytes.
    pub fn max_doc_bytes(mut self, max_doc_bytes: usize) -> Self {
        self.max_doc_bytes = max_doc_bytes;
        self
    }

    /// Reject a partial trailing document at end of stream instead of
    /// discarding it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> Chunker {
        Chunker {
            max_doc_bytes: self.max_doc_bytes,
            strict: self.strict,
            buf: Vec::new(),
            depth: 0,
            in_string: false,
            escape: false,
        }
    }
}

/// Assembles whole top-level JSON documents out of an arbitrarily
/// segmented byte stream.
///
/// The framer tracks only what boundary detection needs: bracket nesting
/// depth, whether the scan is inside a string, and whether the previous
/// byte opened an escape. A document completes when depth returns to zero
/// outside a string; bare top-level scalars complete at whitespace or at
/// the next opening bracket, brace or quote. Whitespace between documents
/// is discarded. Content validation is the decoder's job, once per
/// delivered document.
#[derive(Debug)]
pub struct Chunker {
    max_doc_bytes: usize,
    strict: bool,
    buf: Vec<u8>,
    depth: usize,
    in_string: bool,
    escape: bool,
}

impl Chunker {
    /// Feed a segment, invoking `sink` once per completed document.
    pub fn accept<F: FnMut(&[u8])>(&mut self, bytes: &[u8], sink: &mut F) -> Result<(), ChunkError> {
        for &b in bytes {
            self.accept_byte(b, sink)?;
        }
        Ok(())
    }

    /// Signal end of stream. A complete pending scalar is flushed; an
    /// unterminated document errors in strict mode and is discarded
    /// otherwise.
    pub fn finish<F: FnMut(&[u8])>(&mut self, sink: &mut F) -> Result<(), ChunkError> {
        if self.in_string || self.depth > 0 {
            self.reset();
            if self.strict {
                return Err(ChunkError::TruncatedDocument);
            }
            return Ok(());
        }
        if !self.buf.is_empty() {
            sink(&self.buf);
        }
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.depth = 0;
        self.in_string = false;
        self.escape = false;
    }

    fn accept_byte<F: FnMut(&[u8])>(&mut self, b: u8, sink: &mut F) -> Result<(), ChunkError> {
        if self.in_string {
            self.push(b)?;
            if self.escape {
                self.escape = false;
            } else if b == b'\\' {
                self.escape = true;
            } else if b == b'"' {
                self.in_string = false;
                if self.depth == 0 {
                    self.emit(sink);
                }
            }
            return Ok(());
        }
        match b {
            b'"' => {
                if self.depth == 0 && !self.buf.is_empty() {
                    self.emit(sink);
                }
                self.in_string = true;
                self.push(b)?;
            }
            b'{' | b'[' => {
                if self.depth == 0 && !self.buf.is_empty() {
                    self.emit(sink);
                }
                self.depth += 1;
                self.push(b)?;
            }
            b'}' | b']' => {
                self.push(b)?;
                if self.depth > 0 {
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.emit(sink);
                    }
                }
            }
            b' ' | b'\t' | b'\r' | b'\n' => {
                if self.depth == 0 {
                    if !self.buf.is_empty() {
                        self.emit(sink);
                    }
                } else {
                    self.push(b)?;
                }
            }
            _ => self.push(b)?,
        }
        Ok(())
    }

    fn push(&mut self, b: u8) -> Result<(), ChunkError> {
        if self.buf.len() >= self.max_doc_bytes {
            return Err(ChunkError::DocumentTooLarge {
                limit: self.max_doc_bytes,
            });
        }
        self.buf.push(b);
        Ok(())
    }

    fn emit<F: FnMut(&[u8])>(&mut self, sink: &mut F) {
        sink(&self.buf);
        self.buf.clear();
    }
}

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// Pump a byte stream through a [Chunker] in 64 KiB reads.
pub fn for_each_document<R: Read, F: FnMut(&[u8])>(
    mut reader: R,
    builder: ChunkerBuilder,
    mut sink: F,
) -> Result<(), ChunkError> {
    let mut chunker = builder.build();
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        let n = reader.read(&mut buf).map_err(ChunkError::Io)?;
        if n == 0 {
            break;
        }
        chunker.accept(&buf[..n], &mut sink)?;
    }
    chunker.finish(&mut sink)
}
