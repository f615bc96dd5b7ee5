// Newline-delimited framing for the stdio transport

use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};

/// Upper bound for one JSON-RPC message line
pub const MAX_LINE_LENGTH: usize = 8 * 1024 * 1024;

/// One decoded input frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    /// Line that is not valid UTF-8
    Malformed,
    /// Line longer than the limit; the rest of it is skipped
    Oversized,
}

/// `LinesCodec` that reports bad lines as frames instead of errors, so
/// that a single bad line does not end the stream. Only I/O failures
/// surface as `Err`.
#[derive(Debug)]
pub struct JsonLinesCodec {
    inner: LinesCodec,
}

impl JsonLinesCodec {
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn frame(result: Result<Option<String>, LinesCodecError>) -> io::Result<Option<Frame>> {
        match result {
            Ok(line) => Ok(line.map(Frame::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::Oversized)),
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Some(Frame::Malformed))
            }
            Err(LinesCodecError::Io(e)) => Err(e),
        }
    }
}

impl Default for JsonLinesCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for JsonLinesCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Frame>> {
        Self::frame(self.inner.decode(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<Frame>> {
        Self::frame(self.inner.decode_eof(src))
    }
}
