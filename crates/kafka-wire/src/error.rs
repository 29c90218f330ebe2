//! Wire-level error types.

use thiserror::Error;

/// Result type for wire-level decode operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors raised while framing or decoding Kafka wire data.
///
/// Every error is scoped to the bytes being decoded: none of them carry
/// stream or connection identity, which is layered on by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Read past the end of the payload.
    #[error("unexpected end of payload: need {needed} bytes, have {available}")]
    UnexpectedEof { needed: usize, available: usize },

    /// A length or count prefix was negative (and not the -1 null marker).
    #[error("invalid {what} length: {len}")]
    InvalidLength { len: i32, what: &'static str },

    /// A protocol string was not valid UTF-8.
    #[error("string field is not valid utf-8")]
    InvalidUtf8,

    /// The request header named an API key outside the known range.
    #[error("unknown api key: {0}")]
    UnknownApiKey(i16),

    /// A framing buffer grew past the configured cap. This failure is
    /// permanent for the stream that hit it.
    #[error("message buffer too large: {buffered} bytes (max {max})")]
    BufferTooLarge { buffered: usize, max: usize },
}
