// Kafka wire-format crate
// Framing, request/response headers, and per-API body decoders for the
// 0.8-0.10 protocol range (API versions 0-2)

mod apis;
mod error;
mod message_set;
pub mod messages;
mod reader;
mod splitter;


#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { ::tracing::warn!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}
pub(crate) use trace_warn;

pub use apis::{API_COUNT, ApiKey, ApiVersion, ErrorCode};
pub use error::{WireError, WireResult};
pub use message_set::{MessageSet, MessageSetIter};
pub use messages::{RequestHeader, ResponseHeader};
pub use reader::Reader;
pub use splitter::{LENGTH_PREFIX, RawMessage, Splitter};

/// Newtype for nanosecond-precision capture timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimestampNs(pub u64);

impl TimestampNs {
    /// Returns `self - other`, clamped to zero on underflow.
    pub fn saturating_sub(self, other: TimestampNs) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

impl std::fmt::Display for TimestampNs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

impl From<u64> for TimestampNs {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl From<TimestampNs> for u64 {
    fn from(v: TimestampNs) -> Self {
        v.0
    }
}
