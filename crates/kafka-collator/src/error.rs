//! Analyzer error types.

use kafka_wire::WireError;
use thiserror::Error;

/// Errors that end a connection's analysis.
///
/// All of these mean the connection entry was dropped; the next packet on
/// the same flow starts over with fresh state. Per-transaction decode
/// failures are not errors at this level, they are logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzerError {
    /// Framing failed, in practice the per-direction buffer cap.
    #[error("framing failed: {0}")]
    Framing(#[from] WireError),

    /// Neither direction of the connection looks like a request stream.
    #[error("connection cannot be synchronized: no direction carries valid requests")]
    SyncFailed,

    /// Correlation invariants broke after synchronization, usually from
    /// missed packets or a mid-stream capture glitch.
    #[error("connection desynchronized, buffered state dropped")]
    Desync,
}
