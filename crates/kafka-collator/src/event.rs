//! Output model: events and the transaction envelope around them.

use kafka_wire::{ApiKey, ApiVersion, ErrorCode, TimestampNs};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Transaction status derived from the governing protocol error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
    /// Bodies were not decoded (no-details mode, internal broker APIs).
    Unknown,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Error => "Error",
            Status::Unknown => "Unknown",
        }
    }
}

impl From<ErrorCode> for Status {
    fn from(code: ErrorCode) -> Self {
        if code.is_ok() { Status::Ok } else { Status::Error }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output event for a reconstructed transaction.
///
/// Most APIs emit one event per logical unit of work: per (topic, partition)
/// for the produce/fetch/offset family, per broker and per topic for
/// metadata, a single aggregate event for group coordination. All events of
/// one transaction share the same `transaction_id`.
///
/// Serializes to `{status, transaction_id, <api name>: {..}, notes?}`, with
/// `group` hoisted to the top level for describe_group events.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEvent {
    pub status: Status,
    /// Freshly generated per transaction, shared by all its events.
    pub transaction_id: Uuid,
    /// Group name, set for describe_group events only.
    pub group: Option<String>,
    /// Key the details object serializes under, e.g. `"produce"`.
    pub api: &'static str,
    /// Per-API payload; absent for status-only events.
    pub details: Option<Value>,
    /// Free-text notes for soft inconsistencies (never decode failures).
    pub notes: Vec<String>,
}

impl TransactionEvent {
    /// Minimal event carrying no decoded detail.
    pub(crate) fn status_only(transaction_id: Uuid) -> Self {
        TransactionEvent {
            status: Status::Unknown,
            transaction_id,
            group: None,
            api: "",
            details: None,
            notes: Vec::new(),
        }
    }
}

impl Serialize for TransactionEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(group) = &self.group {
            map.serialize_entry("group", group)?;
        }
        map.serialize_entry("status", self.status.as_str())?;
        map.serialize_entry("transaction_id", &self.transaction_id)?;
        if let Some(details) = &self.details {
            map.serialize_entry(self.api, details)?;
        }
        if !self.notes.is_empty() {
            map.serialize_entry("notes", &self.notes)?;
        }
        map.end()
    }
}

/// A finished transaction: the event plus the envelope metadata the
/// publisher adapter annotates from (timing, sizes, identity).
#[derive(Debug, Clone)]
pub struct Transaction {
    pub event: TransactionEvent,
    pub correlation_id: i32,
    pub api_key: ApiKey,
    pub api_version: ApiVersion,
    pub client_id: Option<String>,
    /// Capture time of the first packet of the request.
    pub request_timestamp_ns: TimestampNs,
    /// Capture time of the first packet of the response.
    pub response_timestamp_ns: TimestampNs,
    /// Request wire size including framing.
    pub bytes_in: usize,
    /// Response wire size including framing.
    pub bytes_out: usize,
}

impl Transaction {
    pub fn latency_ns(&self) -> u64 {
        self.response_timestamp_ns
            .saturating_sub(self.request_timestamp_ns)
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "=== kafka {} {} (correlation {}) ===",
            self.api_key, self.api_version, self.correlation_id
        )?;
        if let Some(client) = &self.client_id {
            writeln!(f, "Client: {client}")?;
        }
        writeln!(f, "Status: {}", self.event.status)?;
        writeln!(f, "Latency: {:.2}ms", self.latency_ns() as f64 / 1_000_000.0)?;
        write!(f, "Bytes: {} in, {} out", self.bytes_in, self.bytes_out)
    }
}
