//! Kafka transaction reconstruction
//!
//! Turns observed TCP payloads (from pcap, eBPF, a reassembler) into
//! complete Kafka request/response transactions: frames messages, infers
//! which direction carries requests, pairs responses by correlation id,
//! and decodes both bodies into structured output events.
//!
//! # Usage
//!
//! Implement the [`PacketEvent`] trait for your capture source, then feed
//! events to the [`Analyzer`]:
//!
//! ```ignore
//! use kafka_collator::{Analyzer, PacketEvent, Direction};
//!
//! struct MyPacket { /* ... */ }
//!
//! impl PacketEvent for MyPacket {
//!     fn payload(&self) -> &[u8] { /* ... */ }
//!     fn timestamp_ns(&self) -> TimestampNs { /* ... */ }
//!     fn direction(&self) -> Direction { /* ... */ }
//!     fn connection_id(&self) -> u64 { /* ... */ }
//! }
//!
//! let mut analyzer = Analyzer::new();
//! for transaction in analyzer.add_event(&packet)? {
//!     println!("{transaction}");
//! }
//! ```
//!
//! For multi-threaded capture pipelines, [`AnalyzerCache`] wraps the same
//! machinery behind a concurrent per-connection map.

mod connection;
mod correlate;
mod error;
mod event;
mod mapper;
mod traits;

#[cfg(test)]
mod tests;

#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { ::tracing::warn!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}
pub(crate) use trace_warn;

#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}
pub(crate) use trace_debug;

pub use correlate::{RequestMessage, ResponseMessage, SyncState, Transactions};
pub use error::AnalyzerError;
pub use event::{Status, Transaction, TransactionEvent};
pub use kafka_wire::TimestampNs;
pub use traits::{Direction, PacketEvent};

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Mutex;

use dashmap::DashMap;

use connection::Connection;
use mapper::Mapper;

/// Default per-direction buffer cap. A framed message larger than this
/// fails the stream.
pub const MAX_MESSAGE_BYTES: usize = 10 * 1024 * 1024;

/// Analyzer configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// API names (as accepted by `ApiKey::from_name`) whose transactions
    /// are dropped entirely. Unknown names are ignored with a warning.
    pub ignore_apis: Vec<String>,
    /// Decode bodies into per-API details. When off, every transaction
    /// gets a single status-only event.
    pub detailed: bool,
    /// Per-direction framing buffer cap.
    pub max_message_bytes: usize,
    /// Idle time after which [`Analyzer::cleanup`] evicts a connection.
    pub timeout_ns: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            ignore_apis: Vec::new(),
            detailed: true,
            max_message_bytes: MAX_MESSAGE_BYTES,
            timeout_ns: 10_000_000_000, // 10 seconds
        }
    }
}

impl AnalyzerConfig {
    /// Status-only events, no body decoding.
    pub fn no_details() -> Self {
        AnalyzerConfig {
            detailed: false,
            ..Default::default()
        }
    }

    /// Default configuration with an ignore list.
    pub fn ignoring<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnalyzerConfig {
            ignore_apis: names.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Reconstructs Kafka transactions from a stream of packet events.
///
/// Single-threaded; use [`AnalyzerCache`] to share across threads.
/// Generic over the event type `E` which must implement [`PacketEvent`].
pub struct Analyzer<E: PacketEvent> {
    connections: HashMap<u64, Connection>,
    mapper: Mapper,
    config: AnalyzerConfig,
    _phantom: PhantomData<E>,
}

impl<E: PacketEvent> Default for Analyzer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PacketEvent> Analyzer<E> {
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            connections: HashMap::new(),
            mapper: Mapper::from_config(&config),
            config,
            _phantom: PhantomData,
        }
    }

    /// Feed one packet and return any transactions it completed.
    ///
    /// On error the connection entry is dropped; the next packet on the
    /// same connection id starts over with fresh state.
    pub fn add_event(&mut self, event: &E) -> Result<Vec<Transaction>, AnalyzerError> {
        let payload = event.payload();
        if payload.is_empty() {
            return Ok(Vec::new());
        }

        let conn_id = event.connection_id();
        let max_message_bytes = self.config.max_message_bytes;
        let conn = self
            .connections
            .entry(conn_id)
            .or_insert_with(|| Connection::new(max_message_bytes));

        match conn.feed(event.direction(), payload, event.timestamp_ns()) {
            Ok(pairs) => Ok(collect_transactions(&self.mapper, pairs)),
            Err(err) => {
                self.connections.remove(&conn_id);
                Err(err)
            }
        }
    }

    /// The capture layer saw a sequence gap: buffered state for the
    /// connection is untrustworthy, drop it.
    pub fn gap(&mut self, connection_id: u64, _direction: Direction, _dropped_bytes: usize) {
        if self.connections.remove(&connection_id).is_some() {
            trace_warn!("dropping connection {connection_id} after a capture gap ({_dropped_bytes} bytes lost)");
        }
    }

    /// One side closed the connection; discard its state. Unanswered
    /// requests never produce transactions.
    pub fn fin(&mut self, connection_id: u64, _direction: Direction) {
        self.connections.remove(&connection_id);
    }

    /// Evict connections idle longer than the configured timeout.
    pub fn cleanup(&mut self, now: TimestampNs) {
        let timeout = self.config.timeout_ns;
        self.connections.retain(|_id, conn| {
            let keep = now.saturating_sub(conn.last_activity) < timeout;
            if !keep {
                trace_warn!("evicting idle connection {_id}");
            }
            keep
        });
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// Map matched pairs into transactions, annotating each event with the
/// envelope metadata from the wire messages.
fn collect_transactions(
    mapper: &Mapper,
    pairs: Vec<(RequestMessage, ResponseMessage)>,
) -> Vec<Transaction> {
    let mut out = Vec::new();
    for (requ, resp) in pairs {
        let Some(events) = mapper.map(&requ, &resp) else {
            continue;
        };
        for event in events {
            out.push(Transaction {
                event,
                correlation_id: requ.header.correlation_id,
                api_key: requ.header.api_key,
                api_version: requ.header.version,
                client_id: requ.header.client_id.clone(),
                request_timestamp_ns: requ.timestamp,
                response_timestamp_ns: resp.timestamp,
                bytes_in: requ.wire_size,
                bytes_out: resp.wire_size,
            });
        }
    }
    out
}

/// Concurrent analyzer keyed by an arbitrary connection key.
///
/// Per-connection state lives behind a `DashMap` shard plus a `Mutex`, so
/// packets for different connections proceed in parallel while packets
/// for the same connection serialize.
pub struct AnalyzerCache<K: Hash + Eq + Clone> {
    connections: DashMap<K, Mutex<Connection>>,
    mapper: Mapper,
    config: AnalyzerConfig,
}

impl<K: Hash + Eq + Clone> Default for AnalyzerCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq + Clone> AnalyzerCache<K> {
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    pub fn with_config(config: AnalyzerConfig) -> Self {
        Self {
            connections: DashMap::new(),
            mapper: Mapper::from_config(&config),
            config,
        }
    }

    /// Feed one packet for `key`, returning any completed transactions.
    pub fn process(
        &self,
        key: K,
        direction: Direction,
        payload: &[u8],
        timestamp: TimestampNs,
    ) -> Result<Vec<Transaction>, AnalyzerError> {
        if payload.is_empty() {
            return Ok(Vec::new());
        }

        if !self.connections.contains_key(&key) {
            self.connections.insert(
                key.clone(),
                Mutex::new(Connection::new(self.config.max_message_bytes)),
            );
        }
        let entry = self
            .connections
            .get(&key)
            .expect("entry inserted above cannot be missing");
        let mut conn = entry.lock().unwrap_or_else(|e| e.into_inner());

        match conn.feed(direction, payload, timestamp) {
            Ok(pairs) => Ok(collect_transactions(&self.mapper, pairs)),
            Err(err) => {
                drop(conn);
                drop(entry);
                self.connections.remove(&key);
                Err(err)
            }
        }
    }

    /// Drop a connection after a capture sequence gap.
    pub fn gap(&self, key: &K) {
        self.connections.remove(key);
    }

    /// Drop a connection on close.
    pub fn fin(&self, key: &K) {
        self.connections.remove(key);
    }

    pub fn remove(&self, key: &K) {
        self.connections.remove(key);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.connections.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
