//! Per-connection analysis state: one framing splitter per direction plus
//! the correlation state machine.

use kafka_wire::{Splitter, TimestampNs};

use crate::correlate::{CorrelationFailure, RequestMessage, ResponseMessage, Transactions};
use crate::error::AnalyzerError;
use crate::traits::Direction;

pub(crate) struct Connection {
    /// Indexed by `Direction`.
    streams: [Splitter; 2],
    transactions: Transactions,
    pub(crate) last_activity: TimestampNs,
}

impl Connection {
    pub(crate) fn new(max_message_bytes: usize) -> Self {
        Connection {
            streams: [
                Splitter::new(max_message_bytes),
                Splitter::new(max_message_bytes),
            ],
            transactions: Transactions::new(),
            last_activity: TimestampNs(0),
        }
    }

    /// Feed one packet payload, returning any request/response pairs it
    /// completed. An error means this connection's state is unusable and
    /// the entry should be dropped.
    pub(crate) fn feed(
        &mut self,
        direction: Direction,
        data: &[u8],
        timestamp: TimestampNs,
    ) -> Result<Vec<(RequestMessage, ResponseMessage)>, AnalyzerError> {
        self.last_activity = timestamp;
        self.streams[direction.index()].feed(data, timestamp)?;
        while let Some(message) = self.streams[direction.index()].try_pop() {
            self.transactions
                .on_message(direction, message)
                .map_err(|failure| match failure {
                    CorrelationFailure::SyncFailed => AnalyzerError::SyncFailed,
                    CorrelationFailure::Desync => AnalyzerError::Desync,
                })?;
        }
        let mut pairs = Vec::new();
        while let Some(pair) = self.transactions.try_pop() {
            pairs.push(pair);
        }
        Ok(pairs)
    }
}
