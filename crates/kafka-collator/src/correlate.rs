//! Request/response correlation for one connection.
//!
//! Kafka responses carry only a correlation id, so pairing them with
//! requests needs two inferences: which direction of the connection is
//! the client (requests), and where in each buffered queue the streams
//! line up when the capture starts mid-conversation. Both are driven
//! entirely by the buffered messages themselves.

use std::collections::VecDeque;

use bytes::Bytes;
use kafka_wire::{RawMessage, RequestHeader, ResponseHeader, TimestampNs};

use crate::trace_warn;
use crate::traits::Direction;

/// A framed message whose request header decoded, plus the raw body.
#[derive(Debug, Clone)]
pub struct RequestMessage {
    pub timestamp: TimestampNs,
    pub header: RequestHeader,
    /// API body, header stripped.
    pub body: Bytes,
    /// On-wire size including framing.
    pub wire_size: usize,
}

/// The matched response: a correlation id and the raw body.
#[derive(Debug, Clone)]
pub struct ResponseMessage {
    pub timestamp: TimestampNs,
    pub correlation_id: i32,
    /// API body, header stripped. Its layout is given by the request.
    pub body: Bytes,
    pub wire_size: usize,
}

/// Whether the request direction of the connection is known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Buffering both directions, looking for a consistent assignment.
    Unknown,
    /// Requests flow in `requests`; the opposite direction answers.
    Synced { requests: Direction },
}

/// Why correlation gave up on the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CorrelationFailure {
    /// Neither direction decodes as a request stream.
    SyncFailed,
    /// A matched pair violated the correlation invariants after sync.
    Desync,
}

/// Correlation state machine for one connection.
///
/// Push framed messages with [`Transactions::on_message`] and drain
/// matched pairs with [`Transactions::try_pop`]. Requests queue up while
/// their responses are outstanding, which handles pipelining for free.
#[derive(Debug, Default)]
pub struct Transactions {
    /// Per-direction FIFO of framed messages, indexed by `Direction`.
    queues: [VecDeque<RawMessage>; 2],
    state: SyncState,
    matched: VecDeque<(RequestMessage, ResponseMessage)>,
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::Unknown
    }
}

impl Transactions {
    pub fn new() -> Self {
        Self::default()
    }

    /// The inferred request direction, once synchronized.
    pub fn request_direction(&self) -> Option<Direction> {
        match self.state {
            SyncState::Unknown => None,
            SyncState::Synced { requests } => Some(requests),
        }
    }

    /// Messages buffered and not yet matched, both directions.
    pub fn buffered(&self) -> usize {
        self.queues[0].len() + self.queues[1].len()
    }

    /// Pop the next matched request/response pair, oldest first.
    pub fn try_pop(&mut self) -> Option<(RequestMessage, ResponseMessage)> {
        self.matched.pop_front()
    }

    pub(crate) fn on_message(
        &mut self,
        direction: Direction,
        message: RawMessage,
    ) -> Result<(), CorrelationFailure> {
        self.queues[direction.index()].push_back(message);
        match self.state {
            SyncState::Synced { requests } => self.correlate(requests),
            SyncState::Unknown => match self.try_sync()? {
                Some(requests) => self.correlate(requests),
                None => Ok(()),
            },
        }
    }

    /// Attempt to classify the two directions.
    ///
    /// Returns the request direction on success, `None` while there is
    /// not enough (or too symmetric) evidence, and `SyncFailed` when
    /// neither direction can possibly carry requests.
    fn try_sync(&mut self) -> Result<Option<Direction>, CorrelationFailure> {
        if self.queues[0].is_empty() || self.queues[1].is_empty() {
            return Ok(None);
        }

        let forward_plausible = is_plausible_request_stream(&self.queues[0]);
        let reverse_plausible = is_plausible_request_stream(&self.queues[1]);
        if !forward_plausible && !reverse_plausible {
            return Err(CorrelationFailure::SyncFailed);
        }

        let forward_solution = if forward_plausible {
            find_sync_point(&self.queues[0], &self.queues[1])
        } else {
            None
        };
        let reverse_solution = if reverse_plausible {
            find_sync_point(&self.queues[1], &self.queues[0])
        } else {
            None
        };

        match (forward_solution, reverse_solution) {
            // Both assignments check out. Committing to either would be
            // a guess, so wait for traffic to break the tie.
            (Some(_), Some(_)) => Ok(None),
            (Some((skip_requests, skip_responses)), None) => {
                self.commit(Direction::Forward, skip_requests, skip_responses);
                Ok(Some(Direction::Forward))
            }
            (None, Some((skip_requests, skip_responses))) => {
                self.commit(Direction::Reverse, skip_requests, skip_responses);
                Ok(Some(Direction::Reverse))
            }
            (None, None) => {
                if forward_plausible && reverse_plausible {
                    return Ok(None);
                }
                // Exactly one direction can carry requests but no queue
                // alignment verified. Commit to it with a clean response
                // slate instead of guessing an alignment.
                let requests = if forward_plausible {
                    Direction::Forward
                } else {
                    Direction::Reverse
                };
                let responses = requests.opposite();
                trace_warn!(
                    dropped = self.queues[responses.index()].len(),
                    "synchronized without an alignment, dropping buffered responses"
                );
                self.queues[responses.index()].clear();
                self.state = SyncState::Synced { requests };
                Ok(Some(requests))
            }
        }
    }

    fn commit(&mut self, requests: Direction, skip_requests: usize, skip_responses: usize) {
        if skip_requests > 0 || skip_responses > 0 {
            trace_warn!(
                skip_requests,
                skip_responses,
                "discarding unmatched messages ahead of the sync point"
            );
        }
        let responses = requests.opposite();
        self.queues[requests.index()].drain(..skip_requests);
        self.queues[responses.index()].drain(..skip_responses);
        self.state = SyncState::Synced { requests };
    }

    /// Pop matched pairs head-to-head while both queues have messages.
    ///
    /// Brokers answer a connection's requests in order, so the head
    /// response must belong to the head request; anything else means the
    /// stream view is broken and all buffered state is untrustworthy.
    fn correlate(&mut self, requests: Direction) -> Result<(), CorrelationFailure> {
        let requ_index = requests.index();
        let resp_index = requests.opposite().index();

        if self.queues[requ_index].is_empty() && !self.queues[resp_index].is_empty() {
            trace_warn!(
                responses = self.queues[resp_index].len(),
                "dropping responses with no buffered request"
            );
            self.queues[resp_index].clear();
            return Ok(());
        }

        while !self.queues[requ_index].is_empty() && !self.queues[resp_index].is_empty() {
            let requ_raw = self.queues[requ_index].pop_front().expect("checked non-empty");
            let resp_raw = self.queues[resp_index].pop_front().expect("checked non-empty");

            let Ok((header, body_start)) = RequestHeader::decode(&requ_raw.payload) else {
                return self.desync();
            };
            let Ok(resp_header) = ResponseHeader::decode(&resp_raw.payload) else {
                return self.desync();
            };
            if header.correlation_id != resp_header.correlation_id {
                return self.desync();
            }

            self.matched.push_back((
                RequestMessage {
                    timestamp: requ_raw.timestamp,
                    header,
                    body: requ_raw.payload.slice(body_start..),
                    wire_size: requ_raw.wire_size(),
                },
                ResponseMessage {
                    timestamp: resp_raw.timestamp,
                    correlation_id: resp_header.correlation_id,
                    body: resp_raw.payload.slice(ResponseHeader::WIRE_LEN..),
                    wire_size: resp_raw.wire_size(),
                },
            ));
        }
        Ok(())
    }

    fn desync(&mut self) -> Result<(), CorrelationFailure> {
        self.state = SyncState::Unknown;
        self.queues[0].clear();
        self.queues[1].clear();
        Err(CorrelationFailure::Desync)
    }
}

/// A direction can only carry requests if every buffered message in it
/// decodes as a structurally valid request header (known API key, well
/// formed client id). Versions are not checked: an unknown version still
/// correlates, it just fails body decode later.
fn is_plausible_request_stream(queue: &VecDeque<RawMessage>) -> bool {
    queue.iter().all(|m| RequestHeader::decode(&m.payload).is_ok())
}

/// Search for a queue alignment, scanning responses then requests from
/// the heads. A candidate pair must share a correlation id, and the
/// entire remaining suffix of both queues must then correlate pairwise;
/// the suffix check rejects coincidental id matches. Returns how many
/// leading entries to discard from (requests, responses).
fn find_sync_point(
    requests: &VecDeque<RawMessage>,
    responses: &VecDeque<RawMessage>,
) -> Option<(usize, usize)> {
    for resp_start in 0..responses.len() {
        let Some(resp_corr) = response_correlation_id(&responses[resp_start]) else {
            continue;
        };
        for requ_start in 0..requests.len() {
            if request_correlation_id(&requests[requ_start]) == Some(resp_corr)
                && suffixes_correlate(requests, requ_start, responses, resp_start)
            {
                return Some((requ_start, resp_start));
            }
        }
    }
    None
}

fn suffixes_correlate(
    requests: &VecDeque<RawMessage>,
    requ_start: usize,
    responses: &VecDeque<RawMessage>,
    resp_start: usize,
) -> bool {
    let pairs = (requests.len() - requ_start).min(responses.len() - resp_start);
    (0..pairs).all(|i| {
        let requ = request_correlation_id(&requests[requ_start + i]);
        let resp = response_correlation_id(&responses[resp_start + i]);
        requ.is_some() && requ == resp
    })
}

fn request_correlation_id(message: &RawMessage) -> Option<i32> {
    RequestHeader::decode(&message.payload)
        .ok()
        .map(|(header, _)| header.correlation_id)
}

fn response_correlation_id(message: &RawMessage) -> Option<i32> {
    ResponseHeader::decode(&message.payload)
        .ok()
        .map(|header| header.correlation_id)
}
