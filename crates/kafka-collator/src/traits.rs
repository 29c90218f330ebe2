//! Traits for abstracting packet sources
//!
//! The analyzer consumes observed packets from any capture layer (pcap,
//! eBPF, a TCP reassembler) through these traits.

use kafka_wire::TimestampNs;

/// Direction of a packet within its connection.
///
/// Deliberately role-neutral: which direction carries requests is not an
/// input, it is inferred per connection from the traffic itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The direction the first observed packet traveled.
    Forward,
    /// The other direction.
    Reverse,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// Index into per-direction state arrays.
    pub fn index(self) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }
}

/// Trait for observed packets that can be analyzed into transactions.
///
/// Implement this for your capture source to feed the analyzer.
pub trait PacketEvent {
    /// The raw TCP payload bytes of this packet.
    fn payload(&self) -> &[u8];

    /// Capture timestamp in nanoseconds (monotonic, for latency).
    fn timestamp_ns(&self) -> TimestampNs;

    /// Direction of the packet within its connection.
    fn direction(&self) -> Direction;

    /// Stable identifier of the connection this packet belongs to.
    fn connection_id(&self) -> u64;
}
