//! Fuzz target: full analysis pipeline
//!
//! Generates a session of directed packets and runs it through the
//! concurrent analyzer: framing, direction inference, correlation and
//! body decoding all together. Errors are expected on garbage; panics
//! are not.

#![no_main]

use arbitrary::Arbitrary;
use kafka_collator::{AnalyzerCache, Direction, TimestampNs};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Packet {
    reverse: bool,
    payload: Vec<u8>,
}

#[derive(Debug, Arbitrary)]
struct Session {
    packets: Vec<Packet>,
}

fuzz_target!(|session: Session| {
    let cache: AnalyzerCache<u32> = AnalyzerCache::new();
    for (i, packet) in session.packets.iter().take(64).enumerate() {
        let direction = if packet.reverse {
            Direction::Reverse
        } else {
            Direction::Forward
        };
        // An error drops the connection; later packets start it over.
        let _ = cache.process(0, direction, &packet.payload, TimestampNs(i as u64));
    }
});
