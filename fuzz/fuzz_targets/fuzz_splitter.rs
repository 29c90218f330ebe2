//! Fuzz target: length-prefix framing
//!
//! Feeds arbitrary bytes to the splitter, whole and split in two, and
//! drains whatever frames out. Looking for panics and indexing bugs in
//! the buffering logic, not protocol validity.

#![no_main]

use kafka_wire::{Splitter, TimestampNs};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut splitter = Splitter::new(1 << 16);
    if splitter.feed(data, TimestampNs(1)).is_ok() {
        while splitter.try_pop().is_some() {}
    }

    // Same bytes across a packet boundary must behave identically.
    let mut split = Splitter::new(1 << 16);
    let mid = data.len() / 2;
    if split.feed(&data[..mid], TimestampNs(1)).is_ok()
        && split.feed(&data[mid..], TimestampNs(2)).is_ok()
    {
        while split.try_pop().is_some() {}
    }
});
