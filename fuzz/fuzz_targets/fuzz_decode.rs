//! Fuzz target: header and body decoders
//!
//! Runs every decoder over the raw input at every supported version.
//! Decoders must reject garbage with an error, never panic or loop.

#![no_main]

use kafka_wire::messages;
use kafka_wire::{ApiVersion, MessageSet, RequestHeader, ResponseHeader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = RequestHeader::decode(data);
    let _ = ResponseHeader::decode(data);

    for version in [ApiVersion::V0, ApiVersion::V1, ApiVersion::V2] {
        let _ = messages::produce_response(version, data);
        let _ = messages::fetch_response(version, data);
        let _ = messages::offset_commit_request(version, data);
        let _ = messages::join_group_request(version, data);
    }

    let _ = messages::produce_request(data);
    let _ = messages::fetch_request(data);
    let _ = messages::offset_request(data);
    let _ = messages::offset_response(data);
    let _ = messages::metadata_request(data);
    let _ = messages::metadata_response(data);
    let _ = messages::offset_commit_response(data);
    let _ = messages::offset_fetch_request(data);
    let _ = messages::offset_fetch_response(data);
    let _ = messages::group_coordinator_request(data);
    let _ = messages::group_coordinator_response(data);
    let _ = messages::join_group_response(data);
    let _ = messages::heartbeat_request(data);
    let _ = messages::heartbeat_response(data);
    let _ = messages::leave_group_request(data);
    let _ = messages::leave_group_response(data);
    let _ = messages::sync_group_request(data);
    let _ = messages::sync_group_response(data);
    let _ = messages::describe_groups_request(data);
    let _ = messages::describe_groups_response(data);
    let _ = messages::list_groups_response(data);

    let set = MessageSet::new(data);
    let _ = set.count();
    let _ = set.first();
    for _entry in set.iter() {}
});
