use bytes::Bytes;
use serde_json::json;

use kafka_wire::{ApiKey, ApiVersion, RawMessage, RequestHeader, TimestampNs};

use crate::AnalyzerConfig;
use crate::correlate::{CorrelationFailure, RequestMessage, ResponseMessage, Transactions};
use crate::mapper::Mapper;
use crate::traits::Direction;

// === wire encoding helpers ===

fn put_i16(buf: &mut Vec<u8>, v: i16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    put_i16(buf, s.len() as i16);
    buf.extend_from_slice(s.as_bytes());
}

fn put_bytes(buf: &mut Vec<u8>, v: &[u8]) {
    put_i32(buf, v.len() as i32);
    buf.extend_from_slice(v);
}

fn set_entry(offset: i64, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    put_i64(&mut out, offset);
    put_i32(&mut out, payload.len() as i32);
    out.extend_from_slice(payload);
    out
}

/// Full request message payload: header plus body.
fn request_payload(api_key: ApiKey, version: i16, correlation_id: i32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    put_i16(&mut out, i16::from(api_key));
    put_i16(&mut out, version);
    put_i32(&mut out, correlation_id);
    put_str(&mut out, "client-1");
    out.extend_from_slice(body);
    out
}

/// Full response message payload: correlation id plus body.
fn response_payload(correlation_id: i32, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    put_i32(&mut out, correlation_id);
    out.extend_from_slice(body);
    out
}

fn raw(payload: Vec<u8>, ts: u64) -> RawMessage {
    RawMessage {
        timestamp: TimestampNs(ts),
        payload: Bytes::from(payload),
    }
}

fn heartbeat_request(correlation_id: i32) -> RawMessage {
    let mut body = Vec::new();
    put_str(&mut body, "workers");
    put_i32(&mut body, 1);
    put_str(&mut body, "member-1");
    raw(
        request_payload(ApiKey::Heartbeat, 0, correlation_id, &body),
        correlation_id as u64,
    )
}

fn heartbeat_response(correlation_id: i32) -> RawMessage {
    let mut body = Vec::new();
    put_i16(&mut body, 0);
    raw(response_payload(correlation_id, &body), correlation_id as u64)
}

// === correlation ===

#[test]
fn test_no_pair_until_both_halves_buffered() {
    let mut t = Transactions::new();
    t.on_message(Direction::Forward, heartbeat_request(1)).unwrap();
    assert!(t.try_pop().is_none());
    assert_eq!(t.request_direction(), None);
}

#[test]
fn test_request_then_response_pairs_and_syncs() {
    let mut t = Transactions::new();
    t.on_message(Direction::Forward, heartbeat_request(1)).unwrap();
    t.on_message(Direction::Reverse, heartbeat_response(1)).unwrap();

    let (requ, resp) = t.try_pop().unwrap();
    assert_eq!(requ.header.api_key, ApiKey::Heartbeat);
    assert_eq!(requ.header.correlation_id, 1);
    assert_eq!(requ.header.client_id.as_deref(), Some("client-1"));
    assert_eq!(resp.correlation_id, 1);
    assert_eq!(t.request_direction(), Some(Direction::Forward));
    assert!(t.try_pop().is_none());
}

#[test]
fn test_pipelined_requests_pair_in_order() {
    let mut t = Transactions::new();
    for id in 1..=3 {
        t.on_message(Direction::Forward, heartbeat_request(id)).unwrap();
    }
    for id in 1..=3 {
        t.on_message(Direction::Reverse, heartbeat_response(id)).unwrap();
    }
    for id in 1..=3 {
        let (requ, resp) = t.try_pop().unwrap();
        assert_eq!(requ.header.correlation_id, id);
        assert_eq!(resp.correlation_id, id);
    }
    assert!(t.try_pop().is_none());
    assert_eq!(t.buffered(), 0);
}

#[test]
fn test_reverse_direction_carries_requests() {
    let mut t = Transactions::new();
    t.on_message(Direction::Reverse, heartbeat_request(9)).unwrap();
    t.on_message(Direction::Forward, heartbeat_response(9)).unwrap();

    assert_eq!(t.request_direction(), Some(Direction::Reverse));
    assert!(t.try_pop().is_some());
}

#[test]
fn test_mid_stream_capture_skips_stale_response() {
    let mut t = Transactions::new();
    // A response whose request was never captured, then a live one.
    t.on_message(Direction::Reverse, heartbeat_response(99)).unwrap();
    t.on_message(Direction::Reverse, heartbeat_response(1)).unwrap();
    t.on_message(Direction::Forward, heartbeat_request(1)).unwrap();

    let (requ, resp) = t.try_pop().unwrap();
    assert_eq!(requ.header.correlation_id, 1);
    assert_eq!(resp.correlation_id, 1);
    assert!(t.try_pop().is_none());
}

#[test]
fn test_single_plausible_direction_commits_with_clean_slate() {
    let mut t = Transactions::new();
    t.on_message(Direction::Forward, heartbeat_request(5)).unwrap();
    // No alignment: this response's id matches nothing buffered.
    t.on_message(Direction::Reverse, heartbeat_response(7)).unwrap();

    assert_eq!(t.request_direction(), Some(Direction::Forward));
    assert!(t.try_pop().is_none());

    // The stale response was discarded; the real one still pairs.
    t.on_message(Direction::Reverse, heartbeat_response(5)).unwrap();
    let (requ, _resp) = t.try_pop().unwrap();
    assert_eq!(requ.header.correlation_id, 5);
}

#[test]
fn test_symmetric_traffic_keeps_buffering() {
    // A produce v0 request with correlation id 0 starts with eight zero
    // bytes, so it also reads as a response to correlation id 0. One in
    // each direction is perfectly ambiguous.
    let message = || raw(request_payload(ApiKey::Produce, 0, 0, &[]), 1);

    let mut t = Transactions::new();
    t.on_message(Direction::Forward, message()).unwrap();
    t.on_message(Direction::Reverse, message()).unwrap();

    assert_eq!(t.request_direction(), None);
    assert_eq!(t.buffered(), 2);
    assert!(t.try_pop().is_none());
}

#[test]
fn test_garbage_both_directions_fails_sync() {
    let mut t = Transactions::new();
    t.on_message(Direction::Forward, raw(vec![0xFF; 12], 1)).unwrap();
    let err = t
        .on_message(Direction::Reverse, raw(vec![0xFF; 12], 2))
        .unwrap_err();
    assert_eq!(err, CorrelationFailure::SyncFailed);
}

#[test]
fn test_correlation_id_mismatch_desyncs_and_resets() {
    let mut t = Transactions::new();
    t.on_message(Direction::Forward, heartbeat_request(1)).unwrap();
    t.on_message(Direction::Reverse, heartbeat_response(1)).unwrap();
    assert!(t.try_pop().is_some());

    t.on_message(Direction::Forward, heartbeat_request(2)).unwrap();
    let err = t
        .on_message(Direction::Reverse, heartbeat_response(42))
        .unwrap_err();
    assert_eq!(err, CorrelationFailure::Desync);
    assert_eq!(t.request_direction(), None);
    assert_eq!(t.buffered(), 0);
}

#[test]
fn test_orphan_responses_after_sync_are_dropped() {
    let mut t = Transactions::new();
    t.on_message(Direction::Forward, heartbeat_request(1)).unwrap();
    t.on_message(Direction::Reverse, heartbeat_response(1)).unwrap();
    assert!(t.try_pop().is_some());

    // Response with no outstanding request: dropped, not an error.
    t.on_message(Direction::Reverse, heartbeat_response(2)).unwrap();
    assert!(t.try_pop().is_none());
    assert_eq!(t.buffered(), 0);
}

// === event mapping ===

fn requ_msg(api_key: ApiKey, version: i16, body: Vec<u8>) -> RequestMessage {
    RequestMessage {
        timestamp: TimestampNs(1_000),
        header: RequestHeader {
            api_key,
            version: ApiVersion(version),
            correlation_id: 7,
            client_id: Some("client-1".to_owned()),
        },
        wire_size: body.len() + 14,
        body: Bytes::from(body),
    }
}

fn resp_msg(body: Vec<u8>) -> ResponseMessage {
    ResponseMessage {
        timestamp: TimestampNs(2_000),
        correlation_id: 7,
        wire_size: body.len() + 8,
        body: Bytes::from(body),
    }
}

fn default_mapper() -> Mapper {
    Mapper::from_config(&AnalyzerConfig::default())
}

/// Serialize an event and strip the random transaction id for comparison.
fn event_json(event: &crate::TransactionEvent) -> serde_json::Value {
    let mut value = serde_json::to_value(event).unwrap();
    let obj = value.as_object_mut().unwrap();
    assert!(obj.remove("transaction_id").is_some(), "missing transaction_id");
    value
}

fn produce_request_body(topic: &str, partition: i32, set: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    put_i16(&mut body, 1); // required_acks
    put_i32(&mut body, 500); // timeout
    put_i32(&mut body, 1);
    put_str(&mut body, topic);
    put_i32(&mut body, 1);
    put_i32(&mut body, partition);
    put_bytes(&mut body, set);
    body
}

fn produce_response_body(topic: &str, partition: i32, error: i16, offset: i64) -> Vec<u8> {
    let mut body = Vec::new();
    put_i32(&mut body, 1);
    put_str(&mut body, topic);
    put_i32(&mut body, 1);
    put_i32(&mut body, partition);
    put_i16(&mut body, error);
    put_i64(&mut body, offset);
    body
}

#[test]
fn test_map_produce_event_shape() {
    let mut set = set_entry(0, b"m1");
    set.extend(set_entry(1, b"m2"));
    let requ = requ_msg(ApiKey::Produce, 0, produce_request_body("logs", 0, &set));
    let resp = resp_msg(produce_response_body("logs", 0, 0, 42));

    let events = default_mapper().map(&requ, &resp).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(
        event_json(&events[0]),
        json!({
            "status": "OK",
            "produce": {
                "topic": "logs",
                "partition": 0,
                "request": {
                    "required_acks": 1,
                    "timeout": 500,
                    "messages": 2,
                },
                "response": {
                    "error": { "code": 0 },
                    "offset": 42,
                },
            },
        })
    );
}

#[test]
fn test_map_produce_missing_topic_noted() {
    let requ = requ_msg(
        ApiKey::Produce,
        0,
        produce_request_body("logs", 0, &set_entry(0, b"x")),
    );
    let resp = resp_msg(produce_response_body("other", 0, 0, 1));

    let events = default_mapper().map(&requ, &resp).unwrap();
    let value = event_json(&events[0]);
    assert_eq!(value["notes"], json!(["Missing Topic in Request"]));
    // No request-side message set to count.
    assert!(value["produce"]["request"].get("messages").is_none());
}

#[test]
fn test_map_produce_corrupt_message_set_noted() {
    let mut set = Vec::new();
    put_i64(&mut set, 0);
    put_i32(&mut set, -3); // negative entry size
    let requ = requ_msg(ApiKey::Produce, 0, produce_request_body("logs", 0, &set));
    let resp = resp_msg(produce_response_body("logs", 0, 0, 1));

    let events = default_mapper().map(&requ, &resp).unwrap();
    let value = event_json(&events[0]);
    assert_eq!(value["notes"], json!(["Failed to decode Request MessageSet"]));
}

#[test]
fn test_map_fetch_error_status() {
    let mut requ_body = Vec::new();
    put_i32(&mut requ_body, -1); // replica_id
    put_i32(&mut requ_body, 100); // max_wait_time
    put_i32(&mut requ_body, 1); // min_bytes
    put_i32(&mut requ_body, 1);
    put_str(&mut requ_body, "logs");
    put_i32(&mut requ_body, 1);
    put_i32(&mut requ_body, 3); // partition
    put_i64(&mut requ_body, 1000); // offset
    put_i32(&mut requ_body, 65536); // max_bytes

    let mut resp_body = Vec::new();
    put_i32(&mut resp_body, 1);
    put_str(&mut resp_body, "logs");
    put_i32(&mut resp_body, 1);
    put_i32(&mut resp_body, 3);
    put_i16(&mut resp_body, 6); // NotLeaderForPartition
    put_i64(&mut resp_body, -1);
    put_bytes(&mut resp_body, &[]);

    let requ = requ_msg(ApiKey::Fetch, 0, requ_body);
    let events = default_mapper().map(&requ, &resp_msg(resp_body)).unwrap();
    assert_eq!(
        event_json(&events[0]),
        json!({
            "status": "Error",
            "fetch": {
                "topic": "logs",
                "partition": 3,
                "request": {
                    "replica_id": -1,
                    "max_wait_time": 100,
                    "min_bytes": 1,
                    "offset": 1000,
                    "max_bytes": 65536,
                },
                "response": {
                    "error": { "code": 6 },
                    "hwm_offset": -1,
                    "messages": 0,
                },
            },
        })
    );
}

#[test]
fn test_map_metadata_one_event_per_broker_and_topic() {
    let mut resp_body = Vec::new();
    put_i32(&mut resp_body, 1); // brokers
    put_i32(&mut resp_body, 0);
    put_str(&mut resp_body, "broker-0");
    put_i32(&mut resp_body, 9092);
    put_i32(&mut resp_body, 1); // topics
    put_i16(&mut resp_body, 0);
    put_str(&mut resp_body, "logs");
    put_i32(&mut resp_body, 1); // partitions
    put_i16(&mut resp_body, 0);
    put_i32(&mut resp_body, 0);
    put_i32(&mut resp_body, 0); // leader
    put_i32(&mut resp_body, 0); // replicas
    put_i32(&mut resp_body, 0); // isr

    let requ = requ_msg(ApiKey::Metadata, 0, {
        let mut body = Vec::new();
        put_i32(&mut body, 0);
        body
    });
    let events = default_mapper().map(&requ, &resp_msg(resp_body)).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].transaction_id, events[1].transaction_id);
    assert_eq!(
        event_json(&events[0]),
        json!({
            "status": "OK",
            "metadata": { "broker": { "host": "broker-0", "port": 9092 } },
        })
    );
    assert_eq!(
        event_json(&events[1]),
        json!({
            "status": "OK",
            "metadata": {
                "topic": {
                    "name": "logs",
                    "error": { "code": 0 },
                    "partitions": [0],
                },
            },
        })
    );
}

#[test]
fn test_map_offset_commit_v1_keeps_timestamp() {
    let mut requ_body = Vec::new();
    put_str(&mut requ_body, "workers");
    put_i32(&mut requ_body, 3); // generation
    put_str(&mut requ_body, "consumer-1");
    put_i32(&mut requ_body, 1);
    put_str(&mut requ_body, "logs");
    put_i32(&mut requ_body, 1);
    put_i32(&mut requ_body, 0);
    put_i64(&mut requ_body, 10); // offset
    put_i64(&mut requ_body, 111); // v1 timestamp
    put_str(&mut requ_body, "");

    let mut resp_body = Vec::new();
    put_i32(&mut resp_body, 1);
    put_str(&mut resp_body, "logs");
    put_i32(&mut resp_body, 1);
    put_i32(&mut resp_body, 0);
    put_i16(&mut resp_body, 0);

    let requ = requ_msg(ApiKey::OffsetCommit, 1, requ_body);
    let events = default_mapper().map(&requ, &resp_msg(resp_body)).unwrap();
    let value = event_json(&events[0]);
    assert_eq!(value["offset_commit"]["request"]["timestamp"], json!(111));
    assert_eq!(value["offset_commit"]["request"]["offset"], json!(10));
    assert_eq!(value["offset_commit"]["request"]["group_id"], json!("workers"));
}

#[test]
fn test_map_describe_groups_hoists_group() {
    let mut resp_body = Vec::new();
    put_i32(&mut resp_body, 1);
    put_i16(&mut resp_body, 0);
    put_str(&mut resp_body, "workers");
    put_str(&mut resp_body, "Stable");
    put_str(&mut resp_body, "consumer");
    put_str(&mut resp_body, "range");
    put_i32(&mut resp_body, 0); // members

    let requ = requ_msg(ApiKey::DescribeGroups, 0, {
        let mut body = Vec::new();
        put_i32(&mut body, 1);
        put_str(&mut body, "workers");
        body
    });
    let events = default_mapper().map(&requ, &resp_msg(resp_body)).unwrap();
    assert_eq!(
        event_json(&events[0]),
        json!({
            "group": "workers",
            "status": "OK",
            "describe_group": {
                "response": {
                    "error": { "code": 0 },
                    "state": "Stable",
                    "protocol": "range",
                    "protocol_type": "consumer",
                },
            },
        })
    );
}

#[test]
fn test_map_list_groups_single_event() {
    let mut resp_body = Vec::new();
    put_i16(&mut resp_body, 0);
    put_i32(&mut resp_body, 2);
    put_str(&mut resp_body, "workers");
    put_str(&mut resp_body, "consumer");
    put_str(&mut resp_body, "mirrors");
    put_str(&mut resp_body, "consumer");

    let requ = requ_msg(ApiKey::ListGroups, 0, Vec::new());
    let events = default_mapper().map(&requ, &resp_msg(resp_body)).unwrap();
    assert_eq!(
        event_json(&events[0]),
        json!({
            "status": "OK",
            "list_groups": {
                "groups": [
                    { "group": "workers", "protocol": "consumer" },
                    { "group": "mirrors", "protocol": "consumer" },
                ],
            },
        })
    );
}

#[test]
fn test_no_details_mode_emits_status_only() {
    let mapper = Mapper::from_config(&AnalyzerConfig::no_details());
    let requ = requ_msg(ApiKey::Produce, 0, Vec::new()); // body never decoded
    let events = mapper.map(&requ, &resp_msg(Vec::new())).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(event_json(&events[0]), json!({ "status": "Unknown" }));
}

#[test]
fn test_internal_api_is_status_only_even_when_detailed() {
    let requ = requ_msg(ApiKey::LeaderAndIsr, 0, vec![0xAB; 32]);
    let events = default_mapper()
        .map(&requ, &resp_msg(vec![0xCD; 32]))
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, crate::Status::Unknown);
}

#[test]
fn test_ignore_list_drops_transactions() {
    let mapper = Mapper::from_config(&AnalyzerConfig::ignoring(["heartbeat", "bogus_name"]));

    let mut requ_body = Vec::new();
    put_str(&mut requ_body, "workers");
    put_i32(&mut requ_body, 1);
    put_str(&mut requ_body, "member-1");
    let requ = requ_msg(ApiKey::Heartbeat, 0, requ_body);
    let mut resp_body = Vec::new();
    put_i16(&mut resp_body, 0);
    assert!(mapper.map(&requ, &resp_msg(resp_body)).is_none());

    // Other APIs are unaffected by the unknown name.
    let requ = requ_msg(ApiKey::ListGroups, 0, Vec::new());
    let mut resp_body = Vec::new();
    put_i16(&mut resp_body, 0);
    put_i32(&mut resp_body, 0);
    assert!(mapper.map(&requ, &resp_msg(resp_body)).is_some());
}

#[test]
fn test_truncated_body_skips_transaction() {
    let requ = requ_msg(ApiKey::Produce, 0, vec![0x00, 0x01]); // cut short
    assert!(default_mapper().map(&requ, &resp_msg(Vec::new())).is_none());
}

#[test]
fn test_corrupt_request_body_skips_response_only_apis() {
    // A valid metadata response for both cases below.
    let mut resp_body = Vec::new();
    put_i32(&mut resp_body, 0); // brokers
    put_i32(&mut resp_body, 0); // topics

    // Request claims three topic strings but carries none: the whole
    // transaction is skipped even though only the response feeds events.
    let mut requ_body = Vec::new();
    put_i32(&mut requ_body, 3);
    let requ = requ_msg(ApiKey::Metadata, 0, requ_body);
    assert!(default_mapper().map(&requ, &resp_msg(resp_body)).is_none());

    let mut requ_body = Vec::new();
    put_i32(&mut requ_body, 2); // two group names, none present
    let requ = requ_msg(ApiKey::DescribeGroups, 0, requ_body);
    let mut resp_body = Vec::new();
    put_i32(&mut resp_body, 0);
    assert!(default_mapper().map(&requ, &resp_msg(resp_body)).is_none());
}

#[test]
fn test_map_offset_fetch_notes_missing_topic_only() {
    let mut requ_body = Vec::new();
    put_str(&mut requ_body, "workers");
    put_i32(&mut requ_body, 1);
    put_str(&mut requ_body, "logs");
    put_i32(&mut requ_body, 1);
    put_i32(&mut requ_body, 0); // only partition 0 requested

    let offset_fetch_partition = |body: &mut Vec<u8>, partition: i32| {
        put_i32(body, partition);
        put_i64(body, 5); // offset
        put_str(body, "");
        put_i16(body, 0); // error
    };

    // Partition 9 of a requested topic: no note, partitions are not
    // cross-referenced for this API.
    let mut resp_body = Vec::new();
    put_i32(&mut resp_body, 1);
    put_str(&mut resp_body, "logs");
    put_i32(&mut resp_body, 1);
    offset_fetch_partition(&mut resp_body, 9);
    let requ = requ_msg(ApiKey::OffsetFetch, 0, requ_body.clone());
    let events = default_mapper().map(&requ, &resp_msg(resp_body)).unwrap();
    assert!(events[0].notes.is_empty());

    // A topic absent from the request is still noted.
    let mut resp_body = Vec::new();
    put_i32(&mut resp_body, 1);
    put_str(&mut resp_body, "other");
    put_i32(&mut resp_body, 1);
    offset_fetch_partition(&mut resp_body, 0);
    let requ = requ_msg(ApiKey::OffsetFetch, 0, requ_body);
    let events = default_mapper().map(&requ, &resp_msg(resp_body)).unwrap();
    assert_eq!(events[0].notes, vec!["Missing Topic in Request"]);
}

#[test]
fn test_transaction_display_banner() {
    let requ = requ_msg(ApiKey::ListGroups, 0, Vec::new());
    let mut resp_body = Vec::new();
    put_i16(&mut resp_body, 0);
    put_i32(&mut resp_body, 0);
    let resp = resp_msg(resp_body);

    let transactions = crate::collect_transactions(
        &default_mapper(),
        vec![(requ, resp)],
    );
    assert_eq!(transactions.len(), 1);
    let t = &transactions[0];
    assert_eq!(t.latency_ns(), 1_000);

    let display = format!("{t}");
    assert!(display.starts_with("=== kafka list_groups v0 (correlation 7) ==="));
    assert!(display.contains("Client: client-1"));
    assert!(display.contains("Status: OK"));
    assert!(display.contains("Bytes: 14 in, 14 out"));
}
