//! Semantic mapping: matched (request, response) pairs into output events.
//!
//! One handler per API key, held in a dispatch table built from the
//! analyzer configuration. Handlers decode both bodies, cross-reference the
//! response against the request by topic/partition, and emit one event per
//! logical unit of work. Cross-reference misses are soft: they add a note
//! to the event instead of failing the transaction.

use serde_json::{Value, json};
use uuid::Uuid;

use kafka_wire::messages::{self, TopicMap};
use kafka_wire::{ApiKey, ApiVersion, WireResult};

use crate::AnalyzerConfig;
use crate::correlate::{RequestMessage, ResponseMessage};
use crate::event::{Status, TransactionEvent};

type Handler =
    fn(Uuid, &RequestMessage, &ResponseMessage, &mut Vec<TransactionEvent>) -> WireResult<()>;

/// Dispatch table indexed by API key.
///
/// A `None` slot silently drops the transaction before any decode
/// (operator ignore-list). Internal broker APIs and no-details mode use the
/// status-only handler, which never touches the bodies.
pub(crate) struct Mapper {
    handlers: [Option<Handler>; kafka_wire::API_COUNT],
}

impl Mapper {
    pub(crate) fn from_config(config: &AnalyzerConfig) -> Self {
        let mut handlers: [Option<Handler>; kafka_wire::API_COUNT] =
            [None; kafka_wire::API_COUNT];
        for key in ApiKey::ALL {
            let handler: Handler = if key.is_internal() || !config.detailed {
                map_status_only
            } else {
                match key {
                    ApiKey::Produce => map_produce,
                    ApiKey::Fetch => map_fetch,
                    ApiKey::Offsets => map_offsets,
                    ApiKey::Metadata => map_metadata,
                    ApiKey::OffsetCommit => map_offset_commit,
                    ApiKey::OffsetFetch => map_offset_fetch,
                    ApiKey::GroupCoordinator => map_group_coordinator,
                    ApiKey::JoinGroup => map_join_group,
                    ApiKey::Heartbeat => map_heartbeat,
                    ApiKey::LeaveGroup => map_leave_group,
                    ApiKey::SyncGroup => map_sync_group,
                    ApiKey::DescribeGroups => map_describe_groups,
                    ApiKey::ListGroups => map_list_groups,
                    // internal keys, covered by the branch above
                    _ => map_status_only,
                }
            };
            handlers[key.index()] = Some(handler);
        }
        for name in &config.ignore_apis {
            match ApiKey::from_name(name) {
                Some(key) => handlers[key.index()] = None,
                None => {
                    crate::trace_warn!("unknown api name {name:?} in ignore list, skipped");
                }
            }
        }
        Mapper { handlers }
    }

    /// Map one matched pair into its events.
    ///
    /// `None` means no events: the API is ignore-listed, or a body failed
    /// to decode (scoped failure, the transaction is skipped).
    pub(crate) fn map(
        &self,
        requ: &RequestMessage,
        resp: &ResponseMessage,
    ) -> Option<Vec<TransactionEvent>> {
        let handler = self.handlers[requ.header.api_key.index()]?;
        let transaction_id = Uuid::new_v4();
        let mut events = Vec::new();
        match handler(transaction_id, requ, resp, &mut events) {
            Ok(()) => Some(events),
            Err(_err) => {
                crate::trace_debug!(
                    api = requ.header.api_key.name(),
                    "body decode failed ({_err}), transaction skipped"
                );
                None
            }
        }
    }
}

const NOTE_MISSING_TOPIC: &str = "Missing Topic in Request";
const NOTE_MISSING_PARTITION: &str = "Missing Partition in Request";
const NOTE_BAD_REQUEST_SET: &str = "Failed to decode Request MessageSet";
const NOTE_BAD_RESPONSE_SET: &str = "Failed to decode Response MessageSet";

/// Find the request-side entry a response row refers to, noting the miss.
fn lookup<'a, T>(
    topics: &'a TopicMap<T>,
    topic: &str,
    partition: i32,
    notes: &mut Vec<String>,
) -> Option<&'a T> {
    match topics.get(topic) {
        None => {
            notes.push(NOTE_MISSING_TOPIC.to_owned());
            None
        }
        Some(partitions) => match partitions.get(&partition) {
            None => {
                notes.push(NOTE_MISSING_PARTITION.to_owned());
                None
            }
            Some(entry) => Some(entry),
        },
    }
}

fn error_obj(code: kafka_wire::ErrorCode) -> Value {
    json!({ "code": i16::from(code) })
}

fn map_status_only(
    transaction_id: Uuid,
    _requ: &RequestMessage,
    _resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    out.push(TransactionEvent::status_only(transaction_id));
    Ok(())
}

fn map_produce(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::produce_request(&requ.body)?;
    let response = messages::produce_response(requ.header.version, &resp.body)?;
    for topic in &response.topics {
        // notes accumulate across the topic's partition loop
        let mut notes: Vec<String> = Vec::new();
        for (partition, result) in &topic.partitions {
            let mut requ_obj = json!({
                "required_acks": request.required_acks,
                "timeout": request.timeout,
            });
            if let Some(set) = lookup(&request.topics, &topic.name, *partition, &mut notes) {
                match set.count() {
                    Some(n) => requ_obj["messages"] = json!(n),
                    None => notes.push(NOTE_BAD_REQUEST_SET.to_owned()),
                }
            }
            let mut resp_obj = json!({
                "error": error_obj(result.error),
                "offset": result.base_offset,
            });
            if let Some(time) = result.log_append_time {
                resp_obj["timestamp"] = json!(time);
            }
            out.push(TransactionEvent {
                status: result.error.into(),
                transaction_id,
                group: None,
                api: "produce",
                details: Some(json!({
                    "topic": topic.name,
                    "partition": partition,
                    "request": requ_obj,
                    "response": resp_obj,
                })),
                notes: notes.clone(),
            });
        }
    }
    Ok(())
}

fn map_fetch(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::fetch_request(&requ.body)?;
    let response = messages::fetch_response(requ.header.version, &resp.body)?;
    for topic in &response.topics {
        let mut notes: Vec<String> = Vec::new();
        for (partition, result) in &topic.partitions {
            let mut requ_obj = json!({
                "replica_id": request.replica_id,
                "max_wait_time": request.max_wait_time,
                "min_bytes": request.min_bytes,
            });
            if let Some(params) = lookup(&request.topics, &topic.name, *partition, &mut notes) {
                requ_obj["offset"] = json!(params.offset);
                requ_obj["max_bytes"] = json!(params.max_bytes);
            }
            let mut resp_obj = json!({
                "error": error_obj(result.error),
                "hwm_offset": result.hwm_offset,
            });
            match result.message_set.count() {
                Some(n) => resp_obj["messages"] = json!(n),
                None => notes.push(NOTE_BAD_RESPONSE_SET.to_owned()),
            }
            out.push(TransactionEvent {
                status: result.error.into(),
                transaction_id,
                group: None,
                api: "fetch",
                details: Some(json!({
                    "topic": topic.name,
                    "partition": partition,
                    "request": requ_obj,
                    "response": resp_obj,
                })),
                notes: notes.clone(),
            });
        }
    }
    Ok(())
}

fn map_offsets(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::offset_request(&requ.body)?;
    let response = messages::offset_response(&resp.body)?;
    for topic in &response.topics {
        let mut notes: Vec<String> = Vec::new();
        for (partition, result) in &topic.partitions {
            let mut requ_obj = json!({ "replica_id": request.replica_id });
            if let Some(params) = lookup(&request.topics, &topic.name, *partition, &mut notes) {
                requ_obj["time"] = json!(params.time);
                requ_obj["max_offsets"] = json!(params.max_offsets);
            }
            out.push(TransactionEvent {
                status: result.error.into(),
                transaction_id,
                group: None,
                api: "offsets",
                details: Some(json!({
                    "topic": topic.name,
                    "partition": partition,
                    "request": requ_obj,
                    "response": {
                        "error": error_obj(result.error),
                        "offsets": result.offsets,
                    },
                })),
                notes: notes.clone(),
            });
        }
    }
    Ok(())
}

fn map_metadata(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    // The request carries nothing the events need, but a corrupt one still
    // disqualifies the whole transaction.
    messages::metadata_request(&requ.body)?;
    let response = messages::metadata_response(&resp.body)?;
    // broker entries carry no error code, they are always OK
    for broker in &response.brokers {
        out.push(TransactionEvent {
            status: Status::Ok,
            transaction_id,
            group: None,
            api: "metadata",
            details: Some(json!({
                "broker": { "host": broker.host, "port": broker.port },
            })),
            notes: Vec::new(),
        });
    }
    for topic in &response.topics {
        out.push(TransactionEvent {
            status: topic.error.into(),
            transaction_id,
            group: None,
            api: "metadata",
            details: Some(json!({
                "topic": {
                    "name": topic.name,
                    "error": error_obj(topic.error),
                    "partitions": topic.partitions,
                },
            })),
            notes: Vec::new(),
        });
    }
    Ok(())
}

fn map_offset_commit(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::offset_commit_request(requ.header.version, &requ.body)?;
    let response = messages::offset_commit_response(&resp.body)?;
    for topic in &response.topics {
        let mut notes: Vec<String> = Vec::new();
        for (partition, error) in &topic.partitions {
            let mut requ_obj = json!({
                "group_id": request.group_id,
                "generation_id": request.generation_id,
                "consumer_id": request.consumer_id,
                "retention_time": request.retention_time,
            });
            if let Some(commit) = lookup(&request.topics, &topic.name, *partition, &mut notes) {
                requ_obj["offset"] = json!(commit.offset);
                if requ.header.version == ApiVersion::V1 {
                    requ_obj["timestamp"] = json!(commit.timestamp);
                }
            }
            out.push(TransactionEvent {
                status: (*error).into(),
                transaction_id,
                group: None,
                api: "offset_commit",
                details: Some(json!({
                    "topic": topic.name,
                    "partition": partition,
                    "request": requ_obj,
                    "response": { "error": error_obj(*error) },
                })),
                notes: notes.clone(),
            });
        }
    }
    Ok(())
}

fn map_offset_fetch(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::offset_fetch_request(&requ.body)?;
    let response = messages::offset_fetch_response(&resp.body)?;
    for topic in &response.topics {
        let mut notes: Vec<String> = Vec::new();
        for (partition, result) in &topic.partitions {
            // Topic-level check only: the request's partition list is not
            // cross-referenced for this API.
            if !request.topics.contains_key(&topic.name) {
                notes.push(NOTE_MISSING_TOPIC.to_owned());
            }
            out.push(TransactionEvent {
                status: result.error.into(),
                transaction_id,
                group: None,
                api: "offset_fetch",
                details: Some(json!({
                    "topic": topic.name,
                    "partition": partition,
                    "request": { "group_id": request.group_id },
                    "response": {
                        "offset": result.offset,
                        "error": error_obj(result.error),
                    },
                })),
                notes: notes.clone(),
            });
        }
    }
    Ok(())
}

fn map_group_coordinator(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::group_coordinator_request(&requ.body)?;
    let response = messages::group_coordinator_response(&resp.body)?;
    out.push(TransactionEvent {
        status: response.error.into(),
        transaction_id,
        group: None,
        api: "group_coordinator",
        details: Some(json!({
            "request": { "group_id": request.group_id },
            "response": {
                "error": error_obj(response.error),
                "coordinator": {
                    "id": response.coordinator_id,
                    "host": response.coordinator_host,
                    "port": response.coordinator_port,
                },
            },
        })),
        notes: Vec::new(),
    });
    Ok(())
}

fn map_join_group(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::join_group_request(requ.header.version, &requ.body)?;
    let response = messages::join_group_response(&resp.body)?;
    out.push(TransactionEvent {
        status: response.error.into(),
        transaction_id,
        group: None,
        api: "join_group",
        details: Some(json!({
            "request": {
                "group_id": request.group_id,
                "session_timeout": request.session_timeout,
                "rebalance_timeout": request.rebalance_timeout,
                "member_id": request.member_id,
                "protocol_type": request.protocol_type,
            },
            "response": {
                "error": error_obj(response.error),
                "generation_id": response.generation_id,
                "group_protocol": response.group_protocol,
                "leader_id": response.leader_id,
                "member_id": response.member_id,
            },
        })),
        notes: Vec::new(),
    });
    Ok(())
}

fn map_heartbeat(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::heartbeat_request(&requ.body)?;
    let response = messages::heartbeat_response(&resp.body)?;
    out.push(TransactionEvent {
        status: response.error.into(),
        transaction_id,
        group: None,
        api: "heartbeat",
        details: Some(json!({
            "request": {
                "group_id": request.group_id,
                "generation_id": request.generation_id,
                "member_id": request.member_id,
            },
            "response": { "error": error_obj(response.error) },
        })),
        notes: Vec::new(),
    });
    Ok(())
}

fn map_leave_group(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::leave_group_request(&requ.body)?;
    let response = messages::leave_group_response(&resp.body)?;
    out.push(TransactionEvent {
        status: response.error.into(),
        transaction_id,
        group: None,
        api: "leave_group",
        details: Some(json!({
            "request": {
                "group_id": request.group_id,
                "member_id": request.member_id,
            },
            "response": { "error": error_obj(response.error) },
        })),
        notes: Vec::new(),
    });
    Ok(())
}

fn map_sync_group(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let request = messages::sync_group_request(&requ.body)?;
    let response = messages::sync_group_response(&resp.body)?;
    out.push(TransactionEvent {
        status: response.error.into(),
        transaction_id,
        group: None,
        api: "sync_group",
        details: Some(json!({
            "request": {
                "group_id": request.group_id,
                "generation_id": request.generation_id,
                "member_id": request.member_id,
            },
            "response": { "error": error_obj(response.error) },
        })),
        notes: Vec::new(),
    });
    Ok(())
}

fn map_describe_groups(
    transaction_id: Uuid,
    requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    messages::describe_groups_request(&requ.body)?;
    let response = messages::describe_groups_response(&resp.body)?;
    for group in &response.groups {
        out.push(TransactionEvent {
            status: group.error.into(),
            transaction_id,
            group: Some(group.group_id.clone()),
            api: "describe_group",
            details: Some(json!({
                "response": {
                    "error": error_obj(group.error),
                    "state": group.state,
                    "protocol": group.protocol,
                    "protocol_type": group.protocol_type,
                },
            })),
            notes: Vec::new(),
        });
    }
    Ok(())
}

fn map_list_groups(
    transaction_id: Uuid,
    _requ: &RequestMessage,
    resp: &ResponseMessage,
    out: &mut Vec<TransactionEvent>,
) -> WireResult<()> {
    let response = messages::list_groups_response(&resp.body)?;
    let groups: Vec<Value> = response
        .groups
        .iter()
        .map(|(group, protocol)| json!({ "group": group, "protocol": protocol }))
        .collect();
    out.push(TransactionEvent {
        status: response.error.into(),
        transaction_id,
        group: None,
        api: "list_groups",
        details: Some(json!({ "groups": groups })),
        notes: Vec::new(),
    });
    Ok(())
}
