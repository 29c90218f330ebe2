//! Request/response headers and per-API body decoders.
//!
//! One pure function per message kind. Decoders take the API body (the
//! message payload with its header already stripped) and read exactly the
//! fields the given version defines; trailing bytes are ignored. Field
//! order is the bit-exact 0.8-0.10 wire format.

use std::collections::HashMap;

use crate::apis::{ApiKey, ApiVersion, ErrorCode};
use crate::error::WireResult;
use crate::message_set::MessageSet;
use crate::reader::Reader;


/// Header of every request message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub api_key: ApiKey,
    pub version: ApiVersion,
    pub correlation_id: i32,
    /// Free-form client identifier; nullable on the wire.
    pub client_id: Option<String>,
}

impl RequestHeader {
    /// Decode from the start of a message payload. Returns the header and
    /// the offset where the API body begins.
    pub fn decode(payload: &[u8]) -> WireResult<(RequestHeader, usize)> {
        let mut r = Reader::new(payload);
        let api_key = ApiKey::from_wire(r.read_i16()?)?;
        let version = ApiVersion(r.read_i16()?);
        let correlation_id = r.read_i32()?;
        let client_id = r.read_string()?;
        let body_start = payload.len() - r.remaining();
        Ok((
            RequestHeader {
                api_key,
                version,
                correlation_id,
                client_id,
            },
            body_start,
        ))
    }
}

/// Header of every response message: the correlation id alone. The API key
/// and version are implied by the request being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub correlation_id: i32,
}

impl ResponseHeader {
    /// Encoded size; the API body starts at this offset.
    pub const WIRE_LEN: usize = 4;

    pub fn decode(payload: &[u8]) -> WireResult<ResponseHeader> {
        let mut r = Reader::new(payload);
        Ok(ResponseHeader {
            correlation_id: r.read_i32()?,
        })
    }
}

/// Request-side topic layout, keyed for the by-(topic, partition) lookups
/// the event mapping does.
pub type TopicMap<T> = HashMap<String, HashMap<i32, T>>;

/// Response-side topic entry, kept in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicEntry<T> {
    pub name: String,
    pub partitions: Vec<(i32, T)>,
}

fn read_topic_map<'a, T, F>(r: &mut Reader<'a>, mut part: F) -> WireResult<TopicMap<T>>
where
    F: FnMut(&mut Reader<'a>) -> WireResult<(i32, T)>,
{
    let mut topics = TopicMap::new();
    r.read_array(|r| {
        let name = r.read_string()?.unwrap_or_default();
        let mut partitions = HashMap::new();
        r.read_array(|r| {
            let (id, value) = part(r)?;
            partitions.insert(id, value);
            Ok(())
        })?;
        topics.insert(name, partitions);
        Ok(())
    })?;
    Ok(topics)
}

fn read_topic_entries<'a, T, F>(r: &mut Reader<'a>, mut part: F) -> WireResult<Vec<TopicEntry<T>>>
where
    F: FnMut(&mut Reader<'a>) -> WireResult<(i32, T)>,
{
    let mut topics = Vec::new();
    r.read_array(|r| {
        let name = r.read_string()?.unwrap_or_default();
        let mut partitions = Vec::new();
        r.read_array(|r| {
            partitions.push(part(r)?);
            Ok(())
        })?;
        topics.push(TopicEntry { name, partitions });
        Ok(())
    })?;
    Ok(topics)
}

// === Produce (0) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceRequest<'a> {
    pub required_acks: i16,
    pub timeout: i32,
    pub topics: TopicMap<MessageSet<'a>>,
}

/// Same layout for v0-v2: only the embedded record format changed.
pub fn produce_request(body: &[u8]) -> WireResult<ProduceRequest<'_>> {
    let mut r = Reader::new(body);
    let required_acks = r.read_i16()?;
    let timeout = r.read_i32()?;
    let topics = read_topic_map(&mut r, |r| {
        let partition = r.read_i32()?;
        let blob = r.read_bytes()?.unwrap_or_default();
        Ok((partition, MessageSet::new(blob)))
    })?;
    Ok(ProduceRequest {
        required_acks,
        timeout,
        topics,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducePartitionResult {
    pub error: ErrorCode,
    pub base_offset: i64,
    /// Broker-assigned append time; present from v2 on.
    pub log_append_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceResponse {
    pub topics: Vec<TopicEntry<ProducePartitionResult>>,
    /// Present from v1 on, trailing the topic array.
    pub throttle_time_ms: Option<i32>,
}

pub fn produce_response(version: ApiVersion, body: &[u8]) -> WireResult<ProduceResponse> {
    let mut r = Reader::new(body);
    let topics = read_topic_entries(&mut r, |r| {
        let partition = r.read_i32()?;
        let error = ErrorCode(r.read_i16()?);
        let base_offset = r.read_i64()?;
        let log_append_time = if version >= ApiVersion::V2 {
            Some(r.read_i64()?)
        } else {
            None
        };
        Ok((
            partition,
            ProducePartitionResult {
                error,
                base_offset,
                log_append_time,
            },
        ))
    })?;
    let throttle_time_ms = if version >= ApiVersion::V1 {
        Some(r.read_i32()?)
    } else {
        None
    };
    Ok(ProduceResponse {
        topics,
        throttle_time_ms,
    })
}

// === Fetch (1) ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPartitionParams {
    pub offset: i64,
    pub max_bytes: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub replica_id: i32,
    pub max_wait_time: i32,
    pub min_bytes: i32,
    pub topics: TopicMap<FetchPartitionParams>,
}

/// Same layout for v0-v2.
pub fn fetch_request(body: &[u8]) -> WireResult<FetchRequest> {
    let mut r = Reader::new(body);
    let replica_id = r.read_i32()?;
    let max_wait_time = r.read_i32()?;
    let min_bytes = r.read_i32()?;
    let topics = read_topic_map(&mut r, |r| {
        let partition = r.read_i32()?;
        let offset = r.read_i64()?;
        let max_bytes = r.read_i32()?;
        Ok((partition, FetchPartitionParams { offset, max_bytes }))
    })?;
    Ok(FetchRequest {
        replica_id,
        max_wait_time,
        min_bytes,
        topics,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPartitionResult<'a> {
    pub error: ErrorCode,
    /// High watermark: last committed offset on the partition.
    pub hwm_offset: i64,
    pub message_set: MessageSet<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse<'a> {
    /// Present from v1 on, ahead of the topic array.
    pub throttle_time_ms: Option<i32>,
    pub topics: Vec<TopicEntry<FetchPartitionResult<'a>>>,
}

pub fn fetch_response(version: ApiVersion, body: &[u8]) -> WireResult<FetchResponse<'_>> {
    let mut r = Reader::new(body);
    let throttle_time_ms = if version >= ApiVersion::V1 {
        Some(r.read_i32()?)
    } else {
        None
    };
    let topics = read_topic_entries(&mut r, |r| {
        let partition = r.read_i32()?;
        let error = ErrorCode(r.read_i16()?);
        let hwm_offset = r.read_i64()?;
        let blob = r.read_bytes()?.unwrap_or_default();
        Ok((
            partition,
            FetchPartitionResult {
                error,
                hwm_offset,
                message_set: MessageSet::new(blob),
            },
        ))
    })?;
    Ok(FetchResponse {
        throttle_time_ms,
        topics,
    })
}

// === Offsets (2) ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPartitionParams {
    /// Target timestamp; -1 latest, -2 earliest.
    pub time: i64,
    pub max_offsets: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetRequest {
    pub replica_id: i32,
    pub topics: TopicMap<OffsetPartitionParams>,
}

pub fn offset_request(body: &[u8]) -> WireResult<OffsetRequest> {
    let mut r = Reader::new(body);
    let replica_id = r.read_i32()?;
    let topics = read_topic_map(&mut r, |r| {
        let partition = r.read_i32()?;
        let time = r.read_i64()?;
        let max_offsets = r.read_i32()?;
        Ok((partition, OffsetPartitionParams { time, max_offsets }))
    })?;
    Ok(OffsetRequest { replica_id, topics })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPartitionResult {
    pub error: ErrorCode,
    pub offsets: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetResponse {
    pub topics: Vec<TopicEntry<OffsetPartitionResult>>,
}

pub fn offset_response(body: &[u8]) -> WireResult<OffsetResponse> {
    let mut r = Reader::new(body);
    let topics = read_topic_entries(&mut r, |r| {
        let partition = r.read_i32()?;
        let error = ErrorCode(r.read_i16()?);
        let mut offsets = Vec::new();
        r.read_array(|r| {
            offsets.push(r.read_i64()?);
            Ok(())
        })?;
        Ok((partition, OffsetPartitionResult { error, offsets }))
    })?;
    Ok(OffsetResponse { topics })
}

// === Metadata (3) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRequest {
    /// Empty means "all topics".
    pub topics: Vec<String>,
}

pub fn metadata_request(body: &[u8]) -> WireResult<MetadataRequest> {
    let mut r = Reader::new(body);
    let mut topics = Vec::new();
    r.read_array(|r| {
        topics.push(r.read_string()?.unwrap_or_default());
        Ok(())
    })?;
    Ok(MetadataRequest { topics })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBroker {
    pub node_id: i32,
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataTopic {
    pub error: ErrorCode,
    pub name: String,
    /// Partition ids; leader/replica/isr details are consumed, not kept.
    pub partitions: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataResponse {
    pub brokers: Vec<MetadataBroker>,
    pub topics: Vec<MetadataTopic>,
}

pub fn metadata_response(body: &[u8]) -> WireResult<MetadataResponse> {
    let mut r = Reader::new(body);
    let mut brokers = Vec::new();
    r.read_array(|r| {
        let node_id = r.read_i32()?;
        let host = r.read_string()?.unwrap_or_default();
        let port = r.read_i32()?;
        brokers.push(MetadataBroker {
            node_id,
            host,
            port,
        });
        Ok(())
    })?;
    let mut topics = Vec::new();
    r.read_array(|r| {
        let error = ErrorCode(r.read_i16()?);
        let name = r.read_string()?.unwrap_or_default();
        let mut partitions = Vec::new();
        r.read_array(|r| {
            r.read_i16()?; // partition error
            partitions.push(r.read_i32()?);
            r.read_i32()?; // leader
            r.read_array(|r| {
                r.read_i32()?; // replica
                Ok(())
            })?;
            r.read_array(|r| {
                r.read_i32()?; // isr
                Ok(())
            })?;
            Ok(())
        })?;
        topics.push(MetadataTopic {
            error,
            name,
            partitions,
        });
        Ok(())
    })?;
    Ok(MetadataResponse { brokers, topics })
}

// === OffsetCommit (8) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommitPartition {
    pub offset: i64,
    /// v1 only; 0 elsewhere.
    pub timestamp: i64,
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommitRequest {
    pub group_id: String,
    /// v1+; 0 for v0.
    pub generation_id: i32,
    /// v1+; empty for v0.
    pub consumer_id: String,
    /// v2+; 0 below.
    pub retention_time: i64,
    pub topics: TopicMap<OffsetCommitPartition>,
}

/// The commit request was reshaped twice: v1 added group generation and
/// consumer identity plus a per-partition timestamp; v2 dropped the
/// timestamp again in favor of a request-level retention time.
pub fn offset_commit_request(version: ApiVersion, body: &[u8]) -> WireResult<OffsetCommitRequest> {
    let mut r = Reader::new(body);
    let group_id = r.read_string()?.unwrap_or_default();
    let (generation_id, consumer_id) = if version >= ApiVersion::V1 {
        (r.read_i32()?, r.read_string()?.unwrap_or_default())
    } else {
        (0, String::new())
    };
    let retention_time = if version >= ApiVersion::V2 {
        r.read_i64()?
    } else {
        0
    };
    let topics = read_topic_map(&mut r, |r| {
        let partition = r.read_i32()?;
        let offset = r.read_i64()?;
        let timestamp = if version == ApiVersion::V1 {
            r.read_i64()?
        } else {
            0
        };
        let metadata = r.read_string()?.unwrap_or_default();
        Ok((
            partition,
            OffsetCommitPartition {
                offset,
                timestamp,
                metadata,
            },
        ))
    })?;
    Ok(OffsetCommitRequest {
        group_id,
        generation_id,
        consumer_id,
        retention_time,
        topics,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetCommitResponse {
    pub topics: Vec<TopicEntry<ErrorCode>>,
}

pub fn offset_commit_response(body: &[u8]) -> WireResult<OffsetCommitResponse> {
    let mut r = Reader::new(body);
    let topics = read_topic_entries(&mut r, |r| {
        let partition = r.read_i32()?;
        let error = ErrorCode(r.read_i16()?);
        Ok((partition, error))
    })?;
    Ok(OffsetCommitResponse { topics })
}

// === OffsetFetch (9) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetFetchRequest {
    pub group_id: String,
    pub topics: HashMap<String, Vec<i32>>,
}

pub fn offset_fetch_request(body: &[u8]) -> WireResult<OffsetFetchRequest> {
    let mut r = Reader::new(body);
    let group_id = r.read_string()?.unwrap_or_default();
    let mut topics = HashMap::new();
    r.read_array(|r| {
        let name = r.read_string()?.unwrap_or_default();
        let mut partitions = Vec::new();
        r.read_array(|r| {
            partitions.push(r.read_i32()?);
            Ok(())
        })?;
        topics.insert(name, partitions);
        Ok(())
    })?;
    Ok(OffsetFetchRequest { group_id, topics })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetFetchPartitionResult {
    pub offset: i64,
    pub metadata: String,
    pub error: ErrorCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetFetchResponse {
    pub topics: Vec<TopicEntry<OffsetFetchPartitionResult>>,
}

pub fn offset_fetch_response(body: &[u8]) -> WireResult<OffsetFetchResponse> {
    let mut r = Reader::new(body);
    let topics = read_topic_entries(&mut r, |r| {
        let partition = r.read_i32()?;
        let offset = r.read_i64()?;
        let metadata = r.read_string()?.unwrap_or_default();
        let error = ErrorCode(r.read_i16()?);
        Ok((
            partition,
            OffsetFetchPartitionResult {
                offset,
                metadata,
                error,
            },
        ))
    })?;
    Ok(OffsetFetchResponse { topics })
}

// === GroupCoordinator (10) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCoordinatorRequest {
    pub group_id: String,
}

pub fn group_coordinator_request(body: &[u8]) -> WireResult<GroupCoordinatorRequest> {
    let mut r = Reader::new(body);
    Ok(GroupCoordinatorRequest {
        group_id: r.read_string()?.unwrap_or_default(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCoordinatorResponse {
    pub error: ErrorCode,
    pub coordinator_id: i32,
    pub coordinator_host: String,
    pub coordinator_port: i32,
}

pub fn group_coordinator_response(body: &[u8]) -> WireResult<GroupCoordinatorResponse> {
    let mut r = Reader::new(body);
    let error = ErrorCode(r.read_i16()?);
    let coordinator_id = r.read_i32()?;
    let coordinator_host = r.read_string()?.unwrap_or_default();
    let coordinator_port = r.read_i32()?;
    Ok(GroupCoordinatorResponse {
        error,
        coordinator_id,
        coordinator_host,
        coordinator_port,
    })
}

// === JoinGroup (11) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinGroupRequest {
    pub group_id: String,
    pub session_timeout: i32,
    /// v1+; 0 for v0.
    pub rebalance_timeout: i32,
    pub member_id: String,
    pub protocol_type: String,
    /// Offered protocol names; their opaque metadata is consumed.
    pub protocols: Vec<String>,
}

pub fn join_group_request(version: ApiVersion, body: &[u8]) -> WireResult<JoinGroupRequest> {
    let mut r = Reader::new(body);
    let group_id = r.read_string()?.unwrap_or_default();
    let session_timeout = r.read_i32()?;
    let rebalance_timeout = if version >= ApiVersion::V1 {
        r.read_i32()?
    } else {
        0
    };
    let member_id = r.read_string()?.unwrap_or_default();
    let protocol_type = r.read_string()?.unwrap_or_default();
    let mut protocols = Vec::new();
    r.read_array(|r| {
        protocols.push(r.read_string()?.unwrap_or_default());
        r.read_bytes()?; // protocol metadata
        Ok(())
    })?;
    Ok(JoinGroupRequest {
        group_id,
        session_timeout,
        rebalance_timeout,
        member_id,
        protocol_type,
        protocols,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinGroupResponse {
    pub error: ErrorCode,
    pub generation_id: i32,
    pub group_protocol: String,
    pub leader_id: String,
    pub member_id: String,
    /// Only populated for the elected leader; metadata blobs consumed.
    pub members: Vec<String>,
}

pub fn join_group_response(body: &[u8]) -> WireResult<JoinGroupResponse> {
    let mut r = Reader::new(body);
    let error = ErrorCode(r.read_i16()?);
    let generation_id = r.read_i32()?;
    let group_protocol = r.read_string()?.unwrap_or_default();
    let leader_id = r.read_string()?.unwrap_or_default();
    let member_id = r.read_string()?.unwrap_or_default();
    let mut members = Vec::new();
    r.read_array(|r| {
        members.push(r.read_string()?.unwrap_or_default());
        r.read_bytes()?; // member metadata
        Ok(())
    })?;
    Ok(JoinGroupResponse {
        error,
        generation_id,
        group_protocol,
        leader_id,
        member_id,
        members,
    })
}

// === Heartbeat (12) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatRequest {
    pub group_id: String,
    pub generation_id: i32,
    pub member_id: String,
}

pub fn heartbeat_request(body: &[u8]) -> WireResult<HeartbeatRequest> {
    let mut r = Reader::new(body);
    let group_id = r.read_string()?.unwrap_or_default();
    let generation_id = r.read_i32()?;
    let member_id = r.read_string()?.unwrap_or_default();
    Ok(HeartbeatRequest {
        group_id,
        generation_id,
        member_id,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatResponse {
    pub error: ErrorCode,
}

pub fn heartbeat_response(body: &[u8]) -> WireResult<HeartbeatResponse> {
    let mut r = Reader::new(body);
    Ok(HeartbeatResponse {
        error: ErrorCode(r.read_i16()?),
    })
}

// === LeaveGroup (13) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveGroupRequest {
    pub group_id: String,
    pub member_id: String,
}

pub fn leave_group_request(body: &[u8]) -> WireResult<LeaveGroupRequest> {
    let mut r = Reader::new(body);
    let group_id = r.read_string()?.unwrap_or_default();
    let member_id = r.read_string()?.unwrap_or_default();
    Ok(LeaveGroupRequest {
        group_id,
        member_id,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveGroupResponse {
    pub error: ErrorCode,
}

pub fn leave_group_response(body: &[u8]) -> WireResult<LeaveGroupResponse> {
    let mut r = Reader::new(body);
    Ok(LeaveGroupResponse {
        error: ErrorCode(r.read_i16()?),
    })
}

// === SyncGroup (14) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncGroupRequest {
    pub group_id: String,
    pub generation_id: i32,
    pub member_id: String,
}

pub fn sync_group_request(body: &[u8]) -> WireResult<SyncGroupRequest> {
    let mut r = Reader::new(body);
    let group_id = r.read_string()?.unwrap_or_default();
    let generation_id = r.read_i32()?;
    let member_id = r.read_string()?.unwrap_or_default();
    // per-member assignment blobs, leader only
    r.read_array(|r| {
        r.read_string()?;
        r.read_bytes()?;
        Ok(())
    })?;
    Ok(SyncGroupRequest {
        group_id,
        generation_id,
        member_id,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncGroupResponse {
    pub error: ErrorCode,
}

pub fn sync_group_response(body: &[u8]) -> WireResult<SyncGroupResponse> {
    let mut r = Reader::new(body);
    let error = ErrorCode(r.read_i16()?);
    r.read_bytes()?; // member assignment
    Ok(SyncGroupResponse { error })
}

// === DescribeGroups (15) ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeGroupsRequest {
    pub groups: Vec<String>,
}

pub fn describe_groups_request(body: &[u8]) -> WireResult<DescribeGroupsRequest> {
    let mut r = Reader::new(body);
    let mut groups = Vec::new();
    r.read_array(|r| {
        groups.push(r.read_string()?.unwrap_or_default());
        Ok(())
    })?;
    Ok(DescribeGroupsRequest { groups })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDescription {
    pub error: ErrorCode,
    pub group_id: String,
    pub state: String,
    pub protocol_type: String,
    pub protocol: String,
    /// Member ids; per-member metadata and assignments are consumed.
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeGroupsResponse {
    pub groups: Vec<GroupDescription>,
}

pub fn describe_groups_response(body: &[u8]) -> WireResult<DescribeGroupsResponse> {
    let mut r = Reader::new(body);
    let mut groups = Vec::new();
    r.read_array(|r| {
        let error = ErrorCode(r.read_i16()?);
        let group_id = r.read_string()?.unwrap_or_default();
        let state = r.read_string()?.unwrap_or_default();
        let protocol_type = r.read_string()?.unwrap_or_default();
        let protocol = r.read_string()?.unwrap_or_default();
        let mut members = Vec::new();
        r.read_array(|r| {
            members.push(r.read_string()?.unwrap_or_default());
            r.read_string()?; // client id
            r.read_string()?; // client host
            r.read_bytes()?; // member metadata
            r.read_bytes()?; // member assignment
            Ok(())
        })?;
        groups.push(GroupDescription {
            error,
            group_id,
            state,
            protocol_type,
            protocol,
            members,
        });
        Ok(())
    })?;
    Ok(DescribeGroupsResponse { groups })
}

// === ListGroups (16) ===

// The list_groups request has no body, so there is nothing to decode.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListGroupsResponse {
    pub error: ErrorCode,
    /// `(group_id, protocol_type)` in wire order.
    pub groups: Vec<(String, String)>,
}

pub fn list_groups_response(body: &[u8]) -> WireResult<ListGroupsResponse> {
    let mut r = Reader::new(body);
    let error = ErrorCode(r.read_i16()?);
    let mut groups = Vec::new();
    r.read_array(|r| {
        let group_id = r.read_string()?.unwrap_or_default();
        let protocol_type = r.read_string()?.unwrap_or_default();
        groups.push((group_id, protocol_type));
        Ok(())
    })?;
    Ok(ListGroupsResponse { error, groups })
}
