//! Protocol enumerations: API keys, versions, error codes.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::WireError;

/// Number of API keys in the supported protocol range (0-16).
pub const API_COUNT: usize = 17;

/// Kafka API key, the first field of every request header.
///
/// Covers the 0.8-0.10 protocol range. Keys 4-7 are broker-internal
/// (replication and cluster control); their bodies are never decoded but
/// they still participate in correlation.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum ApiKey {
    Produce = 0,
    Fetch = 1,
    Offsets = 2,
    Metadata = 3,

    // Broker-internal APIs
    LeaderAndIsr = 4,
    StopReplica = 5,
    UpdateMetadata = 6,
    ControlledShutdown = 7,

    // Consumer group coordination
    OffsetCommit = 8,
    OffsetFetch = 9,
    GroupCoordinator = 10,
    JoinGroup = 11,
    Heartbeat = 12,
    LeaveGroup = 13,
    SyncGroup = 14,
    DescribeGroups = 15,
    ListGroups = 16,
}

impl ApiKey {
    pub const ALL: [ApiKey; API_COUNT] = [
        ApiKey::Produce,
        ApiKey::Fetch,
        ApiKey::Offsets,
        ApiKey::Metadata,
        ApiKey::LeaderAndIsr,
        ApiKey::StopReplica,
        ApiKey::UpdateMetadata,
        ApiKey::ControlledShutdown,
        ApiKey::OffsetCommit,
        ApiKey::OffsetFetch,
        ApiKey::GroupCoordinator,
        ApiKey::JoinGroup,
        ApiKey::Heartbeat,
        ApiKey::LeaveGroup,
        ApiKey::SyncGroup,
        ApiKey::DescribeGroups,
        ApiKey::ListGroups,
    ];

    /// Stable lowercase name, also accepted by [`ApiKey::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            ApiKey::Produce => "produce",
            ApiKey::Fetch => "fetch",
            ApiKey::Offsets => "offsets",
            ApiKey::Metadata => "metadata",
            ApiKey::LeaderAndIsr => "leader_and_isr",
            ApiKey::StopReplica => "stop_replica",
            ApiKey::UpdateMetadata => "update_metadata",
            ApiKey::ControlledShutdown => "controlled_shutdown",
            ApiKey::OffsetCommit => "offset_commit",
            ApiKey::OffsetFetch => "offset_fetch",
            ApiKey::GroupCoordinator => "group_coordinator",
            ApiKey::JoinGroup => "join_group",
            ApiKey::Heartbeat => "heartbeat",
            ApiKey::LeaveGroup => "leave_group",
            ApiKey::SyncGroup => "sync_group",
            ApiKey::DescribeGroups => "describe_groups",
            ApiKey::ListGroups => "list_groups",
        }
    }

    /// Case-insensitive lookup by name, for user-facing configuration.
    pub fn from_name(name: &str) -> Option<ApiKey> {
        ApiKey::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// Dispatch-table slot for this key.
    pub fn index(self) -> usize {
        i16::from(self) as usize
    }

    /// Broker-internal APIs (4-7) whose bodies are never decoded.
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            ApiKey::LeaderAndIsr
                | ApiKey::StopReplica
                | ApiKey::UpdateMetadata
                | ApiKey::ControlledShutdown
        )
    }

    /// Fallible conversion with the wire error this crate reports.
    pub fn from_wire(raw: i16) -> Result<ApiKey, WireError> {
        ApiKey::try_from(raw).map_err(|_| WireError::UnknownApiKey(raw))
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Newtype for the API version field of a request header.
///
/// Any `i16` is representable; unknown versions decode fine at the header
/// level and only matter when a body decoder gates fields on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ApiVersion(pub i16);

impl ApiVersion {
    pub const V0: ApiVersion = ApiVersion(0);
    pub const V1: ApiVersion = ApiVersion(1);
    pub const V2: ApiVersion = ApiVersion(2);
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<i16> for ApiVersion {
    fn from(v: i16) -> Self {
        Self(v)
    }
}

impl From<ApiVersion> for i16 {
    fn from(v: ApiVersion) -> Self {
        v.0
    }
}

/// Newtype for the per-partition (or per-message) Kafka error code.
///
/// `0` means no error; any other value marks the transaction as failed.
/// Codes are passed through to output unmapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ErrorCode(pub i16);

impl ErrorCode {
    pub const NONE: ErrorCode = ErrorCode(0);

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i16> for ErrorCode {
    fn from(v: i16) -> Self {
        Self(v)
    }
}

impl From<ErrorCode> for i16 {
    fn from(v: ErrorCode) -> Self {
        v.0
    }
}
