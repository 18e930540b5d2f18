//! Everything that re-enters the console from outside a command.

use crate::health::ProbeReport;
use crate::hub::{
    ApiError, HubStatus, OperationStatus, ServerStartResponse, StreamStartResponse,
    StreamStopResponse, UploadResponse, UserInfo,
};
use crate::stream::ChannelEvent;
use crate::tasks::OperationKind;

/// I/O completions, timer expiries, and channel traffic.
///
/// Spawned tasks only ever construct one of these and send it; each carries
/// the attempt, epoch, operation id, generation, or heartbeat tick it was
/// issued for.
#[derive(Debug)]
pub enum Event {
    Connected {
        attempt: u64,
        result: Result<UserInfo, ApiError>,
    },
    ServerStarted(Result<ServerStartResponse, ApiError>),
    RecheckDue,
    HubStatus(Result<HubStatus, ApiError>),
    Uploaded {
        epoch: u64,
        object_name: String,
        result: Result<UploadResponse, ApiError>,
    },
    OperationStarted {
        kind: OperationKind,
        epoch: u64,
        result: Result<String, ApiError>,
    },
    PollDue {
        kind: OperationKind,
        operation_id: String,
    },
    Polled {
        kind: OperationKind,
        operation_id: String,
        result: Result<OperationStatus, ApiError>,
    },
    StreamStarted {
        generation: u64,
        result: Result<StreamStartResponse, ApiError>,
    },
    StreamStopped {
        generation: u64,
        result: Result<StreamStopResponse, ApiError>,
    },
    Channel {
        generation: u64,
        event: ChannelEvent,
    },
    HealthProbed {
        tick: u64,
        report: ProbeReport,
    },
    NotificationExpired(u64),
}
