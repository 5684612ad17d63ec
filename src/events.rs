use serde::{Deserialize, Serialize};

use crate::types::*;

/// Events that can happen in the app, grouped by domain
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Event {
    // Initialization
    Initialize,

    Auth(AuthEvent),
    Ota(OtaEvent),
    Status(StatusEvent),
    Ui(UiEvent),
}

/// Authentication events
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    Login {
        username: String,
        password: String,
    },
    Logout,

    // Internal events (skipped from serialization)
    #[serde(skip)]
    SessionRestored(Option<String>),
    #[serde(skip)]
    SessionPersisted,
    #[serde(skip)]
    LoginProbeResponse(Result<DeviceStatus, GatewayError>),
    #[serde(skip)]
    RestoreProbeResponse(Result<DeviceStatus, GatewayError>),
}

/// Update lifecycle events
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum OtaEvent {
    /// The shell staged a firmware file and wants it uploaded
    SubmitUpload {
        filename: String,
        size_bytes: u64,
        started_at_ms: u64,
    },
    /// Transfer progress from the shell uploader
    UploadProgress(u8),
    /// The device should fetch the firmware itself
    SubmitUrl {
        url: String,
        started_at_ms: u64,
    },
    /// Return a terminal attempt to Idle
    Reset,

    // Internal events (skipped from serialization)
    #[serde(skip)]
    UploadFinished {
        status: u16,
    },
    #[serde(skip)]
    UploadTransportFailed {
        error: String,
    },
    #[serde(skip)]
    SubmitUrlResponse(Result<(), GatewayError>),
    #[serde(skip)]
    PollTick {
        attempt: u64,
    },
    #[serde(skip)]
    PollResponse {
        attempt: u64,
        result: Result<ProgressSample, GatewayError>,
    },
    #[serde(skip)]
    ReloadDue {
        attempt: u64,
    },
}

/// Device status panel events
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    LoadDeviceStatus,
    LoadFirmwareVersion,

    // Internal events (skipped from serialization)
    #[serde(skip)]
    DeviceStatusResponse(Result<DeviceStatus, GatewayError>),
    #[serde(skip)]
    FirmwareVersionResponse(Result<FirmwareVersion, GatewayError>),
}

/// UI actions
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ClearError,
    ClearSuccess,
    ClearWarning,
}
