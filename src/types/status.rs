use serde::{Deserialize, Serialize};

/// Answer from the authenticated `/status` endpoint.
///
/// Also serves as the login probe response: credentials are considered valid
/// exactly when this endpoint answers 2xx.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceStatus {
    #[serde(default)]
    pub version: String,
    /// Seconds since device boot.
    #[serde(default)]
    pub uptime: u64,
}

impl DeviceStatus {
    pub fn uptime_formatted(&self) -> String {
        format_uptime(self.uptime)
    }
}

/// Answer from the unauthenticated `/version` endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirmwareVersion {
    #[serde(default)]
    pub version: String,
}

/// Render an uptime in seconds as a compact human-readable string, dropping
/// the seconds once hours are involved.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
