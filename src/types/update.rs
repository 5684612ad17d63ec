use serde::{Deserialize, Serialize};

/// Cadence of `/ota-progress` polls while an update is applying.
pub const POLL_INTERVAL_MS: u64 = 500;

/// Total poll budget before an attempt times out (about 60 s worst case).
pub const MAX_POLL_ATTEMPTS: u32 = 120;

/// A poll error within this many polls of an accepted submission is taken as
/// the device rebooting straight into the new firmware.
pub const EARLY_REBOOT_POLL_WINDOW: u32 = 5;

/// Last seen progress at or above this turns a poll error into the expected
/// connection drop during reboot.
pub const REBOOT_PROGRESS_THRESHOLD: u8 = 95;

/// Unbroken poll failures tolerated before the connection is declared lost.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Delay between a successful update and the page reload request.
pub const RELOAD_DELAY_MS: u64 = 3000;

/// Tuned polling heuristics, kept overridable for tests and shells.
///
/// The defaults were calibrated against real device reboot timing. They are
/// policy, not physics; changing them changes which disconnections count as
/// a successful reboot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollPolicy {
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    pub early_reboot_poll_window: u32,
    pub reboot_progress_threshold: u8,
    pub max_consecutive_failures: u32,
    pub reload_delay_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            max_poll_attempts: MAX_POLL_ATTEMPTS,
            early_reboot_poll_window: EARLY_REBOOT_POLL_WINDOW,
            reboot_progress_threshold: REBOOT_PROGRESS_THRESHOLD,
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
            reload_delay_ms: RELOAD_DELAY_MS,
        }
    }
}

/// Where the firmware for an attempt comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UpdateSource {
    /// Direct multipart upload; the staged file stays in the shell.
    Upload { filename: String, size_bytes: u64 },
    /// The device fetches the image itself from this URL.
    RemoteUrl { url: String },
}

/// Why a terminal attempt failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FailureReason {
    /// The initial upload or URL submission was not accepted.
    SubmitRejected,
    /// The poll budget ran out below 100 %.
    Timeout,
    /// Too many consecutive poll failures outside the reboot heuristics.
    ConnectionLost,
    /// A protected call returned 401; the user must log in again.
    AuthExpired,
}

/// Lifecycle of one update attempt.
///
/// `Idle` is represented by `Model::attempt` being `None`; an existing
/// attempt is always in one of the other phases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UpdatePhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Succeeded,
    Failed(FailureReason),
}

impl UpdatePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

/// One update attempt, owned by the controller.
///
/// `poll_count` counts every completed poll and drives the overall timeout;
/// `consecutive_failures` counts only the current unbroken failure run and
/// resets on any successful poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttempt {
    pub id: u64,
    pub source: UpdateSource,
    /// Shell clock at submission; the core itself has no clock.
    pub started_at_ms: u64,
    pub phase: UpdatePhase,
    pub poll_count: u32,
    pub consecutive_failures: u32,
    pub last_progress: u8,
    /// Set once the device has accepted the submission.
    pub submit_acknowledged: bool,
}

impl UpdateAttempt {
    pub fn new(id: u64, source: UpdateSource, started_at_ms: u64) -> Self {
        Self {
            id,
            source,
            started_at_ms,
            phase: UpdatePhase::Submitting,
            poll_count: 0,
            consecutive_failures: 0,
            last_progress: 0,
            submit_acknowledged: false,
        }
    }
}

/// Progress report from `/ota-progress`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressSample {
    #[serde(default)]
    pub progress: u8,
}

/// Form body for `/update-url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlUpdateRequest {
    pub url: String,
}

/// Status badge shown by the shell.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StatusBadge {
    #[default]
    Idle,
    Updating,
    Success,
    Error,
}
