use serde::{Deserialize, Serialize};

use crate::types::*;

/// Trait for types that can handle error messages
///
/// This allows HTTP helper functions to work with Model without directly
/// depending on it.
pub trait ModelErrorHandler {
    fn set_error(&mut self, error: String);
}

/// Application Model - the complete state
/// Also serves as the ViewModel when serialized (the session token is
/// excluded)
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Model {
    // Device state
    pub device_status: Option<DeviceStatus>,
    pub firmware_version: Option<FirmwareVersion>,

    // Authentication state
    /// Credential store; never serialized into the view
    #[serde(skip)]
    pub session: Session,
    pub is_authenticated: bool,

    // Update attempt state; None means Idle
    pub attempt: Option<UpdateAttempt>,
    pub attempt_seq: u64,
    pub policy: PollPolicy,

    // Presentation state
    pub badge: StatusBadge,
    pub progress_percent: u8,
    pub status_line: Option<String>,
    pub controls_locked: bool,
    /// Set once the post-success delay elapsed; the shell reloads the page
    pub reload_requested: bool,

    // UI state
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub success_message: Option<String>,
    pub warning_message: Option<String>,
}

impl Model {
    /// Invalidate the current session (logout or 401)
    pub fn invalidate_session(&mut self) {
        self.is_authenticated = false;
        self.session.clear();
    }

    /// The current update phase; `Idle` when no attempt exists
    pub fn phase(&self) -> UpdatePhase {
        self.attempt
            .as_ref()
            .map(|attempt| attempt.phase.clone())
            .unwrap_or_default()
    }

    /// Start a loading operation (sets is_loading=true, clears error)
    pub fn start_loading(&mut self) {
        self.is_loading = true;
        self.error_message = None;
    }

    /// Stop loading and clear error
    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.error_message = None;
    }

    /// Set an error message and stop loading
    pub fn set_error(&mut self, error: String) {
        self.is_loading = false;
        self.error_message = Some(error);
    }

    /// Set an error message, stop loading, and return a render command
    pub fn set_error_and_render(
        &mut self,
        error: String,
    ) -> crux_core::Command<crate::Effect, crate::events::Event> {
        self.set_error(error);
        crux_core::render::render()
    }

    /// Clear all user-facing messages (view transitions)
    pub fn clear_messages(&mut self) {
        self.error_message = None;
        self.success_message = None;
        self.warning_message = None;
    }
}

impl ModelErrorHandler for Model {
    fn set_error(&mut self, error: String) {
        Model::set_error(self, error)
    }
}
