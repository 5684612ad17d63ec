//! The update lifecycle controller.
//!
//! One attempt at a time moves through Submitting, Polling and a terminal
//! phase. Submission happens here; the polling loop and the failure
//! classification live in `polling`.

mod polling;

use crux_core::{render::render, Command};

use crate::auth_post_form;
use crate::commands::upload::UploadOutput;
use crate::events::{Event, OtaEvent};
use crate::http_helpers::handle_auth_error;
use crate::model::Model;
use crate::types::{
    FailureReason, GatewayError, StatusBadge, UpdateAttempt, UpdatePhase, UpdateSource,
    UrlUpdateRequest,
};
use crate::update_field;
use crate::{Effect, UploadCmd};

use polling::{complete_success, schedule_poll};

/// Handle update lifecycle events
pub fn handle(event: OtaEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        OtaEvent::SubmitUpload {
            filename,
            size_bytes,
            started_at_ms,
        } => handle_submit_upload(filename, size_bytes, started_at_ms, model),
        OtaEvent::UploadProgress(percent) => handle_upload_progress(percent, model),
        OtaEvent::UploadFinished { status } => handle_upload_finished(status, model),
        OtaEvent::UploadTransportFailed { error } => handle_upload_transport_failed(error, model),
        OtaEvent::SubmitUrl { url, started_at_ms } => handle_submit_url(url, started_at_ms, model),
        OtaEvent::SubmitUrlResponse(result) => handle_submit_url_response(result, model),
        OtaEvent::PollTick { attempt } => polling::handle_poll_tick(attempt, model),
        OtaEvent::PollResponse { attempt, result } => {
            polling::handle_poll_response(attempt, result, model)
        }
        OtaEvent::ReloadDue { attempt } => polling::handle_reload_due(attempt, model),
        OtaEvent::Reset => handle_reset(model),
    }
}

/// Create the attempt and lock the panel. Refuses when another attempt is
/// still running; the caller renders the reported error.
fn start_attempt(
    model: &mut Model,
    source: UpdateSource,
    started_at_ms: u64,
    status_line: &str,
) -> bool {
    if model
        .attempt
        .as_ref()
        .is_some_and(|attempt| !attempt.phase.is_terminal())
    {
        model.set_error("An update is already in progress.".to_string());
        return false;
    }
    model.attempt_seq += 1;
    model.attempt = Some(UpdateAttempt::new(model.attempt_seq, source, started_at_ms));
    model.clear_messages();
    model.controls_locked = true;
    model.reload_requested = false;
    model.badge = StatusBadge::Updating;
    model.progress_percent = 0;
    model.status_line = Some(status_line.to_string());
    true
}

fn handle_submit_upload(
    filename: String,
    size_bytes: u64,
    started_at_ms: u64,
    model: &mut Model,
) -> Command<Effect, Event> {
    let Some(header) = model.session.auth_header() else {
        return handle_auth_error(model, "Upload");
    };
    let source = UpdateSource::Upload {
        filename,
        size_bytes,
    };
    if !start_attempt(model, source, started_at_ms, "Uploading firmware...") {
        return render();
    }
    let upload = UploadCmd::start(header)
        .build()
        .then_send(|output| match output {
            UploadOutput::Completed { status } => Event::Ota(OtaEvent::UploadFinished { status }),
            UploadOutput::TransportError { message } => {
                Event::Ota(OtaEvent::UploadTransportFailed { error: message })
            }
        });
    Command::all([render(), upload])
}

fn handle_upload_progress(percent: u8, model: &mut Model) -> Command<Effect, Event> {
    if model.phase() != UpdatePhase::Submitting {
        return Command::done();
    }
    update_field!(model.progress_percent, percent.min(100))
}

fn handle_upload_finished(status: u16, model: &mut Model) -> Command<Effect, Event> {
    if model.phase() != UpdatePhase::Submitting {
        log::warn!("Upload result dropped, no submission in flight");
        return Command::done();
    }
    match status {
        200..=299 => accept_submission(model),
        401 => {
            fail_attempt(model, FailureReason::AuthExpired);
            super::auth::expire_session(model)
        }
        _ => {
            fail_attempt(model, FailureReason::SubmitRejected);
            model.set_error(format!("Upload failed: HTTP {status}"));
            render()
        }
    }
}

fn handle_upload_transport_failed(error: String, model: &mut Model) -> Command<Effect, Event> {
    if model.phase() != UpdatePhase::Submitting {
        return Command::done();
    }
    // The device resets the connection when it reboots straight out of a
    // finished flash; a dropped response here is the success path
    log::info!("Upload connection dropped, assuming device restart: {error}");
    complete_success(model)
}

fn handle_submit_url(url: String, started_at_ms: u64, model: &mut Model) -> Command<Effect, Event> {
    if model.session.auth_header().is_none() {
        return handle_auth_error(model, "Update from URL");
    }
    let source = UpdateSource::RemoteUrl { url: url.clone() };
    if !start_attempt(model, source, started_at_ms, "Requesting update...") {
        return render();
    }
    let request = UrlUpdateRequest { url };
    Command::all([
        render(),
        auth_post_form!(Ota, OtaEvent, model, "/update-url", SubmitUrlResponse, "Update from URL",
            form: &request),
    ])
}

fn handle_submit_url_response(
    result: Result<(), GatewayError>,
    model: &mut Model,
) -> Command<Effect, Event> {
    if model.phase() != UpdatePhase::Submitting {
        return Command::done();
    }
    match result {
        Ok(()) => {
            model.success_message = Some("Update from URL started.".to_string());
            accept_submission(model)
        }
        Err(GatewayError::AuthExpired) => {
            fail_attempt(model, FailureReason::AuthExpired);
            super::auth::expire_session(model)
        }
        Err(error) => {
            log::warn!("URL update submission failed: {error}");
            fail_attempt(model, FailureReason::SubmitRejected);
            model.set_error("Update failed. Please check the URL.".to_string());
            render()
        }
    }
}

/// Submission accepted by the device: arm the polling loop.
fn accept_submission(model: &mut Model) -> Command<Effect, Event> {
    let interval = model.policy.poll_interval_ms;
    let Some(attempt) = model.attempt.as_mut() else {
        return Command::done();
    };
    attempt.submit_acknowledged = true;
    attempt.phase = UpdatePhase::Polling;
    attempt.poll_count = 0;
    attempt.consecutive_failures = 0;
    attempt.last_progress = 0;
    let id = attempt.id;
    model.badge = StatusBadge::Updating;
    model.progress_percent = 0;
    model.status_line = Some("Applying update...".to_string());
    Command::all([render(), schedule_poll(interval, id)])
}

/// Single transition into a failed phase: badge, progress reset, unlock.
/// The caller sets the message, which keeps terminal reporting to exactly
/// one place per reason.
pub(super) fn fail_attempt(model: &mut Model, reason: FailureReason) {
    if let Some(attempt) = model.attempt.as_mut() {
        attempt.phase = UpdatePhase::Failed(reason);
    }
    model.badge = StatusBadge::Error;
    model.progress_percent = 0;
    model.status_line = None;
    model.controls_locked = false;
}

fn handle_reset(model: &mut Model) -> Command<Effect, Event> {
    if !model.phase().is_terminal() {
        log::warn!("Reset ignored: no terminal update attempt");
        return Command::done();
    }
    model.attempt = None;
    model.badge = StatusBadge::Idle;
    model.progress_percent = 0;
    model.status_line = None;
    model.controls_locked = false;
    model.reload_requested = false;
    model.clear_messages();
    render()
}
