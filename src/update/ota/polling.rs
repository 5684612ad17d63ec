//! The progress polling loop and its failure classification.
//!
//! At most one poll is in flight at any time: the next tick is requested
//! only from the handler of the previous poll's outcome, never from a
//! free-running interval. Tick and response events carry the attempt id,
//! so anything left over from a superseded attempt is dropped.
//!
//! A bare "request failed, report an error" policy would report a false
//! failure on every successful update, because the device goes dark while
//! it flashes and reboots. The classification below converts the expected
//! disconnection into a success signal while still bounding the total wait
//! and the consecutive-failure tolerance.

use crux_core::{render::render, Command};

use crate::events::{Event, OtaEvent};
use crate::http_helpers::{build_url, process_json_response};
use crate::model::Model;
use crate::types::{FailureReason, GatewayError, ProgressSample, StatusBadge, UpdatePhase};
use crate::{Effect, HttpCmd, TimerCmd};

use super::fail_attempt;

pub(super) fn schedule_poll(interval_ms: u64, attempt: u64) -> Command<Effect, Event> {
    TimerCmd::delay(interval_ms)
        .build()
        .then_send(move |_| Event::Ota(OtaEvent::PollTick { attempt }))
}

fn is_current_poll(attempt_id: u64, model: &Model) -> bool {
    model
        .attempt
        .as_ref()
        .is_some_and(|attempt| attempt.id == attempt_id && attempt.phase == UpdatePhase::Polling)
}

/// One poll tick: enforce the timeout budget, then ask the device for
/// progress.
pub(super) fn handle_poll_tick(attempt_id: u64, model: &mut Model) -> Command<Effect, Event> {
    if !is_current_poll(attempt_id, model) {
        return Command::done();
    }
    let budget_spent = model
        .attempt
        .as_ref()
        .is_some_and(|attempt| attempt.poll_count >= model.policy.max_poll_attempts);
    if budget_spent {
        fail_attempt(model, FailureReason::Timeout);
        model.set_error("Update timeout. Please check device status.".to_string());
        return render();
    }
    let Some(header) = model.session.auth_header() else {
        // Only the gateway's 401 path clears the token, and that also ends
        // the attempt; reaching this means the invariant broke somewhere
        log::error!("Poll tick without a session token");
        fail_attempt(model, FailureReason::AuthExpired);
        return crate::update::auth::expire_session(model);
    };
    HttpCmd::get(build_url("/ota-progress"))
        .header("Authorization", header)
        .build()
        .then_send(move |result| {
            let result = process_json_response::<ProgressSample>("Progress poll", result);
            Event::Ota(OtaEvent::PollResponse {
                attempt: attempt_id,
                result,
            })
        })
}

/// Outcome of one poll: record progress, or classify the failure.
pub(super) fn handle_poll_response(
    attempt_id: u64,
    result: Result<ProgressSample, GatewayError>,
    model: &mut Model,
) -> Command<Effect, Event> {
    if !is_current_poll(attempt_id, model) {
        return Command::done();
    }
    match result {
        Ok(sample) => record_progress(sample, model),
        Err(GatewayError::AuthExpired) => {
            fail_attempt(model, FailureReason::AuthExpired);
            crate::update::auth::expire_session(model)
        }
        Err(error) => classify_poll_failure(error, model),
    }
}

fn record_progress(sample: ProgressSample, model: &mut Model) -> Command<Effect, Event> {
    let interval = model.policy.poll_interval_ms;
    let progress = sample.progress.min(100);
    let Some(attempt) = model.attempt.as_mut() else {
        return Command::done();
    };
    attempt.last_progress = progress;
    attempt.consecutive_failures = 0;
    let id = attempt.id;
    if progress < 100 {
        attempt.poll_count += 1;
        model.progress_percent = progress;
        model.badge = StatusBadge::Updating;
        Command::all([render(), schedule_poll(interval, id)])
    } else {
        model.progress_percent = progress;
        complete_success(model)
    }
}

/// A poll failed below the timeout budget. Decide whether this is the
/// device rebooting (success) or the connection genuinely going away.
fn classify_poll_failure(error: GatewayError, model: &mut Model) -> Command<Effect, Event> {
    let policy = model.policy.clone();
    log::info!("Progress poll failed: {error}");
    let Some(attempt) = model.attempt.as_mut() else {
        return Command::done();
    };
    if attempt.submit_acknowledged && attempt.poll_count < policy.early_reboot_poll_window {
        // The device accepted the image and went dark before it ever
        // reported progress: it is flashing and rebooting
        log::info!("Submission was accepted, device is restarting");
        return complete_success(model);
    }
    if attempt.last_progress >= policy.reboot_progress_threshold {
        // Expected connection drop while the device reboots
        log::info!("Update nearly complete, device is restarting");
        return complete_success(model);
    }
    attempt.poll_count += 1;
    attempt.consecutive_failures += 1;
    let id = attempt.id;
    if attempt.consecutive_failures > policy.max_consecutive_failures {
        fail_attempt(model, FailureReason::ConnectionLost);
        model.warning_message =
            Some("Connection lost. Device may be restarting; refresh manually.".to_string());
        return render();
    }
    // Transparent retry at the same cadence, nothing surfaces to the user
    schedule_poll(policy.poll_interval_ms, id)
}

/// Single transition into Succeeded, whether observed (100 %) or inferred
/// from the reboot heuristics; the two are deliberately indistinguishable
/// downstream.
pub(super) fn complete_success(model: &mut Model) -> Command<Effect, Event> {
    let reload_delay = model.policy.reload_delay_ms;
    let Some(attempt) = model.attempt.as_mut() else {
        return Command::done();
    };
    attempt.phase = UpdatePhase::Succeeded;
    let id = attempt.id;
    model.badge = StatusBadge::Success;
    model.progress_percent = 100;
    model.status_line = Some("Update complete. Restarting...".to_string());
    model.success_message = Some("Update successful. Restarting...".to_string());
    let reload = TimerCmd::delay(reload_delay)
        .build()
        .then_send(move |_| Event::Ota(OtaEvent::ReloadDue { attempt: id }));
    Command::all([render(), reload])
}

/// The post-success delay elapsed; ask the shell to reload the page, which
/// is what returns the whole panel to Idle.
pub(super) fn handle_reload_due(attempt_id: u64, model: &mut Model) -> Command<Effect, Event> {
    let current = model
        .attempt
        .as_ref()
        .is_some_and(|attempt| attempt.id == attempt_id && attempt.phase == UpdatePhase::Succeeded);
    if !current {
        return Command::done();
    }
    model.reload_requested = true;
    render()
}
