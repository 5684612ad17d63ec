use super::*;
use crux_core::testing::AppTester;
use crux_core::Command;
use crux_http::protocol::{HttpResponse, HttpResult};

use crate::events::{AuthEvent, OtaEvent, StatusEvent, UiEvent};

// base64 of "admin:1234"
const ADMIN_TOKEN: &str = "YWRtaW46MTIzNA==";

fn authenticated_model() -> Model {
    let mut model = Model::default();
    model.session.set("admin", "1234");
    model.is_authenticated = true;
    model
}

/// Drive a URL submission to the point where polling is armed.
fn polling_model() -> (Model, u64) {
    let mut model = authenticated_model();
    let _ = update::update(
        Event::Ota(OtaEvent::SubmitUrl {
            url: "http://fw.example/firmware.bin".to_string(),
            started_at_ms: 1_000,
        }),
        &mut model,
    );
    let _ = update::update(Event::Ota(OtaEvent::SubmitUrlResponse(Ok(()))), &mut model);
    let id = model.attempt.as_ref().expect("attempt exists").id;
    assert_eq!(model.phase(), UpdatePhase::Polling);
    (model, id)
}

fn poll_ok(model: &mut Model, id: u64, progress: u8) -> Command<Effect, Event> {
    update::update(
        Event::Ota(OtaEvent::PollResponse {
            attempt: id,
            result: Ok(ProgressSample { progress }),
        }),
        model,
    )
}

fn poll_err(model: &mut Model, id: u64) -> Command<Effect, Event> {
    update::update(
        Event::Ota(OtaEvent::PollResponse {
            attempt: id,
            result: Err(GatewayError::Network("connection reset".to_string())),
        }),
        model,
    )
}

/// Drain all effects a command currently has ready.
///
/// `Command::effects()` consumes what it yields, so tests drain once and
/// count from the snapshot.
fn drain_effects(cmd: &mut Command<Effect, Event>) -> Vec<Effect> {
    cmd.effects().collect()
}

fn count_timers(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Timer(_)))
        .count()
}

fn count_http(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Http(_)))
        .count()
}

fn timer_effects(cmd: &mut Command<Effect, Event>) -> usize {
    count_timers(&drain_effects(cmd))
}

fn http_effects(cmd: &mut Command<Effect, Event>) -> usize {
    count_http(&drain_effects(cmd))
}

#[test]
fn test_login_sets_loading() {
    let app = AppTester::<App>::default();
    let mut model = Model::default();

    let _command = app.update(
        Event::Auth(AuthEvent::Login {
            username: "admin".to_string(),
            password: "1234".to_string(),
        }),
        &mut model,
    );

    assert!(model.is_loading);
    assert!(model.session.is_authenticated());
    assert!(!model.is_authenticated);
}

#[test]
fn test_login_probes_status_with_basic_header() {
    let mut model = Model::default();

    let mut cmd = update::update(
        Event::Auth(AuthEvent::Login {
            username: "admin".to_string(),
            password: "1234".to_string(),
        }),
        &mut model,
    );

    let request = cmd
        .effects()
        .find_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .expect("login issues a probe request");

    assert_eq!(request.operation.method, "GET");
    assert_eq!(request.operation.url, "https://relative/status");
    assert!(request
        .operation
        .headers
        .iter()
        .any(|header| header.name == "Authorization"
            && header.value == format!("Basic {ADMIN_TOKEN}")));
}

#[test]
fn test_login_success_persists_token() {
    let mut model = Model::default();
    let _ = update::update(
        Event::Auth(AuthEvent::Login {
            username: "admin".to_string(),
            password: "1234".to_string(),
        }),
        &mut model,
    );

    let mut cmd = update::update(
        Event::Auth(AuthEvent::LoginProbeResponse(Ok(DeviceStatus {
            version: "1.2.3".to_string(),
            uptime: 90,
        }))),
        &mut model,
    );

    assert!(model.is_authenticated);
    assert_eq!(
        model.device_status.as_ref().map(|s| s.version.as_str()),
        Some("1.2.3")
    );

    let saved = cmd.effects().find_map(|effect| match effect {
        Effect::SessionStore(request) => Some(request.operation.clone()),
        _ => None,
    });
    assert_eq!(
        saved,
        Some(SessionStoreOperation::Save {
            key: AUTH_STORAGE_KEY.to_string(),
            value: ADMIN_TOKEN.to_string(),
        })
    );
}

#[test]
fn test_login_failure_clears_session() {
    let mut model = Model::default();
    let _ = update::update(
        Event::Auth(AuthEvent::Login {
            username: "admin".to_string(),
            password: "wrong".to_string(),
        }),
        &mut model,
    );

    let _ = update::update(
        Event::Auth(AuthEvent::LoginProbeResponse(Err(GatewayError::AuthExpired))),
        &mut model,
    );

    assert!(!model.is_authenticated);
    assert_eq!(model.session.auth_header(), None);
    assert_eq!(
        model.error_message.as_deref(),
        Some("Invalid username or password.")
    );
}

#[test]
fn test_restore_probe_failure_is_silent() {
    let mut model = Model::default();
    let _ = update::update(
        Event::Auth(AuthEvent::SessionRestored(Some(ADMIN_TOKEN.to_string()))),
        &mut model,
    );
    assert!(model.session.is_authenticated());

    let mut cmd = update::update(
        Event::Auth(AuthEvent::RestoreProbeResponse(Err(GatewayError::Network(
            "connection refused".to_string(),
        )))),
        &mut model,
    );

    assert!(!model.is_authenticated);
    assert_eq!(model.session.auth_header(), None);
    assert_eq!(model.error_message, None);
    assert!(cmd.effects().any(|effect| matches!(
        effect,
        Effect::SessionStore(request)
            if matches!(request.operation, SessionStoreOperation::Clear { .. })
    )));
}

#[test]
fn test_initialize_loads_version_and_stored_session() {
    let mut model = Model::default();
    let mut cmd = update::update(Event::Initialize, &mut model);

    let mut version_request = None;
    let mut load_request = None;
    for effect in cmd.effects() {
        match effect {
            Effect::Http(request) => version_request = Some(request),
            Effect::SessionStore(request) => load_request = Some(request),
            _ => {}
        }
    }

    let version_request = version_request.expect("boot fetches the firmware version");
    assert_eq!(version_request.operation.url, "https://relative/version");
    assert!(version_request.operation.headers.is_empty());

    let mut load_request = load_request.expect("boot checks session storage");
    assert_eq!(
        load_request.operation,
        SessionStoreOperation::Load {
            key: AUTH_STORAGE_KEY.to_string()
        }
    );

    load_request
        .resolve(SessionStoreOutput::Token(Some(ADMIN_TOKEN.to_string())))
        .expect("resolve stored token");
    let restored = cmd.events().next().expect("restore event");
    let mut probe_cmd = update::update(restored, &mut model);

    // A recovered token is probed against /status before it counts
    assert!(!model.is_authenticated);
    assert_eq!(http_effects(&mut probe_cmd), 1);
}

#[test]
fn test_url_submit_arms_polling() {
    let mut model = authenticated_model();

    let mut cmd = update::update(
        Event::Ota(OtaEvent::SubmitUrl {
            url: "http://fw.example/firmware.bin".to_string(),
            started_at_ms: 1_000,
        }),
        &mut model,
    );

    assert_eq!(model.phase(), UpdatePhase::Submitting);
    assert!(model.controls_locked);
    assert_eq!(model.badge, StatusBadge::Updating);
    let submit = cmd
        .effects()
        .find_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .expect("URL submit posts to the device");
    assert_eq!(submit.operation.method, "POST");
    assert_eq!(submit.operation.url, "https://relative/update-url");

    let mut cmd = update::update(Event::Ota(OtaEvent::SubmitUrlResponse(Ok(()))), &mut model);

    assert_eq!(model.phase(), UpdatePhase::Polling);
    let attempt = model.attempt.as_ref().expect("attempt exists");
    assert!(attempt.submit_acknowledged);
    assert_eq!(attempt.poll_count, 0);
    assert_eq!(attempt.last_progress, 0);
    assert_eq!(
        model.success_message.as_deref(),
        Some("Update from URL started.")
    );

    // The armed timer fires as a poll tick for this attempt
    let mut timer_request = cmd
        .effects()
        .find_map(|effect| match effect {
            Effect::Timer(request) => Some(request),
            _ => None,
        })
        .expect("acceptance schedules the first poll");
    assert_eq!(
        timer_request.operation,
        TimerOperation::Delay {
            millis: model.policy.poll_interval_ms
        }
    );
    timer_request
        .resolve(TimerOutput::Elapsed)
        .expect("resolve poll delay");
    let tick = cmd.events().next().expect("tick event");
    assert_eq!(
        tick,
        Event::Ota(OtaEvent::PollTick {
            attempt: attempt.id
        })
    );
}

#[test]
fn test_url_submit_rejection_is_terminal() {
    let mut model = authenticated_model();
    let _ = update::update(
        Event::Ota(OtaEvent::SubmitUrl {
            url: "http://fw.example/firmware.bin".to_string(),
            started_at_ms: 1_000,
        }),
        &mut model,
    );

    let mut cmd = update::update(
        Event::Ota(OtaEvent::SubmitUrlResponse(Err(GatewayError::Status {
            code: 500,
            message: "Update from URL failed: HTTP 500 (Empty body)".to_string(),
        }))),
        &mut model,
    );

    assert_eq!(
        model.phase(),
        UpdatePhase::Failed(FailureReason::SubmitRejected)
    );
    assert_eq!(model.badge, StatusBadge::Error);
    assert!(!model.controls_locked);
    assert_eq!(
        model.error_message.as_deref(),
        Some("Update failed. Please check the URL.")
    );
    // Terminal: no further polling is scheduled
    assert_eq!(timer_effects(&mut cmd), 0);
}

#[test]
fn test_second_submission_is_refused_while_active() {
    let (mut model, id) = polling_model();

    let mut cmd = update::update(
        Event::Ota(OtaEvent::SubmitUrl {
            url: "http://fw.example/other.bin".to_string(),
            started_at_ms: 2_000,
        }),
        &mut model,
    );

    assert_eq!(
        model.error_message.as_deref(),
        Some("An update is already in progress.")
    );
    assert_eq!(model.attempt.as_ref().map(|a| a.id), Some(id));
    assert_eq!(model.phase(), UpdatePhase::Polling);
    assert_eq!(http_effects(&mut cmd), 0);
}

#[test]
fn test_progress_to_completion_succeeds_once() {
    let (mut model, id) = polling_model();

    for progress in [10, 40, 80] {
        let mut cmd = poll_ok(&mut model, id, progress);
        assert_eq!(model.phase(), UpdatePhase::Polling);
        assert_eq!(model.progress_percent, progress);
        assert_eq!(model.badge, StatusBadge::Updating);
        assert_eq!(timer_effects(&mut cmd), 1);
    }
    assert_eq!(model.attempt.as_ref().map(|a| a.poll_count), Some(3));

    let mut cmd = poll_ok(&mut model, id, 100);

    assert_eq!(model.phase(), UpdatePhase::Succeeded);
    assert_eq!(model.badge, StatusBadge::Success);
    assert_eq!(model.progress_percent, 100);
    assert_eq!(
        model.success_message.as_deref(),
        Some("Update successful. Restarting...")
    );
    // Exactly one timer: the delayed page reload, no further polls
    let effects = drain_effects(&mut cmd);
    assert_eq!(count_timers(&effects), 1);
    assert_eq!(count_http(&effects), 0);

    let _ = update::update(Event::Ota(OtaEvent::ReloadDue { attempt: id }), &mut model);
    assert!(model.reload_requested);
}

#[test]
fn test_poll_tick_issues_one_request_and_reschedules_after_response() {
    let (mut model, id) = polling_model();

    let mut cmd = update::update(Event::Ota(OtaEvent::PollTick { attempt: id }), &mut model);

    // One in-flight poll, and no timer until the response settles
    let mut effects = drain_effects(&mut cmd);
    assert_eq!(effects.len(), 1);
    let Effect::Http(request) = &mut effects[0] else {
        panic!("poll tick issues an HTTP request");
    };
    assert_eq!(request.operation.url, "https://relative/ota-progress");
    assert!(request
        .operation
        .headers
        .iter()
        .any(|header| header.name == "Authorization"));

    request
        .resolve(HttpResult::Ok(
            HttpResponse::ok().body(r#"{"progress":42}"#).build(),
        ))
        .expect("resolve progress poll");
    let response_event = cmd.events().next().expect("poll response event");
    assert_eq!(timer_effects(&mut cmd), 0);

    let mut next = update::update(response_event, &mut model);
    assert_eq!(model.progress_percent, 42);
    assert_eq!(timer_effects(&mut next), 1);
}

#[test]
fn test_poll_error_at_high_progress_resolves_to_success() {
    let (mut model, id) = polling_model();

    // Move past the early-reboot window so only the progress rule applies
    for progress in [10, 30, 50, 70, 85, 97] {
        let _ = poll_ok(&mut model, id, progress);
    }
    assert_eq!(model.attempt.as_ref().map(|a| a.last_progress), Some(97));

    let _ = poll_err(&mut model, id);

    assert_eq!(model.phase(), UpdatePhase::Succeeded);
    assert_eq!(model.progress_percent, 100);
}

#[test]
fn test_poll_error_right_after_submission_resolves_to_success() {
    // The device can accept the image and reboot before it ever reports
    // progress; an early poll error is that reboot, not a failure
    let (mut model, id) = polling_model();

    let _ = poll_err(&mut model, id);

    assert_eq!(model.phase(), UpdatePhase::Succeeded);
    assert_eq!(
        model.success_message.as_deref(),
        Some("Update successful. Restarting...")
    );
}

#[test]
fn test_consecutive_failures_end_in_connection_lost() {
    // The thresholds here (early window 5, progress 95, failure budget 10)
    // are tuned policy from the reference behavior, not derived limits
    let (mut model, id) = polling_model();

    for progress in [5, 10, 15, 20, 25, 30] {
        let _ = poll_ok(&mut model, id, progress);
    }

    for _ in 0..10 {
        let mut cmd = poll_err(&mut model, id);
        assert_eq!(model.phase(), UpdatePhase::Polling);
        assert_eq!(timer_effects(&mut cmd), 1);
    }

    let mut cmd = poll_err(&mut model, id);

    assert_eq!(
        model.phase(),
        UpdatePhase::Failed(FailureReason::ConnectionLost)
    );
    assert_eq!(model.badge, StatusBadge::Error);
    assert_eq!(model.progress_percent, 0);
    assert!(!model.controls_locked);
    assert_eq!(
        model.warning_message.as_deref(),
        Some("Connection lost. Device may be restarting; refresh manually.")
    );
    assert_eq!(model.error_message, None);
    assert_eq!(timer_effects(&mut cmd), 0);
}

#[test]
fn test_successful_poll_resets_the_failure_run() {
    let (mut model, id) = polling_model();

    for progress in [5, 10, 15, 20, 25, 30] {
        let _ = poll_ok(&mut model, id, progress);
    }
    for _ in 0..8 {
        let _ = poll_err(&mut model, id);
    }
    let _ = poll_ok(&mut model, id, 35);
    assert_eq!(
        model.attempt.as_ref().map(|a| a.consecutive_failures),
        Some(0)
    );

    // A fresh run of failures gets the full budget again
    for _ in 0..10 {
        let _ = poll_err(&mut model, id);
        assert_eq!(model.phase(), UpdatePhase::Polling);
    }
    let _ = poll_err(&mut model, id);
    assert_eq!(
        model.phase(),
        UpdatePhase::Failed(FailureReason::ConnectionLost)
    );
}

#[test]
fn test_poll_budget_exhaustion_times_out() {
    let (mut model, id) = polling_model();
    // The budget check does not care how the polls went, only how many ran
    model.attempt.as_mut().expect("attempt exists").poll_count =
        model.policy.max_poll_attempts;

    let mut cmd = update::update(Event::Ota(OtaEvent::PollTick { attempt: id }), &mut model);

    assert_eq!(model.phase(), UpdatePhase::Failed(FailureReason::Timeout));
    assert_eq!(model.badge, StatusBadge::Error);
    assert_eq!(model.progress_percent, 0);
    assert_eq!(
        model.error_message.as_deref(),
        Some("Update timeout. Please check device status.")
    );
    let effects = drain_effects(&mut cmd);
    assert_eq!(count_http(&effects), 0);
    assert_eq!(count_timers(&effects), 0);
}

#[test]
fn test_stale_poll_events_are_dropped() {
    let (mut model, id) = polling_model();
    let before = model.clone();

    // Wrong attempt id: a timer from a superseded attempt fired late
    let mut cmd = update::update(
        Event::Ota(OtaEvent::PollTick { attempt: id + 1 }),
        &mut model,
    );
    assert_eq!(cmd.effects().count(), 0);
    assert_eq!(model, before);

    // Terminal phase: responses still in flight when the attempt ended
    let _ = poll_ok(&mut model, id, 100);
    assert_eq!(model.phase(), UpdatePhase::Succeeded);
    let after_success = model.clone();
    let mut cmd = poll_err(&mut model, id);
    assert_eq!(cmd.effects().count(), 0);
    assert_eq!(model, after_success);
}

#[test]
fn test_poll_401_expires_session_and_ends_attempt() {
    let (mut model, id) = polling_model();

    let mut cmd = update::update(
        Event::Ota(OtaEvent::PollResponse {
            attempt: id,
            result: Err(GatewayError::AuthExpired),
        }),
        &mut model,
    );

    assert_eq!(
        model.phase(),
        UpdatePhase::Failed(FailureReason::AuthExpired)
    );
    assert!(!model.is_authenticated);
    assert_eq!(model.session.auth_header(), None);
    assert_eq!(
        model.error_message.as_deref(),
        Some("Authentication failed. Please login again.")
    );
    assert!(cmd.effects().any(|effect| matches!(
        effect,
        Effect::SessionStore(request)
            if matches!(request.operation, SessionStoreOperation::Clear { .. })
    )));

    // A later protected call finds no header to attach and refuses locally
    let mut status_cmd = update::update(Event::Status(StatusEvent::LoadDeviceStatus), &mut model);
    assert_eq!(http_effects(&mut status_cmd), 0);
    assert_eq!(
        model.error_message.as_deref(),
        Some("Load status failed: Not authenticated")
    );
}

#[test]
fn test_upload_flow_polls_after_acceptance() {
    let mut model = authenticated_model();

    let mut cmd = update::update(
        Event::Ota(OtaEvent::SubmitUpload {
            filename: "firmware.bin".to_string(),
            size_bytes: 2 * 1024 * 1024,
            started_at_ms: 1_000,
        }),
        &mut model,
    );

    assert_eq!(model.phase(), UpdatePhase::Submitting);
    let upload = cmd
        .effects()
        .find_map(|effect| match effect {
            Effect::Upload(request) => Some(request.operation.clone()),
            _ => None,
        })
        .expect("upload is dispatched to the shell");
    assert_eq!(
        upload,
        UploadOperation::Start {
            auth_header: format!("Basic {ADMIN_TOKEN}"),
        }
    );

    let _ = update::update(Event::Ota(OtaEvent::UploadProgress(40)), &mut model);
    assert_eq!(model.progress_percent, 40);

    let mut cmd = update::update(Event::Ota(OtaEvent::UploadFinished { status: 200 }), &mut model);
    assert_eq!(model.phase(), UpdatePhase::Polling);
    assert_eq!(model.progress_percent, 0);
    assert_eq!(timer_effects(&mut cmd), 1);
}

#[test]
fn test_upload_rejection_fails_attempt() {
    let mut model = authenticated_model();
    let _ = update::update(
        Event::Ota(OtaEvent::SubmitUpload {
            filename: "firmware.bin".to_string(),
            size_bytes: 1024,
            started_at_ms: 1_000,
        }),
        &mut model,
    );

    let _ = update::update(Event::Ota(OtaEvent::UploadFinished { status: 500 }), &mut model);

    assert_eq!(
        model.phase(),
        UpdatePhase::Failed(FailureReason::SubmitRejected)
    );
    assert_eq!(model.error_message.as_deref(), Some("Upload failed: HTTP 500"));
    assert!(!model.controls_locked);
}

#[test]
fn test_upload_connection_drop_counts_as_success() {
    let mut model = authenticated_model();
    let _ = update::update(
        Event::Ota(OtaEvent::SubmitUpload {
            filename: "firmware.bin".to_string(),
            size_bytes: 1024,
            started_at_ms: 1_000,
        }),
        &mut model,
    );

    let _ = update::update(
        Event::Ota(OtaEvent::UploadTransportFailed {
            error: "connection reset".to_string(),
        }),
        &mut model,
    );

    assert_eq!(model.phase(), UpdatePhase::Succeeded);
    assert_eq!(model.progress_percent, 100);
}

#[test]
fn test_upload_requires_authentication() {
    let mut model = Model::default();

    let mut cmd = update::update(
        Event::Ota(OtaEvent::SubmitUpload {
            filename: "firmware.bin".to_string(),
            size_bytes: 1024,
            started_at_ms: 1_000,
        }),
        &mut model,
    );

    assert_eq!(model.attempt, None);
    assert_eq!(
        model.error_message.as_deref(),
        Some("Upload failed: Not authenticated")
    );
    assert_eq!(cmd.effects().filter(|e| matches!(e, Effect::Upload(_))).count(), 0);
}

#[test]
fn test_reset_returns_to_idle_from_terminal() {
    let (mut model, id) = polling_model();
    let _ = poll_ok(&mut model, id, 100);
    assert!(model.phase().is_terminal());

    let _ = update::update(Event::Ota(OtaEvent::Reset), &mut model);

    assert_eq!(model.attempt, None);
    assert_eq!(model.phase(), UpdatePhase::Idle);
    assert_eq!(model.badge, StatusBadge::Idle);
    assert_eq!(model.progress_percent, 0);
    assert!(!model.controls_locked);
    assert!(!model.reload_requested);
    assert_eq!(model.success_message, None);
}

#[test]
fn test_reset_is_ignored_while_polling() {
    let (mut model, id) = polling_model();

    let _ = update::update(Event::Ota(OtaEvent::Reset), &mut model);

    assert_eq!(model.attempt.as_ref().map(|a| a.id), Some(id));
    assert_eq!(model.phase(), UpdatePhase::Polling);
}

#[test]
fn test_clear_error() {
    let app = AppTester::<App>::default();
    let mut model = Model {
        error_message: Some("Some error".to_string()),
        ..Default::default()
    };

    let _command = app.update(Event::Ui(UiEvent::ClearError), &mut model);

    assert_eq!(model.error_message, None);
}

#[test]
fn test_session_token_roundtrip() {
    let mut session = Session::default();
    assert_eq!(session.auth_header(), None);

    let token = session.set("admin", "1234");
    assert_eq!(token, ADMIN_TOKEN);
    assert_eq!(
        session.auth_header().as_deref(),
        Some("Basic YWRtaW46MTIzNA==")
    );

    session.clear();
    session.clear();
    assert!(!session.is_authenticated());
}

#[test]
fn test_format_uptime() {
    assert_eq!(format_uptime(42), "42s");
    assert_eq!(format_uptime(150), "2m 30s");
    assert_eq!(format_uptime(3 * 3600 + 25 * 60 + 10), "3h 25m 10s");
    assert_eq!(format_uptime(2 * 86400 + 3 * 3600 + 4 * 60), "2d 3h 4m");

    let status = DeviceStatus {
        version: "1.2.3".to_string(),
        uptime: 90,
    };
    assert_eq!(status.uptime_formatted(), "1m 30s");
}
