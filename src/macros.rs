/// Macro for model field updates with automatic rendering.
/// Supports both single and multiple field updates.
///
/// # Examples
///
/// Single field update:
/// ```ignore
/// update_field!(model.device_status, Some(status))
/// ```
///
/// Multiple field updates:
/// ```ignore
/// update_field!(
///     model.progress_percent, 0;
///     model.error_message, None
/// )
/// ```
#[macro_export]
macro_rules! update_field {
    // Multiple field updates (must come first to match the pattern)
    ($($model_field:expr, $value:expr);+ $(;)?) => {{
        let mut changed = false;
        $(
            let value = $value;
            if $model_field != value {
                $model_field = value;
                changed = true;
            }
        )+
        if changed {
            crux_core::render::render()
        } else {
            crux_core::Command::done()
        }
    }};

    // Single field update
    ($model_field:expr, $value:expr) => {{
        update_field!($model_field, $value;)
    }};
}

/// Macro for authenticated GET requests expecting a JSON response.
///
/// Attaches the stored `Authorization` header, or refuses locally when no
/// credential is stored. Responses are classified by the gateway helpers,
/// so a 401 always surfaces as `GatewayError::AuthExpired`.
///
/// NOTE: URLs are prefixed with `https://relative`.
/// `crux_http` requires absolute URLs and rejects relative paths.
/// The UI shell strips this prefix before sending requests.
///
/// # Patterns
///
/// Pattern 1: GET with loading state (user-visible action)
/// ```ignore
/// auth_get!(Status, StatusEvent, model, "/status", DeviceStatusResponse, "Load status",
///     expect_json: DeviceStatus)
/// ```
///
/// Pattern 2: Silent GET (background probe, no loading state)
/// ```ignore
/// auth_get!(Auth, AuthEvent, model, "/status", RestoreProbeResponse, "Restore session",
///     expect_json: DeviceStatus, silent)
/// ```
#[macro_export]
macro_rules! auth_get {
    // Pattern 1: GET with loading state
    ($domain:ident, $domain_event:ident, $model:expr, $endpoint:expr, $response_event:ident, $action:expr, expect_json: $response_type:ty) => {{
        if let Some(header) = $model.session.auth_header() {
            $model.start_loading();
            crux_core::Command::all([
                crux_core::render::render(),
                $crate::HttpCmd::get($crate::build_url($endpoint))
                    .header("Authorization", header)
                    .build()
                    .then_send(|result| {
                        let event_result: Result<$response_type, $crate::GatewayError> =
                            $crate::process_json_response($action, result);
                        $crate::events::Event::$domain(
                            $crate::events::$domain_event::$response_event(event_result),
                        )
                    }),
            ])
        } else {
            $crate::handle_auth_error($model, $action)
        }
    }};

    // Pattern 2: Silent GET, no loading state
    ($domain:ident, $domain_event:ident, $model:expr, $endpoint:expr, $response_event:ident, $action:expr, expect_json: $response_type:ty, silent) => {{
        if let Some(header) = $model.session.auth_header() {
            $crate::HttpCmd::get($crate::build_url($endpoint))
                .header("Authorization", header)
                .build()
                .then_send(|result| {
                    let event_result: Result<$response_type, $crate::GatewayError> =
                        $crate::process_json_response($action, result);
                    $crate::events::Event::$domain(
                        $crate::events::$domain_event::$response_event(event_result),
                    )
                })
        } else {
            $crate::handle_auth_error($model, $action)
        }
    }};
}

/// Macro for unauthenticated GET requests expecting a JSON response.
///
/// Used for the public endpoints shown on the login screen; no loading
/// state, failures are the caller's problem.
///
/// # Example
/// ```ignore
/// unauth_get!(Status, StatusEvent, "/version", FirmwareVersionResponse, "Load firmware version",
///     expect_json: FirmwareVersion)
/// ```
#[macro_export]
macro_rules! unauth_get {
    ($domain:ident, $domain_event:ident, $endpoint:expr, $response_event:ident, $action:expr, expect_json: $response_type:ty) => {{
        $crate::HttpCmd::get($crate::build_url($endpoint))
            .build()
            .then_send(|result| {
                let event_result: Result<$response_type, $crate::GatewayError> =
                    $crate::process_json_response($action, result);
                $crate::events::Event::$domain($crate::events::$domain_event::$response_event(
                    event_result,
                ))
            })
    }};
}

/// Macro for authenticated POST requests with a form-encoded body expecting
/// a status-only response.
///
/// # Example
/// ```ignore
/// auth_post_form!(Ota, OtaEvent, model, "/update-url", SubmitUrlResponse, "Update from URL",
///     form: &UrlUpdateRequest { url })
/// ```
#[macro_export]
macro_rules! auth_post_form {
    ($domain:ident, $domain_event:ident, $model:expr, $endpoint:expr, $response_event:ident, $action:expr, form: $body:expr) => {{
        if let Some(header) = $model.session.auth_header() {
            match $crate::HttpCmd::post($crate::build_url($endpoint))
                .header("Authorization", header)
                .body_form($body)
            {
                Ok(builder) => builder.build().then_send(|result| {
                    let event_result = $crate::process_status_response($action, result);
                    $crate::events::Event::$domain(
                        $crate::events::$domain_event::$response_event(event_result),
                    )
                }),
                Err(e) => $crate::handle_request_error($model, $action, e),
            }
        } else {
            $crate::handle_auth_error($model, $action)
        }
    }};
}
