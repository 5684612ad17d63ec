//! HTTP helper functions for the Crux Core
//!
//! Every gateway response passes through these helpers, which is where the
//! error taxonomy is applied: 401 becomes `GatewayError::AuthExpired` before
//! any other classification, other non-2xx statuses become
//! `GatewayError::Status`, and transport failures become
//! `GatewayError::Network`.

use crux_http::Response;

use crate::types::GatewayError;

/// Base URL for device API endpoints.
///
/// NOTE: This is a dummy prefix required because `crux_http` requires
/// absolute URLs and rejects relative paths (`RelativeUrlWithoutBase`
/// error). The UI shell strips this prefix before sending requests via
/// `fetch()`, making them relative to the page origin. Using https:// to
/// prevent any potential mixed content warnings on HTTPS pages.
pub const BASE_URL: &str = "https://relative";

/// Constructs the full address from a given endpoint.
///
/// # Example
/// ```
/// use webota_ui_core::http_helpers::build_url;
/// let url = build_url("/ota-progress");
/// assert_eq!(url, "https://relative/ota-progress");
/// ```
pub fn build_url(endpoint: &str) -> String {
    format!("{BASE_URL}{endpoint}")
}

/// Returns `true` if the response status is 2xx.
pub fn is_response_success(response: &Response<Vec<u8>>) -> bool {
    response.status().is_success()
}

/// Classify a non-2xx response into a gateway error.
///
/// Any 401 is authentication expiry, regardless of which call triggered it.
pub fn classify_response_error(action: &str, response: &mut Response<Vec<u8>>) -> GatewayError {
    let code = u16::from(response.status());
    if code == 401 {
        return GatewayError::AuthExpired;
    }

    let message = match response.take_body() {
        Some(body) if body.is_empty() => format!("{action} failed: HTTP {code} (Empty body)"),
        Some(body) => match String::from_utf8(body) {
            Ok(msg) => format!("{action} failed: HTTP {code}: {msg}"),
            Err(e) => format!("{action} failed: HTTP {code} (Invalid UTF-8: {e})"),
        },
        None => format!("{action} failed: HTTP {code} (No body)"),
    };

    GatewayError::Status { code, message }
}

/// Parse JSON from response body.
///
/// Returns an error if the response is not successful or JSON parsing fails.
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    action: &str,
    response: &mut Response<Vec<u8>>,
) -> Result<T, GatewayError> {
    if !is_response_success(response) {
        return Err(classify_response_error(action, response));
    }

    match response.take_body() {
        Some(body) => serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Network(format!("{action}: JSON parse error: {e}"))),
        None => Err(GatewayError::Network(format!(
            "{action}: Empty response body"
        ))),
    }
}

/// Check response status only (no body parsing).
pub fn check_response_status(
    action: &str,
    response: &mut Response<Vec<u8>>,
) -> Result<(), GatewayError> {
    if is_response_success(response) {
        Ok(())
    } else {
        Err(classify_response_error(action, response))
    }
}

/// Map a transport-level failure from `crux_http` into a gateway error.
pub fn map_http_error(action: &str, error: crux_http::HttpError) -> GatewayError {
    GatewayError::Network(format!("{action} failed: {error}"))
}

/// Process an HTTP response result and check status only.
pub fn process_status_response(
    action: &str,
    result: crux_http::Result<Response<Vec<u8>>>,
) -> Result<(), GatewayError> {
    match result {
        Ok(mut response) => check_response_status(action, &mut response),
        Err(e) => Err(map_http_error(action, e)),
    }
}

/// Process an HTTP response result and parse JSON.
pub fn process_json_response<T: serde::de::DeserializeOwned>(
    action: &str,
    result: crux_http::Result<Response<Vec<u8>>>,
) -> Result<T, GatewayError> {
    match result {
        Ok(mut response) => parse_json_response(action, &mut response),
        Err(e) => Err(map_http_error(action, e)),
    }
}

/// Handle a protected request attempted with no stored credential.
///
/// The gateway refuses locally instead of sending a request that can only
/// come back 401.
pub fn handle_auth_error<M, E>(model: &mut M, action: &str) -> crux_core::Command<crate::Effect, E>
where
    M: crate::model::ModelErrorHandler,
    E: Send + 'static,
{
    model.set_error(format!("{action} failed: Not authenticated"));
    crux_core::render::render()
}

/// Handle a request creation error (e.g. body serialization failure).
pub fn handle_request_error<M, E>(
    model: &mut M,
    action: &str,
    error: impl std::fmt::Display,
) -> crux_core::Command<crate::Effect, E>
where
    M: crate::model::ModelErrorHandler,
    E: Send + 'static,
{
    model.set_error(format!("Failed to create {action} request: {error}"));
    crux_core::render::render()
}
