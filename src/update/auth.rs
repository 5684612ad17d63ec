use crux_core::{render::render, Command};

use crate::auth_get;
use crate::events::{AuthEvent, Event};
use crate::model::Model;
use crate::types::{DeviceStatus, AUTH_STORAGE_KEY};
use crate::{Effect, SessionStoreCmd};

/// Handle authentication-related events
pub fn handle(event: AuthEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        AuthEvent::Login { username, password } => {
            model.clear_messages();
            model.session.set(&username, &password);
            // The token is held provisionally; it is persisted only once the
            // probe confirms the device accepts it
            auth_get!(Auth, AuthEvent, model, "/status", LoginProbeResponse, "Login",
                expect_json: DeviceStatus)
        }

        AuthEvent::LoginProbeResponse(Ok(status)) => {
            model.stop_loading();
            model.is_authenticated = true;
            model.device_status = Some(status);
            match model.session.token() {
                Some(token) => {
                    let save = SessionStoreCmd::save(AUTH_STORAGE_KEY, token.to_string())
                        .build()
                        .then_send(|_| Event::Auth(AuthEvent::SessionPersisted));
                    Command::all([render(), save])
                }
                None => render(),
            }
        }

        AuthEvent::LoginProbeResponse(Err(_)) => {
            model.stop_loading();
            model.invalidate_session();
            model.set_error("Invalid username or password.".to_string());
            render()
        }

        AuthEvent::Logout => {
            model.invalidate_session();
            model.clear_messages();
            model.device_status = None;
            Command::all([render(), clear_stored_token()])
        }

        AuthEvent::SessionRestored(Some(token)) => {
            model.session.restore(token);
            auth_get!(Auth, AuthEvent, model, "/status", RestoreProbeResponse, "Restore session",
                expect_json: DeviceStatus, silent)
        }

        AuthEvent::SessionRestored(None) => Command::done(),

        AuthEvent::RestoreProbeResponse(Ok(status)) => {
            model.is_authenticated = true;
            model.device_status = Some(status);
            render()
        }

        AuthEvent::RestoreProbeResponse(Err(error)) => {
            // The stored token is no longer good; drop it quietly, the user
            // simply sees the login screen
            log::info!("Session restore failed: {error}");
            model.invalidate_session();
            Command::all([render(), clear_stored_token()])
        }

        AuthEvent::SessionPersisted => Command::done(),
    }
}

/// Shared 401 path: clear the credential store (model and storage), switch
/// to the login view and report once. Callers must not retry.
pub(super) fn expire_session(model: &mut Model) -> Command<Effect, Event> {
    model.invalidate_session();
    model.set_error("Authentication failed. Please login again.".to_string());
    Command::all([render(), clear_stored_token()])
}

fn clear_stored_token() -> Command<Effect, Event> {
    SessionStoreCmd::clear(AUTH_STORAGE_KEY)
        .build()
        .then_send(|_| Event::Auth(AuthEvent::SessionPersisted))
}
