mod auth;
mod ota;
mod status;
mod ui;

use crux_core::Command;

use crate::commands::session_store::SessionStoreOutput;
use crate::events::{AuthEvent, Event};
use crate::model::Model;
use crate::types::{FirmwareVersion, AUTH_STORAGE_KEY};
use crate::unauth_get;
use crate::{Effect, SessionStoreCmd};

/// Main update dispatcher - routes events to domain-specific handlers
pub fn update(event: Event, model: &mut Model) -> Command<Effect, Event> {
    match event {
        Event::Initialize => initialize(),
        Event::Auth(event) => auth::handle(event, model),
        Event::Ota(event) => ota::handle(event, model),
        Event::Status(event) => status::handle(event, model),
        Event::Ui(event) => ui::handle(event, model),
    }
}

/// Boot sequence: fetch the advertised firmware version for the login
/// screen and try to recover a credential token from session storage.
fn initialize() -> Command<Effect, Event> {
    Command::all([
        unauth_get!(Status, StatusEvent, "/version", FirmwareVersionResponse, "Load firmware version",
            expect_json: FirmwareVersion),
        SessionStoreCmd::load(AUTH_STORAGE_KEY)
            .build()
            .then_send(|output| {
                let token = match output {
                    SessionStoreOutput::Token(token) => token,
                    SessionStoreOutput::Done => None,
                };
                Event::Auth(AuthEvent::SessionRestored(token))
            }),
    ])
}
