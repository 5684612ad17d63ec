use crux_core::Command;

use crate::auth_get;
use crate::events::{Event, StatusEvent};
use crate::model::Model;
use crate::types::{DeviceStatus, FirmwareVersion, GatewayError};
use crate::unauth_get;
use crate::update_field;
use crate::Effect;

/// Handle device status panel events
pub fn handle(event: StatusEvent, model: &mut Model) -> Command<Effect, Event> {
    match event {
        StatusEvent::LoadDeviceStatus => {
            auth_get!(Status, StatusEvent, model, "/status", DeviceStatusResponse, "Load status",
                expect_json: DeviceStatus)
        }

        StatusEvent::DeviceStatusResponse(Ok(status)) => {
            model.stop_loading();
            update_field!(model.device_status, Some(status))
        }

        StatusEvent::DeviceStatusResponse(Err(GatewayError::AuthExpired)) => {
            model.stop_loading();
            super::auth::expire_session(model)
        }

        StatusEvent::DeviceStatusResponse(Err(error)) => {
            model.set_error_and_render(error.to_string())
        }

        StatusEvent::LoadFirmwareVersion => {
            unauth_get!(Status, StatusEvent, "/version", FirmwareVersionResponse, "Load firmware version",
                expect_json: FirmwareVersion)
        }

        StatusEvent::FirmwareVersionResponse(Ok(version)) => {
            update_field!(model.firmware_version, Some(version))
        }

        StatusEvent::FirmwareVersionResponse(Err(error)) => {
            // The login screen shows a dash instead; not worth a user-facing
            // error
            log::warn!("Failed to load firmware version: {error}");
            Command::done()
        }
    }
}
