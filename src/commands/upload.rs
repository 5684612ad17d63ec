//! Firmware upload command definitions.
//!
//! The staged firmware file never crosses the FFI boundary. The core hands
//! the shell the authorization header for the multipart POST to `/update`;
//! the shell streams `UploadProgress` events while the transfer runs and
//! resolves the request once, with the final HTTP status or a transport
//! error.

use crux_core::{capability::Operation, command, Command};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadOperation {
    Start { auth_header: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum UploadOutput {
    /// The request completed with this HTTP status.
    Completed { status: u16 },
    /// The connection dropped before a status arrived.
    TransportError { message: String },
}

impl Operation for UploadOperation {
    type Output = UploadOutput;
}

/// Command-based firmware upload API
pub struct FirmwareUpload<Effect, Event> {
    _effect: PhantomData<Effect>,
    _event: PhantomData<Event>,
}

impl<Effect, Event> FirmwareUpload<Effect, Event>
where
    Effect: Send + From<crux_core::Request<UploadOperation>> + 'static,
    Event: Send + 'static,
{
    /// Start the multipart upload of the staged firmware file
    pub fn start(auth_header: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(UploadOperation::Start {
            auth_header: auth_header.into(),
        })
    }
}

/// Request builder for upload operations
#[must_use]
pub struct RequestBuilder<Effect, Event> {
    operation: UploadOperation,
    _effect: PhantomData<Effect>,
    _event: PhantomData<fn() -> Event>,
}

impl<Effect, Event> RequestBuilder<Effect, Event>
where
    Effect: Send + From<crux_core::Request<UploadOperation>> + 'static,
    Event: Send + 'static,
{
    fn new(operation: UploadOperation) -> Self {
        Self {
            operation,
            _effect: PhantomData,
            _event: PhantomData,
        }
    }

    /// Build the request into a Command RequestBuilder
    pub fn build(
        self,
    ) -> command::RequestBuilder<Effect, Event, impl std::future::Future<Output = UploadOutput>>
    {
        command::RequestBuilder::new(move |ctx| async move {
            Command::request_from_shell(self.operation)
                .into_future(ctx)
                .await
        })
    }
}
