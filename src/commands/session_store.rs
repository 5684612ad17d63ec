//! Session storage command definitions.
//!
//! The credential token lives in the browser's per-session storage so it
//! survives page reloads but not the end of the browser session. The shell
//! owns the storage; the core only issues save/load/clear requests for the
//! fixed key.

use crux_core::{capability::Operation, command, Command};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

// Operations the shell needs to perform on session storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStoreOperation {
    Save { key: String, value: String },
    Load { key: String },
    Clear { key: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStoreOutput {
    /// Save and Clear acknowledge without data.
    Done,
    /// Load answers with the stored value, if any.
    Token(Option<String>),
}

impl Operation for SessionStoreOperation {
    type Output = SessionStoreOutput;
}

/// Command-based session storage API
pub struct SessionStore<Effect, Event> {
    _effect: PhantomData<Effect>,
    _event: PhantomData<Event>,
}

impl<Effect, Event> SessionStore<Effect, Event>
where
    Effect: Send + From<crux_core::Request<SessionStoreOperation>> + 'static,
    Event: Send + 'static,
{
    pub fn save(key: impl Into<String>, value: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(SessionStoreOperation::Save {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn load(key: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(SessionStoreOperation::Load { key: key.into() })
    }

    pub fn clear(key: impl Into<String>) -> RequestBuilder<Effect, Event> {
        RequestBuilder::new(SessionStoreOperation::Clear { key: key.into() })
    }
}

/// Request builder for session storage operations
#[must_use]
pub struct RequestBuilder<Effect, Event> {
    operation: SessionStoreOperation,
    _effect: PhantomData<Effect>,
    _event: PhantomData<fn() -> Event>,
}

impl<Effect, Event> RequestBuilder<Effect, Event>
where
    Effect: Send + From<crux_core::Request<SessionStoreOperation>> + 'static,
    Event: Send + 'static,
{
    fn new(operation: SessionStoreOperation) -> Self {
        Self {
            operation,
            _effect: PhantomData,
            _event: PhantomData,
        }
    }

    /// Build the request into a Command RequestBuilder
    pub fn build(
        self,
    ) -> command::RequestBuilder<
        Effect,
        Event,
        impl std::future::Future<Output = SessionStoreOutput>,
    > {
        command::RequestBuilder::new(move |ctx| async move {
            Command::request_from_shell(self.operation)
                .into_future(ctx)
                .await
        })
    }
}
