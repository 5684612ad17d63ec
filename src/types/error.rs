use std::fmt;

use serde::{Deserialize, Serialize};

/// How a request through the authenticated gateway can fail.
///
/// `AuthExpired` is special: it is the only signal by which credential
/// invalidation is detected, and callers must not retry it. Everything else
/// is either a terminal rejection (`Status`) or a transport failure
/// (`Network`) that the polling loop may absorb.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GatewayError {
    /// The device answered 401 on a protected call.
    AuthExpired,
    /// A non-2xx answer other than 401; `message` already carries context.
    Status { code: u16, message: String },
    /// The request never completed: connection refused, reset, or a
    /// protocol-level failure.
    Network(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthExpired => write!(f, "Authentication expired"),
            Self::Status { message, .. } => write!(f, "{message}"),
            Self::Network(message) => write!(f, "{message}"),
        }
    }
}
