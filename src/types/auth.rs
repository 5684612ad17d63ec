use base64::prelude::*;

/// Key under which the shell keeps the credential token in session storage.
pub const AUTH_STORAGE_KEY: &str = "ota_auth";

/// The credential store: a single opaque Basic auth token for this browser
/// session.
///
/// Holding a token is a local claim only; whether the device still accepts
/// it is discovered through the gateway. The token never appears in the
/// serialized view model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    /// Derive and store the token for a credential pair, returning it so the
    /// caller can persist it once the credentials are confirmed.
    pub fn set(&mut self, username: &str, password: &str) -> String {
        let token = BASE64_STANDARD.encode(format!("{username}:{password}"));
        self.token = Some(token.clone());
        token
    }

    /// Adopt a token recovered from session storage.
    pub fn restore(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Drop the token. Idempotent.
    pub fn clear(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Ready-to-send `Authorization` value, if a token is stored.
    pub fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Basic {token}"))
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
