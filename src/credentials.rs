use std::env;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::TogglError;

pub const TOKEN_ENV: &str = "TOGGL_TOKEN";
const TOKEN_PASSWORD: &str = "api_token";

/// Holds the Authorization header derived from a Toggl API token.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    header: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("configured", &self.header.is_some())
            .finish()
    }
}

impl Credentials {
    /// Uses `token` when given, otherwise `TOGGL_TOKEN`. Missing both is logged, not fatal.
    pub fn new(token: Option<String>) -> Self {
        Self::from_sources(token, env::var(TOKEN_ENV).ok())
    }

    pub fn from_sources(explicit: Option<String>, from_env: Option<String>) -> Self {
        let token = [explicit, from_env]
            .into_iter()
            .flatten()
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());

        let mut credentials = Self::default();
        match token {
            Some(token) => {
                credentials.set(&token);
            }
            None => tracing::warn!("No API token given or found in {TOKEN_ENV}"),
        }
        credentials
    }

    pub fn set(&mut self, token: &str) -> &str {
        self.header.insert(basic_header(token))
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn require(&self) -> Result<&str, TogglError> {
        self.header().ok_or(TogglError::AuthenticationMissing)
    }

    pub fn is_configured(&self) -> bool {
        self.header.is_some()
    }
}

pub fn basic_header(token: &str) -> String {
    let encoded = STANDARD.encode(format!("{token}:{TOKEN_PASSWORD}"));
    format!("Basic {encoded}")
}
