use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TogglError {
    #[error("No API token configured")]
    AuthenticationMissing,
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Toggl API error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Failed to decode Toggl response: {0}")]
    Decode(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TogglError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TogglError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the service rejected the credentials, or none were configured.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TogglError::AuthenticationMissing)
            || matches!(self.status(), Some(401) | Some(403))
    }
}
