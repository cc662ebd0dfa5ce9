use std::fmt;

pub const DEFAULT_API_URL: &str = "https://api.track.toggl.com/api/v8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Profile,
    Workspaces,
    Projects { workspace_id: u64 },
    CurrentTimeEntry,
    StartTimeEntry,
    StopTimeEntry { entry_id: u64 },
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Profile => "/me".to_string(),
            Endpoint::Workspaces => "/workspaces".to_string(),
            Endpoint::Projects { workspace_id } => format!("/workspaces/{workspace_id}/projects"),
            Endpoint::CurrentTimeEntry => "/time_entries/current".to_string(),
            Endpoint::StartTimeEntry => "/time_entries/start".to_string(),
            Endpoint::StopTimeEntry { entry_id } => format!("/time_entries/{entry_id}/stop"),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::StartTimeEntry => Method::Post,
            Endpoint::StopTimeEntry { .. } => Method::Put,
            _ => Method::Get,
        }
    }
}

/// Resolves endpoints against a fixed API root such as `https://host/api/v8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, endpoint: Endpoint) -> String {
        let path = endpoint.path();
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }
}
