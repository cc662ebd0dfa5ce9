use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder};
use serde_json::Value;

use crate::credentials::Credentials;
use crate::endpoints::Method;
use crate::error::TogglError;

pub const USER_AGENT: &str = concat!("togglscene/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// A single blocking HTTP round trip.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TogglError>;
}

/// reqwest-backed transport. Certificates are always verified against the
/// built-in root store.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TogglError> {
        Self::from_builder(Client::builder(), timeout)
    }

    pub fn from_builder(builder: ClientBuilder, timeout: Duration) -> Result<Self, TogglError> {
        let client = builder
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| TogglError::Transport(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TogglError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self.client.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .map_err(|err| TogglError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| TogglError::Transport(err.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

#[derive(Clone)]
pub struct Executor<T = ReqwestTransport> {
    transport: T,
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn execute(
        &self,
        credentials: &Credentials,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, TogglError> {
        let authorization = credentials.require()?;
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| TogglError::InvalidRequest(err.to_string()))?;

        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers: vec![
                ("Authorization", authorization.to_string()),
                ("Accept", "application/json".to_string()),
                ("Content-Type", "application/json".to_string()),
                ("User-Agent", USER_AGENT.to_string()),
            ],
            body,
        };

        tracing::debug!(%method, url, "Sending Toggl request");
        let response = self.transport.send(&request).inspect_err(|err| {
            tracing::debug!(%method, url, error = %err, "Toggl request failed");
        })?;
        tracing::debug!(%method, url, status = response.status, "Toggl response");

        decode_response(response)
    }
}

fn decode_response(response: HttpResponse) -> Result<Value, TogglError> {
    if !(200..300).contains(&response.status) {
        return Err(TogglError::Http {
            status: response.status,
            body: response.body,
        });
    }

    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&response.body).map_err(|err| TogglError::Decode(err.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;

    /// Replays queued responses in order and records every request it sees.
    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        responses: Rc<RefCell<VecDeque<Result<HttpResponse, TogglError>>>>,
        requests: Rc<RefCell<Vec<HttpRequest>>>,
    }

    impl ScriptedTransport {
        pub fn respond(&self, status: u16, body: impl Into<String>) -> &Self {
            self.responses.borrow_mut().push_back(Ok(HttpResponse {
                status,
                body: body.into(),
            }));
            self
        }

        pub fn respond_json(&self, body: Value) -> &Self {
            self.respond(200, body.to_string())
        }

        pub fn fail(&self, err: TogglError) -> &Self {
            self.responses.borrow_mut().push_back(Err(err));
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.borrow().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TogglError> {
            self.requests.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected request to {}", request.url))
        }
    }
}
