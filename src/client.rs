use std::collections::BTreeSet;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::credentials::Credentials;
use crate::endpoints::{Endpoint, Endpoints};
use crate::error::TogglError;
use crate::executor::{DEFAULT_TIMEOUT, Executor, ReqwestTransport, Transport};
use crate::models::{Project, StartTimer, StopOutcome, TimeEntry, Workspace};

/// Tag and `created_with` value stamped on every entry this client creates.
pub const SOURCE_TAG: &str = "maya";

#[derive(Serialize)]
struct StartTimeEntryBody<'a> {
    time_entry: NewTimeEntry<'a>,
}

#[derive(Serialize)]
struct NewTimeEntry<'a> {
    description: &'a str,
    wid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<u64>,
    tags: BTreeSet<&'a str>,
    created_with: &'static str,
}

#[derive(Clone)]
pub struct TogglClient<T = ReqwestTransport> {
    credentials: Credentials,
    endpoints: Endpoints,
    executor: Executor<T>,
}

impl TogglClient {
    pub fn new(credentials: Credentials) -> Result<Self, TogglError> {
        Self::with_options(credentials, Endpoints::default(), DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        credentials: Credentials,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self, TogglError> {
        let transport = ReqwestTransport::new(timeout)?;
        Ok(Self::with_transport(credentials, endpoints, transport))
    }
}

impl<T: Transport> TogglClient<T> {
    pub fn with_transport(credentials: Credentials, endpoints: Endpoints, transport: T) -> Self {
        Self {
            credentials,
            endpoints,
            executor: Executor::new(transport),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn set_token(&mut self, token: &str) -> &str {
        self.credentials.set(token)
    }

    pub fn get_profile(&self) -> Result<Value, TogglError> {
        self.call(Endpoint::Profile, None).map(unwrap_data)
    }

    pub fn get_workspaces(&self) -> Result<Vec<Workspace>, TogglError> {
        decode_list(self.call(Endpoint::Workspaces, None)?)
    }

    /// First workspace whose name contains `name`. Substring match, not equality.
    pub fn get_workspace(&self, name: &str) -> Result<Option<Workspace>, TogglError> {
        let workspaces = self.get_workspaces()?;
        Ok(find_workspace(&workspaces, name).cloned())
    }

    pub fn get_projects(&self, workspace_id: u64) -> Result<Vec<Project>, TogglError> {
        decode_list(self.call(Endpoint::Projects { workspace_id }, None)?)
    }

    pub fn get_current_time_entry(&self) -> Result<Option<TimeEntry>, TogglError> {
        let data = unwrap_data(self.call(Endpoint::CurrentTimeEntry, None)?);
        if data.is_null() {
            return Ok(None);
        }
        decode(data).map(Some)
    }

    pub fn start_timer(&self, request: &StartTimer) -> Result<TimeEntry, TogglError> {
        request.validate()?;

        let mut tags: BTreeSet<&str> = request.tags.iter().map(|tag| tag.trim()).collect();
        tags.insert(SOURCE_TAG);
        let body = StartTimeEntryBody {
            time_entry: NewTimeEntry {
                description: request.description.trim(),
                wid: request.workspace_id,
                pid: request.project_id,
                tags,
                created_with: SOURCE_TAG,
            },
        };
        let body =
            serde_json::to_value(body).map_err(|err| TogglError::InvalidRequest(err.to_string()))?;

        let entry: TimeEntry = decode(unwrap_data(
            self.call(Endpoint::StartTimeEntry, Some(&body))?,
        ))?;
        tracing::info!(
            entry_id = entry.id,
            workspace_id = request.workspace_id,
            project_id = ?request.project_id,
            description = %request.description,
            "Timer started"
        );
        Ok(entry)
    }

    pub fn stop_timer(&self) -> Result<StopOutcome, TogglError> {
        let Some(current) = self.get_current_time_entry()? else {
            tracing::info!("No running timer to stop");
            return Ok(StopOutcome::NoActiveEntry);
        };

        let entry: TimeEntry = decode(unwrap_data(self.call(
            Endpoint::StopTimeEntry {
                entry_id: current.id,
            },
            None,
        )?))?;
        tracing::info!(entry_id = entry.id, duration = ?entry.duration, "Timer stopped");
        Ok(StopOutcome::Stopped(entry))
    }

    fn call(&self, endpoint: Endpoint, body: Option<&Value>) -> Result<Value, TogglError> {
        let url = self.endpoints.url(endpoint);
        self.executor
            .execute(&self.credentials, endpoint.method(), &url, body)
    }
}

pub fn find_workspace<'a>(workspaces: &'a [Workspace], name: &str) -> Option<&'a Workspace> {
    workspaces
        .iter()
        .find(|workspace| workspace.name.contains(name))
}

fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TogglError> {
    serde_json::from_value(value).map_err(|err| TogglError::Decode(err.to_string()))
}

fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, TogglError> {
    match unwrap_data(value) {
        Value::Null => Ok(Vec::new()),
        other => decode(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::ScriptedTransport;
    use crate::endpoints::Method;
    use serde_json::json;

    fn client(transport: &ScriptedTransport) -> TogglClient<ScriptedTransport> {
        TogglClient::with_transport(
            Credentials::from_sources(Some("token".to_string()), None),
            Endpoints::new("https://toggl.test/api/v8"),
            transport.clone(),
        )
    }

    fn running_entry(id: u64) -> Value {
        json!({
            "id": id,
            "wid": 1,
            "pid": 10,
            "description": "shot010",
            "tags": ["anim", "maya"],
            "start": "2026-02-03T09:00:00+00:00",
            "duration": -1770109200,
            "created_with": "maya"
        })
    }

    fn stopped_entry(id: u64) -> Value {
        json!({
            "id": id,
            "wid": 1,
            "description": "shot010",
            "start": "2026-02-03T09:00:00+00:00",
            "stop": "2026-02-03T10:00:00+00:00",
            "duration": 3600
        })
    }

    #[test]
    fn get_workspace_returns_first_substring_match() {
        let transport = ScriptedTransport::default();
        transport.respond_json(json!([
            {"id": 1, "name": "Acme Studio"},
            {"id": 2, "name": "Other"},
            {"id": 3, "name": "Studio B"}
        ]));

        let workspace = client(&transport).get_workspace("Studio").unwrap();
        assert_eq!(workspace.map(|ws| ws.id), Some(1));
        assert_eq!(
            transport.requests()[0].url,
            "https://toggl.test/api/v8/workspaces"
        );
    }

    #[test]
    fn get_workspace_without_match_is_none() {
        let transport = ScriptedTransport::default();
        transport.respond_json(json!([{"id": 2, "name": "Other"}]));

        assert_eq!(client(&transport).get_workspace("Studio").unwrap(), None);
    }

    #[test]
    fn listing_errors_surface_as_http_errors() {
        let transport = ScriptedTransport::default();
        transport.respond(403, r#"{"error":"invalid token"}"#);

        let err = client(&transport).get_workspaces().unwrap_err();
        assert_eq!(
            err,
            TogglError::Http {
                status: 403,
                body: r#"{"error":"invalid token"}"#.to_string()
            }
        );
    }

    #[test]
    fn projects_are_scoped_to_the_workspace() {
        let transport = ScriptedTransport::default();
        transport
            .respond_json(json!([{"id": 5, "name": "Feature", "wid": 42}]))
            .respond_json(Value::Null);

        let client = client(&transport);
        let projects = client.get_projects(42).unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].workspace_id, 42);
        assert!(client.get_projects(43).unwrap().is_empty());
        assert_eq!(
            transport.requests()[0].url,
            "https://toggl.test/api/v8/workspaces/42/projects"
        );
    }

    #[test]
    fn current_time_entry_distinguishes_none_from_running() {
        let transport = ScriptedTransport::default();
        transport
            .respond_json(json!({"data": null}))
            .respond_json(json!({"data": running_entry(9)}));

        let client = client(&transport);
        assert_eq!(client.get_current_time_entry().unwrap(), None);
        let entry = client.get_current_time_entry().unwrap().unwrap();
        assert_eq!(entry.id, 9);
        assert!(entry.is_running());
    }

    #[test]
    fn start_timer_injects_source_tag() {
        let transport = ScriptedTransport::default();
        transport.respond_json(json!({"data": running_entry(11)}));

        let request = StartTimer::new("shot010", 1)
            .with_project(Some(10))
            .with_tags(["anim"]);
        let entry = client(&transport).start_timer(&request).unwrap();
        assert_eq!(entry.id, 11);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(
            requests[0].url,
            "https://toggl.test/api/v8/time_entries/start"
        );
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "time_entry": {
                    "description": "shot010",
                    "wid": 1,
                    "pid": 10,
                    "tags": ["anim", "maya"],
                    "created_with": "maya"
                }
            })
        );
    }

    #[test]
    fn start_timer_without_tags_still_sends_source_tag() {
        let transport = ScriptedTransport::default();
        transport.respond_json(json!({"data": running_entry(12)}));

        client(&transport)
            .start_timer(&StartTimer::new("", 1))
            .unwrap();

        let body: Value =
            serde_json::from_str(transport.requests()[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["time_entry"]["tags"], json!(["maya"]));
        assert!(body["time_entry"].get("pid").is_none());
    }

    #[test]
    fn start_timer_rejects_invalid_request_without_calling_the_service() {
        let transport = ScriptedTransport::default();

        let err = client(&transport)
            .start_timer(&StartTimer::new("shot010", 0))
            .unwrap_err();
        assert!(matches!(err, TogglError::InvalidRequest(_)));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn stop_timer_without_running_entry_never_calls_stop() {
        let transport = ScriptedTransport::default();
        transport.respond_json(json!({"data": null}));

        let outcome = client(&transport).stop_timer().unwrap();
        assert_eq!(outcome, StopOutcome::NoActiveEntry);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.ends_with("/time_entries/current"));
    }

    #[test]
    fn stop_timer_stops_the_current_entry() {
        let transport = ScriptedTransport::default();
        transport
            .respond_json(json!({"data": running_entry(77)}))
            .respond_json(json!({"data": stopped_entry(77)}));

        let outcome = client(&transport).stop_timer().unwrap();
        let StopOutcome::Stopped(entry) = outcome else {
            panic!("expected a stopped entry");
        };
        assert_eq!(entry.duration, Some(3600));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, Method::Put);
        assert_eq!(
            requests[1].url,
            "https://toggl.test/api/v8/time_entries/77/stop"
        );
    }

    #[test]
    fn stop_timer_stops_entry_reported_without_duration() {
        let transport = ScriptedTransport::default();
        transport
            .respond_json(json!({"data": {
                "id": 9,
                "wid": 1,
                "description": "shot010",
                "start": "2026-02-03T09:00:00+00:00"
            }}))
            .respond_json(json!({"data": stopped_entry(9)}));

        let outcome = client(&transport).stop_timer().unwrap();
        assert!(matches!(outcome, StopOutcome::Stopped(ref entry) if entry.id == 9));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, Method::Put);
        assert_eq!(
            requests[1].url,
            "https://toggl.test/api/v8/time_entries/9/stop"
        );
    }

    #[test]
    fn stop_timer_propagates_lookup_failures() {
        let transport = ScriptedTransport::default();
        transport.fail(TogglError::Transport("timed out".to_string()));

        let err = client(&transport).stop_timer().unwrap_err();
        assert_eq!(err, TogglError::Transport("timed out".to_string()));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn profile_is_unwrapped_from_the_data_envelope() {
        let transport = ScriptedTransport::default();
        transport.respond_json(json!({"since": 1, "data": {"id": 3, "fullname": "Ada"}}));

        let profile = client(&transport).get_profile().unwrap();
        assert_eq!(profile["fullname"], "Ada");
    }

    #[test]
    fn set_token_changes_the_authorization_header() {
        let transport = ScriptedTransport::default();
        transport.respond_json(json!([]));

        let mut client = client(&transport);
        client.set_token("rotated");
        client.get_workspaces().unwrap();
        assert_eq!(
            transport.requests()[0].header("Authorization"),
            Some(crate::credentials::basic_header("rotated").as_str())
        );
    }
}
