use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TogglError;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Workspace {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(rename = "wid", alias = "workspace_id")]
    pub workspace_id: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TimeEntry {
    pub id: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "wid", alias = "workspace_id")]
    pub workspace_id: u64,
    #[serde(rename = "pid", alias = "project_id", default)]
    pub project_id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeSet<String>,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub stop: Option<DateTime<Utc>>,
    /// Seconds; negative or absent while the entry is running.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub created_with: Option<String>,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.stop.is_none() && self.duration.is_none_or(|duration| duration < 0)
    }

    pub fn label(&self) -> &str {
        match self.description.as_deref() {
            Some(description) if !description.trim().is_empty() => description,
            _ => "(no description)",
        }
    }

    /// Elapsed seconds, measured against `now` while the entry is running.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        if self.is_running() {
            return (now - self.start).num_seconds().max(0);
        }
        match (self.duration, self.stop) {
            (Some(duration), _) if duration >= 0 => duration,
            (_, Some(stop)) => (stop - self.start).num_seconds().max(0),
            _ => 0,
        }
    }
}

/// Parameters for a new time entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartTimer {
    pub description: String,
    pub workspace_id: u64,
    pub project_id: Option<u64>,
    pub tags: BTreeSet<String>,
}

impl StartTimer {
    pub fn new(description: impl Into<String>, workspace_id: u64) -> Self {
        Self {
            description: description.into(),
            workspace_id,
            ..Self::default()
        }
    }

    pub fn with_project(mut self, project_id: Option<u64>) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn validate(&self) -> Result<(), TogglError> {
        if self.workspace_id == 0 {
            return Err(TogglError::InvalidRequest(
                "a workspace is required to start a timer".to_string(),
            ));
        }
        if self.project_id == Some(0) {
            return Err(TogglError::InvalidRequest(
                "project id must be positive".to_string(),
            ));
        }
        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            return Err(TogglError::InvalidRequest(
                "tags must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    Stopped(TimeEntry),
    NoActiveEntry,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn time_entry_accepts_short_and_long_field_names() {
        let short: TimeEntry = serde_json::from_value(json!({
            "id": 7,
            "wid": 1,
            "pid": 2,
            "description": "shot010",
            "tags": ["anim"],
            "start": "2026-02-03T09:00:00+00:00",
            "duration": -1770109200
        }))
        .unwrap();
        let long: TimeEntry = serde_json::from_value(json!({
            "id": 7,
            "workspace_id": 1,
            "project_id": 2,
            "description": "shot010",
            "tags": null,
            "start": "2026-02-03T09:00:00Z",
            "duration": -1770109200
        }))
        .unwrap();

        assert_eq!(short.workspace_id, long.workspace_id);
        assert_eq!(short.project_id, Some(2));
        assert_eq!(long.project_id, Some(2));
        assert!(long.tags.is_empty());
        assert!(short.is_running());
    }

    #[test]
    fn elapsed_seconds_uses_now_for_running_entries() {
        let start = Utc.with_ymd_and_hms(2026, 2, 3, 9, 0, 0).unwrap();
        let entry = TimeEntry {
            id: 1,
            description: None,
            workspace_id: 1,
            project_id: None,
            tags: BTreeSet::new(),
            start,
            stop: None,
            duration: Some(-start.timestamp()),
            created_with: None,
        };
        let now = Utc.with_ymd_and_hms(2026, 2, 3, 9, 30, 0).unwrap();
        assert_eq!(entry.elapsed_seconds(now), 1800);
        assert_eq!(entry.label(), "(no description)");
    }

    #[test]
    fn entry_without_duration_is_running_until_stopped() {
        let mut entry: TimeEntry = serde_json::from_value(json!({
            "id": 9,
            "wid": 1,
            "description": "shot010",
            "start": "2026-02-03T09:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(entry.duration, None);
        assert!(entry.is_running());

        entry.stop = Some(Utc.with_ymd_and_hms(2026, 2, 3, 9, 45, 0).unwrap());
        assert!(!entry.is_running());
        assert_eq!(entry.elapsed_seconds(Utc::now()), 2700);
    }

    #[test]
    fn start_timer_requires_workspace() {
        let err = StartTimer::new("shot010", 0).validate().unwrap_err();
        assert!(matches!(err, TogglError::InvalidRequest(_)));
    }

    #[test]
    fn start_timer_rejects_blank_tags() {
        let request = StartTimer::new("shot010", 1).with_tags(["anim", "  "]);
        assert!(request.validate().is_err());

        let request = StartTimer::new("shot010", 1)
            .with_project(Some(5))
            .with_tags(["anim"]);
        assert!(request.validate().is_ok());
    }
}
