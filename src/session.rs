use std::collections::BTreeSet;

use crate::client::{TogglClient, find_workspace};
use crate::error::TogglError;
use crate::executor::{ReqwestTransport, Transport};
use crate::models::{Project, StartTimer, StopOutcome, TimeEntry, Workspace};
use crate::selection::SelectionStore;

/// Workspace/project choice for one front end, backed by the client and the
/// persisted last selection.
pub struct Session<T = ReqwestTransport> {
    client: TogglClient<T>,
    store: SelectionStore,
    workspaces: Vec<Workspace>,
    projects: Vec<Project>,
    workspace: Option<usize>,
    project: Option<usize>,
}

impl<T: Transport> Session<T> {
    pub fn new(client: TogglClient<T>, store: SelectionStore) -> Self {
        Self {
            client,
            store,
            workspaces: Vec::new(),
            projects: Vec::new(),
            workspace: None,
            project: None,
        }
    }

    pub fn client(&self) -> &TogglClient<T> {
        &self.client
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn workspace_index(&self) -> Option<usize> {
        self.workspace
    }

    pub fn project_index(&self) -> Option<usize> {
        self.project
    }

    pub fn selected_workspace(&self) -> Option<&Workspace> {
        self.workspace.and_then(|index| self.workspaces.get(index))
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.project.and_then(|index| self.projects.get(index))
    }

    /// Fetches workspaces and projects, restoring the saved names when they still exist.
    pub fn load(&mut self) -> Result<(), TogglError> {
        self.workspaces = self.client.get_workspaces()?;
        let saved = match self.store.load() {
            Ok(saved) => saved,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read last selection");
                None
            }
        };

        self.workspace = saved
            .as_ref()
            .and_then(|saved| position_by_name(&self.workspaces, &saved.workspace, |ws| &ws.name))
            .or_else(|| first_index(self.workspaces.len()));
        self.refresh_projects()?;

        if let Some(saved) = saved {
            if let Some(index) = position_by_name(&self.projects, &saved.project, |p| &p.name) {
                self.project = Some(index);
            }
        }
        Ok(())
    }

    pub fn select_workspace(&mut self, index: usize) -> Result<(), TogglError> {
        if index >= self.workspaces.len() {
            return Err(TogglError::InvalidRequest(format!(
                "no workspace at position {index}"
            )));
        }
        if self.workspace != Some(index) {
            self.workspace = Some(index);
            self.refresh_projects()?;
        }
        self.persist();
        Ok(())
    }

    pub fn select_project(&mut self, index: usize) -> Result<(), TogglError> {
        if index >= self.projects.len() {
            return Err(TogglError::InvalidRequest(format!(
                "no project at position {index}"
            )));
        }
        self.project = Some(index);
        self.persist();
        Ok(())
    }

    /// Exact name first, then the first workspace containing `name`.
    pub fn select_workspace_named(&mut self, name: &str) -> Result<(), TogglError> {
        let index = position_by_name(&self.workspaces, name, |ws| &ws.name)
            .or_else(|| {
                find_workspace(&self.workspaces, name)
                    .and_then(|found| self.workspaces.iter().position(|ws| ws.id == found.id))
            })
            .ok_or_else(|| TogglError::InvalidRequest(format!("no workspace matches {name:?}")))?;
        self.select_workspace(index)
    }

    pub fn select_project_named(&mut self, name: &str) -> Result<(), TogglError> {
        let index = position_by_name(&self.projects, name, |p| &p.name)
            .or_else(|| self.projects.iter().position(|p| p.name.contains(name)))
            .ok_or_else(|| TogglError::InvalidRequest(format!("no project matches {name:?}")))?;
        self.select_project(index)
    }

    pub fn start(
        &self,
        description: &str,
        tags: &BTreeSet<String>,
    ) -> Result<TimeEntry, TogglError> {
        let workspace = self.selected_workspace().ok_or_else(|| {
            TogglError::InvalidRequest("select a workspace before starting a timer".to_string())
        })?;
        let request = StartTimer::new(description, workspace.id)
            .with_project(self.selected_project().map(|project| project.id))
            .with_tags(tags.iter().cloned());
        self.client.start_timer(&request)
    }

    pub fn stop(&self) -> Result<StopOutcome, TogglError> {
        self.client.stop_timer()
    }

    pub fn current(&self) -> Result<Option<TimeEntry>, TogglError> {
        self.client.get_current_time_entry()
    }

    fn refresh_projects(&mut self) -> Result<(), TogglError> {
        self.projects = match self.selected_workspace() {
            Some(workspace) => self.client.get_projects(workspace.id)?,
            None => Vec::new(),
        };
        self.project = first_index(self.projects.len());
        Ok(())
    }

    fn persist(&self) {
        let Some(workspace) = self.selected_workspace() else {
            return;
        };
        let project = self
            .selected_project()
            .map(|project| project.name.as_str())
            .unwrap_or_default();
        if let Err(err) = self.store.save(&workspace.name, project) {
            tracing::warn!(error = %err, "Failed to save selection");
        }
    }
}

fn position_by_name<I>(items: &[I], name: &str, key: impl Fn(&I) -> &String) -> Option<usize> {
    items.iter().position(|item| key(item) == name)
}

fn first_index(len: usize) -> Option<usize> {
    (len > 0).then_some(0)
}
