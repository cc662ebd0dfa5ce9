use std::path::PathBuf;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;

use crate::error::TogglError;
use crate::executor::{ReqwestTransport, Transport};
use crate::models::{StopOutcome, TimeEntry};
use crate::naming;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Description,
    Workspaces,
    Projects,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Description => Focus::Workspaces,
            Focus::Workspaces => Focus::Projects,
            Focus::Projects => Focus::Description,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Description => Focus::Projects,
            Focus::Workspaces => Focus::Description,
            Focus::Projects => Focus::Workspaces,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub is_error: bool,
}

/// "Start timer" panel state: description, workspace and project pickers.
pub struct Panel<T = ReqwestTransport> {
    pub should_quit: bool,
    pub needs_refresh: bool,
    pub mode: Mode,
    pub focus: Focus,
    pub description: String,
    pub status: Option<Status>,
    pub current: Option<TimeEntry>,
    pub workspace_state: ListState,
    pub project_state: ListState,
    pub last_refresh: Option<DateTime<Local>>,
    scene: Option<PathBuf>,
    separator: String,
    session: Session<T>,
    exit_message: Option<String>,
}

impl<T: Transport> Panel<T> {
    pub fn new(session: Session<T>, scene: Option<PathBuf>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        let description = naming::description_from_filename(scene.as_deref(), &separator);
        Panel {
            should_quit: false,
            needs_refresh: true,
            mode: Mode::Loading,
            focus: Focus::Description,
            description,
            status: None,
            current: None,
            workspace_state: ListState::default(),
            project_state: ListState::default(),
            last_refresh: None,
            scene,
            separator,
            session,
            exit_message: None,
        }
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn take_exit_message(&mut self) -> Option<String> {
        self.exit_message.take()
    }

    pub fn refresh_data(&mut self) {
        self.needs_refresh = false;

        if let Err(err) = self.session.load() {
            self.handle_error(err);
            return;
        }
        match self.session.current() {
            Ok(current) => self.current = current,
            Err(err) => {
                self.handle_error(err);
                return;
            }
        }

        self.sync_list_states();
        self.last_refresh = Some(Local::now());
        self.mode = Mode::Ready;
        if self.session.workspaces().is_empty() {
            self.set_status("No workspaces found.", true);
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('r') if ctrl => {
                self.trigger_refresh();
                return;
            }
            _ => {}
        }

        if self.mode != Mode::Ready {
            return;
        }

        match key.code {
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Enter => self.start_timer(),
            KeyCode::Char('s') if ctrl => self.stop_timer(),
            KeyCode::Char('f') if ctrl => self.fill_description(),
            _ => match self.focus {
                Focus::Description => self.handle_description_input(key),
                Focus::Workspaces => self.handle_workspace_input(key),
                Focus::Projects => self.handle_project_input(key),
            },
        }
    }

    pub fn fill_description(&mut self) {
        self.description = naming::description_from_filename(self.scene.as_deref(), &self.separator);
    }

    pub fn start_timer(&mut self) {
        let tags = naming::tags_from_filename(self.scene.as_deref(), &self.separator);
        let description = self.description.trim().to_string();
        match self.session.start(&description, &tags) {
            Ok(entry) => {
                let workspace = self
                    .session
                    .selected_workspace()
                    .map(|workspace| workspace.name.clone())
                    .unwrap_or_default();
                self.exit_message = Some(format!(
                    "Timer started: {} ({workspace})",
                    entry.label()
                ));
                self.current = Some(entry);
                self.should_quit = true;
            }
            Err(err) => self.handle_error(err),
        }
    }

    pub fn stop_timer(&mut self) {
        match self.session.stop() {
            Ok(StopOutcome::Stopped(entry)) => {
                self.set_status(format!("Stopped: {}", entry.label()), false);
                self.current = None;
            }
            Ok(StopOutcome::NoActiveEntry) => {
                self.set_status("No timer running.", false);
                self.current = None;
            }
            Err(err) => self.handle_error(err),
        }
    }

    fn trigger_refresh(&mut self) {
        self.mode = Mode::Loading;
        self.needs_refresh = true;
        self.status = None;
    }

    fn handle_description_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Backspace => {
                self.description.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() && !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.description.push(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_workspace_input(&mut self, key: KeyEvent) {
        let len = self.session.workspaces().len();
        let Some(index) = step(self.session.workspace_index(), len, key.code) else {
            return;
        };
        if let Err(err) = self.session.select_workspace(index) {
            self.handle_error(err);
            return;
        }
        self.sync_list_states();
    }

    fn handle_project_input(&mut self, key: KeyEvent) {
        let len = self.session.projects().len();
        let Some(index) = step(self.session.project_index(), len, key.code) else {
            return;
        };
        if let Err(err) = self.session.select_project(index) {
            self.handle_error(err);
            return;
        }
        self.sync_list_states();
    }

    fn sync_list_states(&mut self) {
        self.workspace_state.select(self.session.workspace_index());
        self.project_state.select(self.session.project_index());
    }

    fn set_status(&mut self, message: impl Into<String>, is_error: bool) {
        self.status = Some(Status {
            message: message.into(),
            is_error,
        });
    }

    fn handle_error(&mut self, err: TogglError) {
        tracing::error!(error = %err, "Toggl request failed");
        match err {
            TogglError::InvalidRequest(message) => self.set_status(message, true),
            err if err.is_unauthorized() => {
                self.mode = Mode::Error;
                self.set_status(
                    "Invalid or missing API token. Run `togglscene login <TOKEN>`.",
                    true,
                );
            }
            err => {
                self.mode = Mode::Error;
                self.set_status(err.to_string(), true);
            }
        }
    }
}

fn step(current: Option<usize>, len: usize, code: KeyCode) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = current.unwrap_or(0);
    match code {
        KeyCode::Up => Some(if current == 0 { len - 1 } else { current - 1 }),
        KeyCode::Down => Some((current + 1) % len),
        _ => None,
    }
}
