pub mod client;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod naming;
pub mod panel;
pub mod selection;
pub mod session;
pub mod settings;
pub mod ui;

pub use client::{SOURCE_TAG, TogglClient};
pub use credentials::Credentials;
pub use endpoints::{Endpoint, Endpoints};
pub use error::TogglError;
pub use models::{Project, StartTimer, StopOutcome, TimeEntry, Workspace};
pub use selection::{Selection, SelectionStore};
pub use session::Session;
