use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use togglscene::panel::Panel;
use togglscene::settings::{self, Settings};
use togglscene::{
    Credentials, Endpoints, SelectionStore, Session, StopOutcome, TimeEntry, TogglClient, logging,
    naming, ui,
};

#[derive(Parser)]
#[command(name = "togglscene", version, about = "Toggl Track timers for the open scene")]
struct Cli {
    /// Toggl API token. Defaults to TOGGL_TOKEN, then the token saved by `login`.
    #[arg(long, global = true)]
    token: Option<String>,
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive start-timer panel (default).
    Panel {
        /// Scene file used to pre-fill description and tags.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Start a new timer.
    Start(StartArgs),
    /// Stop the running timer.
    Stop,
    /// Show the running timer.
    Current,
    /// List workspaces.
    Workspaces,
    /// List projects of a workspace (defaults to the last selected one).
    Projects {
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// Print the authenticated profile.
    Me,
    /// Save an API token for later runs.
    Login { token: String },
    /// Show the remembered workspace and project.
    Selection,
}

#[derive(Args)]
struct StartArgs {
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(short, long)]
    description: Option<String>,
    /// Workspace name, or part of it.
    #[arg(short, long)]
    workspace: Option<String>,
    /// Project name, or part of it.
    #[arg(short, long)]
    project: Option<String>,
    #[arg(short = 't', long = "tag")]
    tags: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Panel { file: None });
    let directive = match command {
        Command::Panel { .. } if cli.verbose == 0 => "off",
        _ => logging::cli_directive(cli.verbose),
    };
    logging::init(directive);

    let settings = settings::read_settings();
    let connect = || build_session(cli.token.clone(), &settings);
    match command {
        Command::Login { token } => login(&token),
        Command::Selection => show_selection(),
        Command::Panel { file } => run_panel(connect()?, file, &settings),
        Command::Start(args) => start_timer(connect()?, args, &settings),
        Command::Stop => stop_timer(&connect()?),
        Command::Current => show_current(&connect()?),
        Command::Workspaces => list_workspaces(&connect()?),
        Command::Projects { workspace } => list_projects(connect()?, workspace),
        Command::Me => show_profile(&connect()?),
    }
}

fn login(token: &str) -> Result<()> {
    settings::write_token(token).context("Failed to save token")?;
    println!("Token saved.");
    Ok(())
}

fn show_selection() -> Result<()> {
    let store = selection_store()?;
    match store.load().context("Failed to read last selection")? {
        Some(selection) => println!("{}\t{}", selection.workspace, selection.project),
        None => println!("No saved selection."),
    }
    Ok(())
}

fn start_timer(mut session: Session, args: StartArgs, settings: &Settings) -> Result<()> {
    let separator = settings.tag_separator();
    session.load()?;
    if let Some(workspace) = &args.workspace {
        session.select_workspace_named(workspace)?;
    }
    if let Some(project) = &args.project {
        session.select_project_named(project)?;
    }

    let file = args.file.as_deref();
    let description = args
        .description
        .unwrap_or_else(|| naming::description_from_filename(file, separator));
    let mut tags: BTreeSet<String> = args.tags.into_iter().collect();
    tags.extend(naming::tags_from_filename(file, separator));

    let entry = session.start(&description, &tags)?;
    let workspace = session
        .selected_workspace()
        .map(|workspace| workspace.name.as_str())
        .unwrap_or_default();
    let project = session
        .selected_project()
        .map(|project| project.name.as_str())
        .unwrap_or("No project");
    println!("Started: {} [{workspace} / {project}]", entry.label());
    Ok(())
}

fn stop_timer(session: &Session) -> Result<()> {
    match session.stop()? {
        StopOutcome::Stopped(entry) => {
            let elapsed = format_duration(entry.elapsed_seconds(Utc::now()));
            println!("Stopped: {} ({elapsed})", entry.label());
        }
        StopOutcome::NoActiveEntry => println!("No timer running."),
    }
    Ok(())
}

fn show_current(session: &Session) -> Result<()> {
    match session.current()? {
        Some(entry) => println!("{}", describe_running(&entry)),
        None => println!("No timer running."),
    }
    Ok(())
}

fn list_workspaces(session: &Session) -> Result<()> {
    for workspace in session.client().get_workspaces()? {
        println!("{}\t{}", workspace.id, workspace.name);
    }
    Ok(())
}

fn list_projects(mut session: Session, workspace: Option<String>) -> Result<()> {
    let workspace = match workspace {
        Some(name) => session
            .client()
            .get_workspace(&name)?
            .ok_or_else(|| anyhow!("No workspace matches {name:?}"))?,
        None => {
            session.load()?;
            session
                .selected_workspace()
                .cloned()
                .ok_or_else(|| anyhow!("No workspaces found"))?
        }
    };
    for project in session.client().get_projects(workspace.id)? {
        println!("{}\t{}", project.id, project.name);
    }
    Ok(())
}

fn show_profile(session: &Session) -> Result<()> {
    let profile = session.client().get_profile()?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

fn build_session(token: Option<String>, settings: &Settings) -> Result<Session> {
    let credentials = Credentials::from_sources(settings::read_token(token), None);
    let client = TogglClient::with_options(
        credentials,
        Endpoints::new(settings.api_url()),
        settings.timeout(),
    )?;
    Ok(Session::new(client, selection_store()?))
}

fn selection_store() -> Result<SelectionStore> {
    SelectionStore::from_env().context("Cannot determine where to keep the last selection")
}

fn run_panel(session: Session, file: Option<PathBuf>, settings: &Settings) -> Result<()> {
    let mut panel = Panel::new(session, file, settings.tag_separator());

    let mut stdout = std::io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = panel_loop(&mut terminal, &mut panel, settings);

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    if let Some(message) = panel.take_exit_message() {
        println!("{message}");
    }
    Ok(())
}

fn panel_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    panel: &mut Panel,
    settings: &Settings,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, panel, settings.theme()))?;

        if panel.needs_refresh {
            panel.refresh_data();
            continue;
        }

        if panel.should_quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    panel.handle_key_event(key);
                }
            }
        }
    }
}

fn describe_running(entry: &TimeEntry) -> String {
    let started = entry.start.with_timezone(&Local).format("%H:%M");
    format!(
        "Running: {} since {started} ({})",
        entry.label(),
        format_duration(entry.elapsed_seconds(Utc::now()))
    )
}

fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}h {:02}m", seconds / 3600, (seconds % 3600) / 60)
}
