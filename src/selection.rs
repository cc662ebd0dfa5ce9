use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

pub const SELECTION_FILE: &str = ".maya_toggl";
pub const DIR_ENV: &str = "TMPDIR";
const HOME_SUBDIR: &str = "tmp";
const DELIMITER: char = ':';
const ESCAPE: char = '\\';

/// Last workspace and project names picked by the user. Names only; callers
/// re-resolve them against a fresh listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub workspace: String,
    pub project: String,
}

#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join(SELECTION_FILE),
        }
    }

    /// `$TMPDIR` when set, otherwise `~/tmp`.
    pub fn from_env() -> io::Result<Self> {
        let dir = resolve_dir(env::var_os(DIR_ENV), dirs::home_dir())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Home directory not found"))?;
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the stored selection. Last write wins.
    pub fn save(&self, workspace: &str, project: &str) -> io::Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Selection directory not found"))?;
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        write!(file, "{}{DELIMITER}{}", escape(workspace), escape(project))?;
        file.flush()?;
        file.persist(&self.path).map_err(|err| err.error)?;
        tracing::debug!(path = %self.path.display(), workspace, project, "Saved selection");
        Ok(())
    }

    pub fn load(&self) -> io::Result<Option<Selection>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };

        let selection = parse_selection(&contents);
        if selection.is_none() {
            tracing::warn!(path = %self.path.display(), "Ignoring malformed selection file");
        }
        Ok(selection)
    }
}

pub fn resolve_dir(override_dir: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    match override_dir {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => home.map(|home| home.join(HOME_SUBDIR)),
    }
}

/// `\` and `:` inside a name are written as `\\` and `\:`, so plain `ws:project`
/// files read back unchanged.
fn escape(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch == ESCAPE || ch == DELIMITER {
            escaped.push(ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_selection(contents: &str) -> Option<Selection> {
    let contents = contents.trim_end_matches(['\r', '\n']);
    let mut workspace = String::new();
    let mut chars = contents.chars();
    loop {
        match chars.next()? {
            ESCAPE => workspace.push(chars.next().unwrap_or(ESCAPE)),
            DELIMITER => break,
            ch => workspace.push(ch),
        }
    }
    Some(Selection {
        workspace,
        project: unescape(chars.as_str()),
    })
}

fn unescape(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == ESCAPE {
            unescaped.push(chars.next().unwrap_or(ESCAPE));
        } else {
            unescaped.push(ch);
        }
    }
    unescaped
}
