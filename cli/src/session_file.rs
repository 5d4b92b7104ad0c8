//! Session persistence in a JSON file, so sign-in survives between commands.

#[cfg(test)]
#[path = "session_file_test.rs"]
mod session_file_test;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nestegg::backend::Session;
use nestegg::backend::persistence::SessionPersistence;

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for SessionFile {
    fn load(&self) -> Option<Session> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    fn save(&self, session: &Session) {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "cannot create session directory");
                return;
            }
        }
        let raw = match serde_json::to_string_pretty(session) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "cannot serialize session");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, raw) {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot write session file");
        }
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot remove session file");
            }
            _ => {}
        }
    }
}
