use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use artsy_core::Session;
use artsy_logging::artsy_warn;
use tempfile::NamedTempFile;
use thiserror::Error;

pub const STATE_FILENAME: &str = "state.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ensure a directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Durable home of the session record: `{dir}/state.json`.
///
/// Loading never fails; a missing, unreadable or corrupt document yields the
/// default session. Saving reports every failure to the caller.
pub struct StateStore {
    dir: PathBuf,
    writer: AtomicFileWriter,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            writer: AtomicFileWriter::new(dir.clone()),
            dir,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILENAME)
    }

    pub fn load(&self) -> Session {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Session::default();
            }
            Err(err) => {
                artsy_warn!("Failed to read persisted state from {:?}: {}", path, err);
                return Session::default();
            }
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(mut session) => {
                session.normalize();
                session
            }
            Err(err) => {
                artsy_warn!("Failed to parse persisted state from {:?}: {}", path, err);
                Session::default()
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<PathBuf, PersistError> {
        let content = serde_json::to_string_pretty(session)?;
        let path = self.writer.write(STATE_FILENAME, &content)?;
        Ok(path)
    }
}
