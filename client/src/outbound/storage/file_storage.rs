//! Session storage persisted as a flat JSON object on disk.
//!
//! The file maps persisted key names to string values, the same shape a
//! browser's local storage holds. Writes go through a temporary file and a
//! rename so a crash never leaves a half-written session behind. Keys this
//! crate does not know are preserved.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::SessionKey;
use crate::domain::ports::{SessionStorage, SessionStorageError};

type Entries = BTreeMap<String, String>;

/// [`SessionStorage`] backed by one JSON file.
#[derive(Debug)]
pub struct FileSessionStorage {
    dir: Dir,
    file_name: String,
    guard: Mutex<()>,
}

impl FileSessionStorage {
    /// Open storage at `path`, creating its parent directory if needed. The
    /// file itself is created on first write.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStorageError::Io`] when the path has no file name or
    /// the directory cannot be created or opened.
    pub fn open(path: &Path) -> Result<Self, SessionStorageError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                SessionStorageError::io(format!(
                    "session path `{}` must name a UTF-8 file",
                    path.display()
                ))
            })?
            .to_owned();
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(io_error)?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(io_error)?;
        Ok(Self::in_dir(dir, file_name))
    }

    /// Storage for `file_name` inside an already opened directory.
    pub fn in_dir(dir: Dir, file_name: impl Into<String>) -> Self {
        Self {
            dir,
            file_name: file_name.into(),
            guard: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Entries, SessionStorageError> {
        let text = match self.dir.read_to_string(&self.file_name) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Entries::new()),
            Err(error) => return Err(io_error(error)),
        };
        if text.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&text).map_err(|error| {
            SessionStorageError::corrupt(format!("{}: {error}", self.file_name))
        })
    }

    fn persist(&self, entries: &Entries) -> Result<(), SessionStorageError> {
        if entries.is_empty() {
            return match self.dir.remove_file(&self.file_name) {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
                Err(error) => Err(io_error(error)),
            };
        }
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|error| SessionStorageError::io(error.to_string()))?;
        let tmp_name = format!(".{}.tmp.{}", self.file_name, std::process::id());
        self.dir.write(&tmp_name, contents).map_err(io_error)?;
        if let Err(error) = self.dir.rename(&tmp_name, &self.dir, &self.file_name) {
            drop(self.dir.remove_file(&tmp_name));
            return Err(io_error(error));
        }
        debug!(file = %self.file_name, keys = entries.len(), "session file written");
        Ok(())
    }

    fn modify(&self, change: impl FnOnce(&mut Entries)) -> Result<(), SessionStorageError> {
        let _held = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        change(&mut entries);
        self.persist(&entries)
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: SessionKey) -> Result<Option<String>, SessionStorageError> {
        let _held = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key.as_str()))
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), SessionStorageError> {
        self.modify(|entries| {
            entries.insert(key.as_str().to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: SessionKey) -> Result<(), SessionStorageError> {
        self.modify(|entries| {
            entries.remove(key.as_str());
        })
    }

    fn clear(&self) -> Result<(), SessionStorageError> {
        self.modify(|entries| {
            for key in SessionKey::ALL {
                entries.remove(key.as_str());
            }
        })
    }
}

fn io_error(error: std::io::Error) -> SessionStorageError {
    SessionStorageError::io(error.to_string())
}
