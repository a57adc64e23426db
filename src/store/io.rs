//! Storage media and the session store.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{QuizError, QuizResult};
use crate::quiz::QuizSession;
use crate::store::data::SessionBlob;

/// Fixed key the session blob is stored under.
pub const SESSION_KEY: &str = "quizState";

/// A string key-value medium.
///
/// The quiz only ever stores one blob, but the medium is kept generic so the
/// terminal build (files) and tests (memory) share the same store logic.
pub trait KeyValueStore {
    /// Read the value for `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Storage`] if the medium cannot be read.
    fn get(&self, key: &str) -> QuizResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Storage`] if the write fails.
    fn set(&mut self, key: &str, value: &str) -> QuizResult<()>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`QuizError::Storage`] if the removal fails.
    fn remove(&mut self, key: &str) -> QuizResult<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the storage directory. It is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> QuizResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(QuizError::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> QuizResult<()> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|e| {
            QuizError::Storage(format!(
                "Failed to create state directory {}: {e}",
                self.dir.display()
            ))
        })?;

        // Write to a sibling file first so a crash never leaves half a blob.
        let tmp = path.with_extension("json.tmp");
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            QuizError::Storage(format!("Failed to write {}: {e}", path.display()))
        })
    }

    fn remove(&mut self, key: &str) -> QuizResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(QuizError::Storage(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

/// In-memory medium. Can be told to reject writes to simulate a full disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    reject_writes: bool,
    writes: usize,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that fails every write with a quota error.
    #[must_use]
    pub fn rejecting_writes() -> Self {
        Self {
            reject_writes: true,
            ..Self::default()
        }
    }

    /// Toggle write rejection.
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Raw value for `key`, bypassing the trait.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Seed `key` with a raw value.
    pub fn insert_raw(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> QuizResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> QuizResult<()> {
        if self.reject_writes {
            return Err(QuizError::Storage("quota exceeded".to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> QuizResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Saves, loads and clears the single session blob.
#[derive(Debug)]
pub struct SessionStore<S> {
    medium: S,
    key: String,
    default_time_limit: u32,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Store blobs in `medium` under [`SESSION_KEY`].
    ///
    /// `default_time_limit` replaces a missing `timeLeft` on load.
    pub fn new(medium: S, default_time_limit: u32) -> Self {
        Self {
            medium,
            key: SESSION_KEY.to_string(),
            default_time_limit,
        }
    }

    /// Use a different key. Mostly useful for tests sharing a medium.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// The underlying medium.
    pub fn medium(&self) -> &S {
        &self.medium
    }

    /// Mutable access to the underlying medium.
    pub fn medium_mut(&mut self) -> &mut S {
        &mut self.medium
    }

    /// Fallback for blobs without `timeLeft`.
    #[must_use]
    pub fn default_time_limit(&self) -> u32 {
        self.default_time_limit
    }

    /// Persist a snapshot of `session`, overwriting the previous blob.
    ///
    /// # Errors
    ///
    /// Propagates [`QuizError::Storage`]; the write is not retried.
    pub fn save(&mut self, session: &QuizSession) -> QuizResult<()> {
        let json = SessionBlob::from_session(session)
            .to_json()
            .map_err(|e| QuizError::Storage(format!("Failed to serialize session: {e}")))?;
        self.medium.set(&self.key, &json).inspect_err(|e| {
            log::warn!("Session not saved: {e}");
        })?;
        log::trace!("Session saved ({} bytes)", json.len());
        Ok(())
    }

    /// Read the raw blob, `None` if absent or unparsable.
    #[must_use]
    pub fn load_blob(&self) -> Option<SessionBlob> {
        let content = match self.medium.get(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Saved session unreadable, ignoring it: {e}");
                return None;
            }
        };
        match SessionBlob::from_json(&content) {
            Ok(blob) => Some(blob),
            Err(e) => {
                log::warn!("Saved session is malformed, ignoring it: {e}");
                None
            }
        }
    }

    /// Load the saved session.
    ///
    /// Returns `None` when nothing is saved or the blob fails validation. A
    /// blob without `timeLeft` gets the default time limit.
    #[must_use]
    pub fn load(&self) -> Option<QuizSession> {
        let blob = self.load_blob()?;
        match blob.into_session(self.default_time_limit) {
            Ok(session) => {
                log::debug!(
                    "Restored session: {} questions, cursor {}, {} s left",
                    session.len(),
                    session.cursor(),
                    session.remaining_seconds()
                );
                Some(session)
            }
            Err(e) => {
                log::warn!("Saved session is inconsistent, ignoring it: {e}");
                None
            }
        }
    }

    /// Remove the saved blob. Clearing an absent blob is not an error.
    ///
    /// # Errors
    ///
    /// Propagates [`QuizError::Storage`] from the medium.
    pub fn clear(&mut self) -> QuizResult<()> {
        self.medium.remove(&self.key)?;
        log::debug!("Saved session cleared");
        Ok(())
    }
}
