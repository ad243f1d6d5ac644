//! Persisted authentication session.
//!
//! A session is the bearer token plus the user summary the backend returned
//! at login. It is persisted as two entries ([`keys::TOKEN`] and
//! [`keys::USER`]) in a [`KeyValueStore`] and is either fully present or
//! fully absent: a half-written or unparseable copy is purged on restore.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use portfolio_core::UserSummary;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Persisted entry names.
pub mod keys {
    /// Bearer token.
    pub const TOKEN: &str = "authToken";
    /// JSON-encoded [`UserSummary`](portfolio_core::UserSummary).
    pub const USER: &str = "user";
}

/// An authenticated identity.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    user: UserSummary,
}

impl Session {
    /// Create a session from a token and the user it belongs to.
    #[must_use]
    pub fn new(token: impl Into<String>, user: UserSummary) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user,
        }
    }

    /// Bearer token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// Authenticated user.
    #[must_use]
    pub const fn user(&self) -> &UserSummary {
        &self.user
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.token.expose_secret() == other.token.expose_secret() && self.user == other.user
    }
}

impl Eq for Session {}

/// String key/value persistence for the session entries.
pub trait KeyValueStore: Send + Sync {
    /// Read one entry.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write several entries so that either all or none are observed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails; nothing is changed then.
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove several entries. Removing a missing entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing medium cannot be written.
    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        (**self).set_all(entries)
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        (**self).remove_all(keys)
    }
}

/// In-process store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set_all(&self, new_entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// A JSON object file holding all entries.
///
/// Writes go to a sibling temporary file that is renamed over the target.
/// A missing or corrupt file reads as empty, and the file is deleted once its
/// last entry is removed.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Store entries in the file at `path`. Nothing is touched until the
    /// first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<HashMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Ignoring corrupt session file");
            HashMap::new()
        }))
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut temp_name = self.path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

        fs::write(&temp_path, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_entries()?.remove(key))
    }

    fn set_all(&self, new_entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        self.write_entries(&entries)
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before && !entries.is_empty() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}

/// Shared handle to the current session.
///
/// Cloning is cheap; all clones observe the same session. Every restore,
/// save and clear is published to [`subscribe`](Self::subscribe) receivers.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    backend: Box<dyn KeyValueStore>,
    current: RwLock<Option<Session>>,
    identity: watch::Sender<Option<UserSummary>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store over `backend`. Call [`restore`](Self::restore) to load
    /// a previously saved session.
    #[must_use]
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionStoreInner {
                backend: Box::new(backend),
                current: RwLock::new(None),
                identity,
            }),
        }
    }

    /// Store backed by a JSON file at `path`.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(path))
    }

    /// Store that only lives as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Load the persisted session.
    ///
    /// Never fails: unreadable storage is logged and treated as logged out,
    /// and a partial or corrupt copy is purged before returning `None`.
    pub fn restore(&self) -> Option<Session> {
        let restored = match self.read_persisted() {
            Ok(Some(session)) => Some(session),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Could not read persisted session; starting logged out");
                None
            }
        };

        debug!(restored = restored.is_some(), "Session restored");
        self.publish(restored.clone());
        restored
    }

    /// Persist `session` and make it current.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be written; the current
    /// session is unchanged then.
    pub fn save(&self, session: Session) -> Result<(), StorageError> {
        let user = serde_json::to_string(session.user())?;
        self.inner.backend.set_all(&[
            (keys::TOKEN, session.token().expose_secret()),
            (keys::USER, &user),
        ])?;

        debug!(username = %session.user().username, "Session saved");
        self.publish(Some(session));
        Ok(())
    }

    /// Forget the session, persisted and in memory. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the persisted entries cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.inner.backend.remove_all(&[keys::TOKEN, keys::USER])?;
        debug!("Session cleared");
        self.publish(None);
        Ok(())
    }

    /// The current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.current().map(|session| session.token)
    }

    /// The current user, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserSummary> {
        self.current().map(|session| session.user)
    }

    /// Watch the current identity. The receiver sees the latest value on
    /// every restore, save and clear.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserSummary>> {
        self.inner.identity.subscribe()
    }

    fn read_persisted(&self) -> Result<Option<Session>, StorageError> {
        let backend = &self.inner.backend;
        let token = backend.get(keys::TOKEN)?.filter(|token| !token.is_empty());
        let user = backend
            .get(keys::USER)?
            .and_then(|raw| match serde_json::from_str::<UserSummary>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "Persisted user record is corrupt");
                    None
                }
            });

        if let (Some(token), Some(user)) = (token, user) {
            return Ok(Some(Session::new(token, user)));
        }

        self.purge();
        Ok(None)
    }

    fn purge(&self) {
        if let Err(e) = self.inner.backend.remove_all(&[keys::TOKEN, keys::USER]) {
            warn!(error = %e, "Could not purge incomplete session");
        }
    }

    fn publish(&self, session: Option<Session>) {
        let identity = session.as_ref().map(|s| s.user.clone());
        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
        self.inner.identity.send_replace(identity);
    }
}
