//! Persistence for the admin secret.
//!
//! Exactly one value is ever stored: the raw secret string. There is no
//! expiry; the gate drops it from memory on a 401 and the user re-enters it.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

const APP_DIR_NAME: &str = "civic-desk";
const SECRET_FILE_NAME: &str = "admin_secret";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },
}

pub trait CredentialStore {
    fn load(&self) -> Option<String>;

    /// Persist `secret`. A blank secret clears the store instead.
    fn store(&self, secret: &str) -> Result<(), CredentialError>;

    fn clear(&self) -> Result<(), CredentialError>;
}

/// Stores the secret in a single file, readable only by the owner on unix.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCredentialStore { path: path.into() }
    }

    /// `<data dir>/civic-desk/admin_secret`, if the platform has a data dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME).join(SECRET_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        let secret = content.trim();
        if secret.is_empty() {
            None
        } else {
            Some(secret.to_string())
        }
    }

    fn store(&self, secret: &str) -> Result<(), CredentialError> {
        let secret = secret.trim();
        if secret.is_empty() {
            return self.clear();
        }

        let write_err = |source| CredentialError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, secret).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)) {
                tracing::warn!("failed to chmod 0600 {}: {}", self.path.display(), e);
            }
        }

        tracing::debug!(path = %self.path.display(), "stored admin secret");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CredentialError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// In-process store, used by the interactive shell's tests and by callers
/// that do not want the secret written to disk.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    secret: RefCell<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: &str) -> Self {
        MemoryCredentialStore {
            secret: RefCell::new(Some(secret.to_string())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<String> {
        self.secret.borrow().clone()
    }

    fn store(&self, secret: &str) -> Result<(), CredentialError> {
        let secret = secret.trim();
        *self.secret.borrow_mut() = if secret.is_empty() {
            None
        } else {
            Some(secret.to_string())
        };
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.secret.borrow_mut() = None;
        Ok(())
    }
}
