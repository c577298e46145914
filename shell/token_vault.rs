/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Saved session: the bearer token lives in the OS keychain, the signed-in
//! user and timestamp in a small JSON file next to the config.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fmt, fs, io};

use agriregistry_core::User;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const KEYCHAIN_SERVICE: &str = "agriregistry.session";

#[derive(Debug)]
pub enum SessionFileError {
    Io { path: PathBuf, source: io::Error },
    Format { path: PathBuf, source: serde_json::Error },
    Keychain { account: String, source: keyring::Error },
}

impl fmt::Display for SessionFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "session file {}: {source}", path.display())
            },
            Self::Format { path, source } => {
                write!(f, "session file {} is malformed: {source}", path.display())
            },
            Self::Keychain { account, source } => {
                write!(f, "keychain entry for {account}: {source}")
            },
        }
    }
}

impl std::error::Error for SessionFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Format { source, .. } => Some(source),
            Self::Keychain { source, .. } => Some(source),
        }
    }
}

/// Where the token itself is kept.
#[derive(Clone)]
pub enum TokenSecret {
    /// OS keychain entry under [`KEYCHAIN_SERVICE`], one per API base.
    Keychain { account: String },
    /// Process-local slot; clones share it.
    Memory(Arc<Mutex<Option<String>>>),
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keychain { account } => {
                f.debug_struct("Keychain").field("account", account).finish()
            },
            Self::Memory(_) => f.write_str("Memory"),
        }
    }
}

impl TokenSecret {
    pub fn keychain(api_base: &str) -> Self {
        Self::Keychain {
            account: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn in_memory() -> Self {
        Self::Memory(Arc::default())
    }

    fn entry(account: &str) -> Result<keyring::Entry, SessionFileError> {
        keyring::Entry::new(KEYCHAIN_SERVICE, account).map_err(|source| {
            SessionFileError::Keychain {
                account: account.to_string(),
                source,
            }
        })
    }

    fn keychain_error(account: &str, source: keyring::Error) -> SessionFileError {
        SessionFileError::Keychain {
            account: account.to_string(),
            source,
        }
    }

    pub fn get(&self) -> Result<Option<String>, SessionFileError> {
        match self {
            Self::Keychain { account } => match Self::entry(account)?.get_password() {
                Ok(token) => Ok(Some(token)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(source) => Err(Self::keychain_error(account, source)),
            },
            Self::Memory(slot) => Ok(slot.lock().clone()),
        }
    }

    pub fn set(&self, token: &str) -> Result<(), SessionFileError> {
        match self {
            Self::Keychain { account } => Self::entry(account)?
                .set_password(token)
                .map_err(|source| Self::keychain_error(account, source)),
            Self::Memory(slot) => {
                *slot.lock() = Some(token.to_string());
                Ok(())
            },
        }
    }

    /// Deleting an entry that does not exist is not an error.
    pub fn delete(&self) -> Result<(), SessionFileError> {
        match self {
            Self::Keychain { account } => match Self::entry(account)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(source) => Err(Self::keychain_error(account, source)),
            },
            Self::Memory(slot) => {
                *slot.lock() = None;
                Ok(())
            },
        }
    }
}

/// A restored session: token from the keychain, user from the file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub user: User,
    pub saved_at: OffsetDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    user: User,
    #[serde(with = "time::serde::timestamp")]
    saved_at: OffsetDateTime,
}

#[derive(Clone, Debug)]
pub struct TokenVault {
    path: PathBuf,
    secret: TokenSecret,
}

impl TokenVault {
    pub fn new(path: impl Into<PathBuf>, secret: TokenSecret) -> Self {
        Self {
            path: path.into(),
            secret,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SessionFileError {
        SessionFileError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn format_error(&self, source: serde_json::Error) -> SessionFileError {
        SessionFileError::Format {
            path: self.path.clone(),
            source,
        }
    }

    /// `Ok(None)` unless both the file and the keychain token are present.
    pub fn load(&self) -> Result<Option<StoredSession>, SessionFileError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        let file: SessionFile =
            serde_json::from_str(&raw).map_err(|source| self.format_error(source))?;
        Ok(self.secret.get()?.map(|token| StoredSession {
            token,
            user: file.user,
            saved_at: file.saved_at,
        }))
    }

    pub fn save(&self, token: &str, user: &User) -> Result<(), SessionFileError> {
        self.secret.set(token)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let file = SessionFile {
            user: user.clone(),
            saved_at: OffsetDateTime::now_utc(),
        };
        let contents =
            serde_json::to_string_pretty(&file).map_err(|source| self.format_error(source))?;
        fs::write(&self.path, contents).map_err(|source| self.io_error(source))
    }

    /// Removes both halves. Either being gone already is not an error.
    pub fn clear(&self) -> Result<(), SessionFileError> {
        let secret = self.secret.delete();
        match fs::remove_file(&self.path) {
            Ok(()) => {},
            Err(source) if source.kind() == io::ErrorKind::NotFound => {},
            Err(source) => return Err(self.io_error(source)),
        }
        secret
    }
}

#[cfg(test)]
mod tests {
    use agriregistry_core::RoleSet;

    use super::*;

    fn user() -> User {
        User {
            id: "u-9".into(),
            display_name: "Mutale".into(),
            email: Some("mutale@agri.zm".into()),
            roles: RoleSet::single("OPERATOR"),
        }
    }

    #[test]
    fn save_then_load_returns_token_and_user() {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(
            dir.path().join("nested").join("session.json"),
            TokenSecret::in_memory(),
        );

        vault.save("tok-1", &user()).unwrap();
        let stored = vault.load().unwrap().unwrap();

        assert_eq!(stored.token, "tok-1");
        assert_eq!(stored.user, user());
    }

    #[test]
    fn token_never_reaches_the_session_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let secret = TokenSecret::in_memory();
        let vault = TokenVault::new(&path, secret.clone());

        vault.save("tok-secret-1", &user()).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("tok-secret-1"));
        assert!(contents.contains("Mutale"));
        assert_eq!(secret.get().unwrap().as_deref(), Some("tok-secret-1"));

        vault.clear().unwrap();
        assert_eq!(secret.get().unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn file_without_keychain_token_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let secret = TokenSecret::in_memory();
        let vault = TokenVault::new(&path, secret.clone());
        vault.save("tok-1", &user()).unwrap();

        secret.delete().unwrap();
        assert!(vault.load().unwrap().is_none());
    }

    #[test]
    fn missing_file_loads_as_none_and_clears_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(dir.path().join("session.json"), TokenSecret::in_memory());
        assert!(vault.load().unwrap().is_none());
        vault.clear().unwrap();
    }

    #[test]
    fn garbage_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let err = TokenVault::new(&path, TokenSecret::in_memory())
            .load()
            .unwrap_err();
        assert!(matches!(err, SessionFileError::Format { .. }));
    }

    #[test]
    fn keychain_account_ignores_trailing_slash() {
        let TokenSecret::Keychain { account } = TokenSecret::keychain("https://api.agri.zm/") else {
            panic!("expected keychain secret");
        };
        assert_eq!(account, "https://api.agri.zm");
    }
}
