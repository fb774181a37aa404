//! Database passwords: where they are stored and how a connection is opened
//! with them.
//!
//! A password is looked up under service `plandb_<server>_login` and the
//! database user. When nothing is stored the user is prompted, the
//! connection is verified, and only then is the new password saved.

use crate::config::DatabaseSettings;
use crate::db::Connection;
use crate::error::{DbError, IngestError, SecretError};
use log::info;
use std::collections::HashMap;
use std::sync::Mutex;

/// Where a secret lives: service plus account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretKey {
    pub service: String,
    pub user: String,
}

impl SecretKey {
    pub fn for_database(settings: &DatabaseSettings) -> Self {
        Self {
            service: settings.secret_service(),
            user: settings.username.clone(),
        }
    }
}

pub trait SecretStore {
    fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretError>;

    fn set(&self, key: &SecretKey, secret: &str) -> Result<(), SecretError>;
}

/// Asks the invoking user for a password.
pub trait PasswordPrompt {
    fn prompt(&self, message: &str) -> Result<String, SecretError>;
}

/// The operating system keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    fn entry(key: &SecretKey) -> Result<keyring::Entry, SecretError> {
        keyring::Entry::new(&key.service, &key.user).map_err(|e| SecretError::Store {
            service: key.service.clone(),
            reason: e.to_string(),
        })
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretError> {
        match Self::entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecretError::Store {
                service: key.service.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &SecretKey, secret: &str) -> Result<(), SecretError> {
        Self::entry(key)?
            .set_password(secret)
            .map_err(|e| SecretError::Store {
                service: key.service.clone(),
                reason: e.to_string(),
            })
    }
}

/// A store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    secrets: Mutex<HashMap<SecretKey, String>>,
}

impl MemoryStore {
    pub fn with_secret(self, key: SecretKey, secret: &str) -> Self {
        if let Ok(mut secrets) = self.secrets.lock() {
            secrets.insert(key, secret.to_string());
        }
        self
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretError> {
        let secrets = self.secrets.lock().map_err(|_| SecretError::Store {
            service: key.service.clone(),
            reason: "store lock poisoned".to_string(),
        })?;
        Ok(secrets.get(key).cloned())
    }

    fn set(&self, key: &SecretKey, secret: &str) -> Result<(), SecretError> {
        let mut secrets = self.secrets.lock().map_err(|_| SecretError::Store {
            service: key.service.clone(),
            reason: "store lock poisoned".to_string(),
        })?;
        secrets.insert(key.clone(), secret.to_string());
        Ok(())
    }
}

/// Reads a password from the terminal without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn prompt(&self, message: &str) -> Result<String, SecretError> {
        Ok(rpassword::prompt_password(message)?)
    }
}

/// Never prompts; used where nobody is at a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl PasswordPrompt for NoPrompt {
    fn prompt(&self, _message: &str) -> Result<String, SecretError> {
        Err(SecretError::Prompt(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "interactive prompt not available",
        )))
    }
}

/// Opens a verified connection.
///
/// `open` builds the connection from the password; the connection must then
/// answer `show_tables` before a freshly prompted password is saved.
pub fn connect<C, F>(
    settings: &DatabaseSettings,
    store: &dyn SecretStore,
    prompt: &dyn PasswordPrompt,
    open: F,
) -> Result<C, IngestError>
where
    C: Connection,
    F: FnOnce(&DatabaseSettings, &str) -> Result<C, DbError>,
{
    let key = SecretKey::for_database(settings);
    let (password, prompted) = match store.get(&key)? {
        Some(stored) => (stored, false),
        None => {
            let message = format!(
                "Password for user {} on server {}:\n",
                settings.username, settings.server
            );
            (prompt.prompt(&message)?, true)
        }
    };

    let mut conn = open(settings, &password)?;
    conn.show_tables()?;

    if prompted {
        store.set(&key, &password)?;
        info!("Saved password for {} in {}", key.user, key.service);
    }
    Ok(conn)
}

/// Like [`connect`] but fails instead of prompting when nothing is stored.
pub fn connect_stored<C, F>(
    settings: &DatabaseSettings,
    store: &dyn SecretStore,
    open: F,
) -> Result<C, IngestError>
where
    C: Connection,
    F: FnOnce(&DatabaseSettings, &str) -> Result<C, DbError>,
{
    let key = SecretKey::for_database(settings);
    if store.get(&key)?.is_none() {
        return Err(SecretError::NotStored {
            user: settings.username.clone(),
            server: settings.server.clone(),
        }
        .into());
    }
    connect(settings, store, &NoPrompt, open)
}
