use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{HmsError, Result};
use crate::settings::DatabaseSettings;

/// Opens one connection per logical operation. There is no pool: the caller
/// owns the connection and it is closed when dropped, on every exit path.
#[derive(Debug, Clone)]
pub struct ConnectionProvider {
    settings: DatabaseSettings,
}

impl ConnectionProvider {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    pub fn acquire(&self) -> Result<Connection> {
        self.open(self.settings.create_if_missing)
    }

    /// Like `acquire`, but may create the database file. Used by schema bootstrap.
    pub fn acquire_or_create(&self) -> Result<Connection> {
        self.open(true)
    }

    fn open(&self, create: bool) -> Result<Connection> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if create {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }
        let path = &self.settings.path;
        let connection = Connection::open_with_flags(path, flags).map_err(|e| {
            HmsError::Connection(format!("cannot open {}: {e}", path.display()))
        })?;
        connection
            .busy_timeout(Duration::from_millis(self.settings.busy_timeout_ms))
            .map_err(|e| HmsError::Connection(e.to_string()))?;
        if self.settings.foreign_keys {
            connection
                .execute_batch("PRAGMA foreign_keys = ON;")
                .map_err(|e| HmsError::Connection(e.to_string()))?;
        }
        debug!(path = %path.display(), "connection acquired");
        Ok(connection)
    }
}
