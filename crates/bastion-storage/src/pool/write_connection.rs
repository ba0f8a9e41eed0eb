//! Single write connection behind `tokio::sync::Mutex`.

use std::path::Path;

use rusqlite::Connection;
use tokio::sync::Mutex;

use bastion_core::errors::BastionResult;

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open a connection and run `init` on it before it is shared.
    pub fn open<F>(path: &Path, init: F) -> BastionResult<Self>
    where
        F: FnOnce(&Connection) -> BastionResult<()>,
    {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        Self::prepare(conn, init)
    }

    pub fn open_in_memory<F>(init: F) -> BastionResult<Self>
    where
        F: FnOnce(&Connection) -> BastionResult<()>,
    {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        Self::prepare(conn, init)
    }

    fn prepare<F>(conn: Connection, init: F) -> BastionResult<Self>
    where
        F: FnOnce(&Connection) -> BastionResult<()>,
    {
        apply_pragmas(&conn)?;
        init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the lock and execute a closure with the connection.
    pub async fn with_conn<F, T>(&self, f: F) -> BastionResult<T>
    where
        F: FnOnce(&Connection) -> BastionResult<T>,
    {
        let guard = self.conn.lock().await;
        f(&guard)
    }
}
