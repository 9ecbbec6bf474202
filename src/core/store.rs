//! Owned store handle for the fulfillment database.
//!
//! The connection is owned here and passed explicitly into every component
//! that mutates state; there is no module-level singleton. All multi-step
//! mutations go through [`Store::with_txn`] so a failure mid-sequence rolls
//! back as a unit.

use crate::core::db;
use crate::core::error::StockpileError;
use rusqlite::{Connection, Transaction};
use std::path::{Path, PathBuf};

pub struct Store {
    conn: Connection,
    root: PathBuf,
}

impl Store {
    /// Open (and initialize, if needed) the store under `root`.
    pub fn open(root: &Path) -> Result<Self, StockpileError> {
        let conn = db::db_connect(&db::stockpile_db_path(root))?;
        db::initialize_db(&conn)?;
        Ok(Self {
            conn,
            root: root.to_path_buf(),
        })
    }

    /// In-memory store, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StockpileError> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys=ON;", [])?;
        db::initialize_db(&conn)?;
        Ok(Self {
            conn,
            root: PathBuf::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a transaction. Commit on `Ok`, roll back on `Err`, so
    /// the caller never observes a half-applied mutation.
    pub fn with_txn<F, R>(&mut self, f: F) -> Result<R, StockpileError>
    where
        F: FnOnce(&Transaction) -> Result<R, StockpileError>,
    {
        let txn = self.conn.transaction()?;
        let result = f(&txn)?;
        txn.commit()?;
        Ok(result)
    }
}
