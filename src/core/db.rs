use crate::core::error::StockpileError;
use crate::core::schemas;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

pub fn db_connect(db_path: &Path) -> Result<Connection, StockpileError> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
    conn.execute("PRAGMA foreign_keys=ON;", [])?;
    Ok(conn)
}

pub fn stockpile_db_path(root: &Path) -> PathBuf {
    root.join(schemas::STOCKPILE_DB_NAME)
}

pub fn initialize_db(conn: &Connection) -> Result<(), StockpileError> {
    for schema in schemas::ALL_SCHEMAS {
        conn.execute(schema, [])?;
    }
    Ok(())
}
