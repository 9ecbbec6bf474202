//! Centralized database schema definitions for the stockpile store.
//!
//! One SQLite database holds three tables:
//! 1. project: one row per tracked construction effort.
//! 2. material: line items owned by a project (cascade delete).
//! 3. location: named coordinate bookmarks, one slot per dimension.

pub const STOCKPILE_DB_NAME: &str = "stockpile.db";

pub const PROJECT_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS project (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        location TEXT NOT NULL,
        dimension TEXT NOT NULL,
        creator_name TEXT NOT NULL,
        creator_id TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
";

pub const MATERIAL_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS material (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL,
        name TEXT,
        item_id TEXT,
        total INTEGER NOT NULL,
        recipient TEXT,
        commit_count INTEGER NOT NULL DEFAULT 0,
        sequence_number INTEGER NOT NULL,
        location_json TEXT,
        FOREIGN KEY(project_id) REFERENCES project(id) ON DELETE CASCADE
    )
";

pub const MATERIAL_SCHEMA_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_material_project ON material(project_id, sequence_number)";

pub const LOCATION_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS location (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        overworld TEXT,
        nether TEXT,
        \"end\" TEXT
    )
";

pub const ALL_SCHEMAS: &[&str] = &[
    PROJECT_SCHEMA,
    MATERIAL_SCHEMA,
    MATERIAL_SCHEMA_INDEX,
    LOCATION_SCHEMA,
];
