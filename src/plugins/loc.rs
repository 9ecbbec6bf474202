//! Named location registry: coordinate bookmarks with one slot per
//! dimension, shared by everyone on the server.

use crate::core::error::StockpileError;
use crate::core::store::Store;
use crate::plugins::task::{Coordinates, Dimension};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LocationRecord {
    pub id: i64,
    pub name: String,
    pub overworld: Option<String>,
    pub nether: Option<String>,
    pub end: Option<String>,
}

impl LocationRecord {
    pub fn slot(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Overworld => self.overworld.as_deref(),
            Dimension::Nether => self.nether.as_deref(),
            Dimension::End => self.end.as_deref(),
        }
    }
}

fn dimension_column(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Overworld => "overworld",
        Dimension::Nether => "nether",
        Dimension::End => "\"end\"",
    }
}

fn location_from_row(row: &Row) -> rusqlite::Result<LocationRecord> {
    Ok(LocationRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        overworld: row.get(2)?,
        nether: row.get(3)?,
        end: row.get(4)?,
    })
}

const LOCATION_COLUMNS: &str = "id, name, overworld, nether, \"end\"";

pub fn get_location(store: &Store, name: &str) -> Result<Option<LocationRecord>, StockpileError> {
    let sql = format!("SELECT {} FROM location WHERE name = ?1", LOCATION_COLUMNS);
    Ok(store
        .conn()
        .query_row(&sql, params![name], location_from_row)
        .optional()?)
}

pub fn list_locations(store: &Store) -> Result<Vec<LocationRecord>, StockpileError> {
    let sql = format!("SELECT {} FROM location ORDER BY name", LOCATION_COLUMNS);
    let mut stmt = store.conn().prepare(&sql)?;
    let rows = stmt.query_map([], location_from_row)?;
    let mut locations = Vec::new();
    for row in rows {
        locations.push(row?);
    }
    Ok(locations)
}

/// Add a new bookmark with the given dimension slot filled.
pub fn add_location(
    store: &mut Store,
    name: &str,
    dimension: Dimension,
    coordinates: Coordinates,
) -> Result<(), StockpileError> {
    if get_location(store, name)?.is_some() {
        return Err(StockpileError::UserInput(format!(
            "location {} already exists",
            name
        )));
    }
    let sql = format!(
        "INSERT INTO location(name, {}) VALUES(?1, ?2)",
        dimension_column(dimension)
    );
    store
        .conn()
        .execute(&sql, params![name, coordinates.to_string()])?;
    Ok(())
}

/// Update one dimension slot of an existing bookmark.
pub fn set_location(
    store: &mut Store,
    name: &str,
    dimension: Dimension,
    coordinates: Coordinates,
) -> Result<(), StockpileError> {
    let sql = format!(
        "UPDATE location SET {} = ?1 WHERE name = ?2",
        dimension_column(dimension)
    );
    let updated = store
        .conn()
        .execute(&sql, params![coordinates.to_string(), name])?;
    if updated == 0 {
        return Err(StockpileError::NotFound(format!("location {}", name)));
    }
    Ok(())
}

pub fn remove_location(store: &mut Store, name: &str) -> Result<(), StockpileError> {
    let removed = store
        .conn()
        .execute("DELETE FROM location WHERE name = ?1", params![name])?;
    if removed == 0 {
        return Err(StockpileError::NotFound(format!("location {}", name)));
    }
    Ok(())
}

/// Multi-line detail view, one line per filled dimension slot.
pub fn render_location(record: &LocationRecord) -> String {
    let mut lines = vec![format!("location: {}", record.name)];
    for dimension in [Dimension::Overworld, Dimension::Nether, Dimension::End] {
        if let Some(coords) = record.slot(dimension) {
            lines.push(format!("  {}: {}", dimension.as_str(), coords));
        }
    }
    lines.join("\n")
}
