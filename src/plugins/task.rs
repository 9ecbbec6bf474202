//! Fulfillment store: persistent project and material records with claim,
//! commit, and query operations.
//!
//! Every mutating operation runs in a single transaction on the owned store
//! handle; a failure mid-sequence rolls back, so materials never outlive or
//! predate their project.

use crate::core::error::StockpileError;
use crate::core::identity::Requester;
use crate::core::merge::MaterialEntry;
use crate::core::output;
use crate::core::store::Store;
use crate::core::time;
use crate::core::units;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Overworld,
    Nether,
    End,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Overworld => "overworld",
            Dimension::Nether => "nether",
            Dimension::End => "end",
        }
    }
}

impl FromStr for Dimension {
    type Err = StockpileError;

    /// Accepts the numeric shorthand the chat surface uses (0/1/2) as well
    /// as the dimension names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "0" | "overworld" => Ok(Dimension::Overworld),
            "1" | "nether" => Ok(Dimension::Nether),
            "2" | "end" => Ok(Dimension::End),
            other => Err(StockpileError::UserInput(format!(
                "dimension must be 0/1/2 or overworld/nether/end, got: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coordinates {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

const HORIZONTAL_LIMIT: i64 = 30_000_000;
const Y_MIN: i64 = -64;
const Y_MAX: i64 = 368;

impl Coordinates {
    pub fn parse(x: &str, y: &str, z: &str) -> Result<Self, StockpileError> {
        let parse = |v: &str| {
            v.parse::<i64>()
                .map_err(|_| StockpileError::UserInput("coordinates must be integers".to_string()))
        };
        let coords = Self {
            x: parse(x)?,
            y: parse(y)?,
            z: parse(z)?,
        };
        if coords.x.abs() > HORIZONTAL_LIMIT
            || coords.z.abs() > HORIZONTAL_LIMIT
            || coords.y < Y_MIN
            || coords.y > Y_MAX
        {
            return Err(StockpileError::UserInput(
                "coordinates out of world range".to_string(),
            ));
        }
        Ok(coords)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectRecord {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub dimension: String,
    pub creator_name: String,
    pub creator_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaterialRecord {
    pub id: i64,
    pub project_id: i64,
    pub sequence_number: u32,
    pub name: Option<String>,
    pub item_id: Option<String>,
    pub total: u64,
    pub commit_count: u64,
    pub recipient: Option<String>,
    pub locations: Vec<String>,
}

impl MaterialRecord {
    pub fn display_label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.item_id.as_deref())
            .unwrap_or("?")
    }
}

pub struct NewProject<'a> {
    pub name: &'a str,
    pub dimension: Dimension,
    pub location: Coordinates,
    pub creator: &'a Requester,
}

/// Project names travel through chat and into SQL and file names; keep them
/// to one word without quoting characters.
pub fn validate_project_name(name: &str) -> Result<(), StockpileError> {
    static PROJECT_NAME: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"^[^\s"'`;\\]{1,64}$"#).unwrap());
    if !PROJECT_NAME.is_match(name) {
        return Err(StockpileError::UserInput(format!(
            "invalid project name: {}",
            name
        )));
    }
    Ok(())
}

fn project_from_row(row: &Row) -> rusqlite::Result<ProjectRecord> {
    Ok(ProjectRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        dimension: row.get(3)?,
        creator_name: row.get(4)?,
        creator_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn material_from_row(row: &Row) -> rusqlite::Result<MaterialRecord> {
    let location_json: Option<String> = row.get(8)?;
    let locations = location_json
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();
    Ok(MaterialRecord {
        id: row.get(0)?,
        project_id: row.get(1)?,
        sequence_number: row.get(2)?,
        name: row.get(3)?,
        item_id: row.get(4)?,
        total: row.get::<_, i64>(5)? as u64,
        commit_count: row.get::<_, i64>(6)? as u64,
        recipient: row.get(7)?,
        locations,
    })
}

const PROJECT_COLUMNS: &str =
    "id, name, location, dimension, creator_name, creator_id, created_at";
const MATERIAL_COLUMNS: &str =
    "id, project_id, sequence_number, name, item_id, total, commit_count, recipient, location_json";

/// Look up a project by name. `None` is a normal outcome, not an error.
pub fn get_project_by_name(
    store: &Store,
    name: &str,
) -> Result<Option<ProjectRecord>, StockpileError> {
    query_project(store.conn(), name)
}

fn query_project(conn: &Connection, name: &str) -> Result<Option<ProjectRecord>, StockpileError> {
    let sql = format!("SELECT {} FROM project WHERE name = ?1", PROJECT_COLUMNS);
    Ok(conn
        .query_row(&sql, params![name], project_from_row)
        .optional()?)
}

pub fn list_projects(store: &Store) -> Result<Vec<ProjectRecord>, StockpileError> {
    let sql = format!("SELECT {} FROM project ORDER BY name", PROJECT_COLUMNS);
    let mut stmt = store.conn().prepare(&sql)?;
    let rows = stmt.query_map([], project_from_row)?;
    let mut projects = Vec::new();
    for row in rows {
        projects.push(row?);
    }
    Ok(projects)
}

pub fn get_materials(
    store: &Store,
    project_id: i64,
) -> Result<Vec<MaterialRecord>, StockpileError> {
    let sql = format!(
        "SELECT {} FROM material WHERE project_id = ?1 ORDER BY sequence_number",
        MATERIAL_COLUMNS
    );
    let mut stmt = store.conn().prepare(&sql)?;
    let rows = stmt.query_map(params![project_id], material_from_row)?;
    let mut materials = Vec::new();
    for row in rows {
        materials.push(row?);
    }
    Ok(materials)
}

fn get_material_by_sequence(
    conn: &Connection,
    project_id: i64,
    sequence_number: u32,
) -> Result<Option<MaterialRecord>, StockpileError> {
    let sql = format!(
        "SELECT {} FROM material WHERE project_id = ?1 AND sequence_number = ?2",
        MATERIAL_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![project_id, sequence_number], material_from_row)
        .optional()?)
}

/// Create a project together with its material rows in one transaction.
/// Name uniqueness is re-checked here; announce-time checks do not survive
/// the gap until the file arrives.
pub fn create_project_with_materials(
    store: &mut Store,
    project: &NewProject,
    entries: &[MaterialEntry],
) -> Result<i64, StockpileError> {
    validate_project_name(project.name)?;
    let name = project.name.to_string();
    let location = project.location.to_string();
    let dimension = project.dimension.as_str().to_string();
    let creator_name = project.creator.display_name.clone();
    let creator_id = project.creator.session_key.clone();
    let entries = entries.to_vec();
    store.with_txn(move |txn| {
        let existing: Option<i64> = txn
            .query_row(
                "SELECT id FROM project WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StockpileError::UserInput(format!(
                "project {} already exists",
                name
            )));
        }
        txn.execute(
            "INSERT INTO project(name, location, dimension, creator_name, creator_id, created_at)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                location,
                dimension,
                creator_name,
                creator_id,
                time::now_epoch_z()
            ],
        )?;
        let project_id = txn.last_insert_rowid();
        let mut stmt = txn.prepare(
            "INSERT INTO material(project_id, sequence_number, name, item_id, total, commit_count)
             VALUES(?1, ?2, ?3, ?4, ?5, 0)",
        )?;
        for entry in &entries {
            stmt.execute(params![
                project_id,
                entry.sequence_number,
                entry.name,
                entry.item_id,
                entry.total as i64,
            ])?;
        }
        Ok(project_id)
    })
}

/// Delete a project and its materials. Only the creator or a privileged
/// requester may delete; the cascade runs in one transaction.
pub fn delete_project(
    store: &mut Store,
    name: &str,
    requester: &Requester,
) -> Result<(), StockpileError> {
    let project = get_project_by_name(store, name)?
        .ok_or_else(|| StockpileError::NotFound(format!("project {}", name)))?;
    check_ownership(&project, requester)?;
    store.with_txn(move |txn| {
        txn.execute("DELETE FROM material WHERE project_id = ?1", params![project.id])?;
        txn.execute("DELETE FROM project WHERE id = ?1", params![project.id])?;
        Ok(())
    })
}

/// Rename and relocate a project. The new name must not collide with another
/// project; renaming to the current name is allowed.
pub fn rename_project(
    store: &mut Store,
    old_name: &str,
    new_name: &str,
    dimension: Dimension,
    location: Coordinates,
    requester: &Requester,
) -> Result<(), StockpileError> {
    validate_project_name(new_name)?;
    let project = get_project_by_name(store, old_name)?
        .ok_or_else(|| StockpileError::NotFound(format!("project {}", old_name)))?;
    check_ownership(&project, requester)?;
    let new_name = new_name.to_string();
    store.with_txn(move |txn| {
        let collision: Option<i64> = txn
            .query_row(
                "SELECT id FROM project WHERE name = ?1 AND id != ?2",
                params![new_name, project.id],
                |row| row.get(0),
            )
            .optional()?;
        if collision.is_some() {
            return Err(StockpileError::UserInput(format!(
                "project {} already exists",
                new_name
            )));
        }
        txn.execute(
            "UPDATE project SET name = ?1, location = ?2, dimension = ?3 WHERE id = ?4",
            params![
                new_name,
                location.to_string(),
                dimension.as_str(),
                project.id
            ],
        )?;
        Ok(())
    })
}

/// Claim a line item: records the requester as recipient.
pub fn claim_material(
    store: &mut Store,
    project_name: &str,
    sequence_number: u32,
    requester: &Requester,
) -> Result<MaterialRecord, StockpileError> {
    let project = get_project_by_name(store, project_name)?
        .ok_or_else(|| StockpileError::NotFound(format!("project {}", project_name)))?;
    let recipient = requester.display_name.clone();
    store.with_txn(move |txn| {
        let material = get_material_by_sequence(txn, project.id, sequence_number)?
            .ok_or_else(|| {
                StockpileError::NotFound(format!(
                    "material #{} in {}",
                    sequence_number, project.name
                ))
            })?;
        txn.execute(
            "UPDATE material SET recipient = ?1 WHERE id = ?2",
            params![recipient, material.id],
        )?;
        get_material_by_sequence(txn, project.id, sequence_number)?.ok_or_else(|| {
            StockpileError::NotFound(format!("material #{}", sequence_number))
        })
    })
}

/// Commit `delta_units` (already converted to base units) against a line
/// item and append `location_note` to its history.
///
/// Rejects only when the item is already fully committed; the delta itself
/// is not clamped, so one oversized commit may push past the total. That
/// matches long-standing user expectations and stays as-is.
pub fn commit_material(
    store: &mut Store,
    project_name: &str,
    sequence_number: u32,
    delta_units: u64,
    location_note: &str,
) -> Result<MaterialRecord, StockpileError> {
    let project = get_project_by_name(store, project_name)?
        .ok_or_else(|| StockpileError::NotFound(format!("project {}", project_name)))?;
    let location_note = location_note.to_string();
    store.with_txn(move |txn| {
        let material = get_material_by_sequence(txn, project.id, sequence_number)?
            .ok_or_else(|| {
                StockpileError::NotFound(format!(
                    "material #{} in {}",
                    sequence_number, project.name
                ))
            })?;
        if material.commit_count >= material.total {
            return Err(StockpileError::UserInput(format!(
                "{} is already fully committed",
                material.display_label()
            )));
        }
        let new_count = material.commit_count + delta_units;
        let mut locations = material.locations.clone();
        locations.push(location_note);
        let location_json = serde_json::to_string(&locations)
            .map_err(|e| StockpileError::UserInput(format!("location note: {}", e)))?;
        txn.execute(
            "UPDATE material SET commit_count = ?1, location_json = ?2 WHERE id = ?3",
            params![new_count as i64, location_json, material.id],
        )?;
        get_material_by_sequence(txn, project.id, sequence_number)?.ok_or_else(|| {
            StockpileError::NotFound(format!("material #{}", sequence_number))
        })
    })
}

fn check_ownership(project: &ProjectRecord, requester: &Requester) -> Result<(), StockpileError> {
    if project.creator_id == requester.session_key || requester.privileged {
        Ok(())
    } else {
        Err(StockpileError::PermissionDenied)
    }
}

/// Render a project and its materials as the text report the dispatcher
/// returns for `task <name>`.
pub fn render_report(project: &ProjectRecord, materials: &[MaterialRecord]) -> String {
    let mut lines = vec![format!(
        "{} @ {} ({}) by {}",
        project.name, project.location, project.dimension, project.creator_name
    )];
    for material in materials {
        let label = material.display_label();
        let (boxes, containers) =
            units::remaining_breakdown(label, material.total, material.commit_count);
        let mut line = format!(
            "  #{} {} {}/{} (remaining {} box + {} stack)",
            material.sequence_number, label, material.commit_count, material.total, boxes,
            containers
        );
        if let Some(recipient) = &material.recipient {
            line.push_str(&format!(" [{}]", recipient));
        }
        let history = output::history_line(&material.locations);
        if !history.is_empty() {
            line.push_str(&format!(" @ {}", history));
        }
        lines.push(line);
    }
    if materials.is_empty() {
        lines.push("  (no materials)".to_string());
    }
    lines.join("\n")
}
