//! Intake staging: correlates "a user announced a new project" with "a user
//! later uploaded its material file", then runs the file through the right
//! parser into the fulfillment store.
//!
//! The cache is a plain map with stored expiry timestamps, checked lazily on
//! access, with no eviction callbacks or timer thread. Entries are in memory
//! only; a process restart just means re-announcing.

use crate::core::catalog::ItemCatalog;
use crate::core::config::Config;
use crate::core::error::StockpileError;
use crate::core::identity::Requester;
use crate::core::merge::{self, MergeRules};
use crate::core::schematic;
use crate::core::store::Store;
use crate::core::textfile::{self, Dialect};
use crate::plugins::task::{self, Coordinates, Dimension, NewProject};
use std::collections::HashMap;
use std::path::Path;

pub const SCHEMATIC_EXTENSION: &str = "litematic";

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct StagingKey {
    /// Group/channel scope the announcement happened in.
    pub group: String,
    /// Submitter's session key.
    pub submitter: String,
}

#[derive(Debug, Clone)]
pub struct StagingEntry {
    pub project_name: String,
    pub dimension: Dimension,
    pub location: Coordinates,
    pub creator_name: String,
    pub creator_id: String,
    pub created_at: u64,
}

pub struct StagingCache {
    ttl_secs: u64,
    entries: HashMap<StagingKey, StagingEntry>,
}

impl StagingCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl_secs,
            entries: HashMap::new(),
        }
    }

    fn purge_expired(&mut self, now: u64) {
        let ttl = self.ttl_secs;
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.created_at) < ttl);
    }

    pub fn get(&mut self, key: &StagingKey, now: u64) -> Option<&StagingEntry> {
        self.purge_expired(now);
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &StagingKey) -> Option<StagingEntry> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find_by_project_name(&self, name: &str) -> Option<(&StagingKey, &StagingEntry)> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.project_name == name)
    }
}

/// Handle `task add`: records the announcement and waits for the file.
///
/// A pending announcement for the same project name by someone else rejects
/// with an ownership message; privileged requesters evict it and proceed.
pub fn announce(
    store: &Store,
    staging: &mut StagingCache,
    requester: &Requester,
    group: &str,
    project_name: &str,
    dimension: Dimension,
    location: Coordinates,
    now: u64,
) -> Result<(), StockpileError> {
    task::validate_project_name(project_name)?;
    if task::get_project_by_name(store, project_name)?.is_some() {
        return Err(StockpileError::UserInput(format!(
            "project {} already exists",
            project_name
        )));
    }

    staging.purge_expired(now);
    let key = StagingKey {
        group: group.to_string(),
        submitter: requester.session_key.clone(),
    };
    if let Some((holder, entry)) = staging.find_by_project_name(project_name) {
        if holder != &key {
            if !requester.privileged {
                return Err(StockpileError::UserInput(format!(
                    "{} ({}) already announced {}",
                    entry.creator_name, entry.creator_id, project_name
                )));
            }
            let holder = holder.clone();
            staging.remove(&holder);
        }
    }

    staging.entries.insert(
        key,
        StagingEntry {
            project_name: project_name.to_string(),
            dimension,
            location,
            creator_name: requester.display_name.clone(),
            creator_id: requester.session_key.clone(),
            created_at: now,
        },
    );
    Ok(())
}

#[derive(Debug)]
pub enum IntakeOutcome {
    /// Unsupported file suffix; not an error, the upload just isn't ours.
    NotApplicable,
    Completed {
        project_id: i64,
        material_count: usize,
        warnings: Vec<String>,
    },
}

fn file_extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// Handle a delivered file for a pending announcement.
///
/// The project and material rows are created in one transaction; only after
/// that commits is the staging entry consumed, so a persistence failure
/// leaves the announcement in place for a retry.
pub fn intake_file(
    store: &mut Store,
    staging: &mut StagingCache,
    config: &Config,
    catalog: &ItemCatalog,
    key: &StagingKey,
    path: &Path,
    filename: &str,
    now: u64,
) -> Result<IntakeOutcome, StockpileError> {
    let extension = match file_extension(filename) {
        Some(ext) => ext.to_lowercase(),
        None => return Ok(IntakeOutcome::NotApplicable),
    };
    let dialect = Dialect::for_extension(&extension);
    if dialect.is_none() && extension != SCHEMATIC_EXTENSION {
        return Ok(IntakeOutcome::NotApplicable);
    }

    let entry = staging
        .get(key, now)
        .cloned()
        .ok_or_else(|| {
            StockpileError::UserInput(
                "no pending announcement for you here (expired?)".to_string(),
            )
        })?;

    let rules = MergeRules {
        exclude: &config.exclude,
        remap: &config.remap,
    };
    let mut warnings = Vec::new();
    let entries = match dialect {
        Some(dialect) => {
            let bytes = std::fs::read(path)?;
            let parsed = textfile::parse_bytes(&bytes, dialect, &config.text_encoding)?;
            warnings.extend(parsed.warnings);
            merge::finalize_text(parsed.entries, rules, catalog)
        }
        None => {
            let regions = schematic::decode_file(path)?;
            for region in regions.iter().filter(|r| r.truncated) {
                warnings.push(format!(
                    "region {}: block data shorter than its volume, trailing voxels ignored",
                    region.name
                ));
            }
            merge::merge_regions(&regions, rules, catalog)
        }
    };
    if entries.is_empty() {
        return Err(StockpileError::Decode(
            "no usable material entries in file".to_string(),
        ));
    }

    let creator = Requester::new(&entry.creator_name, &entry.creator_id, false);
    let project = NewProject {
        name: &entry.project_name,
        dimension: entry.dimension,
        location: entry.location,
        creator: &creator,
    };
    let project_id = task::create_project_with_materials(store, &project, &entries)?;

    // Consumed exactly once, and only after the rows are durable.
    staging.remove(key);

    Ok(IntakeOutcome::Completed {
        project_id,
        material_count: entries.len(),
        warnings,
    })
}
