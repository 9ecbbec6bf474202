//! Stockpile: a daemonless material-list tracker for large voxel
//! construction projects.
//!
//! Three concerns live here:
//!
//! - **Decoding**: litematic schematics (gzipped NBT with palette-indexed,
//!   bit-packed voxel arrays) and delimited text exports are turned into
//!   per-item totals.
//! - **Normalization**: raw block identifiers are stripped of state,
//!   doubled for double slabs, excluded/remapped by configuration, and
//!   merged into one count-ordered list.
//! - **Fulfillment**: projects and their material lines persist in SQLite,
//!   with claim and commit bookkeeping until the build is stocked.
//!
//! # Crate Structure
//!
//! - [`core`]: decoding, normalization, and the store (db, schemas, config)
//! - [`plugins`]: feature surfaces (task, intake staging, loc, shell)

pub mod cli;
pub mod core;
pub mod plugins;
