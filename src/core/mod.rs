//! Core modules: shared primitives for the stockpile control surface.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod merge;
pub mod nbt;
pub mod output;
pub mod schemas;
pub mod schematic;
pub mod store;
pub mod textfile;
pub mod time;
pub mod units;
