//! Normalization and merge: raw entries from either intake path collapse
//! into one canonical, deduplicated material list.
//!
//! Schematic counts are keyed by full block-state identifiers and go through
//! the whole pipeline (state stripping, slab doubling, exclude, remap,
//! count-ordered sequence). Text rows already carry per-item totals in a
//! deliberate order, so they only pass through exclude and remap.

use crate::core::catalog::ItemCatalog;
use crate::core::schematic::{self, Region};
use rustc_hash::FxHashMap;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialEntry {
    /// Stable 1-based addressing key used by claim/commit.
    pub sequence_number: u32,
    pub name: Option<String>,
    pub item_id: Option<String>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct MergeRules<'a> {
    pub exclude: &'a HashSet<String>,
    pub remap: &'a HashMap<String, String>,
}

const DOUBLE_SLAB_TOKEN: &str = "type=double";

/// Collapse raw `(identifier, count)` pairs into a canonical base-id map:
/// doubled slabs counted twice, excluded ids dropped (exclude wins over
/// remap), remapped ids accumulated under their final id, sorted by count
/// descending with ties kept in first-seen order.
pub fn normalize_counts(
    raw: impl IntoIterator<Item = (String, u64)>,
    rules: MergeRules,
) -> Vec<(String, u64)> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: FxHashMap<String, u64> = FxHashMap::default();

    for (id, count) in raw {
        let base = schematic::base_id(&id);
        let qualifier = id.strip_prefix(base).unwrap_or("");
        let count = if qualifier.contains(DOUBLE_SLAB_TOKEN) {
            count * 2
        } else {
            count
        };
        if rules.exclude.contains(base) {
            continue;
        }
        let final_id = rules.remap.get(base).map(String::as_str).unwrap_or(base);
        match totals.get_mut(final_id) {
            Some(slot) => *slot += count,
            None => {
                order.push(final_id.to_string());
                totals.insert(final_id.to_string(), count);
            }
        }
    }

    let mut merged: Vec<(String, u64)> = order
        .into_iter()
        .map(|id| {
            let total = totals[&id];
            (id, total)
        })
        .collect();
    merged.sort_by(|a, b| b.1.cmp(&a.1));
    merged
}

/// Merge decoded regions into the final material list. Counts are summed per
/// raw identifier across regions before normalization.
pub fn merge_regions(
    regions: &[Region],
    rules: MergeRules,
    catalog: &ItemCatalog,
) -> Vec<MaterialEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut raw: FxHashMap<String, u64> = FxHashMap::default();
    for region in regions {
        for (id, count) in &region.counts {
            match raw.get_mut(id) {
                Some(slot) => *slot += count,
                None => {
                    order.push(id.clone());
                    raw.insert(id.clone(), *count);
                }
            }
        }
    }
    let pairs = order.into_iter().map(|id| {
        let count = raw[&id];
        (id, count)
    });

    normalize_counts(pairs, rules)
        .into_iter()
        .enumerate()
        .map(|(i, (item_id, total))| MaterialEntry {
            sequence_number: i as u32 + 1,
            name: catalog.display_name(&item_id).map(str::to_string),
            item_id: Some(item_id),
            total,
        })
        .collect()
}

/// Finalize text-parsed rows. Exclude and remap apply to the resolved item
/// id; file order is preserved and sequence numbers stay dense after drops.
pub fn finalize_text(
    entries: Vec<(String, u64)>,
    rules: MergeRules,
    catalog: &ItemCatalog,
) -> Vec<MaterialEntry> {
    let mut out = Vec::with_capacity(entries.len());
    for (name, total) in entries {
        let item_id = catalog.item_id(&name).map(str::to_string);
        let item_id = match item_id {
            Some(id) => {
                if rules.exclude.contains(id.as_str()) {
                    continue;
                }
                Some(rules.remap.get(&id).cloned().unwrap_or(id))
            }
            None => None,
        };
        out.push(MaterialEntry {
            sequence_number: out.len() as u32 + 1,
            name: Some(name),
            item_id,
            total,
        });
    }
    out
}
