//! Schematic decoding: palette-indexed, bit-packed voxel regions reduced to
//! per-block-type counts.
//!
//! The container is NBT (see [`crate::core::nbt`]); each region under the
//! root `Regions` compound carries its size, an ordered block-state palette,
//! and a packed index array of 64-bit words. Every index is stored with the
//! same fixed width for the region, entries straddle word boundaries, and the
//! words must be treated as unsigned before any shift.

use crate::core::error::StockpileError;
use crate::core::nbt::{self, Tag};
use std::fs;
use std::path::Path;

pub const AIR_ID: &str = "minecraft:air";

/// One decoded region: block identifier -> occurrence count, in palette
/// order, with air and zero-count entries already dropped.
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    pub counts: Vec<(String, u64)>,
    /// The packed word array ran out before the full volume was produced.
    /// Some exporters emit slightly short arrays; the missing voxels are
    /// simply absent from the counts.
    pub truncated: bool,
}

/// Fixed index width for a palette of `palette_len` entries.
///
/// `max(2, ceil(log2(palette_len)))`; the floor of 2 holds even for tiny
/// palettes and must match the encoder exactly.
pub fn bits_per_entry(palette_len: usize) -> u32 {
    if palette_len <= 1 {
        return 2;
    }
    let needed = usize::BITS - (palette_len - 1).leading_zeros();
    needed.max(2)
}

/// Unpack `count` fixed-width indices from `words`. Returns the indices plus
/// a truncation flag when the array is exhausted early.
pub fn unpack_indices(words: &[u64], bits: u32, count: usize) -> (Vec<usize>, bool) {
    debug_assert!((2..=63).contains(&bits));
    let mask: u64 = (1u64 << bits) - 1;
    // The word array bounds how many entries can actually be produced, so a
    // lying volume never drives the allocation.
    let producible = words.len().saturating_mul(64) / bits as usize;
    let mut out = Vec::with_capacity(count.min(producible));
    let mut word = 0usize;
    let mut bit: u32 = 0;
    for _ in 0..count {
        if word >= words.len() {
            return (out, true);
        }
        let avail = 64 - bit;
        let value = if avail >= bits {
            (words[word] >> bit) & mask
        } else {
            // Entry straddles two words: low part from the tail of this word,
            // high part from the head of the next.
            if word + 1 >= words.len() {
                return (out, true);
            }
            let low = words[word] >> bit;
            let high = words[word + 1] & (mask >> avail);
            low | (high << avail)
        };
        out.push(value as usize);
        bit += bits;
        if bit >= 64 {
            word += 1;
            bit -= 64;
        }
    }
    (out, false)
}

/// Decode a schematic file into its regions. Atomic: any malformed structure
/// fails the whole decode with a reason.
pub fn decode_file(path: &Path) -> Result<Vec<Region>, StockpileError> {
    let bytes = fs::read(path)?;
    decode_bytes(&bytes)
}

pub fn decode_bytes(bytes: &[u8]) -> Result<Vec<Region>, StockpileError> {
    let (_, root) = nbt::parse(bytes)?;
    let regions_tag = root.child("Regions")?;
    let regions_map = regions_tag
        .as_compound()
        .ok_or_else(|| StockpileError::Decode("Regions is not a compound".to_string()))?;

    // Compound iteration order is not defined; sort region names so merge
    // output is deterministic across runs.
    let mut names: Vec<&String> = regions_map.keys().collect();
    names.sort();

    let mut regions = Vec::with_capacity(names.len());
    for name in names {
        regions.push(decode_region(name, &regions_map[name])?);
    }
    Ok(regions)
}

fn decode_region(name: &str, region: &Tag) -> Result<Region, StockpileError> {
    let size = region.child("Size")?;
    let mut volume: usize = 1;
    for axis in ["x", "y", "z"] {
        let extent = size.child(axis)?.as_int().ok_or_else(|| {
            StockpileError::Decode(format!("region {}: Size.{} is not an int", name, axis))
        })?;
        // Sizes may be stored negative depending on capture direction.
        volume = volume
            .checked_mul(extent.unsigned_abs() as usize)
            .ok_or_else(|| {
                StockpileError::Decode(format!("region {}: volume overflows", name))
            })?;
    }

    let palette_tag = region.child("BlockStatePalette")?;
    let palette_entries = palette_tag.as_list().ok_or_else(|| {
        StockpileError::Decode(format!("region {}: palette is not a list", name))
    })?;
    let palette: Vec<String> = palette_entries
        .iter()
        .map(palette_id)
        .collect::<Result<_, _>>()?;

    let words_tag = region.child("BlockStates")?;
    let words: Vec<u64> = words_tag
        .as_long_array()
        .ok_or_else(|| {
            StockpileError::Decode(format!("region {}: BlockStates is not a long array", name))
        })?
        .iter()
        .map(|&w| w as u64)
        .collect();

    let bits = bits_per_entry(palette.len());
    let (indices, truncated) = unpack_indices(&words, bits, volume);

    let mut histogram = vec![0u64; palette.len()];
    for idx in indices {
        // Out-of-range indices are dropped, not faulted.
        if let Some(slot) = histogram.get_mut(idx) {
            *slot += 1;
        }
    }

    let counts = palette
        .iter()
        .zip(&histogram)
        .filter(|(id, &count)| count > 0 && base_id(id) != AIR_ID)
        .map(|(id, &count)| (id.clone(), count))
        .collect();

    Ok(Region {
        name: name.to_string(),
        counts,
        truncated,
    })
}

/// Render a palette entry (`Name` plus optional `Properties`) as the
/// canonical `kind:name[k=v,...]` identifier, properties sorted by key.
fn palette_id(entry: &Tag) -> Result<String, StockpileError> {
    let name = entry
        .child("Name")?
        .as_str()
        .ok_or_else(|| StockpileError::Decode("palette Name is not a string".to_string()))?;
    let props = match entry.as_compound().and_then(|map| map.get("Properties")) {
        Some(Tag::Compound(props)) if !props.is_empty() => props,
        _ => return Ok(name.to_string()),
    };
    let mut pairs: Vec<(&String, &Tag)> = props.iter().collect();
    pairs.sort_by_key(|(k, _)| k.as_str());
    let qualifiers: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.as_str().unwrap_or_default()))
        .collect();
    Ok(format!("{}[{}]", name, qualifiers.join(",")))
}

/// Identifier portion before any bracketed state qualifier.
pub fn base_id(id: &str) -> &str {
    id.split('[').next().unwrap_or(id)
}
