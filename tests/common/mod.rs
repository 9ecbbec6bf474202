//! Shared fixtures: a minimal litematic byte builder and catalog/store
//! setup helpers.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};
use stockpile::core::identity::Requester;

pub fn requester(name: &str, privileged: bool) -> Requester {
    Requester::new(name, &format!("key-{}", name), privileged)
}

pub fn write_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("item_catalog.json");
    std::fs::write(
        &path,
        r#"{"items": {"minecraft:stone": "Stone", "minecraft:dirt": "Dirt", "minecraft:oak_sign": "Oak Sign"}}"#,
    )
    .unwrap();
    path
}

fn put_string(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u16).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

fn named(out: &mut Vec<u8>, tag_id: u8, name: &str) {
    out.push(tag_id);
    put_string(out, name);
}

fn put_int(out: &mut Vec<u8>, name: &str, v: i32) {
    named(out, 3, name);
    out.extend_from_slice(&v.to_be_bytes());
}

/// Pack indices at a fixed bit width into 64-bit words, entries straddling
/// word boundaries the way the litematic format stores them.
pub fn pack_indices(indices: &[usize], bits: u32) -> Vec<i64> {
    let total_bits = indices.len() * bits as usize;
    let mut words = vec![0u64; total_bits.div_ceil(64)];
    let mut word = 0usize;
    let mut bit: u32 = 0;
    for &idx in indices {
        let value = idx as u64;
        words[word] |= value << bit;
        let avail = 64 - bit;
        if avail < bits {
            words[word + 1] |= value >> avail;
        }
        bit += bits;
        if bit >= 64 {
            word += 1;
            bit -= 64;
        }
    }
    words.into_iter().map(|w| w as i64).collect()
}

/// Gzipped single-region schematic. Palette entries are
/// `(block_name, state_properties)`.
pub fn litematic_bytes(
    region_name: &str,
    size: (i32, i32, i32),
    palette: &[(&str, &[(&str, &str)])],
    words: &[i64],
) -> Vec<u8> {
    let mut out = Vec::new();
    named(&mut out, 10, ""); // root compound
    named(&mut out, 10, "Regions");
    named(&mut out, 10, region_name);

    named(&mut out, 10, "Size");
    put_int(&mut out, "x", size.0);
    put_int(&mut out, "y", size.1);
    put_int(&mut out, "z", size.2);
    out.push(0);

    named(&mut out, 9, "BlockStatePalette");
    out.push(10); // list of compounds
    out.extend_from_slice(&(palette.len() as i32).to_be_bytes());
    for (name, props) in palette {
        named(&mut out, 8, "Name");
        put_string(&mut out, name);
        if !props.is_empty() {
            named(&mut out, 10, "Properties");
            for (k, v) in *props {
                named(&mut out, 8, k);
                put_string(&mut out, v);
            }
            out.push(0);
        }
        out.push(0);
    }

    named(&mut out, 12, "BlockStates");
    out.extend_from_slice(&(words.len() as i32).to_be_bytes());
    for w in words {
        out.extend_from_slice(&w.to_be_bytes());
    }

    out.push(0); // region
    out.push(0); // Regions
    out.push(0); // root

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&out).unwrap();
    encoder.finish().unwrap()
}
