//! End-to-end intake: announce a project, deliver a material file, and check
//! what lands in the store.

mod common;

use std::fs;
use std::path::Path;
use stockpile::core::catalog::ItemCatalog;
use stockpile::core::config::Config;
use stockpile::core::error::StockpileError;
use stockpile::core::store::Store;
use stockpile::plugins::intake::{self, IntakeOutcome, StagingCache, StagingKey};
use stockpile::plugins::task::{self, Coordinates, Dimension};

fn announce(
    store: &Store,
    staging: &mut StagingCache,
    who: &stockpile::core::identity::Requester,
    name: &str,
) -> StagingKey {
    intake::announce(
        store,
        staging,
        who,
        "g1",
        name,
        Dimension::Overworld,
        Coordinates { x: 100, y: 64, z: -200 },
        1000,
    )
    .unwrap();
    StagingKey {
        group: "g1".to_string(),
        submitter: who.session_key.clone(),
    }
}

fn deliver(
    store: &mut Store,
    staging: &mut StagingCache,
    config: &Config,
    catalog: &ItemCatalog,
    key: &StagingKey,
    path: &Path,
) -> Result<IntakeOutcome, StockpileError> {
    let filename = path.file_name().unwrap().to_string_lossy().into_owned();
    intake::intake_file(store, staging, config, catalog, key, path, &filename, 1010)
}

/// 3x2x1 region: one air voxel, two plain stone, one double slab, two stone
/// with a state qualifier. After merge: stone 4, oak_slab 2 (doubled).
fn schematic_fixture(dir: &Path) -> std::path::PathBuf {
    let words = common::pack_indices(&[0, 1, 1, 2, 3, 3], 2);
    let bytes = common::litematic_bytes(
        "main",
        (3, 2, 1),
        &[
            ("minecraft:air", &[]),
            ("minecraft:stone", &[]),
            ("minecraft:oak_slab", &[("type", "double"), ("waterlogged", "false")]),
            ("minecraft:stone", &[("axis", "y")]),
        ],
        &words,
    );
    let path = dir.join("base.litematic");
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn litematic_intake_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(&tmp.path().join("data")).unwrap();
    let catalog = ItemCatalog::load(&common::write_catalog(tmp.path())).unwrap();
    let config = Config::default();
    let mut staging = StagingCache::new(300);
    let alice = common::requester("alice", false);

    let key = announce(&store, &mut staging, &alice, "base");
    let path = schematic_fixture(tmp.path());
    let outcome = deliver(&mut store, &mut staging, &config, &catalog, &key, &path).unwrap();

    match outcome {
        IntakeOutcome::Completed {
            material_count,
            warnings,
            ..
        } => {
            assert_eq!(material_count, 2);
            assert!(warnings.is_empty());
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(staging.is_empty());

    let project = task::get_project_by_name(&store, "base").unwrap().unwrap();
    assert_eq!(project.location, "100 64 -200");
    assert_eq!(project.dimension, "overworld");
    assert_eq!(project.creator_name, "alice");

    let materials = task::get_materials(&store, project.id).unwrap();
    assert_eq!(materials.len(), 2);

    // Highest count first; state qualifiers merged into the base id.
    assert_eq!(materials[0].sequence_number, 1);
    assert_eq!(materials[0].item_id.as_deref(), Some("minecraft:stone"));
    assert_eq!(materials[0].name.as_deref(), Some("Stone"));
    assert_eq!(materials[0].total, 4);

    // Double slab counted twice; not in the catalog, so no display name.
    assert_eq!(materials[1].sequence_number, 2);
    assert_eq!(materials[1].item_id.as_deref(), Some("minecraft:oak_slab"));
    assert_eq!(materials[1].name, None);
    assert_eq!(materials[1].total, 2);
}

#[test]
fn exclude_rule_drops_ids_before_persistence() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(&tmp.path().join("data")).unwrap();
    let catalog = ItemCatalog::empty();
    let mut config = Config::default();
    config.exclude.insert("minecraft:oak_slab".to_string());
    let mut staging = StagingCache::new(300);
    let alice = common::requester("alice", false);

    let key = announce(&store, &mut staging, &alice, "base");
    let path = schematic_fixture(tmp.path());
    deliver(&mut store, &mut staging, &config, &catalog, &key, &path).unwrap();

    let project = task::get_project_by_name(&store, "base").unwrap().unwrap();
    let materials = task::get_materials(&store, project.id).unwrap();
    assert_eq!(materials.len(), 1);
    assert_eq!(materials[0].item_id.as_deref(), Some("minecraft:stone"));
}

#[test]
fn pipe_table_export_keeps_file_order() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(&tmp.path().join("data")).unwrap();
    let catalog = ItemCatalog::load(&common::write_catalog(tmp.path())).unwrap();
    let config = Config::default();
    let mut staging = StagingCache::new(300);
    let alice = common::requester("alice", false);

    let text = [
        "+---+",
        "| Material List |",
        "+---+",
        "| Item | Total | Missing | Available |",
        "+---+",
        "| Oak Sign | 3 | 0 | 0 |",
        "| Stone | 1728 | 0 | 0 |",
        "+---+",
        "| Sum | 1731 | 0 | 0 |",
        "+---+",
        "",
    ]
    .join("\n");
    let path = tmp.path().join("base.txt");
    fs::write(&path, text).unwrap();

    let key = announce(&store, &mut staging, &alice, "base");
    deliver(&mut store, &mut staging, &config, &catalog, &key, &path).unwrap();

    let project = task::get_project_by_name(&store, "base").unwrap().unwrap();
    let materials = task::get_materials(&store, project.id).unwrap();
    assert_eq!(materials.len(), 2);
    // Text exports keep file order, no count sort.
    assert_eq!(materials[0].name.as_deref(), Some("Oak Sign"));
    assert_eq!(materials[0].item_id.as_deref(), Some("minecraft:oak_sign"));
    assert_eq!(materials[0].total, 3);
    assert_eq!(materials[1].name.as_deref(), Some("Stone"));
    assert_eq!(materials[1].total, 1728);
}

#[test]
fn short_block_data_warns_but_completes() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(&tmp.path().join("data")).unwrap();
    let catalog = ItemCatalog::empty();
    let config = Config::default();
    let mut staging = StagingCache::new(300);
    let alice = common::requester("alice", false);

    // 4x4x4 volume needs 128 bits of indices; provide one word (32 entries).
    let words = common::pack_indices(&[1; 32], 2);
    assert_eq!(words.len(), 1);
    let bytes = common::litematic_bytes(
        "main",
        (4, 4, 4),
        &[("minecraft:air", &[]), ("minecraft:stone", &[])],
        &words,
    );
    let path = tmp.path().join("short.litematic");
    fs::write(&path, bytes).unwrap();

    let key = announce(&store, &mut staging, &alice, "short");
    let outcome = deliver(&mut store, &mut staging, &config, &catalog, &key, &path).unwrap();
    match outcome {
        IntakeOutcome::Completed { warnings, .. } => {
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].contains("main"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let project = task::get_project_by_name(&store, "short").unwrap().unwrap();
    let materials = task::get_materials(&store, project.id).unwrap();
    assert_eq!(materials[0].total, 32);
}

#[test]
fn upload_without_announcement_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(&tmp.path().join("data")).unwrap();
    let mut staging = StagingCache::new(300);
    let alice = common::requester("alice", false);
    let path = schematic_fixture(tmp.path());
    let key = StagingKey {
        group: "g1".to_string(),
        submitter: alice.session_key.clone(),
    };
    let err = deliver(
        &mut store,
        &mut staging,
        &Config::default(),
        &ItemCatalog::empty(),
        &key,
        &path,
    )
    .unwrap_err();
    assert!(matches!(err, StockpileError::UserInput(_)));
}
