//! Project lifecycle against an on-disk store, including reopen persistence.

mod common;

use stockpile::core::error::StockpileError;
use stockpile::core::merge::MaterialEntry;
use stockpile::core::store::Store;
use stockpile::core::units;
use stockpile::plugins::task::{self, Coordinates, Dimension, NewProject};

fn entries() -> Vec<MaterialEntry> {
    vec![
        MaterialEntry {
            sequence_number: 1,
            name: Some("Stone".to_string()),
            item_id: Some("minecraft:stone".to_string()),
            total: 3456,
        },
        MaterialEntry {
            sequence_number: 2,
            name: Some("Oak Sign".to_string()),
            item_id: Some("minecraft:oak_sign".to_string()),
            total: 20,
        },
    ]
}

fn seed(store: &mut Store, name: &str, creator: &stockpile::core::identity::Requester) -> i64 {
    let project = NewProject {
        name,
        dimension: Dimension::Nether,
        location: Coordinates { x: 10, y: 120, z: -5 },
        creator,
    };
    task::create_project_with_materials(store, &project, &entries()).unwrap()
}

#[test]
fn lifecycle_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    let alice = common::requester("alice", false);
    let bob = common::requester("bob", false);

    {
        let mut store = Store::open(&data).unwrap();
        seed(&mut store, "perimeter", &alice);
        task::claim_material(&mut store, "perimeter", 1, &bob).unwrap();
        // 2 boxes in base units.
        let delta = units::parse_amount("2b").unwrap();
        assert_eq!(delta, 3456);
        task::commit_material(&mut store, "perimeter", 1, delta - 64, "depot").unwrap();
    }

    let store = Store::open(&data).unwrap();
    let project = task::get_project_by_name(&store, "perimeter").unwrap().unwrap();
    assert_eq!(project.creator_name, "alice");
    let materials = task::get_materials(&store, project.id).unwrap();
    assert_eq!(materials[0].commit_count, 3392);
    assert_eq!(materials[0].recipient.as_deref(), Some("bob"));
    assert_eq!(materials[0].locations, vec!["depot".to_string()]);
    assert_eq!(materials[1].commit_count, 0);
}

#[test]
fn ownership_gates_rename_and_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(&tmp.path().join("data")).unwrap();
    let alice = common::requester("alice", false);
    let mallory = common::requester("mallory", false);
    seed(&mut store, "perimeter", &alice);

    let coords = Coordinates { x: 0, y: 64, z: 0 };
    let err = task::rename_project(
        &mut store,
        "perimeter",
        "stolen",
        Dimension::Overworld,
        coords,
        &mallory,
    )
    .unwrap_err();
    assert!(matches!(err, StockpileError::PermissionDenied));
    assert_eq!(err.to_string(), "Permission denied");

    let err = task::delete_project(&mut store, "perimeter", &mallory).unwrap_err();
    assert!(matches!(err, StockpileError::PermissionDenied));

    // Admin may do both.
    let admin = common::requester("admin", true);
    task::rename_project(&mut store, "perimeter", "wall", Dimension::End, coords, &admin).unwrap();
    task::delete_project(&mut store, "wall", &admin).unwrap();
    assert!(task::get_project_by_name(&store, "wall").unwrap().is_none());
}

#[test]
fn commit_amount_suffixes_convert_to_base_units() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(&tmp.path().join("data")).unwrap();
    let alice = common::requester("alice", false);
    seed(&mut store, "perimeter", &alice);

    task::commit_material(&mut store, "perimeter", 2, units::parse_amount("3").unwrap(), "a")
        .unwrap();
    let material = task::commit_material(
        &mut store,
        "perimeter",
        2,
        units::parse_amount("2组").unwrap(),
        "b",
    )
    .unwrap();
    assert_eq!(material.commit_count, 3 + 128);
    assert_eq!(material.locations.len(), 2);
}

#[test]
fn report_lists_remaining_per_line() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = Store::open(&tmp.path().join("data")).unwrap();
    let alice = common::requester("alice", false);
    let project_id = seed(&mut store, "perimeter", &alice);
    task::commit_material(&mut store, "perimeter", 1, 1728, "depot").unwrap();

    let project = task::get_project_by_name(&store, "perimeter").unwrap().unwrap();
    let materials = task::get_materials(&store, project_id).unwrap();
    let report = task::render_report(&project, &materials);

    assert!(report.contains("perimeter @ 10 120 -5 (nether)"));
    // 3456 - 1728 = 1728 left: exactly one box, zero loose stacks.
    assert!(report.contains("#1 Stone 1728/3456 (remaining 1 box + 0 stack)"));
    // Signs stack to 16: 20 remaining = 0 boxes + 1.25 containers.
    assert!(report.contains("#2 Oak Sign 0/20 (remaining 0 box + 1.25 stack)"));
    assert!(report.contains("depot"));
}
