//! Integration tests for the offline pipeline: document on disk through
//! validation, compilation, fingerprinting and diffing against saved state.

use drawsync_core::{
    compute_diff, fingerprint_diagram, validate, Fingerprinted, RawDocument, SkeletonCompiler,
    StateFile, SyncState,
};
use std::path::Path;

const ARCH: &str = r"
shapes:
  - id: api
    type: rectangle
    pos: [100, 100, 200x80]
    label: API
  - id: db
    type: rectangle
    pos: [400, 100, 200x80]
    label: Database
connectors:
  - from: api
    to: db
";

/// Load, validate and fingerprint a document on disk.
fn fingerprints(path: &Path) -> Vec<Fingerprinted> {
    let raw = RawDocument::load(path).expect("load");
    let diagram = validate(&raw).expect("valid");
    fingerprint_diagram(&diagram).expect("fingerprints")
}

/// Pretend every entry was pushed and record fake remote ids.
fn pushed_state(prints: &[Fingerprinted]) -> SyncState {
    let mut state = SyncState::default();
    for p in prints {
        state.insert(&p.id, format!("remote-{}", p.id), &p.fingerprint);
    }
    state
}

// ===========================================================================
// Moving an endpoint shape
// ===========================================================================

#[test]
fn test_moving_db_updates_db_and_connector_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = dir.path().join("arch.yaml");
    std::fs::write(&doc, ARCH).expect("write doc");

    let state_file = StateFile::for_document(&doc);
    let mut state = pushed_state(&fingerprints(&doc));
    state_file.save(&mut state).expect("save");
    assert_eq!(state.len(), 3);

    std::fs::write(&doc, ARCH.replace("[400, 100, 200x80]", "[400, 300, 200x80]"))
        .expect("rewrite doc");

    let diff = compute_diff(&fingerprints(&doc), &state_file.load().expect("reload"));
    assert!(diff.create.is_empty());
    assert!(diff.delete.is_empty());

    let updated: Vec<&str> = diff.update.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(updated, ["db", "api-to-db"]);
    assert_eq!(diff.update[0].old_remote_id, "remote-db");

    let unchanged: Vec<&str> = diff.unchanged.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(unchanged, ["api"]);
}

// ===========================================================================
// Moving a group
// ===========================================================================

#[test]
fn test_moving_group_updates_members_only() {
    let grouped = r"
shapes:
  - id: title
    type: text
    text: Services
    pos: [0, 0]
  - id: g1
    type: group
    pos: [100, 30]
    shapes:
      - id: s1
        type: rectangle
        pos: [0, 0, 100x24]
";
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = dir.path().join("groups.yaml");
    std::fs::write(&doc, grouped).expect("write doc");
    let state = pushed_state(&fingerprints(&doc));

    std::fs::write(&doc, grouped.replace("[100, 30]", "[150, 30]")).expect("rewrite doc");
    let diff = compute_diff(&fingerprints(&doc), &state);

    assert_eq!(diff.update.len(), 1);
    assert_eq!(diff.update[0].id, "s1");
    assert_eq!(diff.unchanged.len(), 1);
    assert_eq!(diff.unchanged[0].id, "title");
    assert!(diff.create.is_empty());
    assert!(diff.delete.is_empty());
}

// ===========================================================================
// Removing entries
// ===========================================================================

#[test]
fn test_removed_entries_are_deleted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = dir.path().join("arch.yaml");
    std::fs::write(&doc, ARCH).expect("write doc");
    let state = pushed_state(&fingerprints(&doc));

    let only_api = "shapes:\n  - id: api\n    type: rectangle\n    pos: [100, 100, 200x80]\n    label: API\n";
    std::fs::write(&doc, only_api).expect("rewrite doc");
    let diff = compute_diff(&fingerprints(&doc), &state);

    let deleted: Vec<&str> = diff.delete.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(deleted, ["api-to-db", "db"]);
    assert_eq!(diff.unchanged.len(), 1);
}

// ===========================================================================
// Compilation order
// ===========================================================================

#[test]
fn test_compiled_order_puts_connectors_last() {
    let doc = r"
shapes:
  - id: top
    type: ellipse
    pos: [0, 0, 50x50]
    z: 5
  - id: bottom
    type: rectangle
    pos: [200, 0, 50x50]
connectors:
  - from: top
    to: bottom
";
    let diagram = validate(&RawDocument::from_yaml_str(doc).expect("yaml")).expect("valid");
    let compiled = SkeletonCompiler::default().compile(&diagram).expect("compile");
    let ids: Vec<&str> = compiled.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["bottom", "top", "top-to-bottom"]);
}
