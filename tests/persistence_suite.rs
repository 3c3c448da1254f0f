mod common;

use std::fs;

use common::{date, march, owner, record};
use rust_decimal_macros::dec;
use spend_tracker::{
    core::services::{ProjectionService, SpendingService},
    storage::{JsonBackend, LedgerStore, SnapshotBackend, StoreError},
    utils::files::tmp_path,
    ErrorKind, TrackerError,
};
use tempfile::tempdir;

fn backend_in(root: &std::path::Path, retention: usize) -> JsonBackend {
    JsonBackend::with_retention(root.join("data"), root.join("backups"), retention)
        .expect("create json backend")
}

#[test]
fn reopening_the_store_restores_rows_and_sequences() {
    let temp = tempdir().unwrap();
    let alice = owner("alice");
    let period = {
        let store = LedgerStore::open(Box::new(backend_in(temp.path(), 3))).unwrap();
        let period = march(&store, &alice);
        record(
            &store,
            &alice,
            &period,
            &[(1, dec!(100), dec!(30)), (2, dec!(100), dec!(150))],
        );
        period
    };

    let store = LedgerStore::open(Box::new(backend_in(temp.path(), 3))).unwrap();
    let days = ProjectionService::project(&store, &alice, period.id).unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[1].carryover_in, dec!(70));

    let added = record(&store, &alice, &period, &[(3, dec!(100), dec!(20))]);
    assert!(added[0].sequence > days[1].sequence);
}

#[test]
fn failed_atomic_write_keeps_the_previous_snapshot() {
    let temp = tempdir().unwrap();
    let backend = backend_in(temp.path(), 3);
    let snapshot_path = backend.snapshot_path().to_path_buf();
    let store = LedgerStore::open(Box::new(backend)).unwrap();
    let alice = owner("alice");
    let period = march(&store, &alice);
    let recorded = record(&store, &alice, &period, &[(1, dec!(100), dec!(30))]);
    let original = fs::read_to_string(&snapshot_path).unwrap();

    // A directory at the staging path makes the temp file impossible to create.
    fs::create_dir_all(tmp_path(&snapshot_path)).unwrap();

    let err = SpendingService::delete(&store, &alice, recorded[0].id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert_eq!(fs::read_to_string(&snapshot_path).unwrap(), original);
    assert_eq!(
        ProjectionService::project(&store, &alice, period.id).unwrap().len(),
        1
    );
}

#[test]
fn backups_are_pruned_to_the_retention_count() {
    let temp = tempdir().unwrap();
    let backend = backend_in(temp.path(), 2);
    let store = LedgerStore::open(Box::new(backend.clone())).unwrap();
    march(&store, &owner("alice"));

    for note in ["first", "second", "third"] {
        backend.backup(Some(note)).unwrap();
    }

    let backups = backend.list_backups().unwrap();
    assert_eq!(backups.len(), 2);
    assert!(backups[0].id.contains("third"));
    assert!(backups.iter().all(|info| !info.id.contains("first")));
}

#[test]
fn restoring_a_backup_replaces_the_snapshot() {
    let temp = tempdir().unwrap();
    let backend = backend_in(temp.path(), 5);
    let alice = owner("alice");
    let store = LedgerStore::open(Box::new(backend.clone())).unwrap();
    let period = march(&store, &alice);
    let backup = backend.backup(None).unwrap();

    record(&store, &alice, &period, &[(1, dec!(100), dec!(30))]);
    assert_eq!(backend.load().unwrap().spendings.len(), 1);

    backend.restore_backup(&backup.id).unwrap();
    let reopened = LedgerStore::open(Box::new(backend)).unwrap();
    assert!(ProjectionService::project(&reopened, &alice, period.id)
        .unwrap()
        .is_empty());
}

#[test]
fn snapshots_from_a_newer_schema_are_refused() {
    let temp = tempdir().unwrap();
    let backend = backend_in(temp.path(), 1);
    fs::write(
        backend.snapshot_path(),
        r#"{ "schema_version": 99, "next_sequence": 1 }"#,
    )
    .unwrap();

    let err = match LedgerStore::open(Box::new(backend)) {
        Ok(_) => panic!("newer schema should be refused"),
        Err(err) => err,
    };
    assert!(matches!(err, StoreError::UnsupportedSchema { found: 99, .. }));
    assert_eq!(TrackerError::from(err).kind(), ErrorKind::Storage);
}

#[test]
fn inconsistent_snapshots_are_refused_at_open() {
    let temp = tempdir().unwrap();
    let alice = owner("alice");
    let backend = backend_in(temp.path(), 1);
    {
        let store = LedgerStore::open(Box::new(backend.clone())).unwrap();
        let period = march(&store, &alice);
        record(&store, &alice, &period, &[(4, dec!(100), dec!(10))]);
    }
    let mut snapshot = backend.load().unwrap();
    snapshot.spendings[0].date = date(31).succ_opt().unwrap();
    backend.persist(&snapshot).unwrap();

    let err = match LedgerStore::open(Box::new(backend.clone())) {
        Ok(_) => panic!("a spending outside its period should be refused"),
        Err(err) => err,
    };
    let message = err.to_string();
    assert!(matches!(err, StoreError::Serde(_)));
    assert!(message.contains("tracker.json"), "{message}");
    assert!(message.contains("inconsistent"), "{message}");
}
