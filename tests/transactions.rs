mod common;

use std::{sync::atomic::Ordering, sync::Arc, thread};

use common::{date, march, owner, record, FlakyBackend};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spend_tracker::{
    core::services::{ProjectionService, SpendingDefaults, SpendingService},
    domain::{SpendingDraft, SpendingPatch},
    storage::LedgerStore,
    CarryoverEngine, ErrorKind,
};

#[test]
fn failed_persist_rolls_back_the_mutation_and_its_rectification() {
    let (backend, failing) = FlakyBackend::new();
    let store = LedgerStore::open(Box::new(backend)).unwrap();
    let alice = owner("alice");
    let period = march(&store, &alice);
    let recorded = record(
        &store,
        &alice,
        &period,
        &[(1, dec!(100), dec!(30)), (2, dec!(100), dec!(150))],
    );
    let before = store.snapshot().unwrap();

    failing.store(true, Ordering::SeqCst);
    let err = SpendingService::update(
        &store,
        &alice,
        recorded[0].id,
        SpendingPatch {
            spent_amount: Some(dec!(99)),
            ..SpendingPatch::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert!(err.is_retryable());
    assert_eq!(store.snapshot().unwrap(), before);

    let err = SpendingService::delete(&store, &alice, recorded[1].id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert_eq!(store.snapshot().unwrap(), before);

    failing.store(false, Ordering::SeqCst);
    let days = ProjectionService::project(&store, &alice, period.id).unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[1].remaining, dec!(20));
}

#[test]
fn duplicate_dates_are_rejected_without_side_effects() {
    let store = LedgerStore::in_memory();
    let alice = owner("alice");
    let period = march(&store, &alice);
    record(&store, &alice, &period, &[(4, dec!(25), dec!(5))]);
    let before = store.snapshot().unwrap();

    let err = SpendingService::create(
        &store,
        &SpendingDefaults::default(),
        &alice,
        period.id,
        SpendingDraft::new(date(4), dec!(1)),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.snapshot().unwrap(), before);
}

#[test]
fn concurrent_writers_on_one_period_leave_a_consistent_ledger() {
    let store = Arc::new(LedgerStore::in_memory());
    let alice = owner("alice");
    let period = march(&store, &alice);

    let handles: Vec<_> = (1..=20u32)
        .map(|day| {
            let store = Arc::clone(&store);
            let alice = alice.clone();
            let period_id = period.id;
            thread::spawn(move || {
                SpendingService::create(
                    &store,
                    &SpendingDefaults::default(),
                    &alice,
                    period_id,
                    SpendingDraft::new(date(day), Decimal::from(day)).with_limit(dec!(10)),
                )
                .map(|_| ())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread").expect("spending recorded");
    }

    let mut stored = store.partition(&period.partition_key()).unwrap();
    assert_eq!(stored.len(), 20);
    let projected = CarryoverEngine::project(stored.clone());
    CarryoverEngine::order(&mut stored);
    for (entry, day) in stored.iter().zip(&projected) {
        assert_eq!(entry.carryover, Some(day.carryover_in), "stale carryover on {}", entry.date);
    }
    // Sum of limits (200) minus sum of 1..=20 (210).
    assert_eq!(projected.last().map(|day| day.remaining), Some(dec!(-10)));

    let mut sequences: Vec<_> = stored.iter().map(|entry| entry.sequence).collect();
    sequences.sort_unstable();
    sequences.dedup();
    assert_eq!(sequences.len(), 20);
}

#[test]
fn readers_never_observe_a_half_applied_partition() {
    let store = Arc::new(LedgerStore::in_memory());
    let alice = owner("alice");
    let period = march(&store, &alice);
    let recorded = record(&store, &alice, &period, &[(1, dec!(50), dec!(0))]);

    let writer = {
        let store = Arc::clone(&store);
        let alice = alice.clone();
        let id = recorded[0].id;
        thread::spawn(move || {
            for round in 0..50u32 {
                let patch = SpendingPatch {
                    spent_amount: Some(Decimal::from(round % 7)),
                    ..SpendingPatch::default()
                };
                SpendingService::update(&store, &alice, id, patch).expect("update");
            }
        })
    };

    for _ in 0..50 {
        let days = ProjectionService::project(&store, &alice, period.id).unwrap();
        for day in days {
            assert_eq!(day.remaining, day.carryover_in + day.fixed_daily_limit - day.spent_amount);
        }
    }
    writer.join().expect("writer thread");
}
