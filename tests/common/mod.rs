#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use spend_tracker::{
    core::services::{PeriodDraft, PeriodService, SpendingDefaults, SpendingService},
    domain::{OwnerId, Period, SpendingDraft},
    storage::{LedgerStore, MemoryBackend, SnapshotBackend, StoreError, TrackerSnapshot},
    ProjectedDay,
};

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).expect("valid March date")
}

pub fn owner(name: &str) -> OwnerId {
    OwnerId::new(name).expect("non-blank owner")
}

pub fn march(store: &LedgerStore, principal: &OwnerId) -> Period {
    PeriodService::create(
        store,
        principal,
        PeriodDraft {
            name: "March".into(),
            start_date: date(1),
            end_date: date(31),
        },
    )
    .expect("create March")
}

/// Records `(day, limit, spent)` rows in the given order.
pub fn record(
    store: &LedgerStore,
    principal: &OwnerId,
    period: &Period,
    rows: &[(u32, Decimal, Decimal)],
) -> Vec<ProjectedDay> {
    rows.iter()
        .map(|(day, limit, spent)| {
            SpendingService::create(
                store,
                &SpendingDefaults::default(),
                principal,
                period.id,
                SpendingDraft::new(date(*day), *spent).with_limit(*limit),
            )
            .expect("record spending")
        })
        .collect()
}

/// Memory backend whose persist step can be switched to fail.
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    failing: Arc<AtomicBool>,
}

impl FlakyBackend {
    pub fn new() -> (Self, Arc<AtomicBool>) {
        let backend = Self::default();
        let switch = Arc::clone(&backend.failing);
        (backend, switch)
    }
}

impl SnapshotBackend for FlakyBackend {
    fn load(&self) -> Result<TrackerSnapshot, StoreError> {
        self.inner.load()
    }

    fn persist(&self, snapshot: &TrackerSnapshot) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk unavailable",
            )));
        }
        self.inner.persist(snapshot)
    }
}
