//! Persistence for tracker aggregates.
//!
//! The [`LedgerStore`] keeps the authoritative snapshot in memory, enforces
//! write-time constraints on every commit, and hands the full snapshot to a
//! [`SnapshotBackend`] before a commit becomes visible.

pub mod json_backend;
pub mod locks;
pub mod store;

use std::{
    collections::HashSet,
    io,
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    check_amount, Budget, BudgetCategory, DailySpendingEntry, Income, PartitionKey, Period,
};

pub use json_backend::{BackupInfo, JsonBackend};
pub use locks::{PartitionGuard, PartitionLocks};
pub use store::{LedgerStore, PartitionTx};

/// Highest snapshot schema this build can read.
pub const CURRENT_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("transaction aborted: {0}")]
    Aborted(String),
    #[error("lock poisoned: {0}")]
    Poisoned(String),
    #[error("partition {0} is not part of the transaction")]
    UnlockedPartition(PartitionKey),
    #[error("snapshot schema v{found} is newer than supported v{supported}")]
    UnsupportedSchema { found: u8, supported: u8 },
}

/// Loads and persists whole tracker snapshots.
pub trait SnapshotBackend: Send + Sync {
    fn load(&self) -> Result<TrackerSnapshot, StoreError>;
    fn persist(&self, snapshot: &TrackerSnapshot) -> Result<(), StoreError>;

    /// Where the snapshot lives, for error messages.
    fn location(&self) -> String {
        "in-memory snapshot".to_string()
    }
}

/// Volatile backend that keeps the last persisted snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    saved: Mutex<Option<TrackerSnapshot>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self) -> Result<TrackerSnapshot, StoreError> {
        let saved = self
            .saved
            .lock()
            .map_err(|err| StoreError::Poisoned(err.to_string()))?;
        Ok(saved.clone().unwrap_or_default())
    }

    fn persist(&self, snapshot: &TrackerSnapshot) -> Result<(), StoreError> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|err| StoreError::Poisoned(err.to_string()))?;
        *saved = Some(snapshot.clone());
        Ok(())
    }
}

/// Everything the tracker persists, written and read as one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackerSnapshot {
    pub schema_version: u8,
    /// Next insertion-order key handed to a new spending entry.
    pub next_sequence: u64,
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub categories: Vec<BudgetCategory>,
    #[serde(default)]
    pub incomes: Vec<Income>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub spendings: Vec<DailySpendingEntry>,
}

impl Default for TrackerSnapshot {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            next_sequence: 1,
            periods: Vec::new(),
            categories: Vec::new(),
            incomes: Vec::new(),
            budgets: Vec::new(),
            spendings: Vec::new(),
        }
    }
}

impl TrackerSnapshot {
    pub fn period(&self, id: Uuid) -> Option<&Period> {
        self.periods.iter().find(|period| period.id == id)
    }

    pub fn period_mut(&mut self, id: Uuid) -> Option<&mut Period> {
        self.periods.iter_mut().find(|period| period.id == id)
    }

    pub fn category(&self, id: Uuid) -> Option<&BudgetCategory> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn income(&self, id: Uuid) -> Option<&Income> {
        self.incomes.iter().find(|income| income.id == id)
    }

    pub fn budget(&self, id: Uuid) -> Option<&Budget> {
        self.budgets.iter().find(|budget| budget.id == id)
    }

    pub fn entry(&self, id: Uuid) -> Option<&DailySpendingEntry> {
        self.spendings.iter().find(|entry| entry.id == id)
    }

    /// Returns the rows of one partition in storage order (unsorted).
    pub fn partition(&self, key: &PartitionKey) -> Vec<DailySpendingEntry> {
        self.spendings
            .iter()
            .filter(|entry| entry.owner == key.owner && entry.period_id == key.period_id)
            .cloned()
            .collect()
    }

    /// Swaps every row of `key` for `rows`.
    pub fn replace_partition(&mut self, key: &PartitionKey, rows: Vec<DailySpendingEntry>) {
        self.spendings
            .retain(|entry| !(entry.owner == key.owner && entry.period_id == key.period_id));
        self.spendings.extend(rows);
    }

    /// Highest insertion-order key in use, if any entry exists.
    pub fn max_sequence(&self) -> Option<u64> {
        self.spendings.iter().map(|entry| entry.sequence).max()
    }

    /// Verifies write-time invariants across the whole snapshot.
    pub fn check_constraints(&self) -> Result<(), StoreError> {
        for period in &self.periods {
            if period.end_date < period.start_date {
                return Err(StoreError::Constraint(format!(
                    "period {} ends before it starts",
                    period.id
                )));
            }
        }

        let mut seen_dates = HashSet::new();
        let mut seen_sequences = HashSet::new();
        for entry in &self.spendings {
            let period = self.period(entry.period_id).ok_or_else(|| {
                StoreError::Constraint(format!(
                    "spending {} references missing period {}",
                    entry.id, entry.period_id
                ))
            })?;
            if period.owner != entry.owner {
                return Err(StoreError::Constraint(format!(
                    "spending {} is owned by {} but period {} is owned by {}",
                    entry.id, entry.owner, period.id, period.owner
                )));
            }
            if !period.contains(entry.date) {
                return Err(StoreError::Constraint(format!(
                    "spending date {} is outside period {}",
                    entry.date, period
                )));
            }
            if let Err(violation) = check_amount(entry.spent_amount, true) {
                return Err(StoreError::Constraint(format!("spent_amount {violation}")));
            }
            if let Err(violation) = check_amount(entry.fixed_daily_limit, true) {
                return Err(StoreError::Constraint(format!(
                    "fixed_daily_limit {violation}"
                )));
            }
            if !seen_dates.insert((&entry.owner, entry.period_id, entry.date)) {
                return Err(StoreError::Constraint(format!(
                    "spending already recorded for {} in period {}",
                    entry.date, period.name
                )));
            }
            if !seen_sequences.insert(entry.sequence) {
                return Err(StoreError::Constraint(format!(
                    "duplicate insertion sequence {}",
                    entry.sequence
                )));
            }
        }

        for income in &self.incomes {
            if self.period(income.period_id).is_none() {
                return Err(StoreError::Constraint(format!(
                    "income {} references missing period {}",
                    income.id, income.period_id
                )));
            }
        }

        for budget in &self.budgets {
            if self.period(budget.period_id).is_none() {
                return Err(StoreError::Constraint(format!(
                    "budget {} references missing period {}",
                    budget.id, budget.period_id
                )));
            }
            if self.category(budget.category_id).is_none() {
                return Err(StoreError::Constraint(format!(
                    "budget {} references missing category {}",
                    budget.id, budget.category_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OwnerId;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn seeded() -> (TrackerSnapshot, Period) {
        let owner = OwnerId::new("alice").unwrap();
        let period = Period::new(owner, "January", date(1), date(31)).unwrap();
        let snapshot = TrackerSnapshot {
            periods: vec![period.clone()],
            ..TrackerSnapshot::default()
        };
        (snapshot, period)
    }

    fn entry_for(period: &Period, day: u32, sequence: u64) -> DailySpendingEntry {
        let mut entry =
            DailySpendingEntry::new(period.owner.clone(), period.id, date(day), dec!(10), dec!(100));
        entry.sequence = sequence;
        entry
    }

    #[test]
    fn rejects_duplicate_dates_in_partition() {
        let (mut snapshot, period) = seeded();
        snapshot.spendings.push(entry_for(&period, 3, 1));
        snapshot.spendings.push(entry_for(&period, 3, 2));
        let err = snapshot.check_constraints().unwrap_err();
        assert!(matches!(err, StoreError::Constraint(ref msg) if msg.contains("already recorded")));
    }

    #[test]
    fn rejects_negative_amounts() {
        let (mut snapshot, period) = seeded();
        let mut entry = entry_for(&period, 3, 1);
        entry.spent_amount = dec!(-1);
        snapshot.spendings.push(entry);
        assert!(snapshot.check_constraints().is_err());
    }

    #[test]
    fn rejects_dates_outside_period() {
        let (mut snapshot, period) = seeded();
        let mut entry = entry_for(&period, 3, 1);
        entry.date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        snapshot.spendings.push(entry);
        assert!(snapshot.check_constraints().is_err());
    }

    #[test]
    fn replace_partition_only_touches_matching_rows() {
        let (mut snapshot, period) = seeded();
        let other_owner = OwnerId::new("bob").unwrap();
        let other = Period::new(other_owner, "January", date(1), date(31)).unwrap();
        snapshot.periods.push(other.clone());
        snapshot.spendings.push(entry_for(&period, 1, 1));
        snapshot.spendings.push(entry_for(&other, 1, 2));

        snapshot.replace_partition(&period.partition_key(), vec![entry_for(&period, 2, 3)]);

        assert_eq!(snapshot.spendings.len(), 2);
        assert_eq!(snapshot.partition(&other.partition_key()).len(), 1);
        assert_eq!(snapshot.partition(&period.partition_key())[0].date, date(2));
        assert!(snapshot.check_constraints().is_ok());
    }
}
