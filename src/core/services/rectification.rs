//! Persists recomputed carryover for whole partitions.

use tracing::{debug, info};
use uuid::Uuid;

use crate::core::carryover::CarryoverEngine;
use crate::core::errors::{Result, TrackerError};
use crate::core::ownership::OwnershipGuard;
use crate::domain::{OwnerId, PartitionKey};
use crate::storage::{LedgerStore, PartitionTx, StoreError};

/// Outcome of a rectification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectifyReport {
    /// Entries in the partition after the pass.
    pub rows: usize,
    /// Entries whose stored carryover changed.
    pub updated: usize,
}

/// Recomputes carryover under the partition lock and commits it atomically.
pub struct RectificationService;

impl RectificationService {
    /// Rectifies the partition of `period_id` on behalf of its owner.
    pub fn rectify(
        store: &LedgerStore,
        principal: &OwnerId,
        period_id: Uuid,
    ) -> Result<RectifyReport> {
        let key = store.read(|snapshot| {
            OwnershipGuard::period(snapshot, principal, period_id).map(|p| p.partition_key())
        })??;
        Self::rectify_partition(store, &key)
    }

    /// Rectifies `key` in its own transaction.
    pub fn rectify_partition(store: &LedgerStore, key: &PartitionKey) -> Result<RectifyReport> {
        let report = store.transaction(std::slice::from_ref(key), |tx| {
            Self::rectify_in(tx, key).map_err(TrackerError::from)
        })?;
        info!(
            partition = %key,
            rows = report.rows,
            updated = report.updated,
            "partition rectified"
        );
        Ok(report)
    }

    /// Rectifies `key` inside an open transaction, over its staged (post-mutation) rows.
    pub fn rectify_in(
        tx: &mut PartitionTx<'_>,
        key: &PartitionKey,
    ) -> std::result::Result<RectifyReport, StoreError> {
        let rows = tx.rows_mut(key)?;
        let updated = CarryoverEngine::apply(rows);
        debug!(partition = %key, rows = rows.len(), updated, "carryover staged");
        Ok(RectifyReport {
            rows: rows.len(),
            updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DailySpendingEntry, Period};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn rectify_persists_carryover_for_every_row() {
        let store = LedgerStore::in_memory();
        let owner = OwnerId::new("alice").unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let period = Period::new(owner.clone(), "May", start, start + chrono::Duration::days(30))
            .unwrap();
        let key = period.partition_key();
        let mut rows: Vec<DailySpendingEntry> = (0..3)
            .map(|offset| {
                let mut row = DailySpendingEntry::new(
                    owner.clone(),
                    period.id,
                    start + chrono::Duration::days(offset),
                    dec!(40),
                    dec!(50),
                );
                row.sequence = offset as u64 + 1;
                row
            })
            .collect();
        rows[0].carryover = Some(dec!(999));
        store
            .update(|state| {
                state.periods.push(period.clone());
                state.spendings.extend(rows);
                Ok::<_, StoreError>(())
            })
            .unwrap();

        let report = RectificationService::rectify(&store, &owner, period.id).unwrap();
        assert_eq!(report, RectifyReport { rows: 3, updated: 3 });

        let mut stored = store.partition(&key).unwrap();
        CarryoverEngine::order(&mut stored);
        let carry: Vec<_> = stored.iter().map(|row| row.carryover).collect();
        assert_eq!(carry, vec![Some(dec!(0)), Some(dec!(10)), Some(dec!(20))]);

        let again = RectificationService::rectify(&store, &owner, period.id).unwrap();
        assert_eq!(again.updated, 0);
    }
}
