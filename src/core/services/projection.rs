//! Read-time derivation of carryover for list and detail views.

use uuid::Uuid;

use crate::core::carryover::{CarryoverEngine, ProjectedDay};
use crate::core::errors::{Result, TrackerError};
use crate::core::ownership::OwnershipGuard;
use crate::domain::OwnerId;
use crate::storage::LedgerStore;

/// Recomputes balances from `spent_amount` / `fixed_daily_limit` on every read.
///
/// Reads use a snapshot and take no partition lock, so they may observe the
/// state just before or just after a concurrent writer.
pub struct ProjectionService;

impl ProjectionService {
    /// Returns the whole partition of `period_id` in ledger order.
    pub fn project(
        store: &LedgerStore,
        principal: &OwnerId,
        period_id: Uuid,
    ) -> Result<Vec<ProjectedDay>> {
        let rows = store.read(|snapshot| {
            OwnershipGuard::period(snapshot, principal, period_id)
                .map(|period| snapshot.partition(&period.partition_key()))
        })??;
        Ok(CarryoverEngine::project(rows))
    }

    /// Returns a single day, derived from its full partition.
    pub fn retrieve(
        store: &LedgerStore,
        principal: &OwnerId,
        entry_id: Uuid,
    ) -> Result<ProjectedDay> {
        let rows = store.read(|snapshot| {
            OwnershipGuard::entry(snapshot, principal, entry_id)
                .map(|entry| snapshot.partition(&entry.partition_key()))
        })??;
        CarryoverEngine::project(rows)
            .into_iter()
            .find(|day| day.id == entry_id)
            .ok_or_else(|| TrackerError::NotFound(format!("spending {entry_id}")))
    }
}
