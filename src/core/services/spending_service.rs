//! Validated CRUD for daily spending entries.
//!
//! Every mutation runs inside one partition transaction and rectifies the
//! affected partitions before committing.

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::core::carryover::ProjectedDay;
use crate::core::errors::{Result, TrackerError};
use crate::core::ownership::OwnershipGuard;
use crate::core::services::{
    ensure_in_period, validate_amount, ProjectionService, RectificationService,
};
use crate::domain::{DailySpendingEntry, OwnerId, PartitionKey, SpendingDraft, SpendingPatch};
use crate::storage::{LedgerStore, PartitionTx};

/// Limit used when neither the draft nor the period provides one.
pub const FALLBACK_DAILY_LIMIT: Decimal = Decimal::ONE_HUNDRED;

/// How new entries pick their `fixed_daily_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendingDefaults {
    pub default_daily_limit: Decimal,
    /// When set, the first entry of a period records its limit as the period default.
    pub seed_period_daily_limit: bool,
}

impl Default for SpendingDefaults {
    fn default() -> Self {
        Self {
            default_daily_limit: FALLBACK_DAILY_LIMIT,
            seed_period_daily_limit: false,
        }
    }
}

impl From<&Config> for SpendingDefaults {
    fn from(config: &Config) -> Self {
        Self {
            default_daily_limit: config.default_daily_limit,
            seed_period_daily_limit: config.seed_period_daily_limit,
        }
    }
}

pub struct SpendingService;

impl SpendingService {
    /// Records a new day of spending and returns it with derived balances.
    pub fn create(
        store: &LedgerStore,
        defaults: &SpendingDefaults,
        principal: &OwnerId,
        period_id: Uuid,
        draft: SpendingDraft,
    ) -> Result<ProjectedDay> {
        validate_amount("spent_amount", draft.spent_amount, true)?;
        if let Some(limit) = draft.fixed_daily_limit {
            validate_amount("fixed_daily_limit", limit, true)?;
        }
        let key = store.read(|snapshot| {
            OwnershipGuard::period(snapshot, principal, period_id).map(|p| p.partition_key())
        })??;

        let id = store.transaction(std::slice::from_ref(&key), |tx| {
            let period = tx
                .period(period_id)
                .cloned()
                .ok_or_else(|| TrackerError::NotFound(format!("period {period_id}")))?;
            ensure_in_period(&period, "date", draft.date)?;
            ensure_free_date(tx, &key, draft.date, None)?;

            let limit = draft
                .fixed_daily_limit
                .or(period.default_daily_limit)
                .unwrap_or(defaults.default_daily_limit);
            if defaults.seed_period_daily_limit {
                if let Some(period) = tx.period_mut(period_id) {
                    period.seed_daily_limit(limit);
                }
            }

            let entry = DailySpendingEntry::new(
                principal.clone(),
                period_id,
                draft.date,
                draft.spent_amount,
                limit,
            );
            let id = tx.insert(entry)?;
            RectificationService::rectify_in(tx, &key)?;
            Ok::<_, TrackerError>(id)
        })?;

        info!(owner = %principal, period = %period_id, entry = %id, date = %draft.date, "spending recorded");
        ProjectionService::retrieve(store, principal, id)
    }

    /// Applies a partial update; moving to another period rectifies both partitions.
    pub fn update(
        store: &LedgerStore,
        principal: &OwnerId,
        entry_id: Uuid,
        patch: SpendingPatch,
    ) -> Result<ProjectedDay> {
        if let Some(spent) = patch.spent_amount {
            validate_amount("spent_amount", spent, true)?;
        }
        if let Some(limit) = patch.fixed_daily_limit {
            validate_amount("fixed_daily_limit", limit, true)?;
        }
        if patch.is_empty() {
            return ProjectionService::retrieve(store, principal, entry_id);
        }

        let (source, target) = store.read(|snapshot| -> Result<(PartitionKey, PartitionKey)> {
            let entry = OwnershipGuard::entry(snapshot, principal, entry_id)?;
            let source = entry.partition_key();
            let target = match patch.period_id {
                Some(period_id) if period_id != entry.period_id => {
                    OwnershipGuard::period(snapshot, principal, period_id)?.partition_key()
                }
                _ => source.clone(),
            };
            Ok((source, target))
        })??;

        let mut keys = vec![source.clone()];
        if target != source {
            keys.push(target.clone());
        }

        store.transaction(&keys, |tx| {
            let mut entry = tx
                .remove(&source, entry_id)?
                .ok_or_else(|| TrackerError::NotFound(format!("spending {entry_id}")))?;
            let period = tx
                .period(target.period_id)
                .cloned()
                .ok_or_else(|| TrackerError::NotFound(format!("period {}", target.period_id)))?;

            entry.period_id = period.id;
            if let Some(date) = patch.date {
                entry.date = date;
            }
            if let Some(spent) = patch.spent_amount {
                entry.spent_amount = spent;
            }
            if let Some(limit) = patch.fixed_daily_limit {
                entry.fixed_daily_limit = limit;
            }
            ensure_in_period(&period, "date", entry.date)?;
            ensure_free_date(tx, &target, entry.date, Some(entry_id))?;
            entry.touch();
            tx.rows_mut(&target)?.push(entry);

            for key in &keys {
                RectificationService::rectify_in(tx, key)?;
            }
            Ok::<_, TrackerError>(())
        })?;

        info!(
            owner = %principal,
            entry = %entry_id,
            moved = target != source,
            "spending updated"
        );
        ProjectionService::retrieve(store, principal, entry_id)
    }

    /// Deletes an entry and rectifies the rows left behind.
    pub fn delete(
        store: &LedgerStore,
        principal: &OwnerId,
        entry_id: Uuid,
    ) -> Result<DailySpendingEntry> {
        let key = store.read(|snapshot| {
            OwnershipGuard::entry(snapshot, principal, entry_id).map(|e| e.partition_key())
        })??;
        let removed = store.transaction(std::slice::from_ref(&key), |tx| {
            let removed = tx
                .remove(&key, entry_id)?
                .ok_or_else(|| TrackerError::NotFound(format!("spending {entry_id}")))?;
            RectificationService::rectify_in(tx, &key)?;
            Ok::<_, TrackerError>(removed)
        })?;
        info!(owner = %principal, entry = %entry_id, date = %removed.date, "spending deleted");
        Ok(removed)
    }

    pub fn list(
        store: &LedgerStore,
        principal: &OwnerId,
        period_id: Uuid,
    ) -> Result<Vec<ProjectedDay>> {
        ProjectionService::project(store, principal, period_id)
    }

    pub fn retrieve(
        store: &LedgerStore,
        principal: &OwnerId,
        entry_id: Uuid,
    ) -> Result<ProjectedDay> {
        ProjectionService::retrieve(store, principal, entry_id)
    }
}

fn ensure_free_date(
    tx: &PartitionTx<'_>,
    key: &PartitionKey,
    date: chrono::NaiveDate,
    ignore: Option<Uuid>,
) -> Result<()> {
    let taken = tx
        .rows(key)?
        .iter()
        .any(|row| row.date == date && Some(row.id) != ignore);
    if taken {
        return Err(TrackerError::Validation(format!(
            "spending for {date} already exists in this period"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use crate::domain::Period;
    use crate::storage::StoreError;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn setup() -> (LedgerStore, OwnerId, Period) {
        let store = LedgerStore::in_memory();
        let owner = OwnerId::new("alice").unwrap();
        let period = Period::new(owner.clone(), "March", date(1), date(31)).unwrap();
        let stored = period.clone();
        store
            .update(move |state| {
                state.periods.push(stored);
                Ok::<_, StoreError>(())
            })
            .unwrap();
        (store, owner, period)
    }

    #[test]
    fn create_defaults_limit_and_rejects_duplicate_dates() {
        let (store, owner, period) = setup();
        let defaults = SpendingDefaults::default();
        let day = SpendingService::create(
            &store,
            &defaults,
            &owner,
            period.id,
            SpendingDraft::new(date(2), dec!(30)),
        )
        .unwrap();
        assert_eq!(day.fixed_daily_limit, dec!(100));
        assert_eq!(day.remaining, dec!(70));

        let err = SpendingService::create(
            &store,
            &defaults,
            &owner,
            period.id,
            SpendingDraft::new(date(2), dec!(5)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn create_rejects_dates_outside_the_period() {
        let (store, owner, period) = setup();
        let outside = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let err = SpendingService::create(
            &store,
            &SpendingDefaults::default(),
            &owner,
            period.id,
            SpendingDraft::new(outside, dec!(1)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(store.partition(&period.partition_key()).unwrap().is_empty());
    }

    #[test]
    fn seeding_keeps_the_first_limit() {
        let (store, owner, period) = setup();
        let defaults = SpendingDefaults {
            seed_period_daily_limit: true,
            ..SpendingDefaults::default()
        };
        SpendingService::create(
            &store,
            &defaults,
            &owner,
            period.id,
            SpendingDraft::new(date(1), dec!(10)).with_limit(dec!(60)),
        )
        .unwrap();
        let second = SpendingService::create(
            &store,
            &defaults,
            &owner,
            period.id,
            SpendingDraft::new(date(2), dec!(10)),
        )
        .unwrap();
        assert_eq!(second.fixed_daily_limit, dec!(60));
        let stored = store
            .read(|snapshot| snapshot.period(period.id).cloned())
            .unwrap()
            .unwrap();
        assert_eq!(stored.default_daily_limit, Some(dec!(60)));
    }

    #[test]
    fn update_recomputes_later_days() {
        let (store, owner, period) = setup();
        let defaults = SpendingDefaults::default();
        let first = SpendingService::create(
            &store,
            &defaults,
            &owner,
            period.id,
            SpendingDraft::new(date(1), dec!(30)),
        )
        .unwrap();
        SpendingService::create(
            &store,
            &defaults,
            &owner,
            period.id,
            SpendingDraft::new(date(2), dec!(50)),
        )
        .unwrap();

        SpendingService::update(
            &store,
            &owner,
            first.id,
            SpendingPatch {
                spent_amount: Some(dec!(130)),
                ..SpendingPatch::default()
            },
        )
        .unwrap();

        let days = SpendingService::list(&store, &owner, period.id).unwrap();
        assert_eq!(days[0].remaining, dec!(-30));
        assert!(days[0].is_over_limit);
        assert_eq!(days[1].carryover_in, dec!(-30));
        assert_eq!(days[1].remaining, dec!(20));
    }

    #[test]
    fn foreign_entries_read_as_missing() {
        let (store, owner, period) = setup();
        let day = SpendingService::create(
            &store,
            &SpendingDefaults::default(),
            &owner,
            period.id,
            SpendingDraft::new(date(4), dec!(1)),
        )
        .unwrap();
        let mallory = OwnerId::new("mallory").unwrap();
        let err = SpendingService::delete(&store, &mallory, day.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
