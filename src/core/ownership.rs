//! Ownership checks run before any service touches the store.

use uuid::Uuid;

use crate::core::errors::{Result, TrackerError};
use crate::domain::{
    Budget, BudgetCategory, DailySpendingEntry, Identifiable, Income, OwnerId, Owned, Period,
};
use crate::storage::TrackerSnapshot;

/// Resolves referenced aggregates on behalf of a principal.
///
/// Periods and categories named by the caller that belong to someone else are
/// authorization failures. Records looked up by id (spendings, incomes,
/// budgets) are scoped to the principal, so foreign ones read as missing.
pub struct OwnershipGuard;

impl OwnershipGuard {
    /// Fails with [`TrackerError::Authorization`] when `principal` does not own `entity`.
    pub fn ensure_owned<T>(entity: &T, principal: &OwnerId, label: &str) -> Result<()>
    where
        T: Owned + Identifiable,
    {
        if entity.owner() != principal {
            tracing::warn!(
                principal = %principal,
                entity = %entity.id(),
                kind = label,
                "ownership check failed"
            );
            return Err(TrackerError::Authorization(format!(
                "this {label} doesn't belong to you"
            )));
        }
        Ok(())
    }

    pub fn period<'a>(
        snapshot: &'a TrackerSnapshot,
        principal: &OwnerId,
        period_id: Uuid,
    ) -> Result<&'a Period> {
        let period = snapshot
            .period(period_id)
            .ok_or_else(|| TrackerError::NotFound(format!("period {period_id}")))?;
        Self::ensure_owned(period, principal, "period")?;
        Ok(period)
    }

    pub fn category<'a>(
        snapshot: &'a TrackerSnapshot,
        principal: &OwnerId,
        category_id: Uuid,
    ) -> Result<&'a BudgetCategory> {
        let category = snapshot
            .category(category_id)
            .ok_or_else(|| TrackerError::NotFound(format!("category {category_id}")))?;
        Self::ensure_owned(category, principal, "category")?;
        Ok(category)
    }

    pub fn entry<'a>(
        snapshot: &'a TrackerSnapshot,
        principal: &OwnerId,
        entry_id: Uuid,
    ) -> Result<&'a DailySpendingEntry> {
        snapshot
            .entry(entry_id)
            .filter(|entry| entry.owner() == principal)
            .ok_or_else(|| TrackerError::NotFound(format!("spending {entry_id}")))
    }

    pub fn income<'a>(
        snapshot: &'a TrackerSnapshot,
        principal: &OwnerId,
        income_id: Uuid,
    ) -> Result<&'a Income> {
        snapshot
            .income(income_id)
            .filter(|income| income.owner() == principal)
            .ok_or_else(|| TrackerError::NotFound(format!("income {income_id}")))
    }

    pub fn budget<'a>(
        snapshot: &'a TrackerSnapshot,
        principal: &OwnerId,
        budget_id: Uuid,
    ) -> Result<&'a Budget> {
        snapshot
            .budget(budget_id)
            .filter(|budget| budget.owner() == principal)
            .ok_or_else(|| TrackerError::NotFound(format!("budget {budget_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use chrono::NaiveDate;

    fn snapshot_with(period: &Period) -> TrackerSnapshot {
        TrackerSnapshot {
            periods: vec![period.clone()],
            ..TrackerSnapshot::default()
        }
    }

    #[test]
    fn foreign_period_is_an_authorization_failure() {
        let alice = OwnerId::new("alice").unwrap();
        let bob = OwnerId::new("bob").unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        let period = Period::new(alice.clone(), "April", start, end).unwrap();
        let snapshot = snapshot_with(&period);

        assert!(OwnershipGuard::period(&snapshot, &alice, period.id).is_ok());
        let err = OwnershipGuard::period(&snapshot, &bob, period.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn missing_period_is_not_found() {
        let alice = OwnerId::new("alice").unwrap();
        let err = OwnershipGuard::period(&TrackerSnapshot::default(), &alice, Uuid::new_v4())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
