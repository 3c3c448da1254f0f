use tracing::info;
use uuid::Uuid;

use crate::core::errors::{Result, TrackerError};
use crate::core::ownership::OwnershipGuard;
use crate::core::services::{ensure_in_period, validate_amount, validate_label};
use crate::domain::{Income, IncomeDraft, OwnerId, INCOME_SOURCE_MAX};
use crate::storage::{LedgerStore, TrackerSnapshot};

/// Validated CRUD for period incomes.
pub struct IncomeService;

impl IncomeService {
    pub fn create(store: &LedgerStore, principal: &OwnerId, draft: IncomeDraft) -> Result<Income> {
        let source = validate_label("source", &draft.source, INCOME_SOURCE_MAX)?;
        validate_amount("amount", draft.amount, false)?;
        let income = store.update(|state| {
            check_period(state, principal, &draft)?;
            let income = Income::new(
                principal.clone(),
                draft.period_id,
                source,
                draft.amount,
                draft.date_received,
            );
            state.incomes.push(income.clone());
            Ok::<_, TrackerError>(income)
        })?;
        info!(owner = %principal, income = %income.id, amount = %income.amount, "income recorded");
        Ok(income)
    }

    /// Replaces every editable field of an income.
    pub fn update(
        store: &LedgerStore,
        principal: &OwnerId,
        income_id: Uuid,
        draft: IncomeDraft,
    ) -> Result<Income> {
        let source = validate_label("source", &draft.source, INCOME_SOURCE_MAX)?;
        validate_amount("amount", draft.amount, false)?;
        let updated = store.update(|state| {
            OwnershipGuard::income(state, principal, income_id)?;
            check_period(state, principal, &draft)?;
            let slot = state
                .incomes
                .iter_mut()
                .find(|income| income.id == income_id)
                .ok_or_else(|| TrackerError::NotFound(format!("income {income_id}")))?;
            slot.period_id = draft.period_id;
            slot.source = source;
            slot.amount = draft.amount;
            slot.date_received = draft.date_received;
            Ok::<_, TrackerError>(slot.clone())
        })?;
        info!(owner = %principal, income = %income_id, "income updated");
        Ok(updated)
    }

    pub fn delete(store: &LedgerStore, principal: &OwnerId, income_id: Uuid) -> Result<Income> {
        let removed = store.update(|state| {
            let removed = OwnershipGuard::income(state, principal, income_id)?.clone();
            state.incomes.retain(|income| income.id != income_id);
            Ok::<_, TrackerError>(removed)
        })?;
        info!(owner = %principal, income = %income_id, "income deleted");
        Ok(removed)
    }

    /// Incomes of one period ordered by the date received.
    pub fn list(store: &LedgerStore, principal: &OwnerId, period_id: Uuid) -> Result<Vec<Income>> {
        store.read(|snapshot| {
            OwnershipGuard::period(snapshot, principal, period_id)?;
            let mut incomes: Vec<Income> = snapshot
                .incomes
                .iter()
                .filter(|income| income.period_id == period_id && &income.owner == principal)
                .cloned()
                .collect();
            incomes.sort_by_key(|income| income.date_received);
            Ok::<_, TrackerError>(incomes)
        })?
    }
}

fn check_period(state: &TrackerSnapshot, principal: &OwnerId, draft: &IncomeDraft) -> Result<()> {
    let period = OwnershipGuard::period(state, principal, draft.period_id)?;
    ensure_in_period(period, "date_received", draft.date_received)
}
