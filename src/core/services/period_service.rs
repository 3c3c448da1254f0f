//! Period lifecycle, savings, and per-period summaries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::core::carryover::CarryoverEngine;
use crate::core::errors::{Result, TrackerError};
use crate::core::ownership::OwnershipGuard;
use crate::core::services::{validate_amount, validate_label};
use crate::domain::{OwnerId, Period, PERIOD_NAME_MAX};
use crate::storage::LedgerStore;

/// Input for creating a period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Partial update of a period's name or range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodPatch {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Totals for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period_id: Uuid,
    pub name: String,
    pub day_count: i64,
    pub total_savings: Decimal,
    pub total_income: Decimal,
    pub total_allocated: Decimal,
    pub total_paid: Decimal,
    /// Income minus every budget allocation, paid or not.
    pub leftover_after_budgets: Decimal,
    pub total_spent: Decimal,
    pub total_daily_limit: Decimal,
    /// Carryover out of the last recorded day.
    pub closing_balance: Decimal,
    pub over_limit_days: usize,
    pub recorded_days: usize,
}

pub struct PeriodService;

impl PeriodService {
    pub fn create(store: &LedgerStore, principal: &OwnerId, draft: PeriodDraft) -> Result<Period> {
        let name = validate_label("name", &draft.name, PERIOD_NAME_MAX)?;
        let period = Period::new(principal.clone(), name, draft.start_date, draft.end_date)
            .map_err(|err| TrackerError::Validation(err.to_string()))?;
        let stored = period.clone();
        store.update(move |state| {
            state.periods.push(stored);
            Ok::<_, TrackerError>(())
        })?;
        info!(owner = %principal, period = %period.id, name = %period.name, "period created");
        Ok(period)
    }

    /// Periods owned by `principal`, earliest first.
    pub fn list(store: &LedgerStore, principal: &OwnerId) -> Result<Vec<Period>> {
        let mut periods = store.read(|snapshot| {
            snapshot
                .periods
                .iter()
                .filter(|period| &period.owner == principal)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        periods.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(periods)
    }

    pub fn get(store: &LedgerStore, principal: &OwnerId, period_id: Uuid) -> Result<Period> {
        store.read(|snapshot| OwnershipGuard::period(snapshot, principal, period_id).cloned())?
    }

    /// Renames or moves a period; refuses ranges that would strand existing records.
    pub fn update(
        store: &LedgerStore,
        principal: &OwnerId,
        period_id: Uuid,
        patch: PeriodPatch,
    ) -> Result<Period> {
        let name = patch
            .name
            .as_deref()
            .map(|name| validate_label("name", name, PERIOD_NAME_MAX))
            .transpose()?;
        let key = Self::get(store, principal, period_id)?.partition_key();

        let updated = store.update_locked(std::slice::from_ref(&key), |state| {
            let current = OwnershipGuard::period(state, principal, period_id)?.clone();
            let start = patch.start_date.unwrap_or(current.start_date);
            let end = patch.end_date.unwrap_or(current.end_date);

            let mut updated = current;
            updated
                .set_range(start, end)
                .map_err(|err| TrackerError::Validation(err.to_string()))?;
            if let Some(name) = name {
                updated.name = name;
            }

            if let Some(entry) = state
                .spendings
                .iter()
                .find(|entry| entry.period_id == period_id && !updated.contains(entry.date))
            {
                return Err(TrackerError::Validation(format!(
                    "spending on {} would fall outside the new range",
                    entry.date
                )));
            }
            if let Some(income) = state
                .incomes
                .iter()
                .find(|income| income.period_id == period_id && !updated.contains(income.date_received))
            {
                return Err(TrackerError::Validation(format!(
                    "income `{}` received {} would fall outside the new range",
                    income.source, income.date_received
                )));
            }

            if let Some((budget, due)) = state
                .budgets
                .iter()
                .filter(|budget| budget.period_id == period_id)
                .find_map(|budget| {
                    budget
                        .due_date
                        .filter(|due| !updated.contains(*due))
                        .map(|due| (budget, due))
                })
            {
                return Err(TrackerError::Validation(format!(
                    "budget {} due {} would fall outside the new range",
                    budget.id, due
                )));
            }

            if let Some(slot) = state.period_mut(period_id) {
                *slot = updated.clone();
            }
            Ok(updated)
        })?;
        info!(owner = %principal, period = %period_id, "period updated");
        Ok(updated)
    }

    /// Deletes a period together with its spendings, incomes, and budgets.
    pub fn delete(store: &LedgerStore, principal: &OwnerId, period_id: Uuid) -> Result<Period> {
        let key = Self::get(store, principal, period_id)?.partition_key();
        let (removed, spendings, incomes, budgets) =
            store.update_locked(std::slice::from_ref(&key), |state| {
                let removed = OwnershipGuard::period(state, principal, period_id)?.clone();
                let before = (
                    state.spendings.len(),
                    state.incomes.len(),
                    state.budgets.len(),
                );
                state.spendings.retain(|entry| entry.period_id != period_id);
                state.incomes.retain(|income| income.period_id != period_id);
                state.budgets.retain(|budget| budget.period_id != period_id);
                state.periods.retain(|period| period.id != period_id);
                Ok::<_, TrackerError>((
                    removed,
                    before.0 - state.spendings.len(),
                    before.1 - state.incomes.len(),
                    before.2 - state.budgets.len(),
                ))
            })?;
        info!(
            owner = %principal,
            period = %period_id,
            spendings,
            incomes,
            budgets,
            "period deleted"
        );
        Ok(removed)
    }

    /// Adds a signed `delta` to the period's savings total.
    pub fn adjust_savings(
        store: &LedgerStore,
        principal: &OwnerId,
        period_id: Uuid,
        delta: Decimal,
    ) -> Result<Period> {
        validate_amount("savings adjustment", delta.abs(), false)?;
        let key = Self::get(store, principal, period_id)?.partition_key();
        let updated = store.update_locked(std::slice::from_ref(&key), |state| {
            OwnershipGuard::period(state, principal, period_id)?;
            let period = state
                .period_mut(period_id)
                .ok_or_else(|| TrackerError::NotFound(format!("period {period_id}")))?;
            let total = period.total_savings + delta;
            validate_amount("total_savings", total.abs(), true)?;
            period.total_savings = total;
            Ok::<_, TrackerError>(period.clone())
        })?;
        info!(
            owner = %principal,
            period = %period_id,
            delta = %delta,
            total = %updated.total_savings,
            "savings adjusted"
        );
        Ok(updated)
    }

    /// Aggregates income, budgets, and the spending projection of one period.
    pub fn summary(
        store: &LedgerStore,
        principal: &OwnerId,
        period_id: Uuid,
    ) -> Result<PeriodSummary> {
        let (period, rows, incomes, budgets) = store.read(|snapshot| {
            let period = OwnershipGuard::period(snapshot, principal, period_id)?.clone();
            let rows = snapshot.partition(&period.partition_key());
            let incomes: Vec<Decimal> = snapshot
                .incomes
                .iter()
                .filter(|income| income.period_id == period_id && &income.owner == principal)
                .map(|income| income.amount)
                .collect();
            let budgets: Vec<(Decimal, bool)> = snapshot
                .budgets
                .iter()
                .filter(|budget| budget.period_id == period_id && &budget.owner == principal)
                .map(|budget| (budget.amount_allocated, budget.status.is_paid()))
                .collect();
            Ok::<_, TrackerError>((period, rows, incomes, budgets))
        })??;

        let days = CarryoverEngine::project(rows);
        let total_income: Decimal = incomes.iter().copied().sum();
        let total_allocated: Decimal = budgets.iter().map(|(amount, _)| *amount).sum();
        let total_paid: Decimal = budgets
            .iter()
            .filter(|(_, paid)| *paid)
            .map(|(amount, _)| *amount)
            .sum();

        Ok(PeriodSummary {
            period_id: period.id,
            name: period.name.clone(),
            day_count: period.day_count(),
            total_savings: period.total_savings,
            total_income,
            total_allocated,
            total_paid,
            leftover_after_budgets: total_income - total_allocated,
            total_spent: days.iter().map(|day| day.spent_amount).sum(),
            total_daily_limit: days.iter().map(|day| day.fixed_daily_limit).sum(),
            closing_balance: days.last().map_or(Decimal::ZERO, |day| day.remaining),
            over_limit_days: days.iter().filter(|day| day.is_over_limit).count(),
            recorded_days: days.len(),
        })
    }
}
