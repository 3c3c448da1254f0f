//! Rolling carryover computation for daily spending.
//!
//! Carryover is a single left-to-right fold over one partition ordered by
//! `(date, sequence)`. The accumulator starts at zero and every day passes its
//! signed `remaining` balance to the next one; deficits are never clamped.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::DailySpendingEntry;

/// The two inputs the fold reads from each day.
pub trait DailyAllowance {
    fn spent_amount(&self) -> Decimal;
    fn fixed_daily_limit(&self) -> Decimal;
}

impl DailyAllowance for DailySpendingEntry {
    fn spent_amount(&self) -> Decimal {
        self.spent_amount
    }

    fn fixed_daily_limit(&self) -> Decimal {
        self.fixed_daily_limit
    }
}

/// Output of the fold for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CarryoverStep {
    pub carryover_in: Decimal,
    pub remaining: Decimal,
    pub is_over_limit: bool,
}

impl CarryoverStep {
    /// Computes one day given the balance carried in.
    pub fn next(carryover_in: Decimal, day: &impl DailyAllowance) -> Self {
        let remaining = carryover_in + day.fixed_daily_limit() - day.spent_amount();
        Self {
            carryover_in,
            remaining,
            is_over_limit: remaining < Decimal::ZERO,
        }
    }
}

/// A spending entry with its derived balances, as returned to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectedDay {
    pub id: Uuid,
    pub period_id: Uuid,
    pub date: NaiveDate,
    pub sequence: u64,
    pub spent_amount: Decimal,
    pub fixed_daily_limit: Decimal,
    pub carryover_in: Decimal,
    pub remaining: Decimal,
    pub is_over_limit: bool,
}

impl ProjectedDay {
    fn from_step(entry: &DailySpendingEntry, step: CarryoverStep) -> Self {
        Self {
            id: entry.id,
            period_id: entry.period_id,
            date: entry.date,
            sequence: entry.sequence,
            spent_amount: entry.spent_amount,
            fixed_daily_limit: entry.fixed_daily_limit,
            carryover_in: step.carryover_in,
            remaining: step.remaining,
            is_over_limit: step.is_over_limit,
        }
    }
}

/// Stateless carryover helpers shared by projection and rectification.
pub struct CarryoverEngine;

impl CarryoverEngine {
    /// Sorts a partition into ledger order: date ascending, then insertion order.
    pub fn order(entries: &mut [DailySpendingEntry]) {
        entries.sort_by(|a, b| a.ledger_order(b));
    }

    /// Folds an already ordered sequence into one step per day.
    pub fn fold<'a, T, I>(days: I) -> Vec<CarryoverStep>
    where
        T: DailyAllowance + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut carry = Decimal::ZERO;
        days.into_iter()
            .map(|day| {
                let step = CarryoverStep::next(carry, day);
                carry = step.remaining;
                step
            })
            .collect()
    }

    /// Orders a partition and derives every day's balances without touching storage.
    pub fn project(mut entries: Vec<DailySpendingEntry>) -> Vec<ProjectedDay> {
        Self::order(&mut entries);
        let steps = Self::fold(&entries);
        entries
            .iter()
            .zip(steps)
            .map(|(entry, step)| ProjectedDay::from_step(entry, step))
            .collect()
    }

    /// Orders a partition and rewrites each entry's carryover in place.
    ///
    /// Returns how many entries had a different carryover before the call.
    pub fn apply(entries: &mut [DailySpendingEntry]) -> usize {
        Self::order(entries);
        let steps = Self::fold(entries.iter());
        let mut changed = 0;
        for (entry, step) in entries.iter_mut().zip(steps) {
            if entry.carryover != Some(step.carryover_in) {
                entry.carryover = Some(step.carryover_in);
                changed += 1;
            }
        }
        tracing::debug!(rows = entries.len(), changed, "carryover applied");
        changed
    }

    /// Balance carried out of the last day, or zero for an empty partition.
    pub fn closing_balance(entries: Vec<DailySpendingEntry>) -> Decimal {
        Self::project(entries)
            .last()
            .map_or(Decimal::ZERO, |day| day.remaining)
    }
}
