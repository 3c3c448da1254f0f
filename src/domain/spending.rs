//! Daily household spending records and their derived balances.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Identifiable, OwnerId, Owned, PartitionKey};

/// One day of spending within a period.
///
/// `carryover` is derived state: it is rewritten by rectification after every
/// mutation of the partition and is never read back as ground truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailySpendingEntry {
    pub id: Uuid,
    pub period_id: Uuid,
    pub owner: OwnerId,
    pub date: NaiveDate,
    /// Monotonic insertion-order key assigned by the store.
    pub sequence: u64,
    pub spent_amount: Decimal,
    pub fixed_daily_limit: Decimal,
    #[serde(default)]
    pub carryover: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailySpendingEntry {
    pub fn new(
        owner: OwnerId,
        period_id: Uuid,
        date: NaiveDate,
        spent_amount: Decimal,
        fixed_daily_limit: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            period_id,
            owner,
            date,
            sequence: 0,
            spent_amount,
            fixed_daily_limit,
            carryover: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::new(self.owner.clone(), self.period_id)
    }

    /// Balance left after today's spend, including whatever was carried in.
    pub fn remaining_for_day(&self) -> Decimal {
        self.carryover.unwrap_or(Decimal::ZERO) + self.fixed_daily_limit - self.spent_amount
    }

    pub fn is_over_limit(&self) -> bool {
        self.remaining_for_day() < Decimal::ZERO
    }

    /// Orders entries by date, breaking ties with insertion order.
    pub fn ledger_order(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then(self.sequence.cmp(&other.sequence))
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Identifiable for DailySpendingEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for DailySpendingEntry {
    fn owner(&self) -> &OwnerId {
        &self.owner
    }
}

/// Input for recording a new day of spending.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingDraft {
    pub date: NaiveDate,
    pub spent_amount: Decimal,
    /// Falls back to the period or configured default when absent.
    pub fixed_daily_limit: Option<Decimal>,
}

impl SpendingDraft {
    pub fn new(date: NaiveDate, spent_amount: Decimal) -> Self {
        Self {
            date,
            spent_amount,
            fixed_daily_limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Decimal) -> Self {
        self.fixed_daily_limit = Some(limit);
        self
    }
}

/// Partial update of an existing spending entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendingPatch {
    pub period_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub spent_amount: Option<Decimal>,
    pub fixed_daily_limit: Option<Decimal>,
}

impl SpendingPatch {
    pub fn is_empty(&self) -> bool {
        self.period_id.is_none()
            && self.date.is_none()
            && self.spent_amount.is_none()
            && self.fixed_daily_limit.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(day: u32, sequence: u64) -> DailySpendingEntry {
        let mut entry = DailySpendingEntry::new(
            OwnerId::new("alice").unwrap(),
            Uuid::new_v4(),
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            dec!(30),
            dec!(100),
        );
        entry.sequence = sequence;
        entry
    }

    #[test]
    fn remaining_treats_missing_carryover_as_zero() {
        let mut row = entry(1, 1);
        assert_eq!(row.remaining_for_day(), dec!(70));
        row.carryover = Some(dec!(-90));
        assert_eq!(row.remaining_for_day(), dec!(-20));
        assert!(row.is_over_limit());
    }

    #[test]
    fn ledger_order_breaks_date_ties_by_sequence() {
        let early = entry(2, 7);
        let late = entry(2, 9);
        let before = entry(1, 50);
        assert_eq!(early.ledger_order(&late), Ordering::Less);
        assert_eq!(before.ledger_order(&early), Ordering::Less);
    }
}
