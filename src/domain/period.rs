//! Budgeting periods: the date ranges that partition spending.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Identifiable, OwnerId, Owned, PartitionKey};

/// Longest accepted period name.
pub const PERIOD_NAME_MAX: usize = 100;

/// A bounded, owner-scoped date range (e.g. one month).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Period {
    pub id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub owner: OwnerId,
    #[serde(default)]
    pub total_savings: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_daily_limit: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Period {
    pub fn new(
        owner: OwnerId,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, PeriodRangeError> {
        check_range(start_date, end_date)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date,
            end_date,
            owner,
            total_savings: Decimal::ZERO,
            default_daily_limit: None,
            created_at: Utc::now(),
        })
    }

    /// Returns `true` when `date` falls inside the inclusive range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Number of calendar days covered by the period.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::new(self.owner.clone(), self.id)
    }

    /// Moves the period to a new range, keeping the invariant `end >= start`.
    pub fn set_range(
        &mut self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<(), PeriodRangeError> {
        check_range(start_date, end_date)?;
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(())
    }

    /// Records the first daily limit seen for the period; later calls are ignored.
    pub fn seed_daily_limit(&mut self, limit: Decimal) -> bool {
        if self.default_daily_limit.is_some() {
            return false;
        }
        self.default_daily_limit = Some(limit);
        true
    }
}

impl Identifiable for Period {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Period {
    fn owner(&self) -> &OwnerId {
        &self.owner
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} - {})", self.name, self.start_date, self.end_date)
    }
}

/// Raised when a period would end before it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for PeriodRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "end_date {} must be greater than or equal to start_date {}",
            self.end, self.start
        )
    }
}

impl std::error::Error for PeriodRangeError {}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), PeriodRangeError> {
    if end < start {
        return Err(PeriodRangeError { start, end });
    }
    Ok(())
}
