//! Budget categories and per-period allocations.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Identifiable, OwnerId, Owned};

/// Longest accepted category name.
pub const CATEGORY_NAME_MAX: usize = 50;

/// User-defined grouping for budgets (e.g. House, Loans, Personal).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetCategory {
    pub id: Uuid,
    pub owner: OwnerId,
    pub name: String,
}

impl BudgetCategory {
    pub fn new(owner: OwnerId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            name: name.into(),
        }
    }
}

impl Identifiable for BudgetCategory {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for BudgetCategory {
    fn owner(&self) -> &OwnerId {
        &self.owner
    }
}

/// Payment state of a budget allocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Paid,
    #[default]
    NotPaid,
}

impl BudgetStatus {
    pub fn is_paid(self) -> bool {
        matches!(self, BudgetStatus::Paid)
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetStatus::Paid => "paid",
            BudgetStatus::NotPaid => "not_paid",
        };
        f.write_str(label)
    }
}

impl FromStr for BudgetStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(BudgetStatus::Paid),
            "not_paid" | "not-paid" | "unpaid" => Ok(BudgetStatus::NotPaid),
            other => Err(format!("unknown budget status `{other}`")),
        }
    }
}

/// Money set aside for a category within a period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: Uuid,
    pub period_id: Uuid,
    pub category_id: Uuid,
    pub owner: OwnerId,
    pub amount_allocated: Decimal,
    #[serde(default)]
    pub status: BudgetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl Budget {
    pub fn new(
        owner: OwnerId,
        period_id: Uuid,
        category_id: Uuid,
        amount_allocated: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            period_id,
            category_id,
            owner,
            amount_allocated,
            status: BudgetStatus::NotPaid,
            due_date: None,
        }
    }
}

impl Identifiable for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Budget {
    fn owner(&self) -> &OwnerId {
        &self.owner
    }
}

/// Input for creating or editing a budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDraft {
    pub period_id: Uuid,
    pub category_id: Uuid,
    pub amount_allocated: Decimal,
    pub status: BudgetStatus,
    pub due_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_common_spellings() {
        assert_eq!("PAID".parse::<BudgetStatus>(), Ok(BudgetStatus::Paid));
        assert_eq!("not-paid".parse::<BudgetStatus>(), Ok(BudgetStatus::NotPaid));
        assert!("maybe".parse::<BudgetStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&BudgetStatus::NotPaid).unwrap();
        assert_eq!(json, "\"not_paid\"");
    }
}
