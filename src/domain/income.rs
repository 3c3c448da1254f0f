//! Income received during a period.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Identifiable, OwnerId, Owned};

/// Longest accepted income source label.
pub const INCOME_SOURCE_MAX: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Income {
    pub id: Uuid,
    pub period_id: Uuid,
    pub owner: OwnerId,
    pub source: String,
    pub amount: Decimal,
    pub date_received: NaiveDate,
}

impl Income {
    pub fn new(
        owner: OwnerId,
        period_id: Uuid,
        source: impl Into<String>,
        amount: Decimal,
        date_received: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            period_id,
            owner,
            source: source.into(),
            amount,
            date_received,
        }
    }
}

impl Identifiable for Income {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Income {
    fn owner(&self) -> &OwnerId {
        &self.owner
    }
}

/// Input for recording or editing an income.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomeDraft {
    pub period_id: Uuid,
    pub source: String,
    pub amount: Decimal,
    pub date_received: NaiveDate,
}
