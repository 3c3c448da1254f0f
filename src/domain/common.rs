//! Shared identifiers, traits, and amount rules for tracker aggregates.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest number of fractional digits a stored amount may carry.
pub const AMOUNT_SCALE: u32 = 2;

/// Largest number of integer digits a stored amount may carry.
pub const AMOUNT_INTEGER_DIGITS: u32 = 10;

/// Exposes a stable identifier for stored aggregates.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Associates an aggregate with the principal that owns it.
pub trait Owned {
    fn owner(&self) -> &OwnerId;
}

/// Opaque identifier of the principal issuing requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Builds an owner id, returning `None` for blank input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The (owner, period) key that scopes carryover ordering and locking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub owner: OwnerId,
    pub period_id: Uuid,
}

impl PartitionKey {
    pub fn new(owner: OwnerId, period_id: Uuid) -> Self {
        Self { owner, period_id }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.period_id)
    }
}

/// Reasons an amount is rejected by [`check_amount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountViolation {
    Negative,
    NotPositive,
    TooPrecise,
    TooLarge,
}

impl fmt::Display for AmountViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountViolation::Negative => f.write_str("cannot be negative"),
            AmountViolation::NotPositive => f.write_str("must be greater than zero"),
            AmountViolation::TooPrecise => {
                write!(f, "must have at most {AMOUNT_SCALE} decimal places")
            }
            AmountViolation::TooLarge => {
                write!(f, "must have at most {AMOUNT_INTEGER_DIGITS} integer digits")
            }
        }
    }
}

/// Checks the storage shape of an amount: scale, magnitude, and sign.
pub fn check_amount(value: Decimal, allow_zero: bool) -> Result<(), AmountViolation> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AmountViolation::Negative);
    }
    if !allow_zero && value.is_zero() {
        return Err(AmountViolation::NotPositive);
    }
    if value.normalize().scale() > AMOUNT_SCALE {
        return Err(AmountViolation::TooPrecise);
    }
    let limit = Decimal::from_i128_with_scale(10_i128.pow(AMOUNT_INTEGER_DIGITS), 0);
    if value.trunc() >= limit {
        return Err(AmountViolation::TooLarge);
    }
    Ok(())
}
