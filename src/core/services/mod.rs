pub mod budget_service;
pub mod income_service;
pub mod period_service;
pub mod projection;
pub mod rectification;
pub mod spending_service;

pub use budget_service::BudgetService;
pub use income_service::IncomeService;
pub use period_service::{PeriodDraft, PeriodPatch, PeriodService, PeriodSummary};
pub use projection::ProjectionService;
pub use rectification::{RectificationService, RectifyReport};
pub use spending_service::{SpendingDefaults, SpendingService};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::core::errors::{Result, TrackerError};
use crate::domain::{check_amount, Period};

/// Rejects amounts that are negative, too precise, or too large.
pub(crate) fn validate_amount(field: &str, value: Decimal, allow_zero: bool) -> Result<()> {
    check_amount(value, allow_zero)
        .map_err(|violation| TrackerError::Validation(format!("{field} {violation}")))
}

/// Trims a user-supplied label and enforces a non-empty, bounded length.
pub(crate) fn validate_label(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::Validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(TrackerError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn ensure_in_period(period: &Period, field: &str, date: NaiveDate) -> Result<()> {
    if period.contains(date) {
        return Ok(());
    }
    Err(TrackerError::Validation(format!(
        "{field} {date} must be within the period range ({} to {})",
        period.start_date, period.end_date
    )))
}
