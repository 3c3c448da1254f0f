//! Budget categories and the allocations made against them.

use tracing::info;
use uuid::Uuid;

use crate::core::errors::{Result, TrackerError};
use crate::core::ownership::OwnershipGuard;
use crate::core::services::{ensure_in_period, validate_amount, validate_label};
use crate::domain::{
    Budget, BudgetCategory, BudgetDraft, BudgetStatus, OwnerId, CATEGORY_NAME_MAX,
};
use crate::storage::{LedgerStore, TrackerSnapshot};

pub struct BudgetService;

impl BudgetService {
    pub fn create_category(
        store: &LedgerStore,
        principal: &OwnerId,
        name: &str,
    ) -> Result<BudgetCategory> {
        let name = validate_label("name", name, CATEGORY_NAME_MAX)?;
        let category = store.update(|state| {
            ensure_unique_category(state, principal, &name, None)?;
            let category = BudgetCategory::new(principal.clone(), name);
            state.categories.push(category.clone());
            Ok::<_, TrackerError>(category)
        })?;
        info!(owner = %principal, category = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    /// Categories owned by `principal`, alphabetically.
    pub fn list_categories(store: &LedgerStore, principal: &OwnerId) -> Result<Vec<BudgetCategory>> {
        let mut categories = store.read(|snapshot| {
            snapshot
                .categories
                .iter()
                .filter(|category| &category.owner == principal)
                .cloned()
                .collect::<Vec<_>>()
        })?;
        categories.sort_by_key(|category| category.name.to_lowercase());
        Ok(categories)
    }

    pub fn rename_category(
        store: &LedgerStore,
        principal: &OwnerId,
        category_id: Uuid,
        name: &str,
    ) -> Result<BudgetCategory> {
        let name = validate_label("name", name, CATEGORY_NAME_MAX)?;
        store.update(|state| {
            OwnershipGuard::category(state, principal, category_id)?;
            ensure_unique_category(state, principal, &name, Some(category_id))?;
            let category = state
                .categories
                .iter_mut()
                .find(|category| category.id == category_id)
                .ok_or_else(|| TrackerError::NotFound(format!("category {category_id}")))?;
            category.name = name;
            Ok::<_, TrackerError>(category.clone())
        })
    }

    /// Deletes a category and every budget allocated against it.
    pub fn delete_category(
        store: &LedgerStore,
        principal: &OwnerId,
        category_id: Uuid,
    ) -> Result<BudgetCategory> {
        let (removed, budgets) = store.update(|state| {
            let removed = OwnershipGuard::category(state, principal, category_id)?.clone();
            let before = state.budgets.len();
            state.budgets.retain(|budget| budget.category_id != category_id);
            state.categories.retain(|category| category.id != category_id);
            Ok::<_, TrackerError>((removed, before - state.budgets.len()))
        })?;
        info!(owner = %principal, category = %category_id, budgets, "category deleted");
        Ok(removed)
    }

    pub fn create(store: &LedgerStore, principal: &OwnerId, draft: BudgetDraft) -> Result<Budget> {
        validate_amount("amount_allocated", draft.amount_allocated, true)?;
        let budget = store.update(|state| {
            check_references(state, principal, &draft)?;
            let mut budget = Budget::new(
                principal.clone(),
                draft.period_id,
                draft.category_id,
                draft.amount_allocated,
            );
            budget.status = draft.status;
            budget.due_date = draft.due_date;
            state.budgets.push(budget.clone());
            Ok::<_, TrackerError>(budget)
        })?;
        info!(
            owner = %principal,
            budget = %budget.id,
            amount = %budget.amount_allocated,
            "budget created"
        );
        Ok(budget)
    }

    pub fn get(store: &LedgerStore, principal: &OwnerId, budget_id: Uuid) -> Result<Budget> {
        store.read(|snapshot| {
            OwnershipGuard::budget(snapshot, principal, budget_id).map(Budget::clone)
        })?
    }

    /// Replaces every editable field of a budget; references are re-checked.
    pub fn update(
        store: &LedgerStore,
        principal: &OwnerId,
        budget_id: Uuid,
        draft: BudgetDraft,
    ) -> Result<Budget> {
        validate_amount("amount_allocated", draft.amount_allocated, true)?;
        let updated = store.update(|state| {
            OwnershipGuard::budget(state, principal, budget_id)?;
            check_references(state, principal, &draft)?;
            let budget = budget_mut(state, budget_id)?;
            budget.period_id = draft.period_id;
            budget.category_id = draft.category_id;
            budget.amount_allocated = draft.amount_allocated;
            budget.status = draft.status;
            budget.due_date = draft.due_date;
            Ok::<_, TrackerError>(budget.clone())
        })?;
        info!(owner = %principal, budget = %budget_id, "budget updated");
        Ok(updated)
    }

    pub fn set_status(
        store: &LedgerStore,
        principal: &OwnerId,
        budget_id: Uuid,
        status: BudgetStatus,
    ) -> Result<Budget> {
        let updated = store.update(|state| {
            OwnershipGuard::budget(state, principal, budget_id)?;
            let budget = budget_mut(state, budget_id)?;
            budget.status = status;
            Ok::<_, TrackerError>(budget.clone())
        })?;
        info!(owner = %principal, budget = %budget_id, status = %status, "budget status changed");
        Ok(updated)
    }

    pub fn delete(store: &LedgerStore, principal: &OwnerId, budget_id: Uuid) -> Result<Budget> {
        let removed = store.update(|state| {
            let removed = OwnershipGuard::budget(state, principal, budget_id)?.clone();
            state.budgets.retain(|budget| budget.id != budget_id);
            Ok::<_, TrackerError>(removed)
        })?;
        info!(owner = %principal, budget = %budget_id, "budget deleted");
        Ok(removed)
    }

    /// Budgets of one period, unpaid first, then by due date.
    pub fn list(store: &LedgerStore, principal: &OwnerId, period_id: Uuid) -> Result<Vec<Budget>> {
        let mut budgets = store.read(|snapshot| {
            OwnershipGuard::period(snapshot, principal, period_id)?;
            Ok::<_, TrackerError>(
                snapshot
                    .budgets
                    .iter()
                    .filter(|budget| budget.period_id == period_id && &budget.owner == principal)
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        })??;
        budgets.sort_by(|a, b| {
            a.status
                .is_paid()
                .cmp(&b.status.is_paid())
                .then_with(|| match (a.due_date, b.due_date) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
        });
        Ok(budgets)
    }
}

fn check_references(state: &TrackerSnapshot, principal: &OwnerId, draft: &BudgetDraft) -> Result<()> {
    let period = OwnershipGuard::period(state, principal, draft.period_id)?;
    OwnershipGuard::category(state, principal, draft.category_id)?;
    if let Some(due) = draft.due_date {
        ensure_in_period(period, "due_date", due)?;
    }
    Ok(())
}

fn ensure_unique_category(
    state: &TrackerSnapshot,
    principal: &OwnerId,
    name: &str,
    ignore: Option<Uuid>,
) -> Result<()> {
    let taken = state.categories.iter().any(|category| {
        &category.owner == principal
            && Some(category.id) != ignore
            && category.name.eq_ignore_ascii_case(name)
    });
    if taken {
        return Err(TrackerError::Validation(format!(
            "category `{name}` already exists"
        )));
    }
    Ok(())
}

fn budget_mut(state: &mut TrackerSnapshot, budget_id: Uuid) -> Result<&mut Budget> {
    state
        .budgets
        .iter_mut()
        .find(|budget| budget.id == budget_id)
        .ok_or_else(|| TrackerError::NotFound(format!("budget {budget_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use crate::domain::Period;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, day).unwrap()
    }

    fn setup() -> (LedgerStore, OwnerId, Period, BudgetCategory) {
        let store = LedgerStore::in_memory();
        let owner = OwnerId::new("alice").unwrap();
        let period = Period::new(owner.clone(), "August", date(1), date(31)).unwrap();
        let stored = period.clone();
        store
            .update(move |state| {
                state.periods.push(stored);
                Ok::<_, TrackerError>(())
            })
            .unwrap();
        let category = BudgetService::create_category(&store, &owner, "House").unwrap();
        (store, owner, period, category)
    }

    fn draft(period: &Period, category: &BudgetCategory, amount: rust_decimal::Decimal) -> BudgetDraft {
        BudgetDraft {
            period_id: period.id,
            category_id: category.id,
            amount_allocated: amount,
            status: BudgetStatus::NotPaid,
            due_date: Some(date(10)),
        }
    }

    #[test]
    fn duplicate_category_names_are_rejected() {
        let (store, owner, _, _) = setup();
        let err = BudgetService::create_category(&store, &owner, "house").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let long = "x".repeat(CATEGORY_NAME_MAX + 1);
        assert!(BudgetService::create_category(&store, &owner, &long).is_err());
    }

    #[test]
    fn foreign_category_is_an_authorization_failure() {
        let (store, owner, period, _) = setup();
        let bob = OwnerId::new("bob").unwrap();
        let foreign = BudgetService::create_category(&store, &bob, "Loans").unwrap();
        let err = BudgetService::create(&store, &owner, draft(&period, &foreign, dec!(100)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn status_toggles_and_list_puts_unpaid_first() {
        let (store, owner, period, category) = setup();
        let rent = BudgetService::create(&store, &owner, draft(&period, &category, dec!(900))).unwrap();
        BudgetService::create(&store, &owner, draft(&period, &category, dec!(40))).unwrap();

        let paid = BudgetService::set_status(&store, &owner, rent.id, BudgetStatus::Paid).unwrap();
        assert!(paid.status.is_paid());

        let listed = BudgetService::list(&store, &owner, period.id).unwrap();
        assert_eq!(listed.last().map(|b| b.id), Some(rent.id));
    }

    #[test]
    fn update_rechecks_category_owner_and_due_date() {
        let (store, owner, period, category) = setup();
        let budget = BudgetService::create(&store, &owner, draft(&period, &category, dec!(60))).unwrap();
        let utilities = BudgetService::create_category(&store, &owner, "Utilities").unwrap();

        let mut changed = draft(&period, &utilities, dec!(75.50));
        changed.due_date = Some(date(20));
        let updated = BudgetService::update(&store, &owner, budget.id, changed).unwrap();
        assert_eq!(updated.category_id, utilities.id);
        assert_eq!(updated.amount_allocated, dec!(75.50));
        assert_eq!(
            BudgetService::get(&store, &owner, budget.id).unwrap().due_date,
            Some(date(20))
        );

        let bob = OwnerId::new("bob").unwrap();
        let foreign = BudgetService::create_category(&store, &bob, "Loans").unwrap();
        let err = BudgetService::update(&store, &owner, budget.id, draft(&period, &foreign, dec!(60)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);

        let mut late = draft(&period, &category, dec!(60));
        late.due_date = NaiveDate::from_ymd_opt(2025, 9, 2);
        let err = BudgetService::update(&store, &owner, budget.id, late).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let stored = BudgetService::get(&store, &owner, budget.id).unwrap();
        assert_eq!(stored.category_id, utilities.id);
        assert_eq!(stored.amount_allocated, dec!(75.50));
    }

    #[test]
    fn deleting_a_category_removes_its_budgets() {
        let (store, owner, period, category) = setup();
        BudgetService::create(&store, &owner, draft(&period, &category, dec!(25))).unwrap();
        BudgetService::delete_category(&store, &owner, category.id).unwrap();
        assert!(BudgetService::list(&store, &owner, period.id).unwrap().is_empty());
        assert!(BudgetService::list_categories(&store, &owner).unwrap().is_empty());
    }
}
