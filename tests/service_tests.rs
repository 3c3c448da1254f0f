mod common;

use common::{date, march, owner, record};
use rust_decimal_macros::dec;
use spend_tracker::{
    core::services::{
        BudgetService, IncomeService, PeriodDraft, PeriodPatch, PeriodService, ProjectionService,
        RectificationService, SpendingDefaults, SpendingService,
    },
    domain::{BudgetDraft, BudgetStatus, IncomeDraft, SpendingDraft, SpendingPatch},
    storage::LedgerStore,
    ErrorKind,
};

#[test]
fn foreign_periods_are_forbidden_for_every_spending_operation() {
    let store = LedgerStore::in_memory();
    let alice = owner("alice");
    let mallory = owner("mallory");
    let period = march(&store, &alice);
    let recorded = record(&store, &alice, &period, &[(1, dec!(10), dec!(5))]);

    let create = SpendingService::create(
        &store,
        &SpendingDefaults::default(),
        &mallory,
        period.id,
        SpendingDraft::new(date(2), dec!(1)),
    )
    .unwrap_err();
    assert_eq!(create.kind(), ErrorKind::Authorization);

    let project = ProjectionService::project(&store, &mallory, period.id).unwrap_err();
    assert_eq!(project.kind(), ErrorKind::Authorization);

    let rectify = RectificationService::rectify(&store, &mallory, period.id).unwrap_err();
    assert_eq!(rectify.kind(), ErrorKind::Authorization);

    let update = SpendingService::update(
        &store,
        &mallory,
        recorded[0].id,
        SpendingPatch {
            spent_amount: Some(dec!(0)),
            ..SpendingPatch::default()
        },
    )
    .unwrap_err();
    assert_eq!(update.kind(), ErrorKind::NotFound);

    let summary = PeriodService::summary(&store, &mallory, period.id).unwrap_err();
    assert_eq!(summary.kind(), ErrorKind::Authorization);
}

#[test]
fn moving_a_day_to_another_period_rectifies_both_partitions() {
    let store = LedgerStore::in_memory();
    let alice = owner("alice");
    let first = march(&store, &alice);
    let second = PeriodService::create(
        &store,
        &alice,
        PeriodDraft {
            name: "Late March".into(),
            start_date: date(1),
            end_date: date(31),
        },
    )
    .unwrap();
    let recorded = record(
        &store,
        &alice,
        &first,
        &[(1, dec!(100), dec!(30)), (2, dec!(100), dec!(150)), (3, dec!(100), dec!(20))],
    );

    let moved = SpendingService::update(
        &store,
        &alice,
        recorded[1].id,
        SpendingPatch {
            period_id: Some(second.id),
            ..SpendingPatch::default()
        },
    )
    .unwrap();
    assert_eq!(moved.period_id, second.id);
    assert_eq!(moved.carryover_in, dec!(0));
    assert_eq!(moved.remaining, dec!(-50));

    let left: Vec<_> = store
        .partition(&first.partition_key())
        .unwrap()
        .into_iter()
        .map(|entry| (entry.date, entry.carryover))
        .collect();
    assert!(left.contains(&(date(3), Some(dec!(70)))));
}

#[test]
fn period_limits_fall_back_and_seed_when_enabled() {
    let store = LedgerStore::in_memory();
    let alice = owner("alice");
    let period = march(&store, &alice);
    let defaults = SpendingDefaults {
        default_daily_limit: dec!(40),
        seed_period_daily_limit: true,
    };

    let first = SpendingService::create(
        &store,
        &defaults,
        &alice,
        period.id,
        SpendingDraft::new(date(1), dec!(5)).with_limit(dec!(25)),
    )
    .unwrap();
    assert_eq!(first.fixed_daily_limit, dec!(25));

    let second = SpendingService::create(
        &store,
        &defaults,
        &alice,
        period.id,
        SpendingDraft::new(date(2), dec!(5)),
    )
    .unwrap();
    assert_eq!(second.fixed_daily_limit, dec!(25));
    assert_eq!(
        PeriodService::get(&store, &alice, period.id).unwrap().default_daily_limit,
        Some(dec!(25))
    );

    let other = PeriodService::create(
        &store,
        &alice,
        PeriodDraft {
            name: "April".into(),
            start_date: date(1),
            end_date: date(31),
        },
    )
    .unwrap();
    let plain = SpendingService::create(
        &store,
        &SpendingDefaults {
            seed_period_daily_limit: false,
            ..defaults
        },
        &alice,
        other.id,
        SpendingDraft::new(date(1), dec!(5)),
    )
    .unwrap();
    assert_eq!(plain.fixed_daily_limit, dec!(40));
    assert_eq!(
        PeriodService::get(&store, &alice, other.id).unwrap().default_daily_limit,
        None
    );
}

#[test]
fn invalid_amounts_and_dates_are_validation_errors() {
    let store = LedgerStore::in_memory();
    let alice = owner("alice");
    let period = march(&store, &alice);
    let create = |draft: SpendingDraft| {
        SpendingService::create(&store, &SpendingDefaults::default(), &alice, period.id, draft)
    };

    let negative = create(SpendingDraft::new(date(1), dec!(-1))).unwrap_err();
    assert_eq!(negative.kind(), ErrorKind::Validation);

    let precise = create(SpendingDraft::new(date(1), dec!(1.005))).unwrap_err();
    assert_eq!(precise.kind(), ErrorKind::Validation);

    let outside = create(SpendingDraft::new(
        chrono::NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
        dec!(1),
    ))
    .unwrap_err();
    assert_eq!(outside.kind(), ErrorKind::Validation);

    assert!(ProjectionService::project(&store, &alice, period.id)
        .unwrap()
        .is_empty());
}

#[test]
fn summary_combines_income_budgets_and_spending() {
    let store = LedgerStore::in_memory();
    let alice = owner("alice");
    let period = march(&store, &alice);
    record(
        &store,
        &alice,
        &period,
        &[(1, dec!(100), dec!(30)), (2, dec!(100), dec!(150))],
    );
    IncomeService::create(
        &store,
        &alice,
        IncomeDraft {
            period_id: period.id,
            source: "Salary".into(),
            amount: dec!(2500),
            date_received: date(1),
        },
    )
    .unwrap();
    let rent = BudgetService::create_category(&store, &alice, "Rent").unwrap();
    let budget = BudgetService::create(
        &store,
        &alice,
        BudgetDraft {
            period_id: period.id,
            category_id: rent.id,
            amount_allocated: dec!(900),
            status: BudgetStatus::NotPaid,
            due_date: Some(date(5)),
        },
    )
    .unwrap();
    BudgetService::set_status(&store, &alice, budget.id, BudgetStatus::Paid).unwrap();
    PeriodService::adjust_savings(&store, &alice, period.id, dec!(300)).unwrap();
    PeriodService::adjust_savings(&store, &alice, period.id, dec!(-50)).unwrap();

    let summary = PeriodService::summary(&store, &alice, period.id).unwrap();
    assert_eq!(summary.total_income, dec!(2500));
    assert_eq!(summary.total_allocated, dec!(900));
    assert_eq!(summary.total_paid, dec!(900));
    assert_eq!(summary.leftover_after_budgets, dec!(1600));
    assert_eq!(summary.total_savings, dec!(250));
    assert_eq!(summary.total_spent, dec!(180));
    assert_eq!(summary.closing_balance, dec!(20));
    assert_eq!(summary.over_limit_days, 0);
    assert_eq!(summary.recorded_days, 2);
    assert_eq!(summary.day_count, 31);
}

#[test]
fn shrinking_a_period_cannot_strand_recorded_days() {
    let store = LedgerStore::in_memory();
    let alice = owner("alice");
    let period = march(&store, &alice);
    record(&store, &alice, &period, &[(20, dec!(10), dec!(1))]);

    let err = PeriodService::update(
        &store,
        &alice,
        period.id,
        PeriodPatch {
            end_date: Some(date(15)),
            ..PeriodPatch::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let renamed = PeriodService::update(
        &store,
        &alice,
        period.id,
        PeriodPatch {
            name: Some("  March 2025 ".into()),
            ..PeriodPatch::default()
        },
    )
    .unwrap();
    assert_eq!(renamed.name, "March 2025");
}

#[test]
fn deleting_a_period_cascades_to_its_records() {
    let store = LedgerStore::in_memory();
    let alice = owner("alice");
    let period = march(&store, &alice);
    record(&store, &alice, &period, &[(1, dec!(10), dec!(1))]);
    IncomeService::create(
        &store,
        &alice,
        IncomeDraft {
            period_id: period.id,
            source: "Gift".into(),
            amount: dec!(20),
            date_received: date(2),
        },
    )
    .unwrap();

    PeriodService::delete(&store, &alice, period.id).unwrap();
    let snapshot = store.snapshot().unwrap();
    assert!(snapshot.periods.is_empty());
    assert!(snapshot.spendings.is_empty());
    assert!(snapshot.incomes.is_empty());
    assert_eq!(
        PeriodService::get(&store, &alice, period.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}
