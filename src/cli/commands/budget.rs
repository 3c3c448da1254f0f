use std::collections::HashMap;

use crate::cli::commands::CommandDefinition;
use crate::cli::core::{
    parse_amount, parse_assignments, parse_date, short_id, usage, CommandError, CommandResult,
    ShellContext,
};
use crate::cli::output::{self, info, money, success, Align, Table};
use crate::core::services::BudgetService;
use crate::domain::{BudgetDraft, BudgetStatus};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "category-add",
            "Create a budget category",
            "category-add <name>",
            cmd_category_add,
        ),
        CommandDefinition::new(
            "category-list",
            "List budget categories",
            "category-list",
            cmd_category_list,
        ),
        CommandDefinition::new(
            "category-rename",
            "Rename a budget category",
            "category-rename <name|id> <new name>",
            cmd_category_rename,
        ),
        CommandDefinition::new(
            "category-delete",
            "Delete a category and its budgets",
            "category-delete <name|id>",
            cmd_category_delete,
        ),
        CommandDefinition::new(
            "budget-add",
            "Allocate an amount to a category in the active period",
            "budget-add <category> <amount> [due=<date>] [status=paid|not_paid]",
            cmd_budget_add,
        ),
        CommandDefinition::new(
            "budget-list",
            "List budgets of a period",
            "budget-list [period]",
            cmd_budget_list,
        ),
        CommandDefinition::new(
            "budget-update",
            "Change a budget's amount, category, due date, or period",
            "budget-update <id> [amount=..] [category=..] [due=<date>|none] [period=..]",
            cmd_budget_update,
        ),
        CommandDefinition::new(
            "budget-pay",
            "Mark a budget as paid (or `budget-pay <id> undo`)",
            "budget-pay <id> [undo]",
            cmd_budget_pay,
        ),
        CommandDefinition::new(
            "budget-delete",
            "Delete a budget",
            "budget-delete <id>",
            cmd_budget_delete,
        ),
    ]
}

fn cmd_category_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name] = args else {
        return Err(usage("category-add <name>"));
    };
    let category = BudgetService::create_category(&context.store, &context.principal, name)?;
    success(format!(
        "Created category `{}` [{}]",
        category.name,
        short_id(category.id)
    ));
    Ok(())
}

fn cmd_category_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let categories = BudgetService::list_categories(&context.store, &context.principal)?;
    if categories.is_empty() {
        info("No categories yet. Create one with `category-add`.");
        return Ok(());
    }
    let mut table = Table::new(vec![("Id", Align::Left), ("Name", Align::Left)]);
    for category in categories {
        table.push(vec![short_id(category.id), category.name]);
    }
    output::table(&table);
    Ok(())
}

fn cmd_category_rename(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token, name] = args else {
        return Err(usage("category-rename <name|id> <new name>"));
    };
    let id = context.resolve_category(token)?;
    let category = BudgetService::rename_category(&context.store, &context.principal, id, name)?;
    success(format!("Category renamed to `{}`.", category.name));
    Ok(())
}

fn cmd_category_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token] = args else {
        return Err(usage("category-delete <name|id>"));
    };
    let id = context.resolve_category(token)?;
    let removed = BudgetService::delete_category(&context.store, &context.principal, id)?;
    success(format!("Deleted category `{}`.", removed.name));
    Ok(())
}

fn cmd_budget_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [category, amount, rest @ ..] = args else {
        return Err(usage(
            "budget-add <category> <amount> [due=<date>] [status=paid|not_paid]",
        ));
    };
    let fields = parse_assignments(rest, &["due", "status"])?;
    let draft = BudgetDraft {
        period_id: context.require_period()?,
        category_id: context.resolve_category(category)?,
        amount_allocated: parse_amount("amount", amount)?,
        status: fields
            .get("status")
            .map(|value| value.parse::<BudgetStatus>())
            .transpose()
            .map_err(CommandError::InvalidArguments)?
            .unwrap_or(BudgetStatus::NotPaid),
        due_date: fields.get("due").map(|value| parse_date(value)).transpose()?,
    };
    let budget = BudgetService::create(&context.store, &context.principal, draft)?;
    success(format!(
        "Allocated {} [{}]",
        money(budget.amount_allocated),
        short_id(budget.id)
    ));
    Ok(())
}

fn cmd_budget_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period_id = context.period_or_active(args.first().copied())?;
    let budgets = BudgetService::list(&context.store, &context.principal, period_id)?;
    if budgets.is_empty() {
        info("No budgets allocated in this period.");
        return Ok(());
    }
    let names: HashMap<_, _> = BudgetService::list_categories(&context.store, &context.principal)?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect();
    let mut table = Table::new(vec![
        ("Id", Align::Left),
        ("Category", Align::Left),
        ("Amount", Align::Right),
        ("Due", Align::Left),
        ("Status", Align::Left),
    ]);
    for budget in &budgets {
        table.push(vec![
            short_id(budget.id),
            names.get(&budget.category_id).cloned().unwrap_or_default(),
            money(budget.amount_allocated),
            budget
                .due_date
                .map(|due| due.to_string())
                .unwrap_or_else(|| "-".into()),
            budget.status.to_string(),
        ]);
    }
    output::table(&table);
    Ok(())
}

fn cmd_budget_update(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token, rest @ ..] = args else {
        return Err(usage(
            "budget-update <id> [amount=..] [category=..] [due=<date>|none] [period=..]",
        ));
    };
    let fields = parse_assignments(rest, &["amount", "category", "due", "period"])?;
    if fields.is_empty() {
        return Err(CommandError::InvalidArguments(
            "nothing to update; pass amount=, category=, due=, or period=".into(),
        ));
    }
    let id = context.resolve_budget(token)?;
    let current = BudgetService::get(&context.store, &context.principal, id)?;

    let draft = BudgetDraft {
        period_id: match fields.get("period") {
            Some(value) => context.resolve_period(value)?,
            None => current.period_id,
        },
        category_id: match fields.get("category") {
            Some(value) => context.resolve_category(value)?,
            None => current.category_id,
        },
        amount_allocated: match fields.get("amount") {
            Some(value) => parse_amount("amount", value)?,
            None => current.amount_allocated,
        },
        status: current.status,
        due_date: match fields.get("due") {
            Some(value) if value.eq_ignore_ascii_case("none") => None,
            Some(value) => Some(parse_date(value)?),
            None => current.due_date,
        },
    };
    let budget = BudgetService::update(&context.store, &context.principal, id, draft)?;
    success(format!(
        "Budget {} updated: {}{}",
        short_id(budget.id),
        money(budget.amount_allocated),
        budget
            .due_date
            .map(|due| format!(", due {due}"))
            .unwrap_or_default()
    ));
    Ok(())
}

fn cmd_budget_pay(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (token, status) = match args {
        [token] => (token, BudgetStatus::Paid),
        [token, "undo"] => (token, BudgetStatus::NotPaid),
        _ => return Err(usage("budget-pay <id> [undo]")),
    };
    let id = context.resolve_budget(token)?;
    let budget = BudgetService::set_status(&context.store, &context.principal, id, status)?;
    success(format!(
        "Budget {} is now {}.",
        short_id(budget.id),
        budget.status
    ));
    Ok(())
}

fn cmd_budget_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token] = args else {
        return Err(usage("budget-delete <id>"));
    };
    let id = context.resolve_budget(token)?;
    let removed = BudgetService::delete(&context.store, &context.principal, id)?;
    success(format!(
        "Deleted budget of {}.",
        money(removed.amount_allocated)
    ));
    Ok(())
}
