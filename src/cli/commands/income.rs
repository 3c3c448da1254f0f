use crate::cli::commands::CommandDefinition;
use crate::cli::core::{
    parse_amount, parse_assignments, parse_date, short_id, usage, CommandResult, ShellContext,
};
use crate::cli::output::{self, info, money, success, Align, Table};
use crate::core::services::IncomeService;
use crate::domain::IncomeDraft;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "income-add",
            "Record income received in the active period",
            "income-add <source> <amount> <date>",
            cmd_income_add,
        ),
        CommandDefinition::new(
            "income-update",
            "Change an income's source, amount or date",
            "income-update <id> [source=<text>] [amount=<amount>] [date=<date>]",
            cmd_income_update,
        ),
        CommandDefinition::new(
            "income-list",
            "List incomes of a period",
            "income-list [period]",
            cmd_income_list,
        ),
        CommandDefinition::new(
            "income-delete",
            "Delete an income",
            "income-delete <id>",
            cmd_income_delete,
        ),
    ]
}

fn cmd_income_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [source, amount, date] = args else {
        return Err(usage("income-add <source> <amount> <date>"));
    };
    let draft = IncomeDraft {
        period_id: context.require_period()?,
        source: source.to_string(),
        amount: parse_amount("amount", amount)?,
        date_received: parse_date(date)?,
    };
    let income = IncomeService::create(&context.store, &context.principal, draft)?;
    success(format!(
        "Recorded income `{}` of {} [{}]",
        income.source,
        money(income.amount),
        short_id(income.id)
    ));
    Ok(())
}

fn cmd_income_update(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((token, rest)) = args.split_first() else {
        return Err(usage(
            "income-update <id> [source=<text>] [amount=<amount>] [date=<date>]",
        ));
    };
    let income_id = context.resolve_income(token)?;
    let fields = parse_assignments(rest, &["source", "amount", "date"])?;
    let current = context
        .store
        .read(|snapshot| snapshot.income(income_id).cloned())?
        .ok_or_else(|| usage("income-update <id> ..."))?;
    let draft = IncomeDraft {
        period_id: current.period_id,
        source: fields
            .get("source")
            .map_or(current.source.clone(), |value| value.to_string()),
        amount: fields
            .get("amount")
            .map(|value| parse_amount("amount", value))
            .transpose()?
            .unwrap_or(current.amount),
        date_received: fields
            .get("date")
            .map(|value| parse_date(value))
            .transpose()?
            .unwrap_or(current.date_received),
    };
    let income = IncomeService::update(&context.store, &context.principal, income_id, draft)?;
    success(format!(
        "Updated income `{}` ({} on {}).",
        income.source,
        money(income.amount),
        income.date_received
    ));
    Ok(())
}

fn cmd_income_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period_id = context.period_or_active(args.first().copied())?;
    let incomes = IncomeService::list(&context.store, &context.principal, period_id)?;
    if incomes.is_empty() {
        info("No income recorded in this period.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        ("Id", Align::Left),
        ("Received", Align::Left),
        ("Source", Align::Left),
        ("Amount", Align::Right),
    ]);
    for income in &incomes {
        table.push(vec![
            short_id(income.id),
            income.date_received.to_string(),
            income.source.clone(),
            money(income.amount),
        ]);
    }
    output::table(&table);
    info(format!(
        "Total: {}",
        money(incomes.iter().map(|income| income.amount).sum())
    ));
    Ok(())
}

fn cmd_income_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token] = args else {
        return Err(usage("income-delete <id>"));
    };
    let income_id = context.resolve_income(token)?;
    let removed = IncomeService::delete(&context.store, &context.principal, income_id)?;
    success(format!("Deleted income `{}`.", removed.source));
    Ok(())
}
