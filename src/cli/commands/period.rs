use crate::cli::commands::CommandDefinition;
use crate::cli::core::{
    parse_amount, parse_assignments, parse_date, short_id, usage, CommandResult, ShellContext,
};
use crate::cli::output::{self, info, money, section, signed_money, success, Align, Table};
use crate::core::services::{PeriodDraft, PeriodPatch, PeriodService};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "period-add",
            "Create a period and make it active",
            "period-add <name> <start YYYY-MM-DD> <end YYYY-MM-DD>",
            cmd_period_add,
        ),
        CommandDefinition::new(
            "period-list",
            "List your periods",
            "period-list",
            cmd_period_list,
        ),
        CommandDefinition::new(
            "period-use",
            "Select the active period",
            "period-use <name|id>",
            cmd_period_use,
        ),
        CommandDefinition::new(
            "period-update",
            "Rename a period or move its range",
            "period-update <name|id> [name=<text>] [start=<date>] [end=<date>]",
            cmd_period_update,
        ),
        CommandDefinition::new(
            "period-delete",
            "Delete a period with its spending, incomes and budgets",
            "period-delete <name|id>",
            cmd_period_delete,
        ),
        CommandDefinition::new(
            "savings",
            "Add to (or withdraw from) a period's savings",
            "savings <amount> [period]",
            cmd_savings,
        ),
        CommandDefinition::new(
            "summary",
            "Show income, budget and spending totals",
            "summary [period]",
            cmd_summary,
        ),
    ]
}

fn cmd_period_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [name, start, end] = args else {
        return Err(usage(
            "period-add <name> <start YYYY-MM-DD> <end YYYY-MM-DD>",
        ));
    };
    let draft = PeriodDraft {
        name: name.to_string(),
        start_date: parse_date(start)?,
        end_date: parse_date(end)?,
    };
    let period = PeriodService::create(&context.store, &context.principal, draft)?;
    context.set_active_period(Some(period.id))?;
    success(format!(
        "Created period `{}` ({} .. {}, {} days) [{}]",
        period.name,
        period.start_date,
        period.end_date,
        period.day_count(),
        short_id(period.id)
    ));
    Ok(())
}

fn cmd_period_list(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let periods = PeriodService::list(&context.store, &context.principal)?;
    if periods.is_empty() {
        info("No periods yet. Create one with `period-add`.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        ("", Align::Left),
        ("Id", Align::Left),
        ("Name", Align::Left),
        ("Start", Align::Left),
        ("End", Align::Left),
        ("Days", Align::Right),
        ("Savings", Align::Right),
    ]);
    for period in periods {
        let marker = if Some(period.id) == context.active_period {
            "*"
        } else {
            ""
        };
        table.push(vec![
            marker.into(),
            short_id(period.id),
            period.name.clone(),
            period.start_date.to_string(),
            period.end_date.to_string(),
            period.day_count().to_string(),
            money(period.total_savings),
        ]);
    }
    output::table(&table);
    Ok(())
}

fn cmd_period_use(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token] = args else {
        return Err(usage("period-use <name|id>"));
    };
    let id = context.resolve_period(token)?;
    let period = PeriodService::get(&context.store, &context.principal, id)?;
    context.set_active_period(Some(id))?;
    success(format!("Active period is now `{}`.", period.name));
    Ok(())
}

fn cmd_period_update(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((token, rest)) = args.split_first() else {
        return Err(usage(
            "period-update <name|id> [name=<text>] [start=<date>] [end=<date>]",
        ));
    };
    let id = context.resolve_period(token)?;
    let fields = parse_assignments(rest, &["name", "start", "end"])?;
    let patch = PeriodPatch {
        name: fields.get("name").map(|value| value.to_string()),
        start_date: fields.get("start").map(|value| parse_date(value)).transpose()?,
        end_date: fields.get("end").map(|value| parse_date(value)).transpose()?,
    };
    let period = PeriodService::update(&context.store, &context.principal, id, patch)?;
    success(format!(
        "Updated period `{}` ({} .. {}).",
        period.name, period.start_date, period.end_date
    ));
    Ok(())
}

fn cmd_period_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token] = args else {
        return Err(usage("period-delete <name|id>"));
    };
    let id = context.resolve_period(token)?;
    let removed = PeriodService::delete(&context.store, &context.principal, id)?;
    if context.active_period == Some(id) {
        context.set_active_period(None)?;
    }
    success(format!("Deleted period `{}`.", removed.name));
    Ok(())
}

fn cmd_savings(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(amount) = args.first() else {
        return Err(usage("savings <amount> [period]"));
    };
    let delta = parse_amount("amount", amount)?;
    let id = context.period_or_active(args.get(1).copied())?;
    let period = PeriodService::adjust_savings(&context.store, &context.principal, id, delta)?;
    success(format!(
        "Savings for `{}` are now {}.",
        period.name,
        signed_money(period.total_savings)
    ));
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = context.period_or_active(args.first().copied())?;
    let summary = PeriodService::summary(&context.store, &context.principal, id)?;
    section(format!("Summary: {}", summary.name));
    info(format!("  Days               : {}", summary.day_count));
    info(format!("  Income             : {}", money(summary.total_income)));
    info(format!("  Allocated budgets  : {}", money(summary.total_allocated)));
    info(format!("  Paid budgets       : {}", money(summary.total_paid)));
    info(format!(
        "  Left after budgets : {}",
        signed_money(summary.leftover_after_budgets)
    ));
    info(format!("  Savings            : {}", signed_money(summary.total_savings)));
    info(format!(
        "  Spent              : {} over {} recorded day(s)",
        money(summary.total_spent),
        summary.recorded_days
    ));
    info(format!("  Daily limits       : {}", money(summary.total_daily_limit)));
    info(format!(
        "  Closing balance    : {}",
        signed_money(summary.closing_balance)
    ));
    if summary.over_limit_days > 0 {
        output::warning(format!(
            "{} day(s) ended over the limit.",
            summary.over_limit_days
        ));
    }
    Ok(())
}
