use crate::cli::commands::CommandDefinition;
use crate::cli::core::{
    parse_amount, parse_assignments, parse_date, short_id, usage, CommandResult, ShellContext,
};
use crate::cli::output::{self, info, money, section, signed_money, success, Align, Table};
use crate::core::carryover::ProjectedDay;
use crate::core::services::{RectificationService, SpendingService};
use crate::domain::{SpendingDraft, SpendingPatch};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "spend-add",
            "Record a day's spending in the active period",
            "spend-add <date> <spent> [limit]",
            cmd_spend_add,
        ),
        CommandDefinition::new(
            "spend-update",
            "Change a day's spending, limit, date or period",
            "spend-update <id|date> [spent=<amount>] [limit=<amount>] [date=<date>] [period=<name|id>]",
            cmd_spend_update,
        ),
        CommandDefinition::new(
            "spend-delete",
            "Delete a day's spending",
            "spend-delete <id|date>",
            cmd_spend_delete,
        ),
        CommandDefinition::new(
            "spend-list",
            "List daily spending with carryover",
            "spend-list [period]",
            cmd_spend_list,
        ),
        CommandDefinition::new(
            "spend-show",
            "Show one day with its carryover",
            "spend-show <id|date>",
            cmd_spend_show,
        ),
        CommandDefinition::new(
            "rectify",
            "Recompute stored carryover for a period",
            "rectify [period]",
            cmd_rectify,
        ),
    ]
}

fn cmd_spend_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (date, spent, limit) = match args {
        [date, spent] => (date, spent, None),
        [date, spent, limit] => (date, spent, Some(limit)),
        _ => return Err(usage("spend-add <date> <spent> [limit]")),
    };
    let period_id = context.require_period()?;
    let mut draft = SpendingDraft::new(parse_date(date)?, parse_amount("spent", spent)?);
    if let Some(limit) = limit {
        draft = draft.with_limit(parse_amount("limit", limit)?);
    }
    let day = SpendingService::create(
        &context.store,
        &context.defaults(),
        &context.principal,
        period_id,
        draft,
    )?;
    success(format!(
        "Recorded {} on {} [{}]",
        money(day.spent_amount),
        day.date,
        short_id(day.id)
    ));
    report_day(&day);
    Ok(())
}

fn cmd_spend_update(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((token, rest)) = args.split_first() else {
        return Err(usage(
            "spend-update <id|date> [spent=<amount>] [limit=<amount>] [date=<date>] [period=<name|id>]",
        ));
    };
    let entry_id = context.resolve_entry(token)?;
    let fields = parse_assignments(rest, &["spent", "limit", "date", "period"])?;
    let patch = SpendingPatch {
        period_id: fields
            .get("period")
            .map(|value| context.resolve_period(value))
            .transpose()?,
        date: fields.get("date").map(|value| parse_date(value)).transpose()?,
        spent_amount: fields
            .get("spent")
            .map(|value| parse_amount("spent", value))
            .transpose()?,
        fixed_daily_limit: fields
            .get("limit")
            .map(|value| parse_amount("limit", value))
            .transpose()?,
    };
    if patch.is_empty() {
        return Err(usage(
            "spend-update <id|date> [spent=<amount>] [limit=<amount>] [date=<date>] [period=<name|id>]",
        ));
    }
    let day = SpendingService::update(&context.store, &context.principal, entry_id, patch)?;
    success(format!("Updated spending on {}.", day.date));
    report_day(&day);
    Ok(())
}

fn cmd_spend_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token] = args else {
        return Err(usage("spend-delete <id|date>"));
    };
    let entry_id = context.resolve_entry(token)?;
    let removed = SpendingService::delete(&context.store, &context.principal, entry_id)?;
    success(format!(
        "Deleted spending of {} on {}.",
        money(removed.spent_amount),
        removed.date
    ));
    Ok(())
}

fn cmd_spend_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period_id = context.period_or_active(args.first().copied())?;
    let days = SpendingService::list(&context.store, &context.principal, period_id)?;
    if days.is_empty() {
        info("No spending recorded in this period.");
        return Ok(());
    }
    let mut table = Table::new(vec![
        ("Id", Align::Left),
        ("Date", Align::Left),
        ("Spent", Align::Right),
        ("Limit", Align::Right),
        ("Carry in", Align::Right),
        ("Remaining", Align::Right),
        ("", Align::Left),
    ]);
    for day in &days {
        table.push(vec![
            short_id(day.id),
            day.date.to_string(),
            money(day.spent_amount),
            money(day.fixed_daily_limit),
            signed_money(day.carryover_in),
            signed_money(day.remaining),
            if day.is_over_limit { "over".into() } else { String::new() },
        ]);
    }
    output::table(&table);
    Ok(())
}

fn cmd_spend_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token] = args else {
        return Err(usage("spend-show <id|date>"));
    };
    let entry_id = context.resolve_entry(token)?;
    let day = SpendingService::retrieve(&context.store, &context.principal, entry_id)?;
    section(format!("Spending {}", day.date));
    info(format!("  Id        : {}", day.id));
    info(format!("  Spent     : {}", money(day.spent_amount)));
    info(format!("  Limit     : {}", money(day.fixed_daily_limit)));
    report_day(&day);
    Ok(())
}

fn cmd_rectify(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let period_id = context.period_or_active(args.first().copied())?;
    let report = RectificationService::rectify(&context.store, &context.principal, period_id)?;
    success(format!(
        "Rectified {} row(s); {} stored carryover value(s) changed.",
        report.rows, report.updated
    ));
    Ok(())
}

fn report_day(day: &ProjectedDay) {
    info(format!(
        "  Carry in  : {}  Remaining : {}",
        signed_money(day.carryover_in),
        signed_money(day.remaining)
    ));
    if day.is_over_limit {
        output::warning(format!("{} ended over the limit.", day.date));
    }
}
