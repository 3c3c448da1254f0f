use crate::cli::commands::CommandDefinition;
use crate::cli::core::{usage, CommandResult, ShellContext};
use crate::cli::output::{self, info, success, Align, Table};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "backup",
            "Write a backup of the tracker data",
            "backup [note]",
            cmd_backup,
        ),
        CommandDefinition::new(
            "backups",
            "List data backups, newest first",
            "backups",
            cmd_backups,
        ),
        CommandDefinition::new(
            "restore",
            "Replace the tracker data with a backup",
            "restore <backup>",
            cmd_restore,
        ),
    ]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let backup = context.backend.backup(note.as_deref())?;
    success(format!("Backup written: {}", backup.id));
    Ok(())
}

fn cmd_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.backend.list_backups()?;
    if backups.is_empty() {
        info("No backups yet. Create one with `backup`.");
        return Ok(());
    }
    let mut table = Table::new(vec![("Backup", Align::Left), ("Created", Align::Left)]);
    for backup in backups {
        table.push(vec![
            backup.id,
            backup
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".into()),
        ]);
    }
    output::table(&table);
    Ok(())
}

fn cmd_restore(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id] = args else {
        return Err(usage("restore <backup>"));
    };
    context.backend.restore_backup(id)?;
    context.reopen_store()?;
    success(format!("Restored tracker data from {id}."));
    Ok(())
}
