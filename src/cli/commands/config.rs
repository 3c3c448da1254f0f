use crate::cli::commands::CommandDefinition;
use crate::cli::core::{usage, CommandResult, ShellContext};
use crate::cli::output::{self, info, section, success};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "config",
        "Show or change settings and manage config backups",
        "config [show | set <key> <value> | backup [note] | backups | restore <backup>]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [] | ["show"] => show(context),
        ["set", key, value @ ..] if !value.is_empty() => set(context, key, &value.join(" ")),
        ["backup", note @ ..] => {
            let note = (!note.is_empty()).then(|| note.join(" "));
            let name = context
                .config_manager
                .backup(&context.config, note.as_deref())?;
            success(format!("Config backup written: {name}"));
            Ok(())
        }
        ["backups"] => {
            let backups = context.config_manager.list_backups()?;
            if backups.is_empty() {
                info("No config backups yet.");
            }
            for name in backups {
                info(format!("  {name}"));
            }
            Ok(())
        }
        ["restore", name] => {
            let data_root = context.config.data_root.clone();
            context.config = context.config_manager.restore(name)?;
            output::apply_config(&context.config);
            context.principal = context.config.owner()?;
            if context.config.data_root != data_root {
                context.reopen_store()?;
            }
            context.set_active_period(None)?;
            success(format!("Config restored from {name}."));
            Ok(())
        }
        _ => Err(usage(
            "config [show | set <key> <value> | backup [note] | backups | restore <backup>]",
        )),
    }
}

fn show(context: &ShellContext) -> CommandResult {
    section("Configuration");
    info(format!("  file: {}", context.config_manager.config_path().display()));
    for (key, value) in context.config.entries() {
        info(format!("  {key:<24} {value}"));
    }
    Ok(())
}

fn set(context: &mut ShellContext, key: &str, value: &str) -> CommandResult {
    let data_root = context.config.data_root.clone();
    let mut next = context.config.clone();
    next.set(key, value)?;
    context.config_manager.save(&next)?;
    context.config = next;

    match key {
        "color_output" => output::apply_config(&context.config),
        "default_owner" => {
            context.principal = context.config.owner()?;
            context.set_active_period(None)?;
        }
        "backup_retention" => context.reopen_store()?,
        "data_root" if context.config.data_root != data_root => context.reopen_store()?,
        _ => {}
    }
    success(format!("Set {key}."));
    Ok(())
}
