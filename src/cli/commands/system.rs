use crate::cli::commands::CommandDefinition;
use crate::cli::core::{usage, CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::output::{info, section, success};
use crate::domain::OwnerId;
use crate::storage::CURRENT_SCHEMA_VERSION;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new(
            "user",
            "Show or switch the acting owner",
            "user [name]",
            cmd_user,
        ),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.registry.get(&name.to_lowercase()) {
            Some(definition) => help::print_command(definition),
            None => context.suggest_command(name),
        }
        return Ok(());
    }
    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    section(format!("Spend Tracker {}", meta.version));
    info(format!("  Schema ver   : v{CURRENT_SCHEMA_VERSION}"));
    info(format!("  Build hash   : {}", meta.git_hash));
    info(format!("  Built at     : {}", meta.timestamp));
    info(format!("  Target       : {}", meta.target));
    info(format!("  Profile      : {}", meta.profile));
    Ok(())
}

/// Switching owner also clears the active period, which belongs to the previous owner.
fn cmd_user(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(name) = args.first() else {
        info(format!("Acting as `{}`.", context.principal));
        return Ok(());
    };
    let owner = OwnerId::new(*name).ok_or_else(|| usage("user <name>"))?;
    context.config.default_owner = owner.as_str().to_string();
    context.principal = owner;
    context.set_active_period(None)?;
    context.persist_config()?;
    success(format!("Now acting as `{}`.", context.principal));
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
