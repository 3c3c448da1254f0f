use crate::cli::commands::{CommandDefinition, CommandRegistry};
use crate::cli::output::{info, section};

pub fn print_overview(registry: &CommandRegistry) {
    section("Available commands");
    for definition in registry.iter() {
        info(format!("  {:<16} {}", definition.name, definition.description));
    }
    info("Use `help <command>` for details.");
}

pub fn print_command(definition: &CommandDefinition) {
    section(format!("Help: {}", definition.name));
    info(format!("  Description: {}", definition.description));
    info(format!("  Usage: {}", definition.usage));
}
