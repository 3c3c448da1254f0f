use uuid::Uuid;

use crate::{
    config::{Config, ConfigManager},
    domain::OwnerId,
    storage::{JsonBackend, LedgerStore},
};

use super::commands::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

/// Everything a command handler may touch during one shell session.
pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub store: LedgerStore,
    pub backend: JsonBackend,
    /// Principal every service call is made on behalf of.
    pub principal: OwnerId,
    pub active_period: Option<Uuid>,
    pub last_command: Option<String>,
    pub running: bool,
}
