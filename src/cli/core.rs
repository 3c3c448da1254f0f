//! Core CLI dispatch, error reporting, and shell context helpers.

use std::{collections::HashMap, io};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use uuid::Uuid;

use crate::{
    config::{ConfigError, ConfigManager},
    core::errors::{ErrorKind, TrackerError},
    core::services::SpendingDefaults,
    storage::{JsonBackend, LedgerStore, StoreError},
    utils::paths,
};

pub use crate::cli::shell_context::{CliMode, ShellContext};
pub use crate::core::errors::CliError;

use super::commands::{self, CommandRegistry};
use super::output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("No active period. Use `period-add` or `period-use` first.")]
    NoActivePeriod,
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        CommandError::Tracker(err.into())
    }
}

impl From<ConfigError> for CommandError {
    fn from(err: ConfigError) -> Self {
        CommandError::Tracker(err.into())
    }
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Tracker(inner) => CliError::Core(inner),
            CommandError::InvalidArguments(message) => CliError::Input(message),
            other => CliError::Command(other.to_string()),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Command(err.to_string())
    }
}

impl ShellContext {
    /// Opens the configuration and tracker store under the application home.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_config_manager(mode, ConfigManager::new()?)
    }

    pub fn with_config_manager(
        mode: CliMode,
        config_manager: ConfigManager,
    ) -> Result<Self, CliError> {
        let config = config_manager.load()?;
        output::apply_config(&config);
        let principal = config.owner()?;
        let (store, backend) = open_store(&config_manager, &config)?;

        let mut context = ShellContext {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            config_manager,
            config,
            store,
            backend,
            principal,
            active_period: None,
            last_command: None,
            running: true,
        };
        let restored = context
            .config
            .last_period
            .filter(|id| context.owns_period(*id));
        context.active_period = restored;
        Ok(context)
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match shell_words::split(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(format!("Could not parse input: {err}"));
                return Ok(LoopControl::Continue);
            }
        };
        let Some(raw) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        if raw.starts_with('#') {
            return Ok(LoopControl::Continue);
        }

        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.last_command = Some(line.trim().to_string());

        match self.dispatch(&command, raw, &args) {
            Ok(LoopControl::Exit) => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            other => other,
        }
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|definition| definition.handler) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &input.to_lowercase()), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                output::hint(format!("Did you mean `{name}`?"));
            }
        }
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::hint("Use `help <command>` for usage details.");
            }
            CommandError::Tracker(err) => {
                output::error(&err);
                match err.kind() {
                    ErrorKind::Consistency => {
                        output::hint("Nothing was saved; the command can be retried.")
                    }
                    ErrorKind::Authorization => output::hint(format!(
                        "You are acting as `{}`; switch with `user <name>`.",
                        self.principal
                    )),
                    _ => {}
                }
            }
            other => output::error(other),
        }
    }

    pub(crate) fn prompt(&self) -> String {
        let period = self
            .active_period
            .and_then(|id| {
                self.store
                    .read(|snapshot| snapshot.period(id).map(|p| p.name.clone()))
                    .ok()
                    .flatten()
            })
            .unwrap_or_else(|| "-".into());
        format!("spend[{}:{}]> ", self.principal, period)
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn defaults(&self) -> SpendingDefaults {
        SpendingDefaults::from(&self.config)
    }

    /// Makes `id` the active period and remembers it across sessions.
    pub(crate) fn set_active_period(&mut self, id: Option<Uuid>) -> CommandResult {
        self.active_period = id;
        if self.config.last_period != id {
            self.config.last_period = id;
            self.persist_config()?;
        }
        Ok(())
    }

    /// Reloads the store from disk, e.g. after a restore or a data root change.
    pub(crate) fn reopen_store(&mut self) -> CommandResult {
        let (store, backend) = open_store(&self.config_manager, &self.config)?;
        self.store = store;
        self.backend = backend;
        if let Some(id) = self.active_period {
            if !self.owns_period(id) {
                self.set_active_period(None)?;
            }
        }
        Ok(())
    }

    fn owns_period(&self, id: Uuid) -> bool {
        self.store
            .read(|snapshot| {
                snapshot
                    .period(id)
                    .is_some_and(|period| period.owner == self.principal)
            })
            .unwrap_or(false)
    }

    pub(crate) fn require_period(&self) -> Result<Uuid, CommandError> {
        self.active_period.ok_or(CommandError::NoActivePeriod)
    }

    /// Resolves an explicit period argument, falling back to the active period.
    pub(crate) fn period_or_active(&self, token: Option<&str>) -> Result<Uuid, CommandError> {
        match token {
            Some(token) => self.resolve_period(token),
            None => self.require_period(),
        }
    }

    /// Finds one of the principal's periods by name or id prefix.
    pub(crate) fn resolve_period(&self, token: &str) -> Result<Uuid, CommandError> {
        let candidates = self.store.read(|snapshot| {
            snapshot
                .periods
                .iter()
                .filter(|period| period.owner == self.principal)
                .map(|period| (period.id, Some(period.name.clone())))
                .collect::<Vec<_>>()
        })?;
        resolve("period", token, candidates)
    }

    pub(crate) fn resolve_category(&self, token: &str) -> Result<Uuid, CommandError> {
        let candidates = self.store.read(|snapshot| {
            snapshot
                .categories
                .iter()
                .filter(|category| category.owner == self.principal)
                .map(|category| (category.id, Some(category.name.clone())))
                .collect::<Vec<_>>()
        })?;
        resolve("category", token, candidates)
    }

    /// Finds a spending entry by id prefix, or by date within the active period.
    pub(crate) fn resolve_entry(&self, token: &str) -> Result<Uuid, CommandError> {
        if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
            let period_id = self.require_period()?;
            let found = self.store.read(|snapshot| {
                snapshot
                    .spendings
                    .iter()
                    .find(|entry| {
                        entry.owner == self.principal
                            && entry.period_id == period_id
                            && entry.date == date
                    })
                    .map(|entry| entry.id)
            })?;
            return found.ok_or_else(|| {
                CommandError::InvalidArguments(format!("no spending recorded for {date}"))
            });
        }
        let candidates = self.store.read(|snapshot| {
            snapshot
                .spendings
                .iter()
                .filter(|entry| entry.owner == self.principal)
                .map(|entry| (entry.id, None))
                .collect::<Vec<_>>()
        })?;
        resolve("spending", token, candidates)
    }

    pub(crate) fn resolve_income(&self, token: &str) -> Result<Uuid, CommandError> {
        let candidates = self.store.read(|snapshot| {
            snapshot
                .incomes
                .iter()
                .filter(|income| income.owner == self.principal)
                .map(|income| (income.id, None))
                .collect::<Vec<_>>()
        })?;
        resolve("income", token, candidates)
    }

    pub(crate) fn resolve_budget(&self, token: &str) -> Result<Uuid, CommandError> {
        let candidates = self.store.read(|snapshot| {
            snapshot
                .budgets
                .iter()
                .filter(|budget| budget.owner == self.principal)
                .map(|budget| (budget.id, None))
                .collect::<Vec<_>>()
        })?;
        resolve("budget", token, candidates)
    }
}

fn open_store(
    manager: &ConfigManager,
    config: &crate::config::Config,
) -> Result<(LedgerStore, JsonBackend), StoreError> {
    let root = config.resolve_data_root(manager.home());
    let backend = JsonBackend::with_retention(
        paths::data_dir_in(&root),
        paths::backups_dir_in(&root),
        config.backup_retention,
    )?;
    let store = LedgerStore::open(Box::new(backend.clone()))?;
    Ok((store, backend))
}

/// Matches `token` against names (case-insensitive, exact) first, then id prefixes.
fn resolve(
    kind: &str,
    token: &str,
    candidates: Vec<(Uuid, Option<String>)>,
) -> Result<Uuid, CommandError> {
    let by_name: Vec<Uuid> = candidates
        .iter()
        .filter(|(_, name)| {
            name.as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(token.trim()))
        })
        .map(|(id, _)| *id)
        .collect();
    if let [id] = by_name.as_slice() {
        return Ok(*id);
    }

    let needle = token.trim().to_ascii_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(CommandError::InvalidArguments(format!("{kind} reference is empty")));
    }
    let by_prefix: Vec<Uuid> = candidates
        .iter()
        .map(|(id, _)| *id)
        .filter(|id| id.simple().to_string().starts_with(&needle))
        .collect();
    match by_prefix.as_slice() {
        [id] => Ok(*id),
        [] if by_name.len() > 1 => Err(CommandError::InvalidArguments(format!(
            "several {kind}s are named `{token}`; use an id instead"
        ))),
        [] => Err(CommandError::InvalidArguments(format!(
            "no {kind} matches `{token}`"
        ))),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{token}` matches several {kind}s; use a longer id"
        ))),
    }
}

pub(crate) fn short_id(id: Uuid) -> String {
    let mut short = id.simple().to_string();
    short.truncate(8);
    short
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{input}` (use YYYY-MM-DD)"))
    })
}

/// Parses a decimal amount; range and precision are checked by the services.
pub(crate) fn parse_amount(field: &str, input: &str) -> Result<Decimal, CommandError> {
    input.trim().parse::<Decimal>().map_err(|_| {
        CommandError::InvalidArguments(format!("{field} `{input}` is not a valid amount"))
    })
}

/// Splits `key=value` arguments, rejecting unknown keys.
pub(crate) fn parse_assignments<'a>(
    args: &[&'a str],
    allowed: &[&str],
) -> Result<HashMap<&'a str, &'a str>, CommandError> {
    let mut fields = HashMap::new();
    for arg in args {
        let (key, value) = arg.split_once('=').ok_or_else(|| {
            CommandError::InvalidArguments(format!("expected key=value, got `{arg}`"))
        })?;
        if !allowed.contains(&key) {
            return Err(CommandError::InvalidArguments(format!(
                "unknown field `{key}` (expected one of: {})",
                allowed.join(", ")
            )));
        }
        fields.insert(key, value);
    }
    Ok(fields)
}

pub(crate) fn usage(text: &str) -> CommandError {
    CommandError::InvalidArguments(format!("usage: {text}"))
}
