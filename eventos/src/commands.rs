//! Management commands.
//!
//! Each subcommand of the `eventos` binary is a [`ManagementCommand`]
//! registered in a [`CommandRegistry`], which builds the clap command line
//! and dispatches to the matching handler.
//!
//! ```text
//! eventos [--settings PATH] runserver [ADDR]
//! eventos [--settings PATH] migrate
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use eventos_core::{settings_loader, EventosError, EventosResult, Settings};

use crate::app::build_app;
use crate::db::Database;

/// A subcommand of the `eventos` binary.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The name used to invoke the command.
    fn name(&self) -> &'static str;

    /// One-line description shown in `--help`.
    fn help(&self) -> &'static str;

    /// Adds the command's own arguments.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> EventosResult<()>;
}

/// The set of commands the binary knows about.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn ManagementCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(RunserverCommand));
        registry.register(Box::new(MigrateCommand));
        registry
    }
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a command, replacing any with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name(), command);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Registered command names, sorted.
    pub fn list_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The full command line: a global `--settings` option plus one
    /// subcommand per registered command.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("eventos")
            .about("Event and volunteer management")
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                clap::Arg::new("settings")
                    .long("settings")
                    .value_name("PATH")
                    .global(true)
                    .help("TOML settings file; EVENTOS_* environment variables override it"),
            );
        for name in self.list_commands() {
            if let Some(cmd) = self.get(name) {
                app = app.subcommand(cmd.add_arguments(clap::Command::new(name).about(cmd.help())));
            }
        }
        app
    }

    /// Dispatches to the subcommand named in `matches`.
    ///
    /// # Errors
    ///
    /// Returns [`EventosError::ConfigurationError`] if no known subcommand
    /// was given, or the command's own error.
    pub async fn execute(&self, matches: &clap::ArgMatches, settings: &Settings) -> EventosResult<()> {
        let (name, sub_matches) = matches.subcommand().ok_or_else(|| {
            EventosError::ConfigurationError("No subcommand specified".to_string())
        })?;
        let cmd = self
            .get(name)
            .ok_or_else(|| EventosError::ConfigurationError(format!("Unknown command: {name}")))?;
        tracing::debug!(command = name, "running management command");
        cmd.handle(sub_matches, settings).await
    }
}

/// Loads settings from `--settings PATH` if given, otherwise from defaults
/// and the environment.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the settings are invalid.
pub fn load_settings(matches: &clap::ArgMatches) -> EventosResult<Settings> {
    match matches.get_one::<String>("settings") {
        Some(path) => settings_loader::from_toml_file_with_env(path),
        None => settings_loader::from_env(),
    }
}

/// Serves the application.
pub struct RunserverCommand;

impl RunserverCommand {
    /// The address to bind: the positional argument, else the settings.
    pub fn bind_address(matches: &clap::ArgMatches, settings: &Settings) -> String {
        let addr = matches
            .get_one::<String>("addr")
            .map_or(settings.bind_address.as_str(), String::as_str);
        if addr.contains(':') {
            addr.to_string()
        } else {
            format!("127.0.0.1:{addr}")
        }
    }
}

#[async_trait]
impl ManagementCommand for RunserverCommand {
    fn name(&self) -> &'static str {
        "runserver"
    }

    fn help(&self) -> &'static str {
        "Starts the web server"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("addr")
                .value_name("ADDR")
                .required(false)
                .help("host:port or port to bind (default: bind_address from settings)"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> EventosResult<()> {
        let addr = Self::bind_address(matches, settings);
        let db = Database::connect(&settings.database)?;
        db.migrate().await?;
        build_app(settings.clone(), &db)?.run_on(&addr).await
    }
}

/// Creates the database tables.
pub struct MigrateCommand;

#[async_trait]
impl ManagementCommand for MigrateCommand {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn help(&self) -> &'static str {
        "Creates missing database tables"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> EventosResult<()> {
        let db = Database::connect(&settings.database)?;
        let tables = db.migrate().await?;
        if tables.is_empty() {
            println!("In-memory storage, nothing to migrate.");
        }
        for table in tables {
            println!("  Table {table} ... OK");
        }
        Ok(())
    }
}
