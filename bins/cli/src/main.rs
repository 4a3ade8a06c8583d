//! CLI binary entrypoint.

mod commands;
mod error;
mod format;
mod logging;

use clap::{Parser, Subcommand};
use commands::{
    ConfigView, run_config_fields, run_config_get, run_config_set, run_config_show,
    run_config_update, run_info,
};
use error::CliError;
use format::{OutputArgs, OutputMode};
use logging::LogSettings;
use search_settings_adapters::{FileConfigStore, ProcessEnv};
use search_settings_config::ConfigResolver;
use search_settings_ports::{EnvSourcePort, LoggerPort, log_fields};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "search-settings",
    version,
    about = "Inspect and update search service settings",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Settings file path. Defaults to `config.toml` in the working directory.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build and version details.
    Info,
    /// Settings commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Show the effective settings (file values overridden by env vars).
    Show {
        /// Print secrets instead of redacting them.
        #[arg(long)]
        reveal: bool,
    },
    /// Show the persisted settings without env overrides.
    Base {
        /// Print secrets instead of redacting them.
        #[arg(long)]
        reveal: bool,
    },
    /// Print one effective value.
    Get {
        /// Dotted path (`MODELS.OPENAI.API_KEY`) or env var name (`OPENAI_API_KEY`).
        #[arg(value_name = "FIELD")]
        field: String,
        /// Print the value even when it is a secret.
        #[arg(long)]
        reveal: bool,
    },
    /// Persist one value to the settings file.
    Set {
        /// Dotted path or env var name.
        #[arg(value_name = "FIELD")]
        field: String,
        /// New value.
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Deep-merge a partial JSON update into the settings file.
    Update {
        /// Partial settings as a JSON object.
        #[arg(long = "json", value_name = "PARTIAL")]
        input_json: String,
    },
    /// List fields, their env vars, and where each effective value comes from.
    Fields,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Config { command } => match command {
                ConfigCommands::Show { .. } => "config show",
                ConfigCommands::Base { .. } => "config base",
                ConfigCommands::Get { .. } => "config get",
                ConfigCommands::Set { .. } => "config set",
                ConfigCommands::Update { .. } => "config update",
                ConfigCommands::Fields => "config fields",
            },
        }
    }
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: error::ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    let env: Arc<dyn EnvSourcePort> = Arc::new(ProcessEnv);
    let logger = LogSettings::from_env(env.as_ref()).install();
    let logger: Arc<dyn LoggerPort> =
        Arc::from(logger.child(log_fields([("command", cli.command.name())])));
    let resolver = build_resolver(cli.config.as_deref(), env).with_logger(logger);

    match run(&cli.command, mode, &resolver) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn build_resolver(path: Option<&Path>, env: Arc<dyn EnvSourcePort>) -> ConfigResolver {
    let store = path.map_or_else(FileConfigStore::in_working_dir, FileConfigStore::new);
    ConfigResolver::new(Arc::new(store), env)
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode, resolver: &ConfigResolver) -> Result<CliOutput, CliError> {
    match command {
        Commands::Info => run_info(mode, resolver),
        Commands::Config { command } => match command {
            ConfigCommands::Show { reveal } => {
                run_config_show(mode, resolver, ConfigView::Effective, *reveal)
            },
            ConfigCommands::Base { reveal } => {
                run_config_show(mode, resolver, ConfigView::Base, *reveal)
            },
            ConfigCommands::Get { field, reveal } => run_config_get(mode, resolver, field, *reveal),
            ConfigCommands::Set { field, value } => run_config_set(mode, resolver, field, value),
            ConfigCommands::Update { input_json } => run_config_update(mode, resolver, input_json),
            ConfigCommands::Fields => run_config_fields(mode, resolver),
        },
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}
