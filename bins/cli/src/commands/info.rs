//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputFormat, OutputMode, pretty_json};
use search_settings_adapters::adapters_crate_version;
use search_settings_config::{ConfigResolver, config_crate_version, to_pretty_toml};
use search_settings_ports::ports_crate_version;
use search_settings_shared::shared_crate_version;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    shared_version: &'static str,
    ports_version: &'static str,
    config_version: &'static str,
    adapters_version: &'static str,
    store: String,
}

impl BuildInfo {
    fn collect(resolver: &ConfigResolver) -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            shared_version: shared_crate_version(),
            ports_version: ports_crate_version(),
            config_version: config_crate_version(),
            adapters_version: adapters_crate_version(),
            store: resolver.store_location(),
        }
    }
}

/// Run the info command.
pub fn run_info(mode: OutputMode, resolver: &ConfigResolver) -> Result<CliOutput, CliError> {
    let build = BuildInfo::collect(resolver);

    let stdout = match mode.format {
        OutputFormat::Json => pretty_json(&serde_json::json!({
            "status": "ok",
            "build": serde_json::to_value(&build)?,
        }))?,
        OutputFormat::Toml => to_pretty_toml(&build)?,
        OutputFormat::Text => format!(
            "status: ok\nname: {}\nversion: {}\nshared: {}\nports: {}\nconfig: {}\nadapters: {}\nstore: {}\n",
            build.name,
            build.version,
            build.shared_version,
            build.ports_version,
            build.config_version,
            build.adapters_version,
            build.store,
        ),
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
