//! Output format helpers for CLI commands.

use clap::{Args, ValueEnum};

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text output.
    Text,
    /// Machine-friendly JSON output.
    Json,
    /// TOML, in the same layout as the settings file.
    Toml,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMode {
    pub format: OutputFormat,
}

impl OutputMode {
    /// Build output mode from CLI flags.
    #[must_use]
    pub fn from_args(args: &OutputArgs) -> Self {
        Self::new(args.output.unwrap_or(OutputFormat::Text))
    }

    /// Mode for a fixed format.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

/// Pretty JSON with a trailing newline.
pub fn pretty_json(value: &serde_json::Value) -> Result<String, serde_json::Error> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_to_text() {
        let mode = OutputMode::from_args(&OutputArgs { output: None });
        assert_eq!(mode.format, OutputFormat::Text);

        let mode = OutputMode::from_args(&OutputArgs {
            output: Some(OutputFormat::Toml),
        });
        assert_eq!(mode, OutputMode::new(OutputFormat::Toml));
    }
}
