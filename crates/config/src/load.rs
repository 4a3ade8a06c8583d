//! Parsing, projection, and serialization of the persisted settings document.
//!
//! The persisted document is kept as a raw `toml::Table` so that keys the
//! schema does not know survive a read-merge-write cycle. Projection onto
//! [`Config`] is lenient: it never fails, and reports each schema mismatch as
//! a [`SchemaIssue`] for the caller to log.

use crate::schema::{Config, ConfigField};
use search_settings_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use toml::Table;

/// Kind of mismatch between the persisted document and the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaIssueKind {
    /// A scalar leaf of another type was rendered as a string.
    LeafCoerced,
    /// A table or array leaf was replaced with the empty string.
    LeafDropped,
    /// A section that is not a table was ignored.
    SectionIgnored,
}

impl SchemaIssueKind {
    /// Stable log event name for this issue.
    #[must_use]
    pub const fn event(self) -> &'static str {
        match self {
            Self::LeafCoerced => "config.leaf_coerced",
            Self::LeafDropped => "config.leaf_dropped",
            Self::SectionIgnored => "config.section_ignored",
        }
    }
}

/// One schema mismatch found while projecting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Dotted path of the offending value.
    pub path: String,
    /// What was wrong.
    pub kind: SchemaIssueKind,
    /// TOML type name that was found.
    pub found: &'static str,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SchemaIssueKind::LeafCoerced => {
                write!(formatter, "{} is a {}, using its string form", self.path, self.found)
            },
            SchemaIssueKind::LeafDropped => {
                write!(formatter, "{} is a {}, treating it as empty", self.path, self.found)
            },
            SchemaIssueKind::SectionIgnored => {
                write!(formatter, "{} is a {}, not a table; ignoring it", self.path, self.found)
            },
        }
    }
}

/// Parse TOML text into a raw document.
///
/// The error reports the parser message and position only. The offending
/// source line is never quoted, since it may hold an API key.
pub fn parse_document(input: &str) -> Result<Table, ErrorEnvelope> {
    toml::from_str(input).map_err(|error: toml::de::Error| {
        let reason = error.message().trim();
        let Some((line, column)) = error.span().map(|span| line_and_column(input, span.start))
        else {
            return ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid settings TOML: {reason}"),
            );
        };
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid settings TOML at line {line}, column {column}: {reason}"),
        )
        .with_metadata("line", line.to_string())
        .with_metadata("column", column.to_string())
    })
}

/// One-based line and column of a byte offset.
fn line_and_column(input: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(input.len());
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    let before = &input[..end];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |index| index + 1);
    (line, before[line_start..].chars().count() + 1)
}

/// Project a raw document onto the schema.
///
/// Missing leaves are empty strings. Extra keys are ignored.
#[must_use]
pub fn project_document(document: &Table) -> (Config, Vec<SchemaIssue>) {
    let mut config = Config::default();
    let mut issues = Vec::new();
    let mut ignored_sections = BTreeSet::new();

    for field in ConfigField::ALL {
        let Some((leaf_key, sections)) = field.path().split_last() else {
            continue;
        };

        let mut current = Some(document);
        for (depth, segment) in sections.iter().enumerate() {
            current = match current.and_then(|table| table.get(*segment)) {
                None => None,
                Some(toml::Value::Table(section)) => Some(section),
                Some(other) => {
                    let path = sections.get(..=depth).unwrap_or(sections).join(".");
                    if ignored_sections.insert(path.clone()) {
                        issues.push(SchemaIssue {
                            path,
                            kind: SchemaIssueKind::SectionIgnored,
                            found: other.type_str(),
                        });
                    }
                    None
                },
            };
        }

        let Some(value) = current.and_then(|table| table.get(*leaf_key)) else {
            continue;
        };
        let (text, issue) = leaf_to_string(value);
        if let Some(kind) = issue {
            issues.push(SchemaIssue {
                path: field.key(),
                kind,
                found: value.type_str(),
            });
        }
        *field.get_mut(&mut config) = text;
    }

    (config, issues)
}

fn leaf_to_string(value: &toml::Value) -> (String, Option<SchemaIssueKind>) {
    let coerced = Some(SchemaIssueKind::LeafCoerced);
    match value {
        toml::Value::String(text) => (text.clone(), None),
        toml::Value::Integer(number) => (number.to_string(), coerced),
        toml::Value::Float(number) => (number.to_string(), coerced),
        toml::Value::Boolean(flag) => (flag.to_string(), coerced),
        toml::Value::Datetime(datetime) => (datetime.to_string(), coerced),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            (String::new(), Some(SchemaIssueKind::LeafDropped))
        },
    }
}

/// Build the document holding every leaf of `config`.
///
/// For `Config::default()` this is the all-empty document used when the
/// store is missing or unreadable.
#[must_use]
pub fn document_from_config(config: &Config) -> Table {
    let mut document = Table::new();
    for field in ConfigField::ALL {
        insert_leaf(&mut document, field.path(), field.get(config));
    }
    document
}

fn insert_leaf(table: &mut Table, path: &[&str], value: &str) {
    match path {
        [] => {},
        [leaf] => {
            table.insert((*leaf).to_string(), toml::Value::String(value.to_string()));
        },
        [section, rest @ ..] => {
            let entry = table
                .entry((*section).to_string())
                .or_insert_with(|| toml::Value::Table(Table::new()));
            if !entry.is_table() {
                *entry = toml::Value::Table(Table::new());
            }
            if let toml::Value::Table(nested) = entry {
                insert_leaf(nested, rest, value);
            }
        },
    }
}

/// Serialize a value as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml<T: Serialize + ?Sized>(value: &T) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(value).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize settings TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

/// Serialize a value as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(value).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_json"),
            format!("failed to serialize settings JSON: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}
