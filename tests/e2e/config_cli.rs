//! End-to-end settings flows through the `search-settings` binary.

use serde_json::Value;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

const SETTINGS_ENV: &[&str] = &[
    "SIMILARITY_MEASURE",
    "KEEP_ALIVE",
    "OPENAI_API_KEY",
    "GROQ_API_KEY",
    "ANTHROPIC_API_KEY",
    "GEMINI_API_KEY",
    "OLLAMA_API_URL",
    "CUSTOM_OPENAI_API_URL",
    "CUSTOM_OPENAI_API_KEY",
    "CUSTOM_OPENAI_MODEL_NAME",
    "SEARXNG_API_URL",
];

struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new(label: &str) -> Result<Self, Box<dyn Error>> {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        let dir = std::env::temp_dir().join(format!("search-settings-e2e-{label}-{nanos}"));
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn config_path(&self) -> PathBuf {
        self.dir.join("settings").join("config.toml")
    }

    fn write_config(&self, text: &str) -> Result<(), Box<dyn Error>> {
        let path = self.config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    fn run(&self, args: &[&str], env: &[(&str, &str)]) -> std::io::Result<Output> {
        let config = self.config_path();
        let mut command = Command::new(env!("CARGO_BIN_EXE_search-settings"));
        command
            .args(args)
            .arg("--config")
            .arg(&config)
            .current_dir(&self.dir);
        scrub_settings_env(&mut command);
        for (key, value) in env {
            command.env(key, value);
        }
        command.output()
    }

    fn run_json(&self, args: &[&str], env: &[(&str, &str)]) -> Result<Value, Box<dyn Error>> {
        let mut args = args.to_vec();
        args.extend(["--output", "json"]);
        let output = self.run(&args, env)?;
        if !output.status.success() {
            return Err(format!(
                "command {args:?} failed: {}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            )
            .into());
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn scrub_settings_env(command: &mut Command) {
    for (key, _) in std::env::vars() {
        if key.starts_with("SEARCH_SETTINGS_") {
            command.env_remove(key);
        }
    }
    for key in SETTINGS_ENV {
        command.env_remove(key);
    }
}

fn stored_document(path: &Path) -> Result<toml::Table, Box<dyn Error>> {
    Ok(toml::from_str(&std::fs::read_to_string(path)?)?)
}

#[test]
fn nested_update_keeps_sibling_providers() -> Result<(), Box<dyn Error>> {
    let workspace = Workspace::new("nested")?;
    workspace.write_config("[MODELS.OPENAI]\nAPI_KEY = \"OLD\"\n\n[MODELS.GROQ]\nAPI_KEY = \"X\"\n")?;

    workspace.run_json(
        &["config", "update", "--json", r#"{"MODELS":{"OPENAI":{"API_KEY":"NEW"}}}"#],
        &[],
    )?;

    let shown = workspace.run_json(&["config", "base", "--reveal"], &[])?;
    assert_eq!(shown["config"]["MODELS"]["OPENAI"]["API_KEY"], "NEW");
    assert_eq!(shown["config"]["MODELS"]["GROQ"]["API_KEY"], "X");
    Ok(())
}

#[test]
fn env_value_wins_over_the_file() -> Result<(), Box<dyn Error>> {
    let workspace = Workspace::new("precedence")?;
    workspace.write_config("[MODELS.OPENAI]\nAPI_KEY = \"FILE_KEY\"\n")?;

    let output = workspace.run(
        &["config", "get", "OPENAI_API_KEY", "--reveal"],
        &[("OPENAI_API_KEY", "ENV_KEY")],
    )?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "ENV_KEY\n");

    let output = workspace.run(
        &["config", "get", "OPENAI_API_KEY", "--reveal"],
        &[("OPENAI_API_KEY", "")],
    )?;
    assert_eq!(String::from_utf8_lossy(&output.stdout), "FILE_KEY\n");
    Ok(())
}

#[test]
fn show_never_prints_api_keys_without_reveal() -> Result<(), Box<dyn Error>> {
    let workspace = Workspace::new("redact")?;
    workspace.write_config(
        "[MODELS.ANTHROPIC]\nAPI_KEY = \"sk-ant-file\"\n\n[MODELS.CUSTOM_OPENAI]\nAPI_URL = \"https://user:pw@llm.internal/v1\"\n",
    )?;

    for format in ["text", "json", "toml"] {
        let output = workspace.run(
            &["config", "show", "--output", format],
            &[("GROQ_API_KEY", "gsk-env")],
        )?;
        assert!(output.status.success());
        let text = String::from_utf8_lossy(&output.stdout);
        assert!(!text.contains("sk-ant-file"), "{format} leaked a file key");
        assert!(!text.contains("gsk-env"), "{format} leaked an env key");
        assert!(!text.contains("user:pw"), "{format} leaked URL credentials");
        assert!(text.contains("llm.internal"));
    }
    Ok(())
}

#[test]
fn missing_store_resolves_to_empty_and_set_creates_it() -> Result<(), Box<dyn Error>> {
    let workspace = Workspace::new("missing")?;

    let shown = workspace.run_json(&["config", "show"], &[])?;
    assert_eq!(shown["config"]["GENERAL"]["KEEP_ALIVE"], "");
    assert!(!workspace.config_path().exists());

    workspace.run_json(&["config", "set", "MODELS.CUSTOM_OPENAI.MODEL_NAME", "llama3"], &[])?;

    let document = stored_document(&workspace.config_path())?;
    let custom = document
        .get("MODELS")
        .and_then(|models| models.get("CUSTOM_OPENAI"))
        .ok_or("missing CUSTOM_OPENAI section")?;
    assert_eq!(custom.get("MODEL_NAME").and_then(toml::Value::as_str), Some("llama3"));
    assert_eq!(custom.get("API_KEY").and_then(toml::Value::as_str), Some(""));
    Ok(())
}

#[test]
fn malformed_store_is_reported_on_stderr_and_replaced_on_update() -> Result<(), Box<dyn Error>> {
    let workspace = Workspace::new("malformed")?;
    workspace.write_config("[GENERAL\nKEEP_ALIVE = ")?;

    let output = workspace.run(
        &["config", "show"],
        &[("SEARCH_SETTINGS_LOG_FORMAT", "json")],
    )?;
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    let events: Vec<Value> = stderr
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect();
    assert!(
        events
            .iter()
            .any(|event| event["event"] == "config.store_malformed" && event["level"] == "warn"),
        "stderr was: {stderr}"
    );

    workspace.run_json(&["config", "set", "SIMILARITY_MEASURE", "cosine"], &[])?;
    let document = stored_document(&workspace.config_path())?;
    assert_eq!(
        document
            .get("GENERAL")
            .and_then(|general| general.get("SIMILARITY_MEASURE"))
            .and_then(toml::Value::as_str),
        Some("cosine")
    );
    Ok(())
}

#[test]
fn unknown_sections_survive_updates() -> Result<(), Box<dyn Error>> {
    let workspace = Workspace::new("extra")?;
    workspace.write_config("[UI]\nTHEME = \"dark\"\n")?;

    workspace.run_json(
        &["config", "update", "--json", r#"{"API_ENDPOINTS":{"SEARXNG":"http://searxng:8080"}}"#],
        &[],
    )?;

    let document = stored_document(&workspace.config_path())?;
    assert_eq!(
        document
            .get("UI")
            .and_then(|ui| ui.get("THEME"))
            .and_then(toml::Value::as_str),
        Some("dark")
    );
    Ok(())
}

#[test]
fn fields_attribute_each_value_to_its_source() -> Result<(), Box<dyn Error>> {
    let workspace = Workspace::new("fields")?;
    workspace.write_config("[GENERAL]\nKEEP_ALIVE = \"5m\"\n")?;

    let listed = workspace.run_json(&["config", "fields"], &[("OLLAMA_API_URL", "http://ollama:11434")])?;
    let fields = listed["fields"].as_array().ok_or("fields array")?;
    assert_eq!(fields.len(), SETTINGS_ENV.len());
    let source = |env_var: &str| {
        fields
            .iter()
            .find(|row| row["envVar"] == env_var)
            .map(|row| row["source"].clone())
    };
    assert_eq!(source("OLLAMA_API_URL"), Some(Value::from("env")));
    assert_eq!(source("KEEP_ALIVE"), Some(Value::from("file")));
    assert_eq!(source("GEMINI_API_KEY"), Some(Value::from("unset")));
    Ok(())
}

#[test]
fn non_object_update_is_rejected_without_writing() -> Result<(), Box<dyn Error>> {
    let workspace = Workspace::new("reject")?;

    let output = workspace.run(&["config", "update", "--json", "[1,2]"], &[])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(!workspace.config_path().exists());
    Ok(())
}

#[test]
fn parallel_processes_do_not_lose_updates() -> Result<(), Box<dyn Error>> {
    let workspace = Workspace::new("parallel")?;
    let config = workspace.config_path();

    let children: Vec<_> = SETTINGS_ENV
        .iter()
        .map(|field| {
            let mut command = Command::new(env!("CARGO_BIN_EXE_search-settings"));
            command
                .args(["config", "set", *field, field.to_lowercase().as_str()])
                .arg("--config")
                .arg(&config)
                .current_dir(&workspace.dir)
                .stdout(Stdio::null())
                .stderr(Stdio::null());
            scrub_settings_env(&mut command);
            command.spawn()
        })
        .collect::<Result<_, _>>()?;
    for mut child in children {
        assert!(child.wait()?.success());
    }

    let output = workspace.run(&["config", "fields", "--output", "json"], &[])?;
    let listed: Value = serde_json::from_slice(&output.stdout)?;
    let fields = listed["fields"].as_array().ok_or("fields array")?;
    assert!(fields.iter().all(|row| row["source"] == "file"));
    Ok(())
}
