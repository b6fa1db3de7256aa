use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub mod validator;

use crate::cli::Cli;
use crate::domain::HAL_FORMS_JSON;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub client: ClientSettings,
}

/// How the HTTP collaborator talks to the API under test
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientSettings {
    /// Entry point of traversals; relative references resolve against it
    #[serde(default = "default_base_uri")]
    pub base_uri: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// `Accept` header sent unless a request sets its own
    #[serde(default = "default_accept")]
    pub accept: String,
    /// Headers sent with every request, e.g. credentials
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_uri: default_base_uri(),
            timeout_seconds: default_timeout_seconds(),
            accept: default_accept(),
            headers: HashMap::new(),
        }
    }
}

fn default_base_uri() -> String {
    "http://127.0.0.1:8080/".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_accept() -> String {
    HAL_FORMS_JSON.to_string()
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (includes config file and CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(&cli.config)?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    /// Load `halcheck.{toml,yaml,json}` from `root`, if present
    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let settings = Self::load(&Path::new(root).join("halcheck"))?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(config_path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(
                Environment::with_prefix("HALCHECK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(base_uri) = &cli.base_uri {
            self.client.base_uri = base_uri.clone();
        }
        for (name, value) in &cli.headers {
            // Header names are case-insensitive and file keys may be lowercased
            self.client
                .headers
                .retain(|existing, _| !existing.eq_ignore_ascii_case(name));
            self.client.headers.insert(name.clone(), value.clone());
        }
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }
}
