//! Configuration types and loading.
//!
//! [`CoverConfig`] is layered from built-in defaults, `.cover/config.yaml`
//! and `COVER_*` environment variables (nested keys separated by `__`, e.g.
//! `COVER_DEFAULTS__PROCUREMENT_TYPE=lease`). It is loaded with
//! [`load_config`] and written back with [`save_config`].

use std::collections::BTreeMap;
use std::path::Path;

use cover_rules::{EvalOptions, FactValue, SchemaDef, SchemaError, UnknownFacts};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the configuration inside `.cover/`.
pub const CONFIG_FILE: &str = "config.yaml";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be serialized to YAML.
    #[error("failed to write config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A configuration layer held an invalid value.
    #[error("invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// A configuration key or value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Extract(Box::new(e))
    }
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The full configuration, corresponding to `.cover/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CoverConfig {
    /// Output JSON instead of human-readable text.
    #[serde(default)]
    pub json: bool,

    /// Rule table name or path. Unset means the built-in vehicle table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,

    /// Whether input facts the rule table does not declare are rejected.
    #[serde(default)]
    pub unknown_facts: UnknownFacts,

    /// Per-fact default overrides, e.g. `procurement_type: lease`.
    #[serde(default)]
    pub defaults: BTreeMap<String, FactValue>,
}

impl CoverConfig {
    /// Evaluation options implied by this configuration.
    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            unknown_facts: self.unknown_facts,
        }
    }

    /// Apply the configured default overrides to a rule table before it is
    /// built.
    pub fn apply_defaults(&self, def: &mut SchemaDef) -> std::result::Result<(), SchemaError> {
        for (fact, value) in &self.defaults {
            def.set_default(fact, value.clone())?;
        }
        Ok(())
    }

    /// Read a single key as a display string.
    ///
    /// Keys: `json`, `rules`, `unknown_facts`, `defaults.<fact>`.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "json" => Some(self.json.to_string()),
            "rules" => self.rules.clone(),
            "unknown_facts" => Some(unknown_facts_str(self.unknown_facts).to_string()),
            _ => key
                .strip_prefix("defaults.")
                .and_then(|fact| self.defaults.get(fact))
                .map(|v| v.to_string()),
        }
    }

    /// Set a single key from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unknown keys or values that
    /// do not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        match key {
            "json" => {
                self.json = value
                    .parse()
                    .map_err(|_| invalid("expected 'true' or 'false'"))?;
            }
            "rules" => {
                self.rules = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "unknown_facts" => {
                self.unknown_facts = match value {
                    "reject" => UnknownFacts::Reject,
                    "ignore" => UnknownFacts::Ignore,
                    _ => return Err(invalid("expected 'reject' or 'ignore'")),
                };
            }
            _ => match key.strip_prefix("defaults.") {
                Some(fact) if !fact.is_empty() => {
                    self.defaults
                        .insert(fact.to_string(), FactValue::parse_loose(value));
                }
                _ => return Err(invalid("unknown key")),
            },
        }
        Ok(())
    }
}

fn unknown_facts_str(mode: UnknownFacts) -> &'static str {
    match mode {
        UnknownFacts::Reject => "reject",
        UnknownFacts::Ignore => "ignore",
    }
}

/// Load configuration for the given `.cover/` directory.
///
/// Missing or empty `config.yaml` contributes nothing; environment variables
/// override the file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file exists but cannot be read, or
/// [`ConfigError::Extract`] if any layer holds an invalid value.
pub fn load_config(cover_dir: &Path) -> Result<CoverConfig> {
    let config = file_figment(cover_dir)?.merge(env_provider()).extract()?;
    Ok(config)
}

/// Configuration from defaults and `config.yaml` only.
///
/// Used when writing the file back, so environment overrides are not
/// persisted.
pub fn load_file_config(cover_dir: &Path) -> Result<CoverConfig> {
    let config = file_figment(cover_dir)?.extract()?;
    Ok(config)
}

fn file_figment(cover_dir: &Path) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(CoverConfig::default()));

    let config_path = cover_dir.join(CONFIG_FILE);
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if !content.trim().is_empty() {
            figment = figment.merge(Yaml::string(&content));
        }
    }
    Ok(figment)
}

/// Configuration from defaults and the environment only, for use outside a
/// project directory.
pub fn load_env_config() -> Result<CoverConfig> {
    let config = Figment::from(Serialized::defaults(CoverConfig::default()))
        .merge(env_provider())
        .extract()?;
    Ok(config)
}

fn env_provider() -> Env {
    // COVER_DIR selects the project directory and is not a config key.
    Env::prefixed("COVER_").split("__").ignore(&["dir"])
}

/// Save configuration to `config.yaml` inside the given `.cover/` directory,
/// creating the directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] on I/O failure or [`ConfigError::Yaml`] if
/// serialization fails.
pub fn save_config(cover_dir: &Path, config: &CoverConfig) -> Result<()> {
    std::fs::create_dir_all(cover_dir)?;

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(cover_dir.join(CONFIG_FILE), yaml)?;
    Ok(())
}
