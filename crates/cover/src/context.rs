//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds what a command handler needs: global flags,
//! the discovered `.cover/` directory and the effective configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use cover_config::config::{CoverConfig, load_config, load_env_config};
use cover_config::cover_dir::find_cover_dir;
use cover_rules::{Schema, SchemaDef, parser, vehicles};

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Discovered `.cover/` directory, if any.
    pub cover_dir: Option<PathBuf>,

    /// Effective configuration (defaults, file, environment).
    pub config: CoverConfig,

    /// Rule table requested on the command line.
    pub rules: Option<String>,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("cannot determine working directory")?;
        let cover_dir = find_cover_dir(&cwd);

        let config = match &cover_dir {
            Some(dir) => load_config(dir)
                .with_context(|| format!("failed to load config from {}", dir.display()))?,
            None => load_env_config().context("failed to load config from environment")?,
        };

        Ok(Self {
            json: global.json || config.json,
            cover_dir,
            config,
            rules: global.rules.clone(),
            quiet: global.quiet,
        })
    }

    /// Directory a new `.cover/` should be created in: the discovered one, or
    /// `./.cover`.
    pub fn cover_dir_or_default(&self) -> Result<PathBuf> {
        match &self.cover_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?.join(cover_config::cover_dir::COVER_DIR_NAME)),
        }
    }

    /// The descriptor for the selected rule table: `--rules`, then the
    /// configured table, then the built-in vehicle rules.
    pub fn schema_def(&self) -> Result<SchemaDef> {
        self.load_rules(self.rules.as_deref().or(self.config.rules.as_deref()))
    }

    /// Load a named rule table, or the built-in vehicle rules for `None`.
    pub fn load_rules(&self, name: Option<&str>) -> Result<SchemaDef> {
        let Some(name) = name else {
            return Ok(vehicles::schema_def());
        };
        let path = self.find_rules(name)?;
        tracing::debug!(path = %path.display(), "loading rule table");
        parser::load_schema_def(&path)
            .with_context(|| format!("failed to load rule table {}", path.display()))
    }

    /// Build the selected rule table with configured default overrides.
    pub fn schema(&self) -> Result<Schema> {
        let mut def = self.schema_def()?;
        self.config
            .apply_defaults(&mut def)
            .context("invalid default override in configuration")?;
        let name = def.name.clone();
        def.build()
            .with_context(|| format!("invalid rule table '{}'", name))
    }

    /// Resolve a rule table name against the working directory, then against
    /// the project root of the discovered `.cover/` directory.
    pub fn find_rules(&self, name: &str) -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        match parser::find_schema(name, &cwd) {
            Ok(path) => Ok(path),
            Err(first) => {
                let root = self.cover_dir.as_deref().and_then(Path::parent);
                match root {
                    Some(root) if root != cwd => parser::find_schema(name, root)
                        .with_context(|| format!("rule table '{}' not found", name)),
                    _ => Err(first).with_context(|| format!("rule table '{}' not found", name)),
                }
            }
        }
    }
}
