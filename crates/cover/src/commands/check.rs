//! `cover check` -- validate a rule table file.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde_json::json;

use cover_rules::{RulesError, Schema, parser};

use crate::cli::CheckArgs;
use crate::context::RuntimeContext;
use crate::output::{ICON_FAIL, ICON_PASS, output_json};

/// Execute the `cover check` command.
///
/// Parse and validation failures are reported as an invalid table; only
/// I/O errors are reported as command failures.
pub fn run(ctx: &RuntimeContext, args: &CheckArgs) -> Result<()> {
    let path = locate(ctx, &args.file)?;
    tracing::debug!(path = %path.display(), "checking rule table");

    match check_file(&path) {
        Ok(schema) => {
            let facts = schema.facts().count();
            let derived = schema.evaluation_order().count();
            if ctx.json {
                output_json(&json!({
                    "valid": true,
                    "path": path.display().to_string(),
                    "name": schema.name(),
                    "facts": facts,
                    "derived": derived,
                }));
            } else if !ctx.quiet {
                println!(
                    "{} {}: {} facts, {} derived variables",
                    ICON_PASS,
                    schema.name(),
                    facts,
                    derived
                );
            }
            Ok(())
        }
        Err(RulesError::Io(e)) => {
            Err(e).with_context(|| format!("failed to read {}", path.display()))
        }
        Err(e) => {
            if ctx.json {
                output_json(&json!({
                    "valid": false,
                    "path": path.display().to_string(),
                    "error": e.to_string(),
                }));
            } else {
                println!("{} {}: {}", ICON_FAIL, path.display(), e);
            }
            bail!("rule table {} is invalid", path.display());
        }
    }
}

fn locate(ctx: &RuntimeContext, file: &str) -> Result<PathBuf> {
    let path = PathBuf::from(file);
    if path.is_file() {
        return Ok(path);
    }
    ctx.find_rules(file)
}

fn check_file(path: &std::path::Path) -> Result<Schema, RulesError> {
    let def = parser::load_schema_def(path)?;
    Ok(def.build()?)
}
