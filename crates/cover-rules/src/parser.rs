//! Parse rule table files (TOML and JSON) and resolve rule table paths.

use std::path::{Path, PathBuf};

use crate::types::{RulesError, SchemaDef};

/// Parse a rule table from a TOML string.
pub fn parse_toml(content: &str) -> Result<SchemaDef, RulesError> {
    toml::from_str(content).map_err(|e| RulesError::Parse(e.to_string()))
}

/// Parse a rule table from a JSON string.
pub fn parse_json(content: &str) -> Result<SchemaDef, RulesError> {
    serde_json::from_str(content).map_err(|e| RulesError::Parse(e.to_string()))
}

/// Load a rule table from a file path (auto-detect TOML vs JSON by extension).
pub fn load_schema_def(path: &Path) -> Result<SchemaDef, RulesError> {
    let content = std::fs::read_to_string(path)?;
    let mut def = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_toml(&content)?,
        Some("json") => parse_json(&content)?,
        _ => parse_json(&content).or_else(|_| parse_toml(&content))?,
    };
    def.source = path.display().to_string();
    Ok(def)
}

/// Search for a rule table by name.
///
/// Search order:
/// 1. Exact path (absolute, or relative to `cwd`)
/// 2. `cwd` with standard extensions
/// 3. `.cover/rules/` under `cwd`
pub fn find_schema(name: &str, cwd: &Path) -> Result<PathBuf, RulesError> {
    let exact = Path::new(name);
    if exact.is_absolute() && exact.exists() {
        return Ok(exact.to_path_buf());
    }
    let relative = cwd.join(name);
    if relative.is_file() {
        return Ok(relative);
    }

    let suffixes = [".rules.toml", ".rules.json", ".toml", ".json"];

    for suffix in &suffixes {
        let candidate = cwd.join(format!("{}{}", name, suffix));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let rules_dir = cwd.join(".cover").join("rules");
    if rules_dir.is_dir() {
        for suffix in &suffixes {
            let candidate = rules_dir.join(format!("{}{}", name, suffix));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }

    Err(RulesError::Parse(format!(
        "rule table '{}' not found (searched cwd, .cover/rules/)",
        name
    )))
}
