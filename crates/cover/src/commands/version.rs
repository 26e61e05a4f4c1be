//! `cover version` -- print version, build info and platform.

use anyhow::Result;

use crate::context::RuntimeContext;
use crate::output::output_json;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build identifier, overridable at compile time with `COVER_BUILD`.
const BUILD: &str = match option_env!("COVER_BUILD") {
    Some(b) => b,
    None => "dev",
};

/// Execute the `cover version` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;

    if ctx.json {
        output_json(&serde_json::json!({
            "version": VERSION,
            "build": BUILD,
            "rules_format": cover_rules::types::SCHEMA_VERSION,
            "os": os,
            "arch": arch,
        }));
    } else {
        println!("cover version {} ({}) {}/{}", VERSION, BUILD, os, arch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_constants_exist() {
        assert!(!VERSION.is_empty());
        assert!(!BUILD.is_empty());
    }
}
