//! `cover config` -- show, read and write `.cover/config.yaml`.

use anyhow::{Context, Result, bail};

use cover_config::config::{CoverConfig, load_file_config, save_config};
use cover_config::cover_dir::ensure_cover_dir;

use crate::cli::{ConfigArgs, ConfigCommands};
use crate::context::RuntimeContext;
use crate::output::{output_json, render_muted};

/// Execute the `cover config` command.
pub fn run(ctx: &RuntimeContext, args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommands::Show => show(ctx),

        ConfigCommands::Get(get_args) => {
            let value = ctx.config.get(&get_args.key);
            if ctx.json {
                output_json(&serde_json::json!({
                    "key": get_args.key,
                    "value": value,
                }));
                return Ok(());
            }
            match value {
                Some(v) => println!("{}", v),
                None => bail!("key '{}' is not set", get_args.key),
            }
            Ok(())
        }

        ConfigCommands::Set(set_args) => {
            let cover_dir = ensure_cover_dir(&ctx.cover_dir_or_default()?)?;
            // Environment overrides are not written back.
            let mut config = load_file_config(&cover_dir)
                .with_context(|| format!("failed to load config from {}", cover_dir.display()))?;
            config.set(&set_args.key, &set_args.value)?;
            validate(ctx, &config, &set_args.key)?;
            save_config(&cover_dir, &config)?;
            tracing::debug!(key = %set_args.key, dir = %cover_dir.display(), "config saved");

            if ctx.json {
                output_json(&serde_json::json!({
                    "key": set_args.key,
                    "value": config.get(&set_args.key),
                }));
            } else if !ctx.quiet {
                println!("Set {} = {}", set_args.key, set_args.value);
            }
            Ok(())
        }
    }
}

fn show(ctx: &RuntimeContext) -> Result<()> {
    if ctx.json {
        output_json(&ctx.config);
        return Ok(());
    }

    match &ctx.cover_dir {
        Some(dir) => println!("{}", render_muted(&format!("# {}", dir.display()))),
        None => println!("{}", render_muted("# no .cover directory, using defaults")),
    }
    for key in ["json", "rules", "unknown_facts"] {
        match ctx.config.get(key) {
            Some(v) => println!("{} = {}", key, v),
            None => println!("{} = {}", key, render_muted("(built-in vehicles)")),
        }
    }
    for (fact, value) in &ctx.config.defaults {
        println!("defaults.{} = {}", fact, value);
    }
    Ok(())
}

/// Reject values that would leave the project unable to evaluate: the
/// configured rule table must load and build with the configured defaults.
fn validate(ctx: &RuntimeContext, config: &CoverConfig, key: &str) -> Result<()> {
    if key != "rules" && !key.starts_with("defaults.") {
        return Ok(());
    }
    let mut def = ctx.load_rules(config.rules.as_deref())?;
    let name = def.name.clone();
    config
        .apply_defaults(&mut def)
        .with_context(|| format!("configured defaults do not fit rule table '{}'", name))?;
    def.build()
        .with_context(|| format!("rule table '{}' is invalid with the configured defaults", name))?;
    Ok(())
}
