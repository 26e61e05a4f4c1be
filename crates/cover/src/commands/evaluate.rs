//! `cover evaluate` -- compute coverage for one or more vehicles.
//!
//! Facts come from `--fact name=value` flags and/or a JSON `--input` file
//! holding one fact object or an array of them. Flags override values from
//! the file for every vehicle.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::json;

use cover_rules::{
    EvalOptions, FactValue, Facts, Outputs, Schema, UnknownFacts, evaluate_batch_with_context,
    evaluate_with_context,
};

use crate::cli::EvaluateArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table, render_bold, render_flag, render_muted};

/// Facts as read from `--input`.
#[derive(Debug)]
pub(crate) enum Input {
    Single(Facts),
    /// A JSON array, reported per vehicle even when it has one element.
    Batch(Vec<Facts>),
}

/// Execute the `cover evaluate` command.
pub fn run(ctx: &RuntimeContext, args: &EvaluateArgs) -> Result<()> {
    let schema = ctx.schema()?;
    let overrides = parse_fact_flags(&args.facts)?;

    let input = match &args.input {
        Some(path) => read_input(path)?,
        None => Input::Single(Facts::new()),
    };

    let mut options = ctx.config.eval_options();
    if args.ignore_unknown {
        options.unknown_facts = UnknownFacts::Ignore;
    }

    let apply = |mut facts: Facts| {
        facts.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        facts
    };

    match input {
        Input::Single(facts) => print_single(ctx, &schema, &apply(facts), options, args.trace),
        Input::Batch(batch) => {
            let batch: Vec<Facts> = batch.into_iter().map(apply).collect();
            tracing::debug!(vehicles = batch.len(), schema = schema.name(), "evaluating batch");
            print_batch(ctx, &schema, &batch, options, args.trace)
        }
    }
}

/// Parse `--fact key=value` flags.
pub(crate) fn parse_fact_flags(flags: &[String]) -> Result<Facts> {
    let mut facts = Facts::new();
    for flag in flags {
        let Some((name, value)) = flag.split_once('=') else {
            bail!("invalid fact format '{}': expected name=value", flag);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("invalid fact format '{}': empty name", flag);
        }
        facts.insert(name.to_string(), FactValue::parse_loose(value.trim()));
    }
    Ok(facts)
}

/// Read one fact object or an array of them from a JSON file (`-` = stdin).
fn read_input(path: &Path) -> Result<Input> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read facts from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    parse_input(&content).with_context(|| format!("invalid fact input in {}", path.display()))
}

pub(crate) fn parse_input(content: &str) -> Result<Input> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item)
                    .with_context(|| format!("entry {} is not a fact object", i))
            })
            .collect::<Result<Vec<Facts>>>()
            .map(Input::Batch),
        serde_json::Value::Object(_) => Ok(Input::Single(serde_json::from_value(value)?)),
        _ => bail!("expected a fact object or an array of fact objects"),
    }
}

fn print_single(
    ctx: &RuntimeContext,
    schema: &Schema,
    facts: &Facts,
    options: EvalOptions,
    trace: bool,
) -> Result<()> {
    let eval = evaluate_with_context(schema, facts, options)?;

    if ctx.json {
        if trace {
            output_json(&json!({
                "outputs": eval.outputs,
                "facts": eval.context.facts(),
            }));
        } else {
            output_json(&eval.outputs);
        }
        return Ok(());
    }

    if trace && !ctx.quiet {
        println!("{}", render_bold("Facts"));
        for (name, value) in eval.context.facts() {
            let supplied = if facts.contains_key(&name) { "" } else { " (default)" };
            println!("  {} = {}{}", name, value, render_muted(supplied));
        }
        println!();
    }

    print_outputs(schema, &eval.outputs);
    Ok(())
}

fn print_batch(
    ctx: &RuntimeContext,
    schema: &Schema,
    batch: &[Facts],
    options: EvalOptions,
    trace: bool,
) -> Result<()> {
    let mut failed = 0;
    let mut results = Vec::with_capacity(batch.len());

    for (i, result) in evaluate_batch_with_context(schema, batch, options)
        .into_iter()
        .enumerate()
    {
        match result {
            Ok(eval) => {
                if ctx.json {
                    let mut entry = json!({ "index": i, "outputs": eval.outputs });
                    if trace {
                        entry["facts"] = json!(eval.context.facts());
                    }
                    results.push(entry);
                } else {
                    println!("{}", render_bold(&format!("Vehicle {}", i + 1)));
                    print_outputs(schema, &eval.outputs);
                    println!();
                }
            }
            Err(e) => {
                failed += 1;
                if ctx.json {
                    results.push(json!({ "index": i, "error": e.to_string() }));
                } else {
                    println!("{}", render_bold(&format!("Vehicle {}", i + 1)));
                    println!("  error: {}", e);
                    println!();
                }
            }
        }
    }

    if ctx.json {
        output_json(&results);
    }

    if failed > 0 {
        bail!("{} of {} vehicles could not be evaluated", failed, batch.len());
    }
    Ok(())
}

/// Print derived values in evaluation order.
fn print_outputs(schema: &Schema, outputs: &Outputs) {
    let rows: Vec<Vec<String>> = schema
        .evaluation_order()
        .filter_map(|d| {
            outputs
                .get(&d.name)
                .map(|v| vec![d.name.clone(), render_flag(*v)])
        })
        .collect();
    output_table(&["COVERAGE", "APPLIES"], &rows);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_flags_parse_booleans_and_labels() {
        let facts = parse_fact_flags(&[
            "procurement_type=crown".to_string(),
            "travelling_to_usa = true".to_string(),
        ])
        .unwrap();
        assert_eq!(facts["procurement_type"], FactValue::Label("crown".into()));
        assert_eq!(facts["travelling_to_usa"], FactValue::Bool(true));
    }

    #[test]
    fn fact_flags_require_equals() {
        assert!(parse_fact_flags(&["dtec_used".to_string()]).is_err());
        assert!(parse_fact_flags(&["=true".to_string()]).is_err());
    }

    #[test]
    fn input_accepts_object_or_array() {
        match parse_input(r#"{"dtec_used": true}"#).unwrap() {
            Input::Single(facts) => assert_eq!(facts["dtec_used"], FactValue::Bool(true)),
            other => panic!("expected single input, got {:?}", other),
        }

        match parse_input(r#"[{"procurement_type": "lease"}, {}]"#).unwrap() {
            Input::Batch(many) => {
                assert_eq!(many.len(), 2);
                assert!(many[1].is_empty());
            }
            other => panic!("expected batch input, got {:?}", other),
        }

        assert!(matches!(parse_input("[{}]").unwrap(), Input::Batch(ref b) if b.len() == 1));

        assert!(parse_input("3").is_err());
        assert!(parse_input("[1]").is_err());
    }
}
