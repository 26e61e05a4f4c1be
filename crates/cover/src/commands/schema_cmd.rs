//! `cover schema` -- describe the selected rule table.

use anyhow::Result;
use serde_json::json;

use cover_rules::Schema;
use cover_rules::vehicles::member_label;

use crate::context::RuntimeContext;
use crate::output::{output_json, output_table, render_bold, render_muted};

/// Execute the `cover schema` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let schema = ctx.schema()?;

    if ctx.json {
        output_json(&to_json(&schema));
        return Ok(());
    }

    println!("{}", render_bold(&format!("Rule table: {}", schema.name())));

    if !schema.domains().is_empty() {
        println!();
        println!("{}", render_bold("Enumerations"));
        for domain in schema.domains() {
            let members: Vec<String> = domain
                .members
                .iter()
                .map(|m| match member_label(&domain.name, m) {
                    Some(label) if label != m.as_str() => format!("{} ({})", m, label),
                    _ => m.clone(),
                })
                .collect();
            println!("  {}: {}", domain.name, members.join(", "));
        }
    }

    println!();
    println!("{}", render_bold("Facts"));
    let rows: Vec<Vec<String>> = schema
        .facts()
        .map(|f| {
            let default = match &f.default {
                Some(v) => v.to_string(),
                None => "(required)".to_string(),
            };
            vec![f.name.clone(), f.kind.to_string(), default, render_muted(&f.label)]
        })
        .collect();
    output_table(&["NAME", "KIND", "DEFAULT", "DESCRIPTION"], &rows);

    println!();
    println!("{}", render_bold("Derived (evaluation order)"));
    let rows: Vec<Vec<String>> = schema
        .evaluation_order()
        .map(|d| {
            let deps = schema
                .dependencies(&d.name)
                .map(|deps| deps.join(", "))
                .unwrap_or_default();
            vec![d.name.clone(), deps, render_muted(&d.label)]
        })
        .collect();
    output_table(&["NAME", "DEPENDS ON", "DESCRIPTION"], &rows);

    Ok(())
}

fn to_json(schema: &Schema) -> serde_json::Value {
    let derived: Vec<serde_json::Value> = schema
        .evaluation_order()
        .map(|d| {
            json!({
                "name": d.name,
                "label": d.label,
                "depends_on": schema.dependencies(&d.name).unwrap_or_default(),
                "formula": d.formula,
            })
        })
        .collect();

    json!({
        "name": schema.name(),
        "domains": schema.domains(),
        "facts": schema.facts().collect::<Vec<_>>(),
        "derived": derived,
    })
}
