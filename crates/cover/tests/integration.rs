//! End-to-end CLI integration tests for the `cover` binary.
//!
//! Each test runs in its own temporary directory and exercises the binary as
//! a subprocess via `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` for the `cover` binary, isolated from the caller's
/// environment and running in `dir`.
fn cover(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cover").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("COVER_DIR")
        .env_remove("COVER_JSON")
        .env_remove("COVER_RULES")
        .env_remove("COVER_UNKNOWN_FACTS");
    cmd
}

/// Run `cover --json` with `args` and parse stdout.
fn json(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = cover(dir).arg("--json").args(args).output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

const CYCLIC_TABLE: &str = r#"
name = "loop"

[[facts]]
name = "flag"
kind = { type = "bool" }
default = false

[[derived]]
name = "a"
formula = { any = [{ var = "flag" }, { var = "b" }] }

[[derived]]
name = "b"
formula = { var = "a" }
"#;

const TRIP_TABLE: &str = r#"
name = "trip"

[[facts]]
name = "abroad"
kind = { type = "bool" }
default = false

[[facts]]
name = "insured"
kind = { type = "bool" }

[[derived]]
name = "covered_abroad"
formula = { all = [{ var = "abroad" }, { var = "covered" }] }

[[derived]]
name = "covered"
formula = { var = "insured" }
"#;

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[test]
fn crown_vehicle_at_home_is_insured() {
    let tmp = TempDir::new().unwrap();
    let out = json(
        &tmp,
        &["evaluate", "-f", "procurement_type=crown", "-f", "travelling_to_usa=false"],
    );
    assert_eq!(out["vehicle_is_insured"], true);
    assert_eq!(out["collision_damage_waiver"], true);
    assert_eq!(out["public_liability_and_property_damage"], true);
}

#[test]
fn crown_vehicle_in_usa_needs_commercial_insurance() {
    let tmp = TempDir::new().unwrap();
    let out = json(
        &tmp,
        &["evaluate", "-f", "procurement_type=crown", "-f", "travelling_to_usa=true"],
    );
    assert_eq!(out["vehicle_is_insured"], false);

    let out = json(
        &tmp,
        &[
            "evaluate",
            "-f",
            "procurement_type=crown",
            "-f",
            "travelling_to_usa=true",
            "-f",
            "commercial_insurance_purchased=true",
        ],
    );
    assert_eq!(out["vehicle_is_insured"], true);
}

#[test]
fn no_facts_means_nothing_applies() {
    let tmp = TempDir::new().unwrap();
    let out = json(&tmp, &["evaluate"]);
    assert_eq!(out["vehicle_is_insured"], false);
    assert_eq!(out["collision_damage_waiver"], false);
    assert_eq!(out["public_liability_and_property_damage"], false);
}

#[test]
fn human_output_lists_coverages() {
    let tmp = TempDir::new().unwrap();
    cover(&tmp)
        .args(["evaluate", "--fact", "procurement_type=private", "--fact", "basic_insurance_coverage=true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("COVERAGE"))
        .stdout(predicate::str::contains("vehicle_is_insured"))
        .stdout(predicate::str::contains("yes"));
}

#[test]
fn trace_shows_resolved_defaults() {
    let tmp = TempDir::new().unwrap();
    let out = json(&tmp, &["evaluate", "--trace", "-f", "dtec_used=true"]);
    assert_eq!(out["outputs"]["collision_damage_waiver"], true);
    assert_eq!(out["facts"]["procurement_type"], "none");
    assert_eq!(out["facts"]["dtec_used"], true);
}

#[test]
fn batch_input_file() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("fleet.json"),
        r#"[
            {"procurement_type": "lease"},
            {"procurement_type": "private", "personal_card_used": true},
            {"procurement_type": "crown", "travelling_to_usa": true}
        ]"#,
    )
    .unwrap();

    let out = json(&tmp, &["evaluate", "--input", "fleet.json"]);
    let results = out.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["index"], 0);
    assert_eq!(results[0]["outputs"]["vehicle_is_insured"], true);
    assert_eq!(results[1]["outputs"]["vehicle_is_insured"], false);
    assert_eq!(results[2]["outputs"]["vehicle_is_insured"], false);
    assert_eq!(results[2]["outputs"]["collision_damage_waiver"], true);
}

#[test]
fn batch_reports_failures_per_vehicle() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join("fleet.json"),
        r#"[{"procurement_type": "crown"}, {"procurement_type": "owned"}]"#,
    )
    .unwrap();

    let output = cover(&tmp)
        .args(["--json", "evaluate", "-i", "fleet.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let results: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(results[0]["outputs"]["vehicle_is_insured"], true);
    assert!(results[1]["error"].as_str().unwrap().contains("procurement_type"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("1 of 2"));
}

#[test]
fn unknown_fact_is_rejected_unless_ignored() {
    let tmp = TempDir::new().unwrap();
    cover(&tmp)
        .args(["evaluate", "-f", "colour=red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown fact: colour"));

    let out = json(&tmp, &["evaluate", "-f", "colour=red", "--ignore-unknown"]);
    assert_eq!(out["vehicle_is_insured"], false);
}

#[test]
fn wrong_kind_is_rejected() {
    let tmp = TempDir::new().unwrap();
    cover(&tmp)
        .args(["evaluate", "-f", "dtec_used=crown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dtec_used"));
}

#[test]
fn json_errors_go_to_stderr() {
    let tmp = TempDir::new().unwrap();
    let output = cover(&tmp)
        .args(["--json", "evaluate", "-f", "procurement_type=owned"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert!(err["error"].as_str().unwrap().contains("procurement_type"));
}

// ---------------------------------------------------------------------------
// Custom rule tables
// ---------------------------------------------------------------------------

#[test]
fn custom_table_via_rules_flag() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("trip.rules.toml"), TRIP_TABLE).unwrap();

    let out = json(
        &tmp,
        &["--rules", "trip", "evaluate", "-f", "insured=true", "-f", "abroad=true"],
    );
    assert_eq!(out["covered"], true);
    assert_eq!(out["covered_abroad"], true);

    cover(&tmp)
        .args(["--rules", "trip", "evaluate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required fact: insured"));
}

#[test]
fn schema_lists_evaluation_order() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("trip.rules.toml"), TRIP_TABLE).unwrap();

    let out = json(&tmp, &["--rules", "trip", "schema"]);
    let order: Vec<&str> = out["derived"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["covered", "covered_abroad"]);
    assert_eq!(out["derived"][1]["depends_on"], serde_json::json!(["covered"]));

    cover(&tmp)
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("procurement_type"))
        .stdout(predicate::str::contains("crown (Crown), lease (Lease), private (Private), none"));
}

#[test]
fn check_accepts_valid_and_rejects_cyclic_tables() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("trip.rules.toml"), TRIP_TABLE).unwrap();
    std::fs::write(tmp.path().join("loop.rules.toml"), CYCLIC_TABLE).unwrap();

    let out = json(&tmp, &["check", "trip.rules.toml"]);
    assert_eq!(out["valid"], true);
    assert_eq!(out["derived"], 2);

    cover(&tmp)
        .args(["check", "loop"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("dependency cycle"));
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn configured_default_procurement_type() {
    let tmp = TempDir::new().unwrap();
    cover(&tmp)
        .args(["config", "set", "defaults.procurement_type", "lease"])
        .assert()
        .success();
    assert!(tmp.path().join(".cover/config.yaml").is_file());

    cover(&tmp)
        .args(["config", "get", "defaults.procurement_type"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lease"));

    let out = json(&tmp, &["evaluate"]);
    assert_eq!(out["vehicle_is_insured"], true);
}

#[test]
fn config_rejects_default_outside_domain() {
    let tmp = TempDir::new().unwrap();
    cover(&tmp)
        .args(["config", "set", "defaults.procurement_type", "owned"])
        .assert()
        .failure();
    assert!(!tmp.path().join(".cover/config.yaml").exists());
}

#[test]
fn config_rejects_rule_table_that_cannot_build() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("trip.rules.toml"), TRIP_TABLE).unwrap();
    std::fs::write(tmp.path().join("loop.rules.toml"), CYCLIC_TABLE).unwrap();

    cover(&tmp)
        .args(["config", "set", "rules", "loop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dependency cycle"));

    cover(&tmp)
        .args(["config", "set", "defaults.procurement_type", "lease"])
        .assert()
        .success();

    // The trip table has no procurement_type fact to take the default.
    cover(&tmp)
        .args(["config", "set", "rules", "trip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("procurement_type"));

    let saved = std::fs::read_to_string(tmp.path().join(".cover/config.yaml")).unwrap();
    assert!(!saved.contains("rules:"), "unexpected rules in {}", saved);

    let out = json(&tmp, &["evaluate"]);
    assert_eq!(out["vehicle_is_insured"], true);
}

#[test]
fn config_unknown_facts_ignore() {
    let tmp = TempDir::new().unwrap();
    cover(&tmp)
        .args(["config", "set", "unknown_facts", "ignore"])
        .assert()
        .success();

    let out = json(&tmp, &["evaluate", "-f", "colour=red"]);
    assert_eq!(out["vehicle_is_insured"], false);

    let shown = json(&tmp, &["config", "show"]);
    assert_eq!(shown["unknown_facts"], "ignore");
}

#[test]
fn environment_overrides_config() {
    let tmp = TempDir::new().unwrap();
    let output = cover(&tmp)
        .env("COVER_DEFAULTS__PROCUREMENT_TYPE", "crown")
        .args(["--json", "evaluate"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let out: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(out["vehicle_is_insured"], true);
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

#[test]
fn verbose_logs_to_stderr() {
    let tmp = TempDir::new().unwrap();
    cover(&tmp)
        .args(["-v", "--json", "evaluate"])
        .assert()
        .success()
        .stderr(predicate::str::contains("built schema"));
}

#[test]
fn version_and_completion() {
    let tmp = TempDir::new().unwrap();
    cover(&tmp)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("cover version"));

    cover(&tmp)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cover"));
}
