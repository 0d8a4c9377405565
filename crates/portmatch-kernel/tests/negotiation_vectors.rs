//! Integration tests: run end-to-end negotiation fixtures.
//!
//! Each fixture in tests/fixtures/ has:
//! - case.json: the base interface, the platform, and consumer overrides
//! - expect.json: the accepted port list or the rejection diagnostic
//!
//! The base interface and platform go through canonicalization, the overrides
//! through merging, and the merged set through negotiation.

use portmatch_kernel::{
    Descriptor, ResolveError, Resolution, offering_set, requirement_set, resolve,
};
use serde_json::{Value, json};
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_json(path: &PathBuf) -> Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()))
}

fn run_case(case: &Value) -> Result<Resolution, ResolveError> {
    let interface = Descriptor::new("afu", "interface.json", case["interface"].clone());
    let platform = Descriptor::new("board", "platform.json", case["platform"].clone());
    let overrides = case["overrides"].as_array().cloned().unwrap_or_default();

    let base = requirement_set(&interface)?;
    let offerings = offering_set(&platform)?;
    resolve(&base, &overrides, "request.json", &offerings)
}

fn summarize(outcome: &Result<Resolution, ResolveError>) -> Value {
    match outcome {
        Ok(resolution) => json!({
            "result": "accepted",
            "matches": resolution
                .matches
                .iter()
                .map(|resolved| json!({
                    "port": resolved.requirement.key().label(),
                    "num-entries": resolved.num_entries,
                }))
                .collect::<Vec<_>>(),
        }),
        Err(err) => json!({
            "result": "rejected",
            "failureClass": err.failure_class(),
            "message": err.to_string(),
        }),
    }
}

fn run_fixture(name: &str) {
    let dir = fixtures_dir().join(name);
    let case = load_json(&dir.join("case.json"));
    let expected = load_json(&dir.join("expect.json"));

    let actual = summarize(&run_case(&case));
    assert_eq!(
        actual,
        expected,
        "\n\nFixture: {name}\n\nGot:\n{}\n\nExpected:\n{}\n",
        serde_json::to_string_pretty(&actual).unwrap(),
        serde_json::to_string_pretty(&expected).unwrap(),
    );
}

#[test]
fn golden_rule_a_requirement_default() {
    run_fixture("rule_a_requirement_default");
}

#[test]
fn golden_rule_b_offering_default() {
    run_fixture("rule_b_offering_default");
}

#[test]
fn golden_optional_port_unmatched() {
    run_fixture("optional_port_unmatched");
}

#[test]
fn golden_legacy_interface_with_extension() {
    run_fixture("legacy_interface_with_extension");
}

#[test]
fn adversarial_scalar_wants_vector_offering() {
    run_fixture("scalar_wants_vector_offering");
}

#[test]
fn adversarial_unauthorized_override() {
    run_fixture("unauthorized_override");
}

#[test]
fn adversarial_clamp_below_offering_floor() {
    run_fixture("clamp_below_offering_floor");
}

#[test]
fn unsatisfied_requirement_diagnostic() {
    let case = json!({
        "interface": {"module-ports": [{"class": "hssi", "interface": "raw_pr"}]},
        "platform": {"module-ports-offered": [{"class": "clocks", "interface": "pClk"}]},
        "overrides": []
    });
    let err = run_case(&case).expect_err("hssi is not offered");
    insta::assert_snapshot!(err.to_string(), @"afu needs port hssi:raw_pr that board doesn't offer");
}

#[test]
fn requirement_shortfall_diagnostic() {
    let case = json!({
        "interface": {"module-ports": [
            {"class": "local-memory", "interface": "avalon_mm", "vector": true, "min-entries": 4}
        ]},
        "platform": {"module-ports-offered": [
            {"class": "local-memory", "interface": "avalon_mm", "vector": true, "max-entries": 2}
        ]},
        "overrides": []
    });
    let err = run_case(&case).expect_err("platform offers only two banks");
    insta::assert_snapshot!(
        err.to_string(),
        @"afu port local-memory:avalon_mm requires more vector entries than board (resolved 2, minimum 4)"
    );
}

#[test]
fn missing_interface_on_extension_diagnostic() {
    let case = json!({
        "interface": {"module-ports": [{"class": "clocks", "interface": "pClk"}]},
        "platform": {"module-ports-offered": [{"class": "clocks", "interface": "pClk"}]},
        "overrides": [{"class": "power", "optional": true}]
    });
    let err = run_case(&case).expect_err("extension lacks interface");
    insta::assert_snapshot!(err.to_string(), @"module port power is missing 'interface' in request.json");
}

#[test]
fn resolution_report_shape() {
    let case = json!({
        "interface": {"module-ports": [
            {"class": "clocks", "interface": "pClk"},
            {"class": "local-memory", "interface": "avalon_mm", "vector": true, "params": {"width": 512}}
        ]},
        "platform": {"module-ports-offered": [
            {"class": "clocks", "interface": "pClk"},
            {"class": "local-memory", "interface": "avalon_mm", "vector": true, "max-entries": 2}
        ]},
        "overrides": []
    });
    let resolution = run_case(&case).expect("case should resolve");
    insta::assert_json_snapshot!(resolution.matches[1], @r###"
    {
      "requirement": {
        "class": "local-memory",
        "interface": "avalon_mm",
        "vector": true,
        "optional": false,
        "min-entries": 1,
        "params": {
          "width": 512
        }
      },
      "offering": {
        "class": "local-memory",
        "interface": "avalon_mm",
        "vector": true,
        "optional": false,
        "min-entries": 1,
        "max-entries": 2,
        "params": {}
      },
      "num-entries": 2
    }
    "###);
}
