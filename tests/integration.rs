use std::path::PathBuf;

use loadsconf::cli::commands::{
    run_pipeline_graph, run_pipeline_show, run_pipeline_validate, run_plan_show,
    run_plan_validate,
};
use loadsconf::error::SchemaError;
use loadsconf::pipeline::{self, PluginType, SectionKind};
use loadsconf::plan;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).expect("should read fixture")
}

fn heka_vars() -> Vec<String> {
    [
        "remote_addr=10.0.0.5:5565",
        "remote_secure=true",
        "influx_addr=influxdb:8086",
        "influx_db=loads_run_42",
        "hostname=pushtests.10_0_1_17",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// ── Plan loading ─────────────────────────────────────────────

#[test]
fn plan_fixture_loads_in_order() {
    let test_plan = plan::load(&read_fixture("push_test.json")).expect("load failed");
    assert_eq!(test_plan.name, "Autopush Load Test");
    let names: Vec<&str> = test_plan.plans.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Baseline", "Spike"]);
    assert_eq!(test_plan.step_count(), 3);

    let servers = &test_plan.plans[0].steps[0];
    let ports = servers.port_mapping.as_ref().expect("port mapping");
    assert_eq!(ports.len(), 3);
    assert_eq!((ports[0].host.as_str(), ports[0].container.as_str()), ("8080", "8090"));
    let volumes = servers.volume_mapping.as_ref().expect("volume mapping");
    assert_eq!(volumes[0].mode.as_deref(), Some("rw"));
    assert!(!volumes[0].is_read_only());
    assert_eq!(servers.environment_data.last().map(|e| e.value.as_str()), Some(""));
}

#[test]
fn plan_string_environment_is_split_per_line() {
    let test_plan = plan::load(&read_fixture("push_test.json")).expect("load failed");
    let testers = &test_plan.plans[0].steps[1];
    let keys: Vec<&str> = testers
        .environment_data
        .iter()
        .map(|e| e.key.as_str())
        .collect();
    assert_eq!(keys, vec!["PUSH_SERVER", "CONNECTIONS"]);
    assert_eq!(testers.environment_data[0].value, "ws://$SERVER_IP:8080/");
}

#[test]
fn plan_defaults_are_not_substituted() {
    let test_plan = plan::load(&read_fixture("push_test.json")).expect("load failed");
    let spike = &test_plan.plans[1].steps[0];
    assert_eq!(spike.instance_region, None);
    assert_eq!(spike.instance_region_or_default(), "us-west-2");
    assert_eq!(spike.run_max_time_or_default(), 600);
}

#[test]
fn plan_round_trips_through_json() {
    let first = plan::load(&read_fixture("push_test.json")).expect("load failed");
    let second = plan::load(&plan::to_json(&first)).expect("reload failed");
    assert_eq!(first, second);
}

#[test]
fn plan_same_step_name_in_different_plans_is_fine() {
    let test_plan = plan::load(&read_fixture("push_test.json")).expect("load failed");
    assert_eq!(test_plan.plans[0].steps[1].name, test_plan.plans[1].steps[0].name);
}

// ── Plan commands ────────────────────────────────────────────

#[test]
fn cli_plan_validate_summarizes_file() {
    let output = run_plan_validate(&[fixture("push_test.json")]).expect("validate should succeed");
    assert!(output.contains("Autopush Load Test is valid"), "got: {output}");
    assert!(output.contains("(2 plans, 3 steps, 25 instances)"), "got: {output}");
}

#[test]
fn cli_plan_validate_reports_bad_mapping_with_path() {
    let err = run_plan_validate(&[fixture("invalid_port_mapping.json")]).unwrap_err();
    assert!(err.contains("invalid_port_mapping.json:"), "got: {err}");
    assert!(err.contains("plans[0].steps[0].port_mapping"), "got: {err}");
    assert!(err.contains("\"8080:\""), "got: {err}");
}

#[test]
fn cli_plan_validate_reports_duplicate_step() {
    let err = run_plan_validate(&[fixture("duplicate_steps.json")]).unwrap_err();
    assert!(err.contains("plans[0].steps[1].name"), "got: {err}");
    assert!(err.contains("duplicate name 'Testers'"), "got: {err}");
}

#[test]
fn cli_plan_validate_reports_truncated_json() {
    let err = run_plan_validate(&[fixture("truncated.json")]).unwrap_err();
    assert!(err.contains("malformed document"), "got: {err}");
}

#[test]
fn cli_plan_validate_stops_at_first_bad_file() {
    let err = run_plan_validate(&[fixture("push_test.json"), fixture("duplicate_steps.json")])
        .unwrap_err();
    assert!(err.contains("duplicate_steps.json"), "got: {err}");
}

#[test]
fn cli_plan_show_yaml() {
    let yaml = run_plan_show(&fixture("push_test.json"), "yaml", None).expect("show should succeed");
    assert!(yaml.contains("name: Autopush Load Test"), "got: {yaml}");
    assert!(yaml.contains("docker_series: autopush"), "got: {yaml}");
}

#[test]
fn cli_plan_show_json_writes_output_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("plan.json");
    let msg = run_plan_show(&fixture("push_test.json"), "json", Some(&out))
        .expect("show should succeed");
    assert!(msg.contains("plan written to"), "got: {msg}");
    let written = std::fs::read_to_string(&out).expect("should read output file");
    let reloaded = plan::load(&written).expect("written plan should load");
    assert_eq!(reloaded.step_count(), 3);
}

#[test]
fn cli_plan_show_rejects_unknown_format() {
    let err = run_plan_show(&fixture("push_test.json"), "xml", None).unwrap_err();
    assert!(err.contains("unknown format 'xml'"), "got: {err}");
}

// ── Pipeline loading ─────────────────────────────────────────

#[test]
fn pipeline_fixture_loads() {
    let config = pipeline::load(&read_fixture("heka.toml")).expect("load failed");
    assert_eq!(config.len(), 10);
    assert_eq!(
        config.get("MemStats").map(|s| s.plugin),
        Some(PluginType::FilePollingInput)
    );
    assert_eq!(
        config.get("StatAccumInput").map(|s| s.kind),
        Some(SectionKind::Accumulator)
    );
    let cpu = config.get("CpuStats").expect("CpuStats");
    assert_eq!(cpu.sub_sections.len(), 2);
    assert_eq!(cpu.group("Metric").count(), 1);
}

#[test]
fn pipeline_commented_output_is_absent() {
    let config = pipeline::load(&read_fixture("heka.toml")).expect("load failed");
    assert!(config.get("InfluxOutput").is_none());
    assert_eq!(config.of_kind(SectionKind::Output).count(), 2);
}

#[test]
fn pipeline_round_trips_through_toml() {
    let first = pipeline::load(&read_fixture("heka.toml")).expect("load failed");
    let second = pipeline::load(&pipeline::to_toml(&first)).expect("reload failed");
    assert_eq!(first, second);
}

#[test]
fn pipeline_unresolved_decoder() {
    let err = pipeline::load(&read_fixture("unresolved_decoder.toml")).unwrap_err();
    assert!(
        matches!(&err, SchemaError::UnresolvedReference { name, .. } if name == "Missing"),
        "got: {err:?}"
    );
    assert_eq!(err.path(), Some("MemStats.decoder"));
}

#[test]
fn pipeline_duplicate_section() {
    let err = pipeline::load(&read_fixture("duplicate_section.toml")).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateName { .. }), "got: {err:?}");
}

// ── Pipeline commands ────────────────────────────────────────

#[test]
fn cli_pipeline_validate_summarizes_file() {
    let output = run_pipeline_validate(&[fixture("heka.toml")], &[]).expect("validate should succeed");
    assert!(output.contains("valid pipeline config (10 sections, 4 links)"), "got: {output}");
}

#[test]
fn cli_pipeline_validate_reports_syntax_error_location() {
    let err = run_pipeline_validate(&[fixture("bad_syntax.toml")], &[]).unwrap_err();
    assert!(err.contains("bad_syntax.toml:2:"), "got: {err}");
}

#[test]
fn cli_pipeline_validate_rejects_decoder_loop() {
    let err = run_pipeline_validate(&[fixture("decoder_cycle.toml")], &[]).unwrap_err();
    assert!(err.contains("loop: Outer -> Inner"), "got: {err}");
}

#[test]
fn cli_pipeline_validate_renders_template() {
    let output = run_pipeline_validate(&[fixture("heka.src.toml")], &heka_vars())
        .expect("validate should succeed");
    assert!(output.contains("5 sections, 2 links"), "got: {output}");
}

#[test]
fn cli_pipeline_template_without_vars_fails() {
    let err = run_pipeline_validate(&[fixture("heka.src.toml")], &[]).unwrap_err();
    assert!(err.contains("heka.src.toml:"), "got: {err}");
}

#[test]
fn cli_pipeline_template_missing_var_names_line() {
    let mut vars = heka_vars();
    vars.retain(|v| !v.starts_with("influx_db="));
    let err = run_pipeline_validate(&[fixture("heka.src.toml")], &vars).unwrap_err();
    assert!(err.contains("'influx_db'"), "got: {err}");
    assert!(err.contains("line 25"), "got: {err}");
}

#[test]
fn cli_pipeline_show_renders_values() {
    let toml = run_pipeline_show(&fixture("heka.src.toml"), "toml", &heka_vars(), None)
        .expect("show should succeed");
    assert!(toml.contains("use_tls = true"), "got: {toml}");
    assert!(toml.contains("message_matcher = \"Type =~ /statmetric$/\""), "got: {toml}");
    assert!(
        toml.contains("address = \"http://influxdb:8086/write?db=loads_run_42\""),
        "got: {toml}"
    );
    assert!(toml.contains("global_prefix = \"pushtests.10_0_1_17\""), "got: {toml}");
}

#[test]
fn cli_pipeline_show_yaml() {
    let yaml = run_pipeline_show(&fixture("heka.toml"), "yaml", &[], None).expect("show should succeed");
    assert!(yaml.contains("name: MemStatsDecoder"), "got: {yaml}");
    assert!(yaml.contains("plugin: SandboxDecoder"), "got: {yaml}");
}

#[test]
fn cli_pipeline_graph_emits_dot() {
    let dot = run_pipeline_graph(&fixture("heka.toml"), &[], None).expect("graph should succeed");
    assert!(dot.starts_with("digraph \"heka\" {"), "got: {dot}");
    assert!(dot.contains("\"MemStats\" -> \"MemStatsDecoder\" [label=\"decoder\"];"), "got: {dot}");
    assert!(dot.contains("\"StatsdInput\" -> \"StatAccumInput\" [label=\"stat_accum_name\"];"), "got: {dot}");
}

#[test]
fn cli_pipeline_graph_writes_output_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("heka.dot");
    let msg = run_pipeline_graph(&fixture("heka.toml"), &[], Some(&out)).expect("graph should succeed");
    assert!(msg.contains("diagram written to"), "got: {msg}");
    let contents = std::fs::read_to_string(&out).expect("should read output file");
    assert!(contents.ends_with("}\n"));
}

#[test]
fn cli_pipeline_graph_escapes_file_stem() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("load \"run\".toml");
    std::fs::write(&file, read_fixture("heka.toml")).expect("should write config");
    let dot = run_pipeline_graph(&file, &[], None).expect("graph should succeed");
    assert!(dot.starts_with("digraph \"load \\\"run\\\"\" {\n"), "got: {dot}");
}

#[test]
fn cli_pipeline_accepts_full_toml_syntax() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("quoted.toml");
    std::fs::write(
        &file,
        r#"["Mem Stats"]
type = "FilePollingInput"
ticker_interval = 0x1
file_path = '''
/proc/meminfo'''
tags = { host = "caf\u00e9" }
"#,
    )
    .expect("should write config");
    let output = run_pipeline_validate(&[file.clone()], &[]).expect("validate should succeed");
    assert!(output.contains("valid pipeline config (1 sections, 0 links)"), "got: {output}");
    let toml = run_pipeline_show(&file, "toml", &[], None).expect("show should succeed");
    assert!(toml.starts_with("[\"Mem Stats\"]\n"), "got: {toml}");
}

#[test]
fn cli_pipeline_rejects_malformed_var() {
    let err = run_pipeline_validate(&[fixture("heka.src.toml")], &["remote_addr".into()]).unwrap_err();
    assert!(err.contains("--var"), "got: {err}");
}
