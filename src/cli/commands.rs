use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::emit::dot::emit_dot;
use crate::emit::yaml::{emit_pipeline_yaml, emit_plan_yaml};
use crate::graph::builder::{PipelineGraph, build};
use crate::pipeline::{self, PipelineConfig, SectionKind, to_toml};
use crate::plan::env::parse_env_entry;
use crate::plan::{self, to_json};
use crate::template::render;

fn read(file: &Path) -> Result<String, String> {
    std::fs::read_to_string(file).map_err(|e| format!("failed to read {}: {e}", file.display()))
}

/// Write `contents` to `output` if given, otherwise hand it back for stdout.
fn write_or_return(contents: String, output: Option<&PathBuf>, what: &str) -> Result<String, String> {
    if let Some(out_path) = output {
        std::fs::write(out_path, &contents)
            .map_err(|e| format!("failed to write {}: {e}", out_path.display()))?;
        Ok(format!("{what} written to {}\n", out_path.display()))
    } else {
        Ok(contents)
    }
}

/// Parse `--var KEY=VALUE` arguments. Later values win.
///
/// # Errors
///
/// Returns an error string for an entry without `=` or with an empty key.
pub fn parse_vars(vars: &[String]) -> Result<BTreeMap<String, String>, String> {
    vars.iter()
        .map(|raw| {
            parse_env_entry(raw, "--var")
                .map(|var| (var.key, var.value))
                .map_err(|e| e.to_string())
        })
        .collect()
}

/// Read a pipeline config, render `$name` placeholders when variables are
/// given, then load it.
fn load_pipeline(file: &Path, vars: &[String]) -> Result<PipelineConfig, String> {
    let mut text = read(file)?;
    if !vars.is_empty() {
        let vars = parse_vars(vars)?;
        text = render(&text, &vars).map_err(|e| format!("{}:{e}", file.display()))?;
    }
    pipeline::load(&text).map_err(|e| format!("{}:{e}", file.display()))
}

fn pipeline_graph(file: &Path, config: &PipelineConfig) -> PipelineGraph {
    let mut pg = build(config);
    if let Some(stem) = file.file_stem() {
        pg.name = stem.to_string_lossy().into_owned();
    }
    pg
}

/// Run `plan validate`: load each plan file and summarize it.
///
/// # Errors
///
/// Returns an error string naming the file for the first file that fails.
pub fn run_plan_validate(files: &[PathBuf]) -> Result<String, String> {
    let mut results = Vec::new();

    for file in files {
        let input = read(file)?;
        let test_plan = plan::load(&input).map_err(|e| format!("{}:{e}", file.display()))?;
        results.push(format!(
            "{}: {} is valid ({} plans, {} steps, {} instances)",
            file.display(),
            test_plan.name,
            test_plan.plans.len(),
            test_plan.step_count(),
            test_plan.instance_total(),
        ));
    }

    Ok(results.join("\n"))
}

/// Run `plan show`: load a plan and print it as normalized JSON or YAML.
///
/// # Errors
///
/// Returns an error string if loading, emitting or writing fails, or if
/// `format` is unknown.
pub fn run_plan_show(file: &Path, format: &str, output: Option<&PathBuf>) -> Result<String, String> {
    let test_plan = plan::load(&read(file)?).map_err(|e| format!("{}:{e}", file.display()))?;

    let rendered = match format {
        "json" => to_json(&test_plan),
        "yaml" => emit_plan_yaml(&test_plan)?,
        other => return Err(format!("unknown format '{other}' (expected: json, yaml)")),
    };
    write_or_return(rendered, output, "plan")
}

/// Run `pipeline validate`: load each config, check its wiring and
/// summarize it.
///
/// Decoders and encoders nothing references are logged as warnings.
///
/// # Errors
///
/// Returns an error string naming the file for the first file that fails
/// to load or whose multi-decoders reference each other in a loop.
pub fn run_pipeline_validate(files: &[PathBuf], vars: &[String]) -> Result<String, String> {
    let mut results = Vec::new();

    for file in files {
        let config = load_pipeline(file, vars)?;
        let pg = pipeline_graph(file, &config);

        if let Some(cycle) = pg.find_cycle() {
            return Err(format!(
                "{}: sections reference each other in a loop: {}",
                file.display(),
                cycle.join(" -> ")
            ));
        }
        for kind in [SectionKind::Decoder, SectionKind::Encoder] {
            for name in pg.unreferenced(kind) {
                tracing::warn!(file = %file.display(), section = name, %kind, "section is never referenced");
            }
        }

        results.push(format!(
            "{}: valid pipeline config ({} sections, {} links)",
            file.display(),
            config.len(),
            pg.graph.edge_count(),
        ));
    }

    Ok(results.join("\n"))
}

/// Run `pipeline show`: load a config and print it as normalized TOML or YAML.
///
/// # Errors
///
/// Returns an error string if loading, emitting or writing fails, or if
/// `format` is unknown.
pub fn run_pipeline_show(
    file: &Path,
    format: &str,
    vars: &[String],
    output: Option<&PathBuf>,
) -> Result<String, String> {
    let config = load_pipeline(file, vars)?;

    let rendered = match format {
        "toml" => to_toml(&config),
        "yaml" => emit_pipeline_yaml(&config)?,
        other => return Err(format!("unknown format '{other}' (expected: toml, yaml)")),
    };
    write_or_return(rendered, output, "config")
}

/// Run `pipeline graph`: load a config and print its wiring as DOT.
///
/// # Errors
///
/// Returns an error string if loading or writing fails.
pub fn run_pipeline_graph(
    file: &Path,
    vars: &[String],
    output: Option<&PathBuf>,
) -> Result<String, String> {
    let config = load_pipeline(file, vars)?;
    let dot = emit_dot(&pipeline_graph(file, &config));
    write_or_return(dot, output, "diagram")
}
