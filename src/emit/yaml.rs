use crate::pipeline::PipelineConfig;
use crate::plan::TestPlan;

/// Emit a test plan as YAML.
///
/// # Errors
///
/// Returns an error if YAML serialization fails.
pub fn emit_plan_yaml(plan: &TestPlan) -> Result<String, String> {
    serde_yaml::to_string(plan).map_err(|e| format!("yaml serialization failed: {e}"))
}

/// Emit a resolved pipeline config as YAML.
///
/// # Errors
///
/// Returns an error if YAML serialization fails.
pub fn emit_pipeline_yaml(config: &PipelineConfig) -> Result<String, String> {
    serde_yaml::to_string(config).map_err(|e| format!("yaml serialization failed: {e}"))
}
