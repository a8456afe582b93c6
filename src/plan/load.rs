use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::plan::env::{parse_env_block, parse_env_entry};
use crate::plan::mapping::parse_mappings;
use crate::plan::types::{EnvVar, KNOWN_REGIONS, Plan, Step, TestPlan};
use crate::util::url::check_url;
use crate::util::span::Span;

const ROOT_FIELDS: &[&str] = &["name", "description", "plans"];
const PLAN_FIELDS: &[&str] = &["name", "steps"];
const STEP_FIELDS: &[&str] = &[
    "name",
    "instance_count",
    "instance_region",
    "instance_type",
    "run_max_time",
    "run_delay",
    "container_name",
    "container_url",
    "environment_data",
    "additional_command_args",
    "dns_name",
    "port_mapping",
    "volume_mapping",
    "docker_series",
];

/// Parse and validate a test-plan JSON document.
///
/// # Errors
///
/// Returns a [`SchemaError`] describing the first violation found, in
/// document order. No partial plan is ever returned.
pub fn load(text: &str) -> Result<TestPlan, SchemaError> {
    tracing::debug!(bytes = text.len(), "loading test plan");
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| SchemaError::malformed(Span::at(e.line(), e.column()), e.to_string()))?;

    let Value::Object(root) = &doc else {
        return Err(SchemaError::malformed(
            Span::default(),
            format!("expected a JSON object at the root, found {}", type_name(&doc)),
        ));
    };
    let root = Fields {
        obj: root,
        path: String::new(),
    };
    root.reject_unknown(ROOT_FIELDS)?;

    let name = root.required_str("name")?;
    let description = root.optional_str("description")?;

    let mut plans = Vec::new();
    let mut seen = HashSet::new();
    for (i, value) in root.required_array("plans")?.iter().enumerate() {
        let path = format!("plans[{i}]");
        let plan = lower_plan(value, &path)?;
        if !seen.insert(plan.name.clone()) {
            return Err(SchemaError::duplicate(format!("{path}.name"), plan.name));
        }
        plans.push(plan);
    }

    let test_plan = TestPlan {
        name,
        description,
        plans,
    };
    tracing::debug!(
        name = %test_plan.name,
        plans = test_plan.plans.len(),
        steps = test_plan.step_count(),
        "loaded test plan"
    );
    Ok(test_plan)
}

fn lower_plan(value: &Value, path: &str) -> Result<Plan, SchemaError> {
    let fields = Fields::of(value, path)?;
    fields.reject_unknown(PLAN_FIELDS)?;

    let name = fields.required_str("name")?;
    let mut steps = Vec::new();
    let mut seen = HashSet::new();
    for (i, value) in fields.required_array("steps")?.iter().enumerate() {
        let step_path = format!("{path}.steps[{i}]");
        let step = lower_step(value, &step_path)?;
        if !seen.insert(step.name.clone()) {
            return Err(SchemaError::duplicate(format!("{step_path}.name"), step.name));
        }
        steps.push(step);
    }

    Ok(Plan { name, steps })
}

fn lower_step(value: &Value, path: &str) -> Result<Step, SchemaError> {
    let fields = Fields::of(value, path)?;
    fields.reject_unknown(STEP_FIELDS)?;

    let container_url = fields.optional_str("container_url")?;
    if let Some(url) = &container_url {
        check_url(url).map_err(|reason| {
            SchemaError::invalid(fields.child("container_url"), format!("{url:?}"), reason)
        })?;
    }

    let instance_region = fields.optional_str("instance_region")?;
    if let Some(region) = &instance_region
        && !KNOWN_REGIONS.contains(&region.as_str())
    {
        tracing::warn!(path = %fields.child("instance_region"), %region, "unknown instance region");
    }

    let port_mapping = fields
        .optional_str("port_mapping")?
        .map(|raw| parse_mappings(&raw, &fields.child("port_mapping")))
        .transpose()?;
    let volume_mapping = fields
        .optional_str("volume_mapping")?
        .map(|raw| parse_mappings(&raw, &fields.child("volume_mapping")))
        .transpose()?;

    Ok(Step {
        name: fields.required_str("name")?,
        instance_count: fields.optional_count("instance_count")?,
        instance_region,
        instance_type: fields.optional_str("instance_type")?,
        run_max_time: fields.optional_count("run_max_time")?,
        run_delay: fields.optional_count("run_delay")?,
        container_name: fields.required_str("container_name")?,
        container_url,
        environment_data: lower_env(&fields)?,
        additional_command_args: fields.optional_str("additional_command_args")?,
        dns_name: fields.optional_str("dns_name")?,
        port_mapping,
        volume_mapping,
        docker_series: fields.optional_str("docker_series")?,
    })
}

/// `environment_data` is either a list of entries or one newline-separated string.
fn lower_env(fields: &Fields<'_>) -> Result<Vec<EnvVar>, SchemaError> {
    let path = fields.child("environment_data");
    match fields.get("environment_data") {
        None => Ok(Vec::new()),
        Some(Value::String(block)) => parse_env_block(block, &path),
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let entry_path = format!("{path}[{i}]");
                match entry {
                    Value::String(s) => parse_env_entry(s, &entry_path),
                    other => Err(SchemaError::invalid(
                        entry_path,
                        other.to_string(),
                        format!("expected a string, found {}", type_name(other)),
                    )),
                }
            })
            .collect(),
        Some(other) => Err(SchemaError::invalid(
            path,
            other.to_string(),
            format!("expected a list of strings, found {}", type_name(other)),
        )),
    }
}

/// A JSON object being lowered, with the field path used in errors.
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    path: String,
}

impl<'a> Fields<'a> {
    fn of(value: &'a Value, path: &str) -> Result<Self, SchemaError> {
        match value {
            Value::Object(obj) => Ok(Self {
                obj,
                path: path.to_owned(),
            }),
            other => Err(SchemaError::invalid(
                path,
                other.to_string(),
                format!("expected an object, found {}", type_name(other)),
            )),
        }
    }

    fn child(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_owned()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    /// `null` reads as absent.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).filter(|v| !v.is_null())
    }

    fn reject_unknown(&self, known: &[&str]) -> Result<(), SchemaError> {
        match self.obj.keys().find(|k| !known.contains(&k.as_str())) {
            Some(key) => Err(SchemaError::invalid(
                self.child(key),
                self.obj[key].to_string(),
                "unknown field",
            )),
            None => Ok(()),
        }
    }

    fn optional_str(&self, key: &str) -> Result<Option<String>, SchemaError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(SchemaError::invalid(
                self.child(key),
                other.to_string(),
                format!("expected a string, found {}", type_name(other)),
            )),
        }
    }

    fn required_str(&self, key: &str) -> Result<String, SchemaError> {
        let value = self
            .optional_str(key)?
            .ok_or_else(|| SchemaError::missing(self.child(key)))?;
        if value.trim().is_empty() {
            return Err(SchemaError::invalid(
                self.child(key),
                format!("{value:?}"),
                "must not be empty",
            ));
        }
        Ok(value)
    }

    /// A non-negative integer; absence stays `None`, never zero.
    fn optional_count(&self, key: &str) -> Result<Option<u64>, SchemaError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| {
                SchemaError::invalid(self.child(key), v.to_string(), "expected a non-negative integer")
            }),
        }
    }

    fn required_array(&self, key: &str) -> Result<&'a Vec<Value>, SchemaError> {
        match self.get(key) {
            None => Err(SchemaError::missing(self.child(key))),
            Some(Value::Array(items)) if items.is_empty() => Err(SchemaError::invalid(
                self.child(key),
                "[]",
                "must contain at least one entry",
            )),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(SchemaError::invalid(
                self.child(key),
                other.to_string(),
                format!("expected a list, found {}", type_name(other)),
            )),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
