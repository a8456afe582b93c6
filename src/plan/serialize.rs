use serde_json::{Map, Value, json};

use crate::plan::mapping::format_mappings;
use crate::plan::types::{Step, TestPlan};

/// Serialize a validated plan back into its JSON document form.
///
/// Mappings are re-joined into their comma-separated strings and
/// environment entries into `KEY=VALUE` strings, so the output loads
/// back into an equal [`TestPlan`].
pub fn to_json(plan: &TestPlan) -> String {
    let mut root = Map::new();
    root.insert("name".into(), json!(plan.name));
    if let Some(desc) = &plan.description {
        root.insert("description".into(), json!(desc));
    }
    let plans: Vec<Value> = plan
        .plans
        .iter()
        .map(|p| {
            json!({
                "name": p.name,
                "steps": p.steps.iter().map(step_to_value).collect::<Vec<_>>(),
            })
        })
        .collect();
    root.insert("plans".into(), Value::Array(plans));

    // A map of strings, numbers and arrays always serializes.
    serde_json::to_string_pretty(&Value::Object(root)).unwrap_or_default() + "\n"
}

fn step_to_value(step: &Step) -> Value {
    let mut obj = Map::new();
    obj.insert("name".into(), json!(step.name));

    let counts = [
        ("instance_count", step.instance_count),
        ("run_max_time", step.run_max_time),
        ("run_delay", step.run_delay),
    ];
    for (key, value) in counts {
        if let Some(v) = value {
            obj.insert(key.into(), json!(v));
        }
    }

    obj.insert("container_name".into(), json!(step.container_name));

    let strings = [
        ("instance_region", &step.instance_region),
        ("instance_type", &step.instance_type),
        ("container_url", &step.container_url),
        ("additional_command_args", &step.additional_command_args),
        ("dns_name", &step.dns_name),
        ("docker_series", &step.docker_series),
    ];
    for (key, value) in strings {
        if let Some(v) = value {
            obj.insert(key.into(), json!(v));
        }
    }

    if !step.environment_data.is_empty() {
        let entries: Vec<String> = step
            .environment_data
            .iter()
            .map(|e| format!("{}={}", e.key, e.value))
            .collect();
        obj.insert("environment_data".into(), json!(entries));
    }
    if let Some(ports) = &step.port_mapping {
        obj.insert("port_mapping".into(), json!(format_mappings(ports)));
    }
    if let Some(volumes) = &step.volume_mapping {
        obj.insert("volume_mapping".into(), json!(format_mappings(volumes)));
    }

    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::load::load;

    const DOC: &str = r#"{
        "name": "Autopush Load",
        "description": "Servers plus testers",
        "plans": [
            {
                "name": "Baseline",
                "steps": [
                    {
                        "name": "Autopush Servers",
                        "instance_count": 1,
                        "instance_region": "us-west-2",
                        "instance_type": "m3.medium",
                        "run_max_time": 300,
                        "container_name": "bbangert/autopush:1.4.1",
                        "container_url": "https://s3.amazonaws.com/loads-docker-images/autopush-1.4.1.tar.bz2",
                        "environment_data": ["ROUTER_PORT=8081", "ENDPOINT_PORT=8082", "EMPTY="],
                        "port_mapping": "8080:8090,8081:8081,3000:3000",
                        "volume_mapping": "/var/log:/var/log/$RUN_ID:rw",
                        "docker_series": "autopush"
                    },
                    {
                        "name": "Push Testers",
                        "instance_count": 0,
                        "run_delay": 60,
                        "container_name": "bbangert/pushgo:1.5rc4",
                        "environment_data": "PUSH_SERVER=ws://$SERVER_IP:8080/\nCONNECTIONS=5000"
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn round_trip_yields_equal_plan() {
        let first = load(DOC).expect("load failed");
        let second = load(&to_json(&first)).expect("reload failed");
        assert_eq!(first, second);
    }

    #[test]
    fn serializes_mappings_as_strings() {
        let plan = load(DOC).expect("load failed");
        let out = to_json(&plan);
        assert!(out.contains("\"port_mapping\": \"8080:8090,8081:8081,3000:3000\""), "got: {out}");
    }

    #[test]
    fn newline_environment_becomes_list() {
        let plan = load(DOC).expect("load failed");
        let out = to_json(&plan);
        assert!(out.contains("\"CONNECTIONS=5000\""), "got: {out}");
    }

    #[test]
    fn absent_fields_are_omitted() {
        let plan = load(DOC).expect("load failed");
        let out = to_json(&plan);
        assert!(!out.contains("dns_name"));
        assert!(!out.contains("null"));
    }
}
