use serde::Serialize;

/// Orchestrator defaults for fields a step leaves unspecified.
pub const DEFAULT_INSTANCE_COUNT: u64 = 1;
pub const DEFAULT_INSTANCE_REGION: &str = "us-west-2";
pub const DEFAULT_INSTANCE_TYPE: &str = "t1.micro";
pub const DEFAULT_RUN_MAX_TIME: u64 = 600;
pub const DEFAULT_RUN_DELAY: u64 = 0;

/// Regions the orchestrator knows how to provision in.
pub const KNOWN_REGIONS: &[&str] = &[
    "ap-northeast-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "eu-west-1",
    "sa-east-1",
    "us-east-1",
    "us-west-1",
    "us-west-2",
];

/// A validated load-test plan document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestPlan {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Plans in execution order.
    pub plans: Vec<Plan>,
}

/// One phase of a load test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub name: String,
    pub steps: Vec<Step>,
}

/// A single instance-group specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_max_time: Option<u64>,
    /// Seconds after the run starts before this step launches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_delay: Option<u64>,
    pub container_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment_data: Vec<EnvVar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_command_args: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_mapping: Option<Vec<Mapping>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_mapping: Option<Vec<Mapping>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_series: Option<String>,
}

impl Step {
    pub fn instance_count_or_default(&self) -> u64 {
        self.instance_count.unwrap_or(DEFAULT_INSTANCE_COUNT)
    }

    pub fn instance_region_or_default(&self) -> &str {
        self.instance_region
            .as_deref()
            .unwrap_or(DEFAULT_INSTANCE_REGION)
    }

    pub fn instance_type_or_default(&self) -> &str {
        self.instance_type.as_deref().unwrap_or(DEFAULT_INSTANCE_TYPE)
    }

    pub fn run_max_time_or_default(&self) -> u64 {
        self.run_max_time.unwrap_or(DEFAULT_RUN_MAX_TIME)
    }

    pub fn run_delay_or_default(&self) -> u64 {
        self.run_delay.unwrap_or(DEFAULT_RUN_DELAY)
    }
}

/// One `KEY=VALUE` environment entry. Keys may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// One `host:container[:mode]` entry of a port or volume mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub host: String,
    pub container: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Mapping {
    /// Volume semantics: read-only unless the mode says otherwise.
    pub fn is_read_only(&self) -> bool {
        self.mode.as_deref().is_none_or(|m| m == "ro")
    }
}

impl std::fmt::Display for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.container)?;
        if let Some(mode) = &self.mode {
            write!(f, ":{mode}")?;
        }
        Ok(())
    }
}

impl TestPlan {
    /// Total steps across all plans.
    pub fn step_count(&self) -> usize {
        self.plans.iter().map(|p| p.steps.len()).sum()
    }

    /// Total instances requested, counting unspecified counts at the default.
    pub fn instance_total(&self) -> u64 {
        self.plans
            .iter()
            .flat_map(|p| p.steps.iter())
            .map(Step::instance_count_or_default)
            .sum()
    }
}
