//! Loaders and validators for load-test plans and telemetry pipeline configs.
//!
//! [`plan::load`] turns a JSON test plan into a [`plan::TestPlan`];
//! [`pipeline::load`] turns a sectioned TOML config into a resolved
//! [`pipeline::PipelineConfig`]. Both are pure functions that either return
//! a fully validated value or the first [`error::SchemaError`] found.

pub mod cli;
pub mod emit;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod plan;
pub mod template;
pub mod util;
