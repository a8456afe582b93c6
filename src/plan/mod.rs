//! Load-test plan documents: JSON in, validated [`TestPlan`] out.

pub mod env;
pub mod load;
pub mod mapping;
pub mod serialize;
pub mod types;

pub use load::load;
pub use serialize::to_json;
pub use types::{EnvVar, Mapping, Plan, Step, TestPlan};
