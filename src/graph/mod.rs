pub mod builder;

pub use builder::{PipelineGraph, SectionNode, build};
