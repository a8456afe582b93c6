//! Telemetry pipeline configs: TOML documents where each `[Name]` block is
//! one typed plugin, wired to others by name.

pub mod ast;
pub mod matcher;
pub mod parse;
pub mod plugin;
pub mod resolve;
pub mod serialize;
pub mod types;

pub use plugin::{ParamType, PluginType, SectionKind};
pub use serialize::to_toml;
pub use types::{Link, Param, PipelineConfig, Section, SectionId, SubSection};

use crate::error::SchemaError;

/// Parse, type-check and resolve a pipeline config document.
///
/// # Errors
///
/// Returns the first [`SchemaError`] found; no partial config is returned.
pub fn load(text: &str) -> Result<PipelineConfig, SchemaError> {
    tracing::debug!(bytes = text.len(), "loading pipeline config");
    let raw = parse::parse(text)?;
    resolve::resolve(raw)
}
