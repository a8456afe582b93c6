use std::collections::BTreeMap;

use serde::Serialize;

use crate::pipeline::ast::Value;
use crate::pipeline::plugin::{PluginType, SectionKind};

/// Handle to a section inside its [`PipelineConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SectionId(pub usize);

/// A `key = value` parameter, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub key: String,
    pub value: Value,
}

/// A resolved reference from one section to another.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    /// The parameter that holds the reference, e.g. `decoder`.
    pub key: String,
    pub target: String,
    #[serde(skip)]
    pub id: SectionId,
}

/// A `[Parent.group]` or `[Parent.group.name]` block owned by its parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubSection {
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub params: Vec<Param>,
}

impl SubSection {
    /// The header path below the parent: `Metric.child`.
    pub fn qualified_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{}.{name}", self.group),
            None => self.group.clone(),
        }
    }
}

/// One named, typed pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    pub plugin: PluginType,
    pub kind: SectionKind,
    /// All parameters except `type`.
    pub params: Vec<Param>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_sections: Vec<SubSection>,
}

impl Section {
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.iter().find(|p| p.key == key).map(|p| &p.value)
    }

    /// The single section linked through `key`, if any.
    pub fn link(&self, key: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.key == key)
    }

    /// Sub-sections of one group, e.g. every `[Self.Metric.*]`.
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a SubSection> + 'a {
        self.sub_sections.iter().filter(move |s| s.group == group)
    }
}

/// A validated, fully resolved pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    /// Sections in document order.
    pub sections: Vec<Section>,
    #[serde(skip)]
    pub(crate) index: BTreeMap<String, SectionId>,
}

impl PipelineConfig {
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.index.get(name).map(|&id| &self.sections[id.0])
    }

    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id.0]
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn of_kind(&self, kind: SectionKind) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }
}
