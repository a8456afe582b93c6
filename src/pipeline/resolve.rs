use std::collections::BTreeMap;

use crate::error::SchemaError;
use crate::pipeline::ast::{Entry, RawSection, Value};
use crate::pipeline::matcher;
use crate::pipeline::plugin::{KIND_RESTRICTED, ParamSpec, ParamType, PluginType, SectionKind};
use crate::pipeline::types::{Link, Param, PipelineConfig, Section, SectionId, SubSection};
use crate::util::url::check_url;

/// Turn parsed sections into a validated [`PipelineConfig`].
///
/// Top-level sections are indexed first, so references may point forward.
/// Everything else is checked in document order and the first violation
/// is returned.
///
/// # Errors
///
/// Returns a [`SchemaError`] for unknown plugin types, badly typed or
/// missing parameters, dangling references and orphaned dotted headers.
/// Names are unique by the time sections get here; the document parser
/// reports duplicates.
pub fn resolve(raw: Vec<RawSection>) -> Result<PipelineConfig, SchemaError> {
    let (top, dotted): (Vec<RawSection>, Vec<RawSection>) =
        raw.into_iter().partition(|s| s.path.len() == 1);

    let mut index = BTreeMap::new();
    let mut plugins = Vec::with_capacity(top.len());
    for (i, section) in top.iter().enumerate() {
        index.insert(section.name(), SectionId(i));
        plugins.push(plugin_for(section)?);
    }

    let resolver = Resolver {
        index: &index,
        plugins: &plugins,
    };
    let mut sections = top
        .iter()
        .zip(&plugins)
        .map(|(raw, &plugin)| resolver.section(raw, plugin))
        .collect::<Result<Vec<_>, _>>()?;

    for section in dotted {
        let parent = &section.path[0];
        let Some(&id) = index.get(parent) else {
            return Err(SchemaError::unresolved(
                section.name(),
                parent.clone(),
                "dotted header has no parent section",
            ));
        };
        sections[id.0].sub_sections.push(SubSection {
            group: section.path[1].clone(),
            name: section.path.get(2).cloned(),
            params: section.entries.into_iter().map(param).collect(),
        });
    }

    tracing::debug!(
        sections = sections.len(),
        links = sections.iter().map(|s| s.links.len()).sum::<usize>(),
        "resolved pipeline config"
    );
    Ok(PipelineConfig { sections, index })
}

/// The plugin a section declares with `type`, or names itself after.
fn plugin_for(section: &RawSection) -> Result<PluginType, SchemaError> {
    let name = section.name();
    let Some(entry) = section.entry("type") else {
        return PluginType::from_name(&name).ok_or_else(|| {
            SchemaError::invalid(
                format!("{name}.type"),
                format!("{name:?}"),
                "no type given and the section name is not a known plugin type",
            )
        });
    };
    let Value::String(declared) = &entry.value else {
        return Err(SchemaError::invalid(
            format!("{name}.type"),
            entry.value.to_string(),
            format!("expected a string, found {}", entry.value.type_name()),
        ));
    };
    PluginType::from_name(declared).ok_or_else(|| {
        SchemaError::invalid(
            format!("{name}.type"),
            entry.value.to_string(),
            "unknown plugin type",
        )
    })
}

fn param(entry: Entry) -> Param {
    Param {
        key: entry.key,
        value: entry.value,
    }
}

struct Resolver<'a> {
    index: &'a BTreeMap<String, SectionId>,
    plugins: &'a [PluginType],
}

impl Resolver<'_> {
    fn section(&self, raw: &RawSection, plugin: PluginType) -> Result<Section, SchemaError> {
        let name = raw.name();
        let kind = plugin.kind();
        let mut params = Vec::new();
        let mut links = Vec::new();

        for entry in raw.entries.iter().filter(|e| e.key != "type") {
            let path = format!("{name}.{}", entry.key);
            check_kind_restriction(&path, entry, &name, kind)?;
            if let Some(spec) = plugin.param(&entry.key) {
                check_value(&path, spec.ty, &entry.value)?;
                self.link(&path, &name, spec, &entry.value, &mut links)?;
            }
            params.push(param(entry.clone()));
        }

        if let Some(spec) = plugin
            .params()
            .find(|spec| spec.required && raw.entry(spec.key).is_none())
        {
            return Err(SchemaError::missing(format!("{name}.{}", spec.key)));
        }

        Ok(Section {
            name,
            plugin,
            kind,
            params,
            links,
            sub_sections: Vec::new(),
        })
    }

    /// Resolve the reference(s) held by a typed parameter, if it holds any.
    fn link(
        &self,
        path: &str,
        owner: &str,
        spec: &ParamSpec,
        value: &Value,
        links: &mut Vec<Link>,
    ) -> Result<(), SchemaError> {
        match (spec.ty, value) {
            (ParamType::Reference(expected), Value::String(target)) => {
                let id = self.target(path, owner, target, expected)?;
                links.push(Link {
                    key: spec.key.to_owned(),
                    target: target.clone(),
                    id,
                });
            }
            (ParamType::ReferenceList(expected), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if let Value::String(target) = item {
                        let id = self.target(&format!("{path}[{i}]"), owner, target, expected)?;
                        links.push(Link {
                            key: spec.key.to_owned(),
                            target: target.clone(),
                            id,
                        });
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn target(
        &self,
        path: &str,
        owner: &str,
        target: &str,
        expected: SectionKind,
    ) -> Result<SectionId, SchemaError> {
        if target == owner {
            return Err(SchemaError::unresolved(
                path,
                target,
                "a section cannot reference itself",
            ));
        }
        let Some(&id) = self.index.get(target) else {
            return Err(SchemaError::unresolved(
                path,
                target,
                format!("no {expected} section with that name"),
            ));
        };
        let plugin = self.plugins[id.0];
        if plugin.kind() != expected {
            return Err(SchemaError::unresolved(
                path,
                target,
                format!(
                    "'{target}' is a {plugin} of kind {}, expected kind {expected}",
                    plugin.kind()
                ),
            ));
        }
        Ok(id)
    }
}

fn check_kind_restriction(
    path: &str,
    entry: &Entry,
    section: &str,
    kind: SectionKind,
) -> Result<(), SchemaError> {
    let Some((_, allowed)) = KIND_RESTRICTED.iter().find(|(key, _)| *key == entry.key) else {
        return Ok(());
    };
    if allowed.contains(&kind) {
        return Ok(());
    }
    let allowed: Vec<&str> = allowed.iter().map(|k| k.as_str()).collect();
    Err(SchemaError::invalid(
        path,
        entry.value.to_string(),
        format!(
            "'{}' is only valid on {} sections, {section} is of kind {kind}",
            entry.key,
            allowed.join(" or ")
        ),
    ))
}

fn check_value(path: &str, ty: ParamType, value: &Value) -> Result<(), SchemaError> {
    let invalid = |reason: String| SchemaError::invalid(path, value.to_string(), reason);
    let wrong_type = |expected: &str| invalid(format!("expected {expected}, found {}", value.type_name()));

    match (ty, value) {
        (ParamType::Str | ParamType::Reference(_), Value::String(_)) => Ok(()),
        (ParamType::Path, Value::String(s)) => {
            if s.trim().is_empty() {
                Err(invalid("path is empty".to_owned()))
            } else {
                Ok(())
            }
        }
        (ParamType::Address, Value::String(s)) => check_address(s).map_err(invalid),
        (ParamType::Url, Value::String(s)) => check_url(s).map_err(invalid),
        (ParamType::Matcher, Value::String(s)) => {
            matcher::check(s).map_err(|e| invalid(format!("bad message matcher: {e}")))
        }
        (ParamType::Interval, Value::Integer(n)) => {
            if *n < 0 {
                Err(invalid("interval must not be negative".to_owned()))
            } else {
                Ok(())
            }
        }
        (ParamType::Integer, Value::Integer(_)) | (ParamType::Bool, Value::Bool(_)) => Ok(()),
        (ParamType::StrList | ParamType::ReferenceList(_), Value::Array(items)) => {
            match items.iter().position(|item| !matches!(item, Value::String(_))) {
                Some(i) => Err(invalid(format!(
                    "element {i} is {}, expected a string",
                    items[i].type_name()
                ))),
                None => Ok(()),
            }
        }
        (ParamType::Str | ParamType::Path | ParamType::Matcher | ParamType::Reference(_), _) => {
            Err(wrong_type("a string"))
        }
        (ParamType::Address, _) => Err(wrong_type("a host:port string")),
        (ParamType::Url, _) => Err(wrong_type("a URL string")),
        (ParamType::Interval, _) => Err(wrong_type("whole seconds")),
        (ParamType::Integer, _) => Err(wrong_type("an integer")),
        (ParamType::Bool, _) => Err(wrong_type("a boolean")),
        (ParamType::StrList | ParamType::ReferenceList(_), _) => {
            Err(wrong_type("an array of strings"))
        }
    }
}

/// `host:port`, where the host may be empty (`:8125`) or a bracketed IPv6
/// literal (`[::1]:5565`).
fn check_address(addr: &str) -> Result<(), String> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| "expected host:port".to_owned())?;

    if let Some(inner) = host.strip_prefix('[') {
        if !inner.ends_with(']') || inner.len() < 2 {
            return Err(format!("malformed IPv6 host '{host}'"));
        }
    } else if host.contains(':') {
        return Err("IPv6 hosts must be bracketed, e.g. [::1]:5565".to_owned());
    } else if host.chars().any(char::is_whitespace) {
        return Err("host contains whitespace".to_owned());
    }

    match port.parse::<u16>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("port '{port}' is not a number between 0 and 65535")),
    }
}
