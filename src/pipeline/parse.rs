use std::ops::Range;

use toml_edit::{ImDocument, Item, Table, TomlError};

use crate::error::SchemaError;
use crate::pipeline::ast::{Entry, RawSection, Value};
use crate::util::span::Span;

/// Headers may nest at most `Parent.group.name`.
const MAX_HEADER_SEGMENTS: usize = 3;

/// Parse a pipeline config document into raw sections, in document order.
///
/// The document is TOML. Every `[Header]` becomes one raw section; tables
/// that only exist because a deeper header implies them are not emitted,
/// so a dotted header with no parent surfaces later as an unresolved
/// reference. Inline tables, dotted keys and arrays of tables inside a
/// section are values of that section.
///
/// # Errors
///
/// Returns [`SchemaError::DuplicateName`] for a repeated header or a key
/// repeated within a section, and [`SchemaError::MalformedDocument`] for
/// any other syntax error, keys outside a section, and headers nested
/// deeper than three segments.
pub fn parse(input: &str) -> Result<Vec<RawSection>, SchemaError> {
    let doc = ImDocument::parse(input).map_err(|e| document_error(input, &e))?;
    let root = doc.as_table();

    let mut sections = Vec::new();
    for (key, item) in root.iter() {
        match item {
            Item::Table(table) if !table.is_dotted() => {
                collect(input, vec![key.to_owned()], table, &mut sections)?;
            }
            Item::ArrayOfTables(_) => {
                return Err(malformed_at(
                    input,
                    key_span(root, key),
                    format!("[[{key}]] is an array of tables, not a section"),
                ));
            }
            _ => {
                return Err(malformed_at(
                    input,
                    key_span(root, key),
                    format!("key '{key}' appears before any [section] header"),
                ));
            }
        }
    }

    sections.sort_by_key(|(position, _)| *position);
    tracing::trace!(sections = sections.len(), "parsed pipeline document");
    Ok(sections.into_iter().map(|(_, section)| section).collect())
}

/// Walk one header table and the headers nested under it.
fn collect(
    input: &str,
    path: Vec<String>,
    table: &Table,
    out: &mut Vec<(usize, RawSection)>,
) -> Result<(), SchemaError> {
    if path.len() > MAX_HEADER_SEGMENTS {
        return Err(malformed_at(
            input,
            header_span(table),
            format!(
                "section header '{}' nests deeper than Parent.group.name",
                path.join(".")
            ),
        ));
    }

    let mut entries = Vec::new();
    for (key, item) in table.iter() {
        match item {
            Item::Table(child) if !child.is_dotted() => {
                let mut child_path = path.clone();
                child_path.push(key.to_owned());
                collect(input, child_path, child, out)?;
            }
            _ => {
                if let Some(value) = item_value(item) {
                    entries.push(Entry {
                        key: key.to_owned(),
                        value,
                    });
                }
            }
        }
    }

    if !table.is_implicit() {
        let position = table.position().unwrap_or(usize::MAX);
        out.push((position, RawSection { path, entries }));
    }
    Ok(())
}

fn item_value(item: &Item) -> Option<Value> {
    match item {
        Item::None => None,
        Item::Value(value) => Some(Value::from_toml(value)),
        Item::Table(table) => Some(table_value(table)),
        Item::ArrayOfTables(tables) => Some(Value::Array(tables.iter().map(table_value).collect())),
    }
}

fn table_value(table: &Table) -> Value {
    Value::Table(
        table
            .iter()
            .filter_map(|(key, item)| Some((key.to_owned(), item_value(item)?)))
            .collect(),
    )
}

fn key_span(table: &Table, key: &str) -> Option<Range<usize>> {
    let (key, item) = table.get_key_value(key)?;
    key.span().or_else(|| item.span())
}

/// The location of a header, or of the first header under an implied table.
fn header_span(table: &Table) -> Option<Range<usize>> {
    table.span().or_else(|| {
        table
            .iter()
            .find_map(|(_, item)| item.as_table().and_then(header_span))
    })
}

fn malformed_at(input: &str, range: Option<Range<usize>>, message: String) -> SchemaError {
    let span = range.map_or_else(Span::default, |r| Span::locate(input, r));
    SchemaError::malformed(span, message)
}

fn document_error(input: &str, err: &TomlError) -> SchemaError {
    let range = err.span().unwrap_or(0..0);
    let message = err.message();
    if let Some(dup) = duplicate(input, message, range.start) {
        return dup;
    }
    let message = message
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(": ");
    SchemaError::malformed(Span::locate(input, range), message)
}

/// Recognize the parser's "duplicate key `k` in table `t`" report.
fn duplicate(input: &str, message: &str, offset: usize) -> Option<SchemaError> {
    const MARKER: &str = "duplicate key `";
    let rest = &message[message.find(MARKER)? + MARKER.len()..];
    let (key, rest) = rest.split_once('`')?;

    if let Some((table, _)) = rest.strip_prefix(" in table `").and_then(|t| t.split_once('`')) {
        return Some(SchemaError::duplicate(format!("{table}.{key}"), key));
    }
    if rest.starts_with(" in document root") {
        return Some(SchemaError::duplicate(key, key));
    }
    match header_at(input, offset) {
        Some(header) => Some(SchemaError::duplicate(header.clone(), header)),
        None => Some(SchemaError::duplicate(key, key)),
    }
}

/// The `[a.b]` header on the line holding `offset`, with spacing removed.
fn header_at(input: &str, offset: usize) -> Option<String> {
    let before = input.get(..offset.min(input.len()))?;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let line = input[line_start..].lines().next()?.trim();
    let inner = line.strip_prefix('[')?.split(']').next()?;
    Some(inner.split('.').map(str::trim).collect::<Vec<_>>().join("."))
}
