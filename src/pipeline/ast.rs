use std::collections::BTreeMap;

use serde::Serialize;

/// A parameter value as written in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Offset or local date-time, kept in its document form.
    Datetime(String),
    Array(Vec<Value>),
    /// Inline tables, dotted keys and arrays of tables inside a section.
    Table(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "a string",
            Value::Integer(_) => "an integer",
            Value::Float(_) => "a float",
            Value::Bool(_) => "a boolean",
            Value::Datetime(_) => "a datetime",
            Value::Array(_) => "an array",
            Value::Table(_) => "a table",
        }
    }

    pub fn from_toml(value: &toml_edit::Value) -> Self {
        match value {
            toml_edit::Value::String(s) => Value::String(s.value().clone()),
            toml_edit::Value::Integer(i) => Value::Integer(*i.value()),
            toml_edit::Value::Float(x) => Value::Float(*x.value()),
            toml_edit::Value::Boolean(b) => Value::Bool(*b.value()),
            toml_edit::Value::Datetime(d) => Value::Datetime(d.value().to_string()),
            toml_edit::Value::Array(items) => Value::Array(items.iter().map(Value::from_toml).collect()),
            toml_edit::Value::InlineTable(table) => Value::Table(
                table
                    .iter()
                    .map(|(k, v)| (k.to_owned(), Value::from_toml(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_toml(&self) -> toml_edit::Value {
        match self {
            Value::String(s) => s.as_str().into(),
            Value::Integer(i) => (*i).into(),
            Value::Float(x) => (*x).into(),
            Value::Bool(b) => (*b).into(),
            Value::Datetime(d) => d
                .parse::<toml_edit::Datetime>()
                .map_or_else(|_| d.as_str().into(), toml_edit::Value::from),
            Value::Array(items) => toml_edit::Value::Array(items.iter().map(Value::to_toml).collect()),
            Value::Table(entries) => toml_edit::Value::InlineTable(
                entries
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.to_toml()))
                    .collect(),
            ),
        }
    }
}

impl std::fmt::Display for Value {
    /// Renders the value in document syntax.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_toml())
    }
}

/// A `key = value` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Value,
}

/// A `[Header]` and the entries that follow it, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSection {
    /// Header segments: `[A.B.c]` is `["A", "B", "c"]`.
    pub path: Vec<String>,
    pub entries: Vec<Entry>,
}

impl RawSection {
    pub fn name(&self) -> String {
        self.path.join(".")
    }

    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_plain_string_quoted() {
        assert_eq!(Value::String("TRUE".into()).to_string(), r#""TRUE""#);
    }

    #[test]
    fn displays_float_with_fraction() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
    }

    #[test]
    fn displays_array() {
        let v = Value::Array(vec![
            Value::String("a".into()),
            Value::Integer(2),
            Value::Bool(true),
        ]);
        assert_eq!(v.to_string(), r#"["a", 2, true]"#);
    }

    #[test]
    fn converts_document_values() {
        let doc: toml_edit::DocumentMut = "a = 0x1F\nb = { x = 1, y = \"z\" }\nc = 1979-05-27T07:32:00Z\n"
            .parse()
            .expect("parse failed");
        let get = |key: &str| Value::from_toml(doc[key].as_value().expect("value"));
        assert_eq!(get("a"), Value::Integer(31));
        assert_eq!(
            get("b"),
            Value::Table(BTreeMap::from([
                ("x".to_owned(), Value::Integer(1)),
                ("y".to_owned(), Value::String("z".into())),
            ]))
        );
        assert_eq!(get("c"), Value::Datetime("1979-05-27T07:32:00Z".into()));
    }

    #[test]
    fn datetime_keeps_its_type_when_written_back() {
        let value = Value::Datetime("1979-05-27T07:32:00Z".into());
        assert!(value.to_toml().is_datetime());
        assert_eq!(Value::from_toml(&value.to_toml()), value);
    }

    #[test]
    fn raw_section_name_joins_path() {
        let section = RawSection {
            path: vec!["Parent".into(), "Metric".into(), "child".into()],
            entries: vec![],
        };
        assert_eq!(section.name(), "Parent.Metric.child");
        assert!(section.entry("type").is_none());
    }
}
