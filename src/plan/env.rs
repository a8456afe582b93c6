use crate::error::SchemaError;
use crate::plan::types::EnvVar;

/// Split a `KEY=VALUE` entry on the first `=`.
///
/// `FOO=` yields an empty value; `FOO` and `=bar` are rejected.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidFieldValue`] naming `path`.
pub fn parse_env_entry(entry: &str, path: &str) -> Result<EnvVar, SchemaError> {
    let Some((key, value)) = entry.split_once('=') else {
        return Err(SchemaError::invalid(
            path,
            format!("{entry:?}"),
            "expected KEY=VALUE",
        ));
    };
    if key.is_empty() {
        return Err(SchemaError::invalid(
            path,
            format!("{entry:?}"),
            "empty key before '='",
        ));
    }
    Ok(EnvVar {
        key: key.to_owned(),
        value: value.to_owned(),
    })
}

/// Parse the newline-separated form of `environment_data`. Blank lines are skipped.
///
/// # Errors
///
/// Returns the first entry error; `path` is suffixed with the line index.
pub fn parse_env_block(block: &str, path: &str) -> Result<Vec<EnvVar>, SchemaError> {
    block
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_env_entry(line, &format!("{path}[{i}]")))
        .collect()
}
