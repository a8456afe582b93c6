//! `$name` substitution for pipeline config templates.
//!
//! Configs shipped to monitoring hosts carry placeholders such as
//! `$influx_host` that are filled in before the config is loaded.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("line {line}: no value for template variable '{name}'")]
    UnknownVariable { name: String, line: usize },
    #[error("line {line}, column {column}: invalid placeholder, use $name, ${{name}} or $$")]
    InvalidPlaceholder { line: usize, column: usize },
}

/// Replace `$name` and `${name}` with values from `vars`; `$$` is a literal `$`.
///
/// Names start with a letter or `_` and continue with letters, digits or `_`.
///
/// # Errors
///
/// [`TemplateError::UnknownVariable`] for a name missing from `vars`,
/// [`TemplateError::InvalidPlaceholder`] for a `$` not followed by a name,
/// `{name}` or another `$`.
pub fn render(text: &str, vars: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut line = 1;
    let mut column = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
            continue;
        }

        let invalid = TemplateError::InvalidPlaceholder { line, column };
        let name = match chars.peek() {
            Some('$') => {
                chars.next();
                out.push('$');
                column += 2;
                continue;
            }
            Some('{') => {
                chars.next();
                let name = take_name(&mut chars);
                if name.is_empty() || chars.next() != Some('}') {
                    return Err(invalid);
                }
                column += name.chars().count() + 3;
                name
            }
            Some(&n) if is_name_start(n) => {
                let name = take_name(&mut chars);
                column += name.chars().count() + 1;
                name
            }
            _ => return Err(invalid),
        };

        match vars.get(&name) {
            Some(value) => out.push_str(value),
            None => return Err(TemplateError::UnknownVariable { name, line }),
        }
    }

    Ok(out)
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    if chars.peek().is_some_and(|&c| is_name_start(c)) {
        while let Some(c) = chars.next_if(|&c| c.is_ascii_alphanumeric() || c == '_') {
            name.push(c);
        }
    }
    name
}
