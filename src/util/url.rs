/// Check that `url` looks like `scheme://host[...]`.
///
/// This is a shape check, not a full RFC 3986 parser: the scheme must start
/// with a letter, the host must be non-empty, and no whitespace is allowed.
///
/// # Errors
///
/// Returns a short reason naming what is wrong.
pub fn check_url(url: &str) -> Result<(), String> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| "expected scheme://host".to_owned())?;

    let mut chars = scheme.chars();
    let scheme_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !scheme_ok {
        return Err(format!("invalid scheme '{scheme}'"));
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    if host.is_empty() || host.starts_with(':') {
        return Err("missing host".to_owned());
    }
    if url.chars().any(char::is_whitespace) {
        return Err("contains whitespace".to_owned());
    }
    Ok(())
}
