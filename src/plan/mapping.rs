use crate::error::SchemaError;
use crate::plan::types::Mapping;

/// Parse a comma-separated `host:container[:mode]` list.
///
/// An empty (or all-whitespace) string is an empty list. Any entry that
/// does not split into 2 or 3 non-empty fields fails the whole parse.
///
/// # Errors
///
/// Returns [`SchemaError::InvalidFieldValue`] naming `path` and the raw text.
pub fn parse_mappings(raw: &str, path: &str) -> Result<Vec<Mapping>, SchemaError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .enumerate()
        .map(|(i, entry)| parse_entry(entry, i).map_err(|reason| invalid(path, raw, reason)))
        .collect()
}

fn parse_entry(entry: &str, index: usize) -> Result<Mapping, String> {
    let fields: Vec<&str> = entry.split(':').map(str::trim).collect();
    if fields.len() != 2 && fields.len() != 3 {
        return Err(format!(
            "entry {index} '{}' has {} fields, expected host:container or host:container:mode",
            entry.trim(),
            fields.len()
        ));
    }
    if let Some(pos) = fields.iter().position(|f| f.is_empty()) {
        let which = ["host", "container", "mode"][pos];
        return Err(format!("entry {index} '{}' has an empty {which} field", entry.trim()));
    }

    Ok(Mapping {
        host: fields[0].to_owned(),
        container: fields[1].to_owned(),
        mode: fields.get(2).map(|m| (*m).to_owned()),
    })
}

/// Join mappings back into their document form.
pub fn format_mappings(mappings: &[Mapping]) -> String {
    mappings
        .iter()
        .map(Mapping::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn invalid(path: &str, raw: &str, reason: String) -> SchemaError {
    SchemaError::invalid(path, format!("{raw:?}"), reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &str) -> Vec<(String, String, Option<String>)> {
        parse_mappings(raw, "port_mapping")
            .expect("parse failed")
            .into_iter()
            .map(|m| (m.host, m.container, m.mode))
            .collect()
    }

    #[test]
    fn parses_three_port_pairs_in_order() {
        let got = pairs("8080:8090,8081:8081,3000:3000");
        assert_eq!(
            got,
            vec![
                ("8080".into(), "8090".into(), None),
                ("8081".into(), "8081".into(), None),
                ("3000".into(), "3000".into(), None),
            ]
        );
    }

    #[test]
    fn parses_volume_with_mode() {
        let got = pairs("/home/core/heka:/heka:rw,/var/run/docker.sock:/var/run/docker.sock");
        assert_eq!(got[0].2.as_deref(), Some("rw"));
        assert_eq!(got[1].2, None);
    }

    #[test]
    fn trims_whitespace_around_fields() {
        let got = pairs(" 8080 : 8090 , 53:53:udp ");
        assert_eq!(got[0], ("8080".into(), "8090".into(), None));
        assert_eq!(got[1], ("53".into(), "53".into(), Some("udp".into())));
    }

    #[test]
    fn empty_string_is_empty_list() {
        assert!(pairs("").is_empty());
        assert!(pairs("   ").is_empty());
    }

    #[test]
    fn rejects_empty_container_field() {
        let err = parse_mappings("8080:", "plans[0].steps[0].port_mapping").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFieldValue { .. }), "got: {err:?}");
        assert_eq!(err.path(), Some("plans[0].steps[0].port_mapping"));
        assert!(err.to_string().contains("empty container"), "got: {err}");
    }

    #[test]
    fn rejects_single_field_entry() {
        let err = parse_mappings("8080", "port_mapping").unwrap_err();
        assert!(err.to_string().contains("1 fields"), "got: {err}");
    }

    #[test]
    fn rejects_four_field_entry() {
        let err = parse_mappings("1:2:3:4", "port_mapping").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidFieldValue { .. }));
    }

    #[test]
    fn rejects_trailing_comma() {
        let err = parse_mappings("8080:8090,", "port_mapping").unwrap_err();
        assert!(err.to_string().contains("entry 1"), "got: {err}");
    }

    #[test]
    fn format_joins_entries() {
        let mappings = parse_mappings("80:8080,/a:/b:ro", "m").expect("parse failed");
        assert_eq!(format_mappings(&mappings), "80:8080,/a:/b:ro");
    }
}
