//! Syntax check for message matcher expressions such as
//! `Type == 'heka.statmetric' && Fields[name] =~ /cpu/`.
//!
//! Only the shape is validated; evaluation belongs to the telemetry runtime.

/// Message header fields a matcher may compare.
const HEADER_FIELDS: &[&str] = &[
    "Uuid",
    "Timestamp",
    "Type",
    "Logger",
    "Severity",
    "Payload",
    "EnvVersion",
    "Pid",
    "Hostname",
];

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    LParen,
    RParen,
    And,
    Or,
    Op(&'static str),
    Str,
    Regex,
    Number,
    Word(String),
    /// `[name]` subscript after `Fields`, carrying the raw text.
    Subscript(String),
}

/// Check that `expr` is a well-formed matcher.
///
/// # Errors
///
/// Returns a message naming the first problem and its character offset.
pub fn check(expr: &str) -> Result<(), String> {
    let toks = lex(expr)?;
    if toks.is_empty() {
        return Err("empty matcher".to_owned());
    }
    let mut p = MatchParser { toks: &toks, pos: 0 };
    p.expr()?;
    if let Some((offset, tok)) = p.toks.get(p.pos) {
        return Err(format!("unexpected {} at offset {offset}", tok_name(tok)));
    }
    Ok(())
}

fn lex(expr: &str) -> Result<Vec<(usize, Tok)>, String> {
    let mut out = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(i, c)) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '(' => {
                chars.next();
                out.push((i, Tok::LParen));
            }
            ')' => {
                chars.next();
                out.push((i, Tok::RParen));
            }
            '&' | '|' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == c).is_none() {
                    return Err(format!("expected '{c}{c}' at offset {i}"));
                }
                out.push((i, if c == '&' { Tok::And } else { Tok::Or }));
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                let next = chars.peek().map(|&(_, n)| n);
                let op = match (c, next) {
                    ('=', Some('=')) => "==",
                    ('=', Some('~')) => "=~",
                    ('!', Some('=')) => "!=",
                    ('!', Some('~')) => "!~",
                    ('<', Some('=')) => "<=",
                    ('>', Some('=')) => ">=",
                    ('<', _) => "<",
                    ('>', _) => ">",
                    _ => return Err(format!("unknown operator at offset {i}")),
                };
                if op.len() == 2 {
                    chars.next();
                }
                out.push((i, Tok::Op(op)));
            }
            '\'' | '"' | '/' => {
                chars.next();
                let mut closed = false;
                while let Some((_, n)) = chars.next() {
                    if n == '\\' {
                        chars.next();
                    } else if n == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    let what = if c == '/' { "regex" } else { "string" };
                    return Err(format!("unterminated {what} starting at offset {i}"));
                }
                out.push((i, if c == '/' { Tok::Regex } else { Tok::Str }));
            }
            '[' => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, n) in chars.by_ref() {
                    if n == ']' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed || name.trim().is_empty() {
                    return Err(format!("malformed field subscript at offset {i}"));
                }
                out.push((i, Tok::Subscript(name)));
            }
            c if c.is_ascii_digit() || c == '-' => {
                chars.next();
                while chars
                    .next_if(|&(_, n)| n.is_ascii_digit() || n == '.' || n == 'e' || n == 'E')
                    .is_some()
                {}
                out.push((i, Tok::Number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some((_, n)) =
                    chars.next_if(|&(_, n)| n.is_ascii_alphanumeric() || n == '_')
                {
                    word.push(n);
                }
                out.push((i, Tok::Word(word)));
            }
            other => return Err(format!("unexpected character '{other}' at offset {i}")),
        }
    }
    Ok(out)
}

struct MatchParser<'a> {
    toks: &'a [(usize, Tok)],
    pos: usize,
}

impl MatchParser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> String {
        self.toks
            .get(self.pos)
            .map_or_else(|| "end of matcher".to_owned(), |(o, _)| format!("offset {o}"))
    }

    fn bump(&mut self) -> Option<&Tok> {
        let tok = self.toks.get(self.pos).map(|(_, t)| t);
        self.pos += 1;
        tok
    }

    /// expr := and ('||' and)*
    fn expr(&mut self) -> Result<(), String> {
        self.and()?;
        while self.peek() == Some(&Tok::Or) {
            self.bump();
            self.and()?;
        }
        Ok(())
    }

    /// and := term ('&&' term)*
    fn and(&mut self) -> Result<(), String> {
        self.term()?;
        while self.peek() == Some(&Tok::And) {
            self.bump();
            self.term()?;
        }
        Ok(())
    }

    /// term := '(' expr ')' | TRUE | FALSE | comparison
    fn term(&mut self) -> Result<(), String> {
        let at = self.offset();
        match self.bump().cloned() {
            Some(Tok::LParen) => {
                self.expr()?;
                match self.bump() {
                    Some(Tok::RParen) => Ok(()),
                    _ => Err(format!("expected ')' to close '(' at {at}")),
                }
            }
            Some(Tok::Word(w)) if w == "TRUE" || w == "FALSE" => Ok(()),
            Some(Tok::Word(w)) => self.comparison(&w, &at),
            Some(other) => Err(format!("expected a comparison at {at}, found {}", tok_name(&other))),
            None => Err("expected a comparison at end of matcher".to_owned()),
        }
    }

    /// comparison := field op operand
    fn comparison(&mut self, field: &str, at: &str) -> Result<(), String> {
        if field == "Fields" {
            match self.bump() {
                Some(Tok::Subscript(_)) => {}
                _ => return Err(format!("expected Fields[name] at {at}")),
            }
            // Optional [field_index][array_index].
            for _ in 0..2 {
                if matches!(self.peek(), Some(Tok::Subscript(_))) {
                    self.bump();
                }
            }
        } else if !HEADER_FIELDS.contains(&field) {
            return Err(format!("unknown message field '{field}' at {at}"));
        }

        let op_at = self.offset();
        let op = match self.bump() {
            Some(Tok::Op(op)) => *op,
            _ => return Err(format!("expected a comparison operator at {op_at}")),
        };
        let regex_op = op == "=~" || op == "!~";

        let value_at = self.offset();
        match (self.bump(), regex_op) {
            (Some(Tok::Regex), true) => Ok(()),
            (Some(Tok::Regex), false) => Err(format!(
                "regex at {value_at} needs =~ or !~, found {op}"
            )),
            (Some(_), true) => Err(format!("operator {op} needs a /regex/ at {value_at}")),
            (Some(Tok::Str | Tok::Number), false) => Ok(()),
            (Some(Tok::Word(w)), false) if matches!(w.as_str(), "NIL" | "TRUE" | "FALSE") => Ok(()),
            (Some(other), false) => Err(format!(
                "expected a value at {value_at}, found {}",
                tok_name(other)
            )),
            (None, _) => Err("expected a value at end of matcher".to_owned()),
        }
    }
}

fn tok_name(tok: &Tok) -> String {
    match tok {
        Tok::LParen => "'('".to_owned(),
        Tok::RParen => "')'".to_owned(),
        Tok::And => "'&&'".to_owned(),
        Tok::Or => "'||'".to_owned(),
        Tok::Op(op) => format!("'{op}'"),
        Tok::Str => "string".to_owned(),
        Tok::Regex => "regex".to_owned(),
        Tok::Number => "number".to_owned(),
        Tok::Word(w) => format!("'{w}'"),
        Tok::Subscript(s) => format!("'[{s}]'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_true() {
        assert_eq!(check("TRUE"), Ok(()));
    }

    #[test]
    fn accepts_type_comparison() {
        assert_eq!(check("Type == 'heka.statmetric'"), Ok(()));
        assert_eq!(check(r#"Logger != "DockerStats""#), Ok(()));
    }

    #[test]
    fn accepts_boolean_combinations() {
        assert_eq!(
            check("(Type == 'heka.sandbox' || Type =~ /^stats/) && Severity <= 4"),
            Ok(())
        );
    }

    #[test]
    fn accepts_dynamic_fields() {
        assert_eq!(check("Fields[name] == 'cpu' && Fields[value][0][0] > 1.5"), Ok(()));
        assert_eq!(check("Fields[hostname] != NIL"), Ok(()));
    }

    #[test]
    fn rejects_empty_matcher() {
        assert!(check("").is_err());
        assert!(check("   ").is_err());
    }

    #[test]
    fn rejects_unknown_field() {
        let err = check("Kind == 'x'").unwrap_err();
        assert!(err.contains("unknown message field 'Kind'"), "got: {err}");
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(check("(Type == 'x'").unwrap_err().contains("')'"));
        assert!(check("Type == 'x')").unwrap_err().contains("unexpected"));
    }

    #[test]
    fn rejects_unterminated_string() {
        let err = check("Type == 'heka").unwrap_err();
        assert!(err.contains("unterminated string"), "got: {err}");
    }

    #[test]
    fn rejects_single_ampersand() {
        let err = check("TRUE & FALSE").unwrap_err();
        assert!(err.contains("'&&'"), "got: {err}");
    }

    #[test]
    fn regex_needs_regex_operator() {
        assert!(check("Type == /x/").unwrap_err().contains("=~"));
        assert!(check("Type =~ 'x'").unwrap_err().contains("/regex/"));
    }

    #[test]
    fn rejects_dangling_operator() {
        let err = check("Type ==").unwrap_err();
        assert!(err.contains("end of matcher"), "got: {err}");
    }

    #[test]
    fn rejects_missing_comparison_after_and() {
        assert!(check("TRUE &&").is_err());
    }
}
