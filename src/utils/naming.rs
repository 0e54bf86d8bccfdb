//! SQL identifier and literal helpers shared by the parser and generator.

/// Backtick-quote an identifier, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Escape a value for inclusion in a single-quoted SQL string literal.
pub fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Resolve backslash escapes inside a quoted literal body.
///
/// `quote` is the delimiter the literal used; a doubled delimiter inside
/// the body is already handled by the scanner, so only backslash forms
/// remain here.
pub(crate) fn unescape_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Constraint name synthesized for an unnamed foreign key:
/// `fk_<col1>_<col2>_…_<referenced_table>`.
pub fn foreign_key_name(columns: &[String], referenced_table: &str) -> String {
    let mut name = String::from("fk");
    for column in columns {
        name.push('_');
        name.push_str(column);
    }
    name.push('_');
    name.push_str(referenced_table);
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_identifier("users"), "`users`");
        assert_eq!(quote_identifier("odd`name"), "`odd``name`");
    }

    #[test]
    fn escapes_string_literals() {
        assert_eq!(escape_string("it's"), "it\\'s");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
        assert_eq!(escape_string("plain"), "plain");
    }

    #[test]
    fn unescapes_quoted_bodies() {
        assert_eq!(unescape_quoted("a\\'b"), "a'b");
        assert_eq!(unescape_quoted("line\\nbreak"), "line\nbreak");
        assert_eq!(unescape_quoted("back\\\\slash"), "back\\slash");
    }

    #[test]
    fn synthesizes_foreign_key_names() {
        let name = foreign_key_name(&["user_id".to_string()], "users");
        assert_eq!(name, "fk_user_id_users");

        let name = foreign_key_name(&["a".to_string(), "b".to_string()], "t");
        assert_eq!(name, "fk_a_b_t");
    }
}
