//! DDL parser: turns a document of `CREATE TABLE` statements into a
//! [`Schema`].
//!
//! Accepts typical MySQL-dump output: `IF NOT EXISTS`, conditional
//! comments, `SET` directives and `DROP TABLE IF EXISTS` boilerplate are
//! all stripped before structural parsing. Parse failures report the byte
//! offset into the original input.

use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::types::{Column, ForeignKey, Index, ReferenceAction, Schema, Table};
use crate::utils::naming::foreign_key_name;

/// Parser for DDL documents.
pub struct DdlParser;

impl DdlParser {
    /// Parse a document of zero or more `CREATE TABLE` statements.
    pub fn parse(input: &str) -> Result<Schema> {
        let cleaned = strip_comments(input)?;
        let mut schema = Schema::new();

        for (offset, statement) in split_top_level(&cleaned, 0, ';') {
            let mut cursor = Cursor::new(statement, offset);
            cursor.skip_ws();
            if cursor.at_end() {
                continue;
            }
            // Dump boilerplate: SET directives and DROP TABLE statements
            // are only recognized here, at a statement start, so the SET
            // data type and CHARACTER SET clauses are never touched.
            if cursor.try_keyword("SET") || cursor.try_keyword("DROP") {
                continue;
            }
            if !cursor.try_keywords(&["CREATE", "TABLE"]) {
                debug!(offset, "skipping non-CREATE TABLE statement");
                continue;
            }

            let table = Self::parse_table(&mut cursor)?;
            table.validate()?;
            schema.add_table(table);
        }

        Ok(schema)
    }

    fn parse_table(cursor: &mut Cursor) -> Result<Table> {
        cursor.try_keywords(&["IF", "NOT", "EXISTS"]);

        let mut name = cursor.read_identifier()?;
        cursor.skip_ws();
        if cursor.peek() == Some('.') {
            cursor.bump();
            name = cursor.read_identifier()?;
        }

        let mut table = Table::new(&name);

        let (body_offset, body) = cursor.read_paren_group()?;
        for (part_offset, part) in split_top_level(body, body_offset, ',') {
            Self::parse_body_part(&mut table, part, part_offset)?;
        }

        Self::parse_table_options(&mut table, cursor)?;

        Ok(table)
    }

    /// Classify and parse one comma-separated item of the table body.
    fn parse_body_part(table: &mut Table, part: &str, offset: usize) -> Result<()> {
        let mut cursor = Cursor::new(part, offset);
        cursor.skip_ws();
        if cursor.at_end() {
            return Ok(());
        }

        if cursor.try_keywords(&["PRIMARY", "KEY"]) {
            let (columns_offset, columns_src) = cursor.read_paren_group()?;
            let columns = parse_key_columns(columns_src, columns_offset)?;
            table.add_index(Index::primary(columns));
            return Ok(());
        }

        if cursor.try_keyword("UNIQUE") {
            let _ = cursor.try_keyword("KEY") || cursor.try_keyword("INDEX");
            return Self::parse_index(table, &mut cursor, true);
        }

        if cursor.try_keyword("KEY") || cursor.try_keyword("INDEX") {
            return Self::parse_index(table, &mut cursor, false);
        }

        if cursor.try_keyword("CONSTRAINT") {
            let save = cursor.pos;
            if cursor.try_keywords(&["FOREIGN", "KEY"]) {
                return Self::parse_foreign_key(table, &mut cursor, None);
            }
            cursor.pos = save;
            let name = cursor.read_identifier()?;
            if !cursor.try_keywords(&["FOREIGN", "KEY"]) {
                // CHECK and other named constraints are out of scope
                debug!(offset, constraint = name.as_str(), "skipping unsupported constraint");
                return Ok(());
            }
            return Self::parse_foreign_key(table, &mut cursor, Some(name));
        }

        if cursor.try_keywords(&["FOREIGN", "KEY"]) {
            return Self::parse_foreign_key(table, &mut cursor, None);
        }

        if cursor.try_keyword("FULLTEXT")
            || cursor.try_keyword("SPATIAL")
            || cursor.try_keyword("CHECK")
        {
            debug!(offset, "skipping unsupported table body item");
            return Ok(());
        }

        let name = cursor.read_identifier()?;
        Self::parse_column(table, &mut cursor, name)
    }

    fn parse_index(table: &mut Table, cursor: &mut Cursor, unique: bool) -> Result<()> {
        cursor.skip_ws();
        let name = if cursor.peek() == Some('(') {
            None
        } else {
            Some(cursor.read_identifier()?)
        };

        let (columns_offset, columns_src) = cursor.read_paren_group()?;
        let columns = parse_key_columns(columns_src, columns_offset)?;
        // An unnamed key takes its first column's name, as MySQL does.
        let name = name.unwrap_or_else(|| columns[0].clone());

        let mut index = Index::new(&name, columns, unique);
        if cursor.try_keyword("USING") {
            if let Some(word) = cursor.read_word() {
                index.index_type = word.to_uppercase();
            }
        }
        if cursor.try_keyword("COMMENT") {
            index.comment = Some(cursor.read_quoted()?);
        }

        table.add_index(index);
        Ok(())
    }

    fn parse_foreign_key(
        table: &mut Table,
        cursor: &mut Cursor,
        name: Option<String>,
    ) -> Result<()> {
        // optional index name between FOREIGN KEY and the column list
        cursor.skip_ws();
        if cursor.peek() != Some('(') {
            let _ = cursor.read_identifier()?;
        }

        let (columns_offset, columns_src) = cursor.read_paren_group()?;
        let columns = parse_key_columns(columns_src, columns_offset)?;

        if !cursor.try_keyword("REFERENCES") {
            return Err(cursor.error("malformed FOREIGN KEY: expected REFERENCES"));
        }
        let mut referenced_table = cursor.read_identifier()?;
        cursor.skip_ws();
        if cursor.peek() == Some('.') {
            cursor.bump();
            referenced_table = cursor.read_identifier()?;
        }

        let (refs_offset, refs_src) = cursor.read_paren_group()?;
        let referenced_columns = parse_key_columns(refs_src, refs_offset)?;

        let mut fk = ForeignKey {
            name: name.unwrap_or_else(|| foreign_key_name(&columns, &referenced_table)),
            columns,
            referenced_table,
            referenced_columns,
            on_update: ReferenceAction::default(),
            on_delete: ReferenceAction::default(),
        };

        loop {
            if cursor.try_keywords(&["ON", "DELETE"]) {
                fk.on_delete = Self::parse_reference_action(cursor)?;
            } else if cursor.try_keywords(&["ON", "UPDATE"]) {
                fk.on_update = Self::parse_reference_action(cursor)?;
            } else {
                break;
            }
        }

        table.add_foreign_key(fk);
        Ok(())
    }

    fn parse_reference_action(cursor: &mut Cursor) -> Result<ReferenceAction> {
        if cursor.try_keyword("RESTRICT") {
            Ok(ReferenceAction::Restrict)
        } else if cursor.try_keyword("CASCADE") {
            Ok(ReferenceAction::Cascade)
        } else if cursor.try_keywords(&["SET", "NULL"]) {
            Ok(ReferenceAction::SetNull)
        } else if cursor.try_keywords(&["NO", "ACTION"]) {
            Ok(ReferenceAction::NoAction)
        } else {
            Err(cursor.error("malformed FOREIGN KEY: unknown referential action"))
        }
    }

    fn parse_column(table: &mut Table, cursor: &mut Cursor, name: String) -> Result<()> {
        let base_type = cursor
            .read_word()
            .ok_or_else(|| Error::parse(cursor.offset(), "expected column type"))?
            .to_lowercase();

        cursor.skip_ws();
        let data_type = if cursor.peek() == Some('(') {
            let (_, params) = cursor.read_paren_group()?;
            format!("{}({})", base_type, params.trim())
        } else {
            base_type
        };

        let mut column = Column::new(&name, &data_type);
        let mut inline_primary = false;
        let mut inline_unique = false;

        loop {
            cursor.skip_ws();
            if cursor.at_end() {
                break;
            }

            if cursor.try_keywords(&["NOT", "NULL"]) {
                column.nullable = false;
            } else if cursor.try_keyword("NULL") {
                column.nullable = true;
            } else if cursor.try_keyword("DEFAULT") {
                column.default = Self::parse_default_value(cursor)?;
            } else if cursor.try_keyword("AUTO_INCREMENT") {
                column.extra = "auto_increment".to_string();
            } else if cursor.try_keyword("COMMENT") {
                column.comment = Some(cursor.read_quoted()?);
            } else if cursor.try_keywords(&["CHARACTER", "SET"]) || cursor.try_keyword("CHARSET") {
                column.charset = Some(cursor.read_identifier()?);
            } else if cursor.try_keyword("COLLATE") {
                column.collation = Some(cursor.read_identifier()?);
            } else if cursor.try_keywords(&["PRIMARY", "KEY"]) {
                inline_primary = true;
            } else if cursor.try_keyword("UNIQUE") {
                let _ = cursor.try_keyword("KEY");
                inline_unique = true;
            } else if cursor.read_word().is_none() {
                // punctuation we do not model (e.g. the parens of an
                // ON UPDATE CURRENT_TIMESTAMP(6) precision)
                if cursor.bump().is_none() {
                    break;
                }
            }
        }

        if inline_primary {
            table.add_index(Index::primary(vec![column.name.clone()]));
        }
        if inline_unique {
            table.add_index(Index::new(&column.name, vec![column.name.clone()], true));
        }
        table.add_column(column);
        Ok(())
    }

    /// The value after a DEFAULT keyword: `NULL` collapses to absence,
    /// quoted strings are unquoted and unescaped, everything else is kept
    /// verbatim as a single token.
    fn parse_default_value(cursor: &mut Cursor) -> Result<Option<String>> {
        cursor.skip_ws();
        match cursor.peek() {
            Some('\'') | Some('"') => Ok(Some(cursor.read_quoted()?)),
            Some('(') => {
                let (_, inner) = cursor.read_paren_group()?;
                Ok(Some(format!("({})", inner.trim())))
            }
            _ => {
                let token = cursor.read_value_token()?;
                if token.eq_ignore_ascii_case("null") {
                    Ok(None)
                } else if token.eq_ignore_ascii_case("now()") {
                    // MySQL stores NOW() as CURRENT_TIMESTAMP
                    Ok(Some("CURRENT_TIMESTAMP".to_string()))
                } else {
                    Ok(Some(token))
                }
            }
        }
    }

    /// The clause between the closing `)` and the statement end:
    /// `ENGINE=…`, `[DEFAULT] CHARSET=…` (captured, not modeled),
    /// `COLLATE=…`, `COMMENT='…'`, `AUTO_INCREMENT=…`.
    fn parse_table_options(table: &mut Table, cursor: &mut Cursor) -> Result<()> {
        loop {
            cursor.skip_ws();
            match cursor.peek() {
                None => return Ok(()),
                Some(',') => {
                    cursor.bump();
                    continue;
                }
                _ => {}
            }

            let Some(word) = cursor.read_word() else {
                cursor.bump();
                continue;
            };

            match word.to_uppercase().as_str() {
                "ENGINE" => table.options.engine = Self::read_option_value(cursor)?,
                "DEFAULT" => {}
                "CHARSET" => {
                    let _ = Self::read_option_value(cursor)?;
                }
                "CHARACTER" => {
                    let _ = cursor.try_keyword("SET");
                    let _ = Self::read_option_value(cursor)?;
                }
                "COLLATE" => table.options.collation = Some(Self::read_option_value(cursor)?),
                "COMMENT" => table.options.comment = Some(Self::read_option_value(cursor)?),
                "AUTO_INCREMENT" => {
                    table.options.auto_increment = Self::read_option_value(cursor)?.parse().ok()
                }
                _ => {
                    // ROW_FORMAT, KEY_BLOCK_SIZE and friends: consume the
                    // value so scanning stays aligned
                    let _ = Self::read_option_value(cursor);
                }
            }
        }
    }

    fn read_option_value(cursor: &mut Cursor) -> Result<String> {
        cursor.skip_ws();
        if cursor.peek() == Some('=') {
            cursor.bump();
        }
        cursor.skip_ws();
        match cursor.peek() {
            Some('\'') | Some('"') => cursor.read_quoted(),
            _ => cursor.read_value_token(),
        }
    }
}

/// Replace comments with equally sized blanks so byte offsets into the
/// cleaned text remain valid for the original input. Handles `--` line
/// comments and block comments including the `/*! … */` conditional form;
/// quoted strings are copied untouched.
pub(crate) fn strip_comments(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            '\'' | '"' => {
                out.push(ch);
                copy_quoted(&mut chars, &mut out, ch, offset)?;
            }
            '`' => {
                out.push(ch);
                copy_backticked(&mut chars, &mut out, offset)?;
            }
            '-' if matches!(chars.peek(), Some((_, '-'))) => {
                chars.next();
                out.push_str("  ");
                while let Some(&(_, next)) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                    blank(&mut out, next);
                }
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                out.push_str("  ");
                let mut closed = false;
                while let Some((_, next)) = chars.next() {
                    if next == '*' && matches!(chars.peek(), Some((_, '/'))) {
                        chars.next();
                        out.push_str("  ");
                        closed = true;
                        break;
                    }
                    blank(&mut out, next);
                }
                if !closed {
                    return Err(Error::parse(offset, "unterminated block comment"));
                }
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

fn blank(out: &mut String, ch: char) {
    if ch == '\n' {
        out.push('\n');
    } else {
        for _ in 0..ch.len_utf8() {
            out.push(' ');
        }
    }
}

fn copy_quoted<I>(
    chars: &mut std::iter::Peekable<I>,
    out: &mut String,
    quote: char,
    start: usize,
) -> Result<()>
where
    I: Iterator<Item = (usize, char)>,
{
    while let Some((_, ch)) = chars.next() {
        out.push(ch);
        if ch == '\\' {
            if let Some((_, escaped)) = chars.next() {
                out.push(escaped);
            }
        } else if ch == quote {
            // doubled delimiter is an escaped delimiter, not the end
            if matches!(chars.peek(), Some(&(_, next)) if next == quote) {
                if let Some((_, next)) = chars.next() {
                    out.push(next);
                }
            } else {
                return Ok(());
            }
        }
    }
    Err(Error::parse(start, "unterminated string literal"))
}

fn copy_backticked<I>(
    chars: &mut std::iter::Peekable<I>,
    out: &mut String,
    start: usize,
) -> Result<()>
where
    I: Iterator<Item = (usize, char)>,
{
    while let Some((_, ch)) = chars.next() {
        out.push(ch);
        if ch == '`' {
            if matches!(chars.peek(), Some(&(_, next)) if next == '`') {
                if let Some((_, next)) = chars.next() {
                    out.push(next);
                }
            } else {
                return Ok(());
            }
        }
    }
    Err(Error::parse(start, "unterminated quoted identifier"))
}

/// Split on a separator at parenthesis depth zero, outside quoted spans.
/// Returns `(absolute_offset, slice)` pairs; the final unterminated piece
/// is included when non-empty.
pub(crate) fn split_top_level(src: &str, base: usize, separator: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut chars = src.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\'' | '"' => skip_quoted(&mut chars, ch),
            '`' => skip_backticked(&mut chars),
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if ch == separator && depth == 0 => {
                pieces.push((base + start, &src[start..i]));
                start = i + ch.len_utf8();
            }
            _ => {}
        }
    }

    if !src[start..].trim().is_empty() {
        pieces.push((base + start, &src[start..]));
    }

    pieces
}

fn skip_quoted<I>(chars: &mut std::iter::Peekable<I>, quote: char)
where
    I: Iterator<Item = (usize, char)>,
{
    while let Some((_, ch)) = chars.next() {
        if ch == '\\' {
            chars.next();
        } else if ch == quote {
            if matches!(chars.peek(), Some(&(_, next)) if next == quote) {
                chars.next();
            } else {
                return;
            }
        }
    }
}

fn skip_backticked<I>(chars: &mut std::iter::Peekable<I>)
where
    I: Iterator<Item = (usize, char)>,
{
    for (_, ch) in chars.by_ref() {
        if ch == '`' {
            return;
        }
    }
}

/// Parse a parenthesized key column list: identifiers, optionally with a
/// prefix length or direction suffix that the model does not carry.
fn parse_key_columns(src: &str, base: usize) -> Result<Vec<String>> {
    let mut columns = Vec::new();
    for (offset, part) in split_top_level(src, base, ',') {
        let mut cursor = Cursor::new(part, offset);
        columns.push(cursor.read_identifier()?);
    }
    if columns.is_empty() {
        return Err(Error::parse(base, "empty key column list"));
    }
    Ok(columns)
}

/// Character-level scanner over one statement or statement fragment.
///
/// `base` is the absolute byte offset of `src` within the original
/// document, so errors point at the right place.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, base: usize) -> Self {
        Self { src, pos: 0, base }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.rest().trim().is_empty()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.offset(), message)
    }

    /// Consume a run of bare word characters, skipping leading whitespace.
    fn read_word(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            self.bump();
        }
        if self.pos == start {
            None
        } else {
            Some(&self.src[start..self.pos])
        }
    }

    /// Consume `keyword` (case-insensitive, word-boundary); restores the
    /// position on mismatch.
    fn try_keyword(&mut self, keyword: &str) -> bool {
        let save = self.pos;
        match self.read_word() {
            Some(word) if word.eq_ignore_ascii_case(keyword) => true,
            _ => {
                self.pos = save;
                false
            }
        }
    }

    fn try_keywords(&mut self, keywords: &[&str]) -> bool {
        let save = self.pos;
        for keyword in keywords {
            if !self.try_keyword(keyword) {
                self.pos = save;
                return false;
            }
        }
        true
    }

    /// Read an identifier, backtick-quoted or bare.
    fn read_identifier(&mut self) -> Result<String> {
        self.skip_ws();
        if self.peek() == Some('`') {
            self.bump();
            let mut out = String::new();
            loop {
                match self.bump() {
                    Some('`') => {
                        if self.peek() == Some('`') {
                            self.bump();
                            out.push('`');
                        } else {
                            return Ok(out);
                        }
                    }
                    Some(ch) => out.push(ch),
                    None => return Err(self.error("unterminated quoted identifier")),
                }
            }
        }
        match self.read_word() {
            Some(word) => Ok(word.to_string()),
            None => Err(self.error("expected identifier")),
        }
    }

    /// Read a single- or double-quoted string, resolving backslash and
    /// doubled-delimiter escapes.
    fn read_quoted(&mut self) -> Result<String> {
        self.skip_ws();
        let quote = match self.peek() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected quoted string")),
        };
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('0') => out.push('\0'),
                    Some(ch) => out.push(ch),
                    None => return Err(self.error("unterminated string literal")),
                },
                Some(ch) if ch == quote => {
                    if self.peek() == Some(quote) {
                        self.bump();
                        out.push(quote);
                    } else {
                        return Ok(out);
                    }
                }
                Some(ch) => out.push(ch),
                None => return Err(self.error("unterminated string literal")),
            }
        }
    }

    /// Read a parenthesized group, returning the absolute offset of the
    /// inner text and the inner text itself. Depth counting suspends
    /// inside quoted spans.
    fn read_paren_group(&mut self) -> Result<(usize, &'a str)> {
        self.skip_ws();
        if self.peek() != Some('(') {
            return Err(self.error("expected `(`"));
        }
        let open = self.pos;
        self.bump();
        let mut depth = 1usize;

        while let Some(ch) = self.peek() {
            match ch {
                '\'' | '"' => {
                    self.read_quoted()?;
                    continue;
                }
                '`' => {
                    self.read_identifier()?;
                    continue;
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let inner = &self.src[open + 1..self.pos];
                        self.bump();
                        return Ok((self.base + open + 1, inner));
                    }
                }
                _ => {}
            }
            self.bump();
        }

        Err(Error::parse(self.base + open, "unbalanced parentheses"))
    }

    /// A bare value token: word characters plus sign and decimal point,
    /// with an optional attached parenthesized suffix
    /// (`CURRENT_TIMESTAMP(6)`).
    fn read_value_token(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(c) if c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '+' | '-')
        ) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected value"));
        }
        let mut out = self.src[start..self.pos].to_string();
        if self.peek() == Some('(') {
            let (_, inner) = self.read_paren_group()?;
            out.push('(');
            out.push_str(inner);
            out.push(')');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::PRIMARY_KEY_NAME;
    use pretty_assertions::assert_eq;

    fn parse_one(ddl: &str) -> Table {
        let schema = DdlParser::parse(ddl).unwrap();
        assert_eq!(schema.tables.len(), 1, "expected exactly one table");
        schema.tables.into_values().next().unwrap()
    }

    #[test]
    fn parses_basic_table() {
        let table = parse_one(
            "CREATE TABLE `users` (
                `id` int(11) NOT NULL AUTO_INCREMENT,
                `name` varchar(64) NOT NULL,
                `bio` text,
                PRIMARY KEY (`id`)
            ) ENGINE=InnoDB;",
        );

        assert_eq!(table.name, "users");
        assert_eq!(table.columns.len(), 3);

        let id = table.column("id").unwrap();
        assert_eq!(id.data_type, "int(11)");
        assert!(!id.nullable);
        assert_eq!(id.extra, "auto_increment");

        let bio = table.column("bio").unwrap();
        assert!(bio.nullable);
        assert_eq!(bio.default, None);

        let pk = table.primary_key().unwrap();
        assert_eq!(pk.columns, vec!["id"]);
        assert!(pk.unique);
        assert_eq!(table.options.engine, "InnoDB");
    }

    #[test]
    fn strips_dump_boilerplate() {
        let schema = DdlParser::parse(
            "-- dump header
            SET NAMES utf8mb4;
            SET FOREIGN_KEY_CHECKS = 0;
            DROP TABLE IF EXISTS `t`;
            /*!40101 SET @saved_cs_client = @@character_set_client */;
            CREATE TABLE `t` (`id` int NOT NULL); /* trailing */",
        )
        .unwrap();

        assert_eq!(schema.tables.len(), 1);
        assert!(schema.table("t").is_some());
    }

    #[test]
    fn set_directive_does_not_eat_set_type() {
        let table = parse_one(
            "CREATE TABLE `prefs` (
                `flags` set('a','b') NOT NULL,
                `note` varchar(16) CHARACTER SET utf8mb4 DEFAULT NULL
            );",
        );

        assert_eq!(table.column("flags").unwrap().data_type, "set('a','b')");
        assert_eq!(
            table.column("note").unwrap().charset.as_deref(),
            Some("utf8mb4")
        );
    }

    #[test]
    fn quoted_parens_do_not_confuse_depth_tracking() {
        let table = parse_one(
            "CREATE TABLE `t` (
                `a` varchar(32) NOT NULL DEFAULT '(foo',
                `b` int COMMENT 'hello ) world'
            );",
        );

        assert_eq!(table.column("a").unwrap().default.as_deref(), Some("(foo"));
        assert_eq!(
            table.column("b").unwrap().comment.as_deref(),
            Some("hello ) world")
        );
    }

    #[test]
    fn parses_default_variants() {
        let table = parse_one(
            "CREATE TABLE `t` (
                `a` varchar(8) NOT NULL DEFAULT '',
                `b` decimal(20,8) NOT NULL DEFAULT 0,
                `c` int DEFAULT NULL,
                `d` varchar(8) DEFAULT 'it\\'s',
                `e` timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP,
                `f` datetime NOT NULL DEFAULT NOW()
            );",
        );

        assert_eq!(table.column("a").unwrap().default.as_deref(), Some(""));
        assert_eq!(table.column("b").unwrap().default.as_deref(), Some("0"));
        assert_eq!(table.column("c").unwrap().default, None);
        assert_eq!(table.column("d").unwrap().default.as_deref(), Some("it's"));
        assert_eq!(
            table.column("e").unwrap().default.as_deref(),
            Some("CURRENT_TIMESTAMP")
        );
        // NOW() is stored as CURRENT_TIMESTAMP, as MySQL itself does
        assert_eq!(
            table.column("f").unwrap().default.as_deref(),
            Some("CURRENT_TIMESTAMP")
        );
    }

    #[test]
    fn parses_indexes() {
        let table = parse_one(
            "CREATE TABLE `t` (
                `id` int NOT NULL,
                `email` varchar(255) NOT NULL,
                `a` int,
                `b` int,
                PRIMARY KEY (`id`),
                UNIQUE KEY `email` (`email`),
                KEY `ab` (`a`,`b`) USING BTREE,
                KEY (`b`)
            );",
        );

        assert!(table.indexes.contains_key(PRIMARY_KEY_NAME));
        let email = &table.indexes["email"];
        assert!(email.unique);
        let ab = &table.indexes["ab"];
        assert!(!ab.unique);
        assert_eq!(ab.columns, vec!["a", "b"]);
        // unnamed key takes its first column's name
        assert!(table.indexes.contains_key("b"));
    }

    #[test]
    fn parses_inline_primary_key_and_unique() {
        let table = parse_one(
            "CREATE TABLE users (id INT PRIMARY KEY, email VARCHAR(255) UNIQUE);",
        );

        assert_eq!(table.primary_key().unwrap().columns, vec!["id"]);
        assert!(table.indexes["email"].unique);
    }

    #[test]
    fn parses_foreign_keys() {
        let table = parse_one(
            "CREATE TABLE `orders` (
                `id` int NOT NULL,
                `user_id` int NOT NULL,
                `addr_id` int NOT NULL,
                CONSTRAINT `fk_user` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`)
                    ON DELETE CASCADE ON UPDATE NO ACTION,
                FOREIGN KEY (`addr_id`) REFERENCES `addresses` (`id`)
            );",
        );

        let named = &table.foreign_keys["fk_user"];
        assert_eq!(named.referenced_table, "users");
        assert_eq!(named.on_delete, ReferenceAction::Cascade);
        assert_eq!(named.on_update, ReferenceAction::NoAction);

        let synthesized = &table.foreign_keys["fk_addr_id_addresses"];
        assert_eq!(synthesized.columns, vec!["addr_id"]);
        assert_eq!(synthesized.on_delete, ReferenceAction::Restrict);
        assert_eq!(synthesized.on_update, ReferenceAction::Restrict);
    }

    #[test]
    fn parses_table_options() {
        let table = parse_one(
            "CREATE TABLE `t` (`id` int NOT NULL)
             ENGINE=MyISAM DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci
             COMMENT='audit log' AUTO_INCREMENT=42 ROW_FORMAT=DYNAMIC;",
        );

        assert_eq!(table.options.engine, "MyISAM");
        assert_eq!(table.options.collation.as_deref(), Some("utf8mb4_unicode_ci"));
        assert_eq!(table.options.comment.as_deref(), Some("audit log"));
        assert_eq!(table.options.auto_increment, Some(42));
    }

    #[test]
    fn parses_if_not_exists_and_qualified_names() {
        let table = parse_one("CREATE TABLE IF NOT EXISTS `app`.`t` (`id` int NOT NULL);");
        assert_eq!(table.name, "t");
    }

    #[test]
    fn parses_multiple_tables() {
        let schema = DdlParser::parse(
            "CREATE TABLE a (id INT NOT NULL);
             CREATE TABLE b (id INT NOT NULL);",
        )
        .unwrap();
        assert_eq!(
            schema.tables.keys().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn unbalanced_parens_report_offset() {
        let err = DdlParser::parse("CREATE TABLE t (id INT").unwrap_err();
        match err {
            Error::ParseError { offset, .. } => assert_eq!(offset, 15),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_foreign_key_is_an_error() {
        let err = DdlParser::parse(
            "CREATE TABLE t (id INT, FOREIGN KEY (id) users (id));",
        )
        .unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = DdlParser::parse("CREATE TABLE t (a varchar(8) DEFAULT 'oops);").unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }

    #[test]
    fn duplicate_columns_violate_invariants() {
        let err = DdlParser::parse("CREATE TABLE t (id INT, id BIGINT);").unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[test]
    fn decimal_parameters_survive() {
        let table = parse_one(
            "CREATE TABLE t (amount DECIMAL(20,8) NOT NULL DEFAULT 0);",
        );
        let amount = table.column("amount").unwrap();
        assert_eq!(amount.data_type, "decimal(20,8)");
        assert_eq!(amount.default.as_deref(), Some("0"));
    }
}
