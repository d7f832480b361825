//! Splitting a migration script into individually-parsed statements.
//!
//! Leans on `pg_query::split_with_parser` rather than a hand-rolled splitter
//! so that dollar-quoted function bodies and semicolons inside string
//! literals are handled by the same parser that will later classify the
//! statement.

use std::io::Read;

use pg_query::NodeRef;

use crate::error::ContextualError;

/// One statement from a script, alongside where it started and its parsed AST.
///
/// The AST is kept boxed up inside the statement's own `pg_query::ParseResult`
/// rather than borrowed from a single whole-script parse: `pg_query` does not
/// expose a way to parse once and slice `NodeRef`s with statement-local
/// lifetimes, and parsing twice (the classifier re-parses nothing; this is the
/// only parse) is cheap next to running the statement itself would be.
pub struct ParsedStatement {
    pub sql_text: String,
    /// 1-based line number of the first non-whitespace character of this statement.
    pub line_number: usize,
    parsed: pg_query::ParseResult,
}

impl ParsedStatement {
    /// Borrow this statement's top-level AST node.
    pub fn ast(&self) -> NodeRef<'_> {
        self.parsed.protobuf.stmts[0]
            .stmt
            .as_ref()
            .and_then(|n| n.node.as_ref())
            .expect("pg_query always attaches a node to a top-level stmt")
            .to_ref()
    }
}

impl std::fmt::Debug for ParsedStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedStatement")
            .field("sql_text", &self.sql_text)
            .field("line_number", &self.line_number)
            .finish()
    }
}

/// Strip a leading UTF-8 byte order mark, if present.
fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{feff}').unwrap_or(s)
}

/// 1-based line number of byte offset `at` in `s`, counting `\n` only (a
/// trailing `\r` before it stays on the same line it terminates).
fn line_number_at(s: &str, at: usize) -> usize {
    1 + s.as_bytes()[..at].iter().filter(|&&b| b == b'\n').count()
}

/// Split `script` into statements, discarding empty ones, and parse each.
///
/// `sql_text` keeps the statement's leading whitespace and comments intact,
/// trimmed only of its trailing `;` delimiter (and any whitespace around it);
/// `line_number` is still derived from the first non-whitespace character, not
/// from where `sql_text` itself starts.
pub fn split(script: &str) -> crate::Result<Vec<ParsedStatement>> {
    let script = strip_bom(script);
    let mut out = Vec::new();
    for raw in pg_query::split_with_parser(script)? {
        let raw_offset = raw.as_ptr() as usize - script.as_ptr() as usize;
        let leading_ws = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let line_number = line_number_at(script, raw_offset + leading_ws);
        let parsed = pg_query::parse(trimmed)
            .with_context(format!("failed to parse statement at line {line_number}"))?;
        let sql_text = raw.trim_end();
        let sql_text = sql_text.strip_suffix(';').unwrap_or(sql_text).trim_end();
        out.push(ParsedStatement {
            sql_text: sql_text.to_string(),
            line_number,
            parsed,
        });
    }
    Ok(out)
}

/// Read a migration script from a file path, or stdin when `path` is `"-"`.
pub fn read_script(path: &str) -> crate::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path).with_context(format!("failed to read file: {path}"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_two_statements_and_tracks_line_numbers() {
        let sql = "select 1;\nselect 2;";
        let statements = super::split(sql).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].line_number, 1);
        assert_eq!(statements[1].line_number, 2);
    }

    #[test]
    fn blank_lines_between_statements_advance_the_line_number() {
        let sql = "select 1;\n\n\nselect 2;";
        let statements = super::split(sql).unwrap();
        assert_eq!(statements[1].line_number, 4);
    }

    #[test]
    fn comments_are_retained_but_do_not_confuse_splitting() {
        let sql = "select 1; -- a comment\nselect 2;";
        let statements = super::split(sql).unwrap();
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn dollar_quoted_function_bodies_are_not_split_on_internal_semicolons() {
        let sql = "create or replace function f() returns void as $$\nbegin\n  perform 1;\nend;\n$$ language plpgsql;\nselect 1;";
        let statements = super::split(sql).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].line_number, 6);
    }

    #[test]
    fn byte_order_mark_is_stripped_before_parsing() {
        let sql = "\u{feff}select 1;";
        let statements = super::split(sql).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].sql_text, "select 1");
    }

    #[test]
    fn sql_text_retains_leading_whitespace_and_comments_but_not_the_delimiter() {
        let sql = "select 1;\n  -- a comment\n  select 2;";
        let statements = super::split(sql).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].sql_text, "select 1");
        assert!(!statements[1].sql_text.ends_with(';'));
        assert_eq!(statements[1].sql_text.trim(), "-- a comment\n  select 2");
    }

    #[test]
    fn blank_script_yields_no_statements() {
        let statements = super::split("   \n  \n").unwrap();
        assert!(statements.is_empty());
    }
}
