//! Identifier quoting: decide whether a PostgreSQL identifier needs double-quoting
//! and produce canonical quoted/qualified forms.

/// PostgreSQL reserved keywords (SQL-standard reserved words plus PostgreSQL-specific
/// additions) that force quoting even when the identifier is otherwise lexically
/// plain. Kept as a sorted slice so lookup is a binary search, consistent with the
/// flat compiled-in data tables elsewhere in this crate.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "between", "bigint", "binary", "bit", "boolean", "both", "case",
    "cast", "char", "character", "check", "coalesce", "collate", "collation", "column",
    "concurrently", "constraint", "create", "cross", "current_catalog", "current_date",
    "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "dec", "decimal", "default", "deferrable", "desc", "distinct",
    "do", "else", "end", "except", "exists", "extract", "false", "fetch", "float",
    "for", "foreign", "freeze", "from", "full", "grant", "greatest", "group",
    "grouping", "having", "ilike", "in", "initially", "inner", "inout", "int",
    "integer", "intersect", "interval", "into", "is", "isnull", "join", "lateral",
    "leading", "least", "left", "like", "limit", "localtime", "localtimestamp",
    "national", "natural", "nchar", "none", "not", "notnull", "null", "nullif",
    "numeric", "offset", "on", "only", "or", "order", "out", "outer", "overlaps",
    "overlay", "placing", "position", "precision", "primary", "real", "references",
    "returning", "right", "row", "select", "session_user", "setof", "similar",
    "smallint", "some", "substring", "symmetric", "table", "tablesample", "then",
    "time", "timestamp", "to", "trailing", "treat", "trim", "true", "union", "unique",
    "user", "using", "values", "varchar", "variadic", "verbose", "when", "where",
    "window", "with", "xmlattributes", "xmlconcat", "xmlelement", "xmlexists",
    "xmlforest", "xmlparse", "xmlpi", "xmlroot", "xmlserialize", "xmltable",
];

fn is_reserved(lower: &str) -> bool {
    RESERVED_WORDS.binary_search(&lower).is_ok()
}

fn is_bare_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    is_reserved(&s.to_lowercase()) || !is_bare_identifier(s)
}

fn is_already_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

/// Quote `s` if required, leaving already-quoted identifiers unchanged.
pub fn quote(s: &str) -> String {
    if is_already_quoted(s) {
        return s.to_string();
    }
    if needs_quoting(s) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Qualify `name` with `schema` when present, quoting each component independently.
pub fn qualify(schema: Option<&str>, name: &str) -> String {
    match schema {
        Some(s) if !s.is_empty() => format!("{}.{}", quote(s), quote(name)),
        _ => quote(name),
    }
}

/// Reverse [`quote`] for comparison purposes: strips surrounding quotes and
/// undoubles embedded `""`.
pub fn unquote(s: &str) -> String {
    if is_already_quoted(s) {
        s[1..s.len() - 1].replace("\"\"", "\"")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_identifiers_pass_through() {
        assert_eq!(quote("users"), "users");
        assert_eq!(quote("user_id"), "user_id");
    }

    #[test]
    fn reserved_words_are_quoted() {
        assert_eq!(quote("user"), "\"user\"");
        assert_eq!(quote("order"), "\"order\"");
        assert_eq!(quote("select"), "\"select\"");
    }

    #[test]
    fn mixed_case_requires_quoting_to_preserve_case() {
        assert_eq!(quote("UserTable"), "\"UserTable\"");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(quote("weird\"name"), "\"weird\"\"name\"");
    }

    #[test]
    fn already_quoted_is_unchanged() {
        assert_eq!(quote("\"already\""), "\"already\"");
    }

    #[test]
    fn qualify_with_and_without_schema() {
        assert_eq!(qualify(Some("public"), "users"), "public.users");
        assert_eq!(qualify(None, "users"), "users");
        assert_eq!(qualify(Some("public"), "order"), "public.\"order\"");
    }

    #[test]
    fn round_trip_unquote_quote() {
        for s in ["users", "user", "UserTable", "weird\"name"] {
            assert_eq!(unquote(&quote(s)), s);
        }
    }

    #[test]
    fn quote_is_idempotent() {
        let once = quote("order");
        assert_eq!(quote(&once), once);
    }
}
