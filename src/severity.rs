use std::fmt;

/// How urgently a statement's locking behavior should concern a reviewer.
///
/// Totally ordered, weakest to strongest, so a script's overall verdict can be taken as
/// the maximum severity across its statements.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize)]
pub enum Severity {
    /// Metadata-only or read-only; nothing for a reviewer to do.
    Info,
    /// Takes a lock that blocks some concurrent access, bounded in practice.
    Warning,
    /// Blocks whole-table access for an unbounded duration (table scan, full rewrite, ...).
    Critical,
    /// Cannot run in the current transaction mode at all (e.g. `CREATE INDEX CONCURRENTLY`
    /// inside a transaction block).
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
            Severity::Error => "Error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Severity::*;

    #[test]
    fn total_order() {
        assert!(Info < Warning);
        assert!(Warning < Critical);
        assert!(Critical < Error);
    }
}
