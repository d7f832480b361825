use crate::pg_types::lock_strength::LockStrength::*;

/// One of PostgreSQL's eight table-lock modes, plus a sentinel for statements that
/// take no table lock at all (used for statements classified as [`crate::Severity::Error`]).
///
/// Variants are declared weakest to strongest; the derived [`Ord`] implementation is the
/// total order callers rely on.
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum LockStrength {
    /// No table lock is taken; the statement cannot execute (paired with `Severity::Error`).
    None,
    AccessShare,
    RowShare,
    RowExclusive,
    ShareUpdateExclusive,
    Share,
    ShareRowExclusive,
    Exclusive,
    AccessExclusive,
}

/// All eight real lock modes, weakest to strongest. Excludes [`LockStrength::None`].
pub const LOCK_MODES: [LockStrength; 8] = [
    AccessShare,
    RowShare,
    RowExclusive,
    ShareUpdateExclusive,
    Share,
    ShareRowExclusive,
    Exclusive,
    AccessExclusive,
];

/// Operations enabled by holding each lock mode. Not exhaustive: `ALTER TABLE` appears
/// under several modes because different sub-commands take different locks, and most
/// forms still require `ACCESS EXCLUSIVE`. See
/// <https://www.postgresql.org/docs/current/explicit-locking.html>.
mod capabilities {
    pub const ACCESS_SHARE: [&str; 1] = ["SELECT"];
    pub const ROW_SHARE: [&str; 4] = [
        "FOR UPDATE",
        "FOR NO KEY UPDATE",
        "FOR SHARE",
        "FOR KEY SHARE",
    ];
    pub const ROW_EXCLUSIVE: [&str; 4] = ["UPDATE", "DELETE", "INSERT", "MERGE"];
    pub const SHARE_UPDATE_EXCLUSIVE: [&str; 7] = [
        "VACUUM",
        "ANALYZE",
        "CREATE INDEX CONCURRENTLY",
        "CREATE STATISTICS",
        "REINDEX CONCURRENTLY",
        "ALTER INDEX",
        "ALTER TABLE",
    ];
    pub const SHARE: [&str; 1] = ["CREATE INDEX"];
    pub const SHARE_ROW_EXCLUSIVE: [&str; 2] = ["CREATE TRIGGER", "ALTER TABLE"];
    pub const EXCLUSIVE: [&str; 1] = ["REFRESH MATERIALIZED VIEW CONCURRENTLY"];
    pub const ACCESS_EXCLUSIVE: [&str; 7] = [
        "ALTER TABLE",
        "DROP TABLE",
        "TRUNCATE",
        "REINDEX",
        "CLUSTER",
        "VACUUM FULL",
        "REFRESH MATERIALIZED VIEW",
    ];
    pub const NONE: [&str; 0] = [];
}

/// Capabilities commonly required by OLTP application code; blocking these is "dangerous".
pub const QUERY_CAPABILITIES: [&str; 9] = [
    "SELECT",
    "FOR UPDATE",
    "FOR NO KEY UPDATE",
    "FOR SHARE",
    "FOR KEY SHARE",
    "UPDATE",
    "DELETE",
    "INSERT",
    "MERGE",
];

impl std::fmt::Display for LockStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl LockStrength {
    /// Convert from a string that may be found in the `pg_locks.mode` column.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "AccessShareLock" => Some(AccessShare),
            "RowShareLock" => Some(RowShare),
            "RowExclusiveLock" => Some(RowExclusive),
            "ShareUpdateExclusiveLock" => Some(ShareUpdateExclusive),
            "ShareLock" => Some(Share),
            "ShareRowExclusiveLock" => Some(ShareRowExclusive),
            "ExclusiveLock" => Some(Exclusive),
            "AccessExclusiveLock" => Some(AccessExclusive),
            _ => None,
        }
    }

    /// The name used in `pg_locks.mode`, or `""` for [`LockStrength::None`] — this is the
    /// value the output boundary emits for `Error`-severity statements.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            None => "",
            AccessShare => "AccessShareLock",
            RowShare => "RowShareLock",
            RowExclusive => "RowExclusiveLock",
            ShareUpdateExclusive => "ShareUpdateExclusiveLock",
            Share => "ShareLock",
            ShareRowExclusive => "ShareRowExclusiveLock",
            Exclusive => "ExclusiveLock",
            AccessExclusive => "AccessExclusiveLock",
        }
    }

    /// What lock modes this lock mode conflicts with.
    pub fn conflicts_with(&self) -> &'static [LockStrength] {
        match self {
            None => &[],
            AccessShare => &[AccessExclusive],
            RowShare => &[Exclusive, AccessExclusive],
            RowExclusive => &[Share, ShareRowExclusive, Exclusive, AccessExclusive],
            ShareUpdateExclusive => &[
                ShareUpdateExclusive,
                Share,
                ShareRowExclusive,
                Exclusive,
                AccessExclusive,
            ],
            Share => &[
                RowExclusive,
                ShareUpdateExclusive,
                ShareRowExclusive,
                Exclusive,
                AccessExclusive,
            ],
            ShareRowExclusive => &[
                RowExclusive,
                ShareUpdateExclusive,
                Share,
                ShareRowExclusive,
                Exclusive,
                AccessExclusive,
            ],
            Exclusive => &[
                RowShare,
                RowExclusive,
                ShareUpdateExclusive,
                Share,
                ShareRowExclusive,
                Exclusive,
                AccessExclusive,
            ],
            AccessExclusive => &LOCK_MODES,
        }
    }

    /// What capabilities this lock mode is used for.
    pub fn capabilities(&self) -> &'static [&'static str] {
        match self {
            None => &capabilities::NONE,
            AccessShare => &capabilities::ACCESS_SHARE,
            RowShare => &capabilities::ROW_SHARE,
            RowExclusive => &capabilities::ROW_EXCLUSIVE,
            ShareUpdateExclusive => &capabilities::SHARE_UPDATE_EXCLUSIVE,
            Share => &capabilities::SHARE,
            ShareRowExclusive => &capabilities::SHARE_ROW_EXCLUSIVE,
            Exclusive => &capabilities::EXCLUSIVE,
            AccessExclusive => &capabilities::ACCESS_EXCLUSIVE,
        }
    }

    /// What queries this lock mode blocks.
    pub fn blocked_queries(&self) -> Vec<&'static str> {
        self.conflicts_with()
            .iter()
            .flat_map(|lock| lock.capabilities().iter().copied())
            .filter(|cap| QUERY_CAPABILITIES.contains(cap))
            .collect()
    }

    /// What DDL statements this lock mode blocks.
    pub fn blocked_ddl(&self) -> Vec<&'static str> {
        self.conflicts_with()
            .iter()
            .flat_map(|lock| lock.capabilities().iter().copied())
            .filter(|cap| !QUERY_CAPABILITIES.contains(cap))
            .collect()
    }

    /// Whether this lock mode blocks any common OLTP operation.
    pub fn dangerous(&self) -> bool {
        self.conflicts_with()
            .iter()
            .flat_map(|lock| lock.capabilities().iter().copied())
            .any(|cap| QUERY_CAPABILITIES.contains(&cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order_is_weakest_to_strongest() {
        assert!(LockStrength::None < LockStrength::AccessShare);
        assert!(LockStrength::AccessShare < LockStrength::RowShare);
        assert!(LockStrength::Exclusive < LockStrength::AccessExclusive);
    }

    #[test]
    fn locks_that_block_select_are_dangerous() {
        LOCK_MODES
            .iter()
            .filter(|lock| lock.capabilities().contains(&"SELECT"))
            .flat_map(|lock| lock.conflicts_with().iter())
            .for_each(|lock| assert!(lock.dangerous()));
    }

    #[test]
    fn locks_that_block_update_are_dangerous() {
        LOCK_MODES
            .iter()
            .filter(|lock| lock.capabilities().contains(&"UPDATE"))
            .flat_map(|lock| lock.conflicts_with().iter())
            .for_each(|lock| assert!(lock.dangerous()));
    }

    #[test]
    fn none_has_no_capabilities_and_never_conflicts() {
        assert!(LockStrength::None.capabilities().is_empty());
        assert!(LockStrength::None.conflicts_with().is_empty());
        assert_eq!(LockStrength::None.as_db_str(), "");
    }
}
