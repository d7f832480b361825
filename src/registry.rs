//! The severity registry: `(OperationTag, TransactionMode) -> (Severity, LockStrength)`.
//!
//! A flat, compiled-in table: one row per tag, looked up by a linear scan (the
//! table is small enough that this beats building a hash map at startup for no
//! measurable benefit), with a unit test asserting no duplicate tags.

use crate::classify::tags::*;
use crate::classify::OperationTag;
use crate::pg_types::lock_strength::LockStrength;
use crate::severity::Severity;

pub struct RegistryEntry {
    pub tag: OperationTag,
    pub in_transaction: (Severity, LockStrength),
    pub no_transaction: (Severity, LockStrength),
}

const fn row(
    tag: OperationTag,
    in_tx: (Severity, LockStrength),
    no_tx: (Severity, LockStrength),
) -> RegistryEntry {
    RegistryEntry {
        tag,
        in_transaction: in_tx,
        no_transaction: no_tx,
    }
}

macro_rules! same {
    ($tag:expr, $severity:expr, $lock:expr) => {
        row($tag, ($severity, $lock), ($severity, $lock))
    };
}

/// In-transaction this is disallowed outright (`Error`); outside a transaction it
/// runs but still takes a real, often dangerous, lock (`Warning`).
macro_rules! concurrently_only {
    ($tag:expr, $lock:expr) => {
        row(
            $tag,
            (Severity::Error, $lock),
            (Severity::Warning, $lock),
        )
    };
}

use Severity::{Critical, Info, Warning};
use LockStrength as L;

pub static REGISTRY: &[RegistryEntry] = &[
    // DML
    same!(UPDATE_WITHOUT_WHERE, Critical, L::RowExclusive),
    same!(UPDATE_WITH_WHERE, Warning, L::RowExclusive),
    same!(DELETE_WITHOUT_WHERE, Critical, L::RowExclusive),
    same!(DELETE_WITH_WHERE, Warning, L::RowExclusive),
    same!(MERGE_WITHOUT_WHERE, Critical, L::RowExclusive),
    same!(MERGE_WITH_WHERE, Warning, L::RowExclusive),
    same!(INSERT_ON_CONFLICT, Warning, L::RowExclusive),
    same!(INSERT_SELECT, Warning, L::RowExclusive),
    same!(INSERT, Info, L::RowExclusive),
    same!(COPY_FROM, Warning, L::RowExclusive),
    same!(COPY_TO, Info, L::AccessShare),

    // SELECT
    same!(SELECT, Info, L::AccessShare),
    same!(SELECT_FOR_UPDATE_WITHOUT_WHERE, Warning, L::RowShare),
    same!(SELECT_FOR_UPDATE_WITH_WHERE, Info, L::RowShare),
    same!(SELECT_FOR_NO_KEY_UPDATE_WITHOUT_WHERE, Warning, L::RowShare),
    same!(SELECT_FOR_NO_KEY_UPDATE_WITH_WHERE, Info, L::RowShare),
    same!(SELECT_FOR_SHARE_WITHOUT_WHERE, Warning, L::RowShare),
    same!(SELECT_FOR_SHARE_WITH_WHERE, Info, L::RowShare),
    same!(SELECT_FOR_KEY_SHARE, Info, L::RowShare),

    // CREATE INDEX
    same!(CREATE_INDEX, Critical, L::Share),
    same!(CREATE_UNIQUE_INDEX, Critical, L::Share),
    concurrently_only!(CREATE_INDEX_CONCURRENTLY, L::ShareUpdateExclusive),
    concurrently_only!(CREATE_UNIQUE_INDEX_CONCURRENTLY, L::ShareUpdateExclusive),

    // DROP
    same!(DROP_TABLE, Critical, L::AccessExclusive),
    same!(DROP_INDEX, Critical, L::AccessExclusive),
    concurrently_only!(DROP_INDEX_CONCURRENTLY, L::ShareUpdateExclusive),
    same!(DROP_SCHEMA, Critical, L::AccessExclusive),
    same!(DROP_SCHEMA_CASCADE, Critical, L::AccessExclusive),
    same!(DROP_VIEW, Warning, L::AccessExclusive),
    same!(DROP_MATERIALIZED_VIEW, Critical, L::AccessExclusive),
    same!(DROP_SEQUENCE, Warning, L::AccessExclusive),
    same!(DROP_TYPE, Warning, L::AccessExclusive),
    same!(DROP_DOMAIN, Warning, L::AccessExclusive),
    same!(DROP_FUNCTION, Info, L::AccessExclusive),
    same!(DROP_PROCEDURE, Info, L::AccessExclusive),
    same!(DROP_TRIGGER, Warning, L::AccessExclusive),
    same!(DROP_POLICY, Warning, L::AccessExclusive),
    same!(DROP_RULE, Warning, L::AccessExclusive),
    same!(DROP_EXTENSION, Warning, L::AccessExclusive),
    same!(DROP_PUBLICATION, Info, L::AccessExclusive),
    same!(DROP_SUBSCRIPTION, Warning, L::AccessExclusive),
    row(DROP_DATABASE, (Critical, L::AccessExclusive), (Warning, L::AccessExclusive)),
    row(DROP_TABLESPACE, (Critical, L::AccessExclusive), (Warning, L::AccessExclusive)),
    same!(DROP_SERVER, Info, L::AccessExclusive),
    same!(DROP_FOREIGN_DATA_WRAPPER, Info, L::AccessExclusive),
    same!(DROP_ROLE, Info, L::AccessExclusive),
    same!(DROP_EVENT_TRIGGER, Info, L::AccessExclusive),
    same!(DROP_STATISTICS, Info, L::ShareUpdateExclusive),
    same!(DROP_CAST, Info, L::AccessExclusive),
    same!(DROP_COLLATION, Info, L::AccessExclusive),
    same!(DROP_AGGREGATE, Info, L::AccessExclusive),
    same!(DROP_OPERATOR, Info, L::AccessExclusive),
    same!(DROP_TEXT_SEARCH_CONFIGURATION, Info, L::AccessExclusive),
    same!(DROP_TEXT_SEARCH_DICTIONARY, Info, L::AccessExclusive),
    same!(DROP_TEXT_SEARCH_PARSER, Info, L::AccessExclusive),
    same!(DROP_TEXT_SEARCH_TEMPLATE, Info, L::AccessExclusive),
    same!(DROP_USER_MAPPING, Info, L::AccessExclusive),

    // REINDEX
    same!(REINDEX, Critical, L::AccessExclusive),
    same!(REINDEX_TABLE, Critical, L::AccessExclusive),
    same!(REINDEX_SCHEMA, Critical, L::AccessExclusive),
    same!(REINDEX_DATABASE, Critical, L::AccessExclusive),
    same!(REINDEX_SYSTEM, Critical, L::AccessExclusive),
    concurrently_only!(REINDEX_CONCURRENTLY, L::ShareUpdateExclusive),

    // VACUUM / ANALYZE
    concurrently_only!(VACUUM, L::ShareUpdateExclusive),
    same!(VACUUM_FULL, Critical, L::AccessExclusive),
    concurrently_only!(VACUUM_FREEZE, L::ShareUpdateExclusive),
    concurrently_only!(VACUUM_ANALYZE, L::ShareUpdateExclusive),
    same!(VACUUM_FULL_ANALYZE, Critical, L::AccessExclusive),
    same!(ANALYZE, Info, L::ShareUpdateExclusive),

    // ALTER TABLE
    same!(ALTER_TABLE_ADD_COLUMN_WITHOUT_DEFAULT, Info, L::AccessExclusive),
    same!(ALTER_TABLE_ADD_COLUMN_WITH_CONSTANT_DEFAULT, Info, L::AccessExclusive),
    same!(ALTER_TABLE_ADD_COLUMN_WITH_VOLATILE_DEFAULT, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_ADD_COLUMN_GENERATED_ALWAYS_AS, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_ADD_PRIMARY_KEY, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_ADD_CONSTRAINT_UNIQUE, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_ADD_CONSTRAINT_EXCLUDE, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_ADD_CONSTRAINT_FOREIGN_KEY, Warning, L::ShareRowExclusive),
    same!(ALTER_TABLE_ADD_CONSTRAINT_CHECK, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_ADD_CONSTRAINT_NOT_VALID, Warning, L::AccessExclusive),
    same!(ALTER_TABLE_ALTER_COLUMN_TYPE, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_DROP_COLUMN, Warning, L::AccessExclusive),
    same!(ALTER_TABLE_SET_TABLESPACE, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_SET_LOGGED, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_SET_UNLOGGED, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_SET_NOT_NULL, Critical, L::AccessExclusive),
    same!(ALTER_TABLE_DROP_NOT_NULL, Info, L::AccessExclusive),
    same!(ALTER_TABLE_SET_DEFAULT, Info, L::AccessExclusive),
    same!(ALTER_TABLE_DROP_DEFAULT, Info, L::AccessExclusive),
    same!(ALTER_TABLE_ATTACH_PARTITION, Warning, L::ShareUpdateExclusive),
    same!(ALTER_TABLE_DETACH_PARTITION, Warning, L::ShareUpdateExclusive),
    concurrently_only!(ALTER_TABLE_DETACH_PARTITION_CONCURRENTLY, L::ShareUpdateExclusive),
    same!(ALTER_TABLE_INHERIT, Warning, L::ShareUpdateExclusive),
    same!(ALTER_TABLE_NO_INHERIT, Warning, L::ShareUpdateExclusive),
    same!(ALTER_TABLE_SET_STORAGE_PARAMS, Warning, L::ShareUpdateExclusive),
    same!(ALTER_TABLE_RESET_STORAGE_PARAMS, Warning, L::ShareUpdateExclusive),
    same!(ALTER_TABLE_SET_STATISTICS, Info, L::ShareUpdateExclusive),
    same!(ALTER_TABLE_SET_STORAGE, Warning, L::AccessExclusive),
    same!(ALTER_TABLE_CLUSTER_ON, Info, L::AccessExclusive),
    same!(ALTER_TABLE_SET_WITHOUT_CLUSTER, Info, L::AccessExclusive),
    same!(ALTER_TABLE_ENABLE_ROW_LEVEL_SECURITY, Info, L::AccessExclusive),
    same!(ALTER_TABLE_DISABLE_ROW_LEVEL_SECURITY, Info, L::AccessExclusive),
    same!(ALTER_TABLE_ENABLE_TRIGGER, Warning, L::ShareRowExclusive),
    same!(ALTER_TABLE_DISABLE_TRIGGER, Warning, L::ShareRowExclusive),
    same!(ALTER_TABLE_ENABLE_RULE, Warning, L::AccessExclusive),
    same!(ALTER_TABLE_DISABLE_RULE, Warning, L::AccessExclusive),
    same!(ALTER_TABLE_REPLICA_IDENTITY, Info, L::AccessExclusive),
    same!(ALTER_TABLE_OWNER_TO, Info, L::AccessExclusive),

    // Transaction control
    same!(BEGIN, Info, L::None),
    same!(COMMIT, Info, L::None),
    same!(ROLLBACK, Info, L::None),
    same!(SAVEPOINT, Info, L::None),
    same!(RELEASE_SAVEPOINT, Info, L::None),
    same!(ROLLBACK_TO_SAVEPOINT, Info, L::None),
    same!(SET_TRANSACTION, Info, L::None),

    // LOCK TABLE
    same!(LOCK_TABLE_ACCESS_SHARE, Info, L::AccessShare),
    same!(LOCK_TABLE_ROW_SHARE, Info, L::RowShare),
    same!(LOCK_TABLE_ROW_EXCLUSIVE, Warning, L::RowExclusive),
    same!(LOCK_TABLE_SHARE_UPDATE_EXCLUSIVE, Warning, L::ShareUpdateExclusive),
    same!(LOCK_TABLE_SHARE, Warning, L::Share),
    same!(LOCK_TABLE_SHARE_ROW_EXCLUSIVE, Warning, L::ShareRowExclusive),
    same!(LOCK_TABLE_EXCLUSIVE, Critical, L::Exclusive),
    same!(LOCK_TABLE_ACCESS_EXCLUSIVE, Critical, L::AccessExclusive),

    // GRANT / REVOKE
    same!(GRANT_TABLE, Info, L::AccessExclusive),
    same!(REVOKE_TABLE, Info, L::AccessExclusive),
    same!(GRANT_SCHEMA, Info, L::AccessExclusive),
    same!(REVOKE_SCHEMA, Info, L::AccessExclusive),
    same!(GRANT_SEQUENCE, Info, L::AccessExclusive),
    same!(REVOKE_SEQUENCE, Info, L::AccessExclusive),
    same!(GRANT_FUNCTION, Info, L::AccessExclusive),
    same!(REVOKE_FUNCTION, Info, L::AccessExclusive),
    same!(GRANT_DATABASE, Info, L::AccessExclusive),
    same!(REVOKE_DATABASE, Info, L::AccessExclusive),

    // Misc single statements
    row(ALTER_SYSTEM, (Severity::Error, L::AccessExclusive), (Info, L::AccessExclusive)),
    same!(CHECKPOINT, Info, L::None),
    same!(LOAD, Info, L::None),
    same!(SET, Info, L::None),
    same!(SET_LOCAL, Info, L::None),
    same!(RESET, Info, L::None),
    same!(COMMENT_ON, Info, L::ShareUpdateExclusive),

    // Administrative CREATE/ALTER
    row(CREATE_DATABASE, (Severity::Error, L::AccessExclusive), (Warning, L::AccessExclusive)),
    row(ALTER_DATABASE, (Severity::Error, L::AccessExclusive), (Warning, L::AccessExclusive)),
    same!(CREATE_TABLESPACE, Warning, L::AccessExclusive),
    same!(ALTER_TABLESPACE, Info, L::AccessExclusive),
    row(CREATE_SUBSCRIPTION, (Severity::Error, L::AccessExclusive), (Warning, L::AccessExclusive)),
    same!(ALTER_SUBSCRIPTION, Warning, L::AccessExclusive),
    same!(CREATE_PUBLICATION, Info, L::AccessExclusive),
    same!(ALTER_PUBLICATION, Info, L::AccessExclusive),
    same!(CREATE_TYPE, Info, L::AccessExclusive),
    same!(CREATE_DOMAIN, Info, L::AccessExclusive),
    same!(CREATE_EXTENSION, Warning, L::AccessExclusive),
    same!(CREATE_FUNCTION, Info, L::AccessExclusive),
    same!(CREATE_PROCEDURE, Info, L::AccessExclusive),
    same!(CREATE_SEQUENCE, Info, L::AccessExclusive),
    same!(CREATE_VIEW, Info, L::AccessExclusive),
    same!(CREATE_MATERIALIZED_VIEW, Warning, L::AccessExclusive),
    same!(CREATE_SCHEMA, Info, L::AccessExclusive),
    same!(CREATE_TRIGGER, Warning, L::ShareRowExclusive),
    same!(CREATE_RULE, Warning, L::AccessExclusive),
    same!(CREATE_POLICY, Warning, L::AccessExclusive),
    same!(CREATE_FOREIGN_DATA_WRAPPER, Info, L::AccessExclusive),
    same!(CREATE_SERVER, Info, L::AccessExclusive),
    same!(CREATE_USER_MAPPING, Info, L::AccessExclusive),
    same!(CREATE_ROLE, Info, L::AccessExclusive),
    same!(CREATE_EVENT_TRIGGER, Info, L::AccessExclusive),
    same!(CREATE_STATISTICS, Info, L::ShareUpdateExclusive),
    same!(CREATE_CAST, Info, L::AccessExclusive),
    same!(CREATE_COLLATION, Info, L::AccessExclusive),
    same!(CREATE_AGGREGATE, Info, L::AccessExclusive),
    same!(CREATE_OPERATOR, Info, L::AccessExclusive),
    same!(CREATE_TEXT_SEARCH_CONFIGURATION, Info, L::AccessExclusive),
    same!(CREATE_TEXT_SEARCH_DICTIONARY, Info, L::AccessExclusive),
    same!(CREATE_TEXT_SEARCH_PARSER, Info, L::AccessExclusive),
    same!(CREATE_TEXT_SEARCH_TEMPLATE, Info, L::AccessExclusive),

    // CREATE TABLE family
    same!(CREATE_TABLE, Info, L::AccessExclusive),
    same!(CREATE_TABLE_AS, Warning, L::AccessExclusive),

    // TRUNCATE / CLUSTER / REFRESH MATERIALIZED VIEW
    same!(TRUNCATE, Critical, L::AccessExclusive),
    same!(CLUSTER, Critical, L::AccessExclusive),
    same!(REFRESH_MATERIALIZED_VIEW, Critical, L::AccessExclusive),
    same!(REFRESH_MATERIALIZED_VIEW_CONCURRENTLY, Warning, L::Exclusive),
];

/// `(OperationTag, TransactionMode) -> (Severity, LockStrength)`, falling back to
/// `(Info, AccessShare)` for tags the table doesn't know about.
pub fn lookup(tag: OperationTag, in_transaction: bool) -> (Severity, LockStrength) {
    REGISTRY
        .iter()
        .find(|entry| entry.tag == tag)
        .map(|entry| {
            if in_transaction {
                entry.in_transaction
            } else {
                entry.no_transaction
            }
        })
        .unwrap_or((Info, L::AccessShare))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn no_duplicate_tags() {
        let mut seen = HashSet::new();
        for entry in REGISTRY {
            assert!(seen.insert(entry.tag.as_str()), "duplicate tag: {}", entry.tag);
        }
    }

    #[test]
    fn unknown_tag_falls_back_to_info_access_share() {
        let unknown = OperationTag("NOT A REAL TAG");
        assert_eq!(lookup(unknown, true), (Info, L::AccessShare));
        assert_eq!(lookup(unknown, false), (Info, L::AccessShare));
    }

    #[test]
    fn update_without_where_is_critical_in_both_modes() {
        assert_eq!(lookup(UPDATE_WITHOUT_WHERE, true).0, Critical);
        assert_eq!(lookup(UPDATE_WITHOUT_WHERE, false).0, Critical);
    }

    #[test]
    fn create_index_concurrently_is_error_only_in_transaction() {
        assert_eq!(lookup(CREATE_INDEX_CONCURRENTLY, true).0, Severity::Error);
        assert_eq!(lookup(CREATE_INDEX_CONCURRENTLY, false).0, Warning);
    }
}
