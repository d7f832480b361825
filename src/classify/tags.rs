use std::fmt;

/// A canonical label identifying a statement's shape+modifier combination.
///
/// The set of values is closed and compiled in (hence `&'static str`, not `String`):
/// every value this module hands out is one of the constants declared below, so
/// [`crate::registry`] and [`crate::suggest::catalog`] can key their tables on
/// plain string comparisons without ever seeing an unexpected tag.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct OperationTag(pub &'static str);

impl OperationTag {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! tags {
    ($($name:ident = $lit:literal;)*) => {
        $(pub const $name: OperationTag = OperationTag($lit);)*
    };
}

tags! {
    // DML shape distinctions
    UPDATE_WITH_WHERE = "UPDATE with WHERE";
    UPDATE_WITHOUT_WHERE = "UPDATE without WHERE";
    DELETE_WITH_WHERE = "DELETE with WHERE";
    DELETE_WITHOUT_WHERE = "DELETE without WHERE";
    MERGE_WITH_WHERE = "MERGE with WHERE";
    MERGE_WITHOUT_WHERE = "MERGE without WHERE";
    INSERT_ON_CONFLICT = "INSERT ON CONFLICT";
    INSERT_SELECT = "INSERT SELECT";
    INSERT = "INSERT";
    COPY_FROM = "COPY FROM";
    COPY_TO = "COPY TO";

    // SELECT locking clauses
    SELECT = "SELECT";
    SELECT_FOR_UPDATE_WITH_WHERE = "SELECT FOR UPDATE with WHERE";
    SELECT_FOR_UPDATE_WITHOUT_WHERE = "SELECT FOR UPDATE without WHERE";
    SELECT_FOR_NO_KEY_UPDATE_WITH_WHERE = "SELECT FOR NO KEY UPDATE with WHERE";
    SELECT_FOR_NO_KEY_UPDATE_WITHOUT_WHERE = "SELECT FOR NO KEY UPDATE without WHERE";
    SELECT_FOR_SHARE_WITH_WHERE = "SELECT FOR SHARE with WHERE";
    SELECT_FOR_SHARE_WITHOUT_WHERE = "SELECT FOR SHARE without WHERE";
    SELECT_FOR_KEY_SHARE = "SELECT FOR KEY SHARE";

    // CREATE INDEX
    CREATE_INDEX = "CREATE INDEX";
    CREATE_UNIQUE_INDEX = "CREATE UNIQUE INDEX";
    CREATE_INDEX_CONCURRENTLY = "CREATE INDEX CONCURRENTLY";
    CREATE_UNIQUE_INDEX_CONCURRENTLY = "CREATE UNIQUE INDEX CONCURRENTLY";

    // DROP
    DROP_TABLE = "DROP TABLE";
    DROP_INDEX = "DROP INDEX";
    DROP_INDEX_CONCURRENTLY = "DROP INDEX CONCURRENTLY";
    DROP_SCHEMA = "DROP SCHEMA";
    DROP_SCHEMA_CASCADE = "DROP SCHEMA CASCADE";
    DROP_VIEW = "DROP VIEW";
    DROP_MATERIALIZED_VIEW = "DROP MATERIALIZED VIEW";
    DROP_SEQUENCE = "DROP SEQUENCE";
    DROP_TYPE = "DROP TYPE";
    DROP_DOMAIN = "DROP DOMAIN";
    DROP_FUNCTION = "DROP FUNCTION";
    DROP_PROCEDURE = "DROP PROCEDURE";
    DROP_TRIGGER = "DROP TRIGGER";
    DROP_POLICY = "DROP POLICY";
    DROP_RULE = "DROP RULE";
    DROP_EXTENSION = "DROP EXTENSION";
    DROP_PUBLICATION = "DROP PUBLICATION";
    DROP_SUBSCRIPTION = "DROP SUBSCRIPTION";
    DROP_DATABASE = "DROP DATABASE";
    DROP_TABLESPACE = "DROP TABLESPACE";
    DROP_SERVER = "DROP SERVER";
    DROP_FOREIGN_DATA_WRAPPER = "DROP FOREIGN DATA WRAPPER";
    DROP_ROLE = "DROP ROLE";
    DROP_EVENT_TRIGGER = "DROP EVENT TRIGGER";
    DROP_STATISTICS = "DROP STATISTICS";
    DROP_CAST = "DROP CAST";
    DROP_COLLATION = "DROP COLLATION";
    DROP_AGGREGATE = "DROP AGGREGATE";
    DROP_OPERATOR = "DROP OPERATOR";
    DROP_TEXT_SEARCH_CONFIGURATION = "DROP TEXT SEARCH CONFIGURATION";
    DROP_TEXT_SEARCH_DICTIONARY = "DROP TEXT SEARCH DICTIONARY";
    DROP_TEXT_SEARCH_PARSER = "DROP TEXT SEARCH PARSER";
    DROP_TEXT_SEARCH_TEMPLATE = "DROP TEXT SEARCH TEMPLATE";
    DROP_USER_MAPPING = "DROP USER MAPPING";

    // REINDEX
    REINDEX = "REINDEX";
    REINDEX_TABLE = "REINDEX TABLE";
    REINDEX_SCHEMA = "REINDEX SCHEMA";
    REINDEX_DATABASE = "REINDEX DATABASE";
    REINDEX_SYSTEM = "REINDEX SYSTEM";
    REINDEX_CONCURRENTLY = "REINDEX CONCURRENTLY";

    // VACUUM / ANALYZE
    VACUUM = "VACUUM";
    VACUUM_FULL = "VACUUM FULL";
    VACUUM_FREEZE = "VACUUM FREEZE";
    VACUUM_ANALYZE = "VACUUM ANALYZE";
    VACUUM_FULL_ANALYZE = "VACUUM FULL ANALYZE";
    ANALYZE = "ANALYZE";

    // ALTER TABLE
    ALTER_TABLE_ADD_COLUMN_WITHOUT_DEFAULT = "ALTER TABLE ADD COLUMN without DEFAULT";
    ALTER_TABLE_ADD_COLUMN_WITH_CONSTANT_DEFAULT = "ALTER TABLE ADD COLUMN with constant DEFAULT";
    ALTER_TABLE_ADD_COLUMN_WITH_VOLATILE_DEFAULT = "ALTER TABLE ADD COLUMN with volatile DEFAULT";
    ALTER_TABLE_ADD_COLUMN_GENERATED_ALWAYS_AS = "ALTER TABLE ADD COLUMN GENERATED ALWAYS AS";
    ALTER_TABLE_ADD_PRIMARY_KEY = "ALTER TABLE ADD PRIMARY KEY";
    ALTER_TABLE_ADD_CONSTRAINT_UNIQUE = "ALTER TABLE ADD CONSTRAINT UNIQUE";
    ALTER_TABLE_ADD_CONSTRAINT_EXCLUDE = "ALTER TABLE ADD CONSTRAINT EXCLUDE";
    ALTER_TABLE_ADD_CONSTRAINT_FOREIGN_KEY = "ALTER TABLE ADD CONSTRAINT FOREIGN KEY";
    ALTER_TABLE_ADD_CONSTRAINT_CHECK = "ALTER TABLE ADD CONSTRAINT CHECK";
    ALTER_TABLE_ADD_CONSTRAINT_NOT_VALID = "ALTER TABLE ADD CONSTRAINT NOT VALID";
    ALTER_TABLE_ALTER_COLUMN_TYPE = "ALTER TABLE ALTER COLUMN TYPE";
    ALTER_TABLE_DROP_COLUMN = "ALTER TABLE DROP COLUMN";
    ALTER_TABLE_SET_TABLESPACE = "ALTER TABLE SET TABLESPACE";
    ALTER_TABLE_SET_LOGGED = "ALTER TABLE SET LOGGED";
    ALTER_TABLE_SET_UNLOGGED = "ALTER TABLE SET UNLOGGED";
    ALTER_TABLE_SET_NOT_NULL = "ALTER TABLE SET NOT NULL";
    ALTER_TABLE_DROP_NOT_NULL = "ALTER TABLE DROP NOT NULL";
    ALTER_TABLE_SET_DEFAULT = "ALTER TABLE SET DEFAULT";
    ALTER_TABLE_DROP_DEFAULT = "ALTER TABLE DROP DEFAULT";
    ALTER_TABLE_ATTACH_PARTITION = "ALTER TABLE ATTACH PARTITION";
    ALTER_TABLE_DETACH_PARTITION = "ALTER TABLE DETACH PARTITION";
    ALTER_TABLE_DETACH_PARTITION_CONCURRENTLY = "ALTER TABLE DETACH PARTITION CONCURRENTLY";
    ALTER_TABLE_INHERIT = "ALTER TABLE INHERIT";
    ALTER_TABLE_NO_INHERIT = "ALTER TABLE NO INHERIT";
    ALTER_TABLE_SET_STORAGE_PARAMS = "ALTER TABLE SET storage params";
    ALTER_TABLE_RESET_STORAGE_PARAMS = "ALTER TABLE RESET storage params";
    ALTER_TABLE_SET_STATISTICS = "ALTER TABLE SET STATISTICS";
    ALTER_TABLE_SET_STORAGE = "ALTER TABLE SET STORAGE";
    ALTER_TABLE_CLUSTER_ON = "ALTER TABLE CLUSTER ON";
    ALTER_TABLE_SET_WITHOUT_CLUSTER = "ALTER TABLE SET WITHOUT CLUSTER";
    ALTER_TABLE_ENABLE_ROW_LEVEL_SECURITY = "ALTER TABLE ENABLE ROW LEVEL SECURITY";
    ALTER_TABLE_DISABLE_ROW_LEVEL_SECURITY = "ALTER TABLE DISABLE ROW LEVEL SECURITY";
    ALTER_TABLE_ENABLE_TRIGGER = "ALTER TABLE ENABLE TRIGGER";
    ALTER_TABLE_DISABLE_TRIGGER = "ALTER TABLE DISABLE TRIGGER";
    ALTER_TABLE_ENABLE_RULE = "ALTER TABLE ENABLE RULE";
    ALTER_TABLE_DISABLE_RULE = "ALTER TABLE DISABLE RULE";
    ALTER_TABLE_REPLICA_IDENTITY = "ALTER TABLE REPLICA IDENTITY";
    ALTER_TABLE_OWNER_TO = "ALTER TABLE OWNER TO";

    // Transaction control
    BEGIN = "BEGIN";
    COMMIT = "COMMIT";
    ROLLBACK = "ROLLBACK";
    SAVEPOINT = "SAVEPOINT";
    RELEASE_SAVEPOINT = "RELEASE SAVEPOINT";
    ROLLBACK_TO_SAVEPOINT = "ROLLBACK TO SAVEPOINT";
    SET_TRANSACTION = "SET TRANSACTION";

    // LOCK TABLE, one tag per mode
    LOCK_TABLE_ACCESS_SHARE = "LOCK TABLE ACCESS SHARE";
    LOCK_TABLE_ROW_SHARE = "LOCK TABLE ROW SHARE";
    LOCK_TABLE_ROW_EXCLUSIVE = "LOCK TABLE ROW EXCLUSIVE";
    LOCK_TABLE_SHARE_UPDATE_EXCLUSIVE = "LOCK TABLE SHARE UPDATE EXCLUSIVE";
    LOCK_TABLE_SHARE = "LOCK TABLE SHARE";
    LOCK_TABLE_SHARE_ROW_EXCLUSIVE = "LOCK TABLE SHARE ROW EXCLUSIVE";
    LOCK_TABLE_EXCLUSIVE = "LOCK TABLE EXCLUSIVE";
    LOCK_TABLE_ACCESS_EXCLUSIVE = "LOCK TABLE ACCESS EXCLUSIVE";

    // GRANT / REVOKE (generic object-type suffix)
    GRANT_TABLE = "GRANT TABLE";
    REVOKE_TABLE = "REVOKE TABLE";
    GRANT_SCHEMA = "GRANT SCHEMA";
    REVOKE_SCHEMA = "REVOKE SCHEMA";
    GRANT_SEQUENCE = "GRANT SEQUENCE";
    REVOKE_SEQUENCE = "REVOKE SEQUENCE";
    GRANT_FUNCTION = "GRANT FUNCTION";
    REVOKE_FUNCTION = "REVOKE FUNCTION";
    GRANT_DATABASE = "GRANT DATABASE";
    REVOKE_DATABASE = "REVOKE DATABASE";

    // Misc single statements
    ALTER_SYSTEM = "ALTER SYSTEM";
    CHECKPOINT = "CHECKPOINT";
    LOAD = "LOAD";
    SET = "SET";
    SET_LOCAL = "SET LOCAL";
    RESET = "RESET";
    COMMENT_ON = "COMMENT ON";

    // CREATE/ALTER for administrative object types (tail of 4.3's misc list)
    CREATE_DATABASE = "CREATE DATABASE";
    ALTER_DATABASE = "ALTER DATABASE";
    CREATE_TABLESPACE = "CREATE TABLESPACE";
    ALTER_TABLESPACE = "ALTER TABLESPACE";
    CREATE_SUBSCRIPTION = "CREATE SUBSCRIPTION";
    ALTER_SUBSCRIPTION = "ALTER SUBSCRIPTION";
    CREATE_PUBLICATION = "CREATE PUBLICATION";
    ALTER_PUBLICATION = "ALTER PUBLICATION";
    CREATE_TYPE = "CREATE TYPE";
    CREATE_DOMAIN = "CREATE DOMAIN";
    CREATE_EXTENSION = "CREATE EXTENSION";
    CREATE_FUNCTION = "CREATE FUNCTION";
    CREATE_PROCEDURE = "CREATE PROCEDURE";
    CREATE_SEQUENCE = "CREATE SEQUENCE";
    CREATE_VIEW = "CREATE VIEW";
    CREATE_MATERIALIZED_VIEW = "CREATE MATERIALIZED VIEW";
    CREATE_SCHEMA = "CREATE SCHEMA";
    CREATE_TRIGGER = "CREATE TRIGGER";
    CREATE_RULE = "CREATE RULE";
    CREATE_POLICY = "CREATE POLICY";
    CREATE_FOREIGN_DATA_WRAPPER = "CREATE FOREIGN DATA WRAPPER";
    CREATE_SERVER = "CREATE SERVER";
    CREATE_USER_MAPPING = "CREATE USER MAPPING";
    CREATE_ROLE = "CREATE ROLE";
    CREATE_EVENT_TRIGGER = "CREATE EVENT TRIGGER";
    CREATE_STATISTICS = "CREATE STATISTICS";
    CREATE_CAST = "CREATE CAST";
    CREATE_COLLATION = "CREATE COLLATION";
    CREATE_AGGREGATE = "CREATE AGGREGATE";
    CREATE_OPERATOR = "CREATE OPERATOR";
    CREATE_TEXT_SEARCH_CONFIGURATION = "CREATE TEXT SEARCH CONFIGURATION";
    CREATE_TEXT_SEARCH_DICTIONARY = "CREATE TEXT SEARCH DICTIONARY";
    CREATE_TEXT_SEARCH_PARSER = "CREATE TEXT SEARCH PARSER";
    CREATE_TEXT_SEARCH_TEMPLATE = "CREATE TEXT SEARCH TEMPLATE";

    // CREATE TABLE family, not otherwise distinguished by shape
    CREATE_TABLE = "CREATE TABLE";
    CREATE_TABLE_AS = "CREATE TABLE AS";

    // TRUNCATE / CLUSTER / REFRESH MATERIALIZED VIEW
    TRUNCATE = "TRUNCATE";
    CLUSTER = "CLUSTER";
    REFRESH_MATERIALIZED_VIEW = "REFRESH MATERIALIZED VIEW";
    REFRESH_MATERIALIZED_VIEW_CONCURRENTLY = "REFRESH MATERIALIZED VIEW CONCURRENTLY";

    // Synthetic placeholder the sequence driver substitutes for a statement the
    // classifier couldn't describe.
    UNRECOGNIZED = "UNRECOGNIZED";
}
