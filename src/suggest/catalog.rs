//! The suggestion catalog: one declarative entry per suggestion-bearing tag
//! embedded as compiled-in data rather than read from disk.

use crate::classify::tags::*;
use crate::classify::OperationTag;
use crate::suggest::metadata::Metadata;

pub struct StepTemplate {
    pub kind: StepKind,
    pub description: &'static str,
    pub can_run_in_transaction: bool,
    /// The `sql`/`command`/`notes` body, as a Handlebars template string.
    pub body: &'static str,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Sql,
    External,
    Procedural,
}

pub struct SuggestionTemplate {
    pub operation_tag: OperationTag,
    pub category: &'static str,
    pub is_partial: bool,
    pub required: &'static [&'static str],
    pub steps: &'static [StepTemplate],
}

impl SuggestionTemplate {
    /// Returns the display name of the first required field that's absent,
    /// null, an empty string, or an empty list in `data`.
    pub fn missing_required_field(&self, data: &Metadata) -> Option<&'static str> {
        self.required.iter().find(|key| match data.get(**key) {
            None => true,
            Some(serde_json::Value::Null) => true,
            Some(serde_json::Value::String(s)) => s.is_empty(),
            Some(serde_json::Value::Array(a)) => a.is_empty(),
            Some(_) => false,
        }).copied()
    }
}

macro_rules! steps {
    ($([$kind:ident, $desc:literal, $tx:literal, $body:literal]),* $(,)?) => {
        &[$(StepTemplate {
            kind: StepKind::$kind,
            description: $desc,
            can_run_in_transaction: $tx,
            body: $body,
        }),*]
    };
}

static UPDATE_WITHOUT_WHERE_STEPS: &[StepTemplate] = steps![
    [Sql, "Export target row IDs to file", true,
     "\\COPY (SELECT {{idColumn}} FROM {{tableName}} ORDER BY {{idColumn}}) TO '/path/to/target_ids.csv' CSV"],
    [Procedural, "Process file in batches with progress tracking", false,
     "Read target_ids.csv in fixed-size chunk_ids batches and, for each batch, run `UPDATE {{tableName}} SET {{columnsValues}} WHERE {{idColumn}} = ANY(chunk_ids)` in its own short transaction, tracking progress so the job can resume."],
];

static DELETE_WITHOUT_WHERE_STEPS: &[StepTemplate] = steps![
    [Sql, "Export target row IDs to file", true,
     "\\COPY (SELECT {{idColumn}} FROM {{tableName}} ORDER BY {{idColumn}}) TO '/path/to/target_ids.csv' CSV"],
    [Procedural, "Delete in batches with progress tracking", false,
     "Read target_ids.csv in fixed-size chunk_ids batches and, for each batch, run `DELETE FROM {{tableName}} WHERE {{idColumn}} = ANY(chunk_ids)` in its own short transaction."],
];

static MERGE_WITHOUT_WHERE_STEPS: &[StepTemplate] = steps![
    [Procedural, "Add an explicit match condition", true,
     "Rewrite the MERGE's WHEN MATCHED clause to include an AND condition, or otherwise restrict USING to a bounded source set, so the statement does not consider every row in {{tableName}}."],
];

static DROP_INDEX_STEPS: &[StepTemplate] = steps![
    [Sql, "Drop the index without blocking concurrent queries", true,
     "DROP INDEX CONCURRENTLY {{indexName}}"],
];

static CREATE_INDEX_STEPS: &[StepTemplate] = steps![
    [Sql, "Create the index without blocking writes", false,
     "CREATE INDEX CONCURRENTLY {{indexName}} ON {{tableName}} ({{#each columns}}{{#unless @first}}, {{/unless}}{{this}}{{/each}})"],
];

static REINDEX_STEPS: &[StepTemplate] = steps![
    [Sql, "Reindex without blocking concurrent queries", false, "REINDEX INDEX CONCURRENTLY {{indexName}}"],
];

static REINDEX_TABLE_STEPS: &[StepTemplate] = steps![
    [Sql, "Reindex without blocking concurrent queries", false, "REINDEX TABLE CONCURRENTLY {{tableName}}"],
];

static REINDEX_DATABASE_STEPS: &[StepTemplate] = steps![
    [Sql, "Reindex each table individually, concurrently", false,
     "REINDEX DATABASE CONCURRENTLY {{databaseName}}"],
];

static REINDEX_SCHEMA_STEPS: &[StepTemplate] = steps![
    [Sql, "Reindex without blocking concurrent queries", false, "REINDEX SCHEMA CONCURRENTLY {{schemaName}}"],
];

static ADD_COLUMN_VOLATILE_DEFAULT_STEPS: &[StepTemplate] = steps![
    [Sql, "Add the column without a default", true,
     "ALTER TABLE {{tableName}} ADD COLUMN {{columnName}} {{dataType}}"],
    [Procedural, "Backfill the column in batches, outside a transaction", false,
     "For each batch of rows selected by {{idColumn}}, run `UPDATE {{tableName}} SET {{columnName}} = {{defaultValue}} WHERE {{idColumn}} = ANY(chunk_ids)` in its own short transaction."],
    [Sql, "Set the default for future rows", true,
     "ALTER TABLE {{tableName}} ALTER COLUMN {{columnName}} SET DEFAULT {{defaultValue}}"],
];

static ALTER_COLUMN_TYPE_STEPS: &[StepTemplate] = steps![
    [Sql, "Add a new column with the desired type", true,
     "ALTER TABLE {{tableName}} ADD COLUMN {{columnName}}_new {{newType}}"],
    [Procedural, "Backfill the new column in batches", false,
     "For each batch of rows selected by {{idColumn}}, run `UPDATE {{tableName}} SET {{columnName}}_new = {{columnName}} WHERE {{idColumn}} = ANY(chunk_ids)` in its own short transaction."],
    [Sql, "Swap the columns and drop the old one", true,
     "ALTER TABLE {{tableName}} RENAME COLUMN {{columnName}} TO {{columnName}}_old; ALTER TABLE {{tableName}} RENAME COLUMN {{columnName}}_new TO {{columnName}}; ALTER TABLE {{tableName}} DROP COLUMN {{columnName}}_old"],
];

static ADD_PRIMARY_KEY_STEPS: &[StepTemplate] = steps![
    [Sql, "Build a unique index concurrently", false,
     "CREATE UNIQUE INDEX CONCURRENTLY ON {{tableName}} (/* primary key columns */)"],
    [Sql, "Attach the index as the primary key", true,
     "ALTER TABLE {{tableName}} ADD PRIMARY KEY USING INDEX /* index name from the previous step */"],
];

static ADD_CONSTRAINT_CHECK_STEPS: &[StepTemplate] = steps![
    [Sql, "Add the constraint without validating existing rows", true,
     "ALTER TABLE {{tableName}} ADD CONSTRAINT {{constraintName}} CHECK (/* condition */) NOT VALID"],
    [Sql, "Validate the constraint without an ACCESS EXCLUSIVE lock", true,
     "ALTER TABLE {{tableName}} VALIDATE CONSTRAINT {{constraintName}}"],
];

static SET_NOT_NULL_STEPS: &[StepTemplate] = steps![
    [Sql, "Add an equivalent CHECK constraint without validating existing rows", true,
     "ALTER TABLE {{tableName}} ADD CONSTRAINT {{column}}_not_null CHECK ({{column}} IS NOT NULL) NOT VALID"],
    [Sql, "Validate the constraint without an ACCESS EXCLUSIVE lock", true,
     "ALTER TABLE {{tableName}} VALIDATE CONSTRAINT {{column}}_not_null"],
    [Sql, "Promote the validated constraint to a column NOT NULL", true,
     "ALTER TABLE {{tableName}} ALTER COLUMN {{column}} SET NOT NULL"],
];

static CLUSTER_STEPS: &[StepTemplate] = steps![
    [External, "Rewrite the table without an exclusive lock, using pg_repack", true,
     "pg_repack --table={{tableName}} --order-by={{indexName}}"],
];

static REFRESH_MATERIALIZED_VIEW_STEPS: &[StepTemplate] = steps![
    [Sql, "Refresh without blocking reads of the view", false,
     "REFRESH MATERIALIZED VIEW CONCURRENTLY {{viewName}}"],
];

static VACUUM_FULL_STEPS: &[StepTemplate] = steps![
    [External, "Rewrite the table without an exclusive lock, using pg_repack", true,
     "pg_repack --table={{tableName}} --no-order"],
];

macro_rules! entry {
    ($tag:expr, $category:literal, $partial:literal, $required:expr, $steps:expr) => {
        SuggestionTemplate {
            operation_tag: $tag,
            category: $category,
            is_partial: $partial,
            required: $required,
            steps: $steps,
        }
    };
}

static CATALOG: &[SuggestionTemplate] = &[
    entry!(UPDATE_WITHOUT_WHERE, "batched rewrite", false,
        &["tableName", "idColumn", "columnsValues"], UPDATE_WITHOUT_WHERE_STEPS),
    entry!(DELETE_WITHOUT_WHERE, "batched rewrite", false,
        &["tableName", "idColumn"], DELETE_WITHOUT_WHERE_STEPS),
    entry!(MERGE_WITHOUT_WHERE, "narrow the match", false,
        &["tableName"], MERGE_WITHOUT_WHERE_STEPS),
    entry!(DROP_INDEX, "concurrent alternative", false,
        &["indexName"], DROP_INDEX_STEPS),
    entry!(CREATE_INDEX, "concurrent alternative", false,
        &["tableName", "indexName", "columns"], CREATE_INDEX_STEPS),
    entry!(CREATE_UNIQUE_INDEX, "concurrent alternative", false,
        &["tableName", "indexName", "columns"], CREATE_INDEX_STEPS),
    entry!(REINDEX, "concurrent alternative", false, &["indexName"], REINDEX_STEPS),
    entry!(REINDEX_TABLE, "concurrent alternative", false, &["tableName"], REINDEX_TABLE_STEPS),
    entry!(REINDEX_DATABASE, "concurrent alternative", false, &["databaseName"], REINDEX_DATABASE_STEPS),
    entry!(REINDEX_SCHEMA, "concurrent alternative", false, &["schemaName"], REINDEX_SCHEMA_STEPS),
    entry!(ALTER_TABLE_ADD_COLUMN_WITH_VOLATILE_DEFAULT, "split rewrite", false,
        &["tableName", "columnName", "dataType", "defaultValue", "idColumn"],
        ADD_COLUMN_VOLATILE_DEFAULT_STEPS),
    entry!(ALTER_TABLE_ALTER_COLUMN_TYPE, "shadow column", false,
        &["tableName", "columnName", "newType", "idColumn"], ALTER_COLUMN_TYPE_STEPS),
    entry!(ALTER_TABLE_ADD_PRIMARY_KEY, "concurrent index first", false,
        &["tableName"], ADD_PRIMARY_KEY_STEPS),
    entry!(ALTER_TABLE_ADD_CONSTRAINT_CHECK, "not valid then validate", false,
        &["tableName", "constraintName"], ADD_CONSTRAINT_CHECK_STEPS),
    entry!(ALTER_TABLE_SET_NOT_NULL, "not valid then validate", false,
        &["tableName", "column"], SET_NOT_NULL_STEPS),
    entry!(CLUSTER, "external tool", true, &["tableName", "indexName"], CLUSTER_STEPS),
    entry!(REFRESH_MATERIALIZED_VIEW, "concurrent alternative", false,
        &["viewName"], REFRESH_MATERIALIZED_VIEW_STEPS),
    entry!(VACUUM_FULL, "external tool", true, &["tableName"], VACUUM_FULL_STEPS),
];

pub fn lookup(tag: OperationTag) -> Option<&'static SuggestionTemplate> {
    CATALOG.iter().find(|e| e.operation_tag == tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_has_eighteen_entries_and_no_duplicates() {
        assert_eq!(CATALOG.len(), 18);
        let mut seen = HashSet::new();
        for entry in CATALOG {
            assert!(seen.insert(entry.operation_tag.as_str()));
        }
    }

    #[test]
    fn every_entry_has_at_least_one_step() {
        for entry in CATALOG {
            assert!(!entry.steps.is_empty(), "{} has no steps", entry.operation_tag);
        }
    }
}
