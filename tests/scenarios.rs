use pretty_assertions::assert_eq;

use lockstep::pg_types::lock_strength::LockStrength;
use lockstep::sequence::{drive, TransactionMode::*};
use lockstep::severity::Severity;
use lockstep::suggest::Step;

fn analyze(sql: &str, mode: lockstep::sequence::TransactionMode, want_suggestions: bool) -> Vec<lockstep::sequence::AnalysisResult> {
    let statements = lockstep::parse::split(sql).unwrap();
    drive(&statements, mode, want_suggestions)
}

#[test]
fn scenario_1_update_without_where_in_transaction() {
    let results = analyze("UPDATE users SET active = false", InTransaction, true);
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.operation_tag, "UPDATE without WHERE");
    assert_eq!(r.severity, Severity::Critical);
    assert_eq!(r.primary_lock, Some(LockStrength::RowExclusive));
    assert_eq!(r.relation_locks, vec![("users".to_string(), LockStrength::RowExclusive)]);

    let suggestion = r.suggestion.as_ref().expect("Critical UPDATE without WHERE should suggest a rewrite");
    assert_eq!(suggestion.steps.len(), 2);
    match &suggestion.steps[0] {
        Step::Sql { description, can_run_in_transaction, sql } => {
            assert_eq!(description, "Export target row IDs to file");
            assert!(can_run_in_transaction);
            assert!(sql.contains("\\COPY (SELECT id FROM users ORDER BY id) TO '/path/to/target_ids.csv' CSV"));
        }
        other => panic!("expected a Sql step, got {other:?}"),
    }
    match &suggestion.steps[1] {
        Step::Procedural { description, can_run_in_transaction, notes } => {
            assert_eq!(description, "Process file in batches with progress tracking");
            assert!(!can_run_in_transaction);
            assert!(notes.contains("chunk_ids"));
        }
        other => panic!("expected a Procedural step, got {other:?}"),
    }
}

#[test]
fn scenario_2_update_with_where_is_a_warning_with_no_suggestion() {
    let results = analyze("UPDATE users SET active = false WHERE id = 1", NoTransaction, true);
    let r = &results[0];
    assert_eq!(r.operation_tag, "UPDATE with WHERE");
    assert_eq!(r.severity, Severity::Warning);
    assert_eq!(r.primary_lock, Some(LockStrength::RowExclusive));
    assert_eq!(r.relation_locks, vec![("users".to_string(), LockStrength::RowExclusive)]);
    assert!(r.suggestion.is_none());
}

#[test]
fn scenario_3_create_index_concurrently_depends_on_transaction_mode() {
    let sql = "CREATE INDEX CONCURRENTLY idx ON users(email)";

    let in_tx = &analyze(sql, InTransaction, false)[0];
    assert_eq!(in_tx.operation_tag, "CREATE INDEX CONCURRENTLY");
    assert_eq!(in_tx.severity, Severity::Error);
    assert!(in_tx.primary_lock.is_none());
    assert_eq!(in_tx.relation_locks, vec![("users".to_string(), LockStrength::ShareUpdateExclusive)]);

    let no_tx = &analyze(sql, NoTransaction, false)[0];
    assert_eq!(no_tx.severity, Severity::Warning);
    assert_eq!(no_tx.primary_lock, Some(LockStrength::ShareUpdateExclusive));
}

#[test]
fn scenario_4_vacuum_inside_a_transaction_is_an_error() {
    let script = "BEGIN;\nVACUUM users;\nCOMMIT;\nVACUUM logs;";
    let results = analyze(script, NoTransaction, false);
    let severities: Vec<Severity> = results.iter().map(|r| r.severity).collect();
    let tags: Vec<&str> = results.iter().map(|r| r.operation_tag).collect();
    assert_eq!(severities, vec![Severity::Info, Severity::Error, Severity::Info, Severity::Warning]);
    assert_eq!(tags, vec!["BEGIN", "VACUUM", "COMMIT", "VACUUM"]);
}

#[test]
fn scenario_5_delete_using_distinguishes_write_and_read_relations() {
    let sql = "DELETE FROM sessions USING users WHERE sessions.user_id = users.id AND users.inactive = true";
    let results = analyze(sql, NoTransaction, false);
    let r = &results[0];
    assert_eq!(r.operation_tag, "DELETE with WHERE");
    assert_eq!(r.severity, Severity::Warning);
    assert_eq!(
        r.relation_locks,
        vec![
            ("sessions".to_string(), LockStrength::RowExclusive),
            ("users".to_string(), LockStrength::AccessShare),
        ]
    );
}

#[test]
fn scenario_6_alter_table_add_column_with_volatile_default() {
    let sql = "ALTER TABLE users ADD COLUMN uuid TEXT DEFAULT gen_random_uuid()";
    let results = analyze(sql, NoTransaction, true);
    let r = &results[0];
    assert_eq!(r.operation_tag, "ALTER TABLE ADD COLUMN with volatile DEFAULT");
    assert_eq!(r.severity, Severity::Critical);
    assert_eq!(r.primary_lock, Some(LockStrength::AccessExclusive));

    let suggestion = r.suggestion.as_ref().expect("volatile DEFAULT should suggest a split rewrite");
    assert_eq!(suggestion.steps.len(), 3);
    let can_run_in_tx: Vec<bool> = suggestion
        .steps
        .iter()
        .map(|s| match s {
            Step::Sql { can_run_in_transaction, .. } => *can_run_in_transaction,
            Step::External { can_run_in_transaction, .. } => *can_run_in_transaction,
            Step::Procedural { can_run_in_transaction, .. } => *can_run_in_transaction,
        })
        .collect();
    assert_eq!(can_run_in_tx, vec![true, false, true]);
}

#[test]
fn multi_statement_script_tracks_line_numbers() {
    let statements = lockstep::parse::split("SELECT 1;\n\nSELECT 2;\n").unwrap();
    let line_numbers: Vec<usize> = statements.iter().map(|s| s.line_number).collect();
    assert_eq!(line_numbers, vec![1, 3]);
}

/// Analysis owns no shared mutable state, so running many scripts concurrently
/// must reproduce the same results as running them one at a time.
#[test]
fn analyzing_many_scripts_concurrently_is_safe() {
    use rayon::prelude::*;

    let scripts = [
        "UPDATE users SET active = false",
        "CREATE INDEX CONCURRENTLY idx ON users(email)",
        "DELETE FROM sessions USING users WHERE sessions.user_id = users.id",
        "ALTER TABLE users ADD COLUMN uuid TEXT DEFAULT gen_random_uuid()",
    ];

    let sequential: Vec<_> = scripts
        .iter()
        .map(|s| analyze(s, NoTransaction, true))
        .collect();
    let parallel: Vec<_> = scripts
        .par_iter()
        .map(|s| analyze(s, NoTransaction, true))
        .collect();

    for (seq, par) in sequential.iter().zip(parallel.iter()) {
        assert_eq!(seq.len(), par.len());
        for (a, b) in seq.iter().zip(par.iter()) {
            assert_eq!(a.operation_tag, b.operation_tag);
            assert_eq!(a.severity, b.severity);
            assert_eq!(a.relation_locks, b.relation_locks);
        }
    }
}
