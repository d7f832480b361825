//! Drives an ordered batch of statements through the classifier, registry, and
//! relation extractor, tracking transaction depth across the whole script
//! across the whole script.

use itertools::Itertools;
use pg_query::NodeRef;

use crate::classify::{self, tags, OperationTag};
use crate::parse::ParsedStatement;
use crate::pg_types::lock_strength::LockStrength;
use crate::registry;
use crate::severity::Severity;
use crate::suggest::{self, Suggestion};

/// Whether a statement is being analyzed as if a transaction block is already open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    InTransaction,
    NoTransaction,
}

/// One statement's full analysis, in the shape the output boundary renders
/// the output boundary renders.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisResult {
    pub index: usize,
    pub line_number: usize,
    pub sql: String,
    pub severity: Severity,
    pub operation_tag: &'static str,
    /// The lock taken on the statement's primary target, or `None` for `Error`
    /// severity (the statement cannot execute, so it takes no lock).
    pub primary_lock: Option<LockStrength>,
    /// Every relation the statement locks, stronger-wins merged, in a stable
    /// (sorted) order so output is deterministic.
    pub relation_locks: Vec<(String, LockStrength)>,
    pub suggestion: Option<Suggestion>,
}

/// Statement shapes where [`crate::relations::extract`] already distinguishes
/// read vs. write locks correctly; their extracted locks are trusted as-is.
/// Everything else gets the registry's primary lock stamped onto every
/// relation `extract` found, since its answer there is a rough approximation
/// (e.g. `CREATE INDEX` always reporting plain `Share`, ignoring `CONCURRENTLY`).
fn is_dml_shaped(ast: NodeRef) -> bool {
    matches!(
        ast,
        NodeRef::UpdateStmt(_)
            | NodeRef::DeleteStmt(_)
            | NodeRef::InsertStmt(_)
            | NodeRef::MergeStmt(_)
            | NodeRef::CopyStmt(_)
            | NodeRef::SelectStmt(_)
    )
}

fn merge_lock(locks: &mut std::collections::HashMap<String, LockStrength>, name: String, lock: LockStrength) {
    locks
        .entry(name)
        .and_modify(|existing| {
            if lock > *existing {
                *existing = lock;
            }
        })
        .or_insert(lock);
}

fn transaction_depth_delta(tag: OperationTag, depth: usize) -> usize {
    if tag == tags::BEGIN {
        if depth == 0 {
            1
        } else {
            depth
        }
    } else if tag == tags::COMMIT || tag == tags::ROLLBACK {
        depth.saturating_sub(1)
    } else {
        depth
    }
}

/// Analyze `statements` in order, starting from `initial_mode`, rendering
/// suggestions only when `want_suggestions` is set.
pub fn drive(
    statements: &[ParsedStatement],
    initial_mode: TransactionMode,
    want_suggestions: bool,
) -> Vec<AnalysisResult> {
    let mut depth = match initial_mode {
        TransactionMode::InTransaction => 1,
        TransactionMode::NoTransaction => 0,
    };

    let mut results = Vec::with_capacity(statements.len());
    for (index, statement) in statements.iter().enumerate() {
        let in_transaction = depth > 0;
        let ast = statement.ast();

        let info = match classify::classify(ast, &statement.sql_text) {
            Ok(info) => info,
            Err(e) => {
                log::warn!(
                    "line {}: classifier could not describe this statement, recording a placeholder: {e}",
                    statement.line_number
                );
                results.push(AnalysisResult {
                    index,
                    line_number: statement.line_number,
                    sql: statement.sql_text.clone(),
                    severity: Severity::Info,
                    operation_tag: tags::UNRECOGNIZED.as_str(),
                    primary_lock: None,
                    relation_locks: Vec::new(),
                    suggestion: None,
                });
                continue;
            }
        };

        let (severity, primary_lock) = registry::lookup(info.tag, in_transaction);

        let mut relation_locks = crate::relations::extract(ast);
        if !is_dml_shaped(ast) && info.extra_locks.is_empty() {
            for lock in relation_locks.values_mut() {
                *lock = primary_lock;
            }
        }
        for (name, lock) in &info.extra_locks {
            merge_lock(&mut relation_locks, name.clone(), *lock);
        }

        // `Error` severity means the statement cannot run, so it holds no lock of
        // its own - but the relations it would have touched are still reported,
        // since reviewers need to see what a fixed version of the statement would lock.
        let primary_lock = if severity == Severity::Error { None } else { Some(primary_lock) };
        let relation_locks = relation_locks
            .into_iter()
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .collect_vec();

        let suggestion = if want_suggestions && severity == Severity::Critical {
            suggest::suggest(info.tag, severity, ast, &statement.sql_text)
        } else {
            None
        };

        results.push(AnalysisResult {
            index,
            line_number: statement.line_number,
            sql: statement.sql_text.clone(),
            severity,
            operation_tag: info.tag.as_str(),
            primary_lock,
            relation_locks,
            suggestion,
        });

        depth = transaction_depth_delta(info.tag, depth);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::split;

    fn analyze(sql: &str, mode: TransactionMode) -> Vec<AnalysisResult> {
        drive(&split(sql).unwrap(), mode, true)
    }

    #[test]
    fn update_without_where_is_critical_and_suggests_a_batched_rewrite() {
        let results = analyze("UPDATE users SET active = false", TransactionMode::NoTransaction);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Critical);
        assert_eq!(results[0].operation_tag, "UPDATE without WHERE");
        assert!(results[0].suggestion.is_some());
    }

    #[test]
    fn create_index_concurrently_inside_a_transaction_is_error_with_no_primary_lock() {
        let results = analyze(
            "BEGIN; CREATE INDEX CONCURRENTLY idx ON users(email); COMMIT;",
            TransactionMode::NoTransaction,
        );
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].severity, Severity::Error);
        assert!(results[1].primary_lock.is_none());
        assert_eq!(
            results[1].relation_locks,
            vec![("users".to_string(), LockStrength::ShareUpdateExclusive)]
        );
    }

    #[test]
    fn create_index_concurrently_outside_a_transaction_gets_share_update_exclusive() {
        let results = analyze(
            "CREATE INDEX CONCURRENTLY ON users (email)",
            TransactionMode::NoTransaction,
        );
        assert_eq!(results[0].severity, Severity::Warning);
        assert_eq!(results[0].primary_lock, Some(LockStrength::ShareUpdateExclusive));
        assert_eq!(
            results[0].relation_locks,
            vec![("users".to_string(), LockStrength::ShareUpdateExclusive)]
        );
    }

    #[test]
    fn delete_using_preserves_distinct_read_and_write_locks() {
        let results = analyze(
            "DELETE FROM sessions USING users WHERE sessions.user_id = users.id AND users.inactive = true",
            TransactionMode::NoTransaction,
        );
        assert_eq!(
            results[0].relation_locks,
            vec![
                ("sessions".to_string(), LockStrength::RowExclusive),
                ("users".to_string(), LockStrength::AccessShare),
            ]
        );
    }

    #[test]
    fn begin_commit_pair_tracks_transaction_depth_without_going_negative() {
        let results = analyze("COMMIT; BEGIN; COMMIT; COMMIT;", TransactionMode::NoTransaction);
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.severity == Severity::Info));
    }

    #[test]
    fn unrecognized_statement_becomes_a_placeholder_info_result() {
        // DO blocks have no classifier handler; confirm the driver recovers rather
        // than aborting the whole script.
        let results = analyze("DO $$ BEGIN NULL; END $$;", TransactionMode::NoTransaction);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Info);
        assert_eq!(results[0].operation_tag, "UNRECOGNIZED");
    }
}
