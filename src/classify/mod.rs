use std::collections::HashMap;

use log::trace;
use pg_query::NodeRef;

use crate::error::ContextualError;
use crate::pg_types::lock_strength::LockStrength;

mod ddl;
mod dml;
mod misc;
pub mod tags;
mod txn;

pub use tags::OperationTag;

/// A statement's classification: its canonical tag, the lock it takes on its
/// primary target (empty for `Error`-severity statements), and any additional
/// locks taken on other relations (e.g. a referenced table in `ADD CONSTRAINT
/// ... FOREIGN KEY`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationInfo {
    pub tag: OperationTag,
    pub primary_lock: LockStrength,
    pub extra_locks: HashMap<String, LockStrength>,
}

impl OperationInfo {
    pub fn new(tag: OperationTag, primary_lock: LockStrength) -> Self {
        OperationInfo {
            tag,
            primary_lock,
            extra_locks: HashMap::new(),
        }
    }

    pub fn with_extra_lock(mut self, relation: impl Into<String>, lock: LockStrength) -> Self {
        self.extra_locks.insert(relation.into(), lock);
        self
    }
}

/// The classifier could not describe a statement's AST.
#[derive(Debug)]
pub enum ClassifyError {
    /// The parser handed back a statement kind with no registered handler.
    UnrecognizedStatement,
    /// A handler matched but the AST didn't have the shape it expected
    /// (e.g. an `ALTER TABLE` sub-command with no attached definition node).
    MalformedAst,
}

/// Dispatches on the top-level statement variant to produce an [`OperationInfo`].
///
/// `raw_sql` is the original statement text, needed for the handful of tag
/// distinctions the AST cannot make cleanly (`MERGE ... WHEN MATCHED AND`,
/// `DETACH PARTITION CONCURRENTLY`).
pub fn classify(stmt: NodeRef, raw_sql: &str) -> crate::Result<OperationInfo> {
    trace!("classifying: {:?}", stmt);
    let info = dispatch(stmt, raw_sql)?;
    with_cte_analysis(stmt, raw_sql, info)
}

fn dispatch(stmt: NodeRef, raw_sql: &str) -> crate::Result<OperationInfo> {
    match stmt {
        NodeRef::UpdateStmt(_)
        | NodeRef::DeleteStmt(_)
        | NodeRef::InsertStmt(_)
        | NodeRef::MergeStmt(_)
        | NodeRef::CopyStmt(_)
        | NodeRef::SelectStmt(_) => dml::classify(stmt, raw_sql),

        NodeRef::IndexStmt(_)
        | NodeRef::DropStmt(_)
        | NodeRef::ReindexStmt(_)
        | NodeRef::VacuumStmt(_)
        | NodeRef::AlterTableStmt(_)
        | NodeRef::TruncateStmt(_)
        | NodeRef::ClusterStmt(_)
        | NodeRef::RefreshMatViewStmt(_)
        | NodeRef::CreateStmt(_)
        | NodeRef::CreateTableAsStmt(_) => ddl::classify(stmt, raw_sql),

        NodeRef::TransactionStmt(_) => txn::classify(stmt),

        NodeRef::LockStmt(_)
        | NodeRef::GrantStmt(_)
        | NodeRef::VariableSetStmt(_)
        | NodeRef::AlterSystemStmt(_)
        | NodeRef::CheckPointStmt(_)
        | NodeRef::LoadStmt(_)
        | NodeRef::CommentStmt(_)
        | NodeRef::CreatedbStmt(_)
        | NodeRef::AlterDatabaseStmt(_)
        | NodeRef::CreateTableSpaceStmt(_)
        | NodeRef::CreateSubscriptionStmt(_)
        | NodeRef::CreatePublicationStmt(_)
        | NodeRef::CreateDomainStmt(_)
        | NodeRef::CreateExtensionStmt(_)
        | NodeRef::CreateFunctionStmt(_)
        | NodeRef::CreateSeqStmt(_)
        | NodeRef::ViewStmt(_)
        | NodeRef::CreateSchemaStmt(_)
        | NodeRef::CreateTrigStmt(_)
        | NodeRef::RuleStmt(_)
        | NodeRef::CreatePolicyStmt(_)
        | NodeRef::CreateFdwStmt(_)
        | NodeRef::CreateForeignServerStmt(_)
        | NodeRef::CreateUserMappingStmt(_)
        | NodeRef::CreateRoleStmt(_)
        | NodeRef::CreateEventTrigStmt(_)
        | NodeRef::CreateStatsStmt(_)
        | NodeRef::CreateCastStmt(_)
        | NodeRef::DefineStmt(_) => misc::classify(stmt),

        _ => Err(ClassifyError::UnrecognizedStatement
            .with_context(format!("no classifier handler for {:?}", stmt))),
    }
}

/// Internal ranking used only to pick the "most severe" operation among an outer
/// DML statement and its data-modifying CTEs.
/// Not related to [`crate::Severity`] - purely an ordering over tags for this one
/// comparison.
fn recursive_rank(tag: OperationTag) -> u8 {
    use tags::*;
    match tag {
        t if t == INSERT || t == COPY_FROM || t == INSERT_SELECT => 0,
        t if t == UPDATE_WITH_WHERE || t == DELETE_WITH_WHERE || t == MERGE_WITH_WHERE => 1,
        t if t == CREATE_INDEX_CONCURRENTLY || t == CREATE_UNIQUE_INDEX_CONCURRENTLY => 2,
        t if t == UPDATE_WITHOUT_WHERE
            || t == DELETE_WITHOUT_WHERE
            || t == MERGE_WITHOUT_WHERE
            || t == TRUNCATE =>
        {
            3
        }
        _ => 1,
    }
}

/// If the statement carries a `WITH` clause, classify each CTE body independently
/// and fold in the most severe tag and the union of locked relations.
fn with_cte_analysis(
    stmt: NodeRef,
    raw_sql: &str,
    outer: OperationInfo,
) -> crate::Result<OperationInfo> {
    let ctes = crate::relations::cte_queries(stmt);
    if ctes.is_empty() {
        return Ok(outer);
    }
    let mut best = outer;
    for cte in ctes {
        if let Ok(inner) = dispatch(cte, raw_sql) {
            for (rel, lock) in inner.extra_locks.iter() {
                best.extra_locks
                    .entry(rel.clone())
                    .and_modify(|existing| {
                        if lock.clone() > *existing {
                            *existing = *lock;
                        }
                    })
                    .or_insert(*lock);
            }
            if recursive_rank(inner.tag) > recursive_rank(best.tag) {
                best.tag = inner.tag;
                best.primary_lock = inner.primary_lock;
            }
        }
    }
    Ok(best)
}
