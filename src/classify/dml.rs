use pg_query::protobuf::LockClauseStrength;
use pg_query::NodeRef;

use super::tags::*;
use super::{ClassifyError, OperationInfo};
use crate::error::ContextualError;
use crate::pg_types::lock_strength::LockStrength;

/// Classifies DML and bare `SELECT` statements: `UPDATE`, `DELETE`, `INSERT`,
/// `MERGE`, `COPY`, `SELECT` (including the locking-clause forms).
pub fn classify(stmt: NodeRef, raw_sql: &str) -> crate::Result<OperationInfo> {
    match stmt {
        NodeRef::UpdateStmt(s) => {
            let has_where = s.where_clause.is_some();
            let tag = if has_where {
                UPDATE_WITH_WHERE
            } else {
                UPDATE_WITHOUT_WHERE
            };
            Ok(OperationInfo::new(tag, LockStrength::RowExclusive))
        }
        NodeRef::DeleteStmt(s) => {
            let has_where = s.where_clause.is_some();
            let tag = if has_where {
                DELETE_WITH_WHERE
            } else {
                DELETE_WITHOUT_WHERE
            };
            Ok(OperationInfo::new(tag, LockStrength::RowExclusive))
        }
        NodeRef::MergeStmt(_) => {
            let conditional = raw_sql.to_uppercase().contains("WHEN MATCHED AND")
                || raw_sql.to_uppercase().contains("USING (SELECT");
            let tag = if conditional {
                MERGE_WITH_WHERE
            } else {
                MERGE_WITHOUT_WHERE
            };
            Ok(OperationInfo::new(tag, LockStrength::RowExclusive))
        }
        NodeRef::InsertStmt(s) => {
            if s.on_conflict_clause.is_some() {
                return Ok(OperationInfo::new(INSERT_ON_CONFLICT, LockStrength::RowExclusive));
            }
            let tag = match s.select_stmt.as_deref().map(|n| n.node.as_ref()) {
                Some(Some(node)) => {
                    if let pg_query::protobuf::node::Node::SelectStmt(select) = node {
                        if !select.from_clause.is_empty() {
                            INSERT_SELECT
                        } else {
                            INSERT
                        }
                    } else {
                        INSERT
                    }
                }
                _ => INSERT,
            };
            Ok(OperationInfo::new(tag, LockStrength::RowExclusive))
        }
        NodeRef::CopyStmt(s) => {
            let tag = if s.is_from { COPY_FROM } else { COPY_TO };
            let lock = if s.is_from {
                LockStrength::RowExclusive
            } else {
                LockStrength::AccessShare
            };
            Ok(OperationInfo::new(tag, lock))
        }
        NodeRef::SelectStmt(s) => {
            let has_where = s.where_clause.is_some();
            if let Some(clause) = s.locking_clause.first() {
                if let Some(pg_query::protobuf::node::Node::LockingClause(lc)) =
                    clause.node.as_ref()
                {
                    let strength = LockClauseStrength::from_i32(lc.strength).ok_or_else(|| {
                        ClassifyError::MalformedAst
                            .with_context("SELECT locking clause has unrecognized strength")
                    })?;
                    let tag = match (strength, has_where) {
                        (LockClauseStrength::LcsForupdate, true) => SELECT_FOR_UPDATE_WITH_WHERE,
                        (LockClauseStrength::LcsForupdate, false) => {
                            SELECT_FOR_UPDATE_WITHOUT_WHERE
                        }
                        (LockClauseStrength::LcsFornokeyupdate, true) => {
                            SELECT_FOR_NO_KEY_UPDATE_WITH_WHERE
                        }
                        (LockClauseStrength::LcsFornokeyupdate, false) => {
                            SELECT_FOR_NO_KEY_UPDATE_WITHOUT_WHERE
                        }
                        (LockClauseStrength::LcsForshare, true) => SELECT_FOR_SHARE_WITH_WHERE,
                        (LockClauseStrength::LcsForshare, false) => {
                            SELECT_FOR_SHARE_WITHOUT_WHERE
                        }
                        (LockClauseStrength::LcsForkeyshare, _) => SELECT_FOR_KEY_SHARE,
                        _ => SELECT,
                    };
                    return Ok(OperationInfo::new(tag, LockStrength::RowShare));
                }
            }
            Ok(OperationInfo::new(SELECT, LockStrength::AccessShare))
        }
        _ => Err(ClassifyError::UnrecognizedStatement
            .with_context("classify::dml called with a non-DML statement")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_sql(sql: &str) -> OperationInfo {
        let parsed = pg_query::parse(sql).unwrap();
        let stmt = parsed.protobuf.stmts[0]
            .stmt
            .as_ref()
            .unwrap()
            .node
            .as_ref()
            .unwrap()
            .to_ref();
        classify(stmt, sql).unwrap()
    }

    #[test]
    fn update_without_where_is_critical_shape() {
        let info = classify_sql("UPDATE users SET active = false");
        assert_eq!(info.tag, UPDATE_WITHOUT_WHERE);
        assert_eq!(info.primary_lock, LockStrength::RowExclusive);
    }

    #[test]
    fn update_with_where() {
        let info = classify_sql("UPDATE users SET active = false WHERE id = 1");
        assert_eq!(info.tag, UPDATE_WITH_WHERE);
    }

    #[test]
    fn insert_select_vs_plain_insert() {
        assert_eq!(
            classify_sql("INSERT INTO a SELECT * FROM b").tag,
            INSERT_SELECT
        );
        assert_eq!(classify_sql("INSERT INTO a VALUES (1)").tag, INSERT);
    }

    #[test]
    fn select_for_update_with_where() {
        let info = classify_sql("SELECT * FROM users WHERE id = 1 FOR UPDATE");
        assert_eq!(info.tag, SELECT_FOR_UPDATE_WITH_WHERE);
    }

    #[test]
    fn bare_select_has_no_relations_beyond_access_share() {
        let info = classify_sql("SELECT 1");
        assert_eq!(info.tag, SELECT);
        assert_eq!(info.primary_lock, LockStrength::AccessShare);
    }
}
