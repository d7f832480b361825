use pg_query::protobuf::TransactionStmtKind;
use pg_query::NodeRef;

use super::tags::*;
use super::{ClassifyError, OperationInfo};
use crate::error::ContextualError;
use crate::pg_types::lock_strength::LockStrength;

/// Transaction-control statements. `END` is folded into `COMMIT`.
pub fn classify(stmt: NodeRef) -> crate::Result<OperationInfo> {
    let NodeRef::TransactionStmt(s) = stmt else {
        return Err(ClassifyError::UnrecognizedStatement
            .with_context("classify::txn called with a non-transaction statement"));
    };
    let kind = TransactionStmtKind::from_i32(s.kind).ok_or_else(|| {
        ClassifyError::MalformedAst.with_context("unrecognized transaction statement kind")
    })?;
    let tag = match kind {
        TransactionStmtKind::TransStmtBegin | TransactionStmtKind::TransStmtStart => BEGIN,
        TransactionStmtKind::TransStmtCommit | TransactionStmtKind::TransStmtRollback => {
            if kind == TransactionStmtKind::TransStmtRollback {
                ROLLBACK
            } else {
                COMMIT
            }
        }
        TransactionStmtKind::TransStmtSavepoint => SAVEPOINT,
        TransactionStmtKind::TransStmtRelease => RELEASE_SAVEPOINT,
        TransactionStmtKind::TransStmtRollbackTo => ROLLBACK_TO_SAVEPOINT,
        _ => SET_TRANSACTION,
    };
    Ok(OperationInfo::new(tag, LockStrength::None))
}
