use pg_query::protobuf::{ObjectType, VariableSetKind};
use pg_query::NodeRef;

use super::tags::*;
use super::{ClassifyError, OperationInfo};
use crate::error::ContextualError;
use crate::pg_types::lock_strength::LockStrength;

/// Everything that doesn't belong to DML, the big DDL family, or transaction
/// control: `LOCK TABLE`, `GRANT`/`REVOKE`, `SET`/`RESET`, and the long tail of
/// single-purpose administrative DDL.
pub fn classify(stmt: NodeRef) -> crate::Result<OperationInfo> {
    match stmt {
        NodeRef::LockStmt(s) => lock_table(s),
        NodeRef::GrantStmt(s) => grant(s),
        NodeRef::VariableSetStmt(s) => variable_set(s),
        NodeRef::AlterSystemStmt(_) => {
            Ok(OperationInfo::new(ALTER_SYSTEM, LockStrength::AccessExclusive))
        }
        NodeRef::CheckPointStmt(_) => Ok(OperationInfo::new(CHECKPOINT, LockStrength::None)),
        NodeRef::LoadStmt(_) => Ok(OperationInfo::new(LOAD, LockStrength::None)),
        NodeRef::CommentStmt(_) => {
            Ok(OperationInfo::new(COMMENT_ON, LockStrength::ShareUpdateExclusive))
        }
        NodeRef::CreatedbStmt(_) => {
            Ok(OperationInfo::new(CREATE_DATABASE, LockStrength::AccessExclusive))
        }
        NodeRef::AlterDatabaseStmt(_) => {
            Ok(OperationInfo::new(ALTER_DATABASE, LockStrength::AccessExclusive))
        }
        NodeRef::CreateTableSpaceStmt(_) => {
            Ok(OperationInfo::new(CREATE_TABLESPACE, LockStrength::AccessExclusive))
        }
        NodeRef::CreateSubscriptionStmt(_) => {
            Ok(OperationInfo::new(CREATE_SUBSCRIPTION, LockStrength::AccessExclusive))
        }
        NodeRef::CreatePublicationStmt(_) => {
            Ok(OperationInfo::new(CREATE_PUBLICATION, LockStrength::AccessExclusive))
        }
        NodeRef::CreateDomainStmt(_) => {
            Ok(OperationInfo::new(CREATE_DOMAIN, LockStrength::AccessExclusive))
        }
        NodeRef::CreateExtensionStmt(_) => {
            Ok(OperationInfo::new(CREATE_EXTENSION, LockStrength::AccessExclusive))
        }
        NodeRef::CreateFunctionStmt(s) => {
            let tag = if s.is_procedure { CREATE_PROCEDURE } else { CREATE_FUNCTION };
            Ok(OperationInfo::new(tag, LockStrength::AccessExclusive))
        }
        NodeRef::CreateSeqStmt(_) => {
            Ok(OperationInfo::new(CREATE_SEQUENCE, LockStrength::AccessExclusive))
        }
        NodeRef::ViewStmt(s) => {
            let lock = if s.replace {
                LockStrength::AccessExclusive
            } else {
                LockStrength::AccessExclusive
            };
            Ok(OperationInfo::new(CREATE_VIEW, lock))
        }
        NodeRef::CreateSchemaStmt(_) => {
            Ok(OperationInfo::new(CREATE_SCHEMA, LockStrength::AccessExclusive))
        }
        NodeRef::CreateTrigStmt(_) => {
            Ok(OperationInfo::new(CREATE_TRIGGER, LockStrength::ShareRowExclusive))
        }
        NodeRef::RuleStmt(_) => Ok(OperationInfo::new(CREATE_RULE, LockStrength::AccessExclusive)),
        NodeRef::CreatePolicyStmt(_) => {
            Ok(OperationInfo::new(CREATE_POLICY, LockStrength::AccessExclusive))
        }
        NodeRef::CreateFdwStmt(_) => {
            Ok(OperationInfo::new(CREATE_FOREIGN_DATA_WRAPPER, LockStrength::AccessExclusive))
        }
        NodeRef::CreateForeignServerStmt(_) => {
            Ok(OperationInfo::new(CREATE_SERVER, LockStrength::AccessExclusive))
        }
        NodeRef::CreateUserMappingStmt(_) => {
            Ok(OperationInfo::new(CREATE_USER_MAPPING, LockStrength::AccessExclusive))
        }
        NodeRef::CreateRoleStmt(_) => {
            Ok(OperationInfo::new(CREATE_ROLE, LockStrength::AccessExclusive))
        }
        NodeRef::CreateEventTrigStmt(_) => {
            Ok(OperationInfo::new(CREATE_EVENT_TRIGGER, LockStrength::AccessExclusive))
        }
        NodeRef::CreateStatsStmt(_) => {
            Ok(OperationInfo::new(CREATE_STATISTICS, LockStrength::ShareUpdateExclusive))
        }
        NodeRef::CreateCastStmt(_) => {
            Ok(OperationInfo::new(CREATE_CAST, LockStrength::AccessExclusive))
        }
        NodeRef::DefineStmt(s) => define_stmt(s),
        _ => Err(ClassifyError::UnrecognizedStatement
            .with_context("classify::misc called with an unhandled statement")),
    }
}

fn lock_table(s: &pg_query::protobuf::LockStmt) -> crate::Result<OperationInfo> {
    let (tag, lock) = match s.mode {
        1 => (LOCK_TABLE_ACCESS_SHARE, LockStrength::AccessShare),
        2 => (LOCK_TABLE_ROW_SHARE, LockStrength::RowShare),
        3 => (LOCK_TABLE_ROW_EXCLUSIVE, LockStrength::RowExclusive),
        4 => (
            LOCK_TABLE_SHARE_UPDATE_EXCLUSIVE,
            LockStrength::ShareUpdateExclusive,
        ),
        5 => (LOCK_TABLE_SHARE, LockStrength::Share),
        6 => (
            LOCK_TABLE_SHARE_ROW_EXCLUSIVE,
            LockStrength::ShareRowExclusive,
        ),
        7 => (LOCK_TABLE_EXCLUSIVE, LockStrength::Exclusive),
        8 => (LOCK_TABLE_ACCESS_EXCLUSIVE, LockStrength::AccessExclusive),
        other => {
            return Err(ClassifyError::MalformedAst
                .with_context(format!("LOCK TABLE has unrecognized mode {other}")))
        }
    };
    Ok(OperationInfo::new(tag, lock))
}

fn grant(s: &pg_query::protobuf::GrantStmt) -> crate::Result<OperationInfo> {
    let objtype = ObjectType::from_i32(s.objtype).ok_or_else(|| {
        ClassifyError::MalformedAst.with_context("GRANT/REVOKE has unrecognized object type")
    })?;
    let tag = match (s.is_grant, objtype) {
        (true, ObjectType::ObjectTable) => GRANT_TABLE,
        (false, ObjectType::ObjectTable) => REVOKE_TABLE,
        (true, ObjectType::ObjectSchema) => GRANT_SCHEMA,
        (false, ObjectType::ObjectSchema) => REVOKE_SCHEMA,
        (true, ObjectType::ObjectSequence) => GRANT_SEQUENCE,
        (false, ObjectType::ObjectSequence) => REVOKE_SEQUENCE,
        (true, ObjectType::ObjectFunction) | (true, ObjectType::ObjectProcedure) => GRANT_FUNCTION,
        (false, ObjectType::ObjectFunction) | (false, ObjectType::ObjectProcedure) => {
            REVOKE_FUNCTION
        }
        (true, ObjectType::ObjectDatabase) => GRANT_DATABASE,
        (false, ObjectType::ObjectDatabase) => REVOKE_DATABASE,
        _ => {
            return Err(ClassifyError::UnrecognizedStatement
                .with_context(format!("unsupported GRANT/REVOKE object type {:?}", objtype)))
        }
    };
    Ok(OperationInfo::new(tag, LockStrength::AccessExclusive))
}

fn variable_set(s: &pg_query::protobuf::VariableSetStmt) -> crate::Result<OperationInfo> {
    let kind = VariableSetKind::from_i32(s.kind).ok_or_else(|| {
        ClassifyError::MalformedAst.with_context("SET statement has unrecognized kind")
    })?;
    let tag = match kind {
        VariableSetKind::VarReset | VariableSetKind::VarResetAll => RESET,
        _ if s.is_local => SET_LOCAL,
        _ => SET,
    };
    Ok(OperationInfo::new(tag, LockStrength::None))
}

fn define_stmt(s: &pg_query::protobuf::DefineStmt) -> crate::Result<OperationInfo> {
    let kind = ObjectType::from_i32(s.kind).ok_or_else(|| {
        ClassifyError::MalformedAst.with_context("DEFINE statement has unrecognized object kind")
    })?;
    let tag = match kind {
        ObjectType::ObjectAggregate => CREATE_AGGREGATE,
        ObjectType::ObjectOperator => CREATE_OPERATOR,
        ObjectType::ObjectCollation => CREATE_COLLATION,
        ObjectType::ObjectTsconfiguration => CREATE_TEXT_SEARCH_CONFIGURATION,
        ObjectType::ObjectTsdictionary => CREATE_TEXT_SEARCH_DICTIONARY,
        ObjectType::ObjectTsparser => CREATE_TEXT_SEARCH_PARSER,
        ObjectType::ObjectTstemplate => CREATE_TEXT_SEARCH_TEMPLATE,
        ObjectType::ObjectType => CREATE_TYPE,
        _ => {
            return Err(ClassifyError::UnrecognizedStatement
                .with_context(format!("unsupported CREATE of kind {:?}", kind)))
        }
    };
    Ok(OperationInfo::new(tag, LockStrength::AccessExclusive))
}
