//! Tag-specific AST metadata extraction feeding the suggestion templates
//! Each function is a narrow, single-purpose walk; a shape the
//! function doesn't recognize returns `None` rather than panicking, which the
//! caller treats as "suppress the suggestion, keep the classification."

use once_cell::sync::Lazy;
use pg_query::protobuf::node::Node;
use pg_query::protobuf::ConstrType;
use pg_query::NodeRef;
use serde_json::{json, Map, Value};

use crate::classify::tags::*;
use crate::classify::OperationTag;
use crate::ident;

pub type Metadata = Map<String, Value>;

fn relation_name(rv: &pg_query::protobuf::RangeVar) -> String {
    let schema = if rv.schemaname.is_empty() {
        None
    } else {
        Some(rv.schemaname.as_str())
    };
    ident::qualify(schema, &rv.relname)
}

static DEFAULT_VALUE_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"(?is)\bdefault\s+([^,)]+)").unwrap());

static SET_CLAUSE_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"(?is)\bset\s+(.*?)(?:\bwhere\b|$)").unwrap());

fn extract_default_text(raw_sql: &str) -> Option<String> {
    DEFAULT_VALUE_RE
        .captures(raw_sql)
        .map(|c| c[1].trim().trim_end_matches(';').to_string())
}

fn extract_set_clause(raw_sql: &str) -> Option<String> {
    SET_CLAUSE_RE
        .captures(raw_sql)
        .map(|c| c[1].trim().trim_end_matches(';').trim().to_string())
}

fn col_type_as_string(coldef: &pg_query::protobuf::ColumnDef) -> Option<String> {
    let tp = coldef.type_name.as_ref()?;
    let parts: Vec<String> = tp
        .names
        .iter()
        .filter_map(|n| match n.node.as_ref() {
            Some(Node::String(s)) if s.sval != "pg_catalog" => Some(s.sval.clone()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

fn add_column_coldef(cmds: &[pg_query::protobuf::Node]) -> Option<&pg_query::protobuf::ColumnDef> {
    cmds.iter().find_map(|c| match c.node.as_ref() {
        Some(Node::AlterTableCmd(cmd)) => match cmd.def.as_deref().and_then(|n| n.node.as_ref()) {
            Some(Node::ColumnDef(coldef)) => Some(coldef),
            _ => None,
        },
        _ => None,
    })
}

fn alter_table_cmd_named<'a>(
    cmds: &'a [pg_query::protobuf::Node],
    subtype: pg_query::protobuf::AlterTableType,
) -> Option<&'a pg_query::protobuf::AlterTableCmd> {
    cmds.iter().find_map(|c| match c.node.as_ref() {
        Some(Node::AlterTableCmd(cmd))
            if pg_query::protobuf::AlterTableType::from_i32(cmd.subtype) == Some(subtype) =>
        {
            Some(cmd)
        }
        _ => None,
    })
}

fn update_without_where(ast: NodeRef, raw_sql: &str) -> Option<Metadata> {
    let NodeRef::UpdateStmt(s) = ast else { return None };
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(s.relation.as_ref()?)));
    m.insert("idColumn".into(), json!("id"));
    m.insert("columnsValues".into(), json!(extract_set_clause(raw_sql)?));
    Some(m)
}

fn delete_without_where(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::DeleteStmt(s) = ast else { return None };
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(s.relation.as_ref()?)));
    m.insert("idColumn".into(), json!("id"));
    Some(m)
}

fn merge_without_where(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::MergeStmt(s) = ast else { return None };
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(s.relation.as_ref()?)));
    m.insert("idColumn".into(), json!("id"));
    Some(m)
}

fn drop_index(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::DropStmt(s) = ast else { return None };
    let first = s.objects.first()?;
    let name = match first.node.as_ref()? {
        Node::List(list) => list
            .items
            .iter()
            .filter_map(|n| match n.node.as_ref() {
                Some(Node::String(v)) => Some(v.sval.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("."),
        Node::String(v) => v.sval.clone(),
        _ => return None,
    };
    let mut m = Metadata::new();
    m.insert("indexName".into(), json!(ident::quote(&name)));
    Some(m)
}

fn create_index(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::IndexStmt(s) = ast else { return None };
    let table = relation_name(s.relation.as_ref()?);
    let columns: Vec<String> = s
        .index_params
        .iter()
        .filter_map(|p| match p.node.as_ref() {
            Some(Node::IndexElem(e)) if !e.name.is_empty() => Some(e.name.clone()),
            _ => None,
        })
        .collect();
    let index_name = if !s.idxname.is_empty() {
        s.idxname.clone()
    } else {
        format!("idx_{}_{}", table.trim_matches('"'), columns.join("_"))
    };
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(table));
    m.insert("indexName".into(), json!(index_name));
    m.insert("columns".into(), json!(columns));
    Some(m)
}

fn reindex_object(ast: NodeRef, tag: OperationTag) -> Option<Metadata> {
    let NodeRef::ReindexStmt(s) = ast else { return None };
    let mut m = Metadata::new();
    let key = if tag == REINDEX_DATABASE {
        "databaseName"
    } else if tag == REINDEX_SCHEMA {
        "schemaName"
    } else if tag == REINDEX_TABLE {
        "tableName"
    } else {
        "indexName"
    };
    let value = if matches!(tag, t if t == REINDEX_DATABASE || t == REINDEX_SCHEMA) {
        s.name.clone()
    } else {
        relation_name(s.relation.as_ref()?)
    };
    m.insert(key.into(), json!(value));
    Some(m)
}

fn alter_table_add_column_volatile_default(ast: NodeRef, raw_sql: &str) -> Option<Metadata> {
    let NodeRef::AlterTableStmt(s) = ast else { return None };
    let coldef = add_column_coldef(&s.cmds)?;
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(s.relation.as_ref()?)));
    m.insert("columnName".into(), json!(coldef.colname.clone()));
    m.insert("dataType".into(), json!(col_type_as_string(coldef)?));
    m.insert("defaultValue".into(), json!(extract_default_text(raw_sql)?));
    m.insert("idColumn".into(), json!("id"));
    Some(m)
}

fn alter_table_alter_column_type(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::AlterTableStmt(s) = ast else { return None };
    let coldef = s.cmds.iter().find_map(|c| match c.node.as_ref() {
        Some(Node::AlterTableCmd(cmd))
            if pg_query::protobuf::AlterTableType::from_i32(cmd.subtype)
                == Some(pg_query::protobuf::AlterTableType::AtAlterColumnType) =>
        {
            match cmd.def.as_deref().and_then(|n| n.node.as_ref()) {
                Some(Node::ColumnDef(coldef)) => Some((cmd, coldef)),
                _ => None,
            }
        }
        _ => None,
    })?;
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(s.relation.as_ref()?)));
    m.insert("columnName".into(), json!(coldef.0.name.clone()));
    m.insert("newType".into(), json!(col_type_as_string(coldef.1)?));
    m.insert("idColumn".into(), json!("id"));
    Some(m)
}

fn alter_table_add_primary_key(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::AlterTableStmt(s) = ast else { return None };
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(s.relation.as_ref()?)));
    Some(m)
}

fn alter_table_add_constraint_check(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::AlterTableStmt(s) = ast else { return None };
    let conname = s.cmds.iter().find_map(|c| match c.node.as_ref() {
        Some(Node::AlterTableCmd(cmd)) => match cmd.def.as_deref().and_then(|n| n.node.as_ref()) {
            Some(Node::Constraint(cons))
                if ConstrType::from_i32(cons.contype) == Some(ConstrType::ConstrCheck) =>
            {
                Some(cons.conname.clone())
            }
            _ => None,
        },
        _ => None,
    });
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(s.relation.as_ref()?)));
    m.insert("constraintName".into(), json!(conname.unwrap_or_default()));
    Some(m)
}

fn alter_table_set_not_null(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::AlterTableStmt(s) = ast else { return None };
    let cmd = alter_table_cmd_named(&s.cmds, pg_query::protobuf::AlterTableType::AtSetNotNull)?;
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(s.relation.as_ref()?)));
    m.insert("column".into(), json!(cmd.name.clone()));
    Some(m)
}

fn cluster(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::ClusterStmt(s) = ast else { return None };
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(s.relation.as_ref()?)));
    m.insert("indexName".into(), json!(s.indexname.clone()));
    Some(m)
}

fn refresh_materialized_view(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::RefreshMatViewStmt(s) = ast else { return None };
    let mut m = Metadata::new();
    m.insert("viewName".into(), json!(relation_name(s.relation.as_ref()?)));
    Some(m)
}

fn vacuum_full(ast: NodeRef) -> Option<Metadata> {
    let NodeRef::VacuumStmt(s) = ast else { return None };
    let rel = s.rels.first()?.relation.as_ref()?;
    let mut m = Metadata::new();
    m.insert("tableName".into(), json!(relation_name(rel)));
    Some(m)
}

/// Dispatch to the extractor for `tag`. Returns `None` if the tag isn't
/// suggestion-bearing or the AST doesn't have the expected shape.
pub fn extract(tag: OperationTag, ast: NodeRef, raw_sql: &str) -> Option<Metadata> {
    match tag {
        t if t == UPDATE_WITHOUT_WHERE => update_without_where(ast, raw_sql),
        t if t == DELETE_WITHOUT_WHERE => delete_without_where(ast),
        t if t == MERGE_WITHOUT_WHERE => merge_without_where(ast),
        t if t == DROP_INDEX => drop_index(ast),
        t if t == CREATE_INDEX || t == CREATE_UNIQUE_INDEX => create_index(ast),
        t if t == REINDEX
            || t == REINDEX_TABLE
            || t == REINDEX_DATABASE
            || t == REINDEX_SCHEMA =>
        {
            reindex_object(ast, tag)
        }
        t if t == ALTER_TABLE_ADD_COLUMN_WITH_VOLATILE_DEFAULT => {
            alter_table_add_column_volatile_default(ast, raw_sql)
        }
        t if t == ALTER_TABLE_ALTER_COLUMN_TYPE => alter_table_alter_column_type(ast),
        t if t == ALTER_TABLE_ADD_PRIMARY_KEY => alter_table_add_primary_key(ast),
        t if t == ALTER_TABLE_ADD_CONSTRAINT_CHECK => alter_table_add_constraint_check(ast),
        t if t == ALTER_TABLE_SET_NOT_NULL => alter_table_set_not_null(ast),
        t if t == CLUSTER => cluster(ast),
        t if t == REFRESH_MATERIALIZED_VIEW => refresh_materialized_view(ast),
        t if t == VACUUM_FULL => vacuum_full(ast),
        _ => None,
    }
}
