//! Walks a statement's AST subtree collecting every referenced relation, annotated
//! with the strength of the lock the statement shape implies for it.

use std::collections::HashMap;

use pg_query::protobuf::node::Node;
use pg_query::protobuf::{ObjectType, RangeVar};
use pg_query::NodeRef;

use crate::ident;
use crate::pg_types::lock_strength::LockStrength;

fn relation_name(rv: &RangeVar) -> String {
    let schema = if rv.schemaname.is_empty() {
        None
    } else {
        Some(rv.schemaname.as_str())
    };
    ident::qualify(schema, &rv.relname)
}

fn record(out: &mut HashMap<String, LockStrength>, name: String, lock: LockStrength) {
    out.entry(name)
        .and_modify(|existing| {
            if lock > *existing {
                *existing = lock;
            }
        })
        .or_insert(lock);
}

/// Walk any expression node looking for sub-selects, recording every relation they
/// read. Covers the common containers (`BoolExpr`, `A_Expr`, `SubLink`, `CaseExpr`,
/// `CoalesceExpr`, `FuncCall`, `TypeCast`, `NullTest`); not an exhaustive walk of
/// every pg_query expression variant, but enough for migration-script-shaped SQL.
fn walk_expr(node: &Node, out: &mut HashMap<String, LockStrength>) {
    match node {
        Node::SubLink(s) => {
            if let Some(q) = s.subselect.as_deref().and_then(|n| n.node.as_ref()) {
                walk_expr(q, out);
            }
        }
        Node::SelectStmt(s) => collect_select_reads(s, out),
        Node::BoolExpr(b) => {
            for a in &b.args {
                if let Some(n) = a.node.as_ref() {
                    walk_expr(n, out);
                }
            }
        }
        Node::AExpr(a) => {
            if let Some(n) = a.lexpr.as_deref().and_then(|n| n.node.as_ref()) {
                walk_expr(n, out);
            }
            if let Some(n) = a.rexpr.as_deref().and_then(|n| n.node.as_ref()) {
                walk_expr(n, out);
            }
        }
        Node::CaseExpr(c) => {
            for w in &c.args {
                if let Some(Node::CaseWhen(cw)) = w.node.as_ref() {
                    if let Some(n) = cw.expr.as_deref().and_then(|n| n.node.as_ref()) {
                        walk_expr(n, out);
                    }
                    if let Some(n) = cw.result.as_deref().and_then(|n| n.node.as_ref()) {
                        walk_expr(n, out);
                    }
                }
            }
            if let Some(n) = c.defresult.as_deref().and_then(|n| n.node.as_ref()) {
                walk_expr(n, out);
            }
        }
        Node::CoalesceExpr(c) => {
            for a in &c.args {
                if let Some(n) = a.node.as_ref() {
                    walk_expr(n, out);
                }
            }
        }
        Node::FuncCall(f) => {
            for a in &f.args {
                if let Some(n) = a.node.as_ref() {
                    walk_expr(n, out);
                }
            }
        }
        Node::TypeCast(t) => {
            if let Some(n) = t.arg.as_deref().and_then(|n| n.node.as_ref()) {
                walk_expr(n, out);
            }
        }
        Node::NullTest(t) => {
            if let Some(n) = t.arg.as_deref().and_then(|n| n.node.as_ref()) {
                walk_expr(n, out);
            }
        }
        _ => {}
    }
}

fn walk_from_item(node: &Node, out: &mut HashMap<String, LockStrength>) {
    match node {
        Node::RangeVar(rv) => record(out, relation_name(rv), LockStrength::AccessShare),
        Node::JoinExpr(j) => {
            if let Some(n) = j.larg.as_deref().and_then(|n| n.node.as_ref()) {
                walk_from_item(n, out);
            }
            if let Some(n) = j.rarg.as_deref().and_then(|n| n.node.as_ref()) {
                walk_from_item(n, out);
            }
            if let Some(n) = j.quals.as_deref().and_then(|n| n.node.as_ref()) {
                walk_expr(n, out);
            }
        }
        Node::RangeSubselect(r) => {
            if let Some(Node::SelectStmt(s)) = r.subquery.as_deref().and_then(|n| n.node.as_ref())
            {
                collect_select_reads(s, out);
            }
        }
        _ => {}
    }
}

fn walk_with_clause(
    with: Option<&pg_query::protobuf::WithClause>,
    out: &mut HashMap<String, LockStrength>,
) {
    let Some(with) = with else { return };
    for cte in &with.ctes {
        if let Some(Node::CommonTableExpr(cte)) = cte.node.as_ref() {
            if let Some(q) = cte.ctequery.as_deref().and_then(|n| n.node.as_ref()) {
                match q {
                    Node::SelectStmt(s) => collect_select_reads(s, out),
                    Node::UpdateStmt(u) => {
                        if let Some(rel) = &u.relation {
                            record(out, relation_name(rel), LockStrength::RowExclusive);
                        }
                        collect_clause_reads(&u.from_clause, u.where_clause.as_deref(), out);
                    }
                    Node::DeleteStmt(d) => {
                        if let Some(rel) = &d.relation {
                            record(out, relation_name(rel), LockStrength::RowExclusive);
                        }
                        collect_clause_reads(&d.using_clause, d.where_clause.as_deref(), out);
                    }
                    Node::InsertStmt(i) => {
                        if let Some(rel) = &i.relation {
                            record(out, relation_name(rel), LockStrength::RowExclusive);
                        }
                        if let Some(Node::SelectStmt(s)) =
                            i.select_stmt.as_deref().and_then(|n| n.node.as_ref())
                        {
                            collect_select_reads(s, out);
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

fn collect_clause_reads(
    items: &[pg_query::protobuf::Node],
    where_clause: Option<&pg_query::protobuf::Node>,
    out: &mut HashMap<String, LockStrength>,
) {
    for item in items {
        if let Some(n) = item.node.as_ref() {
            walk_from_item(n, out);
        }
    }
    if let Some(n) = where_clause.and_then(|n| n.node.as_ref()) {
        walk_expr(n, out);
    }
}

fn collect_select_reads(
    s: &pg_query::protobuf::SelectStmt,
    out: &mut HashMap<String, LockStrength>,
) {
    collect_clause_reads(&s.from_clause, s.where_clause.as_deref(), out);
    walk_with_clause(s.with_clause.as_ref(), out);
    if let Some(n) = s.larg.as_deref() {
        collect_select_reads(n, out);
    }
    if let Some(n) = s.rarg.as_deref() {
        collect_select_reads(n, out);
    }
}

/// Returns the CTE query nodes attached to a DML statement's `WITH` clause, as
/// [`NodeRef`]s ready for independent classification (used by the recursive DML
/// analysis in [`crate::classify`]).
pub fn cte_queries(stmt: NodeRef) -> Vec<NodeRef> {
    let with = match stmt {
        NodeRef::SelectStmt(s) => s.with_clause.as_ref(),
        NodeRef::UpdateStmt(s) => s.with_clause.as_ref(),
        NodeRef::DeleteStmt(s) => s.with_clause.as_ref(),
        NodeRef::InsertStmt(s) => s.with_clause.as_ref(),
        _ => None,
    };
    let Some(with) = with else { return vec![] };
    with.ctes
        .iter()
        .filter_map(|cte| match cte.node.as_ref() {
            Some(Node::CommonTableExpr(cte)) => cte.ctequery.as_deref().and_then(|n| n.node.as_ref()).map(|n| n.to_ref()),
            _ => None,
        })
        .collect()
}

/// Extracts every relation a statement references, annotated with the lock
/// strength implied by its role (write target vs. read source). Write locks win
/// on conflict.
pub fn extract(stmt: NodeRef) -> HashMap<String, LockStrength> {
    let mut out = HashMap::new();
    match stmt {
        NodeRef::UpdateStmt(s) => {
            if let Some(rel) = &s.relation {
                record(&mut out, relation_name(rel), LockStrength::RowExclusive);
            }
            collect_clause_reads(&s.from_clause, s.where_clause.as_deref(), &mut out);
            walk_with_clause(s.with_clause.as_ref(), &mut out);
        }
        NodeRef::DeleteStmt(s) => {
            if let Some(rel) = &s.relation {
                record(&mut out, relation_name(rel), LockStrength::RowExclusive);
            }
            collect_clause_reads(&s.using_clause, s.where_clause.as_deref(), &mut out);
            walk_with_clause(s.with_clause.as_ref(), &mut out);
        }
        NodeRef::InsertStmt(s) => {
            if let Some(rel) = &s.relation {
                record(&mut out, relation_name(rel), LockStrength::RowExclusive);
            }
            if let Some(Node::SelectStmt(sel)) =
                s.select_stmt.as_deref().and_then(|n| n.node.as_ref())
            {
                collect_select_reads(sel, &mut out);
            }
            walk_with_clause(s.with_clause.as_ref(), &mut out);
        }
        NodeRef::MergeStmt(s) => {
            if let Some(rel) = &s.relation {
                record(&mut out, relation_name(rel), LockStrength::RowExclusive);
            }
            if let Some(Node::RangeVar(rv)) =
                s.source_relation.as_deref().and_then(|n| n.node.as_ref())
            {
                record(&mut out, relation_name(rv), LockStrength::AccessShare);
            }
        }
        NodeRef::CopyStmt(s) => {
            if let Some(rel) = &s.relation {
                let lock = if s.is_from {
                    LockStrength::RowExclusive
                } else {
                    LockStrength::AccessShare
                };
                record(&mut out, relation_name(rel), lock);
            }
        }
        NodeRef::SelectStmt(s) => collect_select_reads(s, &mut out),
        NodeRef::AlterTableStmt(s) => {
            if let Some(rel) = &s.relation {
                record(&mut out, relation_name(rel), LockStrength::AccessExclusive);
            }
        }
        NodeRef::IndexStmt(s) => {
            if let Some(rel) = &s.relation {
                record(&mut out, relation_name(rel), LockStrength::Share);
            }
        }
        NodeRef::TruncateStmt(s) => {
            for rel in &s.relations {
                if let Some(Node::RangeVar(rv)) = rel.node.as_ref() {
                    record(&mut out, relation_name(rv), LockStrength::AccessExclusive);
                }
            }
        }
        NodeRef::ReindexStmt(s) => {
            if let Some(rel) = &s.relation {
                record(&mut out, relation_name(rel), LockStrength::AccessExclusive);
            }
        }
        NodeRef::VacuumStmt(s) => {
            for rel in &s.rels {
                if let Some(rv) = &rel.relation {
                    record(&mut out, relation_name(rv), LockStrength::ShareUpdateExclusive);
                }
            }
        }
        NodeRef::ClusterStmt(s) => {
            if let Some(rel) = &s.relation {
                record(&mut out, relation_name(rel), LockStrength::AccessExclusive);
            }
        }
        NodeRef::RefreshMatViewStmt(s) => {
            if let Some(rel) = &s.relation {
                record(&mut out, relation_name(rel), LockStrength::Exclusive);
            }
        }
        NodeRef::LockStmt(s) => {
            for rel in &s.relations {
                if let Some(Node::RangeVar(rv)) = rel.node.as_ref() {
                    record(&mut out, relation_name(rv), LockStrength::AccessExclusive);
                }
            }
        }
        NodeRef::DropStmt(s) => {
            let remove_type = ObjectType::from_i32(s.remove_type);
            let names_relation_first = matches!(
                remove_type,
                Some(ObjectType::ObjectTrigger)
                    | Some(ObjectType::ObjectRule)
                    | Some(ObjectType::ObjectPolicy)
            );
            for obj in &s.objects {
                if let Some(Node::List(list)) = obj.node.as_ref() {
                    let parts: Vec<String> = list
                        .items
                        .iter()
                        .filter_map(|n| match n.node.as_ref() {
                            Some(Node::String(v)) => Some(v.sval.clone()),
                            _ => None,
                        })
                        .collect();
                    if names_relation_first {
                        // DROP TRIGGER/RULE/POLICY name the containing relation first;
                        // that's the name that carries the lock, not the object itself.
                        if let Some(first) = parts.first() {
                            record(&mut out, ident::quote(first), LockStrength::AccessExclusive);
                        }
                    } else if let Some((name, schema)) = parts.split_last() {
                        let schema = schema.last().map(String::as_str);
                        record(
                            &mut out,
                            ident::qualify(schema, name),
                            LockStrength::AccessExclusive,
                        );
                    }
                } else if let Some(Node::String(v)) = obj.node.as_ref() {
                    record(&mut out, ident::quote(&v.sval), LockStrength::AccessExclusive);
                }
            }
        }
        _ => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> pg_query::ParseResult {
        pg_query::parse(sql).unwrap()
    }

    fn node_ref(result: &pg_query::ParseResult) -> NodeRef {
        result.protobuf.stmts[0]
            .stmt
            .as_ref()
            .unwrap()
            .node
            .as_ref()
            .unwrap()
            .to_ref()
    }

    #[test]
    fn select_1_has_no_relations() {
        let p = parse("SELECT 1");
        assert!(extract(node_ref(&p)).is_empty());
    }

    #[test]
    fn update_from_distinguishes_write_and_read() {
        let p = parse("UPDATE a SET x = b.x FROM b WHERE a.id = b.id");
        let locks = extract(node_ref(&p));
        assert_eq!(locks.get("a"), Some(&LockStrength::RowExclusive));
        assert_eq!(locks.get("b"), Some(&LockStrength::AccessShare));
    }

    #[test]
    fn delete_using_is_a_read() {
        let p = parse(
            "DELETE FROM sessions USING users WHERE sessions.user_id = users.id AND users.inactive = true",
        );
        let locks = extract(node_ref(&p));
        assert_eq!(locks.get("sessions"), Some(&LockStrength::RowExclusive));
        assert_eq!(locks.get("users"), Some(&LockStrength::AccessShare));
    }
}
