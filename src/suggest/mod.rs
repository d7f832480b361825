//! Suggestion engine: for a fixed catalog of dangerous operation tags, extract
//! AST metadata and render a multi-step remediation plan.

mod catalog;
mod metadata;
mod render;

use crate::classify::OperationTag;
use crate::severity::Severity;
use pg_query::NodeRef;

/// A remediation plan for one statement.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Suggestion {
    pub operation_tag: &'static str,
    pub category: &'static str,
    /// True when the steps don't fully replace the original operation's semantics
    /// (e.g. `pg_repack` for `CLUSTER`): the output layer should label it as such.
    pub is_partial: bool,
    pub steps: Vec<Step>,
}

/// One unit of a remediation plan.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Step {
    Sql {
        description: String,
        can_run_in_transaction: bool,
        sql: String,
    },
    External {
        description: String,
        can_run_in_transaction: bool,
        command: String,
    },
    Procedural {
        description: String,
        can_run_in_transaction: bool,
        notes: String,
    },
}

/// Build a [`Suggestion`] for `tag` if it's catalog-covered, its severity is
/// `Critical`, and metadata extraction succeeds. Returns `None` (never an error)
/// for every other case: a suppressed suggestion is not a
/// pipeline failure.
pub fn suggest(tag: OperationTag, severity: Severity, ast: NodeRef, raw_sql: &str) -> Option<Suggestion> {
    if severity != Severity::Critical {
        return None;
    }
    let template = catalog::lookup(tag)?;
    let data = metadata::extract(tag, ast, raw_sql)?;
    if let Some(missing) = template.missing_required_field(&data) {
        log::debug!("suppressing suggestion for {tag}: missing required field {missing}");
        return None;
    }
    let steps = template
        .steps
        .iter()
        .map(|step| render::render_step(step, &data))
        .collect();
    Some(Suggestion {
        operation_tag: tag.as_str(),
        category: template.category,
        is_partial: template.is_partial,
        steps,
    })
}
