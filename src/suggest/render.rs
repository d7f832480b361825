//! Rendering a [`catalog::StepTemplate`](super::catalog::StepTemplate) against
//! extracted metadata into a user-facing [`Step`](super::Step).
//!
//! Templates are compiled-in string literals, never read from the filesystem
//! so this module renders ad hoc with
//! [`Handlebars::render_template`] rather than pre-registering named templates,
//! against a shared, strictly configured [`Handlebars`] instance.

use handlebars::{handlebars_helper, Handlebars};
use once_cell::sync::Lazy;

use super::catalog::{StepKind, StepTemplate};
use super::metadata::Metadata;
use super::Step;

handlebars_helper!(join: |list: array| {
    list.iter()
        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
        .collect::<Vec<_>>()
        .join(", ")
});

static ENGINE: Lazy<Handlebars> = Lazy::new(|| {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_helper("join", Box::new(join));
    hb
});

/// Render `template.body` against `data`, falling back to the raw template
/// string on any rendering error: a malformed template must never crash the
/// pipeline, only degrade the suggestion's readability.
fn render_body(body: &str, data: &Metadata) -> String {
    ENGINE
        .render_template(body, data)
        .unwrap_or_else(|e| {
            log::warn!("suggestion template render failed, using raw template: {e}");
            body.to_string()
        })
}

pub fn render_step(template: &StepTemplate, data: &Metadata) -> Step {
    let description = render_body(template.description, data);
    let body = render_body(template.body, data);
    match template.kind {
        StepKind::Sql => Step::Sql {
            description,
            can_run_in_transaction: template.can_run_in_transaction,
            sql: body,
        },
        StepKind::External => Step::External {
            description,
            can_run_in_transaction: template.can_run_in_transaction,
            command: body,
        },
        StepKind::Procedural => Step::Procedural {
            description,
            can_run_in_transaction: template.can_run_in_transaction,
            notes: body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_simple_fields() {
        let mut data = Metadata::new();
        data.insert("tableName".into(), "users".into());
        data.insert("indexName".into(), "users_email_idx".into());
        let template = StepTemplate {
            kind: StepKind::Sql,
            description: "Drop {{indexName}} on {{tableName}}",
            can_run_in_transaction: true,
            body: "DROP INDEX CONCURRENTLY {{indexName}}",
        };
        let step = render_step(&template, &data);
        match step {
            Step::Sql { description, sql, can_run_in_transaction } => {
                assert_eq!(description, "Drop users_email_idx on users");
                assert_eq!(sql, "DROP INDEX CONCURRENTLY users_email_idx");
                assert!(can_run_in_transaction);
            }
            _ => panic!("expected a Sql step"),
        }
    }

    #[test]
    fn joins_list_fields_with_the_join_helper() {
        let mut data = Metadata::new();
        data.insert("tableName".into(), "users".into());
        data.insert("indexName".into(), "users_a_b_idx".into());
        data.insert(
            "columns".into(),
            serde_json::json!(["a", "b"]),
        );
        let template = StepTemplate {
            kind: StepKind::Sql,
            description: "create index",
            can_run_in_transaction: false,
            body: "CREATE INDEX CONCURRENTLY {{indexName}} ON {{tableName}} ({{join columns}})",
        };
        let step = render_step(&template, &data);
        match step {
            Step::Sql { sql, .. } => {
                assert_eq!(sql, "CREATE INDEX CONCURRENTLY users_a_b_idx ON users (a, b)");
            }
            _ => panic!("expected a Sql step"),
        }
    }

    #[test]
    fn falls_back_to_raw_template_on_missing_field_in_non_strict_path() {
        let data = Metadata::new();
        let template = StepTemplate {
            kind: StepKind::Procedural,
            description: "desc",
            can_run_in_transaction: false,
            body: "{{undeclaredField}}",
        };
        let step = render_step(&template, &data);
        match step {
            Step::Procedural { notes, .. } => {
                assert_eq!(notes, "{{undeclaredField}}");
            }
            _ => panic!("expected a Procedural step"),
        }
    }
}
