//! lockstep statically classifies the lock behavior of PostgreSQL migration
//! scripts, without ever connecting to a database or executing a statement.
//!
//! Given a script, the library splits it into statements, classifies each
//! one's shape, looks up its lock severity in a compiled-in registry, and -
//! for the statements worth rewriting - renders a multi-step remediation
//! plan. Everything here is a pure function from script text to a list of
//! [`sequence::AnalysisResult`] values: no I/O beyond reading the script
//! itself, no shared mutable state.

/// Identifier quoting and qualification (`schema.table` vs. bare names).
pub mod ident;
/// Error types shared across the crate.
pub mod error;
/// Types that directly translate to PostgreSQL concepts: lock modes, constraint kinds.
pub mod pg_types;
/// Splits a script into parsed statements and tracks source line numbers.
pub mod parse;
/// Walks a statement's AST collecting every relation it references and the
/// lock strength implied for each.
pub mod relations;
/// Classifies a statement's AST into a canonical operation tag and lock.
pub mod classify;
/// The severity/lock-strength registry keyed by operation tag and transaction mode.
pub mod registry;
/// How urgently a statement's lock behavior should concern a reviewer.
pub mod severity;
/// Drives a statement sequence through the classifier and registry, tracking
/// transaction depth across the whole script.
pub mod sequence;
/// Tag-specific remediation suggestions for the statements worth rewriting.
pub mod suggest;

pub type Result<T> = std::result::Result<T, error::Error>;
