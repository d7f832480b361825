/// PostgreSQL's eight table-lock modes, plus a sentinel for statements that take none.
pub mod lock_strength;

/// The constraint-kind discriminator (`contype` column of `pg_constraint`), reused
/// by the classifier and suggestion metadata extractors.
pub mod contype;
