use crate::classify::ClassifyError;
use handlebars::RenderError;
use serde::de::StdError;
use std::fmt::{Display, Formatter};

/// An error with accumulated human-readable context, in the order it was attached.
///
/// Call sites add context with [`ContextualError::with_context`]/[`ContextualResult::with_context`]
/// as an error travels up through nested AST walks, so the outermost caller sees both the root
/// cause and the path that led to it.
#[derive(Debug)]
pub struct Error {
    context: Vec<String>,
    pub inner: InnerError,
}

impl<E> From<E> for Error
where
    E: Into<InnerError>,
{
    fn from(e: E) -> Self {
        Error {
            context: vec![],
            inner: e.into(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.inner)?;
        for ctx in &self.context {
            write!(f, "\n  {}", ctx)?;
        }
        Ok(())
    }
}

impl StdError for Error {}

pub trait ContextualError {
    fn with_context<S: Into<String>>(self, ctx: S) -> Error;
}

pub trait ContextualResult<T, E> {
    fn with_context<S: Into<String>>(self, ctx: S) -> Result<T, Error>;
}

impl<T> ContextualError for T
where
    T: Into<InnerError>,
{
    fn with_context<S: Into<String>>(self, ctx: S) -> Error {
        Error {
            context: vec![ctx.into()],
            inner: self.into(),
        }
    }
}

impl<T, E> ContextualResult<T, E> for Result<T, E>
where
    E: Into<InnerError>,
{
    fn with_context<S: Into<String>>(self, ctx: S) -> Result<T, Error> {
        self.map_err(|e| e.into().with_context(ctx))
    }
}

impl ContextualError for Error {
    fn with_context<S: Into<String>>(mut self, ctx: S) -> Error {
        self.context.push(ctx.into());
        self
    }
}

impl<T> ContextualResult<T, Error> for Result<T, Error> {
    fn with_context<S: Into<String>>(self, ctx: S) -> Result<T, Error> {
        self.map_err(|e| e.with_context(ctx))
    }
}

/// The closed set of root causes the core can produce. Classifier failures
/// are recoverable by the sequence driver; everything else
/// here is a genuine bug in the input or the template catalog.
#[derive(Debug)]
pub enum InnerError {
    SqlText(pg_query::Error),
    IO(std::io::Error),
    /// The classifier could not describe a statement's AST.
    /// The sequence driver catches this and substitutes an `Info` placeholder result.
    Classify(ClassifyError),
    InvalidContype(char),
    Template(RenderError),
    SerdeError(serde_json::Error),
}

impl From<serde_json::Error> for InnerError {
    fn from(value: serde_json::Error) -> Self {
        InnerError::SerdeError(value)
    }
}

impl From<RenderError> for InnerError {
    fn from(e: RenderError) -> Self {
        InnerError::Template(e)
    }
}

impl From<pg_query::Error> for InnerError {
    fn from(e: pg_query::Error) -> Self {
        InnerError::SqlText(e)
    }
}

impl From<std::io::Error> for InnerError {
    fn from(e: std::io::Error) -> Self {
        InnerError::IO(e)
    }
}

impl From<ClassifyError> for InnerError {
    fn from(value: ClassifyError) -> Self {
        InnerError::Classify(value)
    }
}
