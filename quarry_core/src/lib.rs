//! Library providing the functionality behind the `quarry` crate: a DAO
//! layer that derives queries from finder-method names, validates every
//! declared method eagerly against entity metadata, and dispatches
//! execution through a closed set of strategies.
//!
//! A DAO is assembled once, at startup, from a declarative
//! [`DaoConfig`][crate::dao::DaoConfig]. Every method it declares is parsed,
//! validated, and resolved to a runnable query at that point, so a broken
//! method name or a mismatched argument count fails construction rather
//! than the first call that reaches it.
#![deny(missing_docs)]

use thiserror::Error as ThisError;

pub mod dao;
pub mod db;
pub mod entity;
pub mod method;
pub mod page;
pub mod param;
pub mod query;
pub mod value;

pub use dao::{Dao, DaoConfig};
pub use db::{Row, Session, SessionQuery};
pub use entity::{EntityMeta, Property};
pub use method::{Hint, MethodDef, QueryMethod, ReturnShape};
pub use page::{Direction, Order, Page, PageRequest, Sort};
pub use param::{Arg, ParamDecl, ParameterBinder, Parameters};
pub use query::{Outcome, QueryExecution, QueryLookupStrategy, ResolvedQuery};
pub use value::{FromValue, ToValue, Value, ValueType};

/// Result type that uses [`crate::Error`].
pub type Result<T> = std::result::Result<T, crate::Error>;

/// A type persisted as rows of named property values.
///
/// The associated constants are the entity metadata the query-derivation
/// engine validates method names against. Property names use the
/// uncapitalized camel-case form the derivation grammar produces
/// (e.g. `emailAddress`), independent of the Rust field names.
pub trait Entity: Sized + Send + Sync {
    /// The entity name used in query text (`select x from <NAME> x`).
    const NAME: &'static str;
    /// The name of the identifier property.
    const ID: &'static str;
    /// Metadata for each persistent property.
    const PROPERTIES: &'static [Property];

    /// Load an entity from a result row.
    fn from_row(row: &Row) -> Result<Self>;
    /// Render the entity as a row of property values.
    fn to_row(&self) -> Row;
    /// The value of the identifier property.
    fn id_value(&self) -> Value;
}

/// Quarry errors.
///
/// Configuration and query-creation variants surface at DAO construction;
/// the rest surface per invocation. Nothing is silently swallowed except
/// the documented `NoResult` normalization performed by the single-entity
/// execution strategy.
#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    /// A method declaration violates a structural invariant, e.g. two
    /// pagination parameters or pagination combined with a sort parameter.
    #[error("Invalid method declaration: {0}")]
    InvalidMethod(String),
    /// A query could not be derived or resolved for a method.
    #[error("Could not create query for method {method}: {detail}")]
    QueryCreation {
        /// The offending method name.
        method: String,
        /// What went wrong.
        detail: String,
    },
    /// A derived-query method name references a property the entity does
    /// not have.
    #[error("No property {property} exists on entity {entity} (referenced by method {method})")]
    NoSuchProperty {
        /// The missing property, in its uncapitalized form.
        property: String,
        /// The entity the method is mapped against.
        entity: String,
        /// The offending method name.
        method: String,
    },
    /// The number of predicate terms parsed from a method name does not
    /// match the number of bindable parameters the method declares.
    #[error("Method {method} names {expected} predicate terms but declares {actual} bindable parameters")]
    ArgumentMismatch {
        /// The offending method name.
        method: String,
        /// Predicate terms parsed from the name.
        expected: usize,
        /// Bindable parameters declared.
        actual: usize,
    },
    /// The lookup strategy requires a declared query and neither an
    /// explicit query string nor a named query exists.
    #[error("No query declared for method {0}")]
    NoDeclaredQuery(String),
    /// An invocation named a method the DAO does not declare.
    #[error("No method named {0} on this DAO")]
    NoSuchMethod(String),
    /// The live argument array does not match the declared parameter count.
    #[error("Method {method} takes {expected} arguments but {actual} were supplied")]
    ArgumentCount {
        /// The invoked method.
        method: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },
    /// A live argument does not match the kind its parameter declares,
    /// e.g. a plain value supplied where a pagination directive is expected.
    #[error("Argument {position} of method {method} does not match the declared parameter kind")]
    ArgumentKind {
        /// The invoked method.
        method: String,
        /// Zero-based argument position.
        position: usize,
    },
    /// A count query cannot be derived from the given query text.
    #[error("Cannot derive a count query from: {0}")]
    UnsupportedCountQuery(String),
    /// No named query is registered under the given name.
    #[error("No named query registered under {0}")]
    UnknownNamedQuery(String),
    /// The provider signalled that a single-result query matched nothing.
    /// The single-entity execution strategy normalizes this to an absent
    /// value; anywhere else it propagates.
    #[error("Query returned no result")]
    NoResult,
    /// A single-result query matched more than one row.
    #[error("Query returned {0} results where a single one was expected")]
    NonUniqueResult(usize),
    /// A query was executed with a placeholder no argument was bound to.
    #[error("Parameter {0} was never bound")]
    UnboundParameter(String),
    /// A row does not carry a property it was expected to.
    #[error("Row carries no property {0}")]
    MissingProperty(String),
    /// A value could not be converted to the requested type.
    #[error("Type mismatch converting value. Expected {0}, found value {1:?}")]
    CannotConvert(ValueType, Value),
    /// The provider could not parse the query text. Malformed declared
    /// queries surface here on first execution.
    #[error("Malformed query: {0}")]
    QuerySyntax(String),
    /// An outcome accessor was called for a shape the method does not have.
    #[error("Expected a {expected} outcome, found {actual}")]
    UnexpectedShape {
        /// The requested shape.
        expected: &'static str,
        /// The shape the invocation produced.
        actual: &'static str,
    },
    /// A positional parameter index was out of range.
    #[error("Parameter index out of bounds: {0}")]
    BoundsError(String),
    /// Internal logic error.
    #[error("Internal logic error: {0}")]
    Internal(String),
}
