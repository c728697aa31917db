//! The provider boundary: the session and query traits the execution
//! layer drives, and the row representation results come back in.
//!
//! A [`Session`] is the entity-manager equivalent supplied by the
//! embedding application. A [`SessionQuery`] is the per-execution query
//! object obtained from it; provider query objects are not reusable
//! across calls, so a fresh one is created for every execution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::{ToValue, Value};
use crate::{Error, Result};

pub mod mem;

pub use mem::MemSession;

/// A single result row: property names mapped to values.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    /// An empty row.
    pub fn new() -> Self {
        Row::default()
    }

    /// Sets a property and returns `self`, for chained construction.
    pub fn with(mut self, name: &str, value: impl ToValue) -> Self {
        self.set(name, value.to_value());
        self
    }

    /// Sets a property value.
    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// The value of a property, if the row carries it.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The value of a property, failing if the row does not carry it.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| Error::MissingProperty(name.to_string()))
    }

    /// The number of properties in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Tests whether the row carries no properties.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The row's values, in property-name order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.values()
    }

    /// The row's properties and values, in property-name order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// A provider query object for one execution.
///
/// Parameters are bound by 1-based position or by name; unbound
/// placeholders surface as [`Error::UnboundParameter`] at execution.
pub trait SessionQuery {
    /// Binds a value to the 1-based positional placeholder `position`.
    fn set_parameter(&mut self, position: usize, value: Value) -> Result<()>;
    /// Binds a value to the named placeholder `name`.
    fn set_named_parameter(&mut self, name: &str, value: Value) -> Result<()>;
    /// Skips the first `offset` result rows.
    fn set_first_result(&mut self, offset: usize);
    /// Caps the result at `limit` rows.
    fn set_max_results(&mut self, limit: usize);
    /// Attaches a provider hint.
    fn set_hint(&mut self, name: &str, value: &str);
    /// Executes for all matching rows.
    fn result_list(&mut self) -> Result<Vec<Row>>;
    /// Executes for exactly one row. Signals [`Error::NoResult`] when
    /// nothing matches and [`Error::NonUniqueResult`] when more than one
    /// row does.
    fn single_result(&mut self) -> Result<Row>;
    /// Executes a bulk update or delete, returning the affected-row count.
    fn execute_update(&mut self) -> Result<usize>;
}

/// The entity-manager equivalent: creates query objects, resolves named
/// queries, and stores entity rows.
pub trait Session {
    /// Creates a fresh query object from query text. Malformed text may
    /// be rejected here or at execution, depending on the provider.
    fn create_query(&self, query: &str) -> Result<Box<dyn SessionQuery + '_>>;
    /// Tests whether a named query is registered under `name`.
    fn has_named_query(&self, name: &str) -> bool;
    /// Creates a fresh query object for the named query registered under
    /// `name`, failing with [`Error::UnknownNamedQuery`] if there is none.
    fn create_named_query(&self, name: &str) -> Result<Box<dyn SessionQuery + '_>>;
    /// The registered text of a named query, where the provider supports
    /// introspecting it. Providers without that capability return `None`,
    /// which rules out deriving count queries for pagination.
    fn named_query_text(&self, name: &str) -> Option<String>;
    /// Invalidates whatever unit-of-work caching the provider maintains.
    /// Called after every bulk modify so subsequent reads are not served
    /// stale entities.
    fn clear_cached(&self);
    /// Inserts or replaces an entity row, keyed by its identifier
    /// property.
    fn persist(&self, entity: &str, id_property: &str, row: Row) -> Result<()>;
    /// Removes the entity row with the given identifier. Returns whether
    /// a row was removed.
    fn remove(&self, entity: &str, id_property: &str, id: &Value) -> Result<bool>;
}
