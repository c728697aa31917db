//! Execution strategies, one per result shape, and the outcome sum type
//! invocations produce.

use log::debug;

use crate::db::Session;
use crate::method::{QueryMethod, ReturnShape};
use crate::page::Page;
use crate::param::ParameterBinder;
use crate::query::{count_from_row, ResolvedQuery};
use crate::{Entity, Error, Result};

/// Stateless execution strategy, selected from a method's shape and
/// modifying flag at resolution time and dispatched on every invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryExecution {
    /// Execute and return all matching entities.
    Collection,
    /// Count first, then fetch one page of entities.
    Paged,
    /// Execute for at most one entity, normalizing the provider's
    /// no-result signal to an absent value.
    Single,
    /// Execute a bulk update or delete and return the affected-row count.
    Modifying,
}

impl QueryExecution {
    /// Selects the strategy for a validated method.
    pub fn of(method: &QueryMethod) -> Self {
        if method.is_modifying() {
            return QueryExecution::Modifying;
        }
        match method.shape() {
            ReturnShape::Single => QueryExecution::Single,
            ReturnShape::Collection => QueryExecution::Collection,
            ReturnShape::Page => QueryExecution::Paged,
        }
    }

    /// Runs one invocation: obtains fresh provider query objects, binds
    /// the live arguments through `binder`, executes, and post-processes
    /// the rows into the strategy's result shape.
    pub fn execute<T: Entity>(
        &self,
        query: &ResolvedQuery,
        session: &dyn Session,
        binder: &ParameterBinder,
    ) -> Result<Outcome<T>> {
        match self {
            QueryExecution::Collection => {
                let mut data = query.data_query(session, binder)?;
                binder.bind_and_paginate(&mut *data)?;
                Ok(Outcome::Collection(entities_from(data.result_list()?)?))
            }
            QueryExecution::Paged => {
                // Two independent round-trips: the total may disagree
                // with a concurrently mutated store.
                let mut count = query.count_query(session)?;
                binder.bind(&mut *count)?;
                let total = count_from_row(&count.single_result()?)?;
                let mut data = query.data_query(session, binder)?;
                binder.bind_and_paginate(&mut *data)?;
                let content = entities_from(data.result_list()?)?;
                let request = binder
                    .pageable()
                    .cloned()
                    .ok_or_else(|| Error::Internal("paged execution without a pagination directive".to_string()))?;
                Ok(Outcome::Page(Page::new(content, request, total)))
            }
            QueryExecution::Single => {
                let mut data = query.data_query(session, binder)?;
                binder.bind(&mut *data)?;
                match data.single_result() {
                    Ok(row) => Ok(Outcome::Single(Some(T::from_row(&row)?))),
                    Err(Error::NoResult) => Ok(Outcome::Single(None)),
                    Err(err) => Err(err),
                }
            }
            QueryExecution::Modifying => {
                let mut data = query.data_query(session, binder)?;
                binder.bind(&mut *data)?;
                let affected = data.execute_update()?;
                debug!("modifying query affected {affected} rows, clearing session cache");
                session.clear_cached();
                Ok(Outcome::Modified(affected))
            }
        }
    }
}

fn entities_from<T: Entity>(rows: Vec<crate::db::Row>) -> Result<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}

/// The result of one DAO method invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    /// At most one entity.
    Single(Option<T>),
    /// All matching entities.
    Collection(Vec<T>),
    /// One page of entities plus the total match count.
    Page(Page<T>),
    /// The affected-row count of a bulk update or delete.
    Modified(usize),
}

impl<T> Outcome<T> {
    fn shape_name(&self) -> &'static str {
        match self {
            Outcome::Single(_) => "single",
            Outcome::Collection(_) => "collection",
            Outcome::Page(_) => "page",
            Outcome::Modified(_) => "modified",
        }
    }

    /// The single-entity result, failing for any other shape.
    pub fn into_single(self) -> Result<Option<T>> {
        match self {
            Outcome::Single(entity) => Ok(entity),
            other => Err(Error::UnexpectedShape {
                expected: "single",
                actual: other.shape_name(),
            }),
        }
    }

    /// The collection result, failing for any other shape.
    pub fn into_collection(self) -> Result<Vec<T>> {
        match self {
            Outcome::Collection(entities) => Ok(entities),
            other => Err(Error::UnexpectedShape {
                expected: "collection",
                actual: other.shape_name(),
            }),
        }
    }

    /// The page result, failing for any other shape.
    pub fn into_page(self) -> Result<Page<T>> {
        match self {
            Outcome::Page(page) => Ok(page),
            other => Err(Error::UnexpectedShape {
                expected: "page",
                actual: other.shape_name(),
            }),
        }
    }

    /// The affected-row count, failing for any other shape.
    pub fn into_modified(self) -> Result<usize> {
        match self {
            Outcome::Modified(count) => Ok(count),
            other => Err(Error::UnexpectedShape {
                expected: "modified",
                actual: other.shape_name(),
            }),
        }
    }
}
