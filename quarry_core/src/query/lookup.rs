//! Query resolution: the lookup policy selecting between declared, named,
//! and derived queries, and the runnable query variants it produces.

use log::debug;

use crate::db::{Session, SessionQuery};
use crate::entity::EntityMeta;
use crate::method::{Hint, QueryMethod, ReturnShape};
use crate::param::ParameterBinder;
use crate::query::creator::QueryCreator;
use crate::query::{apply_sorting, count_query_for};
use crate::{Error, Result};

/// Policy for resolving a method to a runnable query, selected once per
/// DAO and evaluated once per method at construction time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum QueryLookupStrategy {
    /// Always derive the query from the method name.
    Create,
    /// Require an explicitly declared query string or a named query;
    /// absence of both fails construction.
    UseDeclaredQuery,
    /// Prefer a declared or named query, falling back to derivation.
    #[default]
    CreateIfNotFound,
}

impl QueryLookupStrategy {
    /// Resolves `method` to a runnable query.
    pub fn resolve(
        &self,
        method: &QueryMethod,
        meta: &EntityMeta,
        session: &dyn Session,
    ) -> Result<ResolvedQuery> {
        match self {
            QueryLookupStrategy::Create => Self::create(method, meta),
            QueryLookupStrategy::UseDeclaredQuery => Self::declared(method, session)?
                .ok_or_else(|| Error::NoDeclaredQuery(method.name().to_string())),
            QueryLookupStrategy::CreateIfNotFound => match Self::declared(method, session)? {
                Some(query) => Ok(query),
                None => Self::create(method, meta),
            },
        }
    }

    fn create(method: &QueryMethod, meta: &EntityMeta) -> Result<ResolvedQuery> {
        let text = QueryCreator::new(method, meta).create()?;
        debug!("derived query for {}: {text}", method.name());
        Ok(ResolvedQuery::Simple(SimpleQuery::new(method, text)?))
    }

    fn declared(method: &QueryMethod, session: &dyn Session) -> Result<Option<ResolvedQuery>> {
        if let Some(text) = method.declared_query() {
            debug!("using declared query for {}: {text}", method.name());
            let simple = SimpleQuery::new(method, text.to_string())?;
            return Ok(Some(ResolvedQuery::Simple(simple)));
        }
        NamedQuery::lookup(method, session)
    }
}

/// A resolved, runnable query paired with the count counterpart paged
/// execution needs. Built once per method; a fresh provider query object
/// is obtained from it on every execution.
#[derive(Clone, Debug)]
pub enum ResolvedQuery {
    /// Query text derived from the method name or explicitly declared.
    Simple(SimpleQuery),
    /// A provider named query resolved by convention.
    Named(NamedQuery),
}

impl ResolvedQuery {
    /// Produces the data query for one execution: a fresh provider query
    /// with the method's hints applied and, for simple queries, any
    /// dynamic sort from the live arguments injected into the text.
    pub fn data_query<'s>(
        &self,
        session: &'s dyn Session,
        binder: &ParameterBinder,
    ) -> Result<Box<dyn SessionQuery + 's>> {
        let mut query = match self {
            ResolvedQuery::Simple(simple) => {
                let text = match binder.sort() {
                    Some(sort) => apply_sorting(&simple.query, sort),
                    None => simple.query.clone(),
                };
                session.create_query(&text)?
            }
            // Named-query text cannot be rewritten; sort parameters were
            // rejected at construction and an embedded pageable sort is
            // not applied.
            ResolvedQuery::Named(named) => session.create_named_query(&named.name)?,
        };
        for hint in self.hints() {
            query.set_hint(hint.name(), hint.value());
        }
        Ok(query)
    }

    /// Produces the count query for one paged execution.
    pub fn count_query<'s>(&self, session: &'s dyn Session) -> Result<Box<dyn SessionQuery + 's>> {
        let text = match self {
            ResolvedQuery::Simple(simple) => simple.count_query.as_deref(),
            ResolvedQuery::Named(named) => named.count_query.as_deref(),
        }
        .ok_or_else(|| Error::Internal("count query requested for a non-paged method".to_string()))?;
        let mut query = session.create_query(text)?;
        for hint in self.hints() {
            query.set_hint(hint.name(), hint.value());
        }
        Ok(query)
    }

    /// The resolved query text, where one exists at resolution time.
    pub fn query_text(&self) -> Option<&str> {
        match self {
            ResolvedQuery::Simple(simple) => Some(&simple.query),
            ResolvedQuery::Named(_) => None,
        }
    }

    fn hints(&self) -> &[Hint] {
        match self {
            ResolvedQuery::Simple(simple) => &simple.hints,
            ResolvedQuery::Named(named) => &named.hints,
        }
    }
}

/// A query backed by concrete text: derived from the method name or taken
/// from an explicit declaration.
#[derive(Clone, Debug)]
pub struct SimpleQuery {
    query: String,
    count_query: Option<String>,
    hints: Vec<Hint>,
}

impl SimpleQuery {
    /// Wraps resolved query text, deriving the count counterpart when the
    /// method is page-shaped.
    pub fn new(method: &QueryMethod, query: String) -> Result<Self> {
        let count_query = if method.shape() == ReturnShape::Page {
            Some(count_query_for(&query)?)
        } else {
            None
        };
        Ok(SimpleQuery {
            query,
            count_query,
            hints: method.hints().to_vec(),
        })
    }

    /// The query text.
    pub fn query_text(&self) -> &str {
        &self.query
    }

    /// The derived count-query text, present for page-shaped methods.
    pub fn count_query_text(&self) -> Option<&str> {
        self.count_query.as_deref()
    }
}

/// A query resolved through the provider's named-query registry under the
/// conventional `<EntityName>.<methodName>` key.
#[derive(Clone, Debug)]
pub struct NamedQuery {
    name: String,
    count_query: Option<String>,
    hints: Vec<Hint>,
}

impl NamedQuery {
    /// Looks the method up in the provider's named-query registry.
    ///
    /// Returns `Ok(None)` when no query is registered, letting the lookup
    /// strategy fall back. A sort parameter is rejected outright: the
    /// registered text cannot be safely rewritten to inject ordering.
    /// Pagination requires the provider to expose the underlying query
    /// text so the count query can be derived.
    pub fn lookup(method: &QueryMethod, session: &dyn Session) -> Result<Option<ResolvedQuery>> {
        let name = method.named_query_name();
        if !session.has_named_query(name) {
            debug!("no named query registered under {name}");
            return Ok(None);
        }
        if method.parameters().has_sort() {
            return Err(Error::InvalidMethod(format!(
                "method {} resolves to named query {name} and cannot take a sort parameter",
                method.name()
            )));
        }
        let count_query = if method.shape() == ReturnShape::Page {
            let text = session.named_query_text(name).ok_or_else(|| Error::QueryCreation {
                method: method.name().to_string(),
                detail: format!(
                    "named query {name} cannot be paginated: the provider does not expose its text"
                ),
            })?;
            Some(count_query_for(&text)?)
        } else {
            None
        };
        debug!("resolved named query {name}");
        Ok(Some(ResolvedQuery::Named(NamedQuery {
            name: name.to_string(),
            count_query,
            hints: method.hints().to_vec(),
        })))
    }

    /// The named-query key.
    pub fn name(&self) -> &str {
        &self.name
    }
}
