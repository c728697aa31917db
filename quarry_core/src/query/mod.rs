//! Query derivation, resolution, and execution.
//!
//! A method name is parsed into query text by [`QueryCreator`], resolved
//! into a runnable [`ResolvedQuery`] by a [`QueryLookupStrategy`], and run
//! through a [`QueryExecution`] strategy selected from the method's result
//! shape. Resolution happens once per method at DAO construction;
//! execution happens per invocation against a fresh provider query object.

use std::sync::OnceLock;

use regex::Regex;

use crate::db::Row;
use crate::page::Sort;
use crate::{Error, Result};

mod creator;
mod execution;
mod lookup;

pub use creator::QueryCreator;
pub use execution::{Outcome, QueryExecution};
pub use lookup::{NamedQuery, QueryLookupStrategy, ResolvedQuery, SimpleQuery};

static QUERY_SHAPE: OnceLock<Regex> = OnceLock::new();

/// Matches the projection and from-clause of a query, in both the
/// `select <alias> from ...` and the abbreviated `from ...` form.
fn query_shape() -> &'static Regex {
    QUERY_SHAPE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:select\s+(?P<proj>.+?)\s+)?(?P<rest>from\s.*)$").unwrap()
    })
}

/// Derives the count-query counterpart of `query` by replacing its
/// projection with `count(*)`.
///
/// Both `select x from User x ...` and the abbreviated `from User x ...`
/// rewrite to `select count(*) from User x ...`. The projection must be a
/// single alias token (optionally preceded by `distinct`); a
/// multi-expression select clause is an explicit unsupported case.
pub fn count_query_for(query: &str) -> Result<String> {
    let caps = query_shape()
        .captures(query)
        .ok_or_else(|| Error::UnsupportedCountQuery(query.to_string()))?;
    if let Some(proj) = caps.name("proj") {
        if alias_of_projection(proj.as_str()).is_none() {
            return Err(Error::UnsupportedCountQuery(query.to_string()));
        }
    }
    // rest always matches when captures do
    let rest = caps
        .name("rest")
        .ok_or_else(|| Error::UnsupportedCountQuery(query.to_string()))?;
    Ok(format!("select count(*) {}", rest.as_str()))
}

/// The alias token of a single-alias projection, `None` for anything the
/// count rewrite cannot handle.
fn alias_of_projection(proj: &str) -> Option<&str> {
    if proj.contains(',') {
        return None;
    }
    let tokens: Vec<&str> = proj.split_whitespace().collect();
    match tokens.as_slice() {
        [alias] => Some(alias),
        [distinct, alias] if distinct.eq_ignore_ascii_case("distinct") => Some(alias),
        _ => None,
    }
}

/// The entity alias used by `query`, detected from the projection or,
/// in the abbreviated form, from the token after the entity name.
pub fn detect_alias(query: &str) -> Option<String> {
    let caps = query_shape().captures(query)?;
    if let Some(proj) = caps.name("proj") {
        return alias_of_projection(proj.as_str()).map(str::to_string);
    }
    let mut tokens = caps.name("rest")?.as_str().split_whitespace();
    let _from = tokens.next()?;
    let _entity = tokens.next()?;
    let alias = tokens.next()?;
    let reserved = ["where", "order", "set"];
    if reserved.iter().any(|word| alias.eq_ignore_ascii_case(word)) {
        return None;
    }
    Some(alias.to_string())
}

/// Appends the given sort to `query`, extending an existing `order by`
/// clause if the text already carries one.
pub fn apply_sorting(query: &str, sort: &Sort) -> String {
    if sort.is_empty() {
        return query.to_string();
    }
    let alias = detect_alias(query).unwrap_or_else(|| "x".to_string());
    let clause = sort
        .orders()
        .iter()
        .map(|order| format!("{alias}.{} {}", order.property(), order.direction().keyword()))
        .collect::<Vec<_>>()
        .join(", ");
    if query.to_lowercase().contains(" order by ") {
        format!("{query}, {clause}")
    } else {
        format!("{query} order by {clause}")
    }
}

/// Reads the total from a count-query result row.
pub(crate) fn count_from_row(row: &Row) -> Result<u64> {
    let value = row
        .values()
        .next()
        .ok_or_else(|| Error::Internal("count query produced an empty row".to_string()))?;
    Ok(value.bigint()?.max(0) as u64)
}
