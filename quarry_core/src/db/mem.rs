//! In-memory persistence provider.
//!
//! `MemSession` implements the [`Session`] boundary over plain row
//! vectors. Its query objects interpret the query grammar this crate
//! emits:
//!
//! ```text
//! select x from E x [where P] [order by x.p asc|desc, ...]
//! select count(*) from E x [where P]
//! delete from E x [where P]
//! update E x set x.p = ?N [, ...] [where P]
//! ```
//!
//! where `P` is `term (and|or term)*`, a term is `x.prop = ?N | :name`,
//! and `and` binds tighter than `or`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;
use regex::Regex;

use super::{Row, Session, SessionQuery};
use crate::page::Direction;
use crate::value::Value;
use crate::{Error, Result};

type Tables = HashMap<String, Vec<Row>>;

/// In-memory [`Session`]: per-entity row vectors plus a named-query
/// registry. Safe for concurrent use; every query object created from it
/// snapshots the rows it reads.
#[derive(Debug, Default)]
pub struct MemSession {
    tables: RwLock<Tables>,
    named_queries: RwLock<HashMap<String, String>>,
    opaque_named_queries: bool,
    cache_clears: AtomicUsize,
}

impl MemSession {
    /// An empty session.
    pub fn new() -> Self {
        MemSession::default()
    }

    /// An empty session whose named queries are opaque: registered text
    /// is executable but [`Session::named_query_text`] returns `None`,
    /// like a provider without query-introspection support.
    pub fn opaque() -> Self {
        MemSession {
            opaque_named_queries: true,
            ..MemSession::default()
        }
    }

    /// Registers (or replaces) a named query.
    pub fn register_named_query(&self, name: &str, query: &str) {
        if let Ok(mut registry) = self.named_queries.write() {
            registry.insert(name.to_string(), query.to_string());
        }
    }

    /// Removes a named query from the registry.
    pub fn remove_named_query(&self, name: &str) {
        if let Ok(mut registry) = self.named_queries.write() {
            registry.remove(name);
        }
    }

    /// How often the unit-of-work cache has been invalidated.
    pub fn cache_clears(&self) -> usize {
        self.cache_clears.load(AtomicOrdering::Relaxed)
    }

    /// A snapshot of the stored rows of one entity.
    pub fn rows(&self, entity: &str) -> Vec<Row> {
        self.tables
            .read()
            .map(|tables| tables.get(entity).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    fn tables_read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))
    }

    fn tables_write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| Error::Internal("store lock poisoned".to_string()))
    }
}

impl Session for MemSession {
    fn create_query(&self, query: &str) -> Result<Box<dyn SessionQuery + '_>> {
        Ok(Box::new(MemQuery::new(self, Statement::parse(query)?)))
    }

    fn has_named_query(&self, name: &str) -> bool {
        self.named_queries
            .read()
            .map(|registry| registry.contains_key(name))
            .unwrap_or(false)
    }

    fn create_named_query(&self, name: &str) -> Result<Box<dyn SessionQuery + '_>> {
        let text = self
            .named_queries
            .read()
            .map_err(|_| Error::Internal("named-query lock poisoned".to_string()))?
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownNamedQuery(name.to_string()))?;
        Ok(Box::new(MemQuery::new(self, Statement::parse(&text)?)))
    }

    fn named_query_text(&self, name: &str) -> Option<String> {
        if self.opaque_named_queries {
            return None;
        }
        self.named_queries
            .read()
            .ok()
            .and_then(|registry| registry.get(name).cloned())
    }

    fn clear_cached(&self) {
        self.cache_clears.fetch_add(1, AtomicOrdering::Relaxed);
        debug!("cleared unit-of-work cache");
    }

    fn persist(&self, entity: &str, id_property: &str, row: Row) -> Result<()> {
        let id = row.require(id_property)?.clone();
        let mut tables = self.tables_write()?;
        let rows = tables.entry(entity.to_string()).or_default();
        match rows.iter_mut().find(|r| r.get(id_property) == Some(&id)) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        Ok(())
    }

    fn remove(&self, entity: &str, id_property: &str, id: &Value) -> Result<bool> {
        let mut tables = self.tables_write()?;
        let rows = tables.entry(entity.to_string()).or_default();
        let before = rows.len();
        rows.retain(|r| r.get(id_property) != Some(id));
        Ok(rows.len() < before)
    }
}

#[derive(Clone, Debug)]
enum Placeholder {
    Positional(usize),
    Named(String),
}

impl Placeholder {
    fn display(&self) -> String {
        match self {
            Placeholder::Positional(position) => format!("?{position}"),
            Placeholder::Named(name) => format!(":{name}"),
        }
    }
}

#[derive(Clone, Debug)]
struct Term {
    property: String,
    placeholder: Placeholder,
}

/// Or-of-ands: the outer vector is joined by `or`, each inner group by
/// `and`.
#[derive(Clone, Debug)]
struct Predicate {
    groups: Vec<Vec<Term>>,
}

#[derive(Clone, Debug)]
enum Statement {
    Select {
        entity: String,
        count: bool,
        filter: Option<Predicate>,
        order: Vec<(String, Direction)>,
    },
    Delete {
        entity: String,
        filter: Option<Predicate>,
    },
    Update {
        entity: String,
        assignments: Vec<Term>,
        filter: Option<Predicate>,
    },
}

static SELECT_HEAD: OnceLock<Regex> = OnceLock::new();
static FROM_HEAD: OnceLock<Regex> = OnceLock::new();
static DELETE_HEAD: OnceLock<Regex> = OnceLock::new();
static UPDATE_HEAD: OnceLock<Regex> = OnceLock::new();
static ORDER_SPLIT: OnceLock<Regex> = OnceLock::new();
static WHERE_SPLIT: OnceLock<Regex> = OnceLock::new();

fn order_split() -> &'static Regex {
    ORDER_SPLIT.get_or_init(|| Regex::new(r"(?i)\s+order\s+by\s+").unwrap())
}

fn where_split() -> &'static Regex {
    WHERE_SPLIT.get_or_init(|| Regex::new(r"(?i)\s+where\s+").unwrap())
}

fn select_head() -> &'static Regex {
    SELECT_HEAD.get_or_init(|| {
        Regex::new(r"(?i)^\s*select\s+(?P<proj>\S+)\s+from\s+(?P<entity>\S+)\s+(?P<alias>\S+)\s*$")
            .unwrap()
    })
}

fn from_head() -> &'static Regex {
    FROM_HEAD
        .get_or_init(|| Regex::new(r"(?i)^\s*from\s+(?P<entity>\S+)\s+(?P<alias>\S+)\s*$").unwrap())
}

fn delete_head() -> &'static Regex {
    DELETE_HEAD.get_or_init(|| {
        Regex::new(r"(?i)^\s*delete\s+from\s+(?P<entity>\S+)\s+(?P<alias>\S+)\s*$").unwrap()
    })
}

fn update_head() -> &'static Regex {
    UPDATE_HEAD.get_or_init(|| {
        Regex::new(r"(?i)^\s*update\s+(?P<entity>\S+)\s+(?P<alias>\S+)\s+set\s+(?P<sets>.+)$")
            .unwrap()
    })
}

impl Statement {
    fn parse(text: &str) -> Result<Statement> {
        let (body, order_src) = match order_split().find(text) {
            Some(found) => (&text[..found.start()], Some(&text[found.end()..])),
            None => (text, None),
        };
        let (head, where_src) = match where_split().find(body) {
            Some(found) => (&body[..found.start()], Some(&body[found.end()..])),
            None => (body, None),
        };

        if let Some(caps) = select_head().captures(head) {
            let proj = &caps["proj"];
            let alias = &caps["alias"];
            let count = proj.eq_ignore_ascii_case("count(*)");
            if !count && proj != alias {
                return Err(Error::QuerySyntax(format!(
                    "projection {proj} does not match alias {alias}"
                )));
            }
            return Ok(Statement::Select {
                entity: caps["entity"].to_string(),
                count,
                filter: parse_filter(where_src, alias)?,
                order: parse_order(order_src, alias)?,
            });
        }
        if let Some(caps) = from_head().captures(head) {
            let alias = &caps["alias"];
            return Ok(Statement::Select {
                entity: caps["entity"].to_string(),
                count: false,
                filter: parse_filter(where_src, alias)?,
                order: parse_order(order_src, alias)?,
            });
        }
        if let Some(caps) = delete_head().captures(head) {
            if order_src.is_some() {
                return Err(Error::QuerySyntax("delete cannot carry an order-by clause".to_string()));
            }
            let alias = &caps["alias"];
            return Ok(Statement::Delete {
                entity: caps["entity"].to_string(),
                filter: parse_filter(where_src, alias)?,
            });
        }
        if let Some(caps) = update_head().captures(head) {
            if order_src.is_some() {
                return Err(Error::QuerySyntax("update cannot carry an order-by clause".to_string()));
            }
            let alias = caps["alias"].to_string();
            let mut assignments = Vec::new();
            for chunk in caps["sets"].split(',') {
                let mut tokens = chunk.split_whitespace();
                assignments.push(parse_term_tokens(&mut tokens, &alias)?);
                if let Some(extra) = tokens.next() {
                    return Err(Error::QuerySyntax(format!(
                        "unexpected token {extra} in set clause"
                    )));
                }
            }
            return Ok(Statement::Update {
                entity: caps["entity"].to_string(),
                assignments,
                filter: parse_filter(where_src, &alias)?,
            });
        }
        Err(Error::QuerySyntax(format!("unrecognized query: {text}")))
    }
}

fn parse_filter(src: Option<&str>, alias: &str) -> Result<Option<Predicate>> {
    let Some(src) = src else { return Ok(None) };
    let mut groups: Vec<Vec<Term>> = vec![Vec::new()];
    let mut tokens = src.split_whitespace();
    loop {
        let term = parse_term_tokens(&mut tokens, alias)?;
        if let Some(group) = groups.last_mut() {
            group.push(term);
        }
        match tokens.next() {
            None => break,
            Some(token) if token.eq_ignore_ascii_case("and") => {}
            Some(token) if token.eq_ignore_ascii_case("or") => groups.push(Vec::new()),
            Some(token) => {
                return Err(Error::QuerySyntax(format!("expected and/or, found {token}")))
            }
        }
    }
    Ok(Some(Predicate { groups }))
}

fn parse_term_tokens<'t>(
    tokens: &mut impl Iterator<Item = &'t str>,
    alias: &str,
) -> Result<Term> {
    let reference = tokens
        .next()
        .ok_or_else(|| Error::QuerySyntax("expected a property reference".to_string()))?;
    let operator = tokens
        .next()
        .ok_or_else(|| Error::QuerySyntax("expected an operator".to_string()))?;
    if operator != "=" {
        return Err(Error::QuerySyntax(format!("unsupported operator {operator}")));
    }
    let placeholder = tokens
        .next()
        .ok_or_else(|| Error::QuerySyntax("expected a placeholder".to_string()))?;
    let property = reference
        .strip_prefix(alias)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(|| {
            Error::QuerySyntax(format!("property reference {reference} is not qualified by alias {alias}"))
        })?;
    Ok(Term {
        property: property.to_string(),
        placeholder: parse_placeholder(placeholder)?,
    })
}

fn parse_placeholder(token: &str) -> Result<Placeholder> {
    if let Some(digits) = token.strip_prefix('?') {
        let position = digits
            .parse::<usize>()
            .map_err(|_| Error::QuerySyntax(format!("malformed positional placeholder {token}")))?;
        return Ok(Placeholder::Positional(position));
    }
    if let Some(name) = token.strip_prefix(':') {
        if name.is_empty() {
            return Err(Error::QuerySyntax("empty parameter name".to_string()));
        }
        return Ok(Placeholder::Named(name.to_string()));
    }
    Err(Error::QuerySyntax(format!("expected a placeholder, found {token}")))
}

fn parse_order(src: Option<&str>, alias: &str) -> Result<Vec<(String, Direction)>> {
    let Some(src) = src else { return Ok(Vec::new()) };
    let mut order = Vec::new();
    for part in src.split(',') {
        let mut tokens = part.split_whitespace();
        let reference = tokens
            .next()
            .ok_or_else(|| Error::QuerySyntax("empty order-by term".to_string()))?;
        let property = reference
            .strip_prefix(alias)
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or_else(|| {
                Error::QuerySyntax(format!("order-by reference {reference} is not qualified by alias {alias}"))
            })?;
        let direction = match tokens.next() {
            None => Direction::Asc,
            Some(token) if token.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(token) if token.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(token) => {
                return Err(Error::QuerySyntax(format!("unknown sort direction {token}")))
            }
        };
        if let Some(extra) = tokens.next() {
            return Err(Error::QuerySyntax(format!("unexpected token {extra} in order-by clause")));
        }
        order.push((property.to_string(), direction));
    }
    Ok(order)
}

struct MemQuery<'a> {
    session: &'a MemSession,
    statement: Statement,
    positional: HashMap<usize, Value>,
    named: HashMap<String, Value>,
    first_result: Option<usize>,
    max_results: Option<usize>,
    hints: Vec<(String, String)>,
}

impl<'a> MemQuery<'a> {
    fn new(session: &'a MemSession, statement: Statement) -> Self {
        MemQuery {
            session,
            statement,
            positional: HashMap::new(),
            named: HashMap::new(),
            first_result: None,
            max_results: None,
            hints: Vec::new(),
        }
    }

    fn bound(&self, placeholder: &Placeholder) -> Result<&Value> {
        let value = match placeholder {
            Placeholder::Positional(position) => self.positional.get(position),
            Placeholder::Named(name) => self.named.get(name),
        };
        value.ok_or_else(|| Error::UnboundParameter(placeholder.display()))
    }

    fn eval_filter(&self, filter: &Option<Predicate>, row: &Row) -> Result<bool> {
        let Some(predicate) = filter else { return Ok(true) };
        for group in &predicate.groups {
            let mut all = true;
            for term in group {
                if row.get(&term.property) != Some(self.bound(&term.placeholder)?) {
                    all = false;
                    break;
                }
            }
            if all {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn matching_rows(&self, entity: &str, filter: &Option<Predicate>) -> Result<Vec<Row>> {
        let rows = {
            let tables = self.session.tables_read()?;
            tables.get(entity).cloned().unwrap_or_default()
        };
        let mut matching = Vec::new();
        for row in rows {
            if self.eval_filter(filter, &row)? {
                matching.push(row);
            }
        }
        Ok(matching)
    }
}

impl SessionQuery for MemQuery<'_> {
    fn set_parameter(&mut self, position: usize, value: Value) -> Result<()> {
        if position == 0 {
            return Err(Error::BoundsError("positional parameters are 1-based".to_string()));
        }
        self.positional.insert(position, value);
        Ok(())
    }

    fn set_named_parameter(&mut self, name: &str, value: Value) -> Result<()> {
        self.named.insert(name.to_string(), value);
        Ok(())
    }

    fn set_first_result(&mut self, offset: usize) {
        self.first_result = Some(offset);
    }

    fn set_max_results(&mut self, limit: usize) {
        self.max_results = Some(limit);
    }

    fn set_hint(&mut self, name: &str, value: &str) {
        self.hints.push((name.to_string(), value.to_string()));
    }

    fn result_list(&mut self) -> Result<Vec<Row>> {
        let Statement::Select {
            entity,
            count,
            filter,
            order,
        } = &self.statement
        else {
            return Err(Error::QuerySyntax("not a select query".to_string()));
        };
        let mut rows = self.matching_rows(entity, filter)?;
        if *count {
            let total = Row::new().with("count", Value::BigInt(rows.len() as i64));
            return Ok(vec![total]);
        }
        if !order.is_empty() {
            sort_rows(&mut rows, order);
        }
        let iter = rows.into_iter().skip(self.first_result.unwrap_or(0));
        Ok(match self.max_results {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        })
    }

    fn single_result(&mut self) -> Result<Row> {
        let rows = self.result_list()?;
        if rows.len() > 1 {
            return Err(Error::NonUniqueResult(rows.len()));
        }
        match rows.into_iter().next() {
            Some(row) => Ok(row),
            None => Err(Error::NoResult),
        }
    }

    fn execute_update(&mut self) -> Result<usize> {
        match &self.statement {
            Statement::Delete { entity, filter } => {
                let mut tables = self.session.tables_write()?;
                let rows = tables.entry(entity.clone()).or_default();
                let mut keep = Vec::with_capacity(rows.len());
                for row in rows.iter() {
                    keep.push(!self.eval_filter(filter, row)?);
                }
                let before = rows.len();
                let mut flags = keep.into_iter();
                rows.retain(|_| flags.next().unwrap_or(true));
                Ok(before - rows.len())
            }
            Statement::Update {
                entity,
                assignments,
                filter,
            } => {
                let mut resolved = Vec::with_capacity(assignments.len());
                for term in assignments {
                    resolved.push((term.property.clone(), self.bound(&term.placeholder)?.clone()));
                }
                let mut tables = self.session.tables_write()?;
                let rows = tables.entry(entity.clone()).or_default();
                let mut affected = 0;
                for row in rows.iter_mut() {
                    if self.eval_filter(filter, row)? {
                        for (property, value) in &resolved {
                            row.set(property, value.clone());
                        }
                        affected += 1;
                    }
                }
                Ok(affected)
            }
            Statement::Select { .. } => {
                Err(Error::QuerySyntax("not a modifying query".to_string()))
            }
        }
    }
}

fn sort_rows(rows: &mut [Row], order: &[(String, Direction)]) {
    rows.sort_by(|a, b| {
        for (property, direction) in order {
            let ordering = compare_values(a.get(property), b.get(property));
            let ordering = match direction {
                Direction::Asc => ordering,
                Direction::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Null sorts first; values of mismatched types compare equal.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Int(x), Value::Int(y)) => x.cmp(y),
            (Value::Int(x), Value::BigInt(y)) => i64::from(*x).cmp(y),
            (Value::BigInt(x), Value::Int(y)) => x.cmp(&i64::from(*y)),
            (Value::BigInt(x), Value::BigInt(y)) => x.cmp(y),
            (Value::Real(x), Value::Real(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
            (Value::Text(x), Value::Text(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
    }
}
