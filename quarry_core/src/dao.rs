//! DAO assembly: the eager method-resolution table and the base CRUD
//! surface every DAO carries.
//!
//! A [`Dao`] is the explicit replacement for a generated proxy: a table
//! from method name to a resolved strategy object, built once at
//! construction and looked up by exact key on every invocation. All
//! configuration and query-creation errors surface at [`Dao::build`],
//! before any call reaches a broken method.

use std::collections::HashMap;
use std::marker::PhantomData;

use log::debug;

use crate::db::{Row, Session};
use crate::entity::EntityMeta;
use crate::method::{MethodDef, QueryMethod};
use crate::page::{Page, PageRequest, Sort};
use crate::param::{Arg, ParameterBinder};
use crate::query::{
    apply_sorting, count_from_row, count_query_for, Outcome, QueryExecution, QueryLookupStrategy,
    ResolvedQuery,
};
use crate::value::ToValue;
use crate::{Entity, Error, Result};

/// Declarative configuration of one DAO: its name, its query-lookup
/// policy, and the methods it declares.
#[derive(Clone, Debug, Default)]
pub struct DaoConfig {
    name: String,
    strategy: QueryLookupStrategy,
    methods: Vec<MethodDef>,
}

impl DaoConfig {
    /// Starts a configuration for the DAO of the given name. The name
    /// appears in error messages only.
    pub fn new(name: impl Into<String>) -> Self {
        DaoConfig {
            name: name.into(),
            strategy: QueryLookupStrategy::default(),
            methods: Vec::new(),
        }
    }

    /// Selects the query-lookup policy. Defaults to
    /// [`QueryLookupStrategy::CreateIfNotFound`].
    pub fn strategy(mut self, strategy: QueryLookupStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Declares a method. Returns `self` for chaining.
    pub fn method(mut self, def: MethodDef) -> Self {
        self.methods.push(def);
        self
    }

    /// The configured DAO name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct ResolvedMethod {
    method: QueryMethod,
    query: ResolvedQuery,
    execution: QueryExecution,
}

/// A data-access object for entity type `T`.
///
/// The method table is immutable after [`build`][Dao::build]; per-call
/// state is allocated fresh on every invocation, so a `Dao` can be shared
/// across threads without synchronization.
pub struct Dao<T: Entity> {
    name: String,
    meta: EntityMeta,
    methods: HashMap<String, ResolvedMethod>,
    phantom: PhantomData<fn() -> T>,
}

impl<T: Entity> Dao<T> {
    /// Assembles a DAO, eagerly validating and resolving every declared
    /// method. A broken method name, an unknown property, or a
    /// mismatched argument count fails here, not at first call.
    pub fn build(config: DaoConfig, session: &dyn Session) -> Result<Self> {
        let meta = EntityMeta::of::<T>();
        let mut methods = HashMap::with_capacity(config.methods.len());
        for def in config.methods {
            let method = QueryMethod::new(def, &config.name, &meta)?;
            let query = config.strategy.resolve(&method, &meta, session)?;
            let execution = QueryExecution::of(&method);
            debug!("resolved {}.{} to {execution:?} execution", config.name, method.name());
            let name = method.name().to_string();
            let resolved = ResolvedMethod {
                method,
                query,
                execution,
            };
            if methods.insert(name.clone(), resolved).is_some() {
                return Err(Error::InvalidMethod(format!(
                    "DAO {} declares method {name} more than once",
                    config.name
                )));
            }
        }
        Ok(Dao {
            name: config.name,
            meta,
            methods,
            phantom: PhantomData,
        })
    }

    /// The DAO name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The metadata of the mapped entity.
    pub fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    /// The resolved query of a declared method, for inspection.
    pub fn resolved_query(&self, method: &str) -> Option<&ResolvedQuery> {
        self.methods.get(method).map(|resolved| &resolved.query)
    }

    /// Invokes a declared method with the given live arguments.
    pub fn invoke(&self, session: &dyn Session, method: &str, args: &[Arg]) -> Result<Outcome<T>> {
        let resolved = self
            .methods
            .get(method)
            .ok_or_else(|| Error::NoSuchMethod(method.to_string()))?;
        let binder = ParameterBinder::new(resolved.method.parameters(), args)?;
        resolved.execution.execute(&resolved.query, session, &binder)
    }

    /// Invokes a single-entity method.
    pub fn invoke_single(
        &self,
        session: &dyn Session,
        method: &str,
        args: &[Arg],
    ) -> Result<Option<T>> {
        self.invoke(session, method, args)?.into_single()
    }

    /// Invokes a collection method.
    pub fn invoke_collection(
        &self,
        session: &dyn Session,
        method: &str,
        args: &[Arg],
    ) -> Result<Vec<T>> {
        self.invoke(session, method, args)?.into_collection()
    }

    /// Invokes a page method.
    pub fn invoke_page(
        &self,
        session: &dyn Session,
        method: &str,
        args: &[Arg],
    ) -> Result<Page<T>> {
        self.invoke(session, method, args)?.into_page()
    }

    /// Invokes a modifying method, returning the affected-row count.
    pub fn invoke_modifying(
        &self,
        session: &dyn Session,
        method: &str,
        args: &[Arg],
    ) -> Result<usize> {
        self.invoke(session, method, args)?.into_modified()
    }

    /// Saves an entity, inserting or replacing by identifier.
    pub fn save(&self, session: &dyn Session, entity: &T) -> Result<()> {
        session.persist(T::NAME, T::ID, entity.to_row())
    }

    /// Deletes an entity by its identifier. Returns whether a row was
    /// removed.
    pub fn delete(&self, session: &dyn Session, entity: &T) -> Result<bool> {
        session.remove(T::NAME, T::ID, &entity.id_value())
    }

    /// Deletes by raw identifier value.
    pub fn delete_by_id(&self, session: &dyn Session, id: impl ToValue) -> Result<bool> {
        session.remove(T::NAME, T::ID, &id.to_value())
    }

    /// Loads the entity with the given identifier, absent if none exists.
    pub fn find_by_id(&self, session: &dyn Session, id: impl ToValue) -> Result<Option<T>> {
        let text = format!(
            "{} where x.{} = ?1",
            self.base_query(),
            self.meta.id_property()
        );
        let mut query = session.create_query(&text)?;
        query.set_parameter(1, id.to_value())?;
        match query.single_result() {
            Ok(row) => Ok(Some(T::from_row(&row)?)),
            Err(Error::NoResult) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Tests whether an entity with the given identifier exists.
    pub fn exists(&self, session: &dyn Session, id: impl ToValue) -> Result<bool> {
        Ok(self.find_by_id(session, id)?.is_some())
    }

    /// Loads all entities.
    pub fn find_all(&self, session: &dyn Session) -> Result<Vec<T>> {
        let mut query = session.create_query(&self.base_query())?;
        entities_from(query.result_list()?)
    }

    /// Loads all entities in the given order.
    pub fn find_all_sorted(&self, session: &dyn Session, sort: &Sort) -> Result<Vec<T>> {
        let text = apply_sorting(&self.base_query(), sort);
        let mut query = session.create_query(&text)?;
        entities_from(query.result_list()?)
    }

    /// Loads one page of entities.
    pub fn find_page(&self, session: &dyn Session, request: &PageRequest) -> Result<Page<T>> {
        let base = self.base_query();
        let mut count = session.create_query(&count_query_for(&base)?)?;
        let total = count_from_row(&count.single_result()?)?;
        let text = match request.sort() {
            Some(sort) => apply_sorting(&base, sort),
            None => base,
        };
        let mut query = session.create_query(&text)?;
        query.set_first_result(request.offset());
        query.set_max_results(request.size());
        let content = entities_from(query.result_list()?)?;
        Ok(Page::new(content, request.clone(), total))
    }

    /// Counts all entities.
    pub fn count(&self, session: &dyn Session) -> Result<u64> {
        let mut query = session.create_query(&count_query_for(&self.base_query())?)?;
        count_from_row(&query.single_result()?)
    }

    fn base_query(&self) -> String {
        format!("select x from {} x", self.meta.name())
    }
}

fn entities_from<T: Entity>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.iter().map(T::from_row).collect()
}
