//! Method descriptors: the declarative record describing one DAO finder
//! method, and the validated form the rest of the engine works with.

use crate::entity::EntityMeta;
use crate::param::{ParamDecl, Parameters};
use crate::{Error, Result};

/// Classification of a method's result shape.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReturnShape {
    /// At most one entity.
    Single,
    /// A collection of entities.
    Collection,
    /// One page of entities plus the total match count.
    Page,
}

/// A provider query hint, applied to every query object the method
/// produces.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Hint {
    name: String,
    value: String,
}

impl Hint {
    /// Creates a hint.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Hint {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The hint name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The hint value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Declarative descriptor of one DAO method: the facts that would be read
/// off a method signature and its annotations, attached explicitly and
/// read once at DAO construction.
///
/// Defaults: no parameters, collection shape, not modifying, no declared
/// query, no hints.
#[derive(Clone, Debug)]
pub struct MethodDef {
    name: String,
    params: Vec<ParamDecl>,
    shape: ReturnShape,
    modifying: bool,
    query: Option<String>,
    hints: Vec<Hint>,
}

impl MethodDef {
    /// Starts a descriptor for the method of the given name.
    pub fn new(name: impl Into<String>) -> Self {
        MethodDef {
            name: name.into(),
            params: Vec::new(),
            shape: ReturnShape::Collection,
            modifying: false,
            query: None,
            hints: Vec::new(),
        }
    }

    /// Appends a parameter declaration. Returns `self` for chaining.
    pub fn param(mut self, decl: ParamDecl) -> Self {
        self.params.push(decl);
        self
    }

    /// Sets the result shape. Returns `self` for chaining.
    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.shape = shape;
        self
    }

    /// Shorthand for `returns(ReturnShape::Single)`.
    pub fn single(self) -> Self {
        self.returns(ReturnShape::Single)
    }

    /// Shorthand for `returns(ReturnShape::Page)`.
    pub fn page(self) -> Self {
        self.returns(ReturnShape::Page)
    }

    /// Marks the method as a bulk update or delete.
    pub fn modifying(mut self) -> Self {
        self.modifying = true;
        self
    }

    /// Declares an explicit query string, overriding derivation.
    pub fn query(mut self, text: impl Into<String>) -> Self {
        self.query = Some(text.into());
        self
    }

    /// Appends a provider query hint. Returns `self` for chaining.
    pub fn hint(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.hints.push(Hint::new(name, value));
        self
    }

    /// The declared method name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A validated, immutable method descriptor bound to its entity metadata.
///
/// Built once per DAO method at construction time; structural invariants
/// are enforced here so that an invalid declaration never reaches query
/// resolution or execution.
#[derive(Clone, Debug)]
pub struct QueryMethod {
    name: String,
    dao: String,
    parameters: Parameters,
    shape: ReturnShape,
    modifying: bool,
    declared_query: Option<String>,
    hints: Vec<Hint>,
    named_query_name: String,
}

impl QueryMethod {
    /// Validates `def` against the entity metadata.
    ///
    /// Rejected with [`Error::InvalidMethod`]:
    /// * more than one pagination or sort parameter;
    /// * a pagination parameter together with a sort parameter;
    /// * a pagination parameter on a single-entity method;
    /// * a page-shaped method without a pagination parameter;
    /// * pagination or sort parameters on a modifying method;
    /// * a modifying method with page shape.
    pub fn new(def: MethodDef, dao: &str, meta: &EntityMeta) -> Result<Self> {
        let parameters = Parameters::new(&def.name, def.params)?;
        let name = def.name;
        if parameters.has_pageable() && parameters.has_sort() {
            return Err(Error::InvalidMethod(format!(
                "method {name} declares both a pagination and a sort parameter"
            )));
        }
        if parameters.has_pageable() && def.shape == ReturnShape::Single {
            return Err(Error::InvalidMethod(format!(
                "method {name} takes a pagination parameter but returns a single entity"
            )));
        }
        if def.shape == ReturnShape::Page && !parameters.has_pageable() {
            return Err(Error::InvalidMethod(format!(
                "method {name} returns a page but takes no pagination parameter"
            )));
        }
        if def.modifying && (parameters.has_pageable() || parameters.has_sort()) {
            return Err(Error::InvalidMethod(format!(
                "modifying method {name} must not take pagination or sort parameters"
            )));
        }
        if def.modifying && def.shape == ReturnShape::Page {
            return Err(Error::InvalidMethod(format!(
                "modifying method {name} cannot return a page"
            )));
        }
        let named_query_name = format!("{}.{}", meta.name(), name);
        Ok(QueryMethod {
            name,
            dao: dao.to_string(),
            parameters,
            shape: def.shape,
            modifying: def.modifying,
            declared_query: def.query,
            hints: def.hints,
            named_query_name,
        })
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the DAO declaring this method.
    pub fn dao(&self) -> &str {
        &self.dao
    }

    /// The classified parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The result shape.
    pub fn shape(&self) -> ReturnShape {
        self.shape
    }

    /// Tests whether this is a bulk update or delete.
    pub fn is_modifying(&self) -> bool {
        self.modifying
    }

    /// The explicitly declared query text, if any.
    pub fn declared_query(&self) -> Option<&str> {
        self.declared_query.as_deref()
    }

    /// The declared provider hints.
    pub fn hints(&self) -> &[Hint] {
        &self.hints
    }

    /// The conventional named-query key, `<EntityName>.<methodName>`.
    pub fn named_query_name(&self) -> &str {
        &self.named_query_name
    }
}
