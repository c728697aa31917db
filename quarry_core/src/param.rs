//! Classification of a method's declared parameters and per-invocation
//! binding of live arguments.

use crate::db::SessionQuery;
use crate::page::{PageRequest, Sort};
use crate::value::Value;
use crate::{Error, Result};

/// Declarative description of one method parameter.
///
/// Pagination and sort parameters are structural: they shape the query
/// rather than being bound as data, which is also why they cannot carry a
/// binding name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParamDecl {
    /// An ordinary value, bound by declaration position.
    Value,
    /// An ordinary value, bound by an explicit name.
    Named(String),
    /// A pagination directive.
    Pageable,
    /// A sort directive.
    Sort,
}

impl ParamDecl {
    /// An ordinary positionally-bound parameter.
    pub fn value() -> Self {
        ParamDecl::Value
    }

    /// An ordinary parameter bound by the given name.
    pub fn named(name: impl Into<String>) -> Self {
        ParamDecl::Named(name.into())
    }

    /// A pagination-directive parameter.
    pub fn pageable() -> Self {
        ParamDecl::Pageable
    }

    /// A sort-directive parameter.
    pub fn sort() -> Self {
        ParamDecl::Sort
    }

    fn is_special(&self) -> bool {
        matches!(self, ParamDecl::Pageable | ParamDecl::Sort)
    }
}

/// The ordered parameter descriptors of one validated method, positionally
/// 1:1 with its declaration. Immutable once built.
#[derive(Clone, Debug)]
pub struct Parameters {
    method: String,
    decls: Vec<ParamDecl>,
    pageable: Option<usize>,
    sort: Option<usize>,
}

impl Parameters {
    /// Classifies a declared parameter list. Fails with
    /// [`Error::InvalidMethod`] if more than one pagination or more than
    /// one sort parameter is declared.
    pub fn new(method: &str, decls: Vec<ParamDecl>) -> Result<Self> {
        let mut pageable = None;
        let mut sort = None;
        for (index, decl) in decls.iter().enumerate() {
            match decl {
                ParamDecl::Pageable => {
                    if pageable.is_some() {
                        return Err(Error::InvalidMethod(format!(
                            "method {method} declares more than one pagination parameter"
                        )));
                    }
                    pageable = Some(index);
                }
                ParamDecl::Sort => {
                    if sort.is_some() {
                        return Err(Error::InvalidMethod(format!(
                            "method {method} declares more than one sort parameter"
                        )));
                    }
                    sort = Some(index);
                }
                _ => {}
            }
        }
        Ok(Parameters {
            method: method.to_string(),
            decls,
            pageable,
            sort,
        })
    }

    /// The declared parameter count.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Tests whether the method declares no parameters.
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Tests whether a pagination parameter is declared.
    pub fn has_pageable(&self) -> bool {
        self.pageable.is_some()
    }

    /// Tests whether a standalone sort parameter is declared.
    pub fn has_sort(&self) -> bool {
        self.sort.is_some()
    }

    /// The declaration index of the pagination parameter, if any.
    pub fn pageable_index(&self) -> Option<usize> {
        self.pageable
    }

    /// The declaration index of the sort parameter, if any.
    pub fn sort_index(&self) -> Option<usize> {
        self.sort
    }

    /// Tests whether the parameter at `index` carries an explicit binding
    /// name.
    pub fn is_named(&self, index: usize) -> bool {
        self.name(index).is_some()
    }

    /// The binding name of the parameter at `index`, if it carries one.
    pub fn name(&self, index: usize) -> Option<&str> {
        match self.decls.get(index) {
            Some(ParamDecl::Named(name)) => Some(name),
            _ => None,
        }
    }

    /// The number of bindable (non-structural) parameters.
    pub fn bindable_count(&self) -> usize {
        self.decls.iter().filter(|d| !d.is_special()).count()
    }

    /// The binding names of the bindable parameters, in declaration order.
    /// `None` entries bind by position.
    pub fn binding_names(&self) -> impl Iterator<Item = Option<&str>> {
        self.decls.iter().filter_map(|d| match d {
            ParamDecl::Value => Some(None),
            ParamDecl::Named(name) => Some(Some(name.as_str())),
            _ => None,
        })
    }

    pub(crate) fn decls(&self) -> &[ParamDecl] {
        &self.decls
    }

    pub(crate) fn method(&self) -> &str {
        &self.method
    }
}

/// A live argument supplied to a DAO method invocation.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// An ordinary value to bind.
    Value(Value),
    /// A pagination directive.
    Pageable(PageRequest),
    /// A sort directive.
    Sort(Sort),
}

impl Arg {
    /// An ordinary value argument.
    pub fn value(val: impl crate::value::ToValue) -> Self {
        Arg::Value(val.to_value())
    }

    /// A pagination-directive argument.
    pub fn pageable(request: PageRequest) -> Self {
        Arg::Pageable(request)
    }

    /// A sort-directive argument.
    pub fn sort(sort: Sort) -> Self {
        Arg::Sort(sort)
    }
}

/// Per-invocation pairing of a [`Parameters`] descriptor with the live
/// argument array of one call. Created and discarded per invocation.
pub struct ParameterBinder<'a> {
    parameters: &'a Parameters,
    args: &'a [Arg],
}

impl<'a> ParameterBinder<'a> {
    /// Pairs descriptor and arguments, validating arity and that every
    /// argument matches the kind its parameter declares.
    pub fn new(parameters: &'a Parameters, args: &'a [Arg]) -> Result<Self> {
        if args.len() != parameters.len() {
            return Err(Error::ArgumentCount {
                method: parameters.method().to_string(),
                expected: parameters.len(),
                actual: args.len(),
            });
        }
        for (position, (decl, arg)) in parameters.decls().iter().zip(args).enumerate() {
            let matches = matches!(
                (decl, arg),
                (ParamDecl::Value, Arg::Value(_))
                    | (ParamDecl::Named(_), Arg::Value(_))
                    | (ParamDecl::Pageable, Arg::Pageable(_))
                    | (ParamDecl::Sort, Arg::Sort(_))
            );
            if !matches {
                return Err(Error::ArgumentKind {
                    method: parameters.method().to_string(),
                    position,
                });
            }
        }
        Ok(ParameterBinder { parameters, args })
    }

    /// The pagination directive from the live arguments, if one is present.
    pub fn pageable(&self) -> Option<&PageRequest> {
        let index = self.parameters.pageable_index()?;
        match &self.args[index] {
            Arg::Pageable(request) => Some(request),
            _ => None,
        }
    }

    /// The sort to apply: a standalone sort argument if present, else the
    /// sort embedded in the pagination directive, else none.
    pub fn sort(&self) -> Option<&Sort> {
        if let Some(index) = self.parameters.sort_index() {
            if let Arg::Sort(sort) = &self.args[index] {
                return Some(sort);
            }
        }
        self.pageable().and_then(|request| request.sort())
    }

    /// Binds the ordinary arguments to `query`, by name where the
    /// parameter declares one and by 1-based position otherwise.
    pub fn bind(&self, query: &mut dyn SessionQuery) -> Result<()> {
        let mut position = 0;
        for (index, decl) in self.parameters.decls().iter().enumerate() {
            match decl {
                ParamDecl::Value => {
                    position += 1;
                    query.set_parameter(position, self.value_at(index)?)?;
                }
                ParamDecl::Named(name) => {
                    position += 1;
                    query.set_named_parameter(name, self.value_at(index)?)?;
                }
                ParamDecl::Pageable | ParamDecl::Sort => {}
            }
        }
        Ok(())
    }

    /// [`bind`][Self::bind], plus the offset and limit of the pagination
    /// directive if one is present.
    pub fn bind_and_paginate(&self, query: &mut dyn SessionQuery) -> Result<()> {
        self.bind(query)?;
        if let Some(request) = self.pageable() {
            query.set_first_result(request.offset());
            query.set_max_results(request.size());
        }
        Ok(())
    }

    fn value_at(&self, index: usize) -> Result<Value> {
        match &self.args[index] {
            Arg::Value(val) => Ok(val.clone()),
            _ => Err(Error::ArgumentKind {
                method: self.parameters.method().to_string(),
                position: index,
            }),
        }
    }
}
