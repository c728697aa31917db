//! Construction-time validation of method descriptors and parameter
//! classification, and per-invocation argument pairing.

mod common;

use assert_matches::assert_matches;
use common::User;
use quarry_core::entity::EntityMeta;
use quarry_core::method::{MethodDef, QueryMethod};
use quarry_core::page::{PageRequest, Sort};
use quarry_core::param::{Arg, ParamDecl, ParameterBinder, Parameters};
use quarry_core::{Error, Result};

fn validate(def: MethodDef) -> Result<QueryMethod> {
    QueryMethod::new(def, "UserDao", &EntityMeta::of::<User>())
}

#[test]
fn pageable_and_sort_cannot_be_combined() {
    let result = validate(
        MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable())
            .param(ParamDecl::sort()),
    );
    assert_matches!(result, Err(Error::InvalidMethod(_)));
}

#[test]
fn pageable_and_sort_rejected_in_either_order() {
    let result = validate(
        MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::sort())
            .param(ParamDecl::pageable()),
    );
    assert_matches!(result, Err(Error::InvalidMethod(_)));
}

#[test]
fn two_pageable_parameters_are_rejected() {
    let result = validate(
        MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable())
            .param(ParamDecl::pageable()),
    );
    assert_matches!(result, Err(Error::InvalidMethod(_)));
}

#[test]
fn two_sort_parameters_are_rejected() {
    let result = validate(
        MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::sort())
            .param(ParamDecl::sort()),
    );
    assert_matches!(result, Err(Error::InvalidMethod(_)));
}

#[test]
fn pageable_requires_collection_or_page_shape() {
    let result = validate(
        MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable())
            .single(),
    );
    assert_matches!(result, Err(Error::InvalidMethod(_)));
}

#[test]
fn page_shape_requires_a_pageable_parameter() {
    let result = validate(MethodDef::new("findByLastname").param(ParamDecl::value()).page());
    assert_matches!(result, Err(Error::InvalidMethod(_)));
}

#[test]
fn modifying_methods_cannot_take_pageable() {
    let result = validate(
        MethodDef::new("deleteByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable())
            .modifying(),
    );
    assert_matches!(result, Err(Error::InvalidMethod(_)));
}

#[test]
fn modifying_methods_cannot_take_sort() {
    let result = validate(
        MethodDef::new("deleteByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::sort())
            .modifying(),
    );
    assert_matches!(result, Err(Error::InvalidMethod(_)));
}

#[test]
fn modifying_methods_cannot_return_pages() {
    let result = validate(
        MethodDef::new("deleteByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable())
            .page()
            .modifying(),
    );
    assert_matches!(result, Err(Error::InvalidMethod(_)));
}

#[test]
fn named_query_name_follows_the_convention() {
    let method = validate(MethodDef::new("findByLastname").param(ParamDecl::value())).unwrap();
    assert_eq!(method.named_query_name(), "User.findByLastname");
}

#[test]
fn parameters_classify_specials_and_bindables() {
    let parameters = Parameters::new(
        "findByLastname",
        vec![
            ParamDecl::named("last"),
            ParamDecl::value(),
            ParamDecl::pageable(),
        ],
    )
    .unwrap();
    assert!(parameters.has_pageable());
    assert!(!parameters.has_sort());
    assert_eq!(parameters.pageable_index(), Some(2));
    assert_eq!(parameters.bindable_count(), 2);
    assert!(parameters.is_named(0));
    assert_eq!(parameters.name(0), Some("last"));
    assert!(!parameters.is_named(1));
    assert!(!parameters.is_named(2));
}

#[test]
fn binder_rejects_wrong_argument_count() {
    let method = validate(MethodDef::new("findByLastname").param(ParamDecl::value())).unwrap();
    let result = ParameterBinder::new(method.parameters(), &[]);
    assert_matches!(
        result.err(),
        Some(Error::ArgumentCount { expected: 1, actual: 0, .. })
    );
}

#[test]
fn binder_rejects_mismatched_argument_kinds() {
    let method = validate(
        MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable()),
    )
    .unwrap();
    let args = [Arg::value("Gierke"), Arg::value("not a pageable")];
    let result = ParameterBinder::new(method.parameters(), &args);
    assert_matches!(result.err(), Some(Error::ArgumentKind { position: 1, .. }));
}

#[test]
fn binder_exposes_the_live_pageable() {
    let method = validate(
        MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable()),
    )
    .unwrap();
    let args = [Arg::value("Gierke"), Arg::pageable(PageRequest::new(2, 10))];
    let binder = ParameterBinder::new(method.parameters(), &args).unwrap();
    let request = binder.pageable().unwrap();
    assert_eq!(request.page(), 2);
    assert_eq!(request.size(), 10);
    assert_eq!(request.offset(), 20);
    assert!(binder.sort().is_none());
}

#[test]
fn binder_falls_back_to_the_sort_inside_the_pageable() {
    let method = validate(
        MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable()),
    )
    .unwrap();
    let request = PageRequest::sorted(0, 10, Sort::by("lastname"));
    let args = [Arg::value("Gierke"), Arg::pageable(request)];
    let binder = ParameterBinder::new(method.parameters(), &args).unwrap();
    let sort = binder.sort().unwrap();
    assert_eq!(sort.orders().len(), 1);
    assert_eq!(sort.orders()[0].property(), "lastname");
}

#[test]
fn standalone_sort_takes_precedence_over_the_embedded_one() {
    let method = validate(
        MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::sort()),
    )
    .unwrap();
    let args = [Arg::value("Gierke"), Arg::sort(Sort::by("firstname"))];
    let binder = ParameterBinder::new(method.parameters(), &args).unwrap();
    assert_eq!(binder.sort().unwrap().orders()[0].property(), "firstname");
}
