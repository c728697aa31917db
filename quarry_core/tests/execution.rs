//! Execution strategies against the in-memory provider: result shaping,
//! pagination, no-result normalization, and bulk modification.

mod common;

use assert_matches::assert_matches;
use common::{arrasz, gierke, seed, seeded_session, User};
use quarry_core::dao::{Dao, DaoConfig};
use quarry_core::db::MemSession;
use quarry_core::method::MethodDef;
use quarry_core::page::{PageRequest, Sort};
use quarry_core::param::{Arg, ParamDecl};
use quarry_core::{Entity, Error, Result};

fn finder_by_lastname() -> MethodDef {
    MethodDef::new("findByLastname").param(ParamDecl::value())
}

fn dao_with(session: &MemSession, defs: Vec<MethodDef>) -> Result<Dao<User>> {
    let mut config = DaoConfig::new("UserDao");
    for def in defs {
        config = config.method(def);
    }
    Dao::build(config, session)
}

#[test]
fn single_execution_normalizes_no_result_to_none() {
    let session = MemSession::new();
    let dao = dao_with(&session, vec![finder_by_lastname().single()]).unwrap();
    let found = dao
        .invoke_single(&session, "findByLastname", &[Arg::value("Gierke")])
        .unwrap();
    assert_eq!(found, None);
}

#[test]
fn single_execution_returns_the_matching_entity() {
    let session = seeded_session();
    let dao = dao_with(&session, vec![finder_by_lastname().single()]).unwrap();
    let found = dao
        .invoke_single(&session, "findByLastname", &[Arg::value("Gierke")])
        .unwrap();
    assert_eq!(found, Some(gierke()));
}

#[test]
fn single_execution_propagates_non_unique_results() {
    let session = seeded_session();
    seed(&session, &[User::new(3, "Anna", "Gierke", "agierke@example.org")]);
    let dao = dao_with(&session, vec![finder_by_lastname().single()]).unwrap();
    let result = dao.invoke_single(&session, "findByLastname", &[Arg::value("Gierke")]);
    assert_matches!(result, Err(Error::NonUniqueResult(2)));
}

#[test]
fn collection_execution_returns_all_matches() {
    let session = seeded_session();
    let dao = dao_with(
        &session,
        vec![MethodDef::new("findByActive").param(ParamDecl::value())],
    )
    .unwrap();
    let found = dao
        .invoke_collection(&session, "findByActive", &[Arg::value(true)])
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn collection_execution_applies_a_sort_argument() {
    let session = seeded_session();
    let dao = dao_with(
        &session,
        vec![MethodDef::new("findByActive")
            .param(ParamDecl::value())
            .param(ParamDecl::sort())],
    )
    .unwrap();
    let args = [Arg::value(true), Arg::sort(Sort::by("lastname"))];
    let found = dao.invoke_collection(&session, "findByActive", &args).unwrap();
    assert_eq!(found, vec![arrasz(), gierke()]);
}

#[test]
fn collection_execution_applies_pagination_side_effects() {
    let session = MemSession::new();
    let users: Vec<User> = (1..=5)
        .map(|n| User::new(n, "First", "Last", &format!("u{n}@example.org")))
        .collect();
    seed(&session, &users);
    let dao = dao_with(
        &session,
        vec![MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable())],
    )
    .unwrap();
    let request = PageRequest::sorted(1, 2, Sort::by("id"));
    let args = [Arg::value("Last"), Arg::pageable(request)];
    let found = dao.invoke_collection(&session, "findByLastname", &args).unwrap();
    assert_eq!(found.iter().map(|u| u.id).collect::<Vec<_>>(), vec![3, 4]);
}

#[test_log::test]
fn paged_execution_assembles_the_page() {
    let session = MemSession::new();
    let users: Vec<User> = (1..=5)
        .map(|n| User::new(n, "First", "Last", &format!("u{n}@example.org")))
        .collect();
    seed(&session, &users);
    let dao = dao_with(
        &session,
        vec![MethodDef::new("findByLastname")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable())
            .page()],
    )
    .unwrap();
    let request = PageRequest::sorted(1, 2, Sort::by("id"));
    let args = [Arg::value("Last"), Arg::pageable(request)];
    let page = dao.invoke_page(&session, "findByLastname", &args).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.total(), 5);
    assert_eq!(page.total_pages(), 3);
    assert_eq!(page.number(), 1);
    assert!(page.has_next());
    assert!(page.has_previous());
    assert!(!page.is_first());
    assert!(!page.is_last());
    assert_eq!(page.content().iter().map(|u| u.id).collect::<Vec<_>>(), vec![3, 4]);
}

#[test]
fn paged_execution_counts_all_matches_not_just_the_page() {
    let session = seeded_session();
    let dao = dao_with(
        &session,
        vec![MethodDef::new("findByActive")
            .param(ParamDecl::value())
            .param(ParamDecl::pageable())
            .page()],
    )
    .unwrap();
    let args = [Arg::value(true), Arg::pageable(PageRequest::new(0, 1))];
    let page = dao.invoke_page(&session, "findByActive", &args).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.total(), 2);
}

#[test_log::test]
fn modifying_execution_updates_and_clears_the_cache() {
    let session = seeded_session();
    let dao = dao_with(
        &session,
        vec![MethodDef::new("deactivateByLastname")
            .param(ParamDecl::value())
            .query("update User x set x.active = ?2 where x.lastname = ?1")
            .param(ParamDecl::value())
            .modifying()],
    )
    .unwrap();
    assert_eq!(session.cache_clears(), 0);
    let affected = dao
        .invoke_modifying(
            &session,
            "deactivateByLastname",
            &[Arg::value("Gierke"), Arg::value(false)],
        )
        .unwrap();
    assert_eq!(affected, 1);
    assert_eq!(session.cache_clears(), 1);
    let rows = session.rows(User::NAME);
    let gierke_row = rows
        .iter()
        .find(|r| r.get("lastname").and_then(|v| v.text().ok()) == Some("Gierke"))
        .unwrap();
    assert_eq!(gierke_row.get("active").unwrap().bool().unwrap(), false);
}

#[test]
fn modifying_execution_deletes_in_bulk() {
    let session = seeded_session();
    let dao = dao_with(
        &session,
        vec![MethodDef::new("deleteByActive")
            .param(ParamDecl::value())
            .query("delete from User x where x.active = ?1")
            .modifying()],
    )
    .unwrap();
    let affected = dao
        .invoke_modifying(&session, "deleteByActive", &[Arg::value(true)])
        .unwrap();
    assert_eq!(affected, 2);
    assert!(session.rows(User::NAME).is_empty());
}

#[test]
fn unbound_placeholders_surface_at_execution() {
    let session = seeded_session();
    let dao = dao_with(
        &session,
        vec![MethodDef::new("findBroken")
            .param(ParamDecl::value())
            .query("select x from User x where x.lastname = ?2")],
    )
    .unwrap();
    let result = dao.invoke(&session, "findBroken", &[Arg::value("Gierke")]);
    assert_matches!(result, Err(Error::UnboundParameter(placeholder)) if placeholder == "?2");
}

#[test]
fn malformed_declared_queries_surface_at_first_execution() {
    let session = seeded_session();
    // Construction does not validate declared text; the provider rejects
    // it when the first invocation reaches it.
    let dao = dao_with(
        &session,
        vec![MethodDef::new("findBroken").query("selct x frm User x")],
    )
    .unwrap();
    let result = dao.invoke(&session, "findBroken", &[]);
    assert_matches!(result, Err(Error::QuerySyntax(_)));
}

#[test]
fn hints_are_accepted_by_the_provider() {
    let session = seeded_session();
    let dao = dao_with(
        &session,
        vec![finder_by_lastname()
            .single()
            .hint("org.quarry.fetchSize", "16")],
    )
    .unwrap();
    let found = dao
        .invoke_single(&session, "findByLastname", &[Arg::value("Arrasz")])
        .unwrap();
    assert_eq!(found, Some(arrasz()));
}
