//! Row and value behavior, including JSON fixtures for seeding.

mod common;

use assert_matches::assert_matches;
use common::User;
use quarry_core::db::{MemSession, Row, Session};
use quarry_core::value::{Value, ValueType};
use quarry_core::{Entity, Error};

#[test]
fn rows_deserialize_from_json_fixtures() {
    let fixture = r#"[
        {
            "id": 1,
            "firstname": "Oliver",
            "lastname": "Gierke",
            "emailAddress": "ogierke@example.org",
            "active": true
        },
        {
            "id": 2,
            "firstname": "Pawel",
            "lastname": "Arrasz",
            "emailAddress": "parrasz@example.org",
            "active": false
        }
    ]"#;
    let rows: Vec<Row> = serde_json::from_str(fixture).unwrap();
    assert_eq!(rows.len(), 2);

    let session = MemSession::new();
    for row in rows {
        session.persist(User::NAME, User::ID, row).unwrap();
    }
    let users: Vec<User> = session
        .rows(User::NAME)
        .iter()
        .map(|row| User::from_row(row).unwrap())
        .collect();
    assert_eq!(users[0].lastname, "Gierke");
    assert!(!users[1].active);
}

#[test]
fn value_accessors_enforce_types() {
    assert_eq!(Value::Text("a".to_string()).text().unwrap(), "a");
    assert_eq!(Value::Int(3).bigint().unwrap(), 3);
    assert_matches!(
        Value::Bool(true).text(),
        Err(Error::CannotConvert(ValueType::Text, Value::Bool(true)))
    );
}

#[test]
fn missing_row_properties_are_reported_by_name() {
    let row = Row::new().with("id", 1_i64);
    assert_matches!(row.require("lastname"), Err(Error::MissingProperty(name)) if name == "lastname");
}

#[test]
fn persisting_a_row_without_its_identifier_fails() {
    let session = MemSession::new();
    let row = Row::new().with("lastname", "Gierke");
    assert_matches!(
        session.persist(User::NAME, User::ID, row),
        Err(Error::MissingProperty(_))
    );
}
