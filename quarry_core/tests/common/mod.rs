#![allow(dead_code)]

use quarry_core::db::{MemSession, Row};
use quarry_core::entity::Property;
use quarry_core::value::{Value, ValueType};
use quarry_core::{Entity, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email_address: String,
    pub active: bool,
}

impl User {
    pub fn new(id: i64, firstname: &str, lastname: &str, email_address: &str) -> Self {
        User {
            id,
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            email_address: email_address.to_string(),
            active: true,
        }
    }
}

impl Entity for User {
    const NAME: &'static str = "User";
    const ID: &'static str = "id";
    const PROPERTIES: &'static [Property] = &[
        Property::new("id", ValueType::BigInt),
        Property::new("firstname", ValueType::Text),
        Property::new("lastname", ValueType::Text),
        Property::new("emailAddress", ValueType::Text),
        Property::new("active", ValueType::Bool),
    ];

    fn from_row(row: &Row) -> Result<Self> {
        Ok(User {
            id: row.require("id")?.bigint()?,
            firstname: row.require("firstname")?.text()?.to_string(),
            lastname: row.require("lastname")?.text()?.to_string(),
            email_address: row.require("emailAddress")?.text()?.to_string(),
            active: row.require("active")?.bool()?,
        })
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("id", self.id)
            .with("firstname", self.firstname.as_str())
            .with("lastname", self.lastname.as_str())
            .with("emailAddress", self.email_address.as_str())
            .with("active", self.active)
    }

    fn id_value(&self) -> Value {
        Value::BigInt(self.id)
    }
}

/// Entity whose property names contain the `Or`/`And` keyword letters,
/// for keyword-boundary tests.
#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub organization: String,
}

impl Entity for Contact {
    const NAME: &'static str = "Contact";
    const ID: &'static str = "id";
    const PROPERTIES: &'static [Property] = &[
        Property::new("id", ValueType::BigInt),
        Property::new("name", ValueType::Text),
        Property::new("organization", ValueType::Text),
    ];

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Contact {
            id: row.require("id")?.bigint()?,
            name: row.require("name")?.text()?.to_string(),
            organization: row.require("organization")?.text()?.to_string(),
        })
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("id", self.id)
            .with("name", self.name.as_str())
            .with("organization", self.organization.as_str())
    }

    fn id_value(&self) -> Value {
        Value::BigInt(self.id)
    }
}

pub fn gierke() -> User {
    User::new(1, "Oliver", "Gierke", "ogierke@example.org")
}

pub fn arrasz() -> User {
    User::new(2, "Pawel", "Arrasz", "parrasz@example.org")
}

/// A session seeded with the two standard users.
pub fn seeded_session() -> MemSession {
    let session = MemSession::new();
    seed(&session, &[gierke(), arrasz()]);
    session
}

pub fn seed(session: &MemSession, users: &[User]) {
    use quarry_core::db::Session;
    for user in users {
        session
            .persist(User::NAME, User::ID, user.to_row())
            .expect("seeding cannot fail");
    }
}
