//! The facade crate re-exports everything needed to declare an entity,
//! assemble a DAO, and run a derived query.

use quarry::db::MemSession;
use quarry::prelude::*;
use quarry::{Arg, Dao, DaoConfig, MethodDef, ParamDecl, Property, Row, Value, ValueType};

#[derive(Clone, Debug, PartialEq)]
struct Tag {
    id: i64,
    label: String,
}

impl Entity for Tag {
    const NAME: &'static str = "Tag";
    const ID: &'static str = "id";
    const PROPERTIES: &'static [Property] = &[
        Property::new("id", ValueType::BigInt),
        Property::new("label", ValueType::Text),
    ];

    fn from_row(row: &Row) -> quarry::Result<Self> {
        Ok(Tag {
            id: row.require("id")?.bigint()?,
            label: row.require("label")?.text()?.to_string(),
        })
    }

    fn to_row(&self) -> Row {
        Row::new().with("id", self.id).with("label", self.label.as_str())
    }

    fn id_value(&self) -> Value {
        Value::BigInt(self.id)
    }
}

#[test]
fn derived_finder_through_the_facade() {
    let session = MemSession::new();
    let dao = Dao::<Tag>::build(
        DaoConfig::new("TagDao")
            .method(MethodDef::new("findByLabel").param(ParamDecl::value()).single()),
        &session,
    )
    .unwrap();

    let tag = Tag {
        id: 7,
        label: "orm".to_string(),
    };
    dao.save(&session, &tag).unwrap();

    let found = dao
        .invoke_single(&session, "findByLabel", &[Arg::value("orm")])
        .unwrap();
    assert_eq!(found, Some(tag));
}
