//! A DAO layer for Rust that derives queries from finder-method names.
//!
//! Quarry reduces data-access boilerplate: declare a DAO's methods once,
//! and the query text, parameter binding, pagination, and result shaping
//! are derived and validated for you at construction time. A method named
//! `findByLastnameAndFirstname` becomes
//! `select x from User x where x.lastname = ?1 and x.firstname = ?2`
//! without a line of query text being written.
//!
//! Every declared method is resolved eagerly when the DAO is built, so a
//! misspelled property or a mismatched argument count fails at wiring
//! time rather than on the first request that reaches it.

#![deny(missing_docs)]

pub use quarry_core::dao::{Dao, DaoConfig};
pub use quarry_core::entity::{EntityMeta, Property};
pub use quarry_core::method::{Hint, MethodDef, QueryMethod, ReturnShape};
pub use quarry_core::page::{Direction, Order, Page, PageRequest, Sort};
pub use quarry_core::param::{Arg, ParamDecl, ParameterBinder, Parameters};
pub use quarry_core::query::{Outcome, QueryExecution, QueryLookupStrategy, ResolvedQuery};
pub use quarry_core::{Entity, Error, FromValue, Result, Row, ToValue, Value, ValueType};

pub mod db {
    //! Provider boundary and the in-memory provider.
    pub use quarry_core::db::*;
}

pub mod prelude {
    //! Re-exports of the traits needed to declare entities and drive a
    //! session.
    pub use quarry_core::db::{Session, SessionQuery};
    pub use quarry_core::value::{FromValue, ToValue};
    pub use quarry_core::Entity;
}
