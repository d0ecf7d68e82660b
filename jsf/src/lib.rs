//! Compile MongoDB-style JSON filter documents into parameterized SQL.
//!
//! See [`filters`] for the compiler and renderer, [`query`] for attaching
//! compiled filters to a `SELECT`.

pub mod app;
pub mod core;
pub mod filters;
pub mod query;
pub mod sql;
pub mod utils;

pub use filters::{FilterCompiler, FilterError, Predicate, SqlFragment, SqlRenderer, compile};
pub use query::SelectQuery;
pub use sql::Backend;
