//! JSON filter system
//!
//! Compiles MongoDB-style filter documents into predicate trees and renders
//! them as parameterized SQL. Supported comparison operators: `$eq`, `$ne`,
//! `$gt`, `$gte`, `$lt`, `$lte`, `$isnull`, `$isnotnull`, `$in`, `$notin`;
//! logical groups: `$and`, `$or`.
//!
//! ## Usage
//!
//! ```
//! use jsf::filters::{compile, SqlRenderer};
//!
//! let predicate = compile(br#"[{"Rating":{"$eq":"PG"}}]"#).unwrap();
//! let fragment = SqlRenderer::default().render(&predicate);
//! assert_eq!(fragment.sql, "(Rating = ?)");
//! assert_eq!(fragment.params.values, vec![serde_json::json!("PG")]);
//! ```

mod compiler;
mod error;
mod render;
mod types;

pub use compiler::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_INPUT_BYTES, FilterCompiler, MAX_SUPPORTED_DEPTH, compile,
};
pub use error::FilterError;
pub use render::{NullPolicy, SqlFragment, SqlParams, SqlRenderer};
pub use types::{CompareOp, Comparison, Operand, Predicate};
