//! Filter compilation
//!
//! Turns a JSON filter document into a predicate tree:
//!
//! ```text
//! Document   := Clause[]
//! Clause     := { (LogicalKey | FieldKey)* }
//! LogicalKey := "$and" | "$or"  -> Document
//! FieldKey   := <any other string> -> { ComparisonOp: Scalar | Scalar[] }
//! ```
//!
//! Object keys are visited in sorted order at every level so that the same
//! document always renders to the same SQL.

use serde_json::{Map, Value};

use crate::utils::json::{is_scalar, sorted_entries};

use super::error::FilterError;
use super::types::{CompareOp, Comparison, Operand, Predicate};

/// Default maximum size of filter JSON in bytes (64KB)
pub const DEFAULT_MAX_INPUT_BYTES: usize = 64 * 1024;

/// Default maximum number of nested `$and`/`$or` groups
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Largest accepted `max_depth`
///
/// Each logical level costs two containers (`[` and `{`) against
/// `serde_json`'s recursion limit of 128, plus four for the root array,
/// the root clause, the operator object and an `$in` list. Documents one
/// level past this bound still parse, so they are reported as shape errors.
pub const MAX_SUPPORTED_DEPTH: usize = 60;

const AND_KEY: &str = "$and";
const OR_KEY: &str = "$or";
const ROOT_PATH: &str = "$";

/// Filter compiler with input limits
///
/// Holds no state between calls; one instance can be shared across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCompiler {
    max_depth: usize,
    max_input_bytes: usize,
}

impl Default for FilterCompiler {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// Compile a filter document with default limits
pub fn compile(raw: &[u8]) -> Result<Predicate, FilterError> {
    FilterCompiler::default().compile(raw)
}

impl FilterCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nesting limit, clamped to [`MAX_SUPPORTED_DEPTH`]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        if max_depth > MAX_SUPPORTED_DEPTH {
            tracing::warn!(
                requested = max_depth,
                max = MAX_SUPPORTED_DEPTH,
                "Clamping filter max_depth"
            );
        }
        self.max_depth = max_depth.min(MAX_SUPPORTED_DEPTH);
        self
    }

    pub fn with_max_input_bytes(mut self, max_input_bytes: usize) -> Self {
        self.max_input_bytes = max_input_bytes;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_input_bytes(&self) -> usize {
        self.max_input_bytes
    }

    /// Compile raw filter bytes into a root conjunction
    ///
    /// Empty (or whitespace-only) input yields [`Predicate::empty`].
    pub fn compile(&self, raw: &[u8]) -> Result<Predicate, FilterError> {
        if raw.len() > self.max_input_bytes {
            return Err(FilterError::TooLarge {
                size: raw.len(),
                max: self.max_input_bytes,
            });
        }

        if raw.iter().all(|&b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')) {
            tracing::trace!("Empty filter document");
            return Ok(Predicate::empty());
        }

        tracing::debug!(size = raw.len(), "Compiling filter");

        let document: Value = serde_json::from_slice(raw).map_err(FilterError::MalformedInput)?;
        let Value::Array(clauses) = &document else {
            return Err(FilterError::invalid_shape(ROOT_PATH, "array", &document));
        };

        let predicate = Predicate::Conjunction(self.compile_sequence(clauses, ROOT_PATH, 0)?);
        tracing::debug!(leaves = predicate.leaf_count(), "Filter compiled");
        Ok(predicate)
    }

    /// Compile an array of clauses into a flat, implicitly AND-ed list
    fn compile_sequence(
        &self,
        elements: &[Value],
        path: &str,
        depth: usize,
    ) -> Result<Vec<Predicate>, FilterError> {
        let mut nodes = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let element_path = format!("{}[{}]", path, index);
            let Value::Object(clause) = element else {
                return Err(FilterError::invalid_shape(
                    &element_path,
                    "clause object",
                    element,
                ));
            };
            nodes.extend(self.compile_group(clause, &element_path, depth)?);
        }
        Ok(nodes)
    }

    /// Compile one clause object into sibling predicates
    fn compile_group(
        &self,
        clause: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Result<Vec<Predicate>, FilterError> {
        let mut nodes = Vec::with_capacity(clause.len());
        for (key, value) in sorted_entries(clause) {
            let key_path = format!("{}.{}", path, key);
            match key.as_str() {
                AND_KEY => nodes.push(Predicate::Conjunction(
                    self.compile_logical(value, &key_path, depth)?,
                )),
                OR_KEY => nodes.push(Predicate::Disjunction(
                    self.compile_logical(value, &key_path, depth)?,
                )),
                field => nodes.extend(compile_field(field, value, &key_path)?),
            }
        }
        Ok(nodes)
    }

    /// Compile the body of `$and`/`$or` one nesting level down
    fn compile_logical(
        &self,
        body: &Value,
        path: &str,
        depth: usize,
    ) -> Result<Vec<Predicate>, FilterError> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(FilterError::InvalidShape {
                path: path.to_string(),
                expected: format!("at most {} nested logical groups", self.max_depth),
                actual: format!("nesting depth {}", depth),
            });
        }

        let Value::Array(elements) = body else {
            return Err(FilterError::invalid_shape(path, "array", body));
        };
        self.compile_sequence(elements, path, depth)
    }
}

/// Compile one field's operator map into sibling comparison leaves
fn compile_field(field: &str, operand: &Value, path: &str) -> Result<Vec<Predicate>, FilterError> {
    let Value::Object(operators) = operand else {
        return Err(FilterError::invalid_shape(path, "operator object", operand));
    };

    let mut leaves = Vec::with_capacity(operators.len());
    for (token, value) in sorted_entries(operators) {
        let op_path = format!("{}.{}", path, token);
        let Some(operator) = CompareOp::from_token(token) else {
            return Err(FilterError::unknown_operator(&op_path, token));
        };

        let operand = match operator {
            // presence is the only signal
            CompareOp::IsNull | CompareOp::IsNotNull => Operand::None,
            CompareOp::In | CompareOp::NotIn => Operand::List(scalar_list(value, &op_path)?),
            _ => Operand::Scalar(scalar(value, &op_path)?),
        };
        leaves.push(Predicate::Comparison(Comparison::new(field, operator, operand)));
    }
    Ok(leaves)
}

fn scalar(value: &Value, path: &str) -> Result<Value, FilterError> {
    if is_scalar(value) {
        Ok(value.clone())
    } else {
        Err(FilterError::invalid_shape(path, "scalar", value))
    }
}

fn scalar_list(value: &Value, path: &str) -> Result<Vec<Value>, FilterError> {
    let Value::Array(items) = value else {
        return Err(FilterError::invalid_shape(path, "array", value));
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| scalar(item, &format!("{}[{}]", path, index)))
        .collect()
}
