//! Predicate tree definitions
//!
//! A compiled filter is a closed tree of comparisons combined with AND/OR.
//! Trees are built bottom-up by the compiler and never mutated afterwards.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Comparison operators accepted under a field name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$ne")]
    Ne,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
    #[serde(rename = "$isnull")]
    IsNull,
    #[serde(rename = "$isnotnull")]
    IsNotNull,
    #[serde(rename = "$in")]
    In,
    #[serde(rename = "$notin")]
    NotIn,
}

impl CompareOp {
    pub const ALL: [CompareOp; 10] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Gte,
        CompareOp::Lt,
        CompareOp::Lte,
        CompareOp::IsNull,
        CompareOp::IsNotNull,
        CompareOp::In,
        CompareOp::NotIn,
    ];

    /// Wire token, e.g. `$gte`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::IsNull => "$isnull",
            Self::IsNotNull => "$isnotnull",
            Self::In => "$in",
            Self::NotIn => "$notin",
        }
    }

    /// Look up an operator by its wire token (case-sensitive)
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == token)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    /// `$isnull` / `$isnotnull` carry no value
    None,
    Scalar(Value),
    List(Vec<Value>),
}

impl Operand {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Bound values in order
    pub fn values(&self) -> &[Value] {
        match self {
            Self::None => &[],
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }
}

/// A single field-operator-value predicate
///
/// Only the compiler constructs comparisons, so the operand always has the
/// shape its operator requires.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    field: String,
    operator: CompareOp,
    #[serde(skip_serializing_if = "Operand::is_none")]
    operand: Operand,
}

impl Comparison {
    pub(crate) fn new(field: impl Into<String>, operator: CompareOp, operand: Operand) -> Self {
        Self {
            field: field.into(),
            operator,
            operand,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> CompareOp {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }
}

/// Compiled filter tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Comparison(Comparison),
    Conjunction(Vec<Predicate>),
    Disjunction(Vec<Predicate>),
}

impl Predicate {
    /// The no-op filter: an empty conjunction
    pub fn empty() -> Self {
        Self::Conjunction(Vec::new())
    }

    /// True for an empty conjunction, which must not be attached to a query
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Conjunction(children) if children.is_empty())
    }

    /// Number of comparison leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Comparison(_) => 1,
            Self::Conjunction(children) | Self::Disjunction(children) => {
                children.iter().map(Predicate::leaf_count).sum()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compare_op_token_round_trip() {
        for op in CompareOp::ALL {
            assert_eq!(CompareOp::from_token(op.as_str()), Some(op));
            assert_eq!(op.to_string(), op.as_str());
        }
    }

    #[test]
    fn test_compare_op_tokens_are_case_sensitive() {
        assert_eq!(CompareOp::from_token("$EQ"), None);
        assert_eq!(CompareOp::from_token("eq"), None);
        assert_eq!(CompareOp::from_token("$equals"), None);
    }

    #[test]
    fn test_operand_values() {
        assert!(Operand::None.values().is_empty());
        assert_eq!(Operand::Scalar(json!("PG")).values(), &[json!("PG")]);
        assert_eq!(
            Operand::List(vec![json!(1), json!(2)]).values(),
            &[json!(1), json!(2)]
        );
    }

    #[test]
    fn test_predicate_is_empty() {
        assert!(Predicate::empty().is_empty());
        assert!(!Predicate::Disjunction(vec![]).is_empty());

        let leaf = Predicate::Comparison(Comparison::new("A", CompareOp::IsNull, Operand::None));
        assert!(!Predicate::Conjunction(vec![leaf.clone()]).is_empty());
        assert!(!leaf.is_empty());
    }

    #[test]
    fn test_leaf_count() {
        let leaf = |f: &str| {
            Predicate::Comparison(Comparison::new(f, CompareOp::Eq, Operand::Scalar(json!(1))))
        };
        let tree = Predicate::Conjunction(vec![
            leaf("A"),
            Predicate::Disjunction(vec![leaf("B"), Predicate::Conjunction(vec![leaf("C")])]),
        ]);
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(Predicate::empty().leaf_count(), 0);
    }

    #[test]
    fn test_predicate_serializes_as_tagged_tree() {
        let tree = Predicate::Disjunction(vec![
            Predicate::Comparison(Comparison::new(
                "Rating",
                CompareOp::In,
                Operand::List(vec![json!("PG"), json!("R")]),
            )),
            Predicate::Comparison(Comparison::new("Plot", CompareOp::IsNull, Operand::None)),
        ]);

        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!({
                "disjunction": [
                    {"comparison": {"field": "Rating", "operator": "$in", "operand": ["PG", "R"]}},
                    {"comparison": {"field": "Plot", "operator": "$isnull"}}
                ]
            })
        );
    }
}
