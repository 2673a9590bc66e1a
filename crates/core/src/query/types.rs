use std::fmt;

use serde::{Deserialize, Serialize};

/// A literal operand of a query condition.
///
/// Scans compare the value's canonical string form as bytes, so `42`,
/// `"42"` and `42.0` are three different operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl QueryValue {
    /// The bytes compared against stored cells.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Returns the value as a non-negative count, if it is one.
    pub fn as_count(&self) -> Option<usize> {
        match self {
            QueryValue::Int(value) => usize::try_from(*value).ok(),
            QueryValue::Str(value) => value.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Bool(value) => write!(f, "{value}"),
            QueryValue::Int(value) => write!(f, "{value}"),
            QueryValue::Float(value) => write!(f, "{value}"),
            QueryValue::Str(value) => f.write_str(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(value.into())
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

/// Comparison performed by a [`PropertyCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    StringLike,
    Between,
    IsEmpty,
    IsNotEmpty,
    IsNull,
    IsNotNull,
    IsIn,
    IsNotIn,
}

/// Sub-policy of [`Operator::StringLike`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMode {
    #[default]
    Exact,
    Start,
    End,
    Anywhere,
}

/// Which aspect of the result set a [`QueryParameter::Paging`] node controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingKind {
    MaxResults,
    FirstResult,
}

/// The operand shape of a condition: none, one value, a list, or a pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    #[default]
    None,
    Single(QueryValue),
    Multi(Vec<QueryValue>),
    Pair(QueryValue, QueryValue),
}

/// A leaf predicate on a logical property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCondition {
    pub name: String,
    pub operator: Operator,
    #[serde(default)]
    pub operand: Operand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
}

/// A node of a backend-agnostic query tree.
///
/// Trees are built per call, compiled into a scan and discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryParameter {
    /// All children must hold.
    Conjunction { children: Vec<QueryParameter> },
    /// At least one child must hold.
    Disjunction { children: Vec<QueryParameter> },
    /// Scopes the children's property names under `name.`.
    NestedProperty {
        name: String,
        children: Vec<QueryParameter>,
    },
    PropertyCondition(PropertyCondition),
    /// A bare positional value.
    ValueOnly { value: QueryValue },
    /// Requests a column or family in the result without constraining rows.
    Projection { name: String },
    Paging { kind: PagingKind, value: QueryValue },
}

impl QueryParameter {
    /// The property name carried by this node, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            QueryParameter::NestedProperty { name, .. } | QueryParameter::Projection { name } => {
                Some(name)
            }
            QueryParameter::PropertyCondition(condition) => Some(&condition.name),
            _ => None,
        }
    }

    /// Child nodes of compound parameters; empty for leaves.
    pub fn children(&self) -> &[QueryParameter] {
        match self {
            QueryParameter::Conjunction { children }
            | QueryParameter::Disjunction { children }
            | QueryParameter::NestedProperty { children, .. } => children,
            _ => &[],
        }
    }

    /// Returns true for nodes that never have children.
    pub fn is_leaf(&self) -> bool {
        !matches!(
            self,
            QueryParameter::Conjunction { .. }
                | QueryParameter::Disjunction { .. }
                | QueryParameter::NestedProperty { .. }
        )
    }
}

/// Extracts the first positive top-level `Paging(MaxResults)` bound.
pub fn max_results(params: &[QueryParameter]) -> Option<usize> {
    params.iter().find_map(|param| match param {
        QueryParameter::Paging {
            kind: PagingKind::MaxResults,
            value,
        } => value.as_count().filter(|count| *count > 0),
        _ => None,
    })
}
