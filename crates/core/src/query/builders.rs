//! Convenience constructors for query trees.
//!
//! ```
//! use sparsedao_core::query::{MatchMode, QueryParameter};
//!
//! let query = vec![
//!     QueryParameter::greater("age", 30),
//!     QueryParameter::nested("address", vec![QueryParameter::like("city", "Mon", MatchMode::Start)]),
//!     QueryParameter::max_results(10),
//! ];
//! assert_eq!(query.len(), 3);
//! ```

use super::types::{
    MatchMode, Operand, Operator, PagingKind, PropertyCondition, QueryParameter, QueryValue,
};

impl QueryParameter {
    fn condition(name: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        QueryParameter::PropertyCondition(PropertyCondition {
            name: name.into(),
            operator,
            operand,
            match_mode: None,
        })
    }

    pub fn equal(name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self::condition(name, Operator::Equal, Operand::Single(value.into()))
    }

    pub fn not_equal(name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self::condition(name, Operator::NotEqual, Operand::Single(value.into()))
    }

    pub fn less(name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self::condition(name, Operator::Less, Operand::Single(value.into()))
    }

    pub fn less_equal(name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self::condition(name, Operator::LessEqual, Operand::Single(value.into()))
    }

    pub fn greater(name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self::condition(name, Operator::Greater, Operand::Single(value.into()))
    }

    pub fn greater_equal(name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        Self::condition(name, Operator::GreaterEqual, Operand::Single(value.into()))
    }

    /// String match under the given [`MatchMode`].
    pub fn like(name: impl Into<String>, value: impl Into<QueryValue>, mode: MatchMode) -> Self {
        QueryParameter::PropertyCondition(PropertyCondition {
            name: name.into(),
            operator: Operator::StringLike,
            operand: Operand::Single(value.into()),
            match_mode: Some(mode),
        })
    }

    /// Inclusive range `first..=second`.
    pub fn between(
        name: impl Into<String>,
        first: impl Into<QueryValue>,
        second: impl Into<QueryValue>,
    ) -> Self {
        Self::condition(
            name,
            Operator::Between,
            Operand::Pair(first.into(), second.into()),
        )
    }

    pub fn is_in<V: Into<QueryValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::condition(
            name,
            Operator::IsIn,
            Operand::Multi(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn not_in<V: Into<QueryValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::condition(
            name,
            Operator::IsNotIn,
            Operand::Multi(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::condition(name, Operator::IsEmpty, Operand::None)
    }

    pub fn not_empty(name: impl Into<String>) -> Self {
        Self::condition(name, Operator::IsNotEmpty, Operand::None)
    }

    pub fn null(name: impl Into<String>) -> Self {
        Self::condition(name, Operator::IsNull, Operand::None)
    }

    pub fn not_null(name: impl Into<String>) -> Self {
        Self::condition(name, Operator::IsNotNull, Operand::None)
    }

    pub fn and(children: Vec<QueryParameter>) -> Self {
        QueryParameter::Conjunction { children }
    }

    pub fn or(children: Vec<QueryParameter>) -> Self {
        QueryParameter::Disjunction { children }
    }

    pub fn nested(name: impl Into<String>, children: Vec<QueryParameter>) -> Self {
        QueryParameter::NestedProperty {
            name: name.into(),
            children,
        }
    }

    pub fn projection(name: impl Into<String>) -> Self {
        QueryParameter::Projection { name: name.into() }
    }

    pub fn max_results(count: u32) -> Self {
        QueryParameter::Paging {
            kind: PagingKind::MaxResults,
            value: count.into(),
        }
    }

    /// Starts the scan at the row whose key is `value`'s string form.
    pub fn first_result(value: impl Into<QueryValue>) -> Self {
        QueryParameter::Paging {
            kind: PagingKind::FirstResult,
            value: value.into(),
        }
    }

    pub fn value(value: impl Into<QueryValue>) -> Self {
        QueryParameter::ValueOnly {
            value: value.into(),
        }
    }
}
