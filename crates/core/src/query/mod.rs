mod builders;
mod types;

pub use types::{
    max_results, MatchMode, Operand, Operator, PagingKind, PropertyCondition, QueryParameter,
    QueryValue,
};
