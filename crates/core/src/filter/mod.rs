mod compiler;
mod error;
mod scan;
mod types;

pub use compiler::FilterCompiler;
pub use error::FilterError;
pub use scan::{ColumnSelector, Scan};
pub use types::{ColumnValueFilter, CompareOp, Comparator, Filter, FilterOperator};
