mod static_schema;
mod traits;
mod types;

pub use static_schema::SchemaInfo;
pub use traits::{FilterMetadata, SchemaInfoProvider};
pub use types::{FilterConfig, FilterTarget};
