mod error;
mod keys;
mod serialization;
mod traits;
mod types;

pub use error::{CacheError, Result};
pub use keys::CacheKeyPrefixStrategy;
pub use serialization::{deserialize_value, serialize_value, SerializationError};
pub use traits::{CacheKey, CacheServiceProvider};
pub use types::{CacheStats, Expiry};
