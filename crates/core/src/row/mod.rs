mod bytes;
mod types;

pub use bytes::{decode_version, encode_version};
pub use types::{Column, Deletion, Mutation, Row};
