//! Functional core of the sparsedao engine.
//!
//! Everything in this crate is pure: the query-parameter model, the filter
//! compiler that lowers it into scans, the sparse row model, schema metadata
//! and the contracts (traits and error types) the imperative shell in the
//! `sparsedao` crate implements and consumes.

pub mod cache;
pub mod filter;
pub mod query;
pub mod row;
pub mod schema;
pub mod search;
pub mod storage;
