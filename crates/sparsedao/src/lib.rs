//! Imperative shell of the sparsedao engine.
//!
//! Pure logic (query model, filter compiler, row model, contracts) lives in
//! `sparsedao_core`. This crate runs it: the execution service, the entity
//! engine, store and cache backends, locks, merging and index maintenance.

pub mod cache;
pub mod config;
pub mod dao;
pub mod executor;
pub mod lock;
pub mod merge;
pub mod search;
pub mod storage;

#[cfg(test)]
mod testing;
