//! Bounded execution of store operations.
//!
//! Every unit of work runs against a table handle resolved per operation,
//! under a concurrency permit and a timeout.

mod service;

pub use service::{join_all, ExecutorService, TaskHandle};
