//! Batch execution engine
//!
//! Provides the bounded worker pool and its isolation strategies.

mod isolation;
mod pool;

pub use isolation::{IsolationStrategy, ProcessIsolation, ThreadIsolation};
pub use pool::BatchExecutor;
