//! Match engine module
//!
//! Decides, per key event, which configured actions fire, and hands their
//! commands to an executor.

mod executor;
mod matcher;

pub use executor::ProcessExecutor;
pub use matcher::{FirePolicy, MatchEngine};
