//! Activity sequence execution
//!
//! Runs one test's ordered activities against one browser session.

mod activities;

pub use activities::{ActivityRunner, RunOutcome};
