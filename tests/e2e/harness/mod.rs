//! E2E test harness for gitctx.
//!
//! Scenarios drive a real `ContextEngine` over a temp directory with a
//! mock clock and an in-memory tracked-file list.

#![allow(dead_code)]

pub mod assertions;
pub mod clock;
pub mod runner;
pub mod scenario;
pub mod steps;

// Re-export commonly used types
pub use assertions::{Assertion, ErrorMatch};
pub use scenario::{CommitSpec, Scenario};
