//! simharness - concurrent simulator test harness
//!
//! Resolves a corpus of test programs, builds the simulator, runs every test
//! against it on a worker pool and reports the outcomes sorted by return code.

pub mod build;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod error;
pub mod exec;
pub mod harness;
pub mod logging;
pub mod models;
pub mod output;
pub mod riscof;
pub mod runner;
