//! Dedupctl library exports.
//!
//! The binary is a thin clap front end; everything it calls lives here so
//! integration tests can drive the orchestration with a fake tool runner.

pub mod commands;
pub mod config;
pub mod dedup;
pub mod lifecycle;
pub mod lvm;
pub mod mounts;
pub mod process;
pub mod report;
